mod common;

use common::{memory_repo, Call, FixedPermissions, MemoryRepo, Outcomes, ParkedGeofencingClient};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use tunity_core::{
    Expiration, GeofenceRecord, GeofenceRepository, GeofenceService, GeofenceStatus,
    GeofenceTransition, GeofencingError, LatLng, PendingIntent, RemovalTarget, SkipReason,
    Submission,
};

struct Harness {
    service: GeofenceService<MemoryRepo>,
    client: Arc<ParkedGeofencingClient>,
    repo: Arc<MemoryRepo>,
}

fn harness(permission_granted: bool) -> Harness {
    let repo = memory_repo();
    let client = Arc::new(ParkedGeofencingClient::default());
    let service = GeofenceService::new(
        Arc::clone(&repo),
        client.clone(),
        Arc::new(FixedPermissions {
            fine_location: permission_granted,
        }),
        PendingIntent::broadcast("test.receiver"),
    );
    Harness {
        service,
        client,
        repo,
    }
}

fn circle() -> GeofenceRecord {
    GeofenceRecord::circle(LatLng::new(45.07, 7.68), 50.0)
}

#[test]
fn add_submits_exit_only_request_and_persists_on_success() {
    let h = harness(true);
    let outcomes = Outcomes::default();
    let record = circle();

    let submission = h
        .service
        .add(record.clone(), outcomes.success(), outcomes.failure());
    assert_eq!(submission, Submission::Submitted);

    // Nothing is stored until the OS confirms.
    assert!(h.service.get_all().unwrap().is_empty());
    assert!(outcomes.all().is_empty());

    match h.client.calls().as_slice() {
        [Call::Add(request, intent)] => {
            assert_eq!(intent, &PendingIntent::broadcast("test.receiver"));
            assert!(request.initial_trigger.is_empty());
            let descriptor = &request.geofences[0];
            assert_eq!(descriptor.request_id, record.id);
            assert_eq!(descriptor.region.radius_m, 50.0);
            assert_eq!(descriptor.transition_types, vec![GeofenceTransition::Exit]);
            assert_eq!(descriptor.expiration, Expiration::Never);
        }
        other => panic!("unexpected calls: {other:?}"),
    }

    h.client.complete_next(Ok(()));
    assert_eq!(outcomes.all(), vec![Ok(())]);
    assert_eq!(h.service.get_all().unwrap(), vec![record.clone()]);
    assert_eq!(h.service.get_last().unwrap(), Some(record.clone()));
    assert_eq!(h.service.get(&record.id).unwrap(), Some(record));
}

#[test]
fn add_failure_reports_human_readable_message_and_stores_nothing() {
    let h = harness(true);
    let outcomes = Outcomes::default();

    h.service.add(circle(), outcomes.success(), outcomes.failure());
    h.client
        .complete_next(Err(GeofencingError::new(GeofenceStatus::NotAvailable)));

    let all = outcomes.all();
    assert_eq!(all.len(), 1);
    let message = all[0].clone().unwrap_err();
    assert!(message.contains("not available"), "{message}");
    assert!(h.repo.get_all().unwrap().is_empty());
}

#[test]
fn add_skips_silently_without_center_or_radius() {
    let h = harness(true);
    let outcomes = Outcomes::default();

    let empty = GeofenceRecord::new();
    assert_eq!(
        h.service
            .add(empty, outcomes.success(), outcomes.failure()),
        Submission::Skipped(SkipReason::MissingCenter)
    );

    let mut no_radius = GeofenceRecord::new();
    no_radius.center = Some(LatLng::new(1.0, 1.0));
    assert_eq!(
        h.service
            .add(no_radius, outcomes.success(), outcomes.failure()),
        Submission::Skipped(SkipReason::MissingRadius)
    );

    assert!(h.client.calls().is_empty());
    assert!(outcomes.all().is_empty());
}

#[test]
fn add_skips_silently_without_permission() {
    let h = harness(false);
    let outcomes = Outcomes::default();

    assert_eq!(
        h.service
            .add(circle(), outcomes.success(), outcomes.failure()),
        Submission::Skipped(SkipReason::PermissionDenied)
    );
    assert!(h.client.calls().is_empty());
    assert!(outcomes.all().is_empty());
    assert!(h.repo.get_all().unwrap().is_empty());
}

#[test]
fn add_rejects_invalid_radius_through_failure_callback() {
    let h = harness(true);
    let outcomes = Outcomes::default();
    let record = GeofenceRecord::circle(LatLng::new(1.0, 1.0), -5.0);

    let submission = h
        .service
        .add(record, outcomes.success(), outcomes.failure());
    assert!(matches!(
        submission,
        Submission::Skipped(SkipReason::Invalid(_))
    ));
    assert_eq!(outcomes.all().len(), 1);
    assert!(outcomes.all()[0].is_err());
    assert!(h.client.calls().is_empty());
}

#[test]
fn add_skips_incomplete_invalid_record_without_callbacks() {
    let h = harness(true);
    let outcomes = Outcomes::default();
    let mut no_center = GeofenceRecord::new();
    no_center.radius_m = Some(-1.0);

    assert_eq!(
        h.service
            .add(no_center, outcomes.success(), outcomes.failure()),
        Submission::Skipped(SkipReason::MissingCenter)
    );
    assert!(h.client.calls().is_empty());
    assert!(outcomes.all().is_empty());
}

#[test]
fn add_skips_invalid_record_without_permission_and_without_callbacks() {
    let h = harness(false);
    let outcomes = Outcomes::default();
    let zero_radius = GeofenceRecord::circle(LatLng::new(1.0, 1.0), 0.0);

    assert_eq!(
        h.service
            .add(zero_radius, outcomes.success(), outcomes.failure()),
        Submission::Skipped(SkipReason::PermissionDenied)
    );
    assert!(h.client.calls().is_empty());
    assert!(outcomes.all().is_empty());
}

#[test]
fn concurrent_add_confirmations_keep_every_record() {
    const ADDS: usize = 200;
    const THREADS: usize = 8;

    let h = harness(true);
    let outcomes = Outcomes::default();
    let mut ids = Vec::with_capacity(ADDS);
    for index in 0..ADDS {
        let record = GeofenceRecord::circle(LatLng::new(index as f64 / 10.0, 7.68), 50.0);
        ids.push(record.id.clone());
        h.service.add(record, outcomes.success(), outcomes.failure());
    }
    assert_eq!(h.client.pending_len(), ADDS);

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let client = Arc::clone(&h.client);
            thread::spawn(move || {
                for _ in 0..ADDS / THREADS {
                    client.complete_next(Ok(()));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("completion thread");
    }

    let all = outcomes.all();
    assert_eq!(all.len(), ADDS);
    assert!(all.iter().all(Result::is_ok));

    let stored: HashSet<String> = h
        .service
        .get_all()
        .unwrap()
        .into_iter()
        .map(|record| record.id)
        .collect();
    assert_eq!(stored.len(), ADDS);
    for id in &ids {
        assert!(stored.contains(id), "missing {id}");
    }
}

#[test]
fn remove_unregisters_by_id_and_drops_record_on_success() {
    let h = harness(true);
    let keep = circle();
    let drop = GeofenceRecord::circle(LatLng::new(10.0, 10.0), 50.0);
    h.repo.append(&keep).unwrap();
    h.repo.append(&drop).unwrap();

    let outcomes = Outcomes::default();
    h.service
        .remove(drop.clone(), outcomes.success(), outcomes.failure());
    assert_eq!(
        h.client.calls(),
        vec![Call::Remove(RemovalTarget::RequestIds(vec![drop.id.clone()]))]
    );
    // Still stored until the OS confirms.
    assert_eq!(h.service.get_all().unwrap().len(), 2);

    h.client.complete_next(Ok(()));
    assert_eq!(outcomes.all(), vec![Ok(())]);
    let remaining = h.service.get_all().unwrap();
    assert_eq!(remaining, vec![keep]);
    assert_eq!(h.service.get(&drop.id).unwrap(), None);
}

#[test]
fn remove_failure_keeps_record() {
    let h = harness(true);
    let record = circle();
    h.repo.append(&record).unwrap();

    let outcomes = Outcomes::default();
    h.service
        .remove(record.clone(), outcomes.success(), outcomes.failure());
    h.client.complete_next(Err(GeofencingError::from_code(13)));

    let all = outcomes.all();
    assert_eq!(all.len(), 1);
    assert!(all[0].clone().unwrap_err().contains("code 13"));
    assert_eq!(h.service.get_all().unwrap(), vec![record]);
}

#[test]
fn remove_all_unregisters_callback_target_and_clears_store() {
    let h = harness(true);
    h.repo.append(&circle()).unwrap();
    h.repo.append(&circle()).unwrap();

    let outcomes = Outcomes::default();
    h.service.remove_all(outcomes.success(), outcomes.failure());
    assert_eq!(
        h.client.calls(),
        vec![Call::Remove(RemovalTarget::CallbackIntent(
            PendingIntent::broadcast("test.receiver")
        ))]
    );

    h.client.complete_next(Ok(()));
    assert_eq!(outcomes.all(), vec![Ok(())]);
    assert!(h.service.get_all().unwrap().is_empty());
}

#[test]
fn completion_may_run_on_another_thread() {
    let h = harness(true);
    let outcomes = Outcomes::default();
    let record = circle();
    h.service
        .add(record.clone(), outcomes.success(), outcomes.failure());

    let client = Arc::clone(&h.client);
    std::thread::spawn(move || client.complete_next(Ok(())))
        .join()
        .expect("completion thread");

    assert_eq!(outcomes.all(), vec![Ok(())]);
    assert_eq!(h.service.get_last().unwrap(), Some(record));
    assert_eq!(h.client.pending_len(), 0);
}
