//! Background execution for transition events.
//!
//! # Responsibility
//! - Accept events from the broadcast entry point without blocking it.
//! - Handle queued events one at a time, in arrival order, on one thread.
//!
//! # Invariants
//! - At most one event is being handled at any time.
//! - `shutdown` handles every event queued before it, then joins the thread.

use crate::repo::geofence_repo::GeofenceRepository;
use crate::service::transition_service::{GeofencingEvent, TransitionHandler, TransitionOutcome};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// The worker thread is gone; the event was not queued.
    Stopped,
}

impl Display for WorkerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => write!(f, "transition worker is not running"),
        }
    }
}

impl Error for WorkerError {}

enum WorkItem {
    Event(GeofencingEvent),
    Flush(mpsc::Sender<()>),
}

/// Sequential background worker for transition events.
pub struct TransitionWorker {
    sender: Option<mpsc::Sender<WorkItem>>,
    join: Option<JoinHandle<()>>,
}

impl TransitionWorker {
    /// Starts the worker thread.
    ///
    /// `on_outcome` runs on the worker thread after each handled event.
    pub fn spawn<R, O>(handler: TransitionHandler<R>, on_outcome: O) -> std::io::Result<Self>
    where
        R: GeofenceRepository + 'static,
        O: Fn(&GeofencingEvent, &TransitionOutcome) + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<WorkItem>();
        let join = thread::Builder::new()
            .name("tunity-transitions".to_string())
            .spawn(move || {
                info!("event=transition_worker module=transition status=start");
                for item in receiver {
                    match item {
                        WorkItem::Event(event) => {
                            let outcome = handler.handle(&event);
                            on_outcome(&event, &outcome);
                        }
                        WorkItem::Flush(done) => {
                            let _ = done.send(());
                        }
                    }
                }
                info!("event=transition_worker module=transition status=stop");
            })?;

        Ok(Self {
            sender: Some(sender),
            join: Some(join),
        })
    }

    /// Queues an event and returns immediately.
    pub fn enqueue(&self, event: GeofencingEvent) -> Result<(), WorkerError> {
        self.send(WorkItem::Event(event))
    }

    /// Blocks until every event queued before this call has been handled.
    pub fn flush(&self) -> Result<(), WorkerError> {
        let (done, wait) = mpsc::channel();
        self.send(WorkItem::Flush(done))?;
        wait.recv().map_err(|_| WorkerError::Stopped)
    }

    /// Drains the queue and joins the worker thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn send(&self, item: WorkItem) -> Result<(), WorkerError> {
        let sender = self.sender.as_ref().ok_or(WorkerError::Stopped)?;
        sender.send(item).map_err(|_| WorkerError::Stopped)
    }

    fn stop(&mut self) {
        // Dropping the sender ends the receive loop after the backlog.
        self.sender.take();
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!("event=transition_worker module=transition status=error error_code=worker_panicked");
            }
        }
    }
}

impl Drop for TransitionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
