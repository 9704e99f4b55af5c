//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `tunity_core` linkage without the Flutter host.
//! - Print the geofences stored in the configured database.

use tunity_core::db::{open_db, SqlitePreferences};
use tunity_core::repo::geofence_repo::GEOFENCE_PREFS_NAMESPACE;
use tunity_core::{GeofenceRepository, PreferencesGeofenceRepository, TunityConfig};

fn main() {
    println!("tunity_core ping={}", tunity_core::ping());
    println!("tunity_core version={}", tunity_core::core_version());

    let config = TunityConfig::from_env();
    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("failed to open {}: {err}", config.db_path.display());
            std::process::exit(1);
        }
    };
    let repo =
        PreferencesGeofenceRepository::new(SqlitePreferences::new(conn, GEOFENCE_PREFS_NAMESPACE));

    match repo.get_all() {
        Ok(records) => {
            println!("geofences={}", records.len());
            for record in records {
                match record.to_region() {
                    Some(region) => println!(
                        "{} lat={} lng={} radius_m={}",
                        record.id, region.center.latitude, region.center.longitude, region.radius_m
                    ),
                    None => println!("{} incomplete", record.id),
                }
            }
        }
        Err(err) => {
            eprintln!("failed to read geofences: {err}");
            std::process::exit(1);
        }
    }
}
