use std::path::Path;

use verdant_core::capture::{build_record, embed_metadata, NoopEmbedder};
use verdant_core::collector::CollectorClient;
use verdant_core::db::{LibSqlRecordRepository, RecordRepository};
use verdant_core::models::{CaptureDefaults, GeoFix};
use verdant_core::signals::{Connectivity, LatestFix};
use verdant_core::sync::{SyncEngine, SyncPolicy};

use crate::cli::HealthArg;
use crate::commands::common::{capture_status_message, load_settings, open_database, photo_data_url};
use crate::error::CliError;

pub struct CaptureArgs<'a> {
    pub photo: &'a Path,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub accuracy: f64,
    pub height: Option<f64>,
    pub species: Option<String>,
    pub year: Option<i32>,
    pub job: Option<String>,
    pub supervisor: Option<String>,
    pub vendor: Option<String>,
    pub crew: Option<String>,
    pub health: Option<HealthArg>,
    pub offline: bool,
}

pub async fn run_capture(args: CaptureArgs<'_>, db_path: &Path) -> Result<(), CliError> {
    let photo = photo_data_url(args.photo)?;

    let db = open_database(db_path).await?;
    let settings = load_settings(&db).await?;
    let defaults = merge_defaults(settings.defaults, &args);

    // The CLI stands in for the position watcher: a manual fix is pushed
    // into the cache, and capture samples whatever is there (possibly none).
    let latest_fix = LatestFix::new();
    if let (Some(latitude), Some(longitude)) = (args.lat, args.lon) {
        latest_fix.update(GeoFix {
            latitude,
            longitude,
            accuracy_m: args.accuracy,
        });
    }

    let repo = LibSqlRecordRepository::new(db.connection());
    let tree_number = u32::try_from(repo.count().await? + 1).unwrap_or(u32::MAX);

    let record = embed_metadata(
        &NoopEmbedder,
        build_record(&defaults, latest_fix.sample(), photo, tree_number),
    );
    let id = record.id.clone();

    let engine = SyncEngine::new(
        repo,
        CollectorClient::new(),
        Connectivity::new(!args.offline),
        settings.collector_endpoint,
        SyncPolicy {
            auto_sync_on_reconnect: settings.auto_sync_on_reconnect,
        },
    );

    match engine.capture(record).await {
        Ok(status) => {
            println!("{id}");
            println!("{}", capture_status_message(status));
            Ok(())
        }
        Err(error) => {
            // Persistence failure means the observation was NOT saved; the
            // operator must hear that loudly, there is no retry path.
            if error.is_persistence_failure() {
                eprintln!("Observation was NOT saved.");
            }
            Err(error.into())
        }
    }
}

fn merge_defaults(mut defaults: CaptureDefaults, args: &CaptureArgs<'_>) -> CaptureDefaults {
    if let Some(height) = args.height {
        defaults.height_cm = height;
    }
    if let Some(species) = &args.species {
        defaults.species.clone_from(species);
    }
    if let Some(year) = args.year {
        defaults.planting_year = year;
    }
    if let Some(job) = &args.job {
        defaults.job.clone_from(job);
    }
    if let Some(supervisor) = &args.supervisor {
        defaults.supervisor.clone_from(supervisor);
    }
    if let Some(vendor) = &args.vendor {
        defaults.vendor.clone_from(vendor);
    }
    if let Some(crew) = &args.crew {
        defaults.crew.clone_from(crew);
    }
    if let Some(health) = args.health {
        defaults.health = health.into();
    }
    defaults
}
