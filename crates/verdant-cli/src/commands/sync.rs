use std::path::Path;

use verdant_core::collector::CollectorClient;
use verdant_core::db::LibSqlRecordRepository;
use verdant_core::signals::Connectivity;
use verdant_core::sync::{SyncEngine, SyncPolicy};

use crate::commands::common::{load_settings, open_database, sync_outcome_message};
use crate::error::CliError;

pub async fn run_sync(offline: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let settings = load_settings(&db).await?;

    let engine = SyncEngine::new(
        LibSqlRecordRepository::new(db.connection()),
        CollectorClient::new(),
        Connectivity::new(!offline),
        settings.collector_endpoint,
        SyncPolicy {
            auto_sync_on_reconnect: settings.auto_sync_on_reconnect,
        },
    );

    let outcome = engine.sync_all().await?;
    println!("{}", sync_outcome_message(outcome));
    Ok(())
}
