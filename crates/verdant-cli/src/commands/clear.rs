use std::path::Path;

use verdant_core::db::{LibSqlRecordRepository, RecordRepository};

use crate::commands::common::open_database;
use crate::error::CliError;

pub async fn run_clear(confirmed: bool, db_path: &Path) -> Result<(), CliError> {
    if !confirmed {
        return Err(CliError::ClearNotConfirmed);
    }

    let db = open_database(db_path).await?;
    let repo = LibSqlRecordRepository::new(db.connection());
    let count = repo.count().await?;
    repo.clear().await?;
    tracing::info!("cleared {count} records from the local store");

    println!("Deleted {count} local observations.");
    Ok(())
}
