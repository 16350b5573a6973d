use std::path::Path;

use verdant_core::db::{LibSqlRecordRepository, RecordRepository};

use crate::commands::common::{open_database, record_line, RecordListItem};
use crate::error::CliError;

pub async fn run_list(
    limit: usize,
    pending_only: bool,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let repo = LibSqlRecordRepository::new(db.connection());

    let records = if pending_only {
        let mut pending = repo.pending().await?;
        // pending() is oldest-first for upload; the listing shows newest first
        pending.reverse();
        pending
    } else {
        repo.all().await?
    };
    let records = &records[..records.len().min(limit)];

    if as_json {
        let items: Vec<RecordListItem> = records.iter().map(RecordListItem::from).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if records.is_empty() {
        if pending_only {
            println!("No pending observations.");
        } else {
            println!("No observations captured yet.");
        }
        return Ok(());
    }

    for record in records {
        println!("{}", record_line(record));
    }
    Ok(())
}
