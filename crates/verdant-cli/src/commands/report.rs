use std::path::Path;

use serde::Serialize;
use verdant_core::collector::CollectorClient;
use verdant_core::db::{LibSqlRecordRepository, RecordRepository};
use verdant_core::reconcile::{self, RecordOrigin, ReconciledRecord};
use verdant_core::signals::Connectivity;
use verdant_core::sync::{SyncEngine, SyncPolicy};
use verdant_core::HealthStatus;

use crate::commands::common::{load_settings, open_database};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct ReportJson<'a> {
    total: usize,
    local: usize,
    remote: usize,
    supervisors: Vec<(String, usize)>,
    health: Vec<(HealthStatus, usize)>,
    records: &'a [ReconciledRecord],
}

pub async fn run_report(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let settings = load_settings(&db).await?;

    let engine = SyncEngine::new(
        LibSqlRecordRepository::new(db.connection()),
        CollectorClient::new(),
        Connectivity::default(),
        settings.collector_endpoint,
        SyncPolicy {
            auto_sync_on_reconnect: settings.auto_sync_on_reconnect,
        },
    );

    // A report is still useful with local data only; a remote fetch failure
    // degrades rather than aborts.
    let remote = match engine.fetch_remote().await {
        Ok(entries) => entries,
        Err(error) => {
            eprintln!("Warning: could not fetch remote data ({error}); local records only.");
            Vec::new()
        }
    };
    let local = engine.records().all().await?;
    let view = reconcile::merge(&remote, &local);

    let local_count = view
        .records()
        .iter()
        .filter(|record| record.origin == RecordOrigin::Local)
        .count();
    let remote_count = view.len() - local_count;

    if as_json {
        let report = ReportJson {
            total: view.len(),
            local: local_count,
            remote: remote_count,
            supervisors: view.supervisor_counts(),
            health: view.health_counts(),
            records: view.records(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} observations ({local_count} local, {remote_count} remote-only)",
        view.len()
    );

    let supervisors = view.supervisor_counts();
    if !supervisors.is_empty() {
        println!("\nBy supervisor:");
        for (name, count) in supervisors {
            let name = if name.is_empty() { "(unset)" } else { &name };
            println!("  {name:<20} {count}");
        }
    }

    println!("\nBy health:");
    for (status, count) in view.health_counts() {
        println!("  {status:<20} {count}");
    }

    Ok(())
}
