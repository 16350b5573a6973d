use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use verdant_core::db::{Database, LibSqlSettingsRepository, SettingsRepository};
use verdant_core::models::Settings;
use verdant_core::sync::{CaptureStatus, SavedLocallyReason, SyncOutcome};
use verdant_core::ObservationRecord;

use crate::error::CliError;

/// Open (and migrate) the local database, creating parent directories.
pub async fn open_database(db_path: &Path) -> Result<Database, CliError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::debug!("opening database at {}", db_path.display());
    Ok(Database::open(db_path).await?)
}

pub async fn load_settings(db: &Database) -> Result<Settings, CliError> {
    let repo = LibSqlSettingsRepository::new(db.connection());
    Ok(repo.load().await?)
}

pub async fn save_settings(db: &Database, settings: &Settings) -> Result<(), CliError> {
    let repo = LibSqlSettingsRepository::new(db.connection());
    repo.save(settings).await?;
    Ok(())
}

/// Read a photo file into the opaque data-URL form the core stores.
pub fn photo_data_url(path: &Path) -> Result<String, CliError> {
    let bytes = std::fs::read(path)
        .map_err(|error| CliError::PhotoUnreadable(format!("{}: {error}", path.display())))?;
    let mime = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

/// Flat observation row for `--json` output (photo payload omitted).
#[derive(Debug, Serialize)]
pub struct RecordListItem {
    pub id: String,
    pub captured_at: String,
    pub captured_at_display: String,
    pub tree_number: u32,
    pub species: String,
    pub height_cm: f64,
    pub health: String,
    pub supervisor: String,
    pub coordinates: String,
    pub uploaded: bool,
}

impl From<&ObservationRecord> for RecordListItem {
    fn from(record: &ObservationRecord) -> Self {
        Self {
            id: record.id.to_string(),
            captured_at: record.captured_at.to_rfc3339(),
            captured_at_display: record.captured_at_display.clone(),
            tree_number: record.tree_number,
            species: record.species.clone(),
            height_cm: record.height_cm,
            health: record.health.to_string(),
            supervisor: record.supervisor.clone(),
            coordinates: record.coordinates.clone(),
            uploaded: record.uploaded,
        }
    }
}

/// One-line human rendering of a stored observation.
pub fn record_line(record: &ObservationRecord) -> String {
    let status = if record.uploaded { "uploaded" } else { "pending" };
    format!(
        "{}  #{:<4} {:<10} {:>6.1} cm  {:<8} {}  [{status}]",
        record.id,
        record.tree_number,
        record.species,
        record.height_cm,
        record.health,
        record.captured_at_display,
    )
}

/// Operator-facing message for a capture outcome.
pub fn capture_status_message(status: CaptureStatus) -> &'static str {
    match status {
        CaptureStatus::Uploaded => "Observation uploaded to the collector.",
        CaptureStatus::SavedLocally(SavedLocallyReason::Offline) => {
            "Saved locally (offline). It will upload on the next sync."
        }
        CaptureStatus::SavedLocally(SavedLocallyReason::EndpointUnconfigured) => {
            "Saved locally. Set a collector endpoint to enable uploads."
        }
        CaptureStatus::SavedLocally(SavedLocallyReason::UploadFailed) => {
            "Upload failed, saved locally. It will retry on the next sync."
        }
    }
}

/// Operator-facing message for a sync pass.
pub fn sync_outcome_message(outcome: SyncOutcome) -> String {
    match outcome {
        SyncOutcome::AlreadySynced => "All observations already synced.".to_string(),
        SyncOutcome::Offline => "No connectivity; cannot sync now.".to_string(),
        SyncOutcome::NotConfigured => {
            "Collector endpoint not configured; nothing uploaded.".to_string()
        }
        SyncOutcome::Completed {
            attempted,
            uploaded,
        } => {
            if uploaded == 0 {
                format!("Sync failed: 0 of {attempted} observations uploaded.")
            } else {
                format!("{uploaded} of {attempted} observations uploaded.")
            }
        }
    }
}
