//! Persisted application settings

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::record::HealthStatus;

/// Sticky form values applied to each new capture.
///
/// Field crews set these once per site visit (supervisor, vendor, crew, job)
/// and only adjust height/species per plant, so the defaults survive
/// restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureDefaults {
    pub height_cm: f64,
    pub species: String,
    pub planting_year: i32,
    pub job: String,
    pub supervisor: String,
    pub vendor: String,
    pub crew: String,
    pub health: HealthStatus,
}

impl Default for CaptureDefaults {
    fn default() -> Self {
        Self {
            height_cm: 10.0,
            species: "Sengon".to_string(),
            planting_year: Utc::now().year(),
            job: String::new(),
            supervisor: String::new(),
            vendor: String::new(),
            crew: String::new(),
            health: HealthStatus::Healthy,
        }
    }
}

/// Application settings persisted in the local database
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Collector endpoint URL; `None` or a placeholder means uploads are
    /// silently skipped (configuration-readiness, not an error)
    pub collector_endpoint: Option<String>,
    /// Whether an offline→online transition should request a full sync
    pub auto_sync_on_reconnect: bool,
    /// Sticky capture form defaults
    pub defaults: CaptureDefaults,
}
