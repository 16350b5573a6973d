//! Data models for Verdant

mod record;
mod settings;

pub use record::{GeoFix, HealthStatus, ObservationRecord, RecordId};
pub use settings::{CaptureDefaults, Settings};
