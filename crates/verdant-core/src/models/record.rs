//! Observation record model

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A unique identifier for an observation record.
///
/// Derived from the local wall clock at capture time with millisecond
/// resolution (`YYYYMMDD-HHMMSSmmm`), so rapid consecutive captures on one
/// device never collide. Identities are only guaranteed unique per device;
/// two devices capturing in the same millisecond is an acknowledged
/// limitation of the scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Create a new ID from the current wall clock
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Local::now())
    }

    /// Create an ID for a specific instant (capture time)
    #[must_use]
    pub fn from_datetime(at: DateTime<Local>) -> Self {
        Self(at.format("%Y%m%d-%H%M%S%3f").to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("record ID must not be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// A geolocation fix supplied by the positioning collaborator.
///
/// Absence (`Option::None`) is a valid, common state meaning "no fix yet"
/// and must never block capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported accuracy radius in meters
    pub accuracy_m: f64,
}

/// Plant health classification recorded by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HealthStatus {
    #[default]
    Healthy,
    Ailing,
    Dead,
}

impl HealthStatus {
    pub const ALL: [Self; 3] = [Self::Healthy, Self::Ailing, Self::Dead];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Ailing => "Ailing",
            Self::Dead => "Dead",
        }
    }

    /// Parse a health string leniently (case-insensitive), `None` when unknown.
    #[must_use]
    pub fn parse_lenient(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "healthy" => Some(Self::Healthy),
            "ailing" => Some(Self::Ailing),
            "dead" => Some(Self::Dead),
            _ => None,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_lenient(s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown health status: {s}")))
    }
}

/// One plant observation: photo + attributes + location + sync status.
///
/// Every field except `uploaded` is immutable once the record is created.
/// `uploaded` transitions `false` → `true` exactly once, after a dispatch
/// that left the device without a transport error; it never reverts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Unique identifier, wall-clock derived
    pub id: RecordId,
    /// Capture instant (machine-sortable)
    pub captured_at: DateTime<Utc>,
    /// Human-display capture timestamp
    pub captured_at_display: String,
    /// Geolocation at capture, if a fix was available
    pub gps: Option<GeoFix>,
    /// "lat,lon" display string (6 decimal places, zeros when no fix)
    pub coordinates: String,
    /// Job / work order label
    pub job: String,
    /// Plant height in centimeters
    pub height_cm: f64,
    /// Species name
    pub species: String,
    /// Year the plant went into the ground
    pub planting_year: i32,
    pub supervisor: String,
    pub vendor: String,
    /// Field crew label
    pub crew: String,
    pub health: HealthStatus,
    /// Sequential display index within this device's store
    pub tree_number: u32,
    pub description: Option<String>,
    /// Remote photo link, filled in collector-side; local captures leave it empty
    pub drive_link: Option<String>,
    /// Collector-side duplicate marker; new captures start as "UNIQUE"
    pub duplicate_status: String,
    pub verification_status: Option<String>,
    /// Opaque photo payload (base64 data-URL), treated as a blob by the core
    pub photo: String,
    /// Sync status: false = pending, true = uploaded
    pub uploaded: bool,
}

impl ObservationRecord {
    /// Whether this record still awaits a successful upload dispatch
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        !self.uploaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_id_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap()
            + chrono::Duration::milliseconds(42);
        let id = RecordId::from_datetime(at);
        assert_eq!(id.as_str(), "20240307-090502042");
    }

    #[test]
    fn test_record_id_millisecond_resolution() {
        let base = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
        let a = RecordId::from_datetime(base + chrono::Duration::milliseconds(1));
        let b = RecordId::from_datetime(base + chrono::Duration::milliseconds(2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_id_parse() {
        let id: RecordId = "20240307-090502042".parse().unwrap();
        assert_eq!(id.as_str(), "20240307-090502042");
        assert!("   ".parse::<RecordId>().is_err());
    }

    #[test]
    fn test_health_status_lenient_parse() {
        assert_eq!(
            HealthStatus::parse_lenient("healthy"),
            Some(HealthStatus::Healthy)
        );
        assert_eq!(
            HealthStatus::parse_lenient(" Dead "),
            Some(HealthStatus::Dead)
        );
        assert_eq!(HealthStatus::parse_lenient("thriving"), None);
    }

    #[test]
    fn test_health_status_round_trip() {
        for status in HealthStatus::ALL {
            assert_eq!(status.as_str().parse::<HealthStatus>().unwrap(), status);
        }
    }
}
