//! Wire shapes for the collector endpoint.
//!
//! The collector is a spreadsheet-backed ingest script with a fixed column
//! schema. Its quirks are part of the contract and are reproduced here
//! deliberately: coordinate columns use a comma decimal separator, and the
//! photo payload is sent three times (primary plus two stripped backups) so
//! a partial parse on the receiving side still lands an image.

use serde::Serialize;
use serde_json::Value;

use crate::models::{GeoFix, HealthStatus, ObservationRecord};

/// Flattened upload document, one observation per POST.
#[derive(Debug, Serialize)]
pub struct UploadDocument {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Job")]
    pub job: String,
    #[serde(rename = "Height")]
    pub height: f64,
    #[serde(rename = "Coordinates")]
    pub coordinates: String,
    /// Longitude, comma decimal separator
    #[serde(rename = "Y")]
    pub y: String,
    /// Latitude, comma decimal separator
    #[serde(rename = "X")]
    pub x: String,
    #[serde(rename = "Species")]
    pub species: String,
    #[serde(rename = "Planting Year")]
    pub planting_year: i32,
    #[serde(rename = "Supervisor")]
    pub supervisor: String,
    #[serde(rename = "Vendor")]
    pub vendor: String,
    #[serde(rename = "Crew")]
    pub crew: String,
    #[serde(rename = "Health")]
    pub health: String,
    /// Full photo data-URL, the primary payload
    #[serde(rename = "Photo")]
    pub photo: String,
    /// Path-like label used by the collector as the stored file name
    #[serde(rename = "Photo_File_Name")]
    pub photo_file_name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Drive Link")]
    pub drive_link: String,
    #[serde(rename = "Duplicate_Status")]
    pub duplicate_status: String,
    #[serde(rename = "Verification_Status")]
    pub verification_status: String,
    #[serde(rename = "Tree No")]
    pub tree_no: u32,
    /// Stripped base64 backup, kept in case the primary field is mangled
    #[serde(rename = "Base64")]
    pub base64: String,
    #[serde(rename = "RawBase64")]
    pub raw_base64: String,
}

impl UploadDocument {
    #[must_use]
    pub fn from_record(record: &ObservationRecord) -> Self {
        let (lat, lon) = record
            .gps
            .map_or((0.0, 0.0), |fix| (fix.latitude, fix.longitude));
        let stripped = strip_data_url(&record.photo).to_string();

        Self {
            id: record.id.to_string(),
            date: record.captured_at_display.clone(),
            location: record.coordinates.clone(),
            job: record.job.clone(),
            height: record.height_cm,
            coordinates: record.coordinates.clone(),
            y: comma_decimal(lon),
            x: comma_decimal(lat),
            species: record.species.clone(),
            planting_year: record.planting_year,
            supervisor: record.supervisor.clone(),
            vendor: record.vendor.clone(),
            crew: record.crew.clone(),
            health: record.health.as_str().to_string(),
            photo: record.photo.clone(),
            photo_file_name: photo_file_name(record),
            description: record.description.clone().unwrap_or_default(),
            drive_link: record.drive_link.clone().unwrap_or_default(),
            duplicate_status: record.duplicate_status.clone(),
            verification_status: record.verification_status.clone().unwrap_or_default(),
            tree_no: record.tree_number,
            base64: stripped.clone(),
            raw_base64: stripped,
        }
    }
}

/// File-name label the collector uses when storing the photo.
fn photo_file_name(record: &ObservationRecord) -> String {
    format!("Verdant_Images/observation ({}).jpg", record.id)
}

/// Render a coordinate with the collector's comma decimal separator.
fn comma_decimal(value: f64) -> String {
    value.to_string().replace('.', ",")
}

/// Base64 body of a data-URL; the input unchanged when it isn't one.
fn strip_data_url(photo: &str) -> &str {
    photo.split_once(',').map_or(photo, |(_, body)| body)
}

/// One row of the remote snapshot, coerced into canonical form.
///
/// The collector serves back what the spreadsheet holds: numeric fields may
/// be JSON numbers or locale-formatted strings, and any field may be absent.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEntry {
    pub id: String,
    pub tree_number: u32,
    pub species: String,
    pub height_cm: f64,
    pub health: HealthStatus,
    pub supervisor: String,
    pub date_display: String,
    /// Remote photo reference (a drive link, not a payload)
    pub photo_link: String,
    pub gps: Option<GeoFix>,
}

impl RemoteEntry {
    /// Coerce a raw snapshot row. `None` when the row has no usable `ID`.
    ///
    /// Unparseable coordinates degrade to "no geolocation" rather than
    /// failing the row.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = coerce_string(value.get("ID")?)?;

        let gps = match (
            value.get("X").and_then(coerce_f64),
            value.get("Y").and_then(coerce_f64),
        ) {
            (Some(latitude), Some(longitude)) => Some(GeoFix {
                latitude,
                longitude,
                accuracy_m: 0.0,
            }),
            _ => None,
        };

        Some(Self {
            id,
            tree_number: value
                .get("Tree No")
                .and_then(coerce_f64)
                .map_or(0, |n| n.max(0.0) as u32),
            species: value
                .get("Species")
                .and_then(coerce_string)
                .unwrap_or_else(|| "Unknown".to_string()),
            height_cm: value.get("Height").and_then(coerce_f64).unwrap_or(0.0),
            health: value
                .get("Health")
                .and_then(coerce_string)
                .and_then(|h| HealthStatus::parse_lenient(&h))
                .unwrap_or_default(),
            supervisor: value
                .get("Supervisor")
                .and_then(coerce_string)
                .unwrap_or_else(|| "N/A".to_string()),
            date_display: value
                .get("Date")
                .and_then(coerce_string)
                .unwrap_or_else(|| "-".to_string()),
            photo_link: value
                .get("Drive Link")
                .and_then(coerce_string)
                .unwrap_or_default(),
            gps,
        })
    }
}

/// Numeric coercion tolerant of the collector's locale formatting.
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

fn coerce_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
