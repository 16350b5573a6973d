//! Capture flow: assembling an observation record from the operator's
//! sticky defaults, the sampled GPS fix, and the finished photo payload.

use chrono::Local;

use crate::error::Result;
use crate::models::{CaptureDefaults, GeoFix, ObservationRecord, RecordId};

/// Collaborator that burns record metadata into the photo payload before it
/// is persisted (EXIF or similar — the format is its business, not ours).
pub trait MetadataEmbedder {
    fn embed(&self, photo: &str, record: &ObservationRecord) -> Result<String>;
}

/// Embedder that leaves the payload untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmbedder;

impl MetadataEmbedder for NoopEmbedder {
    fn embed(&self, photo: &str, _record: &ObservationRecord) -> Result<String> {
        Ok(photo.to_string())
    }
}

/// Build a new pending record from capture-time inputs.
///
/// The identity and both timestamps come from the wall clock at this call;
/// `tree_number` is the sequential display index (store count + 1). A
/// missing fix yields zeroed display coordinates and no stored geolocation.
#[must_use]
pub fn build_record(
    defaults: &CaptureDefaults,
    fix: Option<GeoFix>,
    photo: String,
    tree_number: u32,
) -> ObservationRecord {
    let now = Local::now();
    let (lat, lon) = fix.map_or((0.0, 0.0), |fix| (fix.latitude, fix.longitude));
    let coordinates = format!("{lat:.6},{lon:.6}");

    ObservationRecord {
        id: RecordId::from_datetime(now),
        captured_at: now.to_utc(),
        captured_at_display: now.format("%d/%m/%Y, %H.%M.%S").to_string(),
        gps: fix,
        coordinates,
        job: defaults.job.clone(),
        height_cm: defaults.height_cm,
        species: defaults.species.clone(),
        planting_year: defaults.planting_year,
        supervisor: defaults.supervisor.clone(),
        vendor: defaults.vendor.clone(),
        crew: defaults.crew.clone(),
        health: defaults.health,
        tree_number,
        description: None,
        drive_link: None,
        duplicate_status: "UNIQUE".to_string(),
        verification_status: None,
        photo,
        uploaded: false,
    }
}

/// Run the metadata embedder over a freshly built record.
///
/// A failing embedder is not fatal: the un-embedded payload is kept and the
/// failure logged, because losing the observation over a metadata frill is
/// never acceptable.
#[must_use]
pub fn embed_metadata<E: MetadataEmbedder>(
    embedder: &E,
    mut record: ObservationRecord,
) -> ObservationRecord {
    match embedder.embed(&record.photo, &record) {
        Ok(photo) => record.photo = photo,
        Err(error) => {
            tracing::warn!("metadata embedding failed, keeping raw photo: {error}");
        }
    }
    record
}
