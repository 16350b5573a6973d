//! Reconciliation of local records with the remote snapshot.
//!
//! Pure: no storage or network access. Remote entries are inserted first,
//! then local records overwrite any entry sharing an identity — the local
//! store is the freshest source for anything it knows about, while
//! remote-only entries (captured on other devices) still surface.

use std::collections::HashMap;

use serde::Serialize;

use crate::collector::RemoteEntry;
use crate::models::{GeoFix, HealthStatus, ObservationRecord};

/// Where a reconciled record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordOrigin {
    Remote,
    Local,
}

/// One row of the unified reporting view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledRecord {
    pub id: String,
    pub tree_number: u32,
    pub species: String,
    pub height_cm: f64,
    pub health: HealthStatus,
    pub supervisor: String,
    pub captured_display: String,
    /// Local records carry the photo payload; remote ones a drive link
    pub photo_ref: String,
    pub gps: Option<GeoFix>,
    pub origin: RecordOrigin,
}

impl From<&ObservationRecord> for ReconciledRecord {
    fn from(record: &ObservationRecord) -> Self {
        Self {
            id: record.id.to_string(),
            tree_number: record.tree_number,
            species: record.species.clone(),
            height_cm: record.height_cm,
            health: record.health,
            supervisor: record.supervisor.clone(),
            captured_display: record.captured_at_display.clone(),
            photo_ref: record.photo.clone(),
            gps: record.gps,
            origin: RecordOrigin::Local,
        }
    }
}

impl From<&RemoteEntry> for ReconciledRecord {
    fn from(entry: &RemoteEntry) -> Self {
        Self {
            id: entry.id.clone(),
            tree_number: entry.tree_number,
            species: entry.species.clone(),
            height_cm: entry.height_cm,
            health: entry.health,
            supervisor: entry.supervisor.clone(),
            captured_display: entry.date_display.clone(),
            photo_ref: entry.photo_link.clone(),
            gps: entry.gps,
            origin: RecordOrigin::Remote,
        }
    }
}

/// Derived, ephemeral identity→record view; insertion order preserved
#[derive(Debug, Default)]
pub struct ReconciledView {
    records: Vec<ReconciledRecord>,
    index: HashMap<String, usize>,
}

impl ReconciledView {
    fn insert(&mut self, record: ReconciledRecord) {
        if let Some(&position) = self.index.get(&record.id) {
            self.records[position] = record;
        } else {
            self.index.insert(record.id.clone(), self.records.len());
            self.records.push(record);
        }
    }

    #[must_use]
    pub fn records(&self) -> &[ReconciledRecord] {
        &self.records
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ReconciledRecord> {
        self.index.get(id).map(|&position| &self.records[position])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Observations per supervisor, most productive first
    #[must_use]
    pub fn supervisor_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in &self.records {
            *counts.entry(record.supervisor.as_str()).or_default() += 1;
        }
        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    /// Record count per health status, in `HealthStatus::ALL` order
    #[must_use]
    pub fn health_counts(&self) -> Vec<(HealthStatus, usize)> {
        HealthStatus::ALL
            .into_iter()
            .map(|status| {
                let count = self
                    .records
                    .iter()
                    .filter(|record| record.health == status)
                    .count();
                (status, count)
            })
            .collect()
    }
}

/// Merge the remote snapshot with the local store snapshot, local-wins.
#[must_use]
pub fn merge(remote: &[RemoteEntry], local: &[ObservationRecord]) -> ReconciledView {
    let mut view = ReconciledView::default();
    for entry in remote {
        view.insert(ReconciledRecord::from(entry));
    }
    for record in local {
        view.insert(ReconciledRecord::from(record));
    }
    view
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]

    use super::*;
    use crate::models::{CaptureDefaults, RecordId};
    use chrono::{TimeZone, Utc};

    fn local_record(id: &str, supervisor: &str, height_cm: f64) -> ObservationRecord {
        ObservationRecord {
            id: id.parse::<RecordId>().unwrap(),
            captured_at: Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap(),
            captured_at_display: "07/03/2024, 09.05".to_string(),
            gps: None,
            coordinates: "0.000000,0.000000".to_string(),
            job: String::new(),
            height_cm,
            species: "Sengon".to_string(),
            planting_year: 2024,
            supervisor: supervisor.to_string(),
            vendor: String::new(),
            crew: String::new(),
            health: HealthStatus::Healthy,
            tree_number: 1,
            description: None,
            drive_link: None,
            duplicate_status: "UNIQUE".to_string(),
            verification_status: None,
            photo: "data:image/jpeg;base64,Zm9v".to_string(),
            uploaded: false,
        }
    }

    fn remote_entry(id: &str, supervisor: &str, height_cm: f64) -> RemoteEntry {
        RemoteEntry {
            id: id.to_string(),
            tree_number: 9,
            species: "Mahogany".to_string(),
            height_cm,
            health: HealthStatus::Ailing,
            supervisor: supervisor.to_string(),
            date_display: "-".to_string(),
            photo_link: "https://drive.example.com/d/abc/view".to_string(),
            gps: None,
        }
    }

    #[test]
    fn test_merge_remote_only_and_local_only() {
        let remote = vec![remote_entry("r1", "Asep", 30.0)];
        let local = vec![local_record("l1", "Budi", 40.0)];

        let view = merge(&remote, &local);
        assert_eq!(view.len(), 2);
        assert_eq!(view.get("r1").unwrap().origin, RecordOrigin::Remote);
        assert_eq!(view.get("l1").unwrap().origin, RecordOrigin::Local);
    }

    #[test]
    fn test_merge_local_wins_exactly() {
        let shared = "20240307-090502042";
        let remote = vec![remote_entry(shared, "Asep", 30.0)];
        let local = vec![local_record(shared, "Budi", 40.0)];

        let view = merge(&remote, &local);
        assert_eq!(view.len(), 1);

        let merged = view.get(shared).unwrap();
        assert_eq!(merged, &ReconciledRecord::from(&local[0]));
        assert_eq!(merged.supervisor, "Budi");
        assert_eq!(merged.height_cm, 40.0);
        assert_eq!(merged.origin, RecordOrigin::Local);
    }

    #[test]
    fn test_merge_preserves_remote_first_order() {
        let remote = vec![remote_entry("r1", "Asep", 30.0), remote_entry("r2", "Asep", 31.0)];
        let local = vec![local_record("l1", "Budi", 40.0)];

        let view = merge(&remote, &local);
        let ids: Vec<&str> = view.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["r1", "r2", "l1"]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let remote = vec![
            remote_entry("r1", "Asep", 30.0),
            remote_entry("shared", "Asep", 30.0),
        ];
        let local = vec![
            local_record("shared", "Budi", 40.0),
            local_record("l1", "Budi", 41.0),
        ];

        let first = merge(&remote, &local);
        let second = merge(&remote, &local);
        assert_eq!(first.records(), second.records());
    }

    #[test]
    fn test_merge_empty_inputs() {
        let view = merge(&[], &[]);
        assert!(view.is_empty());
    }

    #[test]
    fn test_supervisor_counts_sorted_desc() {
        let local = vec![
            local_record("a", "Budi", 1.0),
            local_record("b", "Asep", 1.0),
            local_record("c", "Budi", 1.0),
        ];
        let view = merge(&[], &local);
        assert_eq!(
            view.supervisor_counts(),
            vec![("Budi".to_string(), 2), ("Asep".to_string(), 1)]
        );
    }

    #[test]
    fn test_health_counts_cover_all_statuses() {
        let remote = vec![remote_entry("r1", "Asep", 30.0)]; // Ailing
        let local = vec![local_record("l1", "Budi", 40.0)]; // Healthy
        let view = merge(&remote, &local);
        assert_eq!(
            view.health_counts(),
            vec![
                (HealthStatus::Healthy, 1),
                (HealthStatus::Ailing, 1),
                (HealthStatus::Dead, 0),
            ]
        );
    }

    #[test]
    fn test_local_conversion_carries_photo_payload() {
        let record = crate::capture::build_record(
            &CaptureDefaults::default(),
            None,
            "data:image/jpeg;base64,Zm9v".to_string(),
            1,
        );
        let reconciled = ReconciledRecord::from(&record);
        assert_eq!(reconciled.photo_ref, "data:image/jpeg;base64,Zm9v");
    }
}
