//! Observation record repository implementation

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // SQLite stores INTEGER as i64

use crate::error::{Error, Result};
use crate::models::{GeoFix, HealthStatus, ObservationRecord, RecordId};
use chrono::{DateTime, Utc};
use libsql::{params, Connection, Row};

const RECORD_COLUMNS: &str = "id, captured_at, captured_at_display, latitude, longitude, \
     accuracy_m, coordinates, job, height_cm, species, planting_year, supervisor, vendor, \
     crew, health, tree_number, description, drive_link, duplicate_status, \
     verification_status, photo, uploaded";

/// Trait for record store operations (async)
///
/// The store is append-only for records and update-in-place for the single
/// mutable field (`uploaded`). Every write is awaited before returning, so
/// durability is synchronous to the caller.
#[allow(async_fn_in_trait)]
pub trait RecordRepository {
    /// Append a new record with pending status.
    ///
    /// An existing identity is an invariant violation
    /// (`Error::DuplicateRecord`), not a recoverable condition.
    async fn append(&self, record: &ObservationRecord) -> Result<()>;

    /// Flip the record's sync status to uploaded. No-op when the identity
    /// is unknown.
    async fn mark_uploaded(&self, id: &RecordId) -> Result<()>;

    /// Full owned snapshot, newest capture first (insertion order as the
    /// tie-breaker).
    async fn all(&self) -> Result<Vec<ObservationRecord>>;

    /// Records still awaiting upload, oldest capture first so retries
    /// replay capture order.
    async fn pending(&self) -> Result<Vec<ObservationRecord>>;

    /// Number of records in the store
    async fn count(&self) -> Result<usize>;

    /// Irreversibly empty the store. Callers must have obtained the
    /// operator's confirmation before invoking this.
    async fn clear(&self) -> Result<()>;
}

/// libSQL implementation of `RecordRepository`
pub struct LibSqlRecordRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlRecordRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a record from a database row
    fn parse_record(row: &Row) -> Result<ObservationRecord> {
        let id: String = row.get(0)?;
        let captured_at: String = row.get(1)?;
        let captured_at = DateTime::parse_from_rfc3339(&captured_at)
            .map_err(|e| Error::InvalidInput(format!("stored timestamp unparseable: {e}")))?
            .with_timezone(&Utc);

        let latitude: Option<f64> = row.get(3)?;
        let longitude: Option<f64> = row.get(4)?;
        let accuracy_m: Option<f64> = row.get(5)?;
        let gps = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoFix {
                latitude,
                longitude,
                accuracy_m: accuracy_m.unwrap_or(0.0),
            }),
            _ => None,
        };

        let health: String = row.get(14)?;

        Ok(ObservationRecord {
            id: id.parse()?,
            captured_at,
            captured_at_display: row.get(2)?,
            gps,
            coordinates: row.get(6)?,
            job: row.get(7)?,
            height_cm: row.get(8)?,
            species: row.get(9)?,
            planting_year: row.get::<i64>(10)? as i32,
            supervisor: row.get(11)?,
            vendor: row.get(12)?,
            crew: row.get(13)?,
            health: HealthStatus::parse_lenient(&health).unwrap_or_default(),
            tree_number: row.get::<i64>(15)? as u32,
            description: row.get(16)?,
            drive_link: row.get(17)?,
            duplicate_status: row.get(18)?,
            verification_status: row.get(19)?,
            photo: row.get(20)?,
            uploaded: row.get::<i32>(21)? != 0,
        })
    }

    async fn query_records(&self, sql: &str) -> Result<Vec<ObservationRecord>> {
        let mut rows = self.conn.query(sql, ()).await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::parse_record(&row)?);
        }
        Ok(records)
    }
}

impl RecordRepository for LibSqlRecordRepository<'_> {
    async fn append(&self, record: &ObservationRecord) -> Result<()> {
        let mut rows = self
            .conn
            .query(
                "SELECT EXISTS(SELECT 1 FROM records WHERE id = ?)",
                [record.id.as_str()],
            )
            .await?;
        let exists = rows
            .next()
            .await?
            .is_some_and(|row| row.get::<i32>(0).unwrap_or(0) != 0);
        if exists {
            return Err(Error::DuplicateRecord(record.id.to_string()));
        }

        self.conn
            .execute(
                "INSERT INTO records (
                    id, captured_at, captured_at_display, latitude, longitude, accuracy_m,
                    coordinates, job, height_cm, species, planting_year, supervisor, vendor,
                    crew, health, tree_number, description, drive_link, duplicate_status,
                    verification_status, photo, uploaded
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    record.id.as_str(),
                    record.captured_at.to_rfc3339(),
                    record.captured_at_display.as_str(),
                    record.gps.map(|fix| fix.latitude),
                    record.gps.map(|fix| fix.longitude),
                    record.gps.map(|fix| fix.accuracy_m),
                    record.coordinates.as_str(),
                    record.job.as_str(),
                    record.height_cm,
                    record.species.as_str(),
                    i64::from(record.planting_year),
                    record.supervisor.as_str(),
                    record.vendor.as_str(),
                    record.crew.as_str(),
                    record.health.as_str(),
                    i64::from(record.tree_number),
                    record.description.clone(),
                    record.drive_link.clone(),
                    record.duplicate_status.as_str(),
                    record.verification_status.clone(),
                    record.photo.as_str(),
                    i32::from(record.uploaded),
                ],
            )
            .await?;

        Ok(())
    }

    async fn mark_uploaded(&self, id: &RecordId) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE records SET uploaded = 1 WHERE id = ?",
                [id.as_str()],
            )
            .await?;

        if changed == 0 {
            // Should not occur in the normal flow; the status flip only
            // follows a successful append.
            tracing::debug!("mark_uploaded: no record with id {id}");
        }

        Ok(())
    }

    async fn all(&self) -> Result<Vec<ObservationRecord>> {
        self.query_records(&format!(
            "SELECT {RECORD_COLUMNS} FROM records ORDER BY captured_at DESC, rowid DESC"
        ))
        .await
    }

    async fn pending(&self) -> Result<Vec<ObservationRecord>> {
        self.query_records(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE uploaded = 0 ORDER BY rowid ASC"
        ))
        .await
    }

    async fn count(&self) -> Result<usize> {
        let mut rows = self.conn.query("SELECT COUNT(*) FROM records", ()).await?;
        let count = rows
            .next()
            .await?
            .map_or(0, |row| row.get::<i64>(0).unwrap_or(0));
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM records", ()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use chrono::TimeZone;

    fn sample_record(id: &str, tree_number: u32) -> ObservationRecord {
        ObservationRecord {
            id: id.parse().unwrap(),
            captured_at: Utc
                .with_ymd_and_hms(2024, 3, 7, 9, 5, tree_number)
                .unwrap(),
            captured_at_display: "07/03/2024, 09.05".to_string(),
            gps: Some(GeoFix {
                latitude: -2.979129,
                longitude: 115.199507,
                accuracy_m: 4.5,
            }),
            coordinates: "-2.979129,115.199507".to_string(),
            job: "Replanting".to_string(),
            height_cm: 42.0,
            species: "Sengon".to_string(),
            planting_year: 2024,
            supervisor: "Asep".to_string(),
            vendor: "GreenWorks".to_string(),
            crew: "Team A".to_string(),
            health: HealthStatus::Healthy,
            tree_number,
            description: None,
            drive_link: None,
            duplicate_status: "UNIQUE".to_string(),
            verification_status: None,
            photo: "data:image/jpeg;base64,Zm9vYmFy".to_string(),
            uploaded: false,
        }
    }

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_append_then_all_contains_pending_record() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());

        let record = sample_record("20240307-090502001", 1);
        repo.append(&record).await.unwrap();

        let all = repo.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], record);
        assert!(all[0].is_pending());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_append_duplicate_identity_is_invariant_violation() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());

        let record = sample_record("20240307-090502001", 1);
        repo.append(&record).await.unwrap();

        let err = repo.append(&record).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateRecord(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mark_uploaded_flips_status_once() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());

        let record = sample_record("20240307-090502001", 1);
        repo.append(&record).await.unwrap();
        repo.mark_uploaded(&record.id).await.unwrap();

        let all = repo.all().await.unwrap();
        assert!(all[0].uploaded);
        assert!(repo.pending().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mark_uploaded_unknown_id_is_noop() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());

        let id: RecordId = "20991231-000000000".parse().unwrap();
        repo.mark_uploaded(&id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_all_sorted_newest_capture_first() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());

        repo.append(&sample_record("20240307-090502001", 1))
            .await
            .unwrap();
        repo.append(&sample_record("20240307-090503001", 2))
            .await
            .unwrap();

        let all = repo.all().await.unwrap();
        assert_eq!(all[0].tree_number, 2);
        assert_eq!(all[1].tree_number, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pending_in_insertion_order() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());

        repo.append(&sample_record("20240307-090502001", 1))
            .await
            .unwrap();
        repo.append(&sample_record("20240307-090503001", 2))
            .await
            .unwrap();
        repo.mark_uploaded(&"20240307-090502001".parse().unwrap())
            .await
            .unwrap();

        let pending = repo.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].tree_number, 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_record_without_fix_round_trips() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());

        let mut record = sample_record("20240307-090502001", 1);
        record.gps = None;
        record.coordinates = "0.000000,0.000000".to_string();
        repo.append(&record).await.unwrap();

        let all = repo.all().await.unwrap();
        assert_eq!(all[0].gps, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_clear_empties_store() {
        let db = setup().await;
        let repo = LibSqlRecordRepository::new(db.connection());

        repo.append(&sample_record("20240307-090502001", 1))
            .await
            .unwrap();
        repo.append(&sample_record("20240307-090503001", 2))
            .await
            .unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);

        repo.clear().await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.all().await.unwrap().is_empty());
    }
}
