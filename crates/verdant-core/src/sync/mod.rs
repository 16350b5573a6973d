//! Sync orchestration: when uploads happen and how the pending/uploaded
//! invariant survives retries.
//!
//! A record has exactly two sync states: pending (initial) and uploaded
//! (terminal). There is no failed state — a failed or skipped upload leaves
//! the record pending and eligible for the next attempt, so retries are
//! unbounded and driven by connectivity or manual triggers, never by
//! attempt counters.

use crate::collector::{endpoint_ready, Collector, RemoteEntry, UploadDispatch};
use crate::db::RecordRepository;
use crate::error::Result;
use crate::models::ObservationRecord;
use crate::signals::Connectivity;

/// Orchestration policy knobs
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncPolicy {
    /// Whether an offline→online transition should request a full sync.
    /// Off by default: reconnecting only refreshes connectivity state.
    pub auto_sync_on_reconnect: bool,
}

/// Why a captured record stayed pending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavedLocallyReason {
    Offline,
    EndpointUnconfigured,
    UploadFailed,
}

/// Outcome of the capture flow. The record is durably saved in every case;
/// anything short of `Uploaded` is informational, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Uploaded,
    SavedLocally(SavedLocallyReason),
}

/// Outcome of a full sync pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No pending records; nothing to do
    AlreadySynced,
    /// No connectivity; retry later
    Offline,
    /// No usable collector endpoint configured
    NotConfigured,
    /// A pass over the pending snapshot ran to completion. Partial failure
    /// is normal: `uploaded <= attempted`, the rest stays pending.
    Completed { attempted: usize, uploaded: usize },
}

/// Coordinates the record store, the collector client, and the sampled
/// connectivity state.
///
/// All mutations flow through here in response to discrete events (capture,
/// manual sync), on one logical thread of control.
pub struct SyncEngine<R, C> {
    records: R,
    collector: C,
    connectivity: Connectivity,
    endpoint: Option<String>,
    policy: SyncPolicy,
}

impl<R: RecordRepository, C: Collector> SyncEngine<R, C> {
    pub fn new(
        records: R,
        collector: C,
        connectivity: Connectivity,
        endpoint: Option<String>,
        policy: SyncPolicy,
    ) -> Self {
        Self {
            records,
            collector,
            connectivity,
            endpoint,
            policy,
        }
    }

    /// The configured endpoint, if it passes the readiness check
    fn ready_endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .filter(|endpoint| endpoint_ready(endpoint))
    }

    /// Capture flow: durably append, then make at most one upload attempt.
    ///
    /// The append must complete before anything else; a persistence error
    /// propagates and the caller must report the observation as NOT saved.
    /// Everything after the append degrades to "saved locally".
    pub async fn capture(&self, record: ObservationRecord) -> Result<CaptureStatus> {
        self.records.append(&record).await?;
        tracing::debug!("record {} saved locally", record.id);

        if !self.connectivity.is_online() {
            return Ok(CaptureStatus::SavedLocally(SavedLocallyReason::Offline));
        }
        let Some(endpoint) = self.ready_endpoint() else {
            return Ok(CaptureStatus::SavedLocally(
                SavedLocallyReason::EndpointUnconfigured,
            ));
        };

        match self.collector.upload(endpoint, &record).await {
            Ok(UploadDispatch::Dispatched) => {
                self.records.mark_uploaded(&record.id).await?;
                Ok(CaptureStatus::Uploaded)
            }
            Ok(UploadDispatch::NotConfigured) => Ok(CaptureStatus::SavedLocally(
                SavedLocallyReason::EndpointUnconfigured,
            )),
            Err(error) => {
                tracing::warn!("upload of {} failed, record stays pending: {error}", record.id);
                Ok(CaptureStatus::SavedLocally(SavedLocallyReason::UploadFailed))
            }
        }
    }

    /// Upload every pending record, strictly sequentially.
    ///
    /// The pass runs over a snapshot of the pending set taken up front and
    /// runs to completion even if connectivity drops mid-loop; later
    /// failures just don't increment the success count. One request is in
    /// flight at a time so the collector is never flooded and failures
    /// attribute cleanly to one record.
    pub async fn sync_all(&self) -> Result<SyncOutcome> {
        let pending = self.records.pending().await?;
        if pending.is_empty() {
            return Ok(SyncOutcome::AlreadySynced);
        }
        if !self.connectivity.is_online() {
            return Ok(SyncOutcome::Offline);
        }
        let Some(endpoint) = self.ready_endpoint() else {
            return Ok(SyncOutcome::NotConfigured);
        };

        let attempted = pending.len();
        let mut uploaded = 0usize;
        for record in &pending {
            match self.collector.upload(endpoint, record).await {
                Ok(UploadDispatch::Dispatched) => {
                    self.records.mark_uploaded(&record.id).await?;
                    uploaded += 1;
                }
                Ok(UploadDispatch::NotConfigured) => {
                    tracing::debug!("endpoint no longer configured, {} stays pending", record.id);
                }
                Err(error) => {
                    tracing::warn!("upload of {} failed, stays pending: {error}", record.id);
                }
            }
        }

        tracing::info!("sync pass finished: {uploaded}/{attempted} uploaded");
        Ok(SyncOutcome::Completed {
            attempted,
            uploaded,
        })
    }

    /// Push a connectivity transition into the shared cache.
    ///
    /// Returns whether the policy wants a `sync_all` run now (true only on
    /// an offline→online edge with `auto_sync_on_reconnect` set). The
    /// engine never syncs on its own; the caller decides.
    pub fn set_online(&self, online: bool) -> bool {
        let was_online = self.connectivity.replace(online);
        online && !was_online && self.policy.auto_sync_on_reconnect
    }

    /// Sample the current connectivity state
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Fetch the remote snapshot for reconciliation. Empty when the
    /// endpoint is not configured.
    pub async fn fetch_remote(&self) -> Result<Vec<RemoteEntry>> {
        match self.ready_endpoint() {
            Some(endpoint) => self.collector.fetch_all(endpoint).await,
            None => Ok(Vec::new()),
        }
    }

    /// Access the underlying record store
    pub const fn records(&self) -> &R {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::build_record;
    use crate::collector::UploadDispatch;
    use crate::db::{Database, LibSqlRecordRepository};
    use crate::error::Error;
    use crate::models::{CaptureDefaults, ObservationRecord, RecordId};
    use std::collections::HashSet;
    use std::sync::Mutex;

    const ENDPOINT: &str = "https://collector.example.com/ingest";

    /// Scripted collector: logs dispatch order, fails listed record ids.
    #[derive(Default)]
    struct FakeCollector {
        fail_ids: Mutex<HashSet<String>>,
        uploads: Mutex<Vec<String>>,
    }

    impl FakeCollector {
        fn failing(ids: &[&str]) -> Self {
            Self {
                fail_ids: Mutex::new(ids.iter().map(ToString::to_string).collect()),
                uploads: Mutex::new(Vec::new()),
            }
        }

        fn upload_log(&self) -> Vec<String> {
            self.uploads.lock().unwrap().clone()
        }
    }

    impl Collector for &FakeCollector {
        async fn upload(
            &self,
            endpoint: &str,
            record: &ObservationRecord,
        ) -> Result<UploadDispatch> {
            if !endpoint_ready(endpoint) {
                return Ok(UploadDispatch::NotConfigured);
            }
            self.uploads.lock().unwrap().push(record.id.to_string());
            if self.fail_ids.lock().unwrap().contains(record.id.as_str()) {
                return Err(Error::InvalidResponseShape("scripted failure".into()));
            }
            Ok(UploadDispatch::Dispatched)
        }

        async fn fetch_all(&self, _endpoint: &str) -> Result<Vec<RemoteEntry>> {
            Ok(Vec::new())
        }
    }

    fn record_with_id(id: &str, tree_number: u32) -> ObservationRecord {
        let mut record = build_record(
            &CaptureDefaults::default(),
            None,
            "data:image/jpeg;base64,Zm9v".to_string(),
            tree_number,
        );
        record.id = id.parse::<RecordId>().unwrap();
        record
    }

    fn engine<'a>(
        db: &'a Database,
        collector: &'a FakeCollector,
        online: bool,
        endpoint: Option<&str>,
        policy: SyncPolicy,
    ) -> SyncEngine<LibSqlRecordRepository<'a>, &'a FakeCollector> {
        SyncEngine::new(
            LibSqlRecordRepository::new(db.connection()),
            collector,
            Connectivity::new(online),
            endpoint.map(ToString::to_string),
            policy,
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_capture_offline_saves_locally_without_upload() {
        let db = Database::open_in_memory().await.unwrap();
        let collector = FakeCollector::default();
        let engine = engine(&db, &collector, false, Some(ENDPOINT), SyncPolicy::default());

        let status = engine
            .capture(record_with_id("20240307-090502001", 1))
            .await
            .unwrap();

        assert_eq!(
            status,
            CaptureStatus::SavedLocally(SavedLocallyReason::Offline)
        );
        assert!(collector.upload_log().is_empty());
        assert_eq!(engine.records().pending().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_capture_online_dispatch_marks_uploaded() {
        let db = Database::open_in_memory().await.unwrap();
        let collector = FakeCollector::default();
        let engine = engine(&db, &collector, true, Some(ENDPOINT), SyncPolicy::default());

        let status = engine
            .capture(record_with_id("20240307-090502001", 1))
            .await
            .unwrap();

        assert_eq!(status, CaptureStatus::Uploaded);
        assert_eq!(collector.upload_log(), ["20240307-090502001"]);
        assert!(engine.records().pending().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_capture_upload_failure_stays_pending() {
        let db = Database::open_in_memory().await.unwrap();
        let collector = FakeCollector::failing(&["20240307-090502001"]);
        let engine = engine(&db, &collector, true, Some(ENDPOINT), SyncPolicy::default());

        let status = engine
            .capture(record_with_id("20240307-090502001", 1))
            .await
            .unwrap();

        assert_eq!(
            status,
            CaptureStatus::SavedLocally(SavedLocallyReason::UploadFailed)
        );
        assert_eq!(engine.records().pending().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_capture_without_endpoint_skips_upload() {
        let db = Database::open_in_memory().await.unwrap();
        let collector = FakeCollector::default();
        let engine = engine(&db, &collector, true, None, SyncPolicy::default());

        let status = engine
            .capture(record_with_id("20240307-090502001", 1))
            .await
            .unwrap();

        assert_eq!(
            status,
            CaptureStatus::SavedLocally(SavedLocallyReason::EndpointUnconfigured)
        );
        assert!(collector.upload_log().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_capture_placeholder_endpoint_skips_upload() {
        let db = Database::open_in_memory().await.unwrap();
        let collector = FakeCollector::default();
        let engine = engine(
            &db,
            &collector,
            true,
            Some("https://collector.example.com/macros/s/.../exec"),
            SyncPolicy::default(),
        );

        let status = engine
            .capture(record_with_id("20240307-090502001", 1))
            .await
            .unwrap();

        assert_eq!(
            status,
            CaptureStatus::SavedLocally(SavedLocallyReason::EndpointUnconfigured)
        );
        assert!(collector.upload_log().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sync_all_nothing_pending() {
        let db = Database::open_in_memory().await.unwrap();
        let collector = FakeCollector::default();
        let engine = engine(&db, &collector, true, Some(ENDPOINT), SyncPolicy::default());

        assert_eq!(engine.sync_all().await.unwrap(), SyncOutcome::AlreadySynced);
        assert!(collector.upload_log().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sync_all_offline_is_retryable_not_error() {
        let db = Database::open_in_memory().await.unwrap();
        let collector = FakeCollector::default();
        let engine = engine(&db, &collector, false, Some(ENDPOINT), SyncPolicy::default());

        engine
            .capture(record_with_id("20240307-090502001", 1))
            .await
            .unwrap();

        assert_eq!(engine.sync_all().await.unwrap(), SyncOutcome::Offline);
        assert!(collector.upload_log().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sync_all_partial_failure() {
        let db = Database::open_in_memory().await.unwrap();
        let collector = FakeCollector::failing(&["20240307-090502002"]);
        let engine = engine(&db, &collector, false, Some(ENDPOINT), SyncPolicy::default());

        for (i, id) in ["20240307-090502001", "20240307-090502002", "20240307-090502003"]
            .iter()
            .enumerate()
        {
            engine
                .capture(record_with_id(id, u32::try_from(i).unwrap() + 1))
                .await
                .unwrap();
        }

        engine.set_online(true);
        let outcome = engine.sync_all().await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Completed {
                attempted: 3,
                uploaded: 2
            }
        );

        let pending = engine.records().pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id.as_str(), "20240307-090502002");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_offline_captures_all_upload_after_reconnect() {
        let db = Database::open_in_memory().await.unwrap();
        let collector = FakeCollector::default();
        let engine = engine(&db, &collector, false, Some(ENDPOINT), SyncPolicy::default());

        engine
            .capture(record_with_id("20240307-090502001", 1))
            .await
            .unwrap();
        engine
            .capture(record_with_id("20240307-090502002", 2))
            .await
            .unwrap();

        engine.set_online(true);
        let outcome = engine.sync_all().await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Completed {
                attempted: 2,
                uploaded: 2
            }
        );
        assert!(engine.records().pending().await.unwrap().is_empty());
        // Sequential, in capture order
        assert_eq!(
            collector.upload_log(),
            ["20240307-090502001", "20240307-090502002"]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sync_all_without_endpoint() {
        let db = Database::open_in_memory().await.unwrap();
        let collector = FakeCollector::default();
        let engine = engine(&db, &collector, true, None, SyncPolicy::default());

        engine
            .capture(record_with_id("20240307-090502001", 1))
            .await
            .unwrap();

        assert_eq!(engine.sync_all().await.unwrap(), SyncOutcome::NotConfigured);
        assert!(collector.upload_log().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_set_online_respects_policy() {
        let db = Database::open_in_memory().await.unwrap();
        let collector = FakeCollector::default();

        let manual = engine(&db, &collector, false, Some(ENDPOINT), SyncPolicy::default());
        assert!(!manual.set_online(true));

        let auto = engine(
            &db,
            &collector,
            false,
            Some(ENDPOINT),
            SyncPolicy {
                auto_sync_on_reconnect: true,
            },
        );
        assert!(auto.set_online(true));
        // Already online: no edge, no sync request
        assert!(!auto.set_online(true));
        assert!(!auto.set_online(false));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_remote_without_endpoint_is_empty() {
        let db = Database::open_in_memory().await.unwrap();
        let collector = FakeCollector::default();
        let engine = engine(&db, &collector, true, None, SyncPolicy::default());

        assert!(engine.fetch_remote().await.unwrap().is_empty());
    }
}
