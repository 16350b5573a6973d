//! verdant-core - Core library for Verdant
//!
//! This crate contains the shared models, record store, collector client,
//! reconciliation engine, and sync orchestration used by all Verdant
//! interfaces. Every capture is durably saved locally before any network
//! attempt; uploads are opportunistic and retried forever.

pub mod capture;
pub mod collector;
pub mod db;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod signals;
pub mod sync;

pub use error::{Error, Result};
pub use models::{GeoFix, HealthStatus, ObservationRecord, RecordId};
