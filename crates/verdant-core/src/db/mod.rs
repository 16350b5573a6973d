//! Database layer for Verdant

mod connection;
mod migrations;
mod record_repository;
mod settings_repository;

pub use connection::Database;
pub use record_repository::{LibSqlRecordRepository, RecordRepository};
pub use settings_repository::{LibSqlSettingsRepository, SettingsRepository};
