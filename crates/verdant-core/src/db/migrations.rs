//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    // Check if schema_version table exists
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Migration to version 1: Initial schema
async fn migrate_v1(conn: &Connection) -> Result<()> {
    // libsql doesn't have execute_batch, so we run each statement separately
    // Using a transaction for atomicity

    conn.execute("BEGIN TRANSACTION", ()).await?;

    let statements = [
        // Schema version tracking
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        // Observation records. rowid doubles as the insertion-order
        // fallback sort key; all columns except uploaded are immutable.
        "CREATE TABLE IF NOT EXISTS records (
            id TEXT PRIMARY KEY,
            captured_at TEXT NOT NULL,
            captured_at_display TEXT NOT NULL,
            latitude REAL,
            longitude REAL,
            accuracy_m REAL,
            coordinates TEXT NOT NULL,
            job TEXT NOT NULL,
            height_cm REAL NOT NULL,
            species TEXT NOT NULL,
            planting_year INTEGER NOT NULL,
            supervisor TEXT NOT NULL,
            vendor TEXT NOT NULL,
            crew TEXT NOT NULL,
            health TEXT NOT NULL,
            tree_number INTEGER NOT NULL,
            description TEXT,
            drive_link TEXT,
            duplicate_status TEXT NOT NULL DEFAULT 'UNIQUE',
            verification_status TEXT,
            photo TEXT NOT NULL,
            uploaded INTEGER NOT NULL DEFAULT 0
        )",
        "CREATE INDEX IF NOT EXISTS idx_records_captured ON records(captured_at DESC)",
        "CREATE INDEX IF NOT EXISTS idx_records_uploaded ON records(uploaded)",
        // Settings table (local only)
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        // Record migration version
        "INSERT INTO schema_version (version) VALUES (1)",
    ];

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}
