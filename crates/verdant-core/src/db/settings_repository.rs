//! Settings repository implementation

use crate::error::Result;
use crate::models::{CaptureDefaults, HealthStatus, Settings};
use libsql::Connection;

/// Trait for settings storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SettingsRepository {
    /// Load settings from the database
    async fn load(&self) -> Result<Settings>;

    /// Save settings to the database
    async fn save(&self, settings: &Settings) -> Result<()>;
}

/// libSQL implementation of `SettingsRepository`
pub struct LibSqlSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SettingsRepository for LibSqlSettingsRepository<'_> {
    async fn load(&self) -> Result<Settings> {
        let mut settings = Settings::default();

        // Load each setting individually; anything missing keeps its default
        if let Ok(value) = self.get_setting("collector_endpoint").await {
            if !value.trim().is_empty() {
                settings.collector_endpoint = Some(value);
            }
        }

        if let Ok(value) = self.get_setting("auto_sync_on_reconnect").await {
            settings.auto_sync_on_reconnect = matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        settings.defaults = self.load_defaults().await;

        Ok(settings)
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        self.set_setting(
            "collector_endpoint",
            settings.collector_endpoint.as_deref().unwrap_or(""),
        )
        .await?;
        self.set_setting(
            "auto_sync_on_reconnect",
            if settings.auto_sync_on_reconnect {
                "true"
            } else {
                "false"
            },
        )
        .await?;

        let defaults = &settings.defaults;
        self.set_setting("default_height_cm", &defaults.height_cm.to_string())
            .await?;
        self.set_setting("default_species", &defaults.species)
            .await?;
        self.set_setting(
            "default_planting_year",
            &defaults.planting_year.to_string(),
        )
        .await?;
        self.set_setting("default_job", &defaults.job).await?;
        self.set_setting("default_supervisor", &defaults.supervisor)
            .await?;
        self.set_setting("default_vendor", &defaults.vendor).await?;
        self.set_setting("default_crew", &defaults.crew).await?;
        self.set_setting("default_health", defaults.health.as_str())
            .await?;
        Ok(())
    }
}

impl LibSqlSettingsRepository<'_> {
    async fn load_defaults(&self) -> CaptureDefaults {
        let mut defaults = CaptureDefaults::default();

        if let Ok(value) = self.get_setting("default_height_cm").await {
            if let Ok(height) = value.parse() {
                defaults.height_cm = height;
            }
        }
        if let Ok(value) = self.get_setting("default_species").await {
            defaults.species = value;
        }
        if let Ok(value) = self.get_setting("default_planting_year").await {
            if let Ok(year) = value.parse() {
                defaults.planting_year = year;
            }
        }
        if let Ok(value) = self.get_setting("default_job").await {
            defaults.job = value;
        }
        if let Ok(value) = self.get_setting("default_supervisor").await {
            defaults.supervisor = value;
        }
        if let Ok(value) = self.get_setting("default_vendor").await {
            defaults.vendor = value;
        }
        if let Ok(value) = self.get_setting("default_crew").await {
            defaults.crew = value;
        }
        if let Ok(value) = self.get_setting("default_health").await {
            if let Some(health) = HealthStatus::parse_lenient(&value) {
                defaults.health = health;
            }
        }

        defaults
    }

    async fn get_setting(&self, key: &str) -> Result<String> {
        let mut rows = self
            .conn
            .query("SELECT value FROM settings WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(value)
        } else {
            Err(crate::error::Error::InvalidInput(format!(
                "setting not found: {key}"
            )))
        }
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
                [key, value],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_load_default_settings() {
        let db = setup().await;
        let repo = LibSqlSettingsRepository::new(db.connection());

        let settings = repo.load().await.unwrap();
        assert!(settings.collector_endpoint.is_none());
        assert!(!settings.auto_sync_on_reconnect);
        assert_eq!(settings.defaults.species, "Sengon");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_and_load_settings() {
        let db = setup().await;
        let repo = LibSqlSettingsRepository::new(db.connection());

        let settings = Settings {
            collector_endpoint: Some("https://collector.example.com/ingest".to_string()),
            auto_sync_on_reconnect: true,
            defaults: CaptureDefaults {
                height_cm: 35.5,
                species: "Mahogany".to_string(),
                planting_year: 2023,
                job: "Replanting Block C".to_string(),
                supervisor: "Asep".to_string(),
                vendor: "GreenWorks".to_string(),
                crew: "Team A".to_string(),
                health: HealthStatus::Ailing,
            },
        };

        repo.save(&settings).await.unwrap();

        let loaded = repo.load().await.unwrap();
        assert_eq!(loaded, settings);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_endpoint_loads_as_none() {
        let db = setup().await;
        let repo = LibSqlSettingsRepository::new(db.connection());

        let settings = Settings::default();
        repo.save(&settings).await.unwrap();

        let loaded = repo.load().await.unwrap();
        assert!(loaded.collector_endpoint.is_none());
    }
}
