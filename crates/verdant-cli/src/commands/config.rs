use std::path::Path;

use verdant_core::collector::endpoint_ready;
use verdant_core::models::Settings;

use crate::cli::{ConfigAction, HealthArg};
use crate::commands::common::{load_settings, open_database, save_settings};
use crate::error::CliError;

pub async fn run_config(action: ConfigAction, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let mut settings = load_settings(&db).await?;

    match action {
        ConfigAction::Show => {
            print_settings(&settings);
            return Ok(());
        }
        ConfigAction::SetEndpoint { url } => {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CliError::Config(format!(
                    "endpoint must start with http:// or https://, got: {url}"
                )));
            }
            if !endpoint_ready(&url) {
                eprintln!(
                    "Warning: this looks like a placeholder URL; uploads stay disabled until a real endpoint is set."
                );
            }
            settings.collector_endpoint = Some(url);
        }
        ConfigAction::SetAutoSync { enabled } => {
            settings.auto_sync_on_reconnect = enabled;
        }
        ConfigAction::SetDefaults {
            height,
            species,
            year,
            job,
            supervisor,
            vendor,
            crew,
            health,
        } => {
            let defaults = &mut settings.defaults;
            if let Some(height) = height {
                defaults.height_cm = height;
            }
            if let Some(species) = species {
                defaults.species = species;
            }
            if let Some(year) = year {
                defaults.planting_year = year;
            }
            if let Some(job) = job {
                defaults.job = job;
            }
            if let Some(supervisor) = supervisor {
                defaults.supervisor = supervisor;
            }
            if let Some(vendor) = vendor {
                defaults.vendor = vendor;
            }
            if let Some(crew) = crew {
                defaults.crew = crew;
            }
            if let Some(health) = health {
                defaults.health = health.into();
            }
        }
    }

    save_settings(&db, &settings).await?;
    print_settings(&settings);
    Ok(())
}

fn print_settings(settings: &Settings) {
    match &settings.collector_endpoint {
        Some(url) if endpoint_ready(url) => println!("endpoint:       {url}"),
        Some(url) => println!("endpoint:       {url} (placeholder, uploads disabled)"),
        None => println!("endpoint:       (not set)"),
    }
    println!("auto sync:      {}", settings.auto_sync_on_reconnect);

    let defaults = &settings.defaults;
    println!("defaults:");
    println!("  height:       {} cm", defaults.height_cm);
    println!("  species:      {}", defaults.species);
    println!("  year:         {}", defaults.planting_year);
    println!("  job:          {}", or_unset(&defaults.job));
    println!("  supervisor:   {}", or_unset(&defaults.supervisor));
    println!("  vendor:       {}", or_unset(&defaults.vendor));
    println!("  crew:         {}", or_unset(&defaults.crew));
    println!("  health:       {}", defaults.health);
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(unset)"
    } else {
        value
    }
}
