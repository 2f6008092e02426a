use anyhow::Context;
use std::path::Path;
use std::str::FromStr;

use tracing::{info, warn};

use crate::workflows::library::FinePolicy;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://college_erp.db?mode=rwc";

pub fn load_environment() -> Result<(), Box<dyn std::error::Error>> {
    let is_production =
        dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    for env_file in env_files {
        load_env_file(env_file)?;
    }

    Ok(())
}

fn load_env_file(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        warn!("Warning: Environment file {} not found, skipping", path);
        return Ok(());
    }

    dotenvy::from_filename_override(path)?;
    info!("Loaded environment from: {}", path);
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub library: FinePolicy,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let defaults = FinePolicy::default();

        Ok(Self {
            database_url,
            library: FinePolicy {
                loan_days: read_var("LIBRARY_LOAN_DAYS")?.unwrap_or(defaults.loan_days),
                rate_per_day: read_amount("LIBRARY_FINE_PER_DAY")?
                    .unwrap_or(defaults.rate_per_day),
                cap: read_amount("LIBRARY_FINE_CAP")?,
            },
        })
    }
}

fn read_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{} must be a whole number, got {:?}", name, raw)),
        _ => Ok(None),
    }
}

// Fine amounts are never negative.
fn read_amount(name: &str) -> anyhow::Result<Option<i64>> {
    let amount = read_var::<i64>(name)?;
    if let Some(value) = amount {
        anyhow::ensure!(value >= 0, "{} must not be negative, got {}", name, value);
    }
    Ok(amount)
}
