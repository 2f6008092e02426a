#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod clock;
mod database;
mod db;
mod env;
mod error;
mod models;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;
mod workflows;

use auth::{internal_error_api, not_found_api, unauthorized_api, unprocessable_api};
use clock::{SharedClock, SystemClock};
use database::{connect, init_schema};
use env::{Settings, load_environment};
use rocket::fairing::AdHoc;
use rocket::{Build, Rocket};
use sqlx::SqlitePool;
use std::sync::Arc;
use telemetry::{TelemetryFairing, init_tracing, shutdown_telemetry};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("Environment error: {0}")]
    Environment(String),
    #[error("Application error: {0}")]
    App(#[from] error::AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

async fn prepare() -> Result<(SqlitePool, Settings), Error> {
    load_environment().map_err(|e| Error::Environment(e.to_string()))?;
    init_tracing();

    let settings = Settings::from_env()?;
    let pool = connect(&settings.database_url).await?;

    info!("Applying schema...");
    init_schema(&pool).await?;

    Ok((pool, settings))
}

#[launch]
async fn rocket() -> _ {
    let (pool, settings) = match prepare().await {
        Ok(ready) => ready,
        Err(err) => {
            eprintln!("Startup failed: {}", err);
            std::process::exit(1);
        }
    };

    init_rocket(pool, settings, Arc::new(SystemClock)).await
}

pub async fn init_rocket(pool: SqlitePool, settings: Settings, clock: SharedClock) -> Rocket<Build> {
    info!(
        loan_days = settings.library.loan_days,
        fine_per_day = settings.library.rate_per_day,
        "Starting college ERP"
    );

    rocket::build()
        .manage(pool)
        .manage(clock)
        .manage(settings.library)
        .manage(settings)
        .mount("/api", api::routes())
        .register(
            "/api",
            catchers![unauthorized_api, not_found_api, unprocessable_api, internal_error_api],
        )
        .attach(TelemetryFairing)
        .attach(AdHoc::on_shutdown("Telemetry shutdown", |_| {
            Box::pin(async move {
                shutdown_telemetry();
            })
        }))
}
