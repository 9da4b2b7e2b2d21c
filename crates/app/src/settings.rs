//! Handles settings for the application. Configuration is read from
//! `settings.toml` and can be overridden with `TREKKO__<SECTION>__<KEY>`
//! environment variables.
//!
//! See `settings.toml` for an example.
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
    /// bcrypt cost for stored passwords.
    pub password_cost: u32,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

/// Reservation retry policy and platform commission.
#[derive(Debug, Deserialize)]
pub struct Booking {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub commission_bps: u32,
}

impl Booking {
    pub fn retry_policy(&self) -> engine::RetryPolicy {
        engine::RetryPolicy::new()
            .with_max_attempts(self.max_attempts)
            .with_initial_delay(Duration::from_millis(self.initial_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
    pub booking: Booking,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("app.password_cost", i64::from(engine::DEFAULT_PASSWORD_COST))?
            .set_default("booking.max_attempts", 3_i64)?
            .set_default("booking.initial_delay_ms", 20_i64)?
            .set_default("booking.max_delay_ms", 500_i64)?
            .set_default("booking.commission_bps", i64::from(engine::DEFAULT_COMMISSION_BPS))?
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("TREKKO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
