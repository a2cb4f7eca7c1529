use std::env;
use std::fmt;

use crate::lot::{CapacityClass, LotLayout, Money, Rate, RateTable, VehicleSize};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub lot: LotLayout,
    pub rates: RateTable,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = LotLayout::default();
        let mut lot = LotLayout::new(read_count("PARKADE_FLOORS", defaults.floors)?);
        for (capacity, variable) in [
            (CapacityClass::SmallOnly, "PARKADE_SMALL_PER_FLOOR"),
            (CapacityClass::MediumCapable, "PARKADE_MEDIUM_PER_FLOOR"),
            (CapacityClass::LargeCapable, "PARKADE_LARGE_PER_FLOOR"),
        ] {
            let fallback = defaults
                .spots_per_floor
                .get(&capacity)
                .copied()
                .unwrap_or(0);
            lot = lot.with_spots(capacity, read_count(variable, fallback)?);
        }

        let mut rates = RateTable::default();
        for (size, variable) in [
            (VehicleSize::Small, "PARKADE_RATE_SMALL"),
            (VehicleSize::Medium, "PARKADE_RATE_MEDIUM"),
            (VehicleSize::Large, "PARKADE_RATE_LARGE"),
        ] {
            if let Ok(raw) = env::var(variable) {
                rates.set(size, parse_rate(variable, &raw)?);
            }
        }

        Ok(Self {
            environment,
            lot,
            rates,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn read_count(variable: &'static str, fallback: u32) -> Result<u32, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidCount { variable }),
        Err(_) => Ok(fallback),
    }
}

/// Parses `base/hourly`, e.g. `5.00/2.50`.
fn parse_rate(variable: &'static str, raw: &str) -> Result<Rate, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidRate { variable, reason };
    let (base, hourly) = raw
        .split_once('/')
        .ok_or_else(|| invalid("expected base/hourly".to_string()))?;
    let base: Money = base.parse().map_err(invalid)?;
    let hourly: Money = hourly.parse().map_err(invalid)?;
    Ok(Rate { base, hourly })
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidCount {
        variable: &'static str,
    },
    InvalidRate {
        variable: &'static str,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCount { variable } => {
                write!(f, "{variable} must be a non-negative integer")
            }
            ConfigError::InvalidRate { variable, reason } => {
                write!(f, "{variable} must be formatted as base/hourly: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
