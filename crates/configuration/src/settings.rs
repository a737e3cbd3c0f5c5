use core_types::TaxRates;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an absent `config.toml` yields a working setup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ledger: LedgerConfig,
    pub forecast: ForecastConfig,
    pub tax: TaxDefaults,
    pub reminders: ReminderConfig,
    pub telegram: TelegramConfig,
    pub logging: LoggingConfig,
}

/// Parameters for building the monthly series.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// How many calendar months the trailing series covers, current month included.
    pub window_months: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { window_months: 12 }
    }
}

/// Parameters for the trend forecaster and its model cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Below this many points no forecast is produced.
    pub min_points: usize,
    /// Maximum number of users whose fitted model is kept. Zero disables the cache.
    pub cache_capacity: usize,
    /// Cached models older than this are treated as absent.
    #[serde(with = "humantime_serde")]
    pub cache_max_age: Duration,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_points: 6,
            cache_capacity: 256,
            cache_max_age: Duration::from_secs(60 * 60),
        }
    }
}

/// Rates used when a user has no tax configuration for the year.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TaxDefaults {
    /// 0.15 corresponds to 15% VAT.
    pub vat_rate: Decimal,
    pub tax_rate: Decimal,
}

impl Default for TaxDefaults {
    fn default() -> Self {
        Self {
            vat_rate: dec!(0.15),
            tax_rate: dec!(0.0),
        }
    }
}

impl TaxDefaults {
    pub fn rates(&self) -> TaxRates {
        TaxRates {
            vat_rate: self.vat_rate,
            tax_rate: self.tax_rate,
        }
    }
}

/// Parameters for the background reminder scheduler.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// Time between two scans of pending reminders. Production runs use `"1h"`.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

/// Credentials for the Telegram delivery channel. Empty values disable it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
    /// Upper bound on a single Bot API request, so a stalled delivery cannot hold a tick.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            chat_id: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Output style of the stdout log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG` when set.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            directory: None,
        }
    }
}
