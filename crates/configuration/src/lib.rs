//! # BizPilot Configuration
//!
//! Loads the strongly-typed [`Config`] from an optional `config.toml` overlaid by
//! `BIZPILOT__SECTION__KEY` environment variables, validates it, and installs the
//! process-wide tracing subscriber.

use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_logging;
pub use settings::{
    Config, ForecastConfig, LedgerConfig, LogFormat, LoggingConfig, ReminderConfig, TaxDefaults,
    TelegramConfig,
};

const ENV_PREFIX: &str = "BIZPILOT";

/// Loads the application configuration from `config.toml` in the working directory,
/// if present, and the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(None)
}

/// Loads the application configuration from an explicit file (which must exist) or,
/// when `path` is `None`, from an optional `config.toml`.
pub fn load_config_from(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file_source = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("config").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file_source)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    Ok(config)
}

/// Rejects settings that would make the analytics or the scheduler meaningless.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.ledger.window_months == 0 {
        return Err(ConfigError::ValidationError(
            "ledger.window_months must be at least 1".to_string(),
        ));
    }
    if config.forecast.min_points < 2 {
        return Err(ConfigError::ValidationError(
            "forecast.min_points must be at least 2 to fit a line".to_string(),
        ));
    }
    if config.tax.vat_rate.is_sign_negative() || config.tax.tax_rate.is_sign_negative() {
        return Err(ConfigError::ValidationError(
            "tax rates must not be negative".to_string(),
        ));
    }
    if config.reminders.interval.is_zero() {
        return Err(ConfigError::ValidationError(
            "reminders.interval must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
        assert_eq!(config.ledger.window_months, 12);
        assert_eq!(config.forecast.min_points, 6);
        assert_eq!(config.tax.vat_rate, dec!(0.15));
        assert_eq!(config.reminders.interval, Duration::from_secs(30));
    }

    #[test]
    fn file_overrides_selected_keys() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[tax]
vat_rate = "0.075"

[reminders]
interval = "1h"

[logging]
format = "pretty"
"#
        )
        .unwrap();

        let config = load_config_from(Some(file.path())).unwrap();
        assert_eq!(config.tax.vat_rate, dec!(0.075));
        assert_eq!(config.tax.tax_rate, dec!(0.0));
        assert_eq!(config.reminders.interval, Duration::from_secs(3600));
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.forecast.cache_capacity, 256);
    }

    #[test]
    fn rejects_negative_rates() {
        let mut config = Config::default();
        config.tax.vat_rate = dec!(-0.01);
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn rejects_zero_interval() {
        let mut config = Config::default();
        config.reminders.interval = Duration::ZERO;
        assert!(validate(&config).is_err());
    }
}
