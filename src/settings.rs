//! Layered configuration: defaults, then an optional TOML file, then `ANALYTICS_*`
//! environment variables. Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::temporal::Period;

pub const DEFAULT_DATA_PATH: &str = "Transactions_data_complet.csv";
const DEFAULT_CONFIG_NAME: &str = "analytics";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    pub data_path: PathBuf,
    /// Month shown in the daily series, as `YYYY-MM`.
    #[serde(default)]
    pub period: Option<String>,
    pub top_n: usize,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl AnalyticsConfig {
    /// Loads `path` when given, otherwise `analytics.toml` in the working directory
    /// if it exists. Environment variables use `__` for nesting (`ANALYTICS_LOG__LEVEL`).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings = Config::builder()
            .set_default("data_path", DEFAULT_DATA_PATH)?
            .set_default("top_n", 10)?
            .set_default("log.level", "info")?
            .set_default("log.json", false)?
            .add_source(file)
            .add_source(
                Environment::with_prefix("ANALYTICS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: AnalyticsConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies command-line values on top of the loaded ones and validates the result.
    pub fn apply_overrides(
        &mut self,
        data_path: Option<PathBuf>,
        period: Option<Period>,
        top_n: Option<usize>,
    ) -> Result<(), ConfigError> {
        if let Some(data_path) = data_path {
            self.data_path = data_path;
        }
        if let Some(period) = period {
            self.period = Some(period.to_string());
        }
        if let Some(top_n) = top_n {
            self.top_n = top_n;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_n == 0 {
            return Err(ConfigError::ValidationError("top_n must be at least 1".into()));
        }
        self.selected_period()?;
        Ok(())
    }

    pub fn selected_period(&self) -> Result<Option<Period>, ConfigError> {
        self.period
            .as_deref()
            .map(|p| p.parse::<Period>())
            .transpose()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            period: None,
            top_n: 10,
            log: LogConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
