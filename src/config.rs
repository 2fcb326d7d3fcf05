use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Seed data locations; both optional, the service starts empty without them
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataSettings {
    pub zones_path: Option<String>,
    pub services_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            max_limit: default_max_limit(),
        }
    }
}

fn default_max_limit() -> usize { 100 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_service_weight")]
    pub service: f64,
    #[serde(default = "default_demand_weight")]
    pub demand: f64,
    #[serde(default = "default_proximity_weight")]
    pub proximity: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            service: default_service_weight(),
            demand: default_demand_weight(),
            proximity: default_proximity_weight(),
        }
    }
}

fn default_service_weight() -> f64 { 100.0 }
fn default_demand_weight() -> f64 { 10.0 }
fn default_proximity_weight() -> f64 { 1.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with ZONEMATCH_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with ZONEMATCH_)
            // e.g., ZONEMATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("ZONEMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("ZONEMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
