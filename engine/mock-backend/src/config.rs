//! Configuration for the mock backend

use crate::error::{BackendError, BackendResult};
use price_series::{HourAlignment, PriceSeriesBuilder, DEFAULT_HORIZON_HOURS};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `MOCK_BACKEND__SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "MOCK_BACKEND";

/// Longest accepted price horizon: one leap year of hours
pub const MAX_HORIZON_HOURS: u32 = 366 * 24;

/// Main configuration for the mock backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Electricity price upstream
    pub electricity: ElectricityConfig,

    /// Weather forecast upstream
    pub weather: WeatherConfig,

    /// Mock Home Assistant
    pub home_assistant: HomeAssistantConfig,

    /// Cross-origin settings
    pub cors: CorsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

/// Electricity price upstream configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectricityConfig {
    /// Price endpoint, queried with `start` and `end`
    pub api_url: String,

    /// Region key inside the upstream `data` object
    pub region: String,

    /// Number of hourly slots returned
    pub horizon_hours: u32,

    /// Placement of the first slot
    pub alignment: HourAlignment,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Weather forecast upstream configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// WFS endpoint
    pub wfs_url: String,

    /// Stored query returning a multipoint coverage
    pub stored_query: String,

    /// Forecast parameters to request
    pub parameters: Vec<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Mock Home Assistant configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeAssistantConfig {
    /// Key accepted by the connect endpoint
    pub api_key: String,
}

/// CORS configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; empty allows any origin
    pub allowed_origins: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 5000 }
    }
}

impl Default for ElectricityConfig {
    fn default() -> Self {
        Self {
            api_url: "https://dashboard.elering.ee/api/nps/price".to_string(),
            region: "fi".to_string(),
            horizon_hours: DEFAULT_HORIZON_HOURS,
            alignment: HourAlignment::AsGiven,
            timeout_secs: 30,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            wfs_url: "https://opendata.fmi.fi/wfs".to_string(),
            stored_query: "fmi::forecast::harmonie::surface::point::multipointcoverage".to_string(),
            parameters: vec!["Temperature".to_string()],
            timeout_secs: 30,
        }
    }
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self { api_key: "mock-api-key-12345".to_string() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl ElectricityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn price_series_builder(&self) -> PriceSeriesBuilder {
        PriceSeriesBuilder::new(self.horizon_hours).with_alignment(self.alignment)
    }
}

impl WeatherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl BackendConfig {
    /// Get the server address
    pub fn server_addr(&self) -> BackendResult<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port).parse().map_err(|e| {
            BackendError::InvalidConfig(format!(
                "bad server address {}:{}: {}",
                self.server.host, self.server.port, e
            ))
        })
    }

    /// Load layered configuration: defaults, then an optional TOML file, then
    /// `MOCK_BACKEND__*` environment variables.
    pub fn load(path: Option<&Path>) -> BackendResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            tracing::debug!("Loading configuration from file: {:?}", path);
            builder = builder.add_source(
                config::File::from(path).format(config::FileFormat::Toml).required(false),
            );
        }

        let config: BackendConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("weather.parameters"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file only
    pub fn load_from_file(path: &Path) -> BackendResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BackendConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> BackendResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> BackendResult<()> {
        if self.server.port == 0 {
            return Err(BackendError::InvalidConfig("server port must be non-zero".to_string()));
        }

        if self.electricity.horizon_hours == 0 {
            return Err(BackendError::InvalidConfig(
                "electricity horizon_hours must be positive".to_string(),
            ));
        }

        if self.electricity.horizon_hours > MAX_HORIZON_HOURS {
            return Err(BackendError::InvalidConfig(format!(
                "electricity horizon_hours must be at most {MAX_HORIZON_HOURS}"
            )));
        }

        if self.electricity.region.trim().is_empty() {
            return Err(BackendError::InvalidConfig("electricity region is empty".to_string()));
        }

        if self.weather.parameters.is_empty() {
            return Err(BackendError::InvalidConfig("weather parameters are empty".to_string()));
        }

        for origin in &self.cors.allowed_origins {
            let valid = origin
                .split_once("://")
                .is_some_and(|(scheme, host)| !scheme.is_empty() && !host.is_empty());
            if !valid {
                return Err(BackendError::InvalidConfig(format!("Invalid CORS origin: {origin}")));
            }
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(BackendError::InvalidConfig(format!("Invalid log level: {other}"))),
        }

        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            other => {
                return Err(BackendError::InvalidConfig(format!("Invalid log format: {other}")))
            }
        }

        Ok(())
    }
}
