//! Error types for the mock backend

use thiserror::Error;

/// Errors that can occur in the mock backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned status {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("Upstream reported an unsuccessful response")]
    UpstreamUnsuccessful,

    #[error("No prices for region '{region}' in upstream response")]
    MissingRegion { region: String },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Upstream service exception: {0}")]
    UpstreamException(String),

    #[error("Malformed weather data: {0}")]
    MalformedWeather(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for mock backend operations
pub type BackendResult<T> = Result<T, BackendError>;
