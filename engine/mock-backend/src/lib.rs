//! Mock backend - REST API for the home energy dashboard
//!
//! Serves static fixtures (mock sensor data, mock Home Assistant entities) and
//! proxies two upstream services: hourly electricity spot prices and weather
//! forecasts. Price data is aligned onto a fixed hourly horizon by the
//! `price-series` crate.

pub mod config;
pub mod electricity;
pub mod error;
pub mod home_assistant;
pub mod logging;
pub mod models;
pub mod rest_api;
pub mod weather;

pub use config::BackendConfig;
pub use error::{BackendError, BackendResult};
pub use rest_api::{create_routes, AppState};

/// Version of the mock backend API
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
