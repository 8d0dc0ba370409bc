//! JSON response bodies

use serde::{Deserialize, Serialize};

/// `{success, data}` / `{success, error}` envelope used by the electricity endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(error.into()) }
    }
}

/// Outcome of a mock Home Assistant connect attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Bare `{error}` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

/// Single forecast sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherValue {
    pub time: String,
    pub value: f64,
}

/// Weather endpoint success body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub place: String,
    pub weather_values: Vec<WeatherValue>,
}

/// Static payload served by `/api/mock-data`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockData {
    pub message: &'static str,
    pub status: &'static str,
    pub data: MockReadings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockReadings {
    pub temperature: i32,
    pub humidity: i32,
}

pub const MOCK_DATA: MockData = MockData {
    message: "This is mock data from the backend!",
    status: "success",
    data: MockReadings { temperature: 22, humidity: 45 },
};
