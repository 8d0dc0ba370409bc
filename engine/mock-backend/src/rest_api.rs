//! REST API endpoints for the mock backend
//!
//! Each handler is an independent function; [`create_routes`] composes them
//! into one warp filter with CORS, rejection recovery and access logging.

use crate::config::{BackendConfig, CorsConfig};
use crate::electricity::{fetch_price_series, EleringClient, PriceSource};
use crate::error::BackendResult;
use crate::home_assistant::{self, DEVICES, SENSORS};
use crate::models::{ApiEnvelope, ErrorBody, WeatherResponse, MOCK_DATA};
use crate::weather::{FmiClient, WeatherQueryParams, WeatherSource};
use price_series::{PriceSeries, PriceSeriesBuilder};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::error;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

const ELECTRICITY_FAILURE: &str = "Failed to fetch electricity prices.";
const MISSING_WEATHER_PARAMS: &str = "Bad Request: Missing parameters.";
const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Shared, read-only state handed to every handler
pub struct AppState {
    pub prices: Arc<dyn PriceSource>,
    pub weather: Arc<dyn WeatherSource>,
    pub price_builder: PriceSeriesBuilder,
    pub home_assistant_key: String,
}

impl AppState {
    /// Wire the live upstream clients from configuration
    pub fn from_config(config: &BackendConfig) -> BackendResult<Self> {
        Ok(Self {
            prices: Arc::new(EleringClient::new(&config.electricity)?),
            weather: Arc::new(FmiClient::new(&config.weather)?),
            price_builder: config.electricity.price_series_builder(),
            home_assistant_key: config.home_assistant.api_key.clone(),
        })
    }
}

/// Get hourly electricity prices for the configured region and horizon
pub async fn get_electricity_prices(state: Arc<AppState>) -> Result<impl Reply, Infallible> {
    match fetch_price_series(state.prices.as_ref(), &state.price_builder, chrono::Utc::now()).await
    {
        Ok(series) => {
            Ok(warp::reply::with_status(warp::reply::json(&ApiEnvelope::ok(series)), StatusCode::OK))
        }
        Err(e) => {
            error!("An error occurred while fetching electricity prices: {}", e);
            Ok(warp::reply::with_status(
                warp::reply::json(&ApiEnvelope::<PriceSeries>::failure(ELECTRICITY_FAILURE)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

/// Get forecast samples for a place and time range
pub async fn get_weather_data(
    params: WeatherQueryParams,
    state: Arc<AppState>,
) -> Result<warp::reply::Response, Infallible> {
    let Some(query) = params.into_query() else {
        return Ok(warp::reply::with_status(
            warp::reply::json(&ErrorBody::new(MISSING_WEATHER_PARAMS)),
            StatusCode::BAD_REQUEST,
        )
        .into_response());
    };

    match state.weather.fetch_forecast(&query).await {
        Ok(weather_values) => {
            let response = WeatherResponse { place: query.place, weather_values };
            Ok(warp::reply::json(&response).into_response())
        }
        Err(e) => {
            error!("Weather fetch for {} failed: {}", query.place, e);
            Ok(warp::reply::with_status(
                warp::reply::json(&ErrorBody::new(format!("Internal Server Error: {e}"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response())
        }
    }
}

/// Simulate connecting to Home Assistant with an API key
pub async fn connect_home_assistant(
    body: Bytes,
    state: Arc<AppState>,
) -> Result<impl Reply, Infallible> {
    let (status, response) = home_assistant::connect(&body, &state.home_assistant_key);
    Ok(warp::reply::with_status(warp::reply::json(&response), status))
}

/// Bodies sent without a Content-Length never reach the key check, so answer
/// them the same way as a request with no key
async fn recover_connect(err: Rejection) -> Result<warp::reply::Response, Rejection> {
    if err.find::<warp::reject::LengthRequired>().is_some() {
        let (status, response) = home_assistant::connect(&[], "");
        return Ok(warp::reply::with_status(warp::reply::json(&response), status).into_response());
    }
    Err(err)
}

/// Render rejections as JSON error bodies
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
    } else if err.find::<warp::cors::CorsForbidden>().is_some() {
        (StatusCode::FORBIDDEN, "Origin Not Allowed")
    } else {
        error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    };

    Ok(warp::reply::with_status(warp::reply::json(&ErrorBody::new(message)), status))
}

fn cors(config: &CorsConfig) -> warp::cors::Builder {
    let builder = warp::cors()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST", "OPTIONS"]);

    if config.allowed_origins.is_empty() {
        builder.allow_any_origin()
    } else {
        builder.allow_origins(config.allowed_origins.iter().map(String::as_str))
    }
}

/// Create all REST API routes
pub fn create_routes(
    state: Arc<AppState>,
    cors_config: &CorsConfig,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    // Static mock data endpoint
    let mock_data = warp::path("api")
        .and(warp::path("mock-data"))
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&MOCK_DATA));

    // Electricity prices endpoint
    let electricity_prices = warp::path("api")
        .and(warp::path("electricity-prices"))
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_electricity_prices);

    // Weather forecast endpoint
    let weather = warp::path("get_weather_data")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<WeatherQueryParams>())
        .and(state_filter.clone())
        .and_then(get_weather_data);

    // Mock Home Assistant endpoints
    let ha_connect = warp::path("mock-homeassistant")
        .and(warp::path("connect"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(state_filter)
        .and_then(connect_home_assistant)
        .recover(recover_connect);

    let ha_sensors = warp::path("mock-homeassistant")
        .and(warp::path("sensors"))
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&SENSORS));

    let ha_devices = warp::path("mock-homeassistant")
        .and(warp::path("devices"))
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&DEVICES));

    // Health check endpoint
    let health = warp::path("health").and(warp::path::end()).and(warp::get()).map(|| {
        warp::reply::json(&serde_json::json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    });

    mock_data
        .or(electricity_prices)
        .or(weather)
        .or(ha_connect)
        .or(ha_sensors)
        .or(ha_devices)
        .or(health)
        .with(cors(cors_config))
        .recover(handle_rejection)
        .with(warp::log("mock_backend::access"))
}
