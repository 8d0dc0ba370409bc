//! Electricity price upstream client
//!
//! Fetches hourly spot prices for one region from the Nord Pool price API
//! published by Elering and aligns them onto the configured hourly horizon.

use crate::config::ElectricityConfig;
use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use price_series::{format_hour_stamp, PriceSeries, PriceSeriesBuilder, RawPriceRecord};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Source of raw hourly price records for a time window
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_prices(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BackendResult<Vec<RawPriceRecord>>;
}

/// Upstream response envelope
#[derive(Debug, Deserialize)]
struct PriceApiResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<HashMap<String, Vec<UpstreamPriceEntry>>>,
}

#[derive(Debug, Deserialize)]
struct UpstreamPriceEntry {
    timestamp: UpstreamTimestamp,
    #[serde(default)]
    price: Option<f64>,
}

/// Upstream timestamps arrive either preformatted or as Unix seconds
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UpstreamTimestamp {
    Epoch(i64),
    Text(String),
}

impl UpstreamTimestamp {
    fn into_hour_stamp(self) -> Option<String> {
        match self {
            UpstreamTimestamp::Text(s) => Some(s),
            UpstreamTimestamp::Epoch(secs) => {
                DateTime::<Utc>::from_timestamp(secs, 0).map(format_hour_stamp)
            }
        }
    }
}

/// Extract the records for `region` from an upstream response body
pub fn parse_price_response(body: &[u8], region: &str) -> BackendResult<Vec<RawPriceRecord>> {
    let response: PriceApiResponse = serde_json::from_slice(body)?;

    if !response.success {
        return Err(BackendError::UpstreamUnsuccessful);
    }

    let entries = response
        .data
        .and_then(|mut data| data.remove(region))
        .filter(|entries| !entries.is_empty())
        .ok_or_else(|| BackendError::MissingRegion { region: region.to_string() })?;

    let records = entries
        .into_iter()
        .filter_map(|entry| match entry.timestamp.into_hour_stamp() {
            Some(timestamp) => Some(RawPriceRecord { timestamp, price: entry.price }),
            None => {
                warn!("Dropping upstream price entry with out-of-range timestamp");
                None
            }
        })
        .collect();

    Ok(records)
}

/// HTTP client for the Elering NPS price API
#[derive(Debug, Clone)]
pub struct EleringClient {
    client: Client,
    api_url: String,
    region: String,
}

impl EleringClient {
    /// Create a new client instance
    pub fn new(config: &ElectricityConfig) -> BackendResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self { client, api_url: config.api_url.clone(), region: config.region.clone() })
    }
}

#[async_trait]
impl PriceSource for EleringClient {
    async fn fetch_prices(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BackendResult<Vec<RawPriceRecord>> {
        let start = format_hour_stamp(start);
        let end = format_hour_stamp(end);

        let response = self
            .client
            .get(&self.api_url)
            .query(&[("start", start.as_str()), ("end", end.as_str())])
            .header(reqwest::header::ACCEPT, "*/*")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::UpstreamStatus {
                status: response.status().as_u16(),
                url: self.api_url.clone(),
            });
        }

        let body = response.bytes().await?;
        debug!("Price API returned {} bytes", body.len());

        parse_price_response(&body, &self.region)
    }
}

/// Fetch the window covered by `builder` starting at `now` and align it hour by hour
pub async fn fetch_price_series(
    source: &dyn PriceSource,
    builder: &PriceSeriesBuilder,
    now: DateTime<Utc>,
) -> BackendResult<PriceSeries> {
    let (start, end) = builder.window(now);
    info!(
        "Fetching electricity prices from {} to {}",
        format_hour_stamp(start),
        format_hour_stamp(end)
    );

    let records = source.fetch_prices(start, end).await?;
    let series = builder.build(now, &records);

    for hour in series.missing_hours() {
        warn!("No price found for {}", hour);
    }

    Ok(series)
}
