//! Weather forecast upstream client
//!
//! Queries the FMI open data WFS service with a multipoint-coverage stored
//! query and flattens the coverage into `{time, value}` samples.

use crate::config::WeatherConfig;
use crate::error::{BackendError, BackendResult};
use crate::models::WeatherValue;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

/// Forecast sample time layout
pub const SAMPLE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Validated forecast request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastQuery {
    pub start_time: String,
    pub end_time: String,
    pub place: String,
}

/// Raw query string of the weather endpoint
#[derive(Debug, Default, Deserialize)]
pub struct WeatherQueryParams {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub place: Option<String>,
}

impl WeatherQueryParams {
    /// All three parameters present and non-empty
    pub fn into_query(self) -> Option<ForecastQuery> {
        let present = |v: Option<String>| v.filter(|s| !s.is_empty());
        Some(ForecastQuery {
            start_time: present(self.start_time)?,
            end_time: present(self.end_time)?,
            place: present(self.place)?,
        })
    }
}

/// Source of forecast samples
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_forecast(&self, query: &ForecastQuery) -> BackendResult<Vec<WeatherValue>>;
}

#[derive(Clone, Copy)]
enum Section {
    Positions,
    Values,
    ExceptionText,
}

#[derive(Default)]
struct CoverageBlock {
    positions: String,
    values: String,
}

/// Parse a multipoint-coverage WFS response.
///
/// `parameter_count` is the number of parameters requested; each position
/// carries that many values in the tuple list.
pub fn parse_multipoint_coverage(
    xml: &str,
    parameter_count: usize,
) -> BackendResult<Vec<WeatherValue>> {
    if parameter_count == 0 {
        return Err(BackendError::MalformedWeather("no parameters requested".to_string()));
    }

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut blocks: Vec<CoverageBlock> = Vec::new();
    let mut exception: Option<String> = None;
    let mut section: Option<Section> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                section = match e.local_name().as_ref() {
                    b"positions" => {
                        blocks.push(CoverageBlock::default());
                        Some(Section::Positions)
                    }
                    b"doubleOrNilReasonTupleList" => Some(Section::Values),
                    b"ExceptionText" => Some(Section::ExceptionText),
                    _ => None,
                };
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                match section {
                    Some(Section::Positions) => {
                        if let Some(block) = blocks.last_mut() {
                            block.positions.push_str(&text);
                            block.positions.push(' ');
                        }
                    }
                    Some(Section::Values) => match blocks.last_mut() {
                        Some(block) => {
                            block.values.push_str(&text);
                            block.values.push(' ');
                        }
                        None => {
                            return Err(BackendError::MalformedWeather(
                                "values without positions".to_string(),
                            ))
                        }
                    },
                    Some(Section::ExceptionText) => {
                        exception.get_or_insert_with(String::new).push_str(text.trim());
                    }
                    None => {}
                }
            }
            Event::End(_) => section = None,
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(text) = exception {
        return Err(BackendError::UpstreamException(text));
    }

    let mut samples: Vec<(i64, f64)> = Vec::new();
    for block in &blocks {
        collect_block_samples(block, parameter_count, &mut samples)?;
    }
    samples.sort_by_key(|(epoch, _)| *epoch);

    samples
        .into_iter()
        .map(|(epoch, value)| {
            let time = DateTime::<Utc>::from_timestamp(epoch, 0)
                .ok_or_else(|| BackendError::MalformedWeather(format!("bad epoch {epoch}")))?;
            Ok(WeatherValue { time: time.format(SAMPLE_TIME_FORMAT).to_string(), value })
        })
        .collect()
}

fn collect_block_samples(
    block: &CoverageBlock,
    parameter_count: usize,
    out: &mut Vec<(i64, f64)>,
) -> BackendResult<()> {
    let positions: Vec<&str> = block.positions.split_whitespace().collect();
    if positions.len() % 3 != 0 {
        return Err(BackendError::MalformedWeather(format!(
            "positions list has {} tokens, expected lat/lon/time triples",
            positions.len()
        )));
    }

    let values: Vec<&str> = block.values.split_whitespace().collect();
    let position_count = positions.len() / 3;
    if values.len() != position_count * parameter_count {
        return Err(BackendError::MalformedWeather(format!(
            "{} values for {} positions and {} parameters",
            values.len(),
            position_count,
            parameter_count
        )));
    }

    for (position, tuple) in positions.chunks(3).zip(values.chunks(parameter_count)) {
        let epoch: i64 = position[2]
            .parse()
            .map_err(|_| BackendError::MalformedWeather(format!("bad time '{}'", position[2])))?;

        for raw in tuple {
            let value: f64 = raw
                .parse()
                .map_err(|_| BackendError::MalformedWeather(format!("bad value '{raw}'")))?;
            // NaN marks a missing forecast value
            if value.is_finite() {
                out.push((epoch, value));
            }
        }
    }

    Ok(())
}

/// HTTP client for the FMI open data WFS service
#[derive(Debug, Clone)]
pub struct FmiClient {
    client: Client,
    config: WeatherConfig,
}

impl FmiClient {
    /// Create a new client instance
    pub fn new(config: &WeatherConfig) -> BackendResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config: config.clone() })
    }
}

#[async_trait]
impl WeatherSource for FmiClient {
    async fn fetch_forecast(&self, query: &ForecastQuery) -> BackendResult<Vec<WeatherValue>> {
        let parameters = self.config.parameters.join(",");
        info!(
            "Fetching {} forecast for {} from {} to {}",
            parameters, query.place, query.start_time, query.end_time
        );

        let response = self
            .client
            .get(&self.config.wfs_url)
            .query(&[
                ("service", "WFS"),
                ("version", "2.0.0"),
                ("request", "getFeature"),
                ("storedquery_id", self.config.stored_query.as_str()),
                ("place", query.place.as_str()),
                ("starttime", query.start_time.as_str()),
                ("endtime", query.end_time.as_str()),
                ("parameters", parameters.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("WFS returned {} with {} bytes", status, body.len());

        if !status.is_success() {
            // Error bodies are usually an ExceptionReport with a useful message.
            return match parse_multipoint_coverage(&body, self.config.parameters.len()) {
                Err(e @ BackendError::UpstreamException(_)) => Err(e),
                _ => Err(BackendError::UpstreamStatus {
                    status: status.as_u16(),
                    url: self.config.wfs_url.clone(),
                }),
            };
        }

        parse_multipoint_coverage(&body, self.config.parameters.len())
    }
}
