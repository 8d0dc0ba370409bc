//! PriceSeries - hourly electricity price alignment
//!
//! Aligns a sparse, unordered set of upstream hourly price records onto a
//! contiguous hourly timeline. Hours without a matching record carry
//! [`Price::Unknown`], which serializes as the `"N/A"` sentinel.

pub mod builder;
pub mod types;

pub use builder::{format_hour_stamp, HourAlignment, PriceSeriesBuilder};
pub use types::{Price, PricePoint, PriceSeries, RawPriceRecord};

/// Default number of hourly slots in a series
pub const DEFAULT_HORIZON_HOURS: u32 = 12;

/// Wire representation of an unknown price
pub const PRICE_SENTINEL: &str = "N/A";

/// Hour-stamp layout shared with the upstream price API
pub const HOUR_STAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000Z";
