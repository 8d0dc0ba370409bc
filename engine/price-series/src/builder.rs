//! Hourly timeline generation and timestamp join

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{Price, PricePoint, PriceSeries, RawPriceRecord};
use crate::{DEFAULT_HORIZON_HOURS, HOUR_STAMP_FORMAT};

/// How the start instant is placed on the hourly timeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourAlignment {
    /// Use the start instant as supplied; stamps keep its minutes and seconds
    #[default]
    AsGiven,
    /// Truncate the start instant to the top of its hour
    TopOfHour,
}

/// Format an instant the way the upstream price API keys its records.
///
/// Sub-second precision is dropped and rendered as a literal `.000`.
pub fn format_hour_stamp(instant: DateTime<Utc>) -> String {
    instant.format(HOUR_STAMP_FORMAT).to_string()
}

/// Builds a fixed-horizon hourly [`PriceSeries`] from raw upstream records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSeriesBuilder {
    horizon_hours: u32,
    alignment: HourAlignment,
}

impl Default for PriceSeriesBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZON_HOURS)
    }
}

impl PriceSeriesBuilder {
    pub fn new(horizon_hours: u32) -> Self {
        Self { horizon_hours, alignment: HourAlignment::AsGiven }
    }

    pub fn with_alignment(mut self, alignment: HourAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn horizon_hours(&self) -> u32 {
        self.horizon_hours
    }

    pub fn alignment(&self) -> HourAlignment {
        self.alignment
    }

    /// First hour of the timeline for a given start instant
    pub fn timeline_start(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        match self.alignment {
            HourAlignment::AsGiven => start,
            // Truncation only fails for instants outside chrono's range.
            HourAlignment::TopOfHour => start.duration_trunc(Duration::hours(1)).unwrap_or(start),
        }
    }

    /// Window `[start, start + horizon)` to request from upstream.
    ///
    /// The end saturates at the last representable instant.
    pub fn window(&self, start: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let first = self.timeline_start(start);
        let end = first
            .checked_add_signed(Duration::hours(i64::from(self.horizon_hours)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        (first, end)
    }

    /// Hour stamps covered by the series, ascending.
    ///
    /// The timeline stops early if it would run past the last representable instant.
    pub fn hour_stamps(&self, start: DateTime<Utc>) -> Vec<String> {
        let first = self.timeline_start(start);
        (0..self.horizon_hours)
            .map_while(|i| first.checked_add_signed(Duration::hours(i64::from(i))))
            .map(format_hour_stamp)
            .collect()
    }

    /// Join `records` onto the hourly timeline starting at `start`.
    ///
    /// Matching is exact string equality on the formatted hour stamp. When a
    /// timestamp appears more than once, the first record in `records` wins.
    pub fn build(&self, start: DateTime<Utc>, records: &[RawPriceRecord]) -> PriceSeries {
        let mut by_stamp: HashMap<&str, &RawPriceRecord> = HashMap::with_capacity(records.len());
        for record in records {
            by_stamp.entry(record.timestamp.as_str()).or_insert(record);
        }

        self.hour_stamps(start)
            .into_iter()
            .map(|time| {
                let price = by_stamp
                    .get(time.as_str())
                    .map_or(Price::Unknown, |record| Price::from(record.price));
                PricePoint { time, price }
            })
            .collect::<Vec<_>>()
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use serde_json::json;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_format_hour_stamp() {
        assert_eq!(format_hour_stamp(at(2024, 1, 1, 0, 0, 0)), "2024-01-01T00:00:00.000Z");
        assert_eq!(format_hour_stamp(at(2024, 3, 9, 7, 5, 3)), "2024-03-09T07:05:03.000Z");

        let with_millis = at(2024, 1, 1, 13, 0, 0) + Duration::milliseconds(789);
        assert_eq!(format_hour_stamp(with_millis), "2024-01-01T13:00:00.000Z");
    }

    #[test]
    fn test_default_horizon_is_twelve_hours() {
        let builder = PriceSeriesBuilder::default();
        assert_eq!(builder.horizon_hours(), 12);
        assert_eq!(builder.alignment(), HourAlignment::AsGiven);
        assert_eq!(builder.build(at(2024, 1, 1, 0, 0, 0), &[]).len(), 12);
    }

    #[test]
    fn test_sparse_records_fill_with_sentinel() {
        let builder = PriceSeriesBuilder::new(3);
        let records = vec![RawPriceRecord::new("2024-01-01T01:00:00.000Z", 45.2)];

        let series = builder.build(at(2024, 1, 1, 0, 0, 0), &records);

        assert_eq!(
            serde_json::to_value(&series).unwrap(),
            json!([
                {"time": "2024-01-01T00:00:00.000Z", "price": "N/A"},
                {"time": "2024-01-01T01:00:00.000Z", "price": 45.2},
                {"time": "2024-01-01T02:00:00.000Z", "price": "N/A"},
            ])
        );
    }

    #[test]
    fn test_empty_records_all_sentinel() {
        let series = PriceSeriesBuilder::new(2).build(at(2024, 1, 1, 0, 0, 0), &[]);
        assert_eq!(series.len(), 2);
        assert!(series.iter().all(|p| p.price == Price::Unknown));
        assert_eq!(series.missing_hours().count(), 2);
    }

    #[test]
    fn test_duplicate_timestamp_first_listed_wins() {
        let records = vec![
            RawPriceRecord::new("2024-01-01T00:00:00.000Z", 10.0),
            RawPriceRecord::new("2024-01-01T00:00:00.000Z", 99.0),
        ];
        let series = PriceSeriesBuilder::new(1).build(at(2024, 1, 1, 0, 0, 0), &records);
        assert_eq!(series.points()[0].price, Price::Known(10.0));

        let reversed: Vec<_> = records.into_iter().rev().collect();
        let series = PriceSeriesBuilder::new(1).build(at(2024, 1, 1, 0, 0, 0), &reversed);
        assert_eq!(series.points()[0].price, Price::Known(99.0));
    }

    #[test]
    fn test_matched_record_without_price_is_unknown() {
        let records = vec![RawPriceRecord { timestamp: "2024-01-01T00:00:00.000Z".into(), price: None }];
        let series = PriceSeriesBuilder::new(1).build(at(2024, 1, 1, 0, 0, 0), &records);
        assert_eq!(series.points()[0].price, Price::Unknown);
    }

    #[test]
    fn test_join_requires_exact_string_match() {
        let records = vec![
            RawPriceRecord::new("2024-01-01T00:00:00+00:00", 1.0),
            RawPriceRecord::new("2024-01-01T01:00:00Z", 2.0),
            RawPriceRecord::new("2024-01-01T02:00:00.0Z", 3.0),
        ];
        let series = PriceSeriesBuilder::new(3).build(at(2024, 1, 1, 0, 0, 0), &records);
        assert!(series.iter().all(|p| p.price == Price::Unknown));
    }

    #[test]
    fn test_as_given_keeps_minutes() {
        let series = PriceSeriesBuilder::new(2).build(at(2024, 1, 1, 14, 37, 12), &[]);
        let times: Vec<_> = series.iter().map(|p| p.time.as_str()).collect();
        assert_eq!(times, vec!["2024-01-01T14:37:12.000Z", "2024-01-01T15:37:12.000Z"]);
    }

    #[test]
    fn test_top_of_hour_alignment() {
        let builder = PriceSeriesBuilder::new(2).with_alignment(HourAlignment::TopOfHour);
        let records = vec![RawPriceRecord::new("2024-01-01T15:00:00.000Z", 7.5)];

        let series = builder.build(at(2024, 1, 1, 14, 37, 12), &records);

        assert_eq!(series.points()[0].time, "2024-01-01T14:00:00.000Z");
        assert_eq!(series.points()[1].price, Price::Known(7.5));
    }

    #[test]
    fn test_window_spans_horizon() {
        let builder = PriceSeriesBuilder::new(12);
        let (start, end) = builder.window(at(2024, 1, 1, 22, 0, 0));
        assert_eq!(start, at(2024, 1, 1, 22, 0, 0));
        assert_eq!(end, at(2024, 1, 2, 10, 0, 0));
    }

    #[test]
    fn test_zero_horizon_is_empty() {
        let series = PriceSeriesBuilder::new(0).build(at(2024, 1, 1, 0, 0, 0), &[]);
        assert!(series.is_empty());
    }

    #[test]
    fn test_huge_horizon_window_saturates() {
        let (start, end) = PriceSeriesBuilder::new(u32::MAX).window(at(2024, 1, 1, 0, 0, 0));
        assert_eq!(start, at(2024, 1, 1, 0, 0, 0));
        assert_eq!(end, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_timeline_stops_at_range_end() {
        let start = DateTime::<Utc>::MAX_UTC - Duration::hours(1);
        let builder = PriceSeriesBuilder::new(3);

        let series = builder.build(start, &[]);

        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].time, format_hour_stamp(start));
        assert_eq!(series.points()[1].time, format_hour_stamp(DateTime::<Utc>::MAX_UTC));
        assert_eq!(builder.window(start).1, DateTime::<Utc>::MAX_UTC);
    }

    fn arb_start() -> impl Strategy<Value = DateTime<Utc>> {
        // 2000-01-01 .. 2100-01-01
        (946_684_800i64..4_102_444_800i64)
            .prop_map(|secs| DateTime::<Utc>::from_timestamp(secs, 0).unwrap())
    }

    fn arb_records() -> impl Strategy<Value = Vec<(u32, f64)>> {
        prop::collection::vec((0u32..48, -500.0f64..5000.0), 0..40)
    }

    proptest! {
        #[test]
        fn prop_series_length_matches_horizon(start in arb_start(), horizon in 1u32..96) {
            let series = PriceSeriesBuilder::new(horizon).build(start, &[]);
            prop_assert_eq!(series.len(), horizon as usize);
        }

        #[test]
        fn prop_series_steps_one_hour(start in arb_start(), horizon in 2u32..48) {
            let series = PriceSeriesBuilder::new(horizon).build(start, &[]);
            let instants: Vec<DateTime<Utc>> = series
                .iter()
                .map(|p| DateTime::parse_from_rfc3339(&p.time).unwrap().with_timezone(&Utc))
                .collect();
            for pair in instants.windows(2) {
                prop_assert_eq!(pair[1] - pair[0], Duration::hours(1));
            }
        }

        #[test]
        fn prop_exact_matches_propagate(start in arb_start(), offsets in arb_records()) {
            let builder = PriceSeriesBuilder::new(24);
            let records: Vec<RawPriceRecord> = offsets
                .iter()
                .map(|(h, price)| {
                    RawPriceRecord::new(format_hour_stamp(start + Duration::hours(i64::from(*h))), *price)
                })
                .collect();

            let series = builder.build(start, &records);

            for point in &series {
                let expected = records
                    .iter()
                    .find(|r| r.timestamp == point.time)
                    .map_or(Price::Unknown, |r| Price::from(r.price));
                prop_assert_eq!(point.price, expected);
            }
        }

        #[test]
        fn prop_build_is_idempotent(start in arb_start(), offsets in arb_records()) {
            let builder = PriceSeriesBuilder::new(12);
            let records: Vec<RawPriceRecord> = offsets
                .iter()
                .map(|(h, price)| {
                    RawPriceRecord::new(format_hour_stamp(start + Duration::hours(i64::from(*h))), *price)
                })
                .collect();
            prop_assert_eq!(builder.build(start, &records), builder.build(start, &records));
        }
    }
}
