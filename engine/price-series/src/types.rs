//! Price series data types

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::PRICE_SENTINEL;

/// Hourly price, known or missing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Price {
    /// Price in EUR/MWh as reported upstream
    Known(f64),
    /// No upstream record for the hour
    Unknown,
}

impl Price {
    pub fn is_known(&self) -> bool {
        matches!(self, Price::Known(_))
    }
}

impl From<Option<f64>> for Price {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Price::Unknown, Price::Known)
    }
}

// Existing consumers expect a bare number or the "N/A" string in the same field.
impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Price::Known(v) => serializer.serialize_f64(*v),
            Price::Unknown => serializer.serialize_str(PRICE_SENTINEL),
        }
    }
}

struct PriceVisitor;

impl<'de> Visitor<'de> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a number or the string \"{PRICE_SENTINEL}\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
        Ok(Price::Known(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
        Ok(Price::Known(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
        Ok(Price::Known(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
        if v == PRICE_SENTINEL {
            Ok(Price::Unknown)
        } else {
            Err(E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<Price, E> {
        Ok(Price::Unknown)
    }

    fn visit_none<E: de::Error>(self) -> Result<Price, E> {
        Ok(Price::Unknown)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Price, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

/// One hourly slot of a price series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: String,
    pub price: Price,
}

/// Upstream price entry keyed by its exact timestamp string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPriceRecord {
    pub timestamp: String,
    #[serde(default)]
    pub price: Option<f64>,
}

impl RawPriceRecord {
    pub fn new(timestamp: impl Into<String>, price: f64) -> Self {
        Self { timestamp: timestamp.into(), price: Some(price) }
    }
}

/// Hour-by-hour price series in ascending time order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceSeries(Vec<PricePoint>);

impl PriceSeries {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PricePoint> {
        self.0.iter()
    }

    /// Hour stamps that fell back to the sentinel
    pub fn missing_hours(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter(|p| !p.price.is_known()).map(|p| p.time.as_str())
    }
}

impl From<Vec<PricePoint>> for PriceSeries {
    fn from(points: Vec<PricePoint>) -> Self {
        Self(points)
    }
}

impl<'a> IntoIterator for &'a PriceSeries {
    type Item = &'a PricePoint;
    type IntoIter = std::slice::Iter<'a, PricePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_serializes_number_or_sentinel() {
        assert_eq!(serde_json::to_value(Price::Known(45.2)).unwrap(), json!(45.2));
        assert_eq!(serde_json::to_value(Price::Unknown).unwrap(), json!("N/A"));
    }

    #[test]
    fn test_price_deserializes_wire_forms() {
        assert_eq!(serde_json::from_value::<Price>(json!(12)).unwrap(), Price::Known(12.0));
        assert_eq!(serde_json::from_value::<Price>(json!(-3.5)).unwrap(), Price::Known(-3.5));
        assert_eq!(serde_json::from_value::<Price>(json!("N/A")).unwrap(), Price::Unknown);
        assert_eq!(serde_json::from_value::<Price>(json!(null)).unwrap(), Price::Unknown);
        assert!(serde_json::from_value::<Price>(json!("cheap")).is_err());
    }

    #[test]
    fn test_price_point_wire_shape() {
        let point = PricePoint { time: "2024-01-01T00:00:00.000Z".to_string(), price: Price::Unknown };
        assert_eq!(
            serde_json::to_value(&point).unwrap(),
            json!({"time": "2024-01-01T00:00:00.000Z", "price": "N/A"})
        );
    }

    #[test]
    fn test_raw_record_price_is_optional() {
        let record: RawPriceRecord =
            serde_json::from_value(json!({"timestamp": "2024-01-01T00:00:00.000Z"})).unwrap();
        assert_eq!(record.price, None);
    }

    #[test]
    fn test_series_serializes_as_plain_array() {
        let series = PriceSeries::from(vec![PricePoint {
            time: "2024-01-01T00:00:00.000Z".to_string(),
            price: Price::Known(1.5),
        }]);
        assert_eq!(
            serde_json::to_value(&series).unwrap(),
            json!([{"time": "2024-01-01T00:00:00.000Z", "price": 1.5}])
        );
    }
}
