//! Mock Home Assistant fixtures and connection check

use crate::models::ConnectResponse;
use serde::Serialize;
use serde_json::Value;
use warp::http::StatusCode;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityAttributes {
    pub friendly_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<&'static str>,
}

/// A Home Assistant entity as returned by the states API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub entity_id: &'static str,
    pub state: &'static str,
    pub attributes: EntityAttributes,
}

pub const SENSORS: &[Entity] = &[
    Entity {
        entity_id: "sensor.temperature_living_room",
        state: "22.5",
        attributes: EntityAttributes {
            friendly_name: "Living Room Temperature",
            unit_of_measurement: Some("°C"),
        },
    },
    Entity {
        entity_id: "sensor.humidity_kitchen",
        state: "45",
        attributes: EntityAttributes {
            friendly_name: "Kitchen Humidity",
            unit_of_measurement: Some("%"),
        },
    },
];

pub const DEVICES: &[Entity] = &[
    Entity {
        entity_id: "switch.shelly_switch_1",
        state: "on",
        attributes: EntityAttributes { friendly_name: "Shelly Switch 1", unit_of_measurement: None },
    },
    Entity {
        entity_id: "switch.shelly_switch_2",
        state: "off",
        attributes: EntityAttributes { friendly_name: "Shelly Switch 2", unit_of_measurement: None },
    },
];

/// Check a raw connect request body against the expected key.
///
/// Only an absent `apiKey` counts as missing; any other value is compared as given.
pub fn connect(body: &[u8], expected_key: &str) -> (StatusCode, ConnectResponse) {
    let request: Option<Value> = serde_json::from_slice(body).ok();
    let api_key = request.as_ref().and_then(|request| request.get("apiKey"));

    match api_key {
        None => (
            StatusCode::BAD_REQUEST,
            ConnectResponse {
                success: false,
                message: None,
                error: Some("Missing API key in the request.".to_string()),
            },
        ),
        Some(Value::String(key)) if key == expected_key => (
            StatusCode::OK,
            ConnectResponse {
                success: true,
                message: Some("Connected to Home Assistant successfully!".to_string()),
                error: None,
            },
        ),
        Some(_) => {
            tracing::warn!("Rejected Home Assistant connect attempt with wrong API key");
            (
                StatusCode::UNAUTHORIZED,
                ConnectResponse {
                    success: false,
                    message: None,
                    error: Some(
                        "Could not connect to Home Assistant. Check your API key and Wi-Fi connection."
                            .to_string(),
                    ),
                },
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY: &str = "mock-api-key-12345";

    #[test]
    fn test_connect_accepts_matching_key() {
        let (status, body) = connect(br#"{"apiKey": "mock-api-key-12345"}"#, KEY);
        assert_eq!(status, StatusCode::OK);
        assert!(body.success);
        assert_eq!(body.message.as_deref(), Some("Connected to Home Assistant successfully!"));
    }

    #[test]
    fn test_connect_rejects_wrong_key() {
        let (status, body) = connect(br#"{"apiKey": "nope"}"#, KEY);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(!body.success);
    }

    #[test]
    fn test_connect_present_non_string_key_is_unauthorized() {
        let bodies: [&[u8]; 3] = [
            br#"{"apiKey": null}"#,
            br#"{"apiKey": 123}"#,
            br#"{"apiKey": ["mock-api-key-12345"]}"#,
        ];
        for body in bodies {
            let (status, response) = connect(body, KEY);
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert!(!response.success);
        }
    }

    #[test]
    fn test_connect_missing_key() {
        let bodies: [&[u8]; 5] = [b"", b"{}", b"not json", br#"["apiKey"]"#, br#"{"key": "x"}"#];
        for body in bodies {
            let (status, response) = connect(body, KEY);
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response.error.as_deref(), Some("Missing API key in the request."));
        }
    }

    #[test]
    fn test_fixture_wire_shape() {
        assert_eq!(
            serde_json::to_value(&SENSORS[0]).unwrap(),
            json!({
                "entity_id": "sensor.temperature_living_room",
                "state": "22.5",
                "attributes": {"friendly_name": "Living Room Temperature", "unit_of_measurement": "°C"}
            })
        );
        assert_eq!(
            serde_json::to_value(&DEVICES[1]).unwrap(),
            json!({
                "entity_id": "switch.shelly_switch_2",
                "state": "off",
                "attributes": {"friendly_name": "Shelly Switch 2"}
            })
        );
    }
}
