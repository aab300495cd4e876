//! Room records as reported by the controller's rooms endpoint.
//!
//! The controller is loose about types: ids and readings may arrive as
//! numbers or as strings, and the circuit flags have two spellings. All of
//! that is resolved here, once, so the rest of the crate only sees `Room`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub type RoomId = i64;

/// Normalized per-room reading produced by one poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heating: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooling: Option<bool>,
}

impl Room {
    pub fn new(id: RoomId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            temperature: None,
            humidity: None,
            heating: None,
            cooling: None,
        }
    }

    fn from_raw(raw: RawRoom) -> Option<Self> {
        let id = raw.id.as_ref().and_then(lenient_id)?;
        let name = match raw.name {
            Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
            _ => format!("Room {}", id),
        };

        Some(Self {
            id,
            name,
            temperature: raw.temperature.as_ref().and_then(lenient_f64),
            humidity: raw.humidity.as_ref().and_then(lenient_f64),
            heating: raw
                .heating
                .as_ref()
                .and_then(lenient_bool)
                .or_else(|| raw.heating_on.as_ref().and_then(lenient_bool)),
            cooling: raw
                .cooling
                .as_ref()
                .and_then(lenient_bool)
                .or_else(|| raw.cooling_on.as_ref().and_then(lenient_bool)),
        })
    }
}

/// Room object exactly as it arrives on the wire.
#[derive(Debug, Deserialize)]
struct RawRoom {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    temperature: Option<Value>,
    #[serde(default)]
    humidity: Option<Value>,
    #[serde(default)]
    heating: Option<Value>,
    #[serde(default)]
    heating_on: Option<Value>,
    #[serde(default)]
    cooling: Option<Value>,
    #[serde(default)]
    cooling_on: Option<Value>,
}

/// The two shapes the rooms endpoint answers with.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RoomsPayload {
    List(Vec<RawRoom>),
    Wrapped { rooms: Vec<RawRoom> },
}

impl RoomsPayload {
    fn into_raw(self) -> Vec<RawRoom> {
        match self {
            RoomsPayload::List(rooms) | RoomsPayload::Wrapped { rooms } => rooms,
        }
    }
}

/// Parse a rooms response body into room records.
///
/// Rooms without a usable id are skipped, and only the first room per id is
/// kept, so the result never contains two records with the same id.
pub fn parse_rooms(body: &str) -> Result<Vec<Room>, serde_json::Error> {
    let payload: RoomsPayload = serde_json::from_str(body)?;

    let mut seen = HashSet::new();
    let mut rooms = Vec::new();
    for raw in payload.into_raw() {
        let raw_id = raw.id.clone();
        let Some(room) = Room::from_raw(raw) else {
            warn!(id = ?raw_id, "Skipping room without a usable id");
            continue;
        };
        if !seen.insert(room.id) {
            warn!(id = room.id, "Skipping duplicate room id");
            continue;
        }
        rooms.push(room);
    }
    Ok(rooms)
}

fn lenient_id(value: &Value) -> Option<RoomId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "1" => Some(true),
            "false" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_list() {
        let body = r#"[
            {"id": 1, "name": "Obývačka", "temperature": 22.5},
            {"id": 2, "name": "Kuchyňa", "temperature": 21.0, "humidity": 45}
        ]"#;
        let rooms = parse_rooms(body).expect("valid rooms");

        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].id, 1);
        assert_eq!(rooms[0].name, "Obývačka");
        assert_eq!(rooms[0].temperature, Some(22.5));
        assert_eq!(rooms[0].humidity, None);
        assert_eq!(rooms[0].heating, None);
        assert_eq!(rooms[0].cooling, None);

        assert_eq!(rooms[1].id, 2);
        assert_eq!(rooms[1].temperature, Some(21.0));
        assert_eq!(rooms[1].humidity, Some(45.0));
        assert_eq!(rooms[1].heating, None);
        assert_eq!(rooms[1].cooling, None);
    }

    #[test]
    fn test_parse_wrapped_object() {
        let body = r#"{"rooms":[{"id":3,"name":"Spálňa","heating":true}]}"#;
        let rooms = parse_rooms(body).expect("valid rooms");

        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].id, 3);
        assert_eq!(rooms[0].heating, Some(true));
        assert_eq!(rooms[0].temperature, None);
        assert_eq!(rooms[0].humidity, None);
        assert_eq!(rooms[0].cooling, None);
    }

    #[test]
    fn test_both_shapes_normalize_identically() {
        let list = r#"[{"id":7,"name":"Hala","temperature":19.5,"cooling":false}]"#;
        let wrapped = r#"{
            "rooms": [{"id":7,"name":"Hala","temperature":19.5,"cooling":false}],
            "count": 1
        }"#;
        assert_eq!(parse_rooms(list).unwrap(), parse_rooms(wrapped).unwrap());
    }

    #[test]
    fn test_null_temperature_is_absent() {
        let rooms = parse_rooms(r#"[{"id":1,"name":"A","temperature":null}]"#).unwrap();
        assert_eq!(rooms[0].temperature, None);
    }

    #[test]
    fn test_lenient_readings_and_flags() {
        let body = r#"[{
            "id": "4", "name": "Kúpeľňa",
            "temperature": "23.1", "humidity": "n/a",
            "heating_on": 1, "cooling_on": "off",
            "extra": {"x": 1}
        }]"#;
        let rooms = parse_rooms(body).unwrap();

        assert_eq!(rooms[0].id, 4);
        assert_eq!(rooms[0].temperature, Some(23.1));
        assert_eq!(rooms[0].humidity, None);
        assert_eq!(rooms[0].heating, Some(true));
        assert_eq!(rooms[0].cooling, Some(false));
    }

    #[test]
    fn test_primary_flag_wins_over_alias() {
        let rooms = parse_rooms(r#"[{"id":1,"heating":false,"heating_on":true}]"#).unwrap();
        assert_eq!(rooms[0].heating, Some(false));
    }

    #[test]
    fn test_missing_name_falls_back_to_id() {
        let rooms = parse_rooms(r#"[{"id":9},{"id":10,"name":"  "}]"#).unwrap();
        assert_eq!(rooms[0].name, "Room 9");
        assert_eq!(rooms[1].name, "Room 10");
    }

    #[test]
    fn test_rooms_without_id_are_skipped() {
        let body = r#"[{"name":"Ghost"},{"id":"abc"},{"id":1,"name":"Real"}]"#;
        let rooms = parse_rooms(body).unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].name, "Real");
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let rooms = parse_rooms(r#"[{"id":1,"name":"First"},{"id":1,"name":"Second"}]"#).unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].name, "First");
    }

    #[test]
    fn test_malformed_payloads_are_rejected() {
        assert!(parse_rooms("not json").is_err());
        assert!(parse_rooms(r#"{"items":[]}"#).is_err());
        assert!(parse_rooms(r#"[1, 2, 3]"#).is_err());
    }

    #[test]
    fn test_serialize_omits_absent_readings() {
        let mut room = Room::new(3, "Spálňa");
        room.temperature = Some(20.5);
        room.heating = Some(true);

        let json = serde_json::to_value(&room).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 3, "name": "Spálňa", "temperature": 20.5, "heating": true})
        );
    }
}
