//! Entity descriptions handed to a home-automation host.
//!
//! A room yields one entity per reading it actually reports. Registration
//! and lifecycle of those entities belong to the host.

use std::fmt;

use serde::Serialize;

use super::room::{Room, RoomId};

/// Prefix for unique ids and display names.
pub const ENTITY_PREFIX: &str = "sinum";

/// Display brand used in entity names.
const DISPLAY_PREFIX: &str = "Sinum";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Temperature,
    Humidity,
    Heating,
    Cooling,
}

impl EntityKind {
    pub fn key(&self) -> &'static str {
        match self {
            EntityKind::Temperature => "temperature",
            EntityKind::Humidity => "humidity",
            EntityKind::Heating => "heating",
            EntityKind::Cooling => "cooling",
        }
    }

    pub fn unit(&self) -> Option<&'static str> {
        match self {
            EntityKind::Temperature => Some("°C"),
            EntityKind::Humidity => Some("%"),
            EntityKind::Heating | EntityKind::Cooling => None,
        }
    }

    /// Host device class: what the reading measures or which circuit it is.
    pub fn device_class(&self) -> &'static str {
        match self {
            EntityKind::Temperature => "temperature",
            EntityKind::Humidity => "humidity",
            EntityKind::Heating => "heat",
            EntityKind::Cooling => "cold",
        }
    }

    /// `measurement` for sensor readings; on/off circuits have no state class.
    pub fn state_class(&self) -> Option<&'static str> {
        if self.is_binary() {
            None
        } else {
            Some("measurement")
        }
    }

    /// Heating and cooling are on/off circuits; the rest are measurements.
    pub fn is_binary(&self) -> bool {
        matches!(self, EntityKind::Heating | EntityKind::Cooling)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityValue {
    Reading(f64),
    Flag(bool),
}

impl fmt::Display for EntityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityValue::Reading(v) => write!(f, "{:.1}", v),
            EntityValue::Flag(true) => write!(f, "on"),
            EntityValue::Flag(false) => write!(f, "off"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub unique_id: String,
    pub name: String,
    pub room_id: RoomId,
    pub room_name: String,
    pub kind: EntityKind,
    pub value: EntityValue,
    /// False once the coordinator has given up on the controller; the value
    /// is then the last one seen.
    pub available: bool,
}

impl Entity {
    fn new(room: &Room, kind: EntityKind, value: EntityValue) -> Self {
        let name = match kind {
            EntityKind::Temperature => format!("{} {}", DISPLAY_PREFIX, room.name),
            EntityKind::Humidity => format!("{} {} Humidity", DISPLAY_PREFIX, room.name),
            EntityKind::Heating => format!("{} {} Heating", DISPLAY_PREFIX, room.name),
            EntityKind::Cooling => format!("{} {} Cooling", DISPLAY_PREFIX, room.name),
        };
        Self {
            unique_id: format!("{}_{}_{}", ENTITY_PREFIX, room.id, kind.key()),
            name,
            room_id: room.id,
            room_name: room.name.clone(),
            kind,
            value,
            available: true,
        }
    }

    /// Value with its unit, e.g. `22.5 °C` or `on`.
    pub fn display_value(&self) -> String {
        match self.kind.unit() {
            Some(unit) => format!("{} {}", self.value, unit),
            None => self.value.to_string(),
        }
    }
}

impl Room {
    /// Entities for the readings this room reports, in a fixed kind order.
    pub fn entities(&self) -> Vec<Entity> {
        let mut entities = Vec::with_capacity(4);
        if let Some(v) = self.temperature {
            entities.push(Entity::new(self, EntityKind::Temperature, EntityValue::Reading(v)));
        }
        if let Some(v) = self.humidity {
            entities.push(Entity::new(self, EntityKind::Humidity, EntityValue::Reading(v)));
        }
        if let Some(v) = self.heating {
            entities.push(Entity::new(self, EntityKind::Heating, EntityValue::Flag(v)));
        }
        if let Some(v) = self.cooling {
            entities.push(Entity::new(self, EntityKind::Cooling, EntityValue::Flag(v)));
        }
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entities_only_for_present_readings() {
        let mut room = Room::new(1, "Obývačka");
        room.temperature = Some(22.5);

        let entities = room.entities();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].kind, EntityKind::Temperature);
        assert_eq!(entities[0].unique_id, "sinum_1_temperature");
        assert_eq!(entities[0].name, "Sinum Obývačka");
        assert_eq!(entities[0].display_value(), "22.5 °C");
        assert!(entities[0].available);
    }

    #[test]
    fn test_room_without_readings_has_no_entities() {
        assert!(Room::new(5, "Sklad").entities().is_empty());
    }

    #[test]
    fn test_binary_entities() {
        let mut room = Room::new(3, "Spálňa");
        room.heating = Some(true);
        room.cooling = Some(false);

        let entities = room.entities();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].unique_id, "sinum_3_heating");
        assert_eq!(entities[0].name, "Sinum Spálňa Heating");
        assert_eq!(entities[0].display_value(), "on");
        assert!(entities[0].kind.is_binary());
        assert_eq!(entities[1].unique_id, "sinum_3_cooling");
        assert_eq!(entities[1].display_value(), "off");
    }

    #[test]
    fn test_humidity_entity() {
        let mut room = Room::new(2, "Kuchyňa");
        room.humidity = Some(45.0);

        let entities = room.entities();
        assert_eq!(entities[0].unique_id, "sinum_2_humidity");
        assert_eq!(entities[0].display_value(), "45.0 %");
    }

    #[test]
    fn test_device_and_state_classes() {
        assert_eq!(EntityKind::Temperature.device_class(), "temperature");
        assert_eq!(EntityKind::Humidity.device_class(), "humidity");
        assert_eq!(EntityKind::Heating.device_class(), "heat");
        assert_eq!(EntityKind::Cooling.device_class(), "cold");

        assert_eq!(EntityKind::Temperature.state_class(), Some("measurement"));
        assert_eq!(EntityKind::Humidity.state_class(), Some("measurement"));
        assert_eq!(EntityKind::Heating.state_class(), None);
        assert_eq!(EntityKind::Cooling.state_class(), None);
    }
}
