//! Data models for Sinum rooms.
//!
//! - `Room`: normalized per-room reading, parsed from either response shape
//! - `Entity`: host-facing description of one reading of one room

pub mod entity;
pub mod room;

pub use entity::{Entity, EntityKind, EntityValue};
pub use room::{parse_rooms, Room, RoomId};
