//! Poll-cycle bookkeeping between the room poller and a host scheduler.
//!
//! The coordinator keeps the last successful snapshot across failed polls,
//! so entities stay at their previous values until the controller answers
//! again. After `unavailable_after` consecutive failures it reports the
//! data as unavailable.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::FetchError;
use crate::models::{Entity, Room, RoomId};
use crate::poller::RoomPoller;

/// Consecutive failed polls before data is reported unavailable.
pub const DEFAULT_UNAVAILABLE_AFTER: u32 = 3;

/// Rooms from one successful poll, keyed and ordered by id.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    pub rooms: BTreeMap<RoomId, Room>,
    pub fetched_at: DateTime<Utc>,
}

impl RoomSnapshot {
    pub fn new(rooms: Vec<Room>) -> Self {
        Self {
            rooms: rooms.into_iter().map(|room| (room.id, room)).collect(),
            fetched_at: Utc::now(),
        }
    }

    pub fn get(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.fetched_at).num_seconds()
    }

    pub fn age_display(&self) -> String {
        let seconds = self.age_seconds();
        if seconds < 60 {
            // Also covers clock skew
            "just now".to_string()
        } else if seconds < 3600 {
            format!("{}m ago", seconds / 60)
        } else if seconds < 86_400 {
            format!("{}h ago", seconds / 3600)
        } else {
            format!("{}d ago", seconds / 86_400)
        }
    }

    /// Entities of all rooms, in room id order.
    pub fn entities(&self) -> Vec<Entity> {
        self.rooms.values().flat_map(Room::entities).collect()
    }
}

pub struct UpdateCoordinator {
    poller: RoomPoller,
    snapshot: Option<RoomSnapshot>,
    last_error: Option<FetchError>,
    consecutive_failures: u32,
    unavailable_after: u32,
}

impl UpdateCoordinator {
    pub fn new(poller: RoomPoller) -> Self {
        Self {
            poller,
            snapshot: None,
            last_error: None,
            consecutive_failures: 0,
            unavailable_after: DEFAULT_UNAVAILABLE_AFTER,
        }
    }

    pub fn with_unavailable_after(mut self, failures: u32) -> Self {
        self.unavailable_after = failures.max(1);
        self
    }

    pub fn poller_mut(&mut self) -> &mut RoomPoller {
        &mut self.poller
    }

    /// Run one poll cycle.
    ///
    /// On failure the previous snapshot is kept and the error returned.
    pub async fn refresh(&mut self) -> Result<&RoomSnapshot, FetchError> {
        let result = self.poller.fetch_rooms().await;
        self.apply(result)
    }

    fn apply(
        &mut self,
        result: Result<Vec<Room>, FetchError>,
    ) -> Result<&RoomSnapshot, FetchError> {
        match result {
            Ok(rooms) => {
                if self.consecutive_failures > 0 {
                    debug!(failures = self.consecutive_failures, "Poll recovered");
                }
                self.consecutive_failures = 0;
                self.last_error = None;
                Ok(&*self.snapshot.insert(RoomSnapshot::new(rooms)))
            }
            Err(err) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                warn!(
                    code = err.code(),
                    error = %err,
                    failures = self.consecutive_failures,
                    stale = self.snapshot.is_some(),
                    "Room update failed"
                );
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub fn snapshot(&self) -> Option<&RoomSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// True while there is data and failures stay under the threshold.
    pub fn is_available(&self) -> bool {
        self.snapshot.is_some() && self.consecutive_failures < self.unavailable_after
    }

    /// Entities of the last snapshot, each marked with current availability.
    pub fn entities(&self) -> Vec<Entity> {
        let available = self.is_available();
        let mut entities = self
            .snapshot
            .as_ref()
            .map(RoomSnapshot::entities)
            .unwrap_or_default();
        for entity in &mut entities {
            entity.available = available;
        }
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use chrono::Duration;

    fn coordinator() -> UpdateCoordinator {
        let creds = Credentials::new("http://127.0.0.1:9", "admin", "pw").unwrap();
        let poller = RoomPoller::connect(creds, std::time::Duration::from_secs(1)).unwrap();
        UpdateCoordinator::new(poller)
    }

    fn room(id: RoomId, temperature: f64) -> Room {
        let mut room = Room::new(id, format!("Room {}", id));
        room.temperature = Some(temperature);
        room
    }

    #[test]
    fn test_snapshot_orders_by_id() {
        let snapshot = RoomSnapshot::new(vec![room(5, 20.0), room(2, 21.0)]);
        let ids: Vec<_> = snapshot.rooms.keys().copied().collect();
        assert_eq!(ids, vec![2, 5]);
        assert_eq!(snapshot.entities()[0].room_id, 2);
    }

    #[test]
    fn test_snapshot_age_display() {
        let mut snapshot = RoomSnapshot::new(vec![]);
        assert_eq!(snapshot.age_display(), "just now");

        snapshot.fetched_at = Utc::now() - Duration::minutes(5);
        assert_eq!(snapshot.age_display(), "5m ago");

        snapshot.fetched_at = Utc::now() - Duration::hours(2);
        assert_eq!(snapshot.age_display(), "2h ago");

        snapshot.fetched_at = Utc::now() - Duration::days(3);
        assert_eq!(snapshot.age_display(), "3d ago");

        snapshot.fetched_at = Utc::now() + Duration::minutes(5);
        assert_eq!(snapshot.age_display(), "just now");
    }

    #[test]
    fn test_unavailable_without_data() {
        let coordinator = coordinator();
        assert!(!coordinator.is_available());
        assert!(coordinator.entities().is_empty());
    }

    #[test]
    fn test_failure_keeps_stale_snapshot() {
        let mut coordinator = coordinator();
        coordinator.apply(Ok(vec![room(1, 22.5)])).unwrap();

        let err = coordinator
            .apply(Err(FetchError::CannotConnect("timeout".into())))
            .unwrap_err();
        assert_eq!(err.code(), "cannot_connect");

        let snapshot = coordinator.snapshot().expect("snapshot retained");
        assert_eq!(snapshot.get(1).and_then(|r| r.temperature), Some(22.5));
        assert_eq!(coordinator.consecutive_failures(), 1);
        assert!(coordinator.is_available());
        assert_eq!(coordinator.last_error(), Some(&err));
    }

    #[test]
    fn test_repeated_failures_become_unavailable() {
        let mut coordinator = coordinator().with_unavailable_after(2);
        coordinator.apply(Ok(vec![room(1, 22.5)])).unwrap();

        let _ = coordinator.apply(Err(FetchError::InvalidResponse("bad".into())));
        assert!(coordinator.is_available());
        let _ = coordinator.apply(Err(FetchError::InvalidResponse("bad".into())));
        assert!(!coordinator.is_available());
        assert_eq!(coordinator.entities().len(), 1);
    }

    #[test]
    fn test_entities_carry_availability() {
        let mut coordinator = coordinator().with_unavailable_after(1);
        coordinator.apply(Ok(vec![room(1, 22.5), room(2, 19.0)])).unwrap();
        assert!(coordinator.entities().iter().all(|e| e.available));

        let _ = coordinator.apply(Err(FetchError::CannotConnect("down".into())));
        let entities = coordinator.entities();
        assert_eq!(entities.len(), 2);
        assert!(entities.iter().all(|e| !e.available));
        // Stale values are still reported
        assert_eq!(entities[0].value, crate::models::EntityValue::Reading(22.5));

        coordinator.apply(Ok(vec![room(1, 23.0)])).unwrap();
        assert!(coordinator.entities().iter().all(|e| e.available));
    }

    #[test]
    fn test_success_resets_failures() {
        let mut coordinator = coordinator().with_unavailable_after(1);
        coordinator.apply(Ok(vec![room(1, 22.5)])).unwrap();
        let _ = coordinator.apply(Err(FetchError::CannotConnect("down".into())));
        assert!(!coordinator.is_available());

        let snapshot = coordinator.apply(Ok(vec![room(1, 23.0)])).unwrap();
        assert_eq!(snapshot.get(1).and_then(|r| r.temperature), Some(23.0));
        assert!(coordinator.is_available());
        assert_eq!(coordinator.consecutive_failures(), 0);
        assert!(coordinator.last_error().is_none());
    }
}
