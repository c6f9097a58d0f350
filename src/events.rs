use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

/// A change notification pushed to one user's connected sessions.
#[derive(Debug, Clone)]
pub struct Event {
    pub name: String,
    pub payload: serde_json::Value,
}

/// Best-effort per-user broadcast bus. Publish is fire-and-forget: no
/// acknowledgment, no replay, and a send with no listeners is silently
/// dropped. Clients reconcile via refetch on reconnect.
pub struct EventBus {
    rooms: DashMap<Uuid, broadcast::Sender<Event>>,
}

const ROOM_CAPACITY: usize = 64;

impl EventBus {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Join the user's room, creating it on first subscription.
    pub fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<Event> {
        self.rooms
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    pub fn publish(&self, user_id: Uuid, name: &str, payload: serde_json::Value) {
        // Err means no live receivers; at-most-once semantics, drop the event.
        let delivered = match self.rooms.get(&user_id) {
            Some(tx) => tx
                .send(Event {
                    name: name.to_string(),
                    payload,
                })
                .is_ok(),
            None => return,
        };

        if !delivered {
            // The last subscriber is gone; evict the room so the map does not
            // grow with every user that ever connected. The count is
            // re-checked under the shard lock against a concurrent subscribe.
            self.rooms
                .remove_if(&user_id, |_, tx| tx.receiver_count() == 0);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
