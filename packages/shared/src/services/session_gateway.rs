use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::models::events::ServerEvent;

/// Room-scoped delivery used by the match session services. Implementations
/// must not block: callers hold per-match locks while broadcasting.
pub trait SessionGateway: Send + Sync {
    fn join_room(&self, connection_id: &str, room_id: &str);

    fn leave_room(&self, connection_id: &str, room_id: &str);

    /// Sends to every member of the room except `exclude`. Returns the number
    /// of connections the event was queued for.
    fn broadcast(&self, room_id: &str, event: &ServerEvent, exclude: Option<&str>) -> usize;

    fn send_to(&self, connection_id: &str, event: &ServerEvent) -> bool;
}

struct ConnectionEntry {
    participant_id: String,
    sender: UnboundedSender<ServerEvent>,
}

#[derive(Default)]
struct GatewayState {
    connections: HashMap<String, ConnectionEntry>,
    rooms: HashMap<String, HashSet<String>>,
}

/// Gateway backed by one unbounded channel per live connection.
#[derive(Default)]
pub struct InMemorySessionGateway {
    state: RwLock<GatewayState>,
}

impl InMemorySessionGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, GatewayState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GatewayState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a connection for an authenticated participant and returns
    /// the receiving end of its outbound queue.
    pub fn connect(&self, connection_id: &str, participant_id: &str) -> UnboundedReceiver<ServerEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let previous = self.write().connections.insert(
            connection_id.to_string(),
            ConnectionEntry {
                participant_id: participant_id.to_string(),
                sender,
            },
        );
        if previous.is_some() {
            warn!("Connection {} registered twice, replacing sender", connection_id);
        }
        debug!(
            "Registered connection {} for participant {}",
            connection_id, participant_id
        );
        receiver
    }

    /// Drops the connection and removes it from every room. Returns the rooms
    /// it was in.
    pub fn disconnect(&self, connection_id: &str) -> Vec<String> {
        let mut state = self.write();
        state.connections.remove(connection_id);
        let mut left = Vec::new();
        state.rooms.retain(|room_id, members| {
            if members.remove(connection_id) {
                left.push(room_id.clone());
            }
            !members.is_empty()
        });
        debug!("Unregistered connection {} from {} rooms", connection_id, left.len());
        left
    }

    pub fn room_members(&self, room_id: &str) -> Vec<String> {
        self.read()
            .rooms
            .get(room_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn participant_of(&self, connection_id: &str) -> Option<String> {
        self.read()
            .connections
            .get(connection_id)
            .map(|entry| entry.participant_id.clone())
    }

    pub fn connection_count(&self) -> usize {
        self.read().connections.len()
    }
}

impl SessionGateway for InMemorySessionGateway {
    fn join_room(&self, connection_id: &str, room_id: &str) {
        let mut state = self.write();
        if !state.connections.contains_key(connection_id) {
            warn!(
                "Ignoring join of unknown connection {} to room {}",
                connection_id, room_id
            );
            return;
        }
        state
            .rooms
            .entry(room_id.to_string())
            .or_default()
            .insert(connection_id.to_string());
    }

    fn leave_room(&self, connection_id: &str, room_id: &str) {
        let mut state = self.write();
        let now_empty = match state.rooms.get_mut(room_id) {
            Some(members) => {
                members.remove(connection_id);
                members.is_empty()
            }
            None => false,
        };
        if now_empty {
            state.rooms.remove(room_id);
        }
    }

    fn broadcast(&self, room_id: &str, event: &ServerEvent, exclude: Option<&str>) -> usize {
        let state = self.read();
        let Some(members) = state.rooms.get(room_id) else {
            debug!("No members in room {} for {}", room_id, event.name());
            return 0;
        };

        let mut delivered = 0;
        for connection_id in members {
            if exclude == Some(connection_id.as_str()) {
                continue;
            }
            if let Some(entry) = state.connections.get(connection_id) {
                if entry.sender.send(event.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        debug!(
            "Broadcast {} to {} connections in room {}",
            event.name(),
            delivered,
            room_id
        );
        delivered
    }

    fn send_to(&self, connection_id: &str, event: &ServerEvent) -> bool {
        match self.read().connections.get(connection_id) {
            Some(entry) => entry.sender.send(event.clone()).is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(receiver: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    fn notice(message: &str) -> ServerEvent {
        ServerEvent::OpponentDisconnected {
            message: message.to_string(),
        }
    }

    #[test]
    fn test_broadcast_reaches_room_members_only() {
        let gateway = InMemorySessionGateway::new();
        let mut alice = gateway.connect("c-alice", "alice");
        let mut bob = gateway.connect("c-bob", "bob");
        let mut carol = gateway.connect("c-carol", "carol");
        gateway.join_room("c-alice", "match_1");
        gateway.join_room("c-bob", "match_1");
        gateway.join_room("c-carol", "lobby");

        let delivered = gateway.broadcast("match_1", &notice("hello"), None);

        assert_eq!(delivered, 2);
        assert_eq!(drain(&mut alice), vec![notice("hello")]);
        assert_eq!(drain(&mut bob), vec![notice("hello")]);
        assert!(drain(&mut carol).is_empty());
    }

    #[test]
    fn test_broadcast_excludes_sender() {
        let gateway = InMemorySessionGateway::new();
        let mut alice = gateway.connect("c-alice", "alice");
        let mut bob = gateway.connect("c-bob", "bob");
        gateway.join_room("c-alice", "lobby");
        gateway.join_room("c-bob", "lobby");

        let delivered = gateway.broadcast("lobby", &notice("hi"), Some("c-alice"));

        assert_eq!(delivered, 1);
        assert!(drain(&mut alice).is_empty());
        assert_eq!(drain(&mut bob).len(), 1);
    }

    #[test]
    fn test_leave_room_stops_delivery() {
        let gateway = InMemorySessionGateway::new();
        let mut alice = gateway.connect("c-alice", "alice");
        gateway.join_room("c-alice", "match_1");
        gateway.leave_room("c-alice", "match_1");

        assert_eq!(gateway.broadcast("match_1", &notice("x"), None), 0);
        assert!(drain(&mut alice).is_empty());
        assert!(gateway.room_members("match_1").is_empty());
    }

    #[test]
    fn test_disconnect_removes_from_all_rooms() {
        let gateway = InMemorySessionGateway::new();
        let _alice = gateway.connect("c-alice", "alice");
        let _bob = gateway.connect("c-bob", "bob");
        gateway.join_room("c-alice", "lobby");
        gateway.join_room("c-alice", "match_1");
        gateway.join_room("c-bob", "match_1");

        let mut left = gateway.disconnect("c-alice");
        left.sort();

        assert_eq!(left, vec!["lobby".to_string(), "match_1".to_string()]);
        assert_eq!(gateway.room_members("match_1"), vec!["c-bob".to_string()]);
        assert_eq!(gateway.participant_of("c-alice"), None);
        assert_eq!(gateway.connection_count(), 1);
    }

    #[test]
    fn test_unknown_connection_cannot_join() {
        let gateway = InMemorySessionGateway::new();

        gateway.join_room("c-ghost", "lobby");

        assert!(gateway.room_members("lobby").is_empty());
    }

    #[test]
    fn test_send_to_single_connection() {
        let gateway = InMemorySessionGateway::new();
        let mut alice = gateway.connect("c-alice", "alice");

        assert!(gateway.send_to("c-alice", &notice("direct")));
        assert!(!gateway.send_to("c-ghost", &notice("direct")));
        assert_eq!(drain(&mut alice), vec![notice("direct")]);
        assert_eq!(gateway.participant_of("c-alice").as_deref(), Some("alice"));
    }

    #[test]
    fn test_closed_receiver_is_not_counted() {
        let gateway = InMemorySessionGateway::new();
        let alice = gateway.connect("c-alice", "alice");
        gateway.join_room("c-alice", "lobby");
        drop(alice);

        assert_eq!(gateway.broadcast("lobby", &notice("x"), None), 0);
    }
}
