use serde::Serialize;

/// Broadcast group shared by everyone browsing for opponents.
pub const LOBBY_ROOM: &str = "lobby";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Room {
    None,
    Lobby,
    Match(String),
}

impl Room {
    /// Gateway room id, if the connection is in one.
    pub fn room_id(&self) -> Option<String> {
        match self {
            Room::None => None,
            Room::Lobby => Some(LOBBY_ROOM.to_string()),
            Room::Match(match_id) => Some(super::game_match::match_room(match_id)),
        }
    }
}

/// Live connection state. Exists only while the socket is open.
#[derive(Debug, Clone)]
pub struct ConnectionSession {
    pub connection_id: String,
    pub participant_id: String,
    pub username: String,
    pub room: Room,
}

impl ConnectionSession {
    pub fn new(connection_id: &str, participant_id: &str, username: &str) -> Self {
        ConnectionSession {
            connection_id: connection_id.to_string(),
            participant_id: participant_id.to_string(),
            username: username.to_string(),
            room: Room::None,
        }
    }

    pub fn current_match(&self) -> Option<&str> {
        match &self.room {
            Room::Match(match_id) => Some(match_id.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_ids() {
        assert_eq!(Room::None.room_id(), None);
        assert_eq!(Room::Lobby.room_id().as_deref(), Some(LOBBY_ROOM));
        assert_eq!(
            Room::Match("abc".to_string()).room_id().as_deref(),
            Some("match_abc")
        );
    }

    #[test]
    fn test_new_session_has_no_room() {
        let session = ConnectionSession::new("conn-1", "player-1", "alice");

        assert_eq!(session.room, Room::None);
        assert_eq!(session.current_match(), None);
    }

    #[test]
    fn test_current_match() {
        let mut session = ConnectionSession::new("conn-1", "player-1", "alice");
        session.room = Room::Match("match-1".to_string());

        assert_eq!(session.current_match(), Some("match-1"));
    }
}
