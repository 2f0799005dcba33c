use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::game_match::{Choice, Move};

/// Messages a connected client may send, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(
    tag = "action",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    JoinGame { match_id: String },
    MakeChoice { match_id: String, choice: Choice },
    PlayAgain { match_id: String },
    JoinLobby,
    LeaveLobby,
    Ping,
}

/// Events pushed to clients, serialized as `{"event": ..., "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    PlayerJoined {
        participant_id: String,
        username: String,
        opponent_username: String,
        active: bool,
        timer_seconds: u64,
    },
    WaitingForOpponent {
        message: String,
    },
    ChoiceMade {
        participant_id: String,
    },
    GameResult {
        move_a: Move,
        move_b: Move,
        winner_id: Option<String>,
        delta_a: i32,
        delta_b: i32,
    },
    GameTimeout {
        winner_id: String,
        loser_id: String,
        winner_username: String,
        loser_username: String,
        delta_a: i32,
        delta_b: i32,
    },
    NewGameCreated {
        new_match_id: String,
        username_a: String,
        username_b: String,
    },
    UserJoinedLobby {
        participant_id: String,
        username: String,
    },
    UserLeftLobby {
        participant_id: String,
        username: String,
    },
    OpponentDisconnected {
        message: String,
    },
    Pong {
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::PlayerJoined { .. } => "player_joined",
            ServerEvent::WaitingForOpponent { .. } => "waiting_for_opponent",
            ServerEvent::ChoiceMade { .. } => "choice_made",
            ServerEvent::GameResult { .. } => "game_result",
            ServerEvent::GameTimeout { .. } => "game_timeout",
            ServerEvent::NewGameCreated { .. } => "new_game_created",
            ServerEvent::UserJoinedLobby { .. } => "user_joined_lobby",
            ServerEvent::UserLeftLobby { .. } => "user_left_lobby",
            ServerEvent::OpponentDisconnected { .. } => "opponent_disconnected",
            ServerEvent::Pong { .. } => "pong",
            ServerEvent::Error { .. } => "error",
        }
    }

    /// True for the two events that close out a match.
    pub fn is_result(&self) -> bool {
        matches!(
            self,
            ServerEvent::GameResult { .. } | ServerEvent::GameTimeout { .. }
        )
    }
}
