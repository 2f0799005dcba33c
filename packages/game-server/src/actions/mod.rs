use chrono::Utc;
use tracing::{debug, error};

use crate::state::AppState;
use shared::models::connection::ConnectionSession;
use shared::models::events::{ClientMessage, ServerEvent};
use shared::services::session_gateway::SessionGateway;

pub mod connect;
pub mod disconnect;
pub mod join_game;
pub mod lobby;
pub mod make_choice;
pub mod play_again;

/// Parses one inbound frame and routes it to its action handler.
///
/// Rejected transitions are dropped without telling anyone; only a frame that
/// cannot be parsed earns the sender an `error` event.
pub async fn handle_message(state: &AppState, session: &mut ConnectionSession, raw: &str) {
    let message = match serde_json::from_str::<ClientMessage>(raw) {
        Ok(message) => message,
        Err(e) => {
            debug!(
                "Unparseable message from {}: {}",
                session.connection_id, e
            );
            state.gateway.send_to(
                &session.connection_id,
                &ServerEvent::Error {
                    message: format!("Invalid message: {}", e),
                },
            );
            return;
        }
    };
    debug!(
        "Connection {} sent {:?}",
        session.connection_id, message
    );

    let result = match message {
        ClientMessage::JoinGame { match_id } => {
            join_game::handle_join_game(state, session, &match_id).await
        }
        ClientMessage::MakeChoice { match_id, choice } => {
            make_choice::handle_make_choice(state, session, &match_id, choice).await
        }
        ClientMessage::PlayAgain { match_id } => {
            play_again::handle_play_again(state, session, &match_id).await
        }
        ClientMessage::JoinLobby => {
            lobby::handle_join_lobby(state, session);
            Ok(())
        }
        ClientMessage::LeaveLobby => {
            lobby::handle_leave_lobby(state, session);
            Ok(())
        }
        ClientMessage::Ping => {
            state.gateway.send_to(
                &session.connection_id,
                &ServerEvent::Pong {
                    timestamp: Utc::now(),
                },
            );
            Ok(())
        }
    };

    match result {
        Ok(()) => {}
        Err(e) if e.is_ignorable() => debug!(
            "Dropped action from {}: {}",
            session.participant_id, e
        ),
        Err(e) => error!(
            "Action from {} failed: {}",
            session.participant_id, e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use shared::config::SessionConfig;
    use shared::models::auth::TokenClaims;
    use shared::models::connection::Room;
    use shared::models::game_match::MatchStatus;
    use shared::repositories::participant_repository::ParticipantRepository;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Client {
        session: ConnectionSession,
        outbound: UnboundedReceiver<ServerEvent>,
    }

    impl Client {
        async fn send(&mut self, state: &AppState, raw: &str) {
            handle_message(state, &mut self.session, raw).await;
        }

        fn events(&mut self) -> Vec<Value> {
            let mut events = Vec::new();
            while let Ok(event) = self.outbound.try_recv() {
                events.push(serde_json::to_value(&event).unwrap());
            }
            events
        }

        fn event_names(&mut self) -> Vec<String> {
            self.events()
                .into_iter()
                .map(|event| event["event"].as_str().unwrap_or_default().to_string())
                .collect()
        }
    }

    fn test_state() -> AppState {
        AppState::new("action-test-secret", &SessionConfig::default())
    }

    async fn connect(state: &AppState, participant_id: &str) -> Client {
        let claims = TokenClaims {
            sub: participant_id.to_string(),
            username: participant_id.to_uppercase(),
            exp: 0,
            iat: 0,
        };
        let connection_id = format!("conn-{}", participant_id);
        let (session, outbound) = connect::handle_connect(state, &connection_id, &claims)
            .await
            .unwrap();
        Client { session, outbound }
    }

    /// Alice queues, both clients send `join_game`, and the match is active.
    async fn seated_pair(state: &AppState) -> (String, Client, Client) {
        let mut alice = connect(state, "alice").await;
        let mut bob = connect(state, "bob").await;
        let queued = state.matchmaking.enqueue("alice").await.unwrap();
        let join = format!(r#"{{"action":"join_game","matchId":"{}"}}"#, queued.match_id);
        alice.send(state, &join).await;
        bob.send(state, &join).await;
        (queued.match_id, alice, bob)
    }

    #[tokio::test]
    async fn test_connect_registers_participant() {
        let state = test_state();

        let client = connect(&state, "alice").await;

        let stored = state.participants.get_participant("alice").await.unwrap();
        assert_eq!(stored.username, "ALICE");
        assert_eq!(stored.rating, 1200);
        assert_eq!(client.session.room, Room::None);
        assert_eq!(state.gateway.connection_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_message_answers_sender_only() {
        let state = test_state();
        let mut alice = connect(&state, "alice").await;
        let mut bob = connect(&state, "bob").await;
        alice.send(&state, r#"{"action":"join_lobby"}"#).await;
        bob.send(&state, r#"{"action":"join_lobby"}"#).await;
        alice.events();

        bob.send(&state, "{not json").await;
        bob.send(&state, r#"{"action":"teleport"}"#).await;

        assert_eq!(bob.event_names(), vec!["error", "error"]);
        assert!(alice.events().is_empty());
    }

    #[tokio::test]
    async fn test_ping_answers_pong() {
        let state = test_state();
        let mut alice = connect(&state, "alice").await;

        alice.send(&state, r#"{"action":"ping"}"#).await;

        let events = alice.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["event"], "pong");
        assert!(events[0]["data"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_lobby_presence() {
        let state = test_state();
        let mut alice = connect(&state, "alice").await;
        let mut bob = connect(&state, "bob").await;

        alice.send(&state, r#"{"action":"join_lobby"}"#).await;
        bob.send(&state, r#"{"action":"join_lobby"}"#).await;

        assert!(bob.events().is_empty());
        let seen = alice.events();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["event"], "user_joined_lobby");
        assert_eq!(seen[0]["data"]["participantId"], "bob");
        assert_eq!(seen[0]["data"]["username"], "BOB");

        bob.send(&state, r#"{"action":"leave_lobby"}"#).await;

        assert_eq!(alice.event_names(), vec!["user_left_lobby"]);
        assert_eq!(bob.session.room, Room::None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_owner_waits_until_opponent_joins() {
        let state = test_state();
        let mut alice = connect(&state, "alice").await;
        let queued = state.matchmaking.enqueue("alice").await.unwrap();

        alice
            .send(
                &state,
                &format!(r#"{{"action":"join_game","matchId":"{}"}}"#, queued.match_id),
            )
            .await;

        assert_eq!(alice.event_names(), vec!["waiting_for_opponent"]);
        assert_eq!(alice.session.current_match(), Some(queued.match_id.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_round_over_actions() {
        let state = test_state();
        let (match_id, mut alice, mut bob) = seated_pair(&state).await;

        let joined = bob.events();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0]["event"], "player_joined");
        assert_eq!(joined[0]["data"]["opponentUsername"], "ALICE");
        assert_eq!(joined[0]["data"]["timerSeconds"], 30);
        alice.events();

        alice
            .send(
                &state,
                &format!(
                    r#"{{"action":"make_choice","matchId":"{}","choice":"rock"}}"#,
                    match_id
                ),
            )
            .await;
        let acknowledged = bob.events();
        assert_eq!(acknowledged.len(), 1);
        assert_eq!(acknowledged[0]["event"], "choice_made");
        assert_eq!(acknowledged[0]["data"]["participantId"], "alice");
        assert!(acknowledged[0]["data"].get("choice").is_none());

        bob.send(
            &state,
            &format!(
                r#"{{"action":"make_choice","matchId":"{}","choice":"scissors"}}"#,
                match_id
            ),
        )
        .await;

        let result = alice.events();
        let result = result.last().unwrap();
        assert_eq!(result["event"], "game_result");
        assert_eq!(result["data"]["moveA"], "rock");
        assert_eq!(result["data"]["moveB"], "scissors");
        assert_eq!(result["data"]["winnerId"], "alice");
        assert_eq!(result["data"]["deltaA"], 16);
        assert_eq!(result["data"]["deltaB"], -16);
        assert_eq!(bob.event_names(), vec!["game_result"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_choice_is_silent() {
        let state = test_state();
        let (match_id, mut alice, mut bob) = seated_pair(&state).await;
        let mut carol = connect(&state, "carol").await;
        alice.events();
        bob.events();

        carol
            .send(
                &state,
                &format!(
                    r#"{{"action":"make_choice","matchId":"{}","choice":"paper"}}"#,
                    match_id
                ),
            )
            .await;

        assert!(alice.events().is_empty());
        assert!(bob.events().is_empty());
        assert!(carol.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_notifies_remaining_participant() {
        let state = test_state();
        let (match_id, mut alice, bob) = seated_pair(&state).await;
        alice.events();

        disconnect::handle_disconnect(&state, &bob.session).await;

        let events = alice.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["event"], "opponent_disconnected");
        assert_eq!(
            state.sessions.get_match(&match_id).await.unwrap().status,
            MatchStatus::Cancelled
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_again_announces_and_moves_requester() {
        let state = test_state();
        let (match_id, mut alice, mut bob) = seated_pair(&state).await;
        for (client, choice) in [(&mut alice, "paper"), (&mut bob, "rock")] {
            client
                .send(
                    &state,
                    &format!(
                        r#"{{"action":"make_choice","matchId":"{}","choice":"{}"}}"#,
                        match_id, choice
                    ),
                )
                .await;
        }
        alice.events();
        bob.events();

        bob.send(
            &state,
            &format!(r#"{{"action":"play_again","matchId":"{}"}}"#, match_id),
        )
        .await;

        let announced = alice.events();
        assert_eq!(announced.len(), 1);
        assert_eq!(announced[0]["event"], "new_game_created");
        let new_match_id = announced[0]["data"]["newMatchId"].as_str().unwrap().to_string();
        assert_eq!(bob.event_names(), vec!["new_game_created"]);
        assert_eq!(bob.session.room, Room::None);

        bob.send(
            &state,
            &format!(r#"{{"action":"join_game","matchId":"{}"}}"#, new_match_id),
        )
        .await;
        assert_eq!(bob.session.current_match(), Some(new_match_id.as_str()));
        assert!(alice.events().is_empty());
    }
}
