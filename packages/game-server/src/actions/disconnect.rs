use tracing::{debug, error, info};

use crate::state::AppState;
use shared::models::connection::{ConnectionSession, Room, LOBBY_ROOM};
use shared::models::events::ServerEvent;
use shared::services::session_gateway::SessionGateway;

/// Tears down a closed connection. The gateway entry goes first so the
/// disconnect notice only reaches the members that remain.
pub async fn handle_disconnect(state: &AppState, session: &ConnectionSession) {
    let rooms = state.gateway.disconnect(&session.connection_id);
    debug!(
        "Connection {} left rooms {:?}",
        session.connection_id, rooms
    );

    match &session.room {
        Room::Lobby => {
            state.gateway.broadcast(
                LOBBY_ROOM,
                &ServerEvent::UserLeftLobby {
                    participant_id: session.participant_id.clone(),
                    username: session.username.clone(),
                },
                None,
            );
        }
        Room::Match(match_id) => {
            match state
                .sessions
                .disconnect(match_id, &session.participant_id)
                .await
            {
                Ok(true) => info!(
                    "Match {} cancelled by disconnect of {}",
                    match_id, session.participant_id
                ),
                Ok(false) => debug!("Match {} already settled", match_id),
                Err(e) if e.is_ignorable() => debug!("Ignoring disconnect: {}", e),
                Err(e) => error!(
                    "Failed to handle disconnect of {} from match {}: {}",
                    session.participant_id, match_id, e
                ),
            }
        }
        Room::None => {}
    }
}
