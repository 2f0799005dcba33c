use tracing::debug;

use crate::state::AppState;
use shared::models::connection::{ConnectionSession, Room};
use shared::models::game_match::match_room;
use shared::services::errors::match_session_service_errors::MatchSessionServiceError;
use shared::services::session_gateway::SessionGateway;

/// Requests a rematch. The requester's connection leaves the old room and
/// follows up with `join_game` for the announced match.
pub async fn handle_play_again(
    state: &AppState,
    session: &mut ConnectionSession,
    match_id: &str,
) -> Result<(), MatchSessionServiceError> {
    let rematch = state
        .sessions
        .rematch(match_id, &session.participant_id)
        .await?;

    state
        .gateway
        .leave_room(&session.connection_id, &match_room(match_id));
    if session.current_match() == Some(match_id) {
        session.room = Room::None;
    }
    debug!(
        "Connection {} left match {} for rematch {}",
        session.connection_id, match_id, rematch.match_id
    );
    Ok(())
}
