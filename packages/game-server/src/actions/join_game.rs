use crate::actions::lobby::leave_current_room;
use crate::state::AppState;
use shared::models::connection::{ConnectionSession, Room};
use shared::services::errors::match_session_service_errors::MatchSessionServiceError;

pub async fn handle_join_game(
    state: &AppState,
    session: &mut ConnectionSession,
    match_id: &str,
) -> Result<(), MatchSessionServiceError> {
    leave_current_room(state, session);
    state
        .sessions
        .enter_match(match_id, &session.participant_id, &session.connection_id)
        .await?;
    session.room = Room::Match(match_id.to_string());
    Ok(())
}
