use crate::state::AppState;
use shared::models::connection::ConnectionSession;
use shared::models::game_match::Choice;
use shared::services::errors::match_session_service_errors::MatchSessionServiceError;

pub async fn handle_make_choice(
    state: &AppState,
    session: &ConnectionSession,
    match_id: &str,
    choice: Choice,
) -> Result<(), MatchSessionServiceError> {
    state
        .sessions
        .submit_move(match_id, &session.participant_id, choice)
        .await?;
    Ok(())
}
