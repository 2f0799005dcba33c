use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::{error::ApiError, middleware::auth::AuthenticatedParticipant, state::AppState};
use shared::models::game_match::Match;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/matches", get(list_matches))
        .route("/matches/{match_id}", get(get_match))
}

/// Matches the caller has a seat in, oldest first.
async fn list_matches(
    State(state): State<AppState>,
    participant: AuthenticatedParticipant,
) -> Result<Json<Vec<Match>>, ApiError> {
    let matches = state
        .sessions
        .list_matches_for_participant(&participant.participant_id)
        .await?;
    Ok(Json(matches))
}

async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    participant: AuthenticatedParticipant,
) -> Result<Json<Match>, ApiError> {
    let game_match = state.sessions.get_match(&match_id).await?;
    if !game_match.is_participant(&participant.participant_id) {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(game_match))
}
