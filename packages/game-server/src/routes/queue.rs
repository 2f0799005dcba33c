use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use tracing::{error, info};

use crate::{error::ApiError, middleware::auth::AuthenticatedParticipant, state::AppState};
use shared::services::matchmaking_service::QueueStatus;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinQueueResponse {
    pub match_id: String,
    pub status: QueueStatus,
    pub message: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/queue/join", post(join_queue))
}

async fn join_queue(
    State(state): State<AppState>,
    participant: AuthenticatedParticipant,
) -> Result<Json<JoinQueueResponse>, ApiError> {
    let result = state
        .matchmaking
        .enqueue(&participant.participant_id)
        .await
        .map_err(|e| {
            error!(
                "Failed to queue participant {}: {}",
                participant.participant_id, e
            );
            ApiError::from(e)
        })?;

    info!(
        "Participant {} queued into match {} ({:?})",
        participant.participant_id, result.match_id, result.status
    );

    let message = match result.status {
        QueueStatus::Matched => "Match found!",
        QueueStatus::Waiting => "Waiting for an opponent...",
    };
    Ok(Json(JoinQueueResponse {
        match_id: result.match_id,
        status: result.status,
        message: message.to_string(),
    }))
}
