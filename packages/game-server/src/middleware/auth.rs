use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Clone)]
pub struct AuthenticatedParticipant {
    pub participant_id: String,
    pub username: String,
}

impl FromRequestParts<AppState> for AuthenticatedParticipant {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .ok_or(ApiError::Unauthorized)?
            .to_str()
            .map_err(|_| ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let claims = state.auth_service.verify_token(token)?;
        let participant = state
            .ensure_participant(&claims.sub, &claims.username)
            .await?;

        Ok(AuthenticatedParticipant {
            participant_id: participant.id,
            username: participant.username,
        })
    }
}
