use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::repositories::errors::participant_repository_errors::ParticipantRepositoryError;
use shared::services::errors::{
    auth_service_errors::AuthServiceError, match_session_service_errors::MatchSessionServiceError,
    matchmaking_service_errors::MatchmakingServiceError,
};

#[derive(Debug)]
pub enum ApiError {
    AuthService(AuthServiceError),
    MatchSession(MatchSessionServiceError),
    Matchmaking(MatchmakingServiceError),
    Participant(ParticipantRepositoryError),
    Unauthorized,
    Forbidden,
}

impl From<AuthServiceError> for ApiError {
    fn from(error: AuthServiceError) -> Self {
        ApiError::AuthService(error)
    }
}

impl From<MatchSessionServiceError> for ApiError {
    fn from(error: MatchSessionServiceError) -> Self {
        ApiError::MatchSession(error)
    }
}

impl From<MatchmakingServiceError> for ApiError {
    fn from(error: MatchmakingServiceError) -> Self {
        ApiError::Matchmaking(error)
    }
}

impl From<ParticipantRepositoryError> for ApiError {
    fn from(error: ParticipantRepositoryError) -> Self {
        ApiError::Participant(error)
    }
}

fn session_status(error: &MatchSessionServiceError) -> StatusCode {
    match error {
        MatchSessionServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        MatchSessionServiceError::InvalidTransition(_)
        | MatchSessionServiceError::ConcurrencyLost(_) => StatusCode::CONFLICT,
        MatchSessionServiceError::RepositoryError(_) | MatchSessionServiceError::RatingError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::AuthService(
                AuthServiceError::InvalidToken | AuthServiceError::ExpiredToken,
            ) => StatusCode::UNAUTHORIZED,
            ApiError::AuthService(AuthServiceError::ValidationError(_)) => StatusCode::BAD_REQUEST,
            ApiError::AuthService(AuthServiceError::JwtError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,

            ApiError::MatchSession(ref error) => session_status(error),
            ApiError::Matchmaking(MatchmakingServiceError::SessionError(ref error)) => {
                session_status(error)
            }
            ApiError::Matchmaking(MatchmakingServiceError::RepositoryError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            ApiError::Participant(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        status.into_response()
    }
}
