use crate::repositories::errors::match_repository_errors::MatchRepositoryError;
use crate::services::errors::match_session_service_errors::MatchSessionServiceError;

#[derive(Debug, Clone, PartialEq)]
pub enum MatchmakingServiceError {
    RepositoryError(MatchRepositoryError),
    SessionError(MatchSessionServiceError),
}

impl std::fmt::Display for MatchmakingServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchmakingServiceError::RepositoryError(err) => {
                write!(f, "Repository error: {}", err)
            }
            MatchmakingServiceError::SessionError(err) => write!(f, "Session error: {}", err),
        }
    }
}

impl std::error::Error for MatchmakingServiceError {}

impl From<MatchRepositoryError> for MatchmakingServiceError {
    fn from(err: MatchRepositoryError) -> Self {
        MatchmakingServiceError::RepositoryError(err)
    }
}

impl From<MatchSessionServiceError> for MatchmakingServiceError {
    fn from(err: MatchSessionServiceError) -> Self {
        MatchmakingServiceError::SessionError(err)
    }
}
