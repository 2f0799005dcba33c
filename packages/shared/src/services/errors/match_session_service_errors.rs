use crate::repositories::errors::match_repository_errors::MatchRepositoryError;
use crate::services::errors::rating_service_errors::RatingServiceError;

#[derive(Debug, Clone, PartialEq)]
pub enum MatchSessionServiceError {
    NotFound(String),
    InvalidTransition(String),
    /// A racing operation already moved the match on. Never an error for the caller.
    ConcurrencyLost(String),
    RepositoryError(MatchRepositoryError),
    RatingError(RatingServiceError),
}

impl MatchSessionServiceError {
    /// Errors the real-time protocol drops silently.
    pub fn is_ignorable(&self) -> bool {
        matches!(
            self,
            MatchSessionServiceError::NotFound(_)
                | MatchSessionServiceError::InvalidTransition(_)
                | MatchSessionServiceError::ConcurrencyLost(_)
        )
    }
}

impl std::fmt::Display for MatchSessionServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchSessionServiceError::NotFound(match_id) => {
                write!(f, "Match not found: {}", match_id)
            }
            MatchSessionServiceError::InvalidTransition(msg) => {
                write!(f, "Invalid transition: {}", msg)
            }
            MatchSessionServiceError::ConcurrencyLost(msg) => {
                write!(f, "Concurrent update won: {}", msg)
            }
            MatchSessionServiceError::RepositoryError(err) => {
                write!(f, "Repository error: {}", err)
            }
            MatchSessionServiceError::RatingError(err) => write!(f, "Rating error: {}", err),
        }
    }
}

impl std::error::Error for MatchSessionServiceError {}

impl From<MatchRepositoryError> for MatchSessionServiceError {
    fn from(err: MatchRepositoryError) -> Self {
        MatchSessionServiceError::RepositoryError(err)
    }
}

impl From<RatingServiceError> for MatchSessionServiceError {
    fn from(err: RatingServiceError) -> Self {
        MatchSessionServiceError::RatingError(err)
    }
}
