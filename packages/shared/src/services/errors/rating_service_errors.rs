use crate::repositories::errors::participant_repository_errors::ParticipantRepositoryError;

#[derive(Debug, Clone, PartialEq)]
pub enum RatingServiceError {
    ParticipantNotFound(String),
    RepositoryError(ParticipantRepositoryError),
}

impl std::fmt::Display for RatingServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RatingServiceError::ParticipantNotFound(id) => {
                write!(f, "Participant not found: {}", id)
            }
            RatingServiceError::RepositoryError(err) => write!(f, "Repository error: {}", err),
        }
    }
}

impl std::error::Error for RatingServiceError {}

impl From<ParticipantRepositoryError> for RatingServiceError {
    fn from(err: ParticipantRepositoryError) -> Self {
        RatingServiceError::RepositoryError(err)
    }
}
