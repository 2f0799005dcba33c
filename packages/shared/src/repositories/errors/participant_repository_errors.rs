#[derive(Debug, Clone, PartialEq)]
pub enum ParticipantRepositoryError {
    NotFound,
    AlreadyExists,
    Unavailable(String),
}

impl std::fmt::Display for ParticipantRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParticipantRepositoryError::NotFound => write!(f, "Participant not found"),
            ParticipantRepositoryError::AlreadyExists => write!(f, "Participant already exists"),
            ParticipantRepositoryError::Unavailable(msg) => {
                write!(f, "Participant store unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for ParticipantRepositoryError {}
