#[derive(Debug, Clone, PartialEq)]
pub enum MatchRepositoryError {
    NotFound,
    AlreadyExists,
    Unavailable(String),
}

impl std::fmt::Display for MatchRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchRepositoryError::NotFound => write!(f, "Match not found"),
            MatchRepositoryError::AlreadyExists => write!(f, "Match already exists"),
            MatchRepositoryError::Unavailable(msg) => write!(f, "Match store unavailable: {}", msg),
        }
    }
}

impl std::error::Error for MatchRepositoryError {}
