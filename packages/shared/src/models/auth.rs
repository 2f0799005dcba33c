use serde::{Deserialize, Serialize};

/// Claims carried by the bearer token that identifies a participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    pub sub: String,
    pub username: String,
    pub exp: usize,
    pub iat: usize,
}
