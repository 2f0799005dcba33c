use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::models::auth::TokenClaims;
use crate::services::errors::auth_service_errors::AuthServiceError;

const TOKEN_TTL_HOURS: i64 = 24;

/// Issues and verifies the bearer tokens that identify participants.
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn new(jwt_secret: &str) -> Self {
        AuthService {
            jwt_secret: jwt_secret.to_string(),
        }
    }

    pub fn generate_token(
        &self,
        participant_id: &str,
        username: &str,
    ) -> Result<String, AuthServiceError> {
        if participant_id.is_empty() || username.is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Participant id and username cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let claims = TokenClaims {
            sub: participant_id.to_string(),
            username: username.to_string(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )
        .map_err(|e| AuthServiceError::JwtError(format!("{:#?}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthServiceError> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_ref());
        let validation = Validation::default();

        match decode::<TokenClaims>(token, &decoding_key, &validation) {
            Ok(token_data) => Ok(token_data.claims),
            Err(err) => match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    Err(AuthServiceError::ExpiredToken)
                }
                _ => Err(AuthServiceError::InvalidToken),
            },
        }
    }
}
