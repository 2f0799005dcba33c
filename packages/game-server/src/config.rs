use shared::config::{ConfigError, SessionConfig};

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub jwt_secret: String,
    pub session: SessionConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing("JWT_SECRET".to_string()))?;
        let bind_address =
            lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let session = SessionConfig::from_lookup(&lookup)?;

        Ok(ServerConfig {
            bind_address,
            jwt_secret,
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_requires_jwt_secret() {
        let result = ServerConfig::from_lookup(|_| None);

        assert!(matches!(result, Err(ConfigError::Missing(key)) if key == "JWT_SECRET"));
    }

    #[test]
    fn test_defaults_with_secret() {
        let config = ServerConfig::from_lookup(|key| match key {
            "JWT_SECRET" => Some("secret".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn test_reads_all_overrides() {
        let config = ServerConfig::from_lookup(|key| match key {
            "JWT_SECRET" => Some("secret".to_string()),
            "BIND_ADDRESS" => Some("127.0.0.1:8080".to_string()),
            "TURN_TIMER_SECONDS" => Some("15".to_string()),
            "ELO_K_FACTOR" => Some("16".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.session.turn_timer, Duration::from_secs(15));
        assert_eq!(config.session.k_factor, 16);
    }
}
