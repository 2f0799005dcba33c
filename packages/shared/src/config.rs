use std::time::Duration;

use crate::services::rating_service::DEFAULT_K_FACTOR;

pub const DEFAULT_TURN_TIMER_SECONDS: u64 = 30;

#[derive(Debug)]
pub enum ConfigError {
    Missing(String),
    Invalid { key: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} environment variable must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "Invalid value for {}: {}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Tunables for the match session subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub turn_timer: Duration,
    pub k_factor: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            turn_timer: Duration::from_secs(DEFAULT_TURN_TIMER_SECONDS),
            k_factor: DEFAULT_K_FACTOR,
        }
    }
}

impl SessionConfig {
    /// Reads `TURN_TIMER_SECONDS` and `ELO_K_FACTOR`, falling back to defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SessionConfig::default();

        let turn_timer = match lookup("TURN_TIMER_SECONDS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(seconds) if seconds > 0 => Duration::from_secs(seconds),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "TURN_TIMER_SECONDS".to_string(),
                        value,
                    })
                }
            },
            None => defaults.turn_timer,
        };

        let k_factor = match lookup("ELO_K_FACTOR") {
            Some(value) => match value.trim().parse::<i32>() {
                Ok(k) if k > 0 => k,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "ELO_K_FACTOR".to_string(),
                        value,
                    })
                }
            },
            None => defaults.k_factor,
        };

        Ok(SessionConfig {
            turn_timer,
            k_factor,
        })
    }
}
