use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::game_match::MatchStatus;
use crate::repositories::match_repository::MatchRepository;
use crate::services::errors::matchmaking_service_errors::MatchmakingServiceError;
use crate::services::match_session_service::MatchSessionService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Matched,
    Waiting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResult {
    pub match_id: String,
    pub status: QueueStatus,
}

/// Quickplay pairing over the waiting matches in the store.
#[derive(Clone)]
pub struct MatchmakingService {
    repository: Arc<dyn MatchRepository>,
    sessions: MatchSessionService,
    queue_lock: Arc<Mutex<()>>,
}

impl MatchmakingService {
    pub fn new(repository: Arc<dyn MatchRepository>, sessions: MatchSessionService) -> Self {
        MatchmakingService {
            repository,
            sessions,
            queue_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Joins the oldest waiting quickplay match opened by someone else, or
    /// opens a new one. A participant already waiting gets their match back.
    pub async fn enqueue(
        &self,
        participant_id: &str,
    ) -> Result<EnqueueResult, MatchmakingServiceError> {
        let _queue = self.queue_lock.lock().await;

        let already_waiting = self
            .repository
            .list_matches_for_participant(participant_id)
            .await?
            .into_iter()
            .find(|m| {
                m.quickplay
                    && m.status == MatchStatus::Waiting
                    && m.participant_a_id == participant_id
            });
        if let Some(game_match) = already_waiting {
            debug!(
                "Participant {} is already waiting in match {}",
                participant_id, game_match.match_id
            );
            return Ok(EnqueueResult {
                match_id: game_match.match_id,
                status: QueueStatus::Waiting,
            });
        }

        let candidates = self
            .repository
            .find_waiting_quickplay_matches(participant_id)
            .await?;
        for candidate in candidates {
            match self.sessions.join(&candidate.match_id, participant_id).await {
                Ok(game_match) => {
                    info!(
                        "Matched participant {} into match {}",
                        participant_id, game_match.match_id
                    );
                    return Ok(EnqueueResult {
                        match_id: game_match.match_id,
                        status: QueueStatus::Matched,
                    });
                }
                Err(e) if e.is_ignorable() => {
                    debug!("Skipping match {}: {}", candidate.match_id, e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let game_match = self.sessions.create_match(participant_id, true).await?;
        info!(
            "Participant {} is waiting for an opponent in match {}",
            participant_id, game_match.match_id
        );
        Ok(EnqueueResult {
            match_id: game_match.match_id,
            status: QueueStatus::Waiting,
        })
    }
}
