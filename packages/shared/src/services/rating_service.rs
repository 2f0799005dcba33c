use std::sync::Arc;

use tracing::info;

use crate::models::game_match::Outcome;
use crate::models::participant::Participant;
use crate::repositories::errors::participant_repository_errors::ParticipantRepositoryError;
use crate::repositories::participant_repository::ParticipantRepository;
use crate::services::errors::rating_service_errors::RatingServiceError;

/// Maximum rating points exchanged in a single match.
pub const DEFAULT_K_FACTOR: i32 = 32;

/// Probability that a player rated `rating` beats one rated `opponent_rating`.
pub fn expected_score(rating: i32, opponent_rating: i32) -> f64 {
    let gap = f64::from(opponent_rating) - f64::from(rating);
    1.0 / (1.0 + 10f64.powf(gap / 400.0))
}

/// Rating deltas for both seats. Each delta is `round(K * (actual - expected))`
/// with halves rounded away from zero. No clamping is applied.
pub fn compute_deltas(rating_a: i32, rating_b: i32, outcome: Outcome, k_factor: i32) -> (i32, i32) {
    let expected_a = expected_score(rating_a, rating_b);
    let expected_b = 1.0 - expected_a;

    let (score_a, score_b) = match outcome {
        Outcome::PlayerAWins => (1.0, 0.0),
        Outcome::PlayerBWins => (0.0, 1.0),
        Outcome::Tie => (0.5, 0.5),
    };

    let k = f64::from(k_factor);
    let delta_a = (k * (score_a - expected_a)).round() as i32;
    let delta_b = (k * (score_b - expected_b)).round() as i32;
    (delta_a, delta_b)
}

#[derive(Clone)]
pub struct RatingService {
    repository: Arc<dyn ParticipantRepository>,
    k_factor: i32,
}

impl RatingService {
    pub fn new(repository: Arc<dyn ParticipantRepository>, k_factor: i32) -> Self {
        RatingService {
            repository,
            k_factor,
        }
    }

    pub fn k_factor(&self) -> i32 {
        self.k_factor
    }

    /// Deltas for a match between two stored participants at their current ratings.
    pub async fn compute_match_deltas(
        &self,
        participant_a_id: &str,
        participant_b_id: &str,
        outcome: Outcome,
    ) -> Result<(i32, i32), RatingServiceError> {
        let participant_a = self.load(participant_a_id).await?;
        let participant_b = self.load(participant_b_id).await?;
        Ok(compute_deltas(
            participant_a.rating,
            participant_b.rating,
            outcome,
            self.k_factor,
        ))
    }

    /// Applies precomputed deltas and bumps the played/won/lost/tied counters.
    /// Callers invoke this once per resolved match.
    pub async fn apply_result(
        &self,
        participant_a_id: &str,
        participant_b_id: &str,
        outcome: Outcome,
        deltas: (i32, i32),
    ) -> Result<(Participant, Participant), RatingServiceError> {
        let mut participant_a = self.load(participant_a_id).await?;
        let mut participant_b = self.load(participant_b_id).await?;

        participant_a.rating += deltas.0;
        participant_b.rating += deltas.1;
        participant_a.games_played += 1;
        participant_b.games_played += 1;

        match outcome {
            Outcome::PlayerAWins => {
                participant_a.games_won += 1;
                participant_b.games_lost += 1;
            }
            Outcome::PlayerBWins => {
                participant_a.games_lost += 1;
                participant_b.games_won += 1;
            }
            Outcome::Tie => {
                participant_a.games_tied += 1;
                participant_b.games_tied += 1;
            }
        }

        self.repository.update_participant(&participant_a).await?;
        self.repository.update_participant(&participant_b).await?;

        info!(
            "Applied rating change {:+} to {} (now {}) and {:+} to {} (now {})",
            deltas.0,
            participant_a.id,
            participant_a.rating,
            deltas.1,
            participant_b.id,
            participant_b.rating
        );

        Ok((participant_a, participant_b))
    }

    async fn load(&self, participant_id: &str) -> Result<Participant, RatingServiceError> {
        self.repository
            .get_participant(participant_id)
            .await
            .map_err(|e| match e {
                ParticipantRepositoryError::NotFound => {
                    RatingServiceError::ParticipantNotFound(participant_id.to_string())
                }
                _ => RatingServiceError::RepositoryError(e),
            })
    }
}
