use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::models::events::ServerEvent;
use crate::models::game_match::{Choice, Match, MatchStatus, Move, Outcome, DEFAULT_MOVE};
use crate::repositories::match_repository::MatchRepository;
use crate::repositories::participant_repository::ParticipantRepository;
use crate::services::errors::match_session_service_errors::MatchSessionServiceError;
use crate::services::rating_service::RatingService;
use crate::services::session_gateway::SessionGateway;
use crate::services::timer_registry::TimerRegistry;

const UNKNOWN_USERNAME: &str = "Unknown";
const WAITING_MESSAGE: &str = "Waiting for another player to join...";
const DISCONNECT_MESSAGE: &str = "Your opponent left the game. The match was cancelled.";

/// One async mutex per match id. An entry is dropped once the last guard for
/// it is released and nobody else is waiting on it.
#[derive(Default)]
struct MatchLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl MatchLocks {
    async fn acquire(&self, match_id: &str) -> MatchGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(match_id.to_string()).or_default())
        };
        MatchGuard {
            locks: self,
            match_id: match_id.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

struct MatchGuard<'a> {
    locks: &'a MatchLocks,
    match_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for MatchGuard<'_> {
    fn drop(&mut self) {
        // Cloning a lock out of the map needs the map lock, so the count
        // cannot grow between the check and the removal.
        let mut locks = self
            .locks
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        drop(self.guard.take());
        let idle = locks
            .get(&self.match_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if idle {
            locks.remove(&self.match_id);
        }
    }
}

/// Drives matches through Waiting -> Active -> Resolved | Cancelled.
///
/// Every mutation of a match runs under that match's lock, so a resolution,
/// a cancellation and a late timer can never interleave. Events are broadcast
/// only after the new state has been stored.
#[derive(Clone)]
pub struct MatchSessionService {
    repository: Arc<dyn MatchRepository>,
    participants: Arc<dyn ParticipantRepository>,
    rating_service: RatingService,
    gateway: Arc<dyn SessionGateway>,
    timers: Arc<TimerRegistry>,
    locks: Arc<MatchLocks>,
    turn_timer: Duration,
}

impl MatchSessionService {
    pub fn new(
        repository: Arc<dyn MatchRepository>,
        participants: Arc<dyn ParticipantRepository>,
        gateway: Arc<dyn SessionGateway>,
        config: &SessionConfig,
    ) -> Self {
        MatchSessionService {
            repository,
            rating_service: RatingService::new(Arc::clone(&participants), config.k_factor),
            participants,
            gateway,
            timers: Arc::new(TimerRegistry::new()),
            locks: Arc::new(MatchLocks::default()),
            turn_timer: config.turn_timer,
        }
    }

    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }

    pub fn turn_timer(&self) -> Duration {
        self.turn_timer
    }

    pub async fn get_match(&self, match_id: &str) -> Result<Match, MatchSessionServiceError> {
        self.repository
            .get_match(match_id)
            .await?
            .ok_or_else(|| MatchSessionServiceError::NotFound(match_id.to_string()))
    }

    pub async fn list_matches_for_participant(
        &self,
        participant_id: &str,
    ) -> Result<Vec<Match>, MatchSessionServiceError> {
        Ok(self
            .repository
            .list_matches_for_participant(participant_id)
            .await?)
    }

    pub async fn create_match(
        &self,
        participant_a_id: &str,
        quickplay: bool,
    ) -> Result<Match, MatchSessionServiceError> {
        let game_match = Match::new(participant_a_id, quickplay);
        self.repository.create_match(&game_match).await?;
        info!(
            "Created {} match {} for participant {}",
            if quickplay { "quickplay" } else { "invitation" },
            game_match.match_id,
            participant_a_id
        );
        Ok(game_match)
    }

    /// Seats `participant_b_id` in a waiting match and starts both turn timers.
    pub async fn join(
        &self,
        match_id: &str,
        participant_b_id: &str,
    ) -> Result<Match, MatchSessionServiceError> {
        let _guard = self.locks.acquire(match_id).await;

        let game_match = self.get_match(match_id).await?;
        self.join_locked(game_match, participant_b_id).await
    }

    /// Handles a participant's connection entering a match room.
    ///
    /// The owner of a waiting match is told to wait, anyone else entering a
    /// waiting match takes the open seat, and a seated participant entering an
    /// active match has the join re-announced to the room.
    pub async fn enter_match(
        &self,
        match_id: &str,
        participant_id: &str,
        connection_id: &str,
    ) -> Result<Match, MatchSessionServiceError> {
        let _guard = self.locks.acquire(match_id).await;

        let game_match = self.get_match(match_id).await?;
        let room = game_match.room();

        match game_match.status {
            MatchStatus::Waiting if game_match.participant_a_id == participant_id => {
                self.gateway.join_room(connection_id, &room);
                self.gateway.send_to(
                    connection_id,
                    &ServerEvent::WaitingForOpponent {
                        message: WAITING_MESSAGE.to_string(),
                    },
                );
                Ok(game_match)
            }
            MatchStatus::Waiting => {
                self.gateway.join_room(connection_id, &room);
                let joined = self.join_locked(game_match, participant_id).await;
                if joined.is_err() {
                    self.gateway.leave_room(connection_id, &room);
                }
                joined
            }
            MatchStatus::Active if game_match.is_participant(participant_id) => {
                self.gateway.join_room(connection_id, &room);
                let event = self.player_joined_event(&game_match, participant_id).await;
                self.gateway.broadcast(&room, &event, None);
                Ok(game_match)
            }
            status => Err(MatchSessionServiceError::InvalidTransition(format!(
                "participant {} cannot enter match {} while {:?}",
                participant_id, match_id, status
            ))),
        }
    }

    pub async fn submit_move(
        &self,
        match_id: &str,
        participant_id: &str,
        choice: Choice,
    ) -> Result<Match, MatchSessionServiceError> {
        let _guard = self.locks.acquire(match_id).await;

        let mut game_match = self.get_match(match_id).await?;
        if game_match.status.is_terminal() {
            return Err(MatchSessionServiceError::ConcurrencyLost(format!(
                "match {} is already {:?}",
                match_id, game_match.status
            )));
        }
        if game_match.status != MatchStatus::Active {
            return Err(MatchSessionServiceError::InvalidTransition(format!(
                "match {} has not started",
                match_id
            )));
        }
        let side = game_match.side_of(participant_id).ok_or_else(|| {
            MatchSessionServiceError::InvalidTransition(format!(
                "{} is not a participant in match {}",
                participant_id, match_id
            ))
        })?;
        if game_match.move_of(side).is_some() {
            return Err(MatchSessionServiceError::InvalidTransition(format!(
                "{} already moved in match {}",
                participant_id, match_id
            )));
        }

        game_match.set_move(side, Move::from(choice));
        if game_match.both_moves_recorded() {
            return self.resolve_locked(game_match).await;
        }

        self.repository.update_match(&game_match).await?;
        self.timers.cancel(match_id, participant_id);
        info!("Participant {} moved in match {}", participant_id, match_id);

        self.gateway.broadcast(
            &game_match.room(),
            &ServerEvent::ChoiceMade {
                participant_id: participant_id.to_string(),
            },
            None,
        );
        Ok(game_match)
    }

    /// Turn-timer expiry. The expiring participant forfeits and an opponent
    /// who has not moved yet is given the default move.
    pub async fn expire(
        &self,
        match_id: &str,
        participant_id: &str,
    ) -> Result<Match, MatchSessionServiceError> {
        let _guard = self.locks.acquire(match_id).await;

        let mut game_match = self.get_match(match_id).await?;
        if game_match.status != MatchStatus::Active {
            return Err(MatchSessionServiceError::ConcurrencyLost(format!(
                "match {} is {:?}",
                match_id, game_match.status
            )));
        }
        let side = game_match.side_of(participant_id).ok_or_else(|| {
            MatchSessionServiceError::InvalidTransition(format!(
                "{} is not a participant in match {}",
                participant_id, match_id
            ))
        })?;
        if game_match.move_of(side).is_some() {
            return Err(MatchSessionServiceError::ConcurrencyLost(format!(
                "{} already moved in match {}",
                participant_id, match_id
            )));
        }

        game_match.set_move(side, Move::Forfeit);
        if game_match.move_of(side.other()).is_none() {
            game_match.set_move(side.other(), DEFAULT_MOVE);
        }
        info!(
            "Participant {} ran out of time in match {}",
            participant_id, match_id
        );
        self.resolve_locked(game_match).await
    }

    /// Cancels an unresolved match when a participant drops. Returns whether
    /// the match was cancelled by this call.
    pub async fn disconnect(
        &self,
        match_id: &str,
        participant_id: &str,
    ) -> Result<bool, MatchSessionServiceError> {
        let _guard = self.locks.acquire(match_id).await;

        let mut game_match = self.get_match(match_id).await?;
        if game_match.status.is_terminal() {
            debug!(
                "Ignoring disconnect from {} on {:?} match {}",
                participant_id, game_match.status, match_id
            );
            return Ok(false);
        }
        if !game_match.is_participant(participant_id) {
            return Err(MatchSessionServiceError::InvalidTransition(format!(
                "{} is not a participant in match {}",
                participant_id, match_id
            )));
        }
        if game_match.both_moves_recorded() {
            return Ok(false);
        }

        game_match.status = MatchStatus::Cancelled;
        self.repository.update_match(&game_match).await?;
        let cancelled = self.timers.cancel_all(match_id);
        info!(
            "Match {} cancelled after {} disconnected ({} timers stopped)",
            match_id, participant_id, cancelled
        );

        self.gateway.broadcast(
            &game_match.room(),
            &ServerEvent::OpponentDisconnected {
                message: DISCONNECT_MESSAGE.to_string(),
            },
            None,
        );
        Ok(true)
    }

    /// Opens a new active match between the same two participants of a
    /// resolved match, keeping their seats. Repeated requests announce the match created the first time.
    pub async fn rematch(
        &self,
        old_match_id: &str,
        requester_id: &str,
    ) -> Result<Match, MatchSessionServiceError> {
        let _guard = self.locks.acquire(old_match_id).await;

        let mut old_match = self.get_match(old_match_id).await?;
        if !old_match.is_participant(requester_id) {
            return Err(MatchSessionServiceError::InvalidTransition(format!(
                "{} is not a participant in match {}",
                requester_id, old_match_id
            )));
        }
        if old_match.status != MatchStatus::Resolved {
            return Err(MatchSessionServiceError::InvalidTransition(format!(
                "match {} is {:?}, only resolved matches can be replayed",
                old_match_id, old_match.status
            )));
        }
        let Some(participant_b_id) = old_match.participant_b_id.clone() else {
            return Err(MatchSessionServiceError::InvalidTransition(format!(
                "match {} has no opponent to rematch",
                old_match_id
            )));
        };

        if let Some(rematch_id) = old_match.rematch_id.clone() {
            let existing = self.get_match(&rematch_id).await?;
            debug!(
                "Rematch of {} already created as {}",
                old_match_id, rematch_id
            );
            self.announce_rematch(&old_match, &existing).await;
            return Ok(existing);
        }

        let new_match = Match::new_active(&old_match.participant_a_id, &participant_b_id);
        self.repository.create_match(&new_match).await?;
        old_match.rematch_id = Some(new_match.match_id.clone());
        self.repository.update_match(&old_match).await?;
        self.arm_turn_timers(&new_match)?;
        info!(
            "Participant {} requested rematch of {}: new match {}",
            requester_id, old_match_id, new_match.match_id
        );

        self.announce_rematch(&old_match, &new_match).await;
        Ok(new_match)
    }

    async fn join_locked(
        &self,
        mut game_match: Match,
        participant_b_id: &str,
    ) -> Result<Match, MatchSessionServiceError> {
        if game_match.status != MatchStatus::Waiting || game_match.participant_b_id.is_some() {
            return Err(MatchSessionServiceError::ConcurrencyLost(format!(
                "match {} is no longer waiting",
                game_match.match_id
            )));
        }
        if game_match.participant_a_id == participant_b_id {
            return Err(MatchSessionServiceError::InvalidTransition(format!(
                "{} cannot join their own match {}",
                participant_b_id, game_match.match_id
            )));
        }

        game_match.participant_b_id = Some(participant_b_id.to_string());
        game_match.status = MatchStatus::Active;
        self.repository.update_match(&game_match).await?;
        info!(
            "Participant {} joined match {}",
            participant_b_id, game_match.match_id
        );

        self.arm_turn_timers(&game_match)?;
        let event = self.player_joined_event(&game_match, participant_b_id).await;
        self.gateway.broadcast(&game_match.room(), &event, None);
        Ok(game_match)
    }

    /// Settles a match whose two moves are recorded. Caller holds the match lock.
    async fn resolve_locked(
        &self,
        mut game_match: Match,
    ) -> Result<Match, MatchSessionServiceError> {
        let (Some(move_a), Some(move_b)) = (game_match.move_a, game_match.move_b) else {
            return Err(MatchSessionServiceError::InvalidTransition(format!(
                "match {} cannot resolve before both moves are recorded",
                game_match.match_id
            )));
        };
        let Some(participant_b_id) = game_match.participant_b_id.clone() else {
            return Err(MatchSessionServiceError::InvalidTransition(format!(
                "match {} has no second participant",
                game_match.match_id
            )));
        };
        let participant_a_id = game_match.participant_a_id.clone();

        let outcome = Outcome::from_moves(move_a, move_b);
        let (delta_a, delta_b) = self
            .rating_service
            .compute_match_deltas(&participant_a_id, &participant_b_id, outcome)
            .await?;

        game_match.winner_id = match outcome {
            Outcome::PlayerAWins => Some(participant_a_id.clone()),
            Outcome::PlayerBWins => Some(participant_b_id.clone()),
            Outcome::Tie => None,
        };
        game_match.delta_a = delta_a;
        game_match.delta_b = delta_b;
        game_match.status = MatchStatus::Resolved;
        game_match.resolved_at = Some(Utc::now());
        self.repository.update_match(&game_match).await?;
        self.timers.cancel_all(&game_match.match_id);
        info!(
            "Match {} resolved as {:?} ({:?} vs {:?})",
            game_match.match_id, outcome, move_a, move_b
        );

        let applied = self
            .rating_service
            .apply_result(
                &participant_a_id,
                &participant_b_id,
                outcome,
                (delta_a, delta_b),
            )
            .await;
        if let Err(e) = &applied {
            error!(
                "Failed to apply ratings for match {}: {}",
                game_match.match_id, e
            );
        }

        let event = self.result_event(&game_match, move_a, move_b).await;
        self.gateway.broadcast(&game_match.room(), &event, None);

        applied?;
        Ok(game_match)
    }

    /// Refuses to arm anything for a match that is not active.
    fn arm_turn_timers(&self, game_match: &Match) -> Result<(), MatchSessionServiceError> {
        if game_match.status != MatchStatus::Active {
            return Err(MatchSessionServiceError::InvalidTransition(format!(
                "cannot arm turn timers for {:?} match {}",
                game_match.status, game_match.match_id
            )));
        }

        for participant_id in game_match.pending_participants() {
            let service = self.clone();
            let match_id = game_match.match_id.clone();
            let expiring_id = participant_id.clone();
            self.timers.arm(
                &game_match.match_id,
                &participant_id,
                self.turn_timer,
                async move {
                    service.on_turn_expired(&match_id, &expiring_id).await;
                },
            );
        }
        Ok(())
    }

    async fn on_turn_expired(&self, match_id: &str, participant_id: &str) {
        match self.expire(match_id, participant_id).await {
            Ok(_) => debug!(
                "Turn timer resolved match {} against {}",
                match_id, participant_id
            ),
            Err(e) if e.is_ignorable() => debug!(
                "Ignoring turn timer for {} in match {}: {}",
                participant_id, match_id, e
            ),
            Err(e) => error!(
                "Turn timer for {} in match {} failed: {}",
                participant_id, match_id, e
            ),
        }
    }

    async fn player_joined_event(&self, game_match: &Match, participant_id: &str) -> ServerEvent {
        let opponent_username = match game_match.opponent_of(participant_id) {
            Some(opponent_id) => self.username_of(opponent_id).await,
            None => UNKNOWN_USERNAME.to_string(),
        };
        ServerEvent::PlayerJoined {
            participant_id: participant_id.to_string(),
            username: self.username_of(participant_id).await,
            opponent_username,
            active: game_match.status == MatchStatus::Active,
            timer_seconds: self.seconds_left(&game_match.match_id),
        }
    }

    /// Whole seconds left on the match's running turn timers, rounded up.
    /// Falls back to the full turn when none is armed.
    fn seconds_left(&self, match_id: &str) -> u64 {
        let left = self.timers.remaining(match_id).unwrap_or(self.turn_timer);
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    }

    async fn result_event(&self, game_match: &Match, move_a: Move, move_b: Move) -> ServerEvent {
        let forfeited = move_a.is_forfeit() || move_b.is_forfeit();
        match &game_match.winner_id {
            Some(winner_id) if forfeited => {
                let loser_id = game_match
                    .opponent_of(winner_id)
                    .unwrap_or_default()
                    .to_string();
                ServerEvent::GameTimeout {
                    winner_username: self.username_of(winner_id).await,
                    loser_username: self.username_of(&loser_id).await,
                    winner_id: winner_id.clone(),
                    loser_id,
                    delta_a: game_match.delta_a,
                    delta_b: game_match.delta_b,
                }
            }
            _ => ServerEvent::GameResult {
                move_a,
                move_b,
                winner_id: game_match.winner_id.clone(),
                delta_a: game_match.delta_a,
                delta_b: game_match.delta_b,
            },
        }
    }

    async fn announce_rematch(&self, old_match: &Match, new_match: &Match) {
        let username_b = match &new_match.participant_b_id {
            Some(participant_b_id) => self.username_of(participant_b_id).await,
            None => UNKNOWN_USERNAME.to_string(),
        };
        self.gateway.broadcast(
            &old_match.room(),
            &ServerEvent::NewGameCreated {
                new_match_id: new_match.match_id.clone(),
                username_a: self.username_of(&new_match.participant_a_id).await,
                username_b,
            },
            None,
        );
    }

    async fn username_of(&self, participant_id: &str) -> String {
        match self.participants.get_participant(participant_id).await {
            Ok(participant) => participant.username,
            Err(e) => {
                warn!("Could not load username for {}: {}", participant_id, e);
                UNKNOWN_USERNAME.to_string()
            }
        }
    }
}
