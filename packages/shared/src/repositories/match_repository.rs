use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::models::game_match::{Match, MatchStatus};
use crate::repositories::errors::match_repository_errors::MatchRepositoryError;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn create_match(&self, game_match: &Match) -> Result<(), MatchRepositoryError>;

    async fn get_match(&self, match_id: &str) -> Result<Option<Match>, MatchRepositoryError>;

    /// Replaces an existing record. Fails with `NotFound` if the id was never created.
    async fn update_match(&self, game_match: &Match) -> Result<(), MatchRepositoryError>;

    /// Waiting quickplay matches with an open seat, oldest first, skipping
    /// those opened by `excluded_participant_id`.
    async fn find_waiting_quickplay_matches(
        &self,
        excluded_participant_id: &str,
    ) -> Result<Vec<Match>, MatchRepositoryError>;

    /// Every match the participant holds a seat in, oldest first.
    async fn list_matches_for_participant(
        &self,
        participant_id: &str,
    ) -> Result<Vec<Match>, MatchRepositoryError>;
}

#[derive(Default)]
struct MatchTable {
    records: HashMap<String, Match>,
    by_participant: HashMap<String, Vec<String>>,
}

impl MatchTable {
    fn index(&mut self, participant_id: &str, match_id: &str) {
        let ids = self
            .by_participant
            .entry(participant_id.to_string())
            .or_default();
        if !ids.iter().any(|id| id == match_id) {
            ids.push(match_id.to_string());
        }
    }

    fn index_seats(&mut self, game_match: &Match) {
        self.index(&game_match.participant_a_id, &game_match.match_id);
        if let Some(participant_b_id) = &game_match.participant_b_id {
            self.index(participant_b_id, &game_match.match_id);
        }
    }
}

/// Process-local match store. Records are never removed.
#[derive(Default)]
pub struct InMemoryMatchRepository {
    table: RwLock<MatchTable>,
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MatchTable>, MatchRepositoryError> {
        self.table
            .read()
            .map_err(|e| MatchRepositoryError::Unavailable(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MatchTable>, MatchRepositoryError> {
        self.table
            .write()
            .map_err(|e| MatchRepositoryError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchRepository {
    async fn create_match(&self, game_match: &Match) -> Result<(), MatchRepositoryError> {
        let mut table = self.write()?;
        if table.records.contains_key(&game_match.match_id) {
            return Err(MatchRepositoryError::AlreadyExists);
        }
        table.index_seats(game_match);
        table
            .records
            .insert(game_match.match_id.clone(), game_match.clone());
        Ok(())
    }

    async fn get_match(&self, match_id: &str) -> Result<Option<Match>, MatchRepositoryError> {
        Ok(self.read()?.records.get(match_id).cloned())
    }

    async fn update_match(&self, game_match: &Match) -> Result<(), MatchRepositoryError> {
        let mut table = self.write()?;
        if !table.records.contains_key(&game_match.match_id) {
            return Err(MatchRepositoryError::NotFound);
        }
        table.index_seats(game_match);
        table
            .records
            .insert(game_match.match_id.clone(), game_match.clone());
        Ok(())
    }

    async fn find_waiting_quickplay_matches(
        &self,
        excluded_participant_id: &str,
    ) -> Result<Vec<Match>, MatchRepositoryError> {
        let table = self.read()?;
        let mut waiting: Vec<Match> = table
            .records
            .values()
            .filter(|m| m.status == MatchStatus::Waiting)
            .filter(|m| m.quickplay)
            .filter(|m| m.participant_b_id.is_none())
            .filter(|m| m.participant_a_id != excluded_participant_id)
            .cloned()
            .collect();
        waiting.sort_by_key(|m| m.created_at);
        Ok(waiting)
    }

    async fn list_matches_for_participant(
        &self,
        participant_id: &str,
    ) -> Result<Vec<Match>, MatchRepositoryError> {
        let table = self.read()?;
        let mut matches: Vec<Match> = table
            .by_participant
            .get(participant_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| table.records.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        matches.sort_by_key(|m| m.created_at);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waiting_match(participant_a_id: &str, minutes_ago: i64) -> Match {
        let mut game_match = Match::new(participant_a_id, true);
        game_match.created_at = chrono::Utc::now() - chrono::Duration::minutes(minutes_ago);
        game_match
    }

    #[tokio::test]
    async fn test_create_and_get_match() {
        let repository = InMemoryMatchRepository::new();
        let game_match = Match::new("player-a", true);

        repository.create_match(&game_match).await.unwrap();
        let stored = repository.get_match(&game_match.match_id).await.unwrap();

        assert_eq!(stored, Some(game_match));
    }

    #[tokio::test]
    async fn test_get_missing_match() {
        let repository = InMemoryMatchRepository::new();

        assert_eq!(repository.get_match("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_duplicate_match_fails() {
        let repository = InMemoryMatchRepository::new();
        let game_match = Match::new("player-a", true);

        repository.create_match(&game_match).await.unwrap();
        let result = repository.create_match(&game_match).await;

        assert_eq!(result, Err(MatchRepositoryError::AlreadyExists));
    }

    #[tokio::test]
    async fn test_update_requires_existing_record() {
        let repository = InMemoryMatchRepository::new();
        let game_match = Match::new("player-a", true);

        let result = repository.update_match(&game_match).await;

        assert_eq!(result, Err(MatchRepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_find_waiting_quickplay_matches_oldest_first() {
        let repository = InMemoryMatchRepository::new();
        let newest = waiting_match("player-c", 1);
        let oldest = waiting_match("player-a", 10);
        let middle = waiting_match("player-b", 5);
        for game_match in [&newest, &oldest, &middle] {
            repository.create_match(game_match).await.unwrap();
        }

        let waiting = repository
            .find_waiting_quickplay_matches("someone-else")
            .await
            .unwrap();

        let owners: Vec<&str> = waiting.iter().map(|m| m.participant_a_id.as_str()).collect();
        assert_eq!(owners, vec!["player-a", "player-b", "player-c"]);
    }

    #[tokio::test]
    async fn test_find_waiting_quickplay_matches_filters() {
        let repository = InMemoryMatchRepository::new();
        let own = waiting_match("player-a", 3);
        let invitation = Match::new("player-b", false);
        let mut active = waiting_match("player-c", 2);
        active.participant_b_id = Some("player-d".to_string());
        active.status = MatchStatus::Active;
        let mut cancelled = waiting_match("player-e", 4);
        cancelled.status = MatchStatus::Cancelled;
        let open = waiting_match("player-f", 1);
        for game_match in [&own, &invitation, &active, &cancelled, &open] {
            repository.create_match(game_match).await.unwrap();
        }

        let waiting = repository
            .find_waiting_quickplay_matches("player-a")
            .await
            .unwrap();

        assert_eq!(waiting.len(), 1);
        assert_eq!(waiting[0].match_id, open.match_id);
    }

    #[tokio::test]
    async fn test_participant_index_follows_updates() {
        let repository = InMemoryMatchRepository::new();
        let mut game_match = Match::new("player-a", true);
        repository.create_match(&game_match).await.unwrap();

        assert!(repository
            .list_matches_for_participant("player-b")
            .await
            .unwrap()
            .is_empty());

        game_match.participant_b_id = Some("player-b".to_string());
        game_match.status = MatchStatus::Active;
        repository.update_match(&game_match).await.unwrap();

        let for_b = repository
            .list_matches_for_participant("player-b")
            .await
            .unwrap();
        let for_a = repository
            .list_matches_for_participant("player-a")
            .await
            .unwrap();

        assert_eq!(for_b.len(), 1);
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_b[0].status, MatchStatus::Active);
    }
}
