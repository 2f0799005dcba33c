use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::models::participant::Participant;
use crate::repositories::errors::participant_repository_errors::ParticipantRepositoryError;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    async fn create_participant(
        &self,
        participant: &Participant,
    ) -> Result<(), ParticipantRepositoryError>;

    async fn get_participant(
        &self,
        participant_id: &str,
    ) -> Result<Participant, ParticipantRepositoryError>;

    async fn update_participant(
        &self,
        participant: &Participant,
    ) -> Result<(), ParticipantRepositoryError>;
}

#[derive(Default)]
pub struct InMemoryParticipantRepository {
    participants: RwLock<HashMap<String, Participant>>,
}

impl InMemoryParticipantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParticipantRepository for InMemoryParticipantRepository {
    async fn create_participant(
        &self,
        participant: &Participant,
    ) -> Result<(), ParticipantRepositoryError> {
        let mut participants = self
            .participants
            .write()
            .map_err(|e| ParticipantRepositoryError::Unavailable(e.to_string()))?;
        if participants.contains_key(&participant.id) {
            return Err(ParticipantRepositoryError::AlreadyExists);
        }
        participants.insert(participant.id.clone(), participant.clone());
        Ok(())
    }

    async fn get_participant(
        &self,
        participant_id: &str,
    ) -> Result<Participant, ParticipantRepositoryError> {
        self.participants
            .read()
            .map_err(|e| ParticipantRepositoryError::Unavailable(e.to_string()))?
            .get(participant_id)
            .cloned()
            .ok_or(ParticipantRepositoryError::NotFound)
    }

    async fn update_participant(
        &self,
        participant: &Participant,
    ) -> Result<(), ParticipantRepositoryError> {
        let mut participants = self
            .participants
            .write()
            .map_err(|e| ParticipantRepositoryError::Unavailable(e.to_string()))?;
        match participants.get_mut(&participant.id) {
            Some(existing) => {
                *existing = participant.clone();
                Ok(())
            }
            None => Err(ParticipantRepositoryError::NotFound),
        }
    }
}
