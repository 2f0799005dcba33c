use std::sync::Arc;

use tracing::info;

use shared::config::SessionConfig;
use shared::models::participant::Participant;
use shared::repositories::errors::participant_repository_errors::ParticipantRepositoryError;
use shared::repositories::match_repository::{InMemoryMatchRepository, MatchRepository};
use shared::repositories::participant_repository::{
    InMemoryParticipantRepository, ParticipantRepository,
};
use shared::services::auth_service::AuthService;
use shared::services::match_session_service::MatchSessionService;
use shared::services::matchmaking_service::MatchmakingService;
use shared::services::session_gateway::InMemorySessionGateway;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub participants: Arc<dyn ParticipantRepository>,
    pub gateway: Arc<InMemorySessionGateway>,
    pub sessions: MatchSessionService,
    pub matchmaking: MatchmakingService,
}

impl AppState {
    pub fn new(jwt_secret: &str, session_config: &SessionConfig) -> Self {
        let matches: Arc<dyn MatchRepository> = Arc::new(InMemoryMatchRepository::new());
        let participants: Arc<dyn ParticipantRepository> =
            Arc::new(InMemoryParticipantRepository::new());
        let gateway = Arc::new(InMemorySessionGateway::new());

        let sessions = MatchSessionService::new(
            matches.clone(),
            participants.clone(),
            gateway.clone(),
            session_config,
        );
        let matchmaking = MatchmakingService::new(matches, sessions.clone());

        AppState {
            auth_service: Arc::new(AuthService::new(jwt_secret)),
            participants,
            gateway,
            sessions,
            matchmaking,
        }
    }

    /// Loads the participant behind a verified token, registering it on first sight.
    pub async fn ensure_participant(
        &self,
        participant_id: &str,
        username: &str,
    ) -> Result<Participant, ParticipantRepositoryError> {
        match self.participants.get_participant(participant_id).await {
            Err(ParticipantRepositoryError::NotFound) => {
                let participant = Participant::new(participant_id, username);
                match self.participants.create_participant(&participant).await {
                    Ok(()) => {
                        info!("Registered participant {} ({})", participant_id, username);
                        Ok(participant)
                    }
                    Err(ParticipantRepositoryError::AlreadyExists) => {
                        self.participants.get_participant(participant_id).await
                    }
                    Err(e) => Err(e),
                }
            }
            other => other,
        }
    }
}
