use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use crate::state::AppState;
use shared::models::auth::TokenClaims;
use shared::models::connection::ConnectionSession;
use shared::models::events::ServerEvent;
use shared::repositories::errors::participant_repository_errors::ParticipantRepositoryError;

/// Registers a verified connection with the gateway and returns its session
/// together with the queue of events to push to the socket.
pub async fn handle_connect(
    state: &AppState,
    connection_id: &str,
    claims: &TokenClaims,
) -> Result<(ConnectionSession, UnboundedReceiver<ServerEvent>), ParticipantRepositoryError> {
    let participant = state
        .ensure_participant(&claims.sub, &claims.username)
        .await?;
    let outbound = state.gateway.connect(connection_id, &participant.id);

    info!(
        "Participant {} connected as {}",
        participant.id, connection_id
    );
    Ok((
        ConnectionSession::new(connection_id, &participant.id, &participant.username),
        outbound,
    ))
}
