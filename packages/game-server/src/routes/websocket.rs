use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{actions, error::ApiError, state::AppState};
use shared::models::auth::TokenClaims;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(websocket_handler))
}

async fn websocket_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let token = query.token.ok_or(ApiError::Unauthorized)?;
    let claims = state.auth_service.verify_token(&token)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(state, claims, socket)))
}

async fn handle_socket(state: AppState, claims: TokenClaims, socket: WebSocket) {
    let connection_id = Uuid::new_v4().to_string();
    let (mut session, mut outbound) =
        match actions::connect::handle_connect(&state, &connection_id, &claims).await {
            Ok(connected) => connected,
            Err(e) => {
                error!("Failed to register connection for {}: {}", claims.sub, e);
                return;
            }
        };

    let (mut ws_tx, mut ws_rx) = socket.split();

    let forward = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize {}: {}", event.name(), e);
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = ws_rx.next().await {
        match message {
            Message::Text(text) => {
                actions::handle_message(&state, &mut session, text.as_str()).await;
            }
            Message::Close(_) => break,
            _ => debug!("Ignoring non-text frame from {}", connection_id),
        }
    }

    actions::disconnect::handle_disconnect(&state, &session).await;
    forward.abort();
    info!("Connection {} closed", connection_id);
}
