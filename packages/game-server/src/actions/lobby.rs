use crate::state::AppState;
use shared::models::connection::{ConnectionSession, Room, LOBBY_ROOM};
use shared::models::events::ServerEvent;
use shared::services::session_gateway::SessionGateway;

pub fn handle_join_lobby(state: &AppState, session: &mut ConnectionSession) {
    if session.room == Room::Lobby {
        return;
    }
    leave_current_room(state, session);

    state.gateway.join_room(&session.connection_id, LOBBY_ROOM);
    session.room = Room::Lobby;
    state.gateway.broadcast(
        LOBBY_ROOM,
        &ServerEvent::UserJoinedLobby {
            participant_id: session.participant_id.clone(),
            username: session.username.clone(),
        },
        Some(&session.connection_id),
    );
}

pub fn handle_leave_lobby(state: &AppState, session: &mut ConnectionSession) {
    if session.room != Room::Lobby {
        return;
    }
    state.gateway.leave_room(&session.connection_id, LOBBY_ROOM);
    session.room = Room::None;
    state.gateway.broadcast(
        LOBBY_ROOM,
        &ServerEvent::UserLeftLobby {
            participant_id: session.participant_id.clone(),
            username: session.username.clone(),
        },
        None,
    );
}

/// Moves the connection out of whatever room it is in.
pub fn leave_current_room(state: &AppState, session: &mut ConnectionSession) {
    match session.room.clone() {
        Room::Lobby => handle_leave_lobby(state, session),
        Room::Match(_) => {
            if let Some(room_id) = session.room.room_id() {
                state.gateway.leave_room(&session.connection_id, &room_id);
            }
            session.room = Room::None;
        }
        Room::None => {}
    }
}
