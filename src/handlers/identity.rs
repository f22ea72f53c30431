//! `set_name` / reconnect (spec.md §4.9 first two rows).
//!
//! No direct teacher counterpart — the chain authenticates a signer for
//! free — so this is grounded on spec.md's own description, shaped the
//! way the teacher shapes every handler: validate, mutate the owning
//! store, reply to the caller, broadcast what changed.

use serde_json::Value;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ServerError;
use crate::hub::ClientHandle;
use crate::lobby::LobbyView;
use crate::protocol::{OutboundEnvelope, SessionCreated, SessionRestored, SetNamePayload};

/// `set_name{name}`: create a session, register `sender` with the hub
/// under the new token, reply `session_created`, push `lobby_state`. Also
/// used as the first-contact handshake for a connection that didn't
/// present a token at connect time.
pub fn set_name(state: &AppState, connection_token: &mut Option<Uuid>, payload: Value, sender: ClientHandle) -> Result<(), ServerError> {
    let payload: SetNamePayload = serde_json::from_value(payload).map_err(|_| ServerError::InvalidJson)?;
    let session = state.sessions.create_session(&payload.name)?;
    state.hub.register(session.token, sender);
    *connection_token = Some(session.token);

    state.hub.send_to(
        session.token,
        OutboundEnvelope::new(
            "session_created",
            SessionCreated {
                token: session.token,
                name: session.name,
            },
        ),
    );
    push_lobby_state(state, session.token);
    Ok(())
}

/// Reconnect with a previously-issued token: restore identity, seat, and
/// table (spec.md §4.7); an unknown token is rejected so the client clears
/// its stored copy.
pub fn reconnect(state: &AppState, connection_token: &mut Option<Uuid>, token: Uuid, sender: ClientHandle) -> Result<(), ServerError> {
    let session = state.sessions.get_session(token).ok_or(ServerError::InvalidToken)?;
    state.hub.register(token, sender);
    state.hub.set_table(token, session.table_id);
    *connection_token = Some(token);

    state.hub.send_to(
        token,
        OutboundEnvelope::new(
            "session_restored",
            SessionRestored {
                name: session.name,
                table_id: session.table_id,
                seat_index: session.seat_index,
            },
        ),
    );
    push_lobby_state(state, token);
    if let Some(table_id) = session.table_id {
        crate::handlers::seating::push_table_state(state, table_id, token);
    }
    Ok(())
}

fn push_lobby_state(state: &AppState, token: Uuid) {
    let snapshot = LobbyView::snapshot(&state.tables);
    state.hub.send_to(token, OutboundEnvelope::new("lobby_state", snapshot));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn set_name_creates_session_and_establishes_connection_token() {
        let state = AppState::new();
        let mut connection_token = None;

        let payload = serde_json::json!({"name": "Alice"});
        let (tx, mut rx) = unbounded_channel();
        set_name(&state, &mut connection_token, payload, ClientHandle::new(tx)).unwrap();

        let token = connection_token.expect("set_name establishes the connection token");
        let session = state.sessions.get_session(token).unwrap();
        assert_eq!(session.name, "Alice");
        assert_eq!(rx.try_recv().unwrap().kind, "session_created");
        assert_eq!(rx.try_recv().unwrap().kind, "lobby_state");
    }

    #[test]
    fn invalid_name_is_rejected() {
        let state = AppState::new();
        let mut connection_token = None;
        let payload = serde_json::json!({"name": "!!!"});
        let (tx, _rx) = unbounded_channel();
        assert!(matches!(set_name(&state, &mut connection_token, payload, ClientHandle::new(tx)), Err(ServerError::InvalidName)));
    }

    #[test]
    fn reconnect_with_unknown_token_is_invalid_token() {
        let state = AppState::new();
        let mut connection_token = None;
        let (tx, _rx) = unbounded_channel();
        let result = reconnect(&state, &mut connection_token, Uuid::new_v4(), ClientHandle::new(tx));
        assert!(matches!(result, Err(ServerError::InvalidToken)));
    }

    #[test]
    fn reconnect_with_valid_token_restores_session() {
        let state = AppState::new();
        let session = state.sessions.create_session("Bob").unwrap();
        let mut connection_token = None;
        let (tx, mut rx) = unbounded_channel();

        reconnect(&state, &mut connection_token, session.token, ClientHandle::new(tx)).unwrap();
        assert_eq!(connection_token, Some(session.token));
        let first = rx.try_recv().unwrap();
        assert_eq!(first.kind, "session_restored");
    }
}
