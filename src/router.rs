//! Envelope parsing and type-based dispatch (C8, spec.md §4.8).
//!
//! Grounded on the teacher's instruction dispatch: Anchor's generated
//! entrypoint matches an 8-byte discriminator to one `instructions::*`
//! handler and returns `Err` on no match. This router plays the same role
//! for a JSON envelope instead of an Anchor discriminator: parse, match
//! `type` against the handler table, and — unlike an aborted transaction —
//! report failure back to the one client without touching the connection,
//! since there is no shared ledger state to roll back (spec.md §4.8:
//! unknown types and malformed JSON never close the connection).

use uuid::Uuid;

use crate::app::AppState;
use crate::error::ServerError;
use crate::handlers;
use crate::hub::ClientHandle;
use crate::protocol::{ErrorPayload, InboundEnvelope, OutboundEnvelope};

/// Parses one inbound frame and dispatches it to the matching handler.
/// `connection_token` is `None` until the connection has authenticated via
/// `set_name` or a valid reconnect token. `sender` is this connection's
/// writer-task handle, registered with the hub under whichever token
/// `set_name` mints (reconnect registers it directly, before dispatch is
/// ever reached).
pub struct MessageRouter<'a> {
    pub state: &'a AppState,
    sender: ClientHandle,
}

impl<'a> MessageRouter<'a> {
    pub fn new(state: &'a AppState, sender: ClientHandle) -> Self {
        MessageRouter { state, sender }
    }

    /// Parses `raw` as `{type, payload}` and dispatches. Errors are sent to
    /// `recipient` (if known) as `error{code, message}`; the connection
    /// stays open regardless (spec.md §4.8).
    pub fn dispatch(&self, raw: &str, connection_token: &mut Option<Uuid>) {
        let envelope: InboundEnvelope = match serde_json::from_str(raw) {
            Ok(e) => e,
            Err(_) => {
                self.reply_error(*connection_token, ServerError::InvalidJson);
                return;
            }
        };

        let result = match envelope.kind.as_str() {
            "set_name" => handlers::identity::set_name(self.state, connection_token, envelope.payload, self.sender.clone()),
            "join_table" => handlers::seating::join_table(self.state, *connection_token, envelope.payload),
            "leave_table" => handlers::seating::leave_table(self.state, *connection_token),
            "start_hand" => handlers::hand_flow::start_hand(self.state, *connection_token),
            "player_action" => handlers::hand_flow::player_action(self.state, *connection_token, envelope.payload),
            _ => Err(ServerError::UnknownType),
        };

        if let Err(err) = result {
            self.reply_error(*connection_token, err);
        }
    }

    fn reply_error(&self, token: Option<Uuid>, err: ServerError) {
        let envelope = OutboundEnvelope::new(
            "error",
            ErrorPayload {
                code: err.code(),
                message: err.to_string(),
            },
        );
        match token {
            Some(token) => self.state.hub.send_to(token, envelope),
            None => tracing::debug!(code = err.code(), "dropping error for unauthenticated connection"),
        }
    }
}
