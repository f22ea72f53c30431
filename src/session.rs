//! Session identity: durable tokens, name validation, table/seat binding
//! (C6, spec.md §3, §4.7).
//!
//! The teacher identifies a player by their wallet `Pubkey`, stored
//! directly on-chain as the owning key of a `PlayerSeat` PDA — identity is
//! free because the chain already authenticates the signer. This core has
//! no wallet to borrow, so a `Session` plays the same role as the teacher's
//! `PlayerSeat` ownership link (a stable identifier a reconnecting client
//! presents) but is minted locally as a `Uuid` the first time a client
//! picks a name, and mirrors seating the same way `PlayerSeat.player`
//! mirrors `Table::occupy_seat` (spec.md §4.7: a session's `table_id`/
//! `seat_index` fields mirror seating at all times).

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Instant;

use uuid::Uuid;

use crate::error::ServerError;

#[derive(Debug, Clone)]
pub struct Session {
    pub token: Uuid,
    pub name: String,
    pub table_id: Option<Uuid>,
    pub seat_index: Option<u8>,
    pub created_at: Instant,
}

/// In-memory, thread-safe session store (spec.md §4.7). One lock over one
/// map, matching the teacher's one-PDA-per-identity model collapsed to a
/// single registry since there is no chain to shard it across.
pub struct SessionManager {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionManager {
    pub fn new() -> Self {
        SessionManager {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// spec.md §4.7 `createSession`. Validates `name`, mints a fresh token.
    pub fn create_session(&self, name: &str) -> Result<Session, ServerError> {
        let name = validate_name(name)?;
        let session = Session {
            token: Uuid::new_v4(),
            name,
            table_id: None,
            seat_index: None,
            created_at: Instant::now(),
        };
        self.sessions.write().unwrap().insert(session.token, session.clone());
        Ok(session)
    }

    pub fn get_session(&self, token: Uuid) -> Option<Session> {
        self.sessions.read().unwrap().get(&token).cloned()
    }

    /// spec.md §4.7 `updateSession`. `table_id`/`seat_index` are each
    /// `Some(new value)` to set or `None` to clear; omit neither field by
    /// passing the option through unchanged when it shouldn't move.
    pub fn update_session(&self, token: Uuid, table_id: Option<Uuid>, seat_index: Option<u8>) -> Result<(), ServerError> {
        let mut sessions = self.sessions.write().unwrap();
        let session = sessions.get_mut(&token).ok_or(ServerError::InvalidToken)?;
        session.table_id = table_id;
        session.seat_index = seat_index;
        Ok(())
    }

    pub fn remove_session(&self, token: Uuid) {
        self.sessions.write().unwrap().remove(&token);
    }

    /// True if `token` already has a seat anywhere, used to enforce
    /// spec.md §3's "a token owns at most one seat across all tables".
    pub fn is_seated(&self, token: Uuid) -> bool {
        self.sessions
            .read()
            .unwrap()
            .get(&token)
            .map(|s| s.table_id.is_some())
            .unwrap_or(false)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// spec.md §4.7: 1..20 characters, alphanumeric plus space/dash/underscore,
/// leading/trailing whitespace trimmed.
pub fn validate_name(raw: &str) -> Result<String, ServerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 20 {
        return Err(ServerError::InvalidName);
    }
    let valid = trimmed.chars().all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '_');
    if !valid {
        return Err(ServerError::InvalidName);
    }
    Ok(trimmed.to_string())
}
