//! Error taxonomy (spec.md §7, C11).
//!
//! The teacher enumerates failures as an Anchor `#[error_code]` enum with
//! one `#[msg(...)]` per variant, surfaced to the caller as a transaction
//! error. This core has no transaction to abort — failures are reported to
//! the originating client as `error{code, message}` and never mutate
//! state — so the same one-variant-per-failure shape is kept but
//! translated to `thiserror`, with a stable wire `code()` replacing the
//! teacher's Anchor error code.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServerError {
    // Protocol
    #[error("malformed message envelope")]
    InvalidJson,
    #[error("unrecognized message type")]
    UnknownType,

    // Identity
    #[error("unknown or expired session token")]
    InvalidToken,
    #[error("name must be 1-20 characters of letters, digits, space, dash or underscore")]
    InvalidName,

    // Seating
    #[error("already seated at a table")]
    AlreadySeated,
    #[error("no such table")]
    InvalidTable,
    #[error("table is full")]
    TableFull,
    #[error("not seated at a table")]
    NotSeated,

    // Action
    #[error("it is not your turn to act")]
    NotYourTurn,
    #[error("that action is not currently valid")]
    InvalidAction,
    #[error("amount is out of the legal range")]
    AmountOutOfRange,
    #[error("no hand is currently in progress")]
    HandNotActive,

    // Lifecycle
    #[error("at least two players are required to start a hand")]
    InsufficientPlayers,
    #[error("a hand is already in progress")]
    HandInProgress,
    #[error("failed to draw secure randomness for the shuffle")]
    ShuffleFailed,
}

impl ServerError {
    /// The stable wire code sent in `error{code, message}` (spec.md §7).
    pub fn code(&self) -> &'static str {
        match self {
            ServerError::InvalidJson => "invalid_json",
            ServerError::UnknownType => "unknown_type",
            ServerError::InvalidToken => "invalid_token",
            ServerError::InvalidName => "invalid_name",
            ServerError::AlreadySeated => "already_seated",
            ServerError::InvalidTable => "invalid_table",
            ServerError::TableFull => "table_full",
            ServerError::NotSeated => "not_seated",
            ServerError::NotYourTurn => "not_your_turn",
            ServerError::InvalidAction => "invalid_action",
            ServerError::AmountOutOfRange => "amount_out_of_range",
            ServerError::HandNotActive => "hand_not_active",
            ServerError::InsufficientPlayers => "insufficient_players",
            ServerError::HandInProgress => "hand_in_progress",
            ServerError::ShuffleFailed => "shuffle_failed",
        }
    }
}
