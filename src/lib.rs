//! Authoritative server core for a real-time 6-max No-Limit Texas Hold'em
//! table (spec.md §1-§2).
//!
//! The teacher (`hiddenhand`) is an Anchor on-chain program: state lives in
//! accounts, instructions are dispatched by the runtime, and "broadcast" is
//! whatever an indexer does with `#[event]` logs. This crate keeps the same
//! leaves-first decomposition (card/deck, evaluator, side pots, hand
//! state, table, session, connection fan-out, routing, handlers, lobby)
//! but swaps the on-chain substrate for an in-process, lock-based server:
//! `Table`/`SessionManager` each own a `std::sync::RwLock` (spec.md §5)
//! instead of being PDAs the runtime serialises access to.

pub mod app;
pub mod card;
pub mod constants;
pub mod error;
pub mod eval;
pub mod hand;
pub mod handlers;
pub mod hub;
pub mod lobby;
pub mod protocol;
pub mod router;
pub mod seat_ring;
pub mod session;
pub mod side_pots;
pub mod table;

pub use app::AppState;
pub use error::ServerError;
