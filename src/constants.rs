//! Fixed game constants (spec.md §6).
//!
//! Unlike the teacher's on-chain `constants.rs`, which carries PDA seeds
//! alongside the game numbers, this core has no accounts to derive —
//! only the table shape and blind/stack amounts survive the transform.

/// Seats per table.
pub const SEATS_PER_TABLE: u8 = 6;

/// Minimum active players required to start a hand.
pub const MIN_PLAYERS: u8 = 2;

/// Small blind amount.
pub const SMALL_BLIND: u64 = 10;

/// Big blind amount.
pub const BIG_BLIND: u64 = 20;

/// Chip stack assigned to a seat on join.
pub const STARTING_STACK: u64 = 1000;

/// Names of the four tables preseeded at startup.
pub const PRESEEDED_TABLE_NAMES: [&str; 4] = ["Table 1", "Table 2", "Table 3", "Table 4"];
