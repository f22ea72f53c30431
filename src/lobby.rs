//! Lobby aggregation (C10, spec.md §4.10).
//!
//! Grounded on the teacher's `Table::current_players` (a bitmap
//! popcount over occupied seats); generalized from a `u8` bitmap to a
//! plain filter over `[Seat; 6]` since there is no account layout to pack
//! the occupancy count into.

use std::sync::RwLock;

use crate::constants::SEATS_PER_TABLE;
use crate::protocol::LobbyEntry;
use crate::table::{SeatStatus, Table};

pub struct LobbyView;

impl LobbyView {
    /// spec.md §4.10: `{id, name, seatsOccupied, maxSeats}` per table. A
    /// pure read over each table's read lock.
    pub fn snapshot(tables: &[RwLock<Table>]) -> Vec<LobbyEntry> {
        tables
            .iter()
            .map(|t| {
                let table = t.read().unwrap();
                LobbyEntry {
                    id: table.id,
                    name: table.name.clone(),
                    seats_occupied: table.seats.iter().filter(|s| s.status != SeatStatus::Empty).count() as u8,
                    max_seats: SEATS_PER_TABLE,
                }
            })
            .collect()
    }
}
