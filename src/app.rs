//! Process-wide shared state: the table list, session store, and client
//! hub (spec.md §5, §9's "pass as explicit dependencies" note).
//!
//! The teacher has no equivalent — the chain itself is the shared state.
//! Here `AppState` is the thing every handler is given a reference to; it
//! owns the per-table `RwLock`s spec.md §5 calls for (one lock per table,
//! not one global lock), plus the `SessionManager` and `ClientHub`, which
//! spec.md §9 explicitly says should be passed in rather than reached for
//! as ambient globals.

use std::sync::RwLock;

use uuid::Uuid;

use crate::constants::PRESEEDED_TABLE_NAMES;
use crate::hub::ClientHub;
use crate::session::SessionManager;
use crate::table::Table;

pub struct AppState {
    pub tables: Vec<RwLock<Table>>,
    pub sessions: SessionManager,
    pub hub: ClientHub,
}

impl AppState {
    /// Boots with the four preseeded tables named "Table 1".."Table 4"
    /// (spec.md §6).
    pub fn new() -> Self {
        let tables = PRESEEDED_TABLE_NAMES.iter().map(|&name| RwLock::new(Table::new(Uuid::new_v4(), name))).collect();
        AppState {
            tables,
            sessions: SessionManager::new(),
            hub: ClientHub::new(),
        }
    }

    pub fn find_table(&self, table_id: Uuid) -> Option<&RwLock<Table>> {
        self.tables.iter().find(|t| t.read().unwrap().id == table_id)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boots_with_four_preseeded_tables() {
        let state = AppState::new();
        assert_eq!(state.tables.len(), 4);
        let names: Vec<String> = state.tables.iter().map(|t| t.read().unwrap().name.clone()).collect();
        assert_eq!(names, vec!["Table 1", "Table 2", "Table 3", "Table 4"]);
    }

    #[test]
    fn find_table_looks_up_by_id() {
        let state = AppState::new();
        let id = state.tables[2].read().unwrap().id;
        assert!(state.find_table(id).is_some());
        assert!(state.find_table(Uuid::new_v4()).is_none());
    }
}
