//! Registry of connected clients and per-table fan-out (C7, spec.md §4.8,
//! §9's "compose shared base, fold in per-recipient overlay" note).
//!
//! The teacher has no connection registry of its own — every "client" is a
//! transaction signer the chain already knows how to reach. This module is
//! new plumbing, grounded on the client-handle-keyed-by-identity pattern
//! used by `chaorderss-pokers`' websocket server and `mentalcardgames-mcg`'s
//! per-connection writer task: one registry, keyed by session token, of a
//! channel sender into each connection's writer loop (`src/bin/server.rs`
//! owns the actual socket and drains the channel). `Table` never touches
//! the transport; handlers call `ClientHub::broadcast`/`send_to` with the
//! events a table mutation produced.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::protocol::OutboundEnvelope;

/// The write half of one connection, handed to the registry by the
/// connection's accept loop in `src/bin/server.rs`.
#[derive(Clone)]
pub struct ClientHandle {
    sender: UnboundedSender<OutboundEnvelope>,
}

impl ClientHandle {
    pub fn new(sender: UnboundedSender<OutboundEnvelope>) -> Self {
        ClientHandle { sender }
    }

    /// Best-effort send; a closed channel means the connection's writer
    /// task has already torn down, which is not this hub's problem to
    /// report (spec.md §5: transport send failures are logged and skipped
    /// per recipient).
    fn send(&self, envelope: OutboundEnvelope) -> bool {
        self.sender.send(envelope).is_ok()
    }
}

/// Registry of live connections keyed by session token (spec.md §4.8).
pub struct ClientHub {
    clients: RwLock<HashMap<Uuid, ClientHandle>>,
    /// token -> table currently seated at, maintained alongside
    /// `SessionManager` so `get_clients_at_table` doesn't need to lock the
    /// session store too.
    table_of: RwLock<HashMap<Uuid, Uuid>>,
}

impl ClientHub {
    pub fn new() -> Self {
        ClientHub {
            clients: RwLock::new(HashMap::new()),
            table_of: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, token: Uuid, handle: ClientHandle) {
        self.clients.write().unwrap().insert(token, handle);
    }

    pub fn unregister(&self, token: Uuid) {
        self.clients.write().unwrap().remove(&token);
        self.table_of.write().unwrap().remove(&token);
    }

    pub fn set_table(&self, token: Uuid, table_id: Option<Uuid>) {
        let mut table_of = self.table_of.write().unwrap();
        match table_id {
            Some(id) => {
                table_of.insert(token, id);
            }
            None => {
                table_of.remove(&token);
            }
        }
    }

    /// spec.md §4.8 `getClientsAtTable`. Snapshots the matching tokens
    /// under the lock and releases before any send (spec.md §5).
    pub fn tokens_at_table(&self, table_id: Uuid) -> HashSet<Uuid> {
        self.table_of
            .read()
            .unwrap()
            .iter()
            .filter(|&(_, &t)| t == table_id)
            .map(|(&token, _)| token)
            .collect()
    }

    /// Every currently-registered token, used for lobby-wide broadcasts
    /// that reach clients regardless of which table (if any) they sit at.
    pub fn all_tokens(&self) -> Vec<Uuid> {
        self.clients.read().unwrap().keys().copied().collect()
    }

    pub fn send_to(&self, token: Uuid, envelope: OutboundEnvelope) {
        let handle = self.clients.read().unwrap().get(&token).cloned();
        if let Some(handle) = handle {
            if !handle.send(envelope) {
                tracing::warn!(%token, "outbound send failed, connection likely closed");
            }
        }
    }

    /// Sends the same envelope to every client currently at `table_id`.
    pub fn broadcast(&self, table_id: Uuid, envelope: OutboundEnvelope) {
        for token in self.tokens_at_table(table_id) {
            self.send_to(token, envelope.clone());
        }
    }

    /// Broadcasts a shared base to every client at `table_id`, folding in a
    /// per-recipient overlay computed by `overlay` (spec.md §9: compose
    /// shared, then fold in the per-recipient overlay, rather than build
    /// one payload per seat from scratch).
    pub fn broadcast_personalized<T: Clone + serde::Serialize>(&self, table_id: Uuid, kind: &'static str, base: T, overlay: impl Fn(Uuid, &mut T)) {
        for token in self.tokens_at_table(table_id) {
            let mut payload = base.clone();
            overlay(token, &mut payload);
            self.send_to(token, OutboundEnvelope::new(kind, payload));
        }
    }
}

impl Default for ClientHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use tokio::sync::mpsc::unbounded_channel;

    #[derive(Clone, Serialize)]
    struct Ping {
        n: u32,
    }

    #[test]
    fn register_and_send_to_reaches_the_right_client() {
        let hub = ClientHub::new();
        let (tx, mut rx) = unbounded_channel();
        let token = Uuid::new_v4();
        hub.register(token, ClientHandle::new(tx));

        hub.send_to(token, OutboundEnvelope::new("ping", Ping { n: 1 }));
        let received = rx.try_recv().unwrap();
        assert_eq!(received.kind, "ping");
    }

    #[test]
    fn broadcast_only_reaches_tokens_at_the_table() {
        let hub = ClientHub::new();
        let (tx_a, mut rx_a) = unbounded_channel();
        let (tx_b, mut rx_b) = unbounded_channel();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        hub.register(a, ClientHandle::new(tx_a));
        hub.register(b, ClientHandle::new(tx_b));

        let table = Uuid::new_v4();
        hub.set_table(a, Some(table));

        hub.broadcast(table, OutboundEnvelope::new("lobby_state", Ping { n: 7 }));
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn unregister_clears_both_maps() {
        let hub = ClientHub::new();
        let (tx, _rx) = unbounded_channel();
        let token = Uuid::new_v4();
        let table = Uuid::new_v4();
        hub.register(token, ClientHandle::new(tx));
        hub.set_table(token, Some(table));

        hub.unregister(token);
        assert!(hub.tokens_at_table(table).is_empty());
    }
}
