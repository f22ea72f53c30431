//! Wire envelope and message payloads (C8, spec.md §4.8-4.9, §6).
//!
//! The teacher has no wire protocol of its own — an Anchor instruction
//! call is the envelope, and `events.rs`'s `#[event]` structs are the
//! nearest thing to an outbound payload. This module plays that same
//! "what goes out over the line" role for a JSON/WebSocket transport:
//! `{"type": string, "payload": object}` in both directions, per spec.md
//! §6, with `serde`'s derives doing the encode/decode the teacher gets for
//! free from Anchor's IDL.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::card::Card;
use crate::hand::{ActionKind, Street};

/// An inbound `{"type": ..., "payload": ...}` envelope before its payload
/// has been matched against a concrete shape.
#[derive(Debug, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// An outbound envelope; `serde_json::to_string` of this is exactly the
/// wire frame sent to one client.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEnvelope {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub payload: serde_json::Value,
}

impl OutboundEnvelope {
    pub fn new(kind: &'static str, payload: impl Serialize) -> Self {
        OutboundEnvelope {
            kind,
            payload: serde_json::to_value(payload).expect("outbound payload is always serializable"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetNamePayload {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinTablePayload {
    pub table_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PlayerActionPayload {
    pub seat_index: u8,
    pub action: ActionKind,
    #[serde(default)]
    pub amount: Option<u64>,
}

impl Serialize for ActionKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for ActionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "fold" => Ok(ActionKind::Fold),
            "check" => Ok(ActionKind::Check),
            "call" => Ok(ActionKind::Call),
            "raise" => Ok(ActionKind::Raise),
            other => Err(serde::de::Error::custom(format!("unknown action kind: {other}"))),
        }
    }
}

impl Serialize for Street {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let name = match self {
            Street::Preflop => "preflop",
            Street::Flop => "flop",
            Street::Turn => "turn",
            Street::River => "river",
            Street::Complete => "complete",
        };
        serializer.serialize_str(name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HandStarted {
    pub dealer_seat: u8,
    pub small_blind_seat: u8,
    pub big_blind_seat: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlindPosted {
    pub seat_index: u8,
    pub amount: u64,
}

/// Personalised (spec.md §9): every recipient gets `your_cards` (empty
/// unless it's their own seat) plus `card_counts` shared by all.
#[derive(Debug, Clone, Serialize)]
pub struct CardsDealt {
    pub your_cards: Vec<Card>,
    pub card_counts: Vec<SeatCardCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatCardCount {
    pub seat_index: u8,
    pub card_count: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardDealt {
    pub board_cards: Vec<Card>,
    pub street: Street,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionRequest {
    pub seat_index: u8,
    pub valid_actions: Vec<ActionKind>,
    pub call_amount: u64,
    pub min_raise: u64,
    pub max_raise: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionResult {
    pub seat_index: u8,
    pub action: ActionKind,
    pub amount: u64,
    pub new_stack: u64,
    pub pot: u64,
    pub next_actor: Option<u8>,
    pub round_over: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShowdownResult {
    pub winner_seats: Vec<u8>,
    pub winning_hand_name: Option<&'static str>,
    pub pot_amount: u64,
    pub amounts_won: Vec<SeatAmount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatAmount {
    pub seat_index: u8,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HandComplete {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatView {
    pub seat_index: u8,
    pub owner_name: Option<String>,
    pub stack: u64,
    pub card_count: u8,
}

/// Personalised (spec.md §4.9): `hole_cards` is populated only for the
/// recipient's own seat, when seated in the current hand.
#[derive(Debug, Clone, Serialize)]
pub struct TableState {
    pub table_id: Uuid,
    pub name: String,
    pub seats: Vec<SeatView>,
    pub dealer_seat: Option<u8>,
    pub small_blind_seat: Option<u8>,
    pub big_blind_seat: Option<u8>,
    pub pot: u64,
    pub hand_in_progress: bool,
    pub street: Option<Street>,
    pub board_cards: Vec<Card>,
    pub hole_cards: Option<[Card; 2]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LobbyEntry {
    pub id: Uuid,
    pub name: String,
    pub seats_occupied: u8,
    pub max_seats: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionCreated {
    pub token: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionRestored {
    pub name: String,
    pub table_id: Option<Uuid>,
    pub seat_index: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatAssigned {
    pub table_id: Uuid,
    pub seat_index: u8,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatCleared {
    pub seat_index: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kind_round_trips_through_wire_names() {
        let json = serde_json::to_string(&ActionKind::Raise).unwrap();
        assert_eq!(json, "\"raise\"");
        let back: ActionKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ActionKind::Raise);
    }

    #[test]
    fn unknown_action_kind_is_rejected() {
        let err = serde_json::from_str::<ActionKind>("\"allin\"");
        assert!(err.is_err());
    }

    #[test]
    fn inbound_envelope_parses_type_and_payload() {
        let raw = r#"{"type": "join_table", "payload": {"table_id": "9b1f1b2e-8f2d-4b1a-9f1a-7f8c3a9d7e11"}}"#;
        let envelope: InboundEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.kind, "join_table");
        let payload: JoinTablePayload = serde_json::from_value(envelope.payload).unwrap();
        assert_eq!(payload.table_id.to_string(), "9b1f1b2e-8f2d-4b1a-9f1a-7f8c3a9d7e11");
    }
}
