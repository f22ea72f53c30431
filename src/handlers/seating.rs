//! `join_table` / `leave_table` (spec.md §4.9).
//!
//! Grounded on the teacher's `instructions/join_table.rs` and
//! `leave_table.rs`: validate preconditions, mutate seat + table
//! occupancy, emit the confirmation the teacher gets for free from
//! `msg!()`. The teacher's buy-in transfer has no counterpart here (seats
//! always start at the fixed `STARTING_STACK`, spec.md §4.9), so that step
//! is simply absent rather than stubbed.

use serde_json::Value;
use uuid::Uuid;

use crate::app::AppState;
use crate::card::Card;
use crate::error::ServerError;
use crate::lobby::LobbyView;
use crate::protocol::{JoinTablePayload, OutboundEnvelope, SeatAssigned, SeatCleared, SeatView, TableState};

pub fn join_table(state: &AppState, token: Option<Uuid>, payload: Value) -> Result<(), ServerError> {
    let token = token.ok_or(ServerError::InvalidToken)?;
    let payload: JoinTablePayload = serde_json::from_value(payload).map_err(|_| ServerError::InvalidJson)?;

    if state.sessions.is_seated(token) {
        return Err(ServerError::AlreadySeated);
    }
    let table_lock = state.find_table(payload.table_id).ok_or(ServerError::InvalidTable)?;

    let seat_index = {
        let mut table = table_lock.write().unwrap();
        let seat = table.first_empty_seat().ok_or(ServerError::TableFull)?;
        table.seat_player(seat, token);
        seat
    };

    state.sessions.update_session(token, Some(payload.table_id), Some(seat_index))?;
    state.hub.set_table(token, Some(payload.table_id));

    state.hub.send_to(
        token,
        OutboundEnvelope::new(
            "seat_assigned",
            SeatAssigned {
                table_id: payload.table_id,
                seat_index,
                status: "waiting",
            },
        ),
    );
    broadcast_lobby_state(state);
    Ok(())
}

pub fn leave_table(state: &AppState, token: Option<Uuid>) -> Result<(), ServerError> {
    let token = token.ok_or(ServerError::InvalidToken)?;
    let session = state.sessions.get_session(token).ok_or(ServerError::InvalidToken)?;
    let table_id = session.table_id.ok_or(ServerError::NotSeated)?;
    let seat_index = session.seat_index.ok_or(ServerError::NotSeated)?;
    let table_lock = state.find_table(table_id).ok_or(ServerError::InvalidTable)?;

    {
        let mut table = table_lock.write().unwrap();
        table.clear_seat(seat_index);
    }
    state.sessions.update_session(token, None, None)?;
    state.hub.set_table(token, None);

    state.hub.send_to(token, OutboundEnvelope::new("seat_cleared", SeatCleared { seat_index }));
    broadcast_lobby_state(state);
    Ok(())
}

fn broadcast_lobby_state(state: &AppState) {
    let snapshot = LobbyView::snapshot(&state.tables);
    for token in state.hub.all_tokens() {
        state.hub.send_to(token, OutboundEnvelope::new("lobby_state", snapshot.clone()));
    }
}

/// Builds and sends the personalised `table_state` snapshot (spec.md
/// §4.9) to `token` on (re)connect or mid-hand join.
pub fn push_table_state(state: &AppState, table_id: Uuid, token: Uuid) {
    let Some(table_lock) = state.find_table(table_id) else { return };
    let table = table_lock.read().unwrap();
    let recipient_seat = table.seats.iter().find(|s| s.owner == Some(token)).map(|s| s.index);

    let seats: Vec<SeatView> = table
        .seats
        .iter()
        .map(|s| SeatView {
            seat_index: s.index,
            owner_name: s.owner.and_then(|owner| state.sessions.get_session(owner)).map(|sess| sess.name),
            stack: s.stack,
            card_count: table
                .current_hand
                .as_ref()
                .map(|h| if h.hole_cards.contains_key(&s.index) { 2 } else { 0 })
                .unwrap_or(0),
        })
        .collect();

    let hole_cards: Option<[Card; 2]> = recipient_seat.and_then(|seat| table.current_hand.as_ref().and_then(|h| h.hole_cards.get(&seat).copied()));

    let payload = TableState {
        table_id: table.id,
        name: table.name.clone(),
        seats,
        dealer_seat: table.dealer,
        small_blind_seat: table.current_hand.as_ref().map(|h| h.small_blind_seat),
        big_blind_seat: table.current_hand.as_ref().map(|h| h.big_blind_seat),
        pot: table.current_hand.as_ref().map(|h| h.pot).unwrap_or(0),
        hand_in_progress: table.current_hand.is_some(),
        street: table.current_hand.as_ref().map(|h| h.street),
        board_cards: table.current_hand.as_ref().map(|h| h.board_cards.clone()).unwrap_or_default(),
        hole_cards,
    };
    drop(table);
    state.hub.send_to(token, OutboundEnvelope::new("table_state", payload));
}
