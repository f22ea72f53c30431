//! `start_hand` / `player_action` (spec.md §4.9, §4.4-4.6).
//!
//! Grounded on the teacher's `instructions/start_hand.rs` and
//! `instructions/player_action.rs`: validate preconditions, delegate the
//! actual state transition to the owning type (`Table`, here, in place of
//! the teacher's `Table`/`HandState` accounts), then turn what happened
//! into the outbound messages spec.md §4.9 lists. Locking follows spec.md
//! §5: acquire the table's write lock, mutate, copy out everything the
//! broadcasts need, release, then send.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use uuid::Uuid;

use crate::app::AppState;
use crate::card::Card;
use crate::error::ServerError;
use crate::protocol::{
    ActionRequest, ActionResult, BlindPosted, BoardDealt, CardsDealt, HandComplete, HandStarted, OutboundEnvelope, PlayerActionPayload, SeatAmount, SeatCardCount, ShowdownResult,
};
use crate::table::{HandEvent, PotResult};

fn session_table(state: &AppState, token: Option<Uuid>) -> Result<(Uuid, Uuid, u8), ServerError> {
    let token = token.ok_or(ServerError::InvalidToken)?;
    let session = state.sessions.get_session(token).ok_or(ServerError::InvalidToken)?;
    let table_id = session.table_id.ok_or(ServerError::NotSeated)?;
    let seat_index = session.seat_index.ok_or(ServerError::NotSeated)?;
    Ok((token, table_id, seat_index))
}

/// spec.md §4.9 `start_hand`: validate via `Table::start_hand`, then
/// broadcast `hand_started`, `blind_posted` x2, personalised `cards_dealt`,
/// and whatever the auto-deal convergence produced (possibly straight
/// through to showdown if both blinds were posted short and all-in).
pub fn start_hand(state: &AppState, token: Option<Uuid>) -> Result<(), ServerError> {
    let (_token, table_id, _seat) = session_table(state, token)?;
    let table_lock = state.find_table(table_id).ok_or(ServerError::InvalidTable)?;

    let (dealer, sb, bb, events, blinds, hole_cards, owners) = {
        let mut table = table_lock.write().unwrap();
        let mut rng = StdRng::from_entropy();
        let (dealer, sb, bb, events) = table.start_hand(&mut rng)?;
        let hand = table.current_hand.as_ref();
        let blinds: BTreeMap<u8, u64> = hand.map(|h| h.player_bets.clone()).unwrap_or_default();
        let hole_cards: BTreeMap<u8, [Card; 2]> = hand.map(|h| h.hole_cards.clone()).unwrap_or_default();
        let owners: BTreeMap<u8, Uuid> = table.seats.iter().filter_map(|s| s.owner.map(|o| (s.index, o))).collect();
        (dealer, sb, bb, events, blinds, hole_cards, owners)
    };

    state.hub.broadcast(
        table_id,
        OutboundEnvelope::new(
            "hand_started",
            HandStarted {
                dealer_seat: dealer,
                small_blind_seat: sb,
                big_blind_seat: bb,
            },
        ),
    );
    for (&seat, &amount) in &blinds {
        state.hub.broadcast(table_id, OutboundEnvelope::new("blind_posted", BlindPosted { seat_index: seat, amount }));
    }
    broadcast_cards_dealt(state, table_id, &hole_cards, &owners);
    apply_events(state, table_id, events);
    send_action_request(state, table_id);
    Ok(())
}

/// spec.md §4.9 `player_action`: validate the acting seat and action via
/// `Table::process_action`, broadcast `action_result`, and keep going
/// through whatever street advance / showdown / auto-deal followed.
pub fn player_action(state: &AppState, token: Option<Uuid>, payload: Value) -> Result<(), ServerError> {
    let (_token, table_id, seat_index) = session_table(state, token)?;
    let payload: PlayerActionPayload = serde_json::from_value(payload).map_err(|_| ServerError::InvalidJson)?;
    if payload.seat_index != seat_index {
        return Err(ServerError::NotYourTurn);
    }

    let events = {
        let table_lock = state.find_table(table_id).ok_or(ServerError::InvalidTable)?;
        let mut table = table_lock.write().unwrap();
        table.process_action(seat_index, payload.action, payload.amount)?
    };

    apply_events(state, table_id, events);
    send_action_request(state, table_id);
    Ok(())
}

fn broadcast_cards_dealt(state: &AppState, _table_id: Uuid, hole_cards: &BTreeMap<u8, [Card; 2]>, owners: &BTreeMap<u8, Uuid>) {
    let card_counts: Vec<SeatCardCount> = hole_cards.keys().map(|&seat| SeatCardCount { seat_index: seat, card_count: 2 }).collect();
    for (&seat, &cards) in hole_cards {
        let Some(&owner) = owners.get(&seat) else { continue };
        state.hub.send_to(
            owner,
            OutboundEnvelope::new(
                "cards_dealt",
                CardsDealt {
                    your_cards: cards.to_vec(),
                    card_counts: card_counts.clone(),
                },
            ),
        );
    }
}

/// If the hand is still live with a current actor, broadcast the bounds
/// for their decision (spec.md §4.9 `action_request`).
fn send_action_request(state: &AppState, table_id: Uuid) {
    let Some(table_lock) = state.find_table(table_id) else { return };
    let payload = {
        let table = table_lock.read().unwrap();
        let Some(hand) = table.current_hand.as_ref() else { return };
        let Some(seat) = hand.current_actor else { return };
        let stack = table.seats[seat as usize].stack;
        ActionRequest {
            seat_index: seat,
            valid_actions: hand.valid_actions(seat, stack),
            call_amount: hand.call_amount(seat),
            min_raise: hand.min_raise_to(),
            max_raise: hand.max_raise_to(seat, stack),
        }
    };
    state.hub.broadcast(table_id, OutboundEnvelope::new("action_request", payload));
}

/// Translates the engine's internal `HandEvent`s into the wire broadcasts
/// of spec.md §4.9. `ActionRequested` is intentionally skipped here — its
/// payload needs live `valid_actions`/bounds, sent once at the end by
/// `send_action_request` instead of per intermediate event.
fn apply_events(state: &AppState, table_id: Uuid, events: Vec<HandEvent>) {
    for event in events {
        match event {
            HandEvent::ActionApplied {
                seat,
                kind,
                amount,
                new_stack,
                pot,
                round_over,
                next_actor,
            } => {
                state.hub.broadcast(
                    table_id,
                    OutboundEnvelope::new(
                        "action_result",
                        ActionResult {
                            seat_index: seat,
                            action: kind,
                            amount,
                            new_stack,
                            pot,
                            next_actor,
                            round_over,
                        },
                    ),
                );
            }
            HandEvent::StreetAdvanced { street, board_cards } => {
                state.hub.broadcast(table_id, OutboundEnvelope::new("board_dealt", BoardDealt { board_cards, street }));
            }
            HandEvent::ActionRequested { .. } => {}
            HandEvent::Showdown(pot_result) => {
                let PotResult { amount, winning_hand_name, payouts } = pot_result;
                state.hub.broadcast(
                    table_id,
                    OutboundEnvelope::new(
                        "showdown_result",
                        ShowdownResult {
                            winner_seats: payouts.iter().map(|p| p.seat).collect(),
                            winning_hand_name,
                            pot_amount: amount,
                            amounts_won: payouts.into_iter().map(|p| SeatAmount { seat_index: p.seat, amount: p.amount }).collect(),
                        },
                    ),
                );
            }
            HandEvent::HandComplete => {
                state.hub.broadcast(
                    table_id,
                    OutboundEnvelope::new(
                        "hand_complete",
                        HandComplete {
                            message: "hand complete".to_string(),
                        },
                    ),
                );
            }
            HandEvent::SeatCleared { seat } => {
                // Auto-kick (spec.md §4.6 step 6): clear the bust-out
                // seat's session binding too, mirroring `leave_table`.
                if let Some(table_lock) = state.find_table(table_id) {
                    let owner = table_lock.read().unwrap().seats[seat as usize].owner;
                    if let Some(owner) = owner {
                        let _ = state.sessions.update_session(owner, None, None);
                        state.hub.set_table(owner, None);
                        state.hub.send_to(owner, OutboundEnvelope::new("seat_cleared", crate::protocol::SeatCleared { seat_index: seat }));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seated_heads_up() -> (AppState, Uuid, Uuid, Uuid) {
        let state = AppState::new();
        let table_id = state.tables[0].read().unwrap().id;
        let a = state.sessions.create_session("Alice").unwrap();
        let b = state.sessions.create_session("Bob").unwrap();
        crate::handlers::seating::join_table(&state, Some(a.token), serde_json::json!({"table_id": table_id})).unwrap();
        crate::handlers::seating::join_table(&state, Some(b.token), serde_json::json!({"table_id": table_id})).unwrap();
        (state, table_id, a.token, b.token)
    }

    #[test]
    fn start_hand_without_two_players_is_insufficient_players() {
        let state = AppState::new();
        let table_id = state.tables[0].read().unwrap().id;
        let alice = state.sessions.create_session("Alice").unwrap();
        crate::handlers::seating::join_table(&state, Some(alice.token), serde_json::json!({"table_id": table_id})).unwrap();
        assert!(matches!(start_hand(&state, Some(alice.token)), Err(ServerError::InsufficientPlayers)));
    }

    #[test]
    fn start_hand_deals_and_requests_first_action() {
        let (state, table_id, a, _b) = seated_heads_up();
        start_hand(&state, Some(a)).unwrap();
        let table = state.tables.iter().find(|t| t.read().unwrap().id == table_id).unwrap();
        assert!(table.read().unwrap().current_hand.is_some());
    }

    #[test]
    fn player_action_rejects_wrong_seat_index() {
        let (state, _table_id, a, _b) = seated_heads_up();
        start_hand(&state, Some(a)).unwrap();
        let result = player_action(&state, Some(a), serde_json::json!({"seat_index": 5, "action": "fold"}));
        assert!(matches!(result, Err(ServerError::NotYourTurn)));
    }

    #[test]
    fn fold_ends_heads_up_hand() {
        let (state, table_id, a, b) = seated_heads_up();
        start_hand(&state, Some(a)).unwrap();
        let table = state.tables.iter().find(|t| t.read().unwrap().id == table_id).unwrap();
        let actor = table.read().unwrap().current_hand.as_ref().unwrap().current_actor.unwrap();
        let actor_token = if actor == 0 { a } else { b };

        player_action(&state, Some(actor_token), serde_json::json!({"seat_index": actor, "action": "fold"})).unwrap();
        assert!(table.read().unwrap().current_hand.is_none());
    }
}
