//! Per-hand state and the betting round controller (C4, C5 shared,
//! spec.md §3, §4.4, §4.5).
//!
//! Grounded on the teacher's `state/hand.rs` (`HandState`'s bitmap
//! `active_players`/`acted_this_round`/`all_in_players` fields, and its
//! `is_betting_complete`/`next_active_player`/`advance_phase` methods) and
//! `instructions/player_action.rs` (the fold/check/call/raise/all-in match
//! arms). The teacher encodes seat membership as `u8` bitmaps because an
//! account's state has to fit a fixed on-chain layout; here seats are held
//! in `BTreeMap`/`BTreeSet<u8>` instead, matching spec.md §3's "mapping
//! seat -> value" / "set of seat indices" data model directly. Per-seat
//! chip stacks stay on `Table`'s `Seat` (see `table.rs`) exactly as the
//! teacher keeps `chips` on `PlayerSeat` rather than duplicating it into
//! `HandState`; `Table` passes a seat -> stack snapshot into each call
//! that needs it.

use std::collections::{BTreeMap, BTreeSet};

use crate::card::{Card, Deck};
use crate::constants::{BIG_BLIND, SMALL_BLIND};
use crate::error::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Raise,
}

impl ActionKind {
    pub fn wire_name(self) -> &'static str {
        match self {
            ActionKind::Fold => "fold",
            ActionKind::Check => "check",
            ActionKind::Call => "call",
            ActionKind::Raise => "raise",
        }
    }
}

/// Outcome of a successfully processed action, used by `Table` to build
/// the `action_result` broadcast (spec.md §4.9).
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub kind: ActionKind,
    pub amount: u64,
    pub new_stack: u64,
    pub pot: u64,
    pub round_over: bool,
    pub hand_over_early: bool,
}

#[derive(Debug, Clone)]
pub struct Hand {
    pub dealer_seat: u8,
    pub small_blind_seat: u8,
    pub big_blind_seat: u8,

    pub deck: Deck,
    pub hole_cards: BTreeMap<u8, [Card; 2]>,
    pub board_cards: Vec<Card>,
    pub street: Street,

    pub pot: u64,
    pub player_bets: BTreeMap<u8, u64>,
    pub total_contributions: BTreeMap<u8, u64>,
    pub current_bet: u64,
    pub last_raise: u64,

    pub current_actor: Option<u8>,
    pub folded_players: BTreeSet<u8>,
    pub acted_players: BTreeSet<u8>,
    pub big_blind_has_option: bool,

    /// Seats that were active when the hand started; the basis for
    /// "only one non-folded player remains" and for side-pot eligibility
    /// bookkeeping.
    pub active_at_start: BTreeSet<u8>,
}

impl Hand {
    /// Construct the hand skeleton for `active_seats` (already promoted
    /// waiting->active by the caller). Blinds are posted separately by
    /// `Table::start_hand` since posting requires mutating seat stacks.
    pub fn new(dealer_seat: u8, small_blind_seat: u8, big_blind_seat: u8, active_seats: BTreeSet<u8>, deck: Deck) -> Self {
        Hand {
            dealer_seat,
            small_blind_seat,
            big_blind_seat,
            deck,
            hole_cards: BTreeMap::new(),
            board_cards: Vec::new(),
            street: Street::Preflop,
            pot: 0,
            player_bets: BTreeMap::new(),
            total_contributions: BTreeMap::new(),
            current_bet: BIG_BLIND,
            last_raise: BIG_BLIND,
            current_actor: None,
            folded_players: BTreeSet::new(),
            acted_players: BTreeSet::new(),
            big_blind_has_option: true,
            active_at_start: active_seats,
        }
    }

    pub fn call_amount(&self, seat: u8) -> u64 {
        self.current_bet.saturating_sub(self.player_bets.get(&seat).copied().unwrap_or(0))
    }

    pub fn min_raise_to(&self) -> u64 {
        self.current_bet + self.last_raise
    }

    pub fn max_raise_to(&self, seat: u8, stack: u64) -> u64 {
        self.player_bets.get(&seat).copied().unwrap_or(0) + stack
    }

    /// spec.md §4.5 `getValidActions`. A raise (including a short all-in
    /// below the normal minimum) is offered whenever the seat has chips
    /// beyond what covers the call; `process_action` separately decides
    /// whether a short all-in reopens action for seats already acted.
    pub fn valid_actions(&self, seat: u8, stack: u64) -> Vec<ActionKind> {
        if stack == 0 {
            return Vec::new();
        }
        let call_amount = self.call_amount(seat);
        let mut actions = Vec::new();
        if call_amount == 0 {
            actions.push(ActionKind::Check);
        } else {
            actions.push(ActionKind::Call);
        }
        actions.push(ActionKind::Fold);
        if stack > call_amount {
            actions.push(ActionKind::Raise);
        }
        actions
    }

    /// Number of seats (among those active at hand start) that have not
    /// folded.
    pub fn non_folded_count(&self) -> usize {
        self.active_at_start.difference(&self.folded_players).count()
    }

    /// If exactly one non-folded seat remains, return it.
    pub fn single_remaining_seat(&self) -> Option<u8> {
        let mut remaining = self.active_at_start.difference(&self.folded_players);
        let first = remaining.next()?;
        if remaining.next().is_none() {
            Some(*first)
        } else {
            None
        }
    }

    /// spec.md §4.5 `processAction`. `stacks` maps every seat still in the
    /// hand to its current chip stack; the acting seat's entry is mutated
    /// in place on `call`/`raise`, and the whole map is then consulted to
    /// decide whether the round is complete (an all-in seat is exempt from
    /// acting again).
    pub fn process_action(&mut self, seat: u8, kind: ActionKind, raise_to: Option<u64>, stacks: &mut BTreeMap<u8, u64>) -> Result<ActionOutcome, ServerError> {
        if self.current_actor != Some(seat) {
            return Err(ServerError::NotYourTurn);
        }
        let mut stack = *stacks.get(&seat).ok_or(ServerError::NotSeated)?;
        let valid = self.valid_actions(seat, stack);
        if !valid.contains(&kind) {
            return Err(ServerError::InvalidAction);
        }

        let (amount, hand_over_early) = match kind {
            ActionKind::Fold => {
                self.folded_players.insert(seat);
                self.acted_players.insert(seat);
                (0, self.non_folded_count() == 1)
            }
            ActionKind::Check => {
                self.acted_players.insert(seat);
                if seat == self.big_blind_seat {
                    self.big_blind_has_option = false;
                }
                (0, false)
            }
            ActionKind::Call => {
                let call_amount = self.call_amount(seat);
                let paid = call_amount.min(stack);
                self.apply_bet(seat, paid, &mut stack);
                self.acted_players.insert(seat);
                if seat == self.big_blind_seat {
                    self.big_blind_has_option = false;
                }
                (paid, false)
            }
            ActionKind::Raise => {
                let raise_to = raise_to.ok_or(ServerError::AmountOutOfRange)?;
                let bet_so_far = self.player_bets.get(&seat).copied().unwrap_or(0);
                let max_raise_to = self.max_raise_to(seat, stack);
                let is_all_in = raise_to == max_raise_to;
                let min_raise_to = self.min_raise_to();
                if raise_to > max_raise_to || (!is_all_in && raise_to < min_raise_to) || raise_to <= self.current_bet {
                    return Err(ServerError::AmountOutOfRange);
                }
                let previous_current_bet = self.current_bet;
                let to_pay = raise_to.saturating_sub(bet_so_far);
                self.apply_bet(seat, to_pay, &mut stack);

                let is_full_raise = raise_to.saturating_sub(previous_current_bet) >= self.last_raise;
                self.current_bet = raise_to;
                if is_full_raise {
                    self.last_raise = raise_to - previous_current_bet;
                }
                self.big_blind_has_option = false;

                // A full raise reopens action: everyone except already-all-in
                // seats must act again. A short all-in below min-raise does
                // not reopen action for seats that already matched the prior
                // bet (spec.md §9 open question, resolved here).
                if is_full_raise {
                    self.acted_players.clear();
                }
                self.acted_players.insert(seat);

                (to_pay, false)
            }
        };

        stacks.insert(seat, stack);
        let round_over = hand_over_early || self.is_betting_round_complete(stacks);
        Ok(ActionOutcome {
            kind,
            amount,
            new_stack: stack,
            pot: self.pot,
            round_over,
            hand_over_early,
        })
    }

    fn apply_bet(&mut self, seat: u8, amount: u64, stack: &mut u64) {
        *stack -= amount;
        *self.player_bets.entry(seat).or_insert(0) += amount;
        *self.total_contributions.entry(seat).or_insert(0) += amount;
    }

    /// spec.md §4.5 `isBettingRoundComplete`. Needs each non-folded seat's
    /// current chip stack to know who is all-in (exempt from acting
    /// further). `stacks` maps seat -> current chip stack.
    pub fn is_betting_round_complete(&self, stacks: &BTreeMap<u8, u64>) -> bool {
        if self.non_folded_count() <= 1 {
            return true;
        }
        for &seat in self.active_at_start.difference(&self.folded_players) {
            let stack = stacks.get(&seat).copied().unwrap_or(0);
            if stack == 0 {
                continue; // all-in, exempt from acting further
            }
            if !self.acted_players.contains(&seat) {
                return false;
            }
            if self.player_bets.get(&seat).copied().unwrap_or(0) != self.current_bet {
                return false;
            }
        }
        let big_blind_all_in = stacks.get(&self.big_blind_seat).copied().unwrap_or(0) == 0;
        if self.street == Street::Preflop && self.big_blind_has_option && !big_blind_all_in && !self.acted_players.contains(&self.big_blind_seat) {
            return false;
        }
        true
    }

    /// Sweep the current street's bets into the pot (spec.md §4.4/§4.6).
    /// Clears `player_bets`/`acted_players`/`current_bet`; preserves
    /// `last_raise` as the postflop minimum-raise basis.
    pub fn sweep_bets(&mut self) {
        let swept: u64 = self.player_bets.values().sum();
        self.pot += swept;
        self.player_bets.clear();
        self.acted_players.clear();
        self.current_bet = 0;
        self.big_blind_has_option = false;
    }

    pub fn deal_hole_cards(&mut self, seat: u8) {
        let c1 = self.deck.deal().expect("deck exhausted dealing hole cards");
        let c2 = self.deck.deal().expect("deck exhausted dealing hole cards");
        self.hole_cards.insert(seat, [c1, c2]);
    }

    /// Burn one card and deal `n` onto the board (flop=3, turn/river=1).
    pub fn burn_and_deal_board(&mut self, n: usize) {
        self.deck.deal();
        for _ in 0..n {
            if let Some(card) = self.deck.deal() {
                self.board_cards.push(card);
            }
        }
    }

    pub fn advance_street(&mut self) {
        self.street = match self.street {
            Street::Preflop => Street::Flop,
            Street::Flop => Street::Turn,
            Street::Turn => Street::River,
            Street::River => Street::Complete,
            Street::Complete => Street::Complete,
        };
    }
}

/// Small-blind amount, re-exported for convenience of callers that only
/// import `hand`.
pub const DEFAULT_SB: u64 = SMALL_BLIND;
