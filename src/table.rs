//! Seats, dealer button, hand ownership, and street/showdown orchestration
//! (C5, spec.md §3-4.4, §4.6).
//!
//! Grounded on the teacher's `state/table.rs` (`Table`'s seat bitmap,
//! `advance_dealer`, `find_empty_seat`) and `instructions/start_hand.rs`
//! (blind/position computation) and `instructions/showdown.rs` (payout
//! application, generalized from its single-over-bettor approximation to
//! full layered side pots via `side_pots.rs`). Bitmap seat tracking becomes
//! a plain `[Seat; 6]` array since there is no on-chain account layout to
//! pack into.

use std::collections::BTreeMap;

use rand::RngCore;
use uuid::Uuid;

use crate::card::{Card, Deck};
use crate::constants::{BIG_BLIND, SEATS_PER_TABLE, SMALL_BLIND, STARTING_STACK};
use crate::error::ServerError;
use crate::eval::{evaluate_seven, HandRank};
use crate::hand::{ActionKind, Hand, Street};
use crate::seat_ring::SeatRing;
use crate::side_pots::calculate_side_pots;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatStatus {
    Empty,
    Waiting,
    Active,
}

#[derive(Debug, Clone)]
pub struct Seat {
    pub index: u8,
    pub owner: Option<Uuid>,
    pub status: SeatStatus,
    pub stack: u64,
}

impl Seat {
    fn empty(index: u8) -> Self {
        Seat {
            index,
            owner: None,
            status: SeatStatus::Empty,
            stack: 0,
        }
    }
}

/// One seat's share of one pot's payout, part of a `HandEvent::Showdown`.
#[derive(Debug, Clone)]
pub struct SeatPayout {
    pub seat: u8,
    pub amount: u64,
}

/// A single pot's settlement: its winners (tied seats split evenly, odd
/// chip to earliest clockwise from SB) and, for showdown pots, the
/// winning category name (spec.md §6's wire hand names).
#[derive(Debug, Clone)]
pub struct PotResult {
    pub amount: u64,
    pub winning_hand_name: Option<&'static str>,
    pub payouts: Vec<SeatPayout>,
}

/// Broadcast-worthy events produced while processing one action, for the
/// caller (a `handlers/hand_flow.rs` handler) to turn into outbound
/// messages (spec.md §4.9).
#[derive(Debug, Clone)]
pub enum HandEvent {
    ActionApplied {
        seat: u8,
        kind: ActionKind,
        amount: u64,
        new_stack: u64,
        pot: u64,
        round_over: bool,
        next_actor: Option<u8>,
    },
    StreetAdvanced {
        street: Street,
        board_cards: Vec<Card>,
    },
    ActionRequested {
        seat: u8,
    },
    Showdown(PotResult),
    HandComplete,
    SeatCleared {
        seat: u8,
    },
}

pub struct Table {
    pub id: Uuid,
    pub name: String,
    pub seats: [Seat; 6],
    pub dealer: Option<u8>,
    pub dealer_rotated_this_hand: bool,
    pub current_hand: Option<Hand>,
}

impl Table {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Table {
            id,
            name: name.into(),
            seats: std::array::from_fn(|i| Seat::empty(i as u8)),
            dealer: None,
            dealer_rotated_this_hand: false,
            current_hand: None,
        }
    }

    pub fn first_empty_seat(&self) -> Option<u8> {
        self.seats.iter().find(|s| s.status == SeatStatus::Empty).map(|s| s.index)
    }

    pub fn is_owner_seated(&self, owner: Uuid) -> bool {
        self.seats.iter().any(|s| s.owner == Some(owner))
    }

    /// spec.md §4.9 `join_table`: assign the first empty seat waiting,
    /// stack at the starting amount.
    pub fn seat_player(&mut self, seat: u8, owner: Uuid) {
        let s = &mut self.seats[seat as usize];
        s.owner = Some(owner);
        s.status = SeatStatus::Waiting;
        s.stack = STARTING_STACK;
    }

    pub fn clear_seat(&mut self, seat: u8) {
        self.seats[seat as usize] = Seat::empty(seat);
    }

    fn eligible_count(&self) -> usize {
        self.seats.iter().filter(|s| s.status != SeatStatus::Empty).count()
    }

    fn is_seat_playable(&self, seat: u8) -> bool {
        self.seats[seat as usize].status != SeatStatus::Empty
    }

    fn stack_snapshot(&self) -> BTreeMap<u8, u64> {
        self.seats.iter().map(|s| (s.index, s.stack)).collect()
    }

    fn apply_stack_snapshot(&mut self, stacks: &BTreeMap<u8, u64>) {
        for (&seat, &stack) in stacks {
            self.seats[seat as usize].stack = stack;
        }
    }

    /// Free function rather than a `&self` method so callers can hold a
    /// `&mut Hand` borrowed from `self.current_hand` (a disjoint field)
    /// at the same time as this check against `self.seats`.
    fn seat_plays(seats: &[Seat; SEATS_PER_TABLE as usize], hand: &Hand, seat: u8) -> bool {
        seats[seat as usize].status == SeatStatus::Active && !hand.folded_players.contains(&seat) && seats[seat as usize].stack > 0
    }

    /// spec.md §4.4 `start_hand` row: promote waiting->active, rotate
    /// dealer, post blinds, deal hole cards, compute the first actor.
    pub fn start_hand(&mut self, rng: &mut impl RngCore) -> Result<(u8, u8, u8, Vec<HandEvent>), ServerError> {
        if self.current_hand.is_some() {
            return Err(ServerError::HandInProgress);
        }
        if self.eligible_count() < 2 {
            return Err(ServerError::InsufficientPlayers);
        }

        let mut deck = Deck::new();
        deck.shuffle(rng).map_err(|_| ServerError::ShuffleFailed)?;

        for seat in self.seats.iter_mut() {
            if seat.status == SeatStatus::Waiting {
                seat.status = SeatStatus::Active;
            }
        }

        if !self.dealer_rotated_this_hand {
            let next_dealer = SeatRing::find_first(self.dealer.map(|d| (d + 1) % SEATS_PER_TABLE).unwrap_or(0), |s| self.is_active(s))
                .ok_or(ServerError::InsufficientPlayers)?;
            self.dealer = Some(next_dealer);
        }
        self.dealer_rotated_this_hand = false;
        let dealer_seat = self.dealer.unwrap();

        let active_count = self.seats.iter().filter(|s| s.status == SeatStatus::Active).count();
        let (sb_seat, bb_seat) = if active_count == 2 {
            let other = SeatRing::find_after(dealer_seat, |s| self.is_active(s)).unwrap();
            (dealer_seat, other)
        } else {
            let sb = SeatRing::find_after(dealer_seat, |s| self.is_active(s)).unwrap();
            let bb = SeatRing::find_after(sb, |s| self.is_active(s)).unwrap();
            (sb, bb)
        };

        let active_seats: std::collections::BTreeSet<u8> = self
            .seats
            .iter()
            .filter(|s| s.status == SeatStatus::Active)
            .map(|s| s.index)
            .collect();

        let mut hand = Hand::new(dealer_seat, sb_seat, bb_seat, active_seats.clone(), deck);

        self.post_blind(&mut hand, sb_seat, SMALL_BLIND);
        self.post_blind(&mut hand, bb_seat, BIG_BLIND);

        for &seat in &active_seats {
            hand.deal_hole_cards(seat);
        }

        let first_actor = if active_count == 2 {
            if Table::seat_plays(&self.seats, &hand, dealer_seat) {
                Some(dealer_seat)
            } else {
                Some(bb_seat).filter(|&s| Table::seat_plays(&self.seats, &hand, s))
            }
        } else {
            SeatRing::find_after(bb_seat, |s| Table::seat_plays(&self.seats, &hand, s))
        };
        hand.current_actor = first_actor;
        self.current_hand = Some(hand);

        // Both blinds posted short and all-in leaves nobody able to act;
        // fall straight into the same auto-deal convergence a mid-hand
        // all-in round uses rather than waiting for an action that will
        // never come.
        let mut events = Vec::new();
        if first_actor.is_none() {
            events = self.advance_after_round();
        }
        Ok((dealer_seat, sb_seat, bb_seat, events))
    }

    fn is_active(&self, seat: u8) -> bool {
        self.seats[seat as usize].status == SeatStatus::Active
    }

    fn post_blind(&mut self, hand: &mut Hand, seat: u8, amount: u64) {
        let stack = &mut self.seats[seat as usize].stack;
        let posted = amount.min(*stack);
        *stack -= posted;
        *hand.player_bets.entry(seat).or_insert(0) += posted;
        *hand.total_contributions.entry(seat).or_insert(0) += posted;
    }

    /// spec.md §4.5 `processAction`, plumbed through §4.4's round/street
    /// advancement and §4.6's settlement.
    pub fn process_action(&mut self, seat: u8, kind: ActionKind, raise_to: Option<u64>) -> Result<Vec<HandEvent>, ServerError> {
        if !self.is_seat_playable(seat) {
            return Err(ServerError::NotSeated);
        }
        let mut stacks = self.stack_snapshot();
        let outcome = {
            let hand = self.current_hand.as_mut().ok_or(ServerError::HandNotActive)?;
            hand.process_action(seat, kind, raise_to, &mut stacks)?
        };
        self.apply_stack_snapshot(&stacks);

        let mut events = Vec::new();

        if outcome.hand_over_early {
            events.push(HandEvent::ActionApplied {
                seat,
                kind,
                amount: outcome.amount,
                new_stack: outcome.new_stack,
                pot: outcome.pot,
                round_over: true,
                next_actor: None,
            });
            events.extend(self.settle_hand());
            return Ok(events);
        }

        if outcome.round_over {
            events.push(HandEvent::ActionApplied {
                seat,
                kind,
                amount: outcome.amount,
                new_stack: outcome.new_stack,
                pot: outcome.pot,
                round_over: true,
                next_actor: None,
            });
            events.extend(self.advance_after_round());
        } else {
            let hand = self.current_hand.as_mut().unwrap();
            let next = SeatRing::find_after(seat, |s| Table::seat_plays(&self.seats, hand, s));
            hand.current_actor = next;
            events.push(HandEvent::ActionApplied {
                seat,
                kind,
                amount: outcome.amount,
                new_stack: outcome.new_stack,
                pot: outcome.pot,
                round_over: false,
                next_actor: next,
            });
            if let Some(seat) = next {
                events.push(HandEvent::ActionRequested { seat });
            }
        }

        Ok(events)
    }

    /// Sweep the street, deal the next street's board, and either request
    /// the next actor or (all remaining players all-in, or river reached)
    /// keep auto-dealing through to showdown (spec.md §4.4's auto-deal
    /// row).
    fn advance_after_round(&mut self) -> Vec<HandEvent> {
        let mut events = Vec::new();
        loop {
            let sb_seat = self.current_hand.as_ref().unwrap().small_blind_seat;
            let hand = self.current_hand.as_mut().unwrap();
            hand.sweep_bets();
            hand.advance_street();
            match hand.street {
                Street::Flop => hand.burn_and_deal_board(3),
                Street::Turn | Street::River => hand.burn_and_deal_board(1),
                Street::Complete | Street::Preflop => {}
            }
            events.push(HandEvent::StreetAdvanced {
                street: hand.street,
                board_cards: hand.board_cards.clone(),
            });

            if hand.street == Street::Complete {
                events.extend(self.settle_hand());
                break;
            }

            let active_count = self.seats.iter().filter(|s| s.status == SeatStatus::Active).count();
            let hand = self.current_hand.as_mut().unwrap();
            let first_actor = if active_count == 2 {
                SeatRing::find_first(hand.big_blind_seat, |s| Table::seat_plays(&self.seats, hand, s))
            } else {
                SeatRing::find_first(sb_seat, |s| Table::seat_plays(&self.seats, hand, s))
            };
            hand.current_actor = first_actor;

            match first_actor {
                Some(seat) => {
                    events.push(HandEvent::ActionRequested { seat });
                    break;
                }
                None => continue, // everyone left is all-in; keep auto-dealing
            }
        }
        events
    }

    /// spec.md §4.6: sweep, early-winner short-circuit or side-pot
    /// evaluation/distribution, auto-kick, dealer rotation, hand teardown.
    /// Used by both the early-winner path and the full-showdown path so
    /// they share one sweep/distribute/rotate sequence (spec.md §9's
    /// "fixed during development" note).
    fn settle_hand(&mut self) -> Vec<HandEvent> {
        let mut events = Vec::new();
        let mut hand = self.current_hand.take().expect("settle_hand called without an active hand");
        hand.sweep_bets();

        if let Some(winner) = hand.single_remaining_seat() {
            let amount = hand.pot;
            self.seats[winner as usize].stack += amount;
            events.push(HandEvent::Showdown(PotResult {
                amount,
                winning_hand_name: None,
                payouts: vec![SeatPayout { seat: winner, amount }],
            }));
        } else {
            let pots = calculate_side_pots(&hand.total_contributions, &hand.folded_players);
            for pot in pots {
                if pot.amount == 0 || pot.eligible_seats.is_empty() {
                    continue;
                }
                let ranked: Vec<(u8, HandRank)> = pot
                    .eligible_seats
                    .iter()
                    .map(|&seat| {
                        let hole = *hand.hole_cards.get(&seat).expect("eligible seat has hole cards");
                        (seat, evaluate_seven(hole, &hand.board_cards))
                    })
                    .collect();
                let best = ranked.iter().map(|(_, r)| *r).max().unwrap();
                let mut winners: Vec<u8> = ranked.iter().filter(|(_, r)| *r == best).map(|(s, _)| *s).collect();
                winners.sort_unstable();

                let share = pot.amount / winners.len() as u64;
                let remainder = pot.amount % winners.len() as u64;
                let remainder_seat = SeatRing::from(hand.small_blind_seat).find(|s| winners.contains(s)).unwrap_or(winners[0]);

                let mut payouts = Vec::new();
                for &seat in &winners {
                    let extra = if seat == remainder_seat { remainder } else { 0 };
                    let won = share + extra;
                    self.seats[seat as usize].stack += won;
                    payouts.push(SeatPayout { seat, amount: won });
                }

                events.push(HandEvent::Showdown(PotResult {
                    amount: pot.amount,
                    winning_hand_name: Some(best.category.wire_name()),
                    payouts,
                }));
            }
        }

        for &seat in &hand.active_at_start {
            if self.seats[seat as usize].stack == 0 {
                self.clear_seat(seat);
                events.push(HandEvent::SeatCleared { seat });
            }
        }

        if let Some(next_dealer) = SeatRing::find_after(hand.dealer_seat, |s| self.is_active(s)) {
            self.dealer = Some(next_dealer);
        }
        self.dealer_rotated_this_hand = true;

        events.push(HandEvent::HandComplete);
        events
    }
}
