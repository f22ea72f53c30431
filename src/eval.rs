//! 5-of-7 hand evaluator and total order over hand ranks (C2).
//!
//! Grounded on the teacher's `state/hand_eval.rs`: the category enum, the
//! `kickers: [u8; 5]` tiebreak representation, and the "try all C(7,5)
//! combinations, keep the best" evaluation strategy are all kept. Two
//! things change for this spec: ranks are compared via `Card`/`Rank`
//! instead of a raw `u8`, and Royal Flush is collapsed into
//! `StraightFlush` (spec.md §4.2 reports it on the wire as a Straight
//! Flush with the literal Ace-high board) rather than kept as a distinct,
//! higher category the way the teacher's `HandRank::RoyalFlush` does.

use std::cmp::Ordering;

use crate::card::Card;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Category {
    HighCard = 0,
    Pair = 1,
    TwoPair = 2,
    Trips = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    Quads = 7,
    StraightFlush = 8,
}

impl Category {
    /// The name surfaced to clients on the wire (spec.md §6).
    pub fn wire_name(self) -> &'static str {
        match self {
            Category::HighCard => "High Card",
            Category::Pair => "Pair",
            Category::TwoPair => "Two Pair",
            Category::Trips => "Three of a Kind",
            Category::Straight => "Straight",
            Category::Flush => "Flush",
            Category::FullHouse => "Full House",
            Category::Quads => "Four of a Kind",
            Category::StraightFlush => "Straight Flush",
        }
    }
}

/// A total-ordered hand ranking. Category wins first; within a category,
/// kickers are compared lexicographically (most significant first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandRank {
    pub category: Category,
    pub kickers: [u8; 5],
}

impl PartialOrd for HandRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandRank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.category
            .cmp(&other.category)
            .then_with(|| self.kickers.cmp(&other.kickers))
    }
}

impl HandRank {
    /// -1/0/+1 comparison matching spec.md §4.2's `compare` contract.
    pub fn compare(&self, other: &Self) -> i32 {
        match self.cmp(other) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }
}

/// Evaluate the best 5-card hand from a player's hole cards plus 0..5 board
/// cards. The server only ever calls this at showdown with a full 5-card
/// board (N=5, 21 combinations), but smaller boards are accepted so unit
/// tests can exercise partial information directly.
pub fn evaluate_seven(hole: [Card; 2], board: &[Card]) -> HandRank {
    let mut all = Vec::with_capacity(2 + board.len());
    all.push(hole[0]);
    all.push(hole[1]);
    all.extend_from_slice(board);
    assert!(all.len() >= 5, "evaluate_seven requires at least 5 cards");

    let n = all.len();
    let mut best: Option<HandRank> = None;
    let mut idx = [0usize; 5];
    combinations(n, 5, &mut idx, 0, 0, &mut |combo| {
        let five = [all[combo[0]], all[combo[1]], all[combo[2]], all[combo[3]], all[combo[4]]];
        let eval = evaluate_five(five);
        if best.as_ref().map_or(true, |b| eval > *b) {
            best = Some(eval);
        }
    });
    best.unwrap()
}

/// Enumerate all `k`-combinations of `0..n` as index arrays, calling `f`
/// with each.
fn combinations(n: usize, k: usize, buf: &mut [usize; 5], start: usize, depth: usize, f: &mut impl FnMut(&[usize; 5])) {
    if depth == k {
        f(buf);
        return;
    }
    for i in start..n {
        buf[depth] = i;
        combinations(n, k, buf, i + 1, depth + 1, f);
    }
}

fn evaluate_five(cards: [Card; 5]) -> HandRank {
    let mut ranks: [u8; 5] = cards.map(|c| c.rank.ordinal());
    ranks.sort_unstable_by(|a, b| b.cmp(a));

    let is_flush = cards[1..].iter().all(|c| c.suit == cards[0].suit);
    let is_wheel = ranks == [12, 3, 2, 1, 0];
    let is_straight = !is_wheel && is_consecutive(&ranks);

    if is_flush && (is_straight || is_wheel) {
        let high = if is_wheel { 3 } else { ranks[0] };
        return HandRank {
            category: Category::StraightFlush,
            kickers: [high, 0, 0, 0, 0],
        };
    }

    let mut rank_counts = [0u8; 13];
    for &r in &ranks {
        rank_counts[r as usize] += 1;
    }

    let mut quads = None;
    let mut trips = None;
    let mut pairs = Vec::new();
    let mut singles = Vec::new();
    for r in (0..13u8).rev() {
        match rank_counts[r as usize] {
            4 => quads = Some(r),
            3 => trips = Some(r),
            2 => pairs.push(r),
            1 => singles.push(r),
            _ => {}
        }
    }

    if let Some(quad_rank) = quads {
        let kicker = singles.first().copied().or(trips).or(pairs.first().copied()).unwrap_or(0);
        return HandRank {
            category: Category::Quads,
            kickers: [quad_rank, kicker, 0, 0, 0],
        };
    }

    if let (Some(t), true) = (trips, !pairs.is_empty()) {
        return HandRank {
            category: Category::FullHouse,
            kickers: [t, pairs[0], 0, 0, 0],
        };
    }

    if is_flush {
        return HandRank {
            category: Category::Flush,
            kickers: [ranks[0], ranks[1], ranks[2], ranks[3], ranks[4]],
        };
    }

    if is_straight {
        return HandRank {
            category: Category::Straight,
            kickers: [ranks[0], 0, 0, 0, 0],
        };
    }
    if is_wheel {
        return HandRank {
            category: Category::Straight,
            kickers: [3, 0, 0, 0, 0],
        };
    }

    if let Some(trip_rank) = trips {
        return HandRank {
            category: Category::Trips,
            kickers: [
                trip_rank,
                singles.first().copied().unwrap_or(0),
                singles.get(1).copied().unwrap_or(0),
                0,
                0,
            ],
        };
    }

    if pairs.len() >= 2 {
        return HandRank {
            category: Category::TwoPair,
            kickers: [pairs[0], pairs[1], singles.first().copied().unwrap_or(0), 0, 0],
        };
    }

    if pairs.len() == 1 {
        return HandRank {
            category: Category::Pair,
            kickers: [
                pairs[0],
                singles.first().copied().unwrap_or(0),
                singles.get(1).copied().unwrap_or(0),
                singles.get(2).copied().unwrap_or(0),
                0,
            ],
        };
    }

    HandRank {
        category: Category::HighCard,
        kickers: [ranks[0], ranks[1], ranks[2], ranks[3], ranks[4]],
    }
}

fn is_consecutive(sorted_desc: &[u8; 5]) -> bool {
    sorted_desc.windows(2).all(|w| w[0] == w[1] + 1)
}
