//! Card, rank, suit and deck representation (C1).
//!
//! The teacher encodes a card as a single `u8` (`suit * 13 + rank`) because
//! it has to fit inside an Inco-encrypted handle. This core has no such
//! constraint, so a card is a small `Copy` struct instead — but the
//! rank/suit split and the wire string conversion (`card_utils::card_to_string`)
//! are kept the same shape.

use std::fmt;

use rand::RngCore;
use serde::Serialize;
use thiserror::Error;

/// The deck's cryptographic random source failed to produce a random
/// index (spec.md §4.1: "failures to produce a random index are fatal to
/// the hand and surfaced as an error").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to draw randomness for the shuffle")]
pub struct ShuffleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Rank {
    Two = 0,
    Three = 1,
    Four = 2,
    Five = 3,
    Six = 4,
    Seven = 5,
    Eight = 6,
    Nine = 7,
    Ten = 8,
    Jack = 9,
    Queen = 10,
    King = 11,
    Ace = 12,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Zero-based ordinal, `0` (Two) through `12` (Ace). Ace is high.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    fn to_char(self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }

    fn from_char(c: char) -> Option<Rank> {
        Some(match c {
            '2' => Rank::Two,
            '3' => Rank::Three,
            '4' => Rank::Four,
            '5' => Rank::Five,
            '6' => Rank::Six,
            '7' => Rank::Seven,
            '8' => Rank::Eight,
            '9' => Rank::Nine,
            'T' | 't' => Rank::Ten,
            'J' | 'j' => Rank::Jack,
            'Q' | 'q' => Rank::Queen,
            'K' | 'k' => Rank::King,
            'A' | 'a' => Rank::Ace,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

    fn to_char(self) -> char {
        match self {
            Suit::Spades => 's',
            Suit::Hearts => 'h',
            Suit::Diamonds => 'd',
            Suit::Clubs => 'c',
        }
    }

    fn from_char(c: char) -> Option<Suit> {
        Some(match c {
            's' | 'S' => Suit::Spades,
            'h' | 'H' => Suit::Hearts,
            'd' | 'D' => Suit::Diamonds,
            'c' | 'C' => Suit::Clubs,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

/// Serialized as the two-character wire string (spec.md §6), not as a
/// `{rank, suit}` object.
impl Serialize for Card {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Card { rank, suit }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.to_char(), self.suit.to_char())
    }
}

/// Parse the two-character wire format (`rank` then `suit`), e.g. `"Ah"`.
impl std::str::FromStr for Card {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let rank_char = chars.next().ok_or(ParseCardError)?;
        let suit_char = chars.next().ok_or(ParseCardError)?;
        if chars.next().is_some() {
            return Err(ParseCardError);
        }
        let rank = Rank::from_char(rank_char).ok_or(ParseCardError)?;
        let suit = Suit::from_char(suit_char).ok_or(ParseCardError)?;
        Ok(Card::new(rank, suit))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseCardError;

impl fmt::Display for ParseCardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid card string")
    }
}

impl std::error::Error for ParseCardError {}

/// An ordered sequence of remaining cards. Dealing pops from the head.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// The canonical 52-card ordered list, rank-major within suit.
    pub fn new() -> Self {
        let mut cards = Vec::with_capacity(52);
        for &suit in &Suit::ALL {
            for &rank in &Rank::ALL {
                cards.push(Card::new(rank, suit));
            }
        }
        Deck { cards }
    }

    /// Fisher-Yates shuffle using the supplied RNG. Callers should pass a
    /// cryptographically secure source (`rand::rngs::StdRng` seeded from
    /// `rand::rngs::OsRng`, or `rand::thread_rng()`); no RNG state is kept
    /// on the deck between hands. Draws each index via `try_fill_bytes`
    /// rather than the infallible `RngCore` helpers, so a failure to draw
    /// randomness is returned instead of panicking partway through the
    /// shuffle.
    pub fn shuffle(&mut self, rng: &mut impl RngCore) -> Result<(), ShuffleError> {
        for i in (1..self.cards.len()).rev() {
            let j = random_index(rng, i + 1)?;
            self.cards.swap(i, j);
        }
        Ok(())
    }

    /// Pop the next card from the head of the deck.
    pub fn deal(&mut self) -> Option<Card> {
        if self.cards.is_empty() {
            None
        } else {
            Some(self.cards.remove(0))
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

/// A uniform index in `0..bound`, drawn via `try_fill_bytes` so a source
/// exhaustion (e.g. an unreadable OS entropy pool) surfaces as `Err`
/// instead of a panic.
fn random_index(rng: &mut impl RngCore, bound: usize) -> Result<usize, ShuffleError> {
    let mut buf = [0u8; 8];
    rng.try_fill_bytes(&mut buf).map_err(|_| ShuffleError)?;
    Ok((u64::from_le_bytes(buf) % bound as u64) as usize)
}
