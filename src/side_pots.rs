//! Side-pot layering (C3, spec.md §4.3).
//!
//! The teacher's `showdown::handler` approximates this by returning excess
//! chips to whichever single player bet the most, which under-handles a
//! three-way-unequal-all-in (spec.md §8 S3/S4). This module implements the
//! full layered algorithm instead, grounded on the layering shape verified
//! by `Rusickk1995-linera-poker`'s `compute_side_pots` tests (2/3/4-way
//! unequal all-ins producing one pot per distinct contribution level).

use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidePot {
    pub amount: u64,
    pub eligible_seats: BTreeSet<u8>,
}

/// Layer per-seat contributions into main + side pots.
///
/// Sorts distinct positive contribution levels ascending; for each level
/// `L` forms a pot of `(L - prev_level) * (#contributors with >= L)`,
/// eligible to contributors with `contribution >= L` who are not folded.
/// A layer whose eligible set would be empty (everyone at that level
/// folded) is merged into the previous pot so the chips are never lost
/// (spec.md §7's side-pot edge case).
pub fn calculate_side_pots(contributions: &BTreeMap<u8, u64>, folded: &BTreeSet<u8>) -> Vec<SidePot> {
    let mut levels: Vec<u64> = contributions
        .values()
        .copied()
        .filter(|&v| v > 0)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    levels.sort_unstable();

    let mut pots: Vec<SidePot> = Vec::new();
    let mut prev_level = 0u64;

    for &level in &levels {
        let layer_contributors: Vec<u8> = contributions
            .iter()
            .filter(|(_, &amount)| amount >= level)
            .map(|(&seat, _)| seat)
            .collect();

        let amount = (level - prev_level) * layer_contributors.len() as u64;
        let eligible: BTreeSet<u8> = layer_contributors
            .into_iter()
            .filter(|seat| !folded.contains(seat))
            .collect();

        if eligible.is_empty() {
            if let Some(last) = pots.last_mut() {
                last.amount += amount;
            } else {
                pots.push(SidePot {
                    amount,
                    eligible_seats: BTreeSet::new(),
                });
            }
        } else {
            pots.push(SidePot {
                amount,
                eligible_seats: eligible,
            });
        }

        prev_level = level;
    }

    pots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contrib(pairs: &[(u8, u64)]) -> BTreeMap<u8, u64> {
        pairs.iter().copied().collect()
    }

    fn seats(s: &[u8]) -> BTreeSet<u8> {
        s.iter().copied().collect()
    }

    #[test]
    fn two_players_equal_all_in_single_pot() {
        let c = contrib(&[(0, 100), (1, 100)]);
        let pots = calculate_side_pots(&c, &BTreeSet::new());
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, 200);
        assert_eq!(pots[0].eligible_seats, seats(&[0, 1]));
    }

    #[test]
    fn three_players_unequal_all_in_layers() {
        let c = contrib(&[(0, 100), (1, 200), (2, 300)]);
        let pots = calculate_side_pots(&c, &BTreeSet::new());
        assert_eq!(pots.len(), 3);
        assert_eq!(pots[0].amount, 300);
        assert_eq!(pots[0].eligible_seats, seats(&[0, 1, 2]));
        assert_eq!(pots[1].amount, 200);
        assert_eq!(pots[1].eligible_seats, seats(&[1, 2]));
        assert_eq!(pots[2].amount, 100);
        assert_eq!(pots[2].eligible_seats, seats(&[2]));
    }

    #[test]
    fn four_players_two_pair_all_ins() {
        let c = contrib(&[(0, 100), (1, 100), (2, 300), (3, 300)]);
        let pots = calculate_side_pots(&c, &BTreeSet::new());
        assert_eq!(pots.len(), 2);
        assert_eq!(pots[0].amount, 400);
        assert_eq!(pots[0].eligible_seats, seats(&[0, 1, 2, 3]));
        assert_eq!(pots[1].amount, 400);
        assert_eq!(pots[1].eligible_seats, seats(&[2, 3]));
    }

    /// spec.md §8 S4: a folded contributor's chips still count toward pot
    /// amounts but the seat appears in no eligible set.
    #[test]
    fn folded_contributor_excluded_from_eligibility_but_not_amount() {
        let c = contrib(&[(0, 100), (1, 300), (2, 300), (3, 20)]);
        let pots = calculate_side_pots(&c, &seats(&[3]));
        let total: u64 = pots.iter().map(|p| p.amount).sum();
        assert_eq!(total, 720);
        for pot in &pots {
            assert!(!pot.eligible_seats.contains(&3));
        }
    }

    #[test]
    fn sum_of_pots_equals_sum_of_contributions() {
        let c = contrib(&[(0, 50), (1, 125), (2, 125), (3, 500)]);
        let pots = calculate_side_pots(&c, &BTreeSet::new());
        let total: u64 = pots.iter().map(|p| p.amount).sum();
        let expected: u64 = c.values().sum();
        assert_eq!(total, expected);
    }

    #[test]
    fn all_contributors_at_top_layer_folded_merges_into_previous_pot() {
        // Seats 0 and 1 contribute 100; seat 2 contributes 200 but folds.
        let c = contrib(&[(0, 100), (1, 100), (2, 200)]);
        let pots = calculate_side_pots(&c, &seats(&[2]));
        // The 200-level layer has no eligible seats (only seat 2 reached
        // it, and seat 2 folded) so it merges into the main pot.
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, 400);
        assert_eq!(pots[0].eligible_seats, seats(&[0, 1]));
    }

    #[test]
    fn deterministic_on_repeated_calls() {
        let c = contrib(&[(0, 75), (1, 150), (2, 225)]);
        let a = calculate_side_pots(&c, &BTreeSet::new());
        let b = calculate_side_pots(&c, &BTreeSet::new());
        assert_eq!(a, b);
    }
}
