//! End-to-end hand scenarios exercised against the public `Table` API
//! rather than `Hand` directly: blinds/option, min-raise preservation,
//! layered side pots (unequal all-in and a folded contributor), the
//! odd-chip split rule, and auto-deal through to showdown. The
//! preflop/postflop min-raise cases are also covered at the `Hand` level
//! in `src/hand.rs`; these versions drive the same situations through
//! `Table::start_hand`/`process_action` so the seat bookkeeping, event
//! stream, and dealer rotation are exercised too.

use holdem_core::hand::{ActionKind, Street};
use holdem_core::side_pots::calculate_side_pots;
use holdem_core::table::{HandEvent, Table};
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn seated(stacks: &[u64]) -> Table {
    let mut table = Table::new(Uuid::new_v4(), "Scenario Table");
    for (seat, &stack) in stacks.iter().enumerate() {
        table.seat_player(seat as u8, Uuid::new_v4());
        table.seats[seat].stack = stack;
    }
    table
}

/// S1: heads-up blinds and the big blind's option.
#[test]
fn heads_up_blinds_and_bb_option() {
    let mut table = seated(&[1000, 1000]);
    let (dealer, sb, bb, _events) = table.start_hand(&mut rng()).unwrap();

    assert_eq!(dealer, sb, "heads-up dealer is the small blind");
    assert_eq!(table.seats[sb as usize].stack, 990);
    assert_eq!(table.seats[bb as usize].stack, 980);
    assert_eq!(table.current_hand.as_ref().unwrap().current_actor, Some(sb));

    let events = table.process_action(sb, ActionKind::Call, None).unwrap();
    assert!(
        events.iter().any(|e| matches!(e, HandEvent::ActionApplied { round_over: false, .. })),
        "BB still has the option, round is not complete"
    );
    assert_eq!(table.current_hand.as_ref().unwrap().current_actor, Some(bb));

    let events = table.process_action(bb, ActionKind::Check, None).unwrap();
    assert!(events.iter().any(|e| matches!(e, HandEvent::StreetAdvanced { street: Street::Flop, .. })));
}

/// S2: a postflop bet that exactly doubles the prior min-raise basis
/// (inherited from the big blind) becomes the new basis.
#[test]
fn postflop_min_raise_preserves_big_blind_basis() {
    let mut table = seated(&[1000, 1000]);
    let (_dealer, sb, bb, _events) = table.start_hand(&mut rng()).unwrap();
    table.process_action(sb, ActionKind::Call, None).unwrap();
    table.process_action(bb, ActionKind::Check, None).unwrap();

    let hand = table.current_hand.as_ref().unwrap();
    assert_eq!(hand.street, Street::Flop);
    assert_eq!(hand.current_bet, 0);
    assert_eq!(hand.last_raise, 20, "min-raise basis carries over from the big blind");
    assert_eq!(hand.min_raise_to(), 20);
    let first_to_act = hand.current_actor.unwrap();

    table.process_action(first_to_act, ActionKind::Raise, Some(30)).unwrap();
    let hand = table.current_hand.as_ref().unwrap();
    assert_eq!(hand.last_raise, 30);
    assert_eq!(hand.min_raise_to(), 60);
}

/// Drives whoever is on the button through an all-in raise or call until
/// the hand ends, reconstructing the final total-contributions/folded
/// state from the returned `ActionApplied` events (by the time an action
/// ends the hand, `process_action` has already settled and torn down
/// `current_hand`, so that state can no longer be read back off `Table`).
fn shove_everyone_all_in(table: &mut Table) -> (std::collections::BTreeMap<u8, u64>, std::collections::BTreeSet<u8>) {
    let mut contributions = table.current_hand.as_ref().unwrap().total_contributions.clone();
    let mut folded = std::collections::BTreeSet::new();
    while let Some(hand) = table.current_hand.as_ref() {
        let seat = hand.current_actor.unwrap();
        let stack = table.seats[seat as usize].stack;
        let max_raise_to = hand.max_raise_to(seat, stack);
        let call_amount = hand.call_amount(seat);
        let events = if stack > call_amount {
            table.process_action(seat, ActionKind::Raise, Some(max_raise_to)).unwrap()
        } else {
            table.process_action(seat, ActionKind::Call, None).unwrap()
        };
        for event in events {
            if let HandEvent::ActionApplied { seat, kind, amount, .. } = event {
                *contributions.entry(seat).or_insert(0) += amount;
                if kind == ActionKind::Fold {
                    folded.insert(seat);
                }
            }
        }
    }
    (contributions, folded)
}

/// S3: three players shove preflop with unequal stacks. The short stack
/// is eligible for the main pot only; the larger stacks split a side pot
/// between themselves.
#[test]
fn unequal_all_in_produces_a_main_and_side_pot() {
    let mut table = seated(&[500, 1000, 1000]);
    table.start_hand(&mut rng()).unwrap();

    let (contributions, folded) = shove_everyone_all_in(&mut table);
    assert!(table.current_hand.is_none(), "hand reached showdown");
    assert_eq!(table.seats.iter().map(|s| s.stack).sum::<u64>(), 2500, "chips are conserved");

    let pots = calculate_side_pots(&contributions, &folded);
    assert_eq!(pots.len(), 2, "two distinct contribution levels produce a main and one side pot");
    let short_stack = contributions.iter().min_by_key(|&(_, &amount)| amount).map(|(&seat, _)| seat).unwrap();
    assert!(pots[0].eligible_seats.contains(&short_stack), "short stack is eligible for the main pot");
    assert!(!pots[1].eligible_seats.contains(&short_stack), "short stack is excluded from the side pot");
    assert_eq!(pots.iter().map(|p| p.amount).sum::<u64>(), contributions.values().sum::<u64>());
}

/// S4: a fourth player folds after limping in for the big blind while the
/// other three build a side pot postflop. The folder's chips still count
/// toward the main pot but they are eligible for no pot's payout.
#[test]
fn folded_contributor_chips_stay_in_the_pot_without_eligibility() {
    let mut table = seated(&[100, 2000, 2000, 1000]);
    table.dealer = Some(0);
    table.dealer_rotated_this_hand = true;
    table.start_hand(&mut rng()).unwrap();

    // Preflop: everyone limps/calls to the big blind, no raises.
    table.process_action(3, ActionKind::Call, None).unwrap(); // UTG (seat 3) calls 20
    table.process_action(0, ActionKind::Call, None).unwrap(); // dealer (seat 0) calls 20
    table.process_action(1, ActionKind::Call, None).unwrap(); // small blind tops up to 20
    table.process_action(2, ActionKind::Check, None).unwrap(); // big blind's option, round complete

    let hand = table.current_hand.as_ref().unwrap();
    assert_eq!(hand.street, Street::Flop);
    assert_eq!(hand.current_actor, Some(1), "small blind acts first postflop at a full table");

    table.process_action(1, ActionKind::Raise, Some(280)).unwrap(); // seat 1 bets 280, total contribution 300
    table.process_action(2, ActionKind::Call, None).unwrap(); // seat 2 calls, total contribution 300
    let events = table.process_action(3, ActionKind::Fold, None).unwrap(); // seat 3 folds, total contribution stays 20
    assert!(events.iter().any(|e| matches!(e, HandEvent::ActionApplied { round_over: false, .. })));
    let events = table.process_action(0, ActionKind::Call, None).unwrap(); // seat 0 calls all-in for 80 more, total contribution 100
    assert!(events.iter().any(|e| matches!(e, HandEvent::ActionApplied { round_over: true, .. })));

    let hand = table.current_hand.as_ref().unwrap();
    let contributions = hand.total_contributions.clone();
    let folded = hand.folded_players.clone();
    assert_eq!(contributions[&0], 100);
    assert_eq!(contributions[&1], 300);
    assert_eq!(contributions[&2], 300);
    assert_eq!(contributions[&3], 20);
    assert_eq!(contributions.values().sum::<u64>(), 720);
    assert!(folded.contains(&3));

    let pots = calculate_side_pots(&contributions, &folded);
    assert!(pots.iter().all(|p| !p.eligible_seats.contains(&3)), "the folder is eligible for nothing");
    assert_eq!(pots.iter().map(|p| p.amount).sum::<u64>(), 720, "no chips are lost to the folded contributor");

    // Check both remaining live players down to showdown; seat 0 is
    // already all-in and exempt from acting further.
    while table.current_hand.is_some() {
        let actor = table.current_hand.as_ref().unwrap().current_actor.unwrap();
        table.process_action(actor, ActionKind::Check, None).unwrap();
    }
    assert_eq!(table.seats.iter().map(|s| s.stack).sum::<u64>(), 5100, "chips conserved across the whole hand");
}

fn check_or_call(table: &mut Table, seat: u8) {
    let call_amount = table.current_hand.as_ref().unwrap().call_amount(seat);
    let kind = if call_amount == 0 { ActionKind::Check } else { ActionKind::Call };
    table.process_action(seat, kind, None).unwrap();
}

/// S5: the odd chip in a tied pot goes to the seat earliest clockwise
/// from the small blind among the winners, not split evenly. Rigged by
/// overwriting the board and hole cards once the river is already fully
/// dealt (overwriting any earlier street would just be clobbered by the
/// next street's real deal) so seat 1 and seat 2 both play the same
/// board-reading flush, an exact tie.
#[test]
fn odd_chip_goes_to_earliest_seat_clockwise_from_small_blind() {
    use holdem_core::card::Card;
    use std::str::FromStr;

    let mut table = seated(&[1000, 1000, 1000]);
    table.dealer = Some(0);
    table.dealer_rotated_this_hand = true;
    table.start_hand(&mut rng()).unwrap();

    table.process_action(0, ActionKind::Fold, None).unwrap(); // dealer (UTG in 3-handed) folds preflop
    while table.current_hand.as_ref().unwrap().street != Street::River {
        let actor = table.current_hand.as_ref().unwrap().current_actor.unwrap();
        check_or_call(&mut table, actor);
    }

    // Board/hole cards are rigged for an exact tie between seats 1 and 2.
    // Contributions are overridden directly to land on a 101-chip pot
    // split the way spec.md's example does: the folded seat's 1 chip
    // merges into the main pot layer (still eligible to nobody, since
    // it folded) alongside a 100-chip layer the two tied seats share,
    // for a combined 101 split as 51/50 rather than evenly.
    let hand = table.current_hand.as_mut().unwrap();
    hand.board_cards = vec!["Ah", "Kh", "Qh", "Jh", "9h"].iter().map(|s| Card::from_str(s).unwrap()).collect();
    hand.hole_cards.insert(1, [Card::from_str("2d").unwrap(), Card::from_str("3d").unwrap()]);
    hand.hole_cards.insert(2, [Card::from_str("2s").unwrap(), Card::from_str("3s").unwrap()]);
    hand.total_contributions = [(0, 1), (1, 50), (2, 50)].into_iter().collect();

    let starting_stacks = [table.seats[1].stack, table.seats[2].stack];
    while table.current_hand.is_some() {
        let actor = table.current_hand.as_ref().unwrap().current_actor.unwrap();
        check_or_call(&mut table, actor);
    }

    assert_eq!(table.seats[1].stack, starting_stacks[0] + 51, "small blind is earliest clockwise from itself and takes both odd chips");
    assert_eq!(table.seats[2].stack, starting_stacks[1] + 50);
}

/// S6: once a round completes with someone all-in, the engine keeps
/// dealing streets without emitting further `ActionRequested` events
/// until the board is complete.
#[test]
fn auto_deal_through_to_showdown_after_all_in() {
    let mut table = seated(&[1000, 40]);
    table.start_hand(&mut rng()).unwrap();

    let sb = table.current_hand.as_ref().unwrap().small_blind_seat;
    let bb = table.current_hand.as_ref().unwrap().big_blind_seat;
    table.process_action(sb, ActionKind::Call, None).unwrap();
    table.process_action(bb, ActionKind::Check, None).unwrap();

    // Flop: the short stack shoves, the other calls, nobody can act again.
    let actor = table.current_hand.as_ref().unwrap().current_actor.unwrap();
    let other = if actor == sb { bb } else { sb };
    let stack = table.seats[actor as usize].stack;
    let hand = table.current_hand.as_ref().unwrap();
    table.process_action(actor, ActionKind::Raise, Some(hand.max_raise_to(actor, stack))).unwrap();
    let events = table.process_action(other, ActionKind::Call, None).unwrap();

    assert!(
        !events.iter().any(|e| matches!(e, HandEvent::ActionRequested { .. })),
        "no further action is requested once both players are all-in"
    );
    assert!(events.iter().any(|e| matches!(e, HandEvent::StreetAdvanced { street: Street::River, .. })));
    assert!(events.iter().any(|e| matches!(e, HandEvent::Showdown(_))));
    assert!(table.current_hand.is_none());
}
