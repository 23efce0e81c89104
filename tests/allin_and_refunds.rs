//! All-in mechanics: fast-forward runouts, uncalled-bet refunds, and the
//! no-reopen rule for short all-ins.

mod common;

use common::{act, chips_in_play, engine, seat, seat_id};
use holdem_core::engine::NextHandCommand;
use holdem_core::game::entities::{ActionKind, Street, Winner};
use holdem_core::game::errors::{DomainError, EngineError};

#[tokio::test]
async fn heads_up_all_in_call_runs_out_to_showdown() {
    let engine = engine(2);
    let snapshot = engine.start_game(600, 1_000).await.unwrap();

    let snapshot = act(&engine, &snapshot, 1, ActionKind::AllIn, None)
        .await
        .unwrap();
    assert_eq!(snapshot.hand.current_max_bet, 1_000);
    assert_eq!(snapshot.hand.current_player_turn_id, seat_id(&snapshot, 0));

    let snapshot = act(&engine, &snapshot, 0, ActionKind::Call, None)
        .await
        .unwrap();

    // Both stacks are in and equal; the board runs out with no betting.
    assert_eq!(snapshot.hand.current_round, Street::Showdown);
    assert_eq!(snapshot.hand.pot_amount, 2_000);
    assert_eq!(seat(&snapshot, 0).amount, 0);
    assert_eq!(seat(&snapshot, 1).amount, 0);
    assert_eq!(seat(&snapshot, 0).action, ActionKind::AllIn);
    assert_eq!(seat(&snapshot, 1).action, ActionKind::AllIn);
    assert_eq!(chips_in_play(&snapshot), 2_000);
}

#[tokio::test]
async fn uncalled_surplus_is_returned_to_the_all_in_player() {
    let engine = engine(3);
    let snapshot = engine.start_game(600, 800).await.unwrap();

    // Hand 1: fold around to the big blind to set up uneven stacks.
    let snapshot = act(&engine, &snapshot, 0, ActionKind::Fold, None)
        .await
        .unwrap();
    let snapshot = act(&engine, &snapshot, 1, ActionKind::Fold, None)
        .await
        .unwrap();
    assert_eq!(snapshot.hand.current_round, Street::Showdown);
    // The big blind's unmatched 50 went back; only the dead small blind is
    // contested.
    assert_eq!(snapshot.hand.pot_amount, 100);
    assert_eq!(seat(&snapshot, 2).amount, 750);

    let snapshot = engine
        .next_hand(NextHandCommand {
            game_id: snapshot.hand.game_id,
            last_hand_id: snapshot.hand.id,
            winners: vec![
                Winner {
                    id: seat_id(&snapshot, 2),
                    amount: 100,
                },
                Winner {
                    id: seat_id(&snapshot, 1),
                    amount: 4_200,
                },
            ],
            game_level: 1,
            rebuy_players: vec![],
        })
        .await
        .unwrap();

    // Hand 2: button seat 1, small blind seat 2, big blind seat 0.
    assert_eq!(snapshot.hand.dealer, seat_id(&snapshot, 1));
    assert_eq!(snapshot.hand.small_blind, Some(seat_id(&snapshot, 2)));
    assert_eq!(snapshot.hand.big_blind, seat_id(&snapshot, 0));
    assert_eq!(seat(&snapshot, 1).amount, 4_950);
    // Seat 0 paid the table ante plus the big blind.
    assert_eq!(seat(&snapshot, 0).amount, 600);
    assert_eq!(seat(&snapshot, 2).amount, 800);
    let table_total = chips_in_play(&snapshot);

    let snapshot = act(&engine, &snapshot, 1, ActionKind::AllIn, None)
        .await
        .unwrap();
    assert_eq!(snapshot.hand.current_max_bet, 4_950);

    // Small blind calls for far less than the shove.
    let snapshot = act(&engine, &snapshot, 2, ActionKind::Call, None)
        .await
        .unwrap();
    assert_eq!(seat(&snapshot, 2).action, ActionKind::AllIn);
    assert_eq!(seat(&snapshot, 2).action_amount, 850);
    // A call for less never moves the price.
    assert_eq!(snapshot.hand.current_max_bet, 4_950);

    let snapshot = act(&engine, &snapshot, 0, ActionKind::Fold, None)
        .await
        .unwrap();

    // Nobody could match 4950; the shove is capped at the 850 that got
    // called and the surplus returns to the shover.
    assert_eq!(snapshot.hand.current_round, Street::Showdown);
    assert_eq!(snapshot.hand.current_max_bet, 850);
    assert_eq!(seat(&snapshot, 1).amount, 4_100);
    assert_eq!(seat(&snapshot, 1).action_amount, 850);
    assert_eq!(seat(&snapshot, 1).all_bet_sum, 850);
    assert_eq!(snapshot.hand.pot_amount, 1_800);
    assert_eq!(chips_in_play(&snapshot), table_total);
}

#[tokio::test]
async fn folding_out_an_overbet_refunds_the_unmatched_part() {
    let engine = engine(3);
    let snapshot = engine.start_game(600, 5_000).await.unwrap();

    let snapshot = act(&engine, &snapshot, 0, ActionKind::Raise, Some(4_000))
        .await
        .unwrap();
    let snapshot = act(&engine, &snapshot, 1, ActionKind::Fold, None)
        .await
        .unwrap();
    let snapshot = act(&engine, &snapshot, 2, ActionKind::AllIn, None)
        .await
        .unwrap();
    assert_eq!(snapshot.hand.current_max_bet, 5_000);
    assert_eq!(snapshot.hand.current_player_turn_id, seat_id(&snapshot, 0));

    let snapshot = act(&engine, &snapshot, 0, ActionKind::Fold, None)
        .await
        .unwrap();

    // The shove was only matched up to the opener's 4000; the last 1000
    // returns and the hand is decided.
    assert_eq!(snapshot.hand.current_round, Street::Showdown);
    assert_eq!(snapshot.hand.current_max_bet, 4_000);
    assert_eq!(seat(&snapshot, 2).amount, 1_000);
    assert_eq!(snapshot.hand.pot_amount, 8_050);
    assert_eq!(chips_in_play(&snapshot), 15_000);
}

#[tokio::test]
async fn short_all_in_does_not_reopen_the_betting() {
    let engine = engine(3);
    let snapshot = engine.start_game(600, 400).await.unwrap();

    // Hand 1: fold around, then reshape the stacks.
    let snapshot = act(&engine, &snapshot, 0, ActionKind::Fold, None)
        .await
        .unwrap();
    let snapshot = act(&engine, &snapshot, 1, ActionKind::Fold, None)
        .await
        .unwrap();
    let snapshot = engine
        .next_hand(NextHandCommand {
            game_id: snapshot.hand.game_id,
            last_hand_id: snapshot.hand.id,
            winners: vec![
                Winner {
                    id: seat_id(&snapshot, 2),
                    amount: 100,
                },
                Winner {
                    id: seat_id(&snapshot, 1),
                    amount: 1_000,
                },
            ],
            game_level: 1,
            rebuy_players: vec![],
        })
        .await
        .unwrap();

    // Hand 2: seat 1 opens with a raise, the small blind shoves short.
    assert_eq!(seat(&snapshot, 1).amount, 1_350);
    assert_eq!(seat(&snapshot, 2).amount, 400);
    let snapshot = act(&engine, &snapshot, 1, ActionKind::Raise, Some(300))
        .await
        .unwrap();
    assert_eq!(snapshot.hand.last_raise_amount, 200);

    let snapshot = act(&engine, &snapshot, 2, ActionKind::AllIn, None)
        .await
        .unwrap();
    // The shove lifts the price to 450 but is 50 short of a full raise:
    // the last raise anchor must not move.
    assert_eq!(snapshot.hand.current_max_bet, 450);
    assert_eq!(snapshot.hand.last_raise_amount, 200);

    let snapshot = act(&engine, &snapshot, 0, ActionKind::Call, None)
        .await
        .unwrap();
    assert_eq!(seat(&snapshot, 0).action, ActionKind::AllIn);

    // Back on the opener, who already acted: call or fold only.
    assert_eq!(snapshot.hand.current_player_turn_id, seat_id(&snapshot, 1));
    assert!(snapshot.player_actions.is_can_call);
    assert!(!snapshot.player_actions.is_can_raise);
    assert!(!snapshot.player_actions.is_can_re_raise);

    let err = act(&engine, &snapshot, 1, ActionKind::Raise, Some(700))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Domain(DomainError::RaiseNotReopened)
    ));

    let snapshot = act(&engine, &snapshot, 1, ActionKind::Call, None)
        .await
        .unwrap();
    assert_eq!(snapshot.hand.current_round, Street::Showdown);
    assert_eq!(snapshot.hand.pot_amount, 1_200);
}
