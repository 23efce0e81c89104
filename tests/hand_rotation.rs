//! Between-hand mechanics: button rotation, the dead small blind,
//! eliminations, rebuys, and blind level bumps.

mod common;

use common::{act, engine, engine_with_levels, seat, seat_id};
use holdem_core::engine::NextHandCommand;
use holdem_core::game::entities::{ActionKind, Street, Winner};
use holdem_core::game::errors::{DomainError, EngineError};

/// Bust the big blind (seat 2) in the first hand of a three-handed game and
/// return the settled snapshot.
async fn bust_seat_two(
    engine: &holdem_core::engine::Engine,
) -> holdem_core::game::entities::Snapshot {
    let snapshot = engine.start_game(600, 10_000).await.unwrap();
    let snapshot = act(engine, &snapshot, 0, ActionKind::AllIn, None)
        .await
        .unwrap();
    let snapshot = act(engine, &snapshot, 1, ActionKind::Fold, None)
        .await
        .unwrap();
    let snapshot = act(engine, &snapshot, 2, ActionKind::Call, None)
        .await
        .unwrap();
    assert_eq!(snapshot.hand.current_round, Street::Showdown);
    assert_eq!(snapshot.hand.pot_amount, 20_050);
    snapshot
}

#[tokio::test]
async fn busting_the_blind_seat_kills_the_next_small_blind() {
    let engine = engine(3);
    let snapshot = bust_seat_two(&engine).await;

    let snapshot = engine
        .next_hand(NextHandCommand {
            game_id: snapshot.hand.game_id,
            last_hand_id: snapshot.hand.id,
            winners: vec![Winner {
                id: seat_id(&snapshot, 0),
                amount: 20_050,
            }],
            game_level: 1,
            rebuy_players: vec![],
        })
        .await
        .unwrap();

    // Seat 2 busted exactly last hand: its slot blocks the small blind.
    assert!(!seat(&snapshot, 2).is_active);
    assert_eq!(snapshot.hand.dealer, seat_id(&snapshot, 1));
    assert_eq!(snapshot.hand.small_blind, None);
    assert_eq!(snapshot.hand.big_blind, seat_id(&snapshot, 0));
    assert_eq!(snapshot.hand.current_player_turn_id, seat_id(&snapshot, 1));

    // Only the big blind posted; it also paid the table ante.
    assert_eq!(snapshot.hand.pot_amount, 100);
    assert_eq!(seat(&snapshot, 0).amount, 19_850);

    // The price still has to be matched by the opener.
    let choices = snapshot.player_actions;
    assert!(choices.is_can_call);
    assert!(choices.is_can_fold);
    assert!(choices.is_can_raise);
    assert!(!choices.is_can_check);
    assert!(!choices.is_can_bet);

    // And the blind keeps the option behind a limp.
    let snapshot = act(&engine, &snapshot, 1, ActionKind::Call, None)
        .await
        .unwrap();
    assert_eq!(snapshot.hand.current_player_turn_id, seat_id(&snapshot, 0));
    assert!(snapshot.player_actions.is_can_check);
    assert!(snapshot.player_actions.is_can_raise);
}

#[tokio::test]
async fn busted_seat_is_skipped_once_the_next_hand_passes() {
    let engine = engine(3);
    let snapshot = bust_seat_two(&engine).await;
    let game_id = snapshot.hand.game_id;

    let snapshot = engine
        .next_hand(NextHandCommand {
            game_id,
            last_hand_id: snapshot.hand.id,
            winners: vec![Winner {
                id: seat_id(&snapshot, 0),
                amount: 20_050,
            }],
            game_level: 1,
            rebuy_players: vec![],
        })
        .await
        .unwrap();

    // Settle hand 2 quickly: fold to the blind.
    let snapshot = act(&engine, &snapshot, 1, ActionKind::Fold, None)
        .await
        .unwrap();
    assert_eq!(snapshot.hand.current_round, Street::Showdown);

    let snapshot = engine
        .next_hand(NextHandCommand {
            game_id,
            last_hand_id: snapshot.hand.id,
            winners: vec![Winner {
                id: seat_id(&snapshot, 0),
                amount: snapshot.hand.pot_amount,
            }],
            game_level: 1,
            rebuy_players: vec![],
        })
        .await
        .unwrap();

    // A hand has passed since the bust: the dead seat is now simply
    // skipped and both blinds are posted again, heads-up.
    assert_eq!(snapshot.hand.dealer, seat_id(&snapshot, 0));
    assert_eq!(snapshot.hand.small_blind, Some(seat_id(&snapshot, 1)));
    assert_eq!(snapshot.hand.big_blind, seat_id(&snapshot, 0));
    assert_eq!(snapshot.hand.pot_amount, 150);
}

#[tokio::test]
async fn rebuy_restores_a_busted_seat_for_the_next_hand() {
    let engine = engine(3);
    let snapshot = bust_seat_two(&engine).await;
    let game_id = snapshot.hand.game_id;

    let snapshot = engine
        .next_hand(NextHandCommand {
            game_id,
            last_hand_id: snapshot.hand.id,
            winners: vec![Winner {
                id: seat_id(&snapshot, 0),
                amount: 20_050,
            }],
            game_level: 1,
            rebuy_players: vec![],
        })
        .await
        .unwrap();

    // Mid-hand rebuy: the stack is restored but the seat sits this one out.
    let snapshot = engine
        .rebuy(game_id, snapshot.hand.id, seat_id(&snapshot, 2))
        .await
        .unwrap();
    assert_eq!(seat(&snapshot, 2).amount, 10_000);
    assert!(seat(&snapshot, 2).is_active);
    assert_eq!(seat(&snapshot, 2).action, ActionKind::Fold);
    assert_eq!(seat(&snapshot, 2).inactive_time_hand_id, None);

    // Fold the hand out and deal again: the rebought seat plays.
    let snapshot = act(&engine, &snapshot, 1, ActionKind::Fold, None)
        .await
        .unwrap();
    let snapshot = engine
        .next_hand(NextHandCommand {
            game_id,
            last_hand_id: snapshot.hand.id,
            winners: vec![Winner {
                id: seat_id(&snapshot, 0),
                amount: snapshot.hand.pot_amount,
            }],
            game_level: 1,
            rebuy_players: vec![],
        })
        .await
        .unwrap();
    assert_eq!(seat(&snapshot, 2).action, ActionKind::None);
    // The rebought seat takes the button it was due.
    assert_eq!(snapshot.hand.dealer, seat_id(&snapshot, 2));
    assert_eq!(snapshot.hand.small_blind, Some(seat_id(&snapshot, 0)));
    assert_eq!(snapshot.hand.big_blind, seat_id(&snapshot, 1));
}

#[tokio::test]
async fn rebuy_is_refused_for_seats_with_chips() {
    let engine = engine(3);
    let snapshot = engine.start_game(600, 10_000).await.unwrap();
    let err = engine
        .rebuy(snapshot.hand.game_id, snapshot.hand.id, seat_id(&snapshot, 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Domain(DomainError::RebuyNotAllowed)
    ));
}

#[tokio::test]
async fn rebuy_list_on_next_hand_reseats_the_player() {
    let engine = engine(3);
    let snapshot = bust_seat_two(&engine).await;

    let snapshot = engine
        .next_hand(NextHandCommand {
            game_id: snapshot.hand.game_id,
            last_hand_id: snapshot.hand.id,
            winners: vec![Winner {
                id: seat_id(&snapshot, 0),
                amount: 20_050,
            }],
            game_level: 1,
            rebuy_players: vec![seat_id(&snapshot, 2)],
        })
        .await
        .unwrap();

    // Restored before rotation: all three seats play and the blinds are
    // live again.
    assert!(seat(&snapshot, 2).is_active);
    assert_eq!(seat(&snapshot, 2).inactive_time_hand_id, None);
    assert_eq!(snapshot.hand.dealer, seat_id(&snapshot, 1));
    assert_eq!(snapshot.hand.small_blind, Some(seat_id(&snapshot, 2)));
    assert_eq!(snapshot.hand.big_blind, seat_id(&snapshot, 0));
}

#[tokio::test]
async fn next_hand_applies_the_new_blind_level() {
    let engine = engine_with_levels(4, vec![(1, 50, 100, 100), (2, 100, 200, 200)]);
    let snapshot = engine.start_game(600, 10_000).await.unwrap();

    let snapshot = act(&engine, &snapshot, 3, ActionKind::Fold, None)
        .await
        .unwrap();
    let snapshot = act(&engine, &snapshot, 0, ActionKind::Fold, None)
        .await
        .unwrap();
    let snapshot = act(&engine, &snapshot, 1, ActionKind::Fold, None)
        .await
        .unwrap();
    assert_eq!(snapshot.hand.current_round, Street::Showdown);

    let snapshot = engine
        .next_hand(NextHandCommand {
            game_id: snapshot.hand.game_id,
            last_hand_id: snapshot.hand.id,
            winners: vec![Winner {
                id: seat_id(&snapshot, 2),
                amount: snapshot.hand.pot_amount,
            }],
            game_level: 2,
            rebuy_players: vec![],
        })
        .await
        .unwrap();

    assert_eq!(snapshot.level, 2);
    assert_eq!(snapshot.hand.level, 2);
    assert_eq!(snapshot.hand.small_blind_amount, 100);
    assert_eq!(snapshot.hand.big_blind_amount, 200);
    assert_eq!(snapshot.hand.ante, 200);
    assert_eq!(snapshot.hand.pot_amount, 300);
    // New positions: the button moved one live seat on.
    assert_eq!(snapshot.hand.dealer, seat_id(&snapshot, 1));
    assert_eq!(snapshot.hand.small_blind, Some(seat_id(&snapshot, 2)));
    assert_eq!(snapshot.hand.big_blind, seat_id(&snapshot, 3));
    assert_eq!(snapshot.hand.current_player_turn_id, seat_id(&snapshot, 0));
}
