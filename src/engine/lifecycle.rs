//! Hand lifecycle: seating, button and blind rotation, blind posting.
//!
//! Seats are an ordered array; rotation scans `(i + 1) % n` skipping
//! inactive seats. A seat that busted exactly last hand blocks the small
//! blind slot without receiving it (dead small blind).

use uuid::Uuid;

use crate::db::store::StoreTx;
use crate::game::entities::{ActionKind, Game, GameBlind, Hand, HandId, Player, PlayerId, Street};
use crate::game::errors::{DomainError, EngineResult};

use super::{actions, actions::ActionSource, advancer};

/// The four anchor seats of a hand.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct HandSeats {
    pub dealer: PlayerId,
    pub small_blind: Option<PlayerId>,
    pub big_blind: PlayerId,
    pub first_to_act: PlayerId,
}

fn next_active_idx(players: &[Player], from: usize) -> Option<usize> {
    let n = players.len();
    (1..=n).map(|k| (from + k) % n).find(|&i| players[i].is_active)
}

fn require_two_active(players: &[Player]) -> EngineResult<()> {
    if players.iter().filter(|p| p.is_active).count() < 2 {
        return Err(DomainError::HandCannotStart("fewer than two active seats".into()).into());
    }
    Ok(())
}

/// Positions for the first hand of a game: the button starts on the first
/// active seat and the blinds follow in seat order.
pub(crate) fn opening_seats(players: &[Player]) -> EngineResult<HandSeats> {
    require_two_active(players)?;
    let dealer_idx = players
        .iter()
        .position(|p| p.is_active)
        .ok_or_else(|| DomainError::HandCannotStart("no active seats".into()))?;
    let sb_idx = next_active_idx(players, dealer_idx)
        .ok_or_else(|| DomainError::HandCannotStart("no seat for the small blind".into()))?;
    let bb_idx = next_active_idx(players, sb_idx)
        .ok_or_else(|| DomainError::HandCannotStart("no seat for the big blind".into()))?;
    let first_idx = next_active_idx(players, bb_idx)
        .ok_or_else(|| DomainError::HandCannotStart("no seat to open the action".into()))?;
    Ok(HandSeats {
        dealer: players[dealer_idx].id,
        small_blind: Some(players[sb_idx].id),
        big_blind: players[bb_idx].id,
        first_to_act: players[first_idx].id,
    })
}

/// Positions for a follow-up hand, rotated from the previous dealer.
pub(crate) fn rotated_seats(
    players: &[Player],
    prev_dealer: PlayerId,
    last_hand: HandId,
) -> EngineResult<HandSeats> {
    require_two_active(players)?;
    let n = players.len();
    let prev_idx = players
        .iter()
        .position(|p| p.id == prev_dealer)
        .ok_or_else(|| DomainError::HandCannotStart("previous dealer seat missing".into()))?;
    let dealer_idx = next_active_idx(players, prev_idx)
        .ok_or_else(|| DomainError::HandCannotStart("no seat for the button".into()))?;

    // Scan for the small blind. A seat that busted exactly last hand kills
    // the small blind for this hand; longer-dead seats are simply skipped.
    let mut small_blind_idx = None;
    let mut anchor = dealer_idx;
    for k in 1..=n {
        let i = (dealer_idx + k) % n;
        if players[i].is_active {
            small_blind_idx = Some(i);
            anchor = i;
            break;
        }
        if players[i].inactive_time_hand_id == Some(last_hand) {
            anchor = i;
            break;
        }
    }

    let bb_idx = next_active_idx(players, anchor)
        .ok_or_else(|| DomainError::HandCannotStart("no seat for the big blind".into()))?;
    let first_idx = next_active_idx(players, bb_idx)
        .ok_or_else(|| DomainError::HandCannotStart("no seat to open the action".into()))?;
    Ok(HandSeats {
        dealer: players[dealer_idx].id,
        small_blind: small_blind_idx.map(|i| players[i].id),
        big_blind: players[bb_idx].id,
        first_to_act: players[first_idx].id,
    })
}

/// Create and persist a fresh preflop hand with zeroed counters.
pub(crate) async fn deal_hand(
    tx: &mut (dyn StoreTx + '_),
    game: &Game,
    blind: &GameBlind,
    seats: &HandSeats,
) -> EngineResult<Hand> {
    let hand = Hand {
        id: Uuid::new_v4(),
        game_id: game.id,
        level: game.level,
        dealer: seats.dealer,
        small_blind: seats.small_blind,
        big_blind: seats.big_blind,
        current_player_turn_id: seats.first_to_act,
        pot_amount: 0,
        ante: blind.ante,
        small_blind_amount: blind.small_blind_amount,
        big_blind_amount: blind.big_blind_amount,
        last_call_amount: 0,
        current_max_bet: 0,
        last_raise_amount: 0,
        last_raise_order: None,
        current_round: Street::Preflop,
        is_changed_current_round: false,
    };
    tx.insert_hand(&hand).await?;
    Ok(hand)
}

/// Synthesize the blind posts through the normal action processor, so pot,
/// max bet and last raise come out identical to in-game actions.
pub(crate) async fn post_blinds(tx: &mut (dyn StoreTx + '_), hand_id: HandId) -> EngineResult<()> {
    let hand = actions::require_hand(tx, hand_id).await?;
    if let Some(small_blind) = hand.small_blind {
        let poster = actions::require_player(tx, small_blind).await?;
        actions::apply_action(
            tx,
            &hand,
            &poster,
            ActionKind::Bet,
            Some(hand.small_blind_amount),
            ActionSource::Blind,
        )
        .await?;
        advancer::advance(tx, hand_id).await?;
    }

    let hand = actions::require_hand(tx, hand_id).await?;
    let poster = actions::require_player(tx, hand.big_blind).await?;
    actions::apply_action(
        tx,
        &hand,
        &poster,
        ActionKind::Raise,
        Some(hand.big_blind_amount),
        ActionSource::Blind,
    )
    .await?;
    advancer::advance(tx, hand_id).await?;
    Ok(())
}

/// Debit the ante from the big blind's stack. House rule: the big blind
/// pays the full ante for the table, and the ante does not enter the pot.
pub(crate) async fn collect_ante(
    tx: &mut (dyn StoreTx + '_),
    big_blind: PlayerId,
    ante: i64,
) -> EngineResult<()> {
    if ante <= 0 {
        return Ok(());
    }
    let mut poster = actions::require_player(tx, big_blind).await?;
    let paid = ante.min(poster.amount);
    poster.amount -= paid;
    tx.update_player(&poster).await?;
    Ok(())
}

/// Mark every seat that ran out of chips this hand as out of the
/// tournament, remembering the hand so the next rotation can account for
/// the freshly vacated slot.
pub(crate) async fn eliminate_busted(
    tx: &mut (dyn StoreTx + '_),
    game_id: Uuid,
    last_hand: HandId,
) -> EngineResult<()> {
    let players = tx.players_by_game(game_id).await?;
    for player in players {
        if player.amount == 0 && player.inactive_time_hand_id.is_none() {
            let mut busted = player;
            busted.is_active = false;
            busted.inactive_time_hand_id = Some(last_hand);
            tx.update_player(&busted).await?;
            log::info!("game {}: {} eliminated", game_id, busted.name);
        }
    }
    Ok(())
}

/// Restore a busted seat to a full starting stack.
pub(crate) async fn restore_seat(
    tx: &mut (dyn StoreTx + '_),
    player: &Player,
    chips: i64,
    sit_out_current_hand: bool,
) -> EngineResult<()> {
    let mut restored = player.clone();
    restored.amount = chips;
    restored.is_active = true;
    restored.inactive_time_hand_id = None;
    restored.action_amount = 0;
    restored.all_bet_sum = 0;
    // A mid-hand rebuy may not join a pot it never contested.
    restored.action = if sit_out_current_hand {
        ActionKind::Fold
    } else {
        ActionKind::None
    };
    tx.update_player(&restored).await?;
    log::info!("{} rebought for {}", restored.name, chips);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn seat(seat: i32, active: bool, busted_at: Option<HandId>) -> Player {
        Player {
            id: Uuid::new_v4(),
            game_id: Uuid::new_v4(),
            name: format!("Player {}", seat + 1),
            amount: if active { 1_000 } else { 0 },
            is_online: true,
            is_active: active,
            action: ActionKind::None,
            action_amount: 0,
            all_bet_sum: 0,
            inactive_time_hand_id: busted_at,
            seat,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn opening_positions_follow_seat_order() {
        let players: Vec<Player> = (0..4).map(|i| seat(i, true, None)).collect();
        let seats = opening_seats(&players).unwrap();
        assert_eq!(seats.dealer, players[0].id);
        assert_eq!(seats.small_blind, Some(players[1].id));
        assert_eq!(seats.big_blind, players[2].id);
        assert_eq!(seats.first_to_act, players[3].id);
    }

    #[test]
    fn opening_positions_heads_up() {
        let players: Vec<Player> = (0..2).map(|i| seat(i, true, None)).collect();
        let seats = opening_seats(&players).unwrap();
        assert_eq!(seats.dealer, players[0].id);
        assert_eq!(seats.small_blind, Some(players[1].id));
        assert_eq!(seats.big_blind, players[0].id);
        assert_eq!(seats.first_to_act, players[1].id);
    }

    #[test]
    fn rotation_skips_long_dead_seats() {
        let old_hand = Uuid::new_v4();
        let last_hand = Uuid::new_v4();
        let mut players: Vec<Player> = (0..4).map(|i| seat(i, true, None)).collect();
        players[1] = seat(1, false, Some(old_hand));
        let seats = rotated_seats(&players, players[0].id, last_hand).unwrap();
        assert_eq!(seats.dealer, players[2].id);
        assert_eq!(seats.small_blind, Some(players[3].id));
        assert_eq!(seats.big_blind, players[0].id);
        assert_eq!(seats.first_to_act, players[2].id);
    }

    #[test]
    fn freshly_busted_seat_kills_the_small_blind() {
        let last_hand = Uuid::new_v4();
        let mut players: Vec<Player> = (0..3).map(|i| seat(i, true, None)).collect();
        players[2] = seat(2, false, Some(last_hand));
        let seats = rotated_seats(&players, players[0].id, last_hand).unwrap();
        assert_eq!(seats.dealer, players[1].id);
        assert_eq!(seats.small_blind, None);
        assert_eq!(seats.big_blind, players[0].id);
        assert_eq!(seats.first_to_act, players[1].id);
    }

    #[test]
    fn rotation_requires_two_active_seats() {
        let last_hand = Uuid::new_v4();
        let mut players: Vec<Player> = (0..3).map(|i| seat(i, true, None)).collect();
        players[1] = seat(1, false, Some(last_hand));
        players[2] = seat(2, false, Some(last_hand));
        let err = rotated_seats(&players, players[0].id, last_hand).unwrap_err();
        assert!(matches!(
            err,
            crate::game::errors::EngineError::Domain(DomainError::HandCannotStart(_))
        ));
    }
}
