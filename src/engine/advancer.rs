//! Turn and round advancement.
//!
//! Runs after every applied action: decides whether the betting round is
//! complete, advances the street (or fast-forwards an all-in runout to
//! showdown), and picks the next actor. All facts come from fresh rows and
//! the action log, never from engine-local state.

use uuid::Uuid;

use crate::db::store::StoreTx;
use crate::game::entities::{Chips, Hand, Player, Street};
use crate::game::errors::{DomainError, EngineResult};

use super::{actions, capping};

pub(crate) async fn advance(tx: &mut (dyn StoreTx + '_), hand_id: Uuid) -> EngineResult<()> {
    let mut hand = actions::require_hand(tx, hand_id).await?;
    if hand.is_complete() {
        return Ok(());
    }
    let players = tx.players_by_game(hand.game_id).await?;
    let live: Vec<&Player> = players.iter().filter(|p| p.is_live()).collect();

    // A fold may leave a single contender; the hand is decided.
    if live.len() < 2 {
        return finish_hand(tx, &mut hand).await;
    }

    let live_not_all_in: Vec<&Player> = live
        .iter()
        .copied()
        .filter(|p| p.is_live_not_all_in())
        .collect();
    let commits = actions::street_commitments(tx, hand.id, hand.current_round).await?;
    let committed = |id: Uuid| -> Chips {
        commits
            .iter()
            .find(|(player, _)| *player == id)
            .map(|(_, total)| *total)
            .unwrap_or(0)
    };

    let round_actions = tx.actions_for_round(hand.id, hand.current_round).await?;
    let acted = |id: Uuid| -> bool {
        round_actions
            .iter()
            .any(|a| a.player_id == id && a.is_voluntary(&hand))
    };

    let round_over = match live_not_all_in.as_slice() {
        // Everyone left is all-in; no more betting on any street.
        [] => true,
        // One player can still bet but has no opponent who could call
        // anything further. Done once they have matched the top and acted.
        [lone] => acted(lone.id) && committed(lone.id) >= hand.current_max_bet,
        _ => {
            let everyone_acted = live_not_all_in.iter().all(|p| acted(p.id));
            let equalized = live_not_all_in
                .iter()
                .all(|p| committed(p.id) == hand.current_max_bet);
            everyone_acted && equalized && !hand.is_changed_current_round
        }
    };

    if !round_over {
        // Mid-street: hand the turn to the next seat that can still act.
        let last = tx.last_action(hand.id).await?;
        let anchor = last.map(|a| a.player_id).unwrap_or(hand.dealer);
        let next = next_live_not_all_in_after(&players, anchor)?;
        hand.current_player_turn_id = next;
        hand.is_changed_current_round = false;
        tx.update_hand(&hand).await?;
        return Ok(());
    }

    capping::cap_street(tx, &mut hand).await?;

    // Fewer than two players with chips behind means no betting remains on
    // any later street: run the board out.
    if hand.current_round == Street::River || live_not_all_in.len() < 2 {
        hand.current_round = Street::Showdown;
        tx.update_hand(&hand).await?;
        log::info!("hand {}: betting closed, to showdown", hand.id);
        return Ok(());
    }

    hand.current_round = hand.current_round.next();
    hand.current_max_bet = 0;
    hand.last_raise_amount = 0;
    hand.last_raise_order = None;
    hand.last_call_amount = 0;
    hand.is_changed_current_round = true;
    tx.clear_street_state(hand.game_id).await?;

    let players = tx.players_by_game(hand.game_id).await?;
    let next = next_live_not_all_in_after(&players, hand.dealer)?;
    hand.current_player_turn_id = next;
    tx.update_hand(&hand).await?;
    log::info!("hand {}: advanced to {}", hand.id, hand.current_round);
    Ok(())
}

/// Close the hand: return any uncalled surplus and mark showdown.
async fn finish_hand(tx: &mut (dyn StoreTx + '_), hand: &mut Hand) -> EngineResult<()> {
    capping::cap_street(tx, hand).await?;
    hand.current_round = Street::Showdown;
    tx.update_hand(hand).await?;
    log::info!("hand {}: complete", hand.id);
    Ok(())
}

/// First seat strictly after `anchor` (wrapping) that is live and not
/// all-in.
fn next_live_not_all_in_after(players: &[Player], anchor: Uuid) -> EngineResult<Uuid> {
    let n = players.len();
    let start = players
        .iter()
        .position(|p| p.id == anchor)
        .ok_or_else(|| DomainError::HandCannotStart("anchor seat missing".into()))?;
    (1..=n)
        .map(|k| &players[(start + k) % n])
        .find(|p| p.is_live_not_all_in())
        .map(|p| p.id)
        .ok_or_else(|| DomainError::HandCannotStart("no seat can act".into()).into())
}
