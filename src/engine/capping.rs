//! Uncalled-bet refund ("chip capping").
//!
//! When the street's largest commitment belongs to a single live player and
//! nobody else could match it, the surplus never belonged in the pot: it
//! goes back to their stack before the street closes or the hand ends.
//! Folded commitments stay in the pot but still count toward what was
//! matched.

use crate::db::store::StoreTx;
use crate::game::entities::{Chips, Hand, PlayerId};
use crate::game::errors::EngineResult;

use super::actions;

/// Return the uncalled portion of the street's top commitment, if any.
/// Mutates `hand` (pot, current max bet, last raise) and the refunded
/// player's row; the caller persists the hand.
pub(crate) async fn cap_street(tx: &mut (dyn StoreTx + '_), hand: &mut Hand) -> EngineResult<()> {
    let commits = actions::street_commitments(tx, hand.id, hand.current_round).await?;
    if commits.is_empty() {
        return Ok(());
    }

    let players = tx.players_by_game(hand.game_id).await?;
    let is_live = |id: PlayerId| players.iter().any(|p| p.id == id && p.is_live());

    // Only a live player can have chips in front that nobody called.
    let Some(&(leader, leader_commit)) = commits
        .iter()
        .filter(|(id, _)| is_live(*id))
        .max_by_key(|(_, total)| *total)
    else {
        return Ok(());
    };

    // Everyone else's chips, folded or not, count toward the matched part.
    let matched: Chips = commits
        .iter()
        .filter(|(id, _)| *id != leader)
        .map(|(_, total)| *total)
        .max()
        .unwrap_or(0);
    let refund = leader_commit - matched;
    if refund <= 0 {
        return Ok(());
    }

    let mut player = actions::require_player(tx, leader).await?;
    player.amount += refund;
    player.all_bet_sum -= refund;
    player.action_amount = matched;
    tx.update_player(&player).await?;

    hand.pot_amount -= refund;
    if hand.current_max_bet == leader_commit {
        // The refunded commitment was the street's top; shrink the last
        // raise to what actually got matched.
        let previous_top = hand.current_max_bet - hand.last_raise_amount;
        hand.last_raise_amount = (matched - previous_top).max(0);
        hand.current_max_bet = matched;
    }

    log::debug!(
        "hand {}: returned {} uncalled chips to {} (street top {} -> {})",
        hand.id,
        refund,
        player.name,
        leader_commit,
        matched
    );
    Ok(())
}
