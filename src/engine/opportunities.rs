//! Legal-action calculation for the player on turn.

use crate::db::store::StoreTx;
use crate::game::entities::{ActionChoices, ActionKind, Hand, Player, Street};
use crate::game::errors::EngineResult;

/// Compute the action set offered to `player`, who holds the turn.
pub(crate) async fn compute(
    tx: &mut (dyn StoreTx + '_),
    hand: &Hand,
    player: &Player,
) -> EngineResult<ActionChoices> {
    if !hand.current_round.is_betting() {
        return Ok(ActionChoices::default());
    }

    let kinds = tx
        .round_action_kinds(hand.id, hand.current_round)
        .await?;
    let round_actions = tx.actions_for_round(hand.id, hand.current_round).await?;

    let has_bet = kinds.contains(&ActionKind::Bet);
    let has_all_in = kinds.contains(&ActionKind::AllIn);
    // The forced big-blind post is logged as a raise but does not use up
    // the street's one "first raise".
    let has_raise = round_actions
        .iter()
        .any(|a| a.is_voluntary(hand) && matches!(a.action_type, ActionKind::Raise | ActionKind::ReRaise));
    let has_wager = has_bet || has_all_in || hand.current_max_bet > 0;

    let last_voluntary = round_actions
        .iter()
        .filter(|a| a.player_id == player.id && a.is_voluntary(hand))
        .map(|a| a.action_order)
        .max();
    let reopened = match (last_voluntary, hand.last_raise_order) {
        (None, _) | (Some(_), None) => true,
        (Some(own), Some(raise)) => own < raise,
    };

    let raise_min_amount = 2 * hand.current_max_bet;

    // Big blind option: an unraised preflop pot comes back around to the
    // blind with nothing to call. They may close the street with a check or
    // raise themselves.
    let bb_option = hand.current_round == Street::Preflop
        && player.id == hand.big_blind
        && hand.current_max_bet == hand.big_blind_amount
        && player.action_amount == hand.current_max_bet
        && last_voluntary.is_none();
    if bb_option {
        return Ok(ActionChoices {
            is_can_fold: true,
            is_can_call: false,
            is_can_check: true,
            is_can_bet: false,
            is_can_raise: true,
            is_can_re_raise: false,
            is_can_all_in: true,
            bet_min_amount: hand.big_blind_amount,
            raise_min_amount,
            all_in_amount: player.amount,
        });
    }

    Ok(ActionChoices {
        is_can_fold: has_wager,
        is_can_call: has_wager,
        is_can_check: !has_wager,
        is_can_bet: !has_wager,
        is_can_raise: has_wager && !has_raise && reopened,
        is_can_re_raise: has_raise && player.amount > raise_min_amount && reopened,
        is_can_all_in: true,
        bet_min_amount: hand.big_blind_amount,
        raise_min_amount,
        all_in_amount: player.amount,
    })
}
