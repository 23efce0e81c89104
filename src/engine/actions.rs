//! The action processor: validate one player action and apply it.
//!
//! Every mutation funnels through [`apply_action`]: stack and pot deltas,
//! hand counters, the append-only log entry. Turn choice and street
//! advancement happen afterwards in the advancer.

use chrono::Utc;
use uuid::Uuid;

use crate::db::store::StoreTx;
use crate::game::entities::{ActionKind, Chips, Hand, HandAction, Player, Street};
use crate::game::errors::{DomainError, EngineError, EngineResult, Entity};

/// Where an action came from. Synthesized blind posts skip turn and sizing
/// checks but flow through the same accounting as player decisions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ActionSource {
    Player,
    Blind,
}

/// Validate and apply one action. The caller has already verified the
/// player/hand/game relationship and (for player actions) the turn.
pub(crate) async fn apply_action(
    tx: &mut (dyn StoreTx + '_),
    hand: &Hand,
    player: &Player,
    kind: ActionKind,
    bet_amount: Option<Chips>,
    source: ActionSource,
) -> EngineResult<()> {
    let mut hand = hand.clone();
    let mut player = player.clone();

    let committed = tx
        .player_street_total(hand.id, player.id, hand.current_round)
        .await?;
    let (next_betting_round, next_order) = match tx.last_action(hand.id).await? {
        Some(last) => (last.betting_round + 1, last.action_order + 1),
        None => (1, 1),
    };

    // How many chips leave the stack, and the label that ends up in the log
    // and on the player row.
    let (paid, logged) = match kind {
        ActionKind::Bet => {
            let amount = bet_amount.ok_or(DomainError::BetAmountRequired)?;
            if source == ActionSource::Player {
                if hand.current_max_bet > 0 {
                    return Err(DomainError::BetNotAllowed.into());
                }
                if amount < hand.big_blind_amount && amount < player.amount {
                    return Err(DomainError::BetTooSmall {
                        minimum: hand.big_blind_amount,
                    }
                    .into());
                }
                if amount > player.amount {
                    return Err(DomainError::InsufficientChips {
                        available: player.amount,
                        required: amount,
                    }
                    .into());
                }
            }
            let paid = amount.min(player.amount);
            let new_total = committed + paid;
            hand.current_max_bet = new_total;
            hand.last_raise_amount = new_total;
            hand.last_raise_order = Some(next_order);
            let logged = if paid == player.amount {
                ActionKind::AllIn
            } else {
                ActionKind::Bet
            };
            (paid, logged)
        }
        ActionKind::Raise | ActionKind::ReRaise => {
            let amount = bet_amount.ok_or(DomainError::BetAmountRequired)?;
            let prev_max = hand.current_max_bet;
            if source == ActionSource::Player {
                if prev_max == 0 {
                    return Err(DomainError::RaiseNotAllowed.into());
                }
                if !betting_reopened_for(tx, &hand, player.id).await? {
                    return Err(DomainError::RaiseNotReopened.into());
                }
                if amount < hand.min_raise_target() {
                    return Err(DomainError::RaiseTooSmall {
                        minimum: hand.min_raise_target(),
                    }
                    .into());
                }
                if amount - committed > player.amount {
                    return Err(DomainError::InsufficientChips {
                        available: player.amount,
                        required: amount - committed,
                    }
                    .into());
                }
            }
            let paid = (amount - committed).min(player.amount);
            let new_total = committed + paid;
            hand.current_max_bet = new_total.max(prev_max);
            // A forced big-blind post counts as a full opening bet; a
            // voluntary raise records its increment over the previous top.
            hand.last_raise_amount = match source {
                ActionSource::Blind => new_total,
                ActionSource::Player => new_total - prev_max,
            };
            hand.last_raise_order = Some(next_order);
            let logged = if player.amount == paid {
                ActionKind::AllIn
            } else {
                kind
            };
            (paid, logged)
        }
        ActionKind::Call => {
            if hand.current_max_bet == 0 {
                return Err(DomainError::NothingToCall.into());
            }
            let owed = hand.current_max_bet - committed;
            if owed <= 0 {
                return Err(DomainError::NothingToCall.into());
            }
            let paid = owed.min(player.amount);
            hand.last_call_amount = paid;
            let logged = if player.amount <= owed {
                ActionKind::AllIn
            } else {
                ActionKind::Call
            };
            (paid, logged)
        }
        ActionKind::Check => {
            if hand.current_max_bet - committed != 0 {
                return Err(DomainError::CheckNotAllowed.into());
            }
            (0, ActionKind::Check)
        }
        ActionKind::Fold => (0, ActionKind::Fold),
        ActionKind::AllIn => {
            if player.amount == 0 {
                return Err(DomainError::InsufficientChips {
                    available: 0,
                    required: 1,
                }
                .into());
            }
            let paid = player.amount;
            let new_total = committed + paid;
            if new_total > hand.current_max_bet {
                let increment = new_total - hand.current_max_bet;
                let full_raise = hand.last_raise_amount.max(hand.big_blind_amount);
                if hand.current_max_bet == 0 || increment >= full_raise {
                    hand.last_raise_amount = if hand.current_max_bet == 0 {
                        new_total
                    } else {
                        increment
                    };
                    hand.last_raise_order = Some(next_order);
                }
                // A short all-in still lifts the amount to call, but does
                // not reopen the betting.
                hand.current_max_bet = new_total;
            }
            (paid, ActionKind::AllIn)
        }
        ActionKind::None => return Err(DomainError::UnsupportedAction.into()),
    };

    player.amount -= paid;
    player.action_amount = committed + paid;
    player.all_bet_sum += paid;
    player.action = logged;
    hand.pot_amount += paid;

    let entry = HandAction {
        id: Uuid::new_v4(),
        hand_id: hand.id,
        player_id: player.id,
        round: hand.current_round,
        betting_round: next_betting_round,
        action_order: next_order,
        action_type: logged,
        bet_amount: paid,
        created_at: Utc::now(),
    };

    tx.update_player(&player).await?;
    tx.update_hand(&hand).await?;
    tx.insert_action(&entry).await?;

    log::debug!(
        "hand {} #{}: {} {} {} (pot {})",
        hand.id,
        next_order,
        player.name,
        logged,
        paid,
        hand.pot_amount
    );
    Ok(())
}

/// Whether the betting has been reopened for this player: they have not yet
/// acted voluntarily this street, or a full bet/raise arrived after their
/// last voluntary action. A short all-in in between does not count.
pub(crate) async fn betting_reopened_for(
    tx: &mut (dyn StoreTx + '_),
    hand: &Hand,
    player_id: Uuid,
) -> EngineResult<bool> {
    let last_voluntary = last_voluntary_order(tx, hand, player_id).await?;
    Ok(match (last_voluntary, hand.last_raise_order) {
        (None, _) => true,
        (Some(_), None) => true,
        (Some(own), Some(raise)) => own < raise,
    })
}

/// The highest `action_order` of this player's voluntary actions on the
/// current street, if any.
pub(crate) async fn last_voluntary_order(
    tx: &mut (dyn StoreTx + '_),
    hand: &Hand,
    player_id: Uuid,
) -> EngineResult<Option<i64>> {
    let actions = tx.actions_for_round(hand.id, hand.current_round).await?;
    Ok(actions
        .iter()
        .filter(|a| a.player_id == player_id && a.is_voluntary(hand))
        .map(|a| a.action_order)
        .max())
}

/// Fetch a hand or fail with a typed not-found error.
pub(crate) async fn require_hand(
    tx: &mut (dyn StoreTx + '_),
    hand_id: Uuid,
) -> EngineResult<Hand> {
    tx.hand(hand_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(Entity::Hand, hand_id.to_string()))
}

/// Fetch a player or fail with a typed not-found error.
pub(crate) async fn require_player(
    tx: &mut (dyn StoreTx + '_),
    player_id: Uuid,
) -> EngineResult<Player> {
    tx.player(player_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(Entity::Player, player_id.to_string()))
}

/// Per-player chip totals for one street of a hand, from the action log.
pub(crate) async fn street_commitments(
    tx: &mut (dyn StoreTx + '_),
    hand_id: Uuid,
    round: Street,
) -> EngineResult<Vec<(Uuid, Chips)>> {
    let mut totals: Vec<(Uuid, Chips)> = Vec::new();
    for action in tx.actions_for_round(hand_id, round).await? {
        match totals.iter_mut().find(|(id, _)| *id == action.player_id) {
            Some((_, total)) => *total += action.bet_amount,
            None => totals.push((action.player_id, action.bet_amount)),
        }
    }
    Ok(totals)
}
