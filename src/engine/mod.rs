//! The betting engine: transactional command handlers over the store.
//!
//! Every command runs in exactly one store transaction. Rule violations and
//! missing references surface as typed errors before anything is written;
//! store failures abort the transaction, so no command is ever
//! half-applied.

mod actions;
mod advancer;
mod capping;
mod lifecycle;
mod opportunities;

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::db::store::{Store, StoreTx};
use crate::game::entities::{
    ActionChoices, ActionKind, Chips, Game, GameId, HandId, Player, PlayerId, Snapshot, Winner,
};
use crate::game::errors::{DomainError, EngineError, EngineResult, Entity};

/// A player action arriving from a client (or a watchdog acting for one).
#[derive(Clone, Debug)]
pub struct PlayerActionCommand {
    pub game_id: GameId,
    pub hand_id: HandId,
    pub player_id: PlayerId,
    pub action: ActionKind,
    pub bet_amount: Option<Chips>,
}

/// Close out a finished hand and deal the next one. Winner shares come from
/// the caller; the engine does not evaluate hands.
#[derive(Clone, Debug)]
pub struct NextHandCommand {
    pub game_id: GameId,
    pub last_hand_id: HandId,
    pub winners: Vec<Winner>,
    pub game_level: i32,
    pub rebuy_players: Vec<PlayerId>,
}

/// The tournament betting core.
pub struct Engine {
    store: Arc<dyn Store>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(store: Arc<dyn Store>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Start a tournament: seed the blind schedule, seat the configured
    /// roster, deal the first hand and post the blinds.
    pub async fn start_game(&self, blind_time: i64, players_chips: Chips) -> EngineResult<Snapshot> {
        let mut tx = self.store.begin().await?;
        if tx.active_game().await?.is_some() {
            return Err(DomainError::GameAlreadyActive.into());
        }

        for level in &self.config.levels {
            tx.upsert_blind(&level.to_blind()).await?;
        }
        let blind = tx
            .blind(1)
            .await?
            .ok_or_else(|| EngineError::NotFound(Entity::BlindLevel, "1".into()))?;

        let now = Utc::now();
        let game = Game {
            id: Uuid::new_v4(),
            blind_time,
            level: 1,
            chips: players_chips,
            start_time: now,
            end_time: None,
        };
        tx.insert_game(&game).await?;

        let mut players = Vec::with_capacity(self.config.seats.len());
        for (i, descriptor) in self.config.seats.iter().enumerate() {
            let player = Player {
                id: Uuid::new_v4(),
                game_id: game.id,
                name: descriptor.name.clone(),
                amount: players_chips,
                is_online: descriptor.is_online,
                is_active: descriptor.is_active,
                action: ActionKind::None,
                action_amount: 0,
                all_bet_sum: 0,
                inactive_time_hand_id: None,
                seat: i as i32,
                created_at: now,
            };
            tx.insert_player(&player).await?;
            players.push(player);
        }

        let seats = lifecycle::opening_seats(&players)?;
        let hand = lifecycle::deal_hand(&mut *tx, &game, &blind, &seats).await?;
        lifecycle::post_blinds(&mut *tx, hand.id).await?;

        let snapshot = assemble_snapshot(&mut *tx, &game, hand.id).await?;
        tx.commit().await?;
        log::info!("game {} started with {} seats", game.id, players.len());
        Ok(snapshot)
    }

    /// End the active game.
    pub async fn end_game(&self, game_id: GameId) -> EngineResult<bool> {
        let mut tx = self.store.begin().await?;
        let mut game = require_game(&mut *tx, game_id).await?;
        if game.end_time.is_none() {
            game.end_time = Some(Utc::now());
            tx.update_game(&game).await?;
        }
        tx.commit().await?;
        log::info!("game {} ended", game_id);
        Ok(true)
    }

    /// Snapshot of the active game, if one is running.
    pub async fn active_game(&self) -> EngineResult<Option<Snapshot>> {
        let mut tx = self.store.begin().await?;
        let Some(game) = tx.active_game().await? else {
            return Ok(None);
        };
        let hand = tx
            .latest_hand(game.id)
            .await?
            .ok_or_else(|| EngineError::NotFound(Entity::Hand, game.id.to_string()))?;
        let snapshot = assemble_snapshot(&mut *tx, &game, hand.id).await?;
        tx.commit().await?;
        Ok(Some(snapshot))
    }

    /// Validate and apply one player action, then advance turn and street.
    pub async fn player_action(&self, cmd: PlayerActionCommand) -> EngineResult<Snapshot> {
        let mut tx = self.store.begin().await?;
        let game = require_game(&mut *tx, cmd.game_id).await?;
        let hand = actions::require_hand(&mut *tx, cmd.hand_id).await?;
        let player = actions::require_player(&mut *tx, cmd.player_id).await?;

        if hand.game_id != cmd.game_id || player.game_id != cmd.game_id {
            return Err(DomainError::GameMismatch.into());
        }
        if !player.is_active {
            return Err(DomainError::InactivePlayer.into());
        }
        if hand.is_complete() {
            return Err(DomainError::HandComplete.into());
        }
        if hand.current_player_turn_id != player.id {
            return Err(DomainError::ConflictingTurn.into());
        }

        actions::apply_action(
            &mut *tx,
            &hand,
            &player,
            cmd.action,
            cmd.bet_amount,
            actions::ActionSource::Player,
        )
        .await?;
        advancer::advance(&mut *tx, hand.id).await?;

        let snapshot = assemble_snapshot(&mut *tx, &game, hand.id).await?;
        tx.commit().await?;
        Ok(snapshot)
    }

    /// Settle the last hand and deal the next one: credit winners, apply
    /// rebuys, bump the level, eliminate busted seats, rotate positions,
    /// collect the ante and post the blinds.
    pub async fn next_hand(&self, cmd: NextHandCommand) -> EngineResult<Snapshot> {
        let mut tx = self.store.begin().await?;
        let mut game = require_game(&mut *tx, cmd.game_id).await?;
        let last_hand = actions::require_hand(&mut *tx, cmd.last_hand_id).await?;
        if last_hand.game_id != cmd.game_id {
            return Err(DomainError::GameMismatch.into());
        }

        for winner in &cmd.winners {
            tx.credit_player(winner.id, winner.amount).await?;
        }
        for rebuy in &cmd.rebuy_players {
            let player = actions::require_player(&mut *tx, *rebuy).await?;
            if player.game_id != cmd.game_id {
                return Err(DomainError::GameMismatch.into());
            }
            lifecycle::restore_seat(&mut *tx, &player, game.chips, false).await?;
        }

        game.level = cmd.game_level;
        tx.update_game(&game).await?;
        let blind = tx
            .blind(cmd.game_level)
            .await?
            .ok_or_else(|| EngineError::NotFound(Entity::BlindLevel, cmd.game_level.to_string()))?;

        lifecycle::eliminate_busted(&mut *tx, cmd.game_id, cmd.last_hand_id).await?;

        let players = tx.players_by_game(cmd.game_id).await?;
        let seats = lifecycle::rotated_seats(&players, last_hand.dealer, cmd.last_hand_id)?;
        let hand = lifecycle::deal_hand(&mut *tx, &game, &blind, &seats).await?;

        lifecycle::collect_ante(&mut *tx, seats.big_blind, blind.ante).await?;
        tx.reset_hand_state(cmd.game_id).await?;
        lifecycle::post_blinds(&mut *tx, hand.id).await?;

        let snapshot = assemble_snapshot(&mut *tx, &game, hand.id).await?;
        tx.commit().await?;
        log::info!(
            "game {}: hand {} dealt at level {}",
            game.id,
            hand.id,
            cmd.game_level
        );
        Ok(snapshot)
    }

    /// Restore a busted seat to a full stack. The seat sits out the rest of
    /// the current hand and is dealt back in on the next one.
    pub async fn rebuy(
        &self,
        game_id: GameId,
        hand_id: HandId,
        player_id: PlayerId,
    ) -> EngineResult<Snapshot> {
        let mut tx = self.store.begin().await?;
        let game = require_game(&mut *tx, game_id).await?;
        let hand = actions::require_hand(&mut *tx, hand_id).await?;
        let player = actions::require_player(&mut *tx, player_id).await?;
        if hand.game_id != game_id || player.game_id != game_id {
            return Err(DomainError::GameMismatch.into());
        }
        if player.is_active || player.amount > 0 {
            return Err(DomainError::RebuyNotAllowed.into());
        }

        lifecycle::restore_seat(&mut *tx, &player, game.chips, !hand.is_complete()).await?;

        let snapshot = assemble_snapshot(&mut *tx, &game, hand_id).await?;
        tx.commit().await?;
        Ok(snapshot)
    }
}

async fn require_game(tx: &mut (dyn StoreTx + '_), game_id: GameId) -> EngineResult<Game> {
    tx.game(game_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(Entity::Game, game_id.to_string()))
}

/// Read back the full client-facing state: seats, hand, and the legal
/// actions of whoever holds the turn.
async fn assemble_snapshot(
    tx: &mut (dyn StoreTx + '_),
    game: &Game,
    hand_id: HandId,
) -> EngineResult<Snapshot> {
    let players = tx.players_by_game(game.id).await?;
    let hand = actions::require_hand(tx, hand_id).await?;
    let player_actions = if hand.current_round.is_betting() {
        let on_turn = actions::require_player(tx, hand.current_player_turn_id).await?;
        opportunities::compute(tx, &hand, &on_turn).await?
    } else {
        ActionChoices::default()
    };
    Ok(Snapshot {
        players,
        hand,
        level: game.level,
        blind_time: game.blind_time,
        player_actions,
    })
}
