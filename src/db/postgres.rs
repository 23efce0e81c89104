//! PostgreSQL store implementation over sqlx.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::store::{Store, StoreError, StoreResult, StoreTx};
use crate::game::entities::{
    ActionKind, Chips, Game, GameBlind, GameId, Hand, HandAction, HandId, Player, PlayerId, Street,
};

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx + '_>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }
}

/// One open Postgres transaction.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

fn parse_street(row: &PgRow, column: &str) -> StoreResult<Street> {
    let raw: String = row.get(column);
    Street::parse(&raw).ok_or_else(|| StoreError::Backend(format!("bad street value: {raw:?}")))
}

fn parse_action_kind(row: &PgRow, column: &str) -> StoreResult<ActionKind> {
    let raw: String = row.get(column);
    ActionKind::parse(&raw)
        .ok_or_else(|| StoreError::Backend(format!("bad action value: {raw:?}")))
}

fn game_from_row(row: &PgRow) -> StoreResult<Game> {
    Ok(Game {
        id: row.get("id"),
        blind_time: row.get("blind_time"),
        level: row.get("level"),
        chips: row.get("chips"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
    })
}

fn player_from_row(row: &PgRow) -> StoreResult<Player> {
    Ok(Player {
        id: row.get("id"),
        game_id: row.get("game_id"),
        name: row.get("name"),
        amount: row.get("amount"),
        is_online: row.get("is_online"),
        is_active: row.get("is_active"),
        action: parse_action_kind(row, "action")?,
        action_amount: row.get("action_amount"),
        all_bet_sum: row.get("all_bet_sum"),
        inactive_time_hand_id: row.get("inactive_time_hand_id"),
        seat: row.get("seat"),
        created_at: row.get("created_at"),
    })
}

fn hand_from_row(row: &PgRow) -> StoreResult<Hand> {
    Ok(Hand {
        id: row.get("id"),
        game_id: row.get("game_id"),
        level: row.get("level"),
        dealer: row.get("dealer"),
        small_blind: row.get("small_blind"),
        big_blind: row.get("big_blind"),
        current_player_turn_id: row.get("current_player_turn_id"),
        pot_amount: row.get("pot_amount"),
        ante: row.get("ante"),
        small_blind_amount: row.get("small_blind_amount"),
        big_blind_amount: row.get("big_blind_amount"),
        last_call_amount: row.get("last_call_amount"),
        current_max_bet: row.get("current_max_bet"),
        last_raise_amount: row.get("last_raise_amount"),
        last_raise_order: row.get("last_raise_order"),
        current_round: parse_street(row, "current_round")?,
        is_changed_current_round: row.get("is_changed_current_round"),
    })
}

fn action_from_row(row: &PgRow) -> StoreResult<HandAction> {
    Ok(HandAction {
        id: row.get("id"),
        hand_id: row.get("hand_id"),
        player_id: row.get("player_id"),
        round: parse_street(row, "round")?,
        betting_round: row.get("betting_round"),
        action_order: row.get("action_order"),
        action_type: parse_action_kind(row, "action_type")?,
        bet_amount: row.get("bet_amount"),
        created_at: row.get("created_at"),
    })
}

const PLAYER_COLUMNS: &str = "id, game_id, name, amount, is_online, is_active, action, \
     action_amount, all_bet_sum, inactive_time_hand_id, seat, created_at";

const HAND_COLUMNS: &str = "id, game_id, level, dealer, small_blind, big_blind, \
     current_player_turn_id, pot_amount, ante, small_blind_amount, big_blind_amount, \
     last_call_amount, current_max_bet, last_raise_amount, last_raise_order, \
     current_round, is_changed_current_round";

const ACTION_COLUMNS: &str =
    "id, hand_id, player_id, round, betting_round, action_order, action_type, bet_amount, \
     created_at";

#[async_trait]
impl StoreTx for PgTx {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }

    async fn insert_game(&mut self, game: &Game) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO games (id, blind_time, level, chips, start_time, end_time)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(game.id)
        .bind(game.blind_time)
        .bind(game.level)
        .bind(game.chips)
        .bind(game.start_time)
        .bind(game.end_time)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn game(&mut self, id: GameId) -> StoreResult<Option<Game>> {
        let row = sqlx::query(
            "SELECT id, blind_time, level, chips, start_time, end_time FROM games WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(game_from_row).transpose()
    }

    async fn active_game(&mut self) -> StoreResult<Option<Game>> {
        let row = sqlx::query(
            "SELECT id, blind_time, level, chips, start_time, end_time FROM games
             WHERE end_time IS NULL
             ORDER BY start_time DESC
             LIMIT 1",
        )
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(game_from_row).transpose()
    }

    async fn update_game(&mut self, game: &Game) -> StoreResult<()> {
        sqlx::query(
            "UPDATE games SET blind_time = $2, level = $3, chips = $4, start_time = $5,
                    end_time = $6
             WHERE id = $1",
        )
        .bind(game.id)
        .bind(game.blind_time)
        .bind(game.level)
        .bind(game.chips)
        .bind(game.start_time)
        .bind(game.end_time)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn upsert_blind(&mut self, blind: &GameBlind) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO game_blinds (game_level, small_blind_amount, big_blind_amount, ante)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (game_level)
             DO UPDATE SET small_blind_amount = $2, big_blind_amount = $3, ante = $4",
        )
        .bind(blind.game_level)
        .bind(blind.small_blind_amount)
        .bind(blind.big_blind_amount)
        .bind(blind.ante)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn blind(&mut self, level: i32) -> StoreResult<Option<GameBlind>> {
        let row = sqlx::query(
            "SELECT game_level, small_blind_amount, big_blind_amount, ante
             FROM game_blinds WHERE game_level = $1",
        )
        .bind(level)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(|r| GameBlind {
            game_level: r.get("game_level"),
            small_blind_amount: r.get("small_blind_amount"),
            big_blind_amount: r.get("big_blind_amount"),
            ante: r.get("ante"),
        }))
    }

    async fn insert_player(&mut self, player: &Player) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO players (id, game_id, name, amount, is_online, is_active, action,
                    action_amount, all_bet_sum, inactive_time_hand_id, seat, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(player.id)
        .bind(player.game_id)
        .bind(&player.name)
        .bind(player.amount)
        .bind(player.is_online)
        .bind(player.is_active)
        .bind(player.action.as_str())
        .bind(player.action_amount)
        .bind(player.all_bet_sum)
        .bind(player.inactive_time_hand_id)
        .bind(player.seat)
        .bind(player.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn player(&mut self, id: PlayerId) -> StoreResult<Option<Player>> {
        let row = sqlx::query(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(player_from_row).transpose()
    }

    async fn players_by_game(&mut self, game_id: GameId) -> StoreResult<Vec<Player>> {
        let rows = sqlx::query(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE game_id = $1 ORDER BY seat"
        ))
        .bind(game_id)
        .fetch_all(&mut *self.tx)
        .await?;
        rows.iter().map(player_from_row).collect()
    }

    async fn update_player(&mut self, player: &Player) -> StoreResult<()> {
        sqlx::query(
            "UPDATE players SET amount = $2, is_online = $3, is_active = $4, action = $5,
                    action_amount = $6, all_bet_sum = $7, inactive_time_hand_id = $8
             WHERE id = $1",
        )
        .bind(player.id)
        .bind(player.amount)
        .bind(player.is_online)
        .bind(player.is_active)
        .bind(player.action.as_str())
        .bind(player.action_amount)
        .bind(player.all_bet_sum)
        .bind(player.inactive_time_hand_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn credit_player(&mut self, id: PlayerId, delta: Chips) -> StoreResult<()> {
        sqlx::query("UPDATE players SET amount = amount + $2 WHERE id = $1")
            .bind(id)
            .bind(delta)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn reset_hand_state(&mut self, game_id: GameId) -> StoreResult<()> {
        sqlx::query(
            "UPDATE players SET action = '', action_amount = 0, all_bet_sum = 0
             WHERE game_id = $1",
        )
        .bind(game_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn clear_street_state(&mut self, game_id: GameId) -> StoreResult<()> {
        sqlx::query(
            "UPDATE players SET action = '', action_amount = 0
             WHERE game_id = $1 AND action NOT IN ('fold', 'all-in')",
        )
        .bind(game_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_hand(&mut self, hand: &Hand) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO hands (id, game_id, level, dealer, small_blind, big_blind,
                    current_player_turn_id, pot_amount, ante, small_blind_amount,
                    big_blind_amount, last_call_amount, current_max_bet, last_raise_amount,
                    last_raise_order, current_round, is_changed_current_round, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                     NOW())",
        )
        .bind(hand.id)
        .bind(hand.game_id)
        .bind(hand.level)
        .bind(hand.dealer)
        .bind(hand.small_blind)
        .bind(hand.big_blind)
        .bind(hand.current_player_turn_id)
        .bind(hand.pot_amount)
        .bind(hand.ante)
        .bind(hand.small_blind_amount)
        .bind(hand.big_blind_amount)
        .bind(hand.last_call_amount)
        .bind(hand.current_max_bet)
        .bind(hand.last_raise_amount)
        .bind(hand.last_raise_order)
        .bind(hand.current_round.as_str())
        .bind(hand.is_changed_current_round)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn hand(&mut self, id: HandId) -> StoreResult<Option<Hand>> {
        let row = sqlx::query(&format!("SELECT {HAND_COLUMNS} FROM hands WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(hand_from_row).transpose()
    }

    async fn update_hand(&mut self, hand: &Hand) -> StoreResult<()> {
        sqlx::query(
            "UPDATE hands SET current_player_turn_id = $2, pot_amount = $3,
                    last_call_amount = $4, current_max_bet = $5, last_raise_amount = $6,
                    last_raise_order = $7, current_round = $8, is_changed_current_round = $9
             WHERE id = $1",
        )
        .bind(hand.id)
        .bind(hand.current_player_turn_id)
        .bind(hand.pot_amount)
        .bind(hand.last_call_amount)
        .bind(hand.current_max_bet)
        .bind(hand.last_raise_amount)
        .bind(hand.last_raise_order)
        .bind(hand.current_round.as_str())
        .bind(hand.is_changed_current_round)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn latest_hand(&mut self, game_id: GameId) -> StoreResult<Option<Hand>> {
        let row = sqlx::query(&format!(
            "SELECT {HAND_COLUMNS} FROM hands WHERE game_id = $1
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(game_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(hand_from_row).transpose()
    }

    async fn hands_by_game(&mut self, game_id: GameId) -> StoreResult<Vec<Hand>> {
        let rows = sqlx::query(&format!(
            "SELECT {HAND_COLUMNS} FROM hands WHERE game_id = $1 ORDER BY created_at"
        ))
        .bind(game_id)
        .fetch_all(&mut *self.tx)
        .await?;
        rows.iter().map(hand_from_row).collect()
    }

    async fn insert_action(&mut self, action: &HandAction) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO actions (id, hand_id, player_id, round, betting_round, action_order,
                    action_type, bet_amount, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(action.id)
        .bind(action.hand_id)
        .bind(action.player_id)
        .bind(action.round.as_str())
        .bind(action.betting_round)
        .bind(action.action_order)
        .bind(action.action_type.as_str())
        .bind(action.bet_amount)
        .bind(action.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn last_action(&mut self, hand_id: HandId) -> StoreResult<Option<HandAction>> {
        let row = sqlx::query(&format!(
            "SELECT {ACTION_COLUMNS} FROM actions WHERE hand_id = $1
             ORDER BY action_order DESC LIMIT 1"
        ))
        .bind(hand_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(action_from_row).transpose()
    }

    async fn actions_for_round(
        &mut self,
        hand_id: HandId,
        round: Street,
    ) -> StoreResult<Vec<HandAction>> {
        let rows = sqlx::query(&format!(
            "SELECT {ACTION_COLUMNS} FROM actions WHERE hand_id = $1 AND round = $2
             ORDER BY action_order"
        ))
        .bind(hand_id)
        .bind(round.as_str())
        .fetch_all(&mut *self.tx)
        .await?;
        rows.iter().map(action_from_row).collect()
    }

    async fn player_street_total(
        &mut self,
        hand_id: HandId,
        player_id: PlayerId,
        round: Street,
    ) -> StoreResult<Chips> {
        // SUM over bigint widens to numeric; cast back before decoding.
        let row = sqlx::query(
            "SELECT COALESCE(SUM(bet_amount), 0)::bigint AS total FROM actions
             WHERE hand_id = $1 AND player_id = $2 AND round = $3",
        )
        .bind(hand_id)
        .bind(player_id)
        .bind(round.as_str())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row.get("total"))
    }

    async fn player_hand_total(
        &mut self,
        hand_id: HandId,
        player_id: PlayerId,
    ) -> StoreResult<Chips> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(bet_amount), 0)::bigint AS total FROM actions
             WHERE hand_id = $1 AND player_id = $2",
        )
        .bind(hand_id)
        .bind(player_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row.get("total"))
    }

    async fn round_action_kinds(
        &mut self,
        hand_id: HandId,
        round: Street,
    ) -> StoreResult<Vec<ActionKind>> {
        let rows = sqlx::query(
            "SELECT DISTINCT action_type FROM actions WHERE hand_id = $1 AND round = $2",
        )
        .bind(hand_id)
        .bind(round.as_str())
        .fetch_all(&mut *self.tx)
        .await?;
        rows.iter()
            .map(|row| parse_action_kind(row, "action_type"))
            .collect()
    }
}
