//! Repository trait definitions for the engine's transactional store.
//!
//! The engine never touches a database directly: every command begins a
//! [`StoreTx`], does all of its reads and writes through it, and commits.
//! Dropping a transaction without committing rolls it back, so a failed
//! command leaves no trace.

use async_trait::async_trait;
use thiserror::Error;

use crate::game::entities::{
    ActionKind, Chips, Game, GameBlind, GameId, Hand, HandAction, HandId, Player, PlayerId, Street,
};

/// Store-level failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle to a transactional store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a transaction. All engine work happens inside one.
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx + '_>>;
}

/// One open transaction over the poker schema.
///
/// Mirrors the persisted tables (`games`, `game_blinds`, `players`, `hands`,
/// `actions`) plus the targeted updaters and log aggregates the engine
/// needs. Commit consumes the transaction; dropping it rolls back.
#[async_trait]
pub trait StoreTx: Send {
    async fn commit(self: Box<Self>) -> StoreResult<()>;
    async fn rollback(self: Box<Self>) -> StoreResult<()>;

    // games

    async fn insert_game(&mut self, game: &Game) -> StoreResult<()>;
    async fn game(&mut self, id: GameId) -> StoreResult<Option<Game>>;
    /// The single game with no end time, if any.
    async fn active_game(&mut self) -> StoreResult<Option<Game>>;
    async fn update_game(&mut self, game: &Game) -> StoreResult<()>;

    // game_blinds

    async fn upsert_blind(&mut self, blind: &GameBlind) -> StoreResult<()>;
    async fn blind(&mut self, level: i32) -> StoreResult<Option<GameBlind>>;

    // players

    async fn insert_player(&mut self, player: &Player) -> StoreResult<()>;
    async fn player(&mut self, id: PlayerId) -> StoreResult<Option<Player>>;
    /// All seats of a game in seat order.
    async fn players_by_game(&mut self, game_id: GameId) -> StoreResult<Vec<Player>>;
    async fn update_player(&mut self, player: &Player) -> StoreResult<()>;
    /// Add `delta` to a player's stack.
    async fn credit_player(&mut self, id: PlayerId, delta: Chips) -> StoreResult<()>;
    /// Reset every seat's street and hand counters for a fresh hand:
    /// `action = '', action_amount = 0, all_bet_sum = 0`.
    async fn reset_hand_state(&mut self, game_id: GameId) -> StoreResult<()>;
    /// Reset the street state of seats still able to act (not folded, not
    /// all-in): `action = '', action_amount = 0`.
    async fn clear_street_state(&mut self, game_id: GameId) -> StoreResult<()>;

    // hands

    async fn insert_hand(&mut self, hand: &Hand) -> StoreResult<()>;
    async fn hand(&mut self, id: HandId) -> StoreResult<Option<Hand>>;
    async fn update_hand(&mut self, hand: &Hand) -> StoreResult<()>;
    /// Most recently created hand of a game.
    async fn latest_hand(&mut self, game_id: GameId) -> StoreResult<Option<Hand>>;
    async fn hands_by_game(&mut self, game_id: GameId) -> StoreResult<Vec<Hand>>;

    // actions

    async fn insert_action(&mut self, action: &HandAction) -> StoreResult<()>;
    /// Highest-ordered action of a hand, if any.
    async fn last_action(&mut self, hand_id: HandId) -> StoreResult<Option<HandAction>>;
    /// All log entries for one street of a hand, in action order.
    async fn actions_for_round(
        &mut self,
        hand_id: HandId,
        round: Street,
    ) -> StoreResult<Vec<HandAction>>;
    /// Sum of one player's bet amounts on one street.
    async fn player_street_total(
        &mut self,
        hand_id: HandId,
        player_id: PlayerId,
        round: Street,
    ) -> StoreResult<Chips>;
    /// Sum of one player's bet amounts over the whole hand.
    async fn player_hand_total(
        &mut self,
        hand_id: HandId,
        player_id: PlayerId,
    ) -> StoreResult<Chips>;
    /// Distinct action types logged for one street of a hand.
    async fn round_action_kinds(
        &mut self,
        hand_id: HandId,
        round: Street,
    ) -> StoreResult<Vec<ActionKind>>;
}
