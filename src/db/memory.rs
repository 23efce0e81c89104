//! In-memory store implementation.
//!
//! Backs the engine without Postgres: integration tests, local play and
//! bots all run against it. Transactions take a snapshot of the shared
//! state on begin and write it back on commit, so a dropped transaction
//! discards its changes just like the SQL implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::store::{Store, StoreError, StoreResult, StoreTx};
use crate::game::entities::{
    ActionKind, Chips, Game, GameBlind, GameId, Hand, HandAction, HandId, Player, PlayerId, Street,
};

#[derive(Clone, Debug, Default)]
struct MemState {
    games: HashMap<GameId, Game>,
    blinds: HashMap<i32, GameBlind>,
    players: HashMap<PlayerId, Player>,
    hands: HashMap<HandId, Hand>,
    /// Append order doubles as creation order.
    hands_order: Vec<HandId>,
    actions: Vec<HandAction>,
}

/// Shared in-memory store.
#[derive(Clone, Default)]
pub struct MemStore {
    state: Arc<Mutex<MemState>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("state mutex poisoned".into())
}

#[async_trait]
impl Store for MemStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx + '_>> {
        let work = self.state.lock().map_err(|_| poisoned())?.clone();
        Ok(Box::new(MemTx {
            shared: Arc::clone(&self.state),
            work,
        }))
    }
}

/// One open transaction: a private copy of the state, written back whole on
/// commit.
pub struct MemTx {
    shared: Arc<Mutex<MemState>>,
    work: MemState,
}

#[async_trait]
impl StoreTx for MemTx {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        *self.shared.lock().map_err(|_| poisoned())? = self.work;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_game(&mut self, game: &Game) -> StoreResult<()> {
        self.work.games.insert(game.id, game.clone());
        Ok(())
    }

    async fn game(&mut self, id: GameId) -> StoreResult<Option<Game>> {
        Ok(self.work.games.get(&id).cloned())
    }

    async fn active_game(&mut self) -> StoreResult<Option<Game>> {
        Ok(self
            .work
            .games
            .values()
            .find(|g| g.end_time.is_none())
            .cloned())
    }

    async fn update_game(&mut self, game: &Game) -> StoreResult<()> {
        self.work.games.insert(game.id, game.clone());
        Ok(())
    }

    async fn upsert_blind(&mut self, blind: &GameBlind) -> StoreResult<()> {
        self.work.blinds.insert(blind.game_level, blind.clone());
        Ok(())
    }

    async fn blind(&mut self, level: i32) -> StoreResult<Option<GameBlind>> {
        Ok(self.work.blinds.get(&level).cloned())
    }

    async fn insert_player(&mut self, player: &Player) -> StoreResult<()> {
        self.work.players.insert(player.id, player.clone());
        Ok(())
    }

    async fn player(&mut self, id: PlayerId) -> StoreResult<Option<Player>> {
        Ok(self.work.players.get(&id).cloned())
    }

    async fn players_by_game(&mut self, game_id: GameId) -> StoreResult<Vec<Player>> {
        let mut players: Vec<Player> = self
            .work
            .players
            .values()
            .filter(|p| p.game_id == game_id)
            .cloned()
            .collect();
        players.sort_by_key(|p| p.seat);
        Ok(players)
    }

    async fn update_player(&mut self, player: &Player) -> StoreResult<()> {
        self.work.players.insert(player.id, player.clone());
        Ok(())
    }

    async fn credit_player(&mut self, id: PlayerId, delta: Chips) -> StoreResult<()> {
        if let Some(player) = self.work.players.get_mut(&id) {
            player.amount += delta;
        }
        Ok(())
    }

    async fn reset_hand_state(&mut self, game_id: GameId) -> StoreResult<()> {
        for player in self.work.players.values_mut() {
            if player.game_id == game_id {
                player.action = ActionKind::None;
                player.action_amount = 0;
                player.all_bet_sum = 0;
            }
        }
        Ok(())
    }

    async fn clear_street_state(&mut self, game_id: GameId) -> StoreResult<()> {
        for player in self.work.players.values_mut() {
            if player.game_id == game_id
                && player.action != ActionKind::Fold
                && player.action != ActionKind::AllIn
            {
                player.action = ActionKind::None;
                player.action_amount = 0;
            }
        }
        Ok(())
    }

    async fn insert_hand(&mut self, hand: &Hand) -> StoreResult<()> {
        self.work.hands.insert(hand.id, hand.clone());
        self.work.hands_order.push(hand.id);
        Ok(())
    }

    async fn hand(&mut self, id: HandId) -> StoreResult<Option<Hand>> {
        Ok(self.work.hands.get(&id).cloned())
    }

    async fn update_hand(&mut self, hand: &Hand) -> StoreResult<()> {
        self.work.hands.insert(hand.id, hand.clone());
        Ok(())
    }

    async fn latest_hand(&mut self, game_id: GameId) -> StoreResult<Option<Hand>> {
        Ok(self
            .work
            .hands_order
            .iter()
            .rev()
            .filter_map(|id| self.work.hands.get(id))
            .find(|h| h.game_id == game_id)
            .cloned())
    }

    async fn hands_by_game(&mut self, game_id: GameId) -> StoreResult<Vec<Hand>> {
        Ok(self
            .work
            .hands_order
            .iter()
            .filter_map(|id| self.work.hands.get(id))
            .filter(|h| h.game_id == game_id)
            .cloned()
            .collect())
    }

    async fn insert_action(&mut self, action: &HandAction) -> StoreResult<()> {
        self.work.actions.push(action.clone());
        Ok(())
    }

    async fn last_action(&mut self, hand_id: HandId) -> StoreResult<Option<HandAction>> {
        Ok(self
            .work
            .actions
            .iter()
            .filter(|a| a.hand_id == hand_id)
            .max_by_key(|a| a.action_order)
            .cloned())
    }

    async fn actions_for_round(
        &mut self,
        hand_id: HandId,
        round: Street,
    ) -> StoreResult<Vec<HandAction>> {
        let mut actions: Vec<HandAction> = self
            .work
            .actions
            .iter()
            .filter(|a| a.hand_id == hand_id && a.round == round)
            .cloned()
            .collect();
        actions.sort_by_key(|a| a.action_order);
        Ok(actions)
    }

    async fn player_street_total(
        &mut self,
        hand_id: HandId,
        player_id: PlayerId,
        round: Street,
    ) -> StoreResult<Chips> {
        Ok(self
            .work
            .actions
            .iter()
            .filter(|a| a.hand_id == hand_id && a.player_id == player_id && a.round == round)
            .map(|a| a.bet_amount)
            .sum())
    }

    async fn player_hand_total(
        &mut self,
        hand_id: HandId,
        player_id: PlayerId,
    ) -> StoreResult<Chips> {
        Ok(self
            .work
            .actions
            .iter()
            .filter(|a| a.hand_id == hand_id && a.player_id == player_id)
            .map(|a| a.bet_amount)
            .sum())
    }

    async fn round_action_kinds(
        &mut self,
        hand_id: HandId,
        round: Street,
    ) -> StoreResult<Vec<ActionKind>> {
        let mut kinds = Vec::new();
        for action in &self.work.actions {
            if action.hand_id == hand_id
                && action.round == round
                && !kinds.contains(&action.action_type)
            {
                kinds.push(action.action_type);
            }
        }
        Ok(kinds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_game() -> Game {
        Game {
            id: Uuid::new_v4(),
            blind_time: 600,
            level: 1,
            chips: 10_000,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    #[tokio::test]
    async fn uncommitted_changes_are_invisible() {
        let store = MemStore::new();
        let game = sample_game();

        let mut tx = store.begin().await.unwrap();
        tx.insert_game(&game).await.unwrap();
        tx.rollback().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.game(game.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commit_publishes_changes() {
        let store = MemStore::new();
        let game = sample_game();

        let mut tx = store.begin().await.unwrap();
        tx.insert_game(&game).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.game(game.id).await.unwrap().unwrap().id, game.id);
        assert!(tx.active_game().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn players_come_back_in_seat_order() {
        let store = MemStore::new();
        let game = sample_game();
        let mut tx = store.begin().await.unwrap();
        tx.insert_game(&game).await.unwrap();
        for seat in [2, 0, 1] {
            let player = Player {
                id: Uuid::new_v4(),
                game_id: game.id,
                name: format!("Player {seat}"),
                amount: 10_000,
                is_online: true,
                is_active: true,
                action: ActionKind::None,
                action_amount: 0,
                all_bet_sum: 0,
                inactive_time_hand_id: None,
                seat,
                created_at: Utc::now(),
            };
            tx.insert_player(&player).await.unwrap();
        }
        let seats: Vec<i32> = tx
            .players_by_game(game.id)
            .await
            .unwrap()
            .iter()
            .map(|p| p.seat)
            .collect();
        assert_eq!(seats, vec![0, 1, 2]);
    }
}
