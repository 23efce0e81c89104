//! Shared helpers for engine integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use holdem_core::config::{BlindLevel, EngineConfig, SeatConfig};
use holdem_core::db::MemStore;
use holdem_core::engine::{Engine, PlayerActionCommand};
use holdem_core::game::entities::{ActionKind, Chips, Player, PlayerId, Snapshot};
use holdem_core::game::errors::EngineResult;

/// A table with `seats` players and the default blind schedule
/// (level 1: 50/100, ante 100).
pub fn engine(seats: usize) -> Engine {
    engine_with_levels(seats, vec![(1, 50, 100, 100), (2, 100, 200, 200)])
}

pub fn engine_with_levels(seats: usize, levels: Vec<(i32, Chips, Chips, Chips)>) -> Engine {
    let config = EngineConfig {
        seats: (1..=seats)
            .map(|i| SeatConfig {
                name: format!("Player {i}"),
                is_online: true,
                is_active: true,
            })
            .collect(),
        levels: levels
            .into_iter()
            .map(|(level, small_blind_amount, big_blind_amount, ante)| BlindLevel {
                level,
                small_blind_amount,
                big_blind_amount,
                ante,
            })
            .collect(),
    };
    config.validate().expect("test config is valid");
    Engine::new(Arc::new(MemStore::new()), config)
}

/// Submit an action for the seat at `seat_idx` (roster order).
pub async fn act(
    engine: &Engine,
    snapshot: &Snapshot,
    seat_idx: usize,
    action: ActionKind,
    bet_amount: Option<Chips>,
) -> EngineResult<Snapshot> {
    engine
        .player_action(PlayerActionCommand {
            game_id: snapshot.hand.game_id,
            hand_id: snapshot.hand.id,
            player_id: snapshot.players[seat_idx].id,
            action,
            bet_amount,
        })
        .await
}

pub fn seat<'a>(snapshot: &'a Snapshot, idx: usize) -> &'a Player {
    &snapshot.players[idx]
}

pub fn seat_id(snapshot: &Snapshot, idx: usize) -> PlayerId {
    snapshot.players[idx].id
}

/// Total chips on the table: every stack plus the pot.
pub fn chips_in_play(snapshot: &Snapshot) -> Chips {
    snapshot.players.iter().map(|p| p.amount).sum::<Chips>() + snapshot.hand.pot_amount
}
