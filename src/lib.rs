//! # Holdem Core
//!
//! The betting core of a No-Limit Texas Hold'em tournament server: a
//! transactional state machine that runs a hand from preflop to showdown,
//! validates player actions, keeps pot and stack accounting honest, rotates
//! the button and blinds between hands, and settles all-in side-pot refunds.
//!
//! Cards never enter this crate. Dealing and hand evaluation belong to the
//! caller, who supplies showdown winners to [`engine::Engine::next_hand`].
//!
//! ## Architecture
//!
//! - [`game`]: persisted entities and the engine's error types
//! - [`engine`]: the command surface; one store transaction per command
//! - [`db`]: the repository contract plus Postgres and in-memory stores
//! - [`table`]: a per-game actor serializing concurrent commands
//! - [`config`]: seat roster and blind schedule
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use holdem_core::{config::EngineConfig, db::MemStore, engine::Engine};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), holdem_core::game::EngineError> {
//! let engine = Engine::new(Arc::new(MemStore::new()), EngineConfig::default());
//! let snapshot = engine.start_game(600, 10_000).await?;
//! assert_eq!(snapshot.hand.pot_amount, 150);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod engine;
pub mod game;
pub mod table;

pub use config::EngineConfig;
pub use db::{Database, MemStore, PgStore, Store};
pub use engine::{Engine, NextHandCommand, PlayerActionCommand};
pub use game::{
    ActionChoices, ActionKind, Chips, DomainError, EngineError, EngineResult, Snapshot, Street,
    Winner,
};
pub use table::{GameActor, GameHandle};
