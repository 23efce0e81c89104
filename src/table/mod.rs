//! Per-game command serialization.

pub mod actor;
pub mod messages;

pub use actor::{GameActor, GameHandle};
pub use messages::GameMessage;
