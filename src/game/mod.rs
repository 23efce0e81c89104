//! Game entities and engine error types.

pub mod entities;
pub mod errors;

pub use entities::{
    ActionChoices, ActionKind, Chips, Game, GameBlind, GameId, Hand, HandAction, HandId, Player,
    PlayerId, SeatIndex, Snapshot, Street, Winner,
};
pub use errors::{DomainError, EngineError, EngineResult, Entity};
