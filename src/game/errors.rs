//! Engine error types.

use thiserror::Error;

use super::entities::Chips;
use crate::db::store::StoreError;

/// User-facing rule violations. Surfaced to the client as typed errors and
/// never applied to state.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DomainError {
    #[error("not your turn")]
    ConflictingTurn,

    #[error("player is not active in this game")]
    InactivePlayer,

    #[error("hand or player does not belong to this game")]
    GameMismatch,

    #[error("hand is already complete")]
    HandComplete,

    #[error("a game is already running")]
    GameAlreadyActive,

    #[error("action requires a bet amount")]
    BetAmountRequired,

    #[error("betting is already open; raise or call instead")]
    BetNotAllowed,

    #[error("there is a bet to match; check is not available")]
    CheckNotAllowed,

    #[error("there is no bet to call")]
    NothingToCall,

    #[error("there is no bet to raise")]
    RaiseNotAllowed,

    #[error("bet must be at least {minimum}")]
    BetTooSmall { minimum: Chips },

    #[error("raise must reach at least {minimum}")]
    RaiseTooSmall { minimum: Chips },

    #[error("betting was not reopened; call or fold")]
    RaiseNotReopened,

    #[error("need {required} chips, have {available}")]
    InsufficientChips { available: Chips, required: Chips },

    #[error("seat still has chips; rebuy is for busted seats")]
    RebuyNotAllowed,

    #[error("cannot seat the next hand: {0}")]
    HandCannotStart(String),

    #[error("unsupported action type")]
    UnsupportedAction,
}

/// Entity names for not-found reporting.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Entity {
    Game,
    Player,
    Hand,
    BlindLevel,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let repr = match self {
            Self::Game => "game",
            Self::Player => "player",
            Self::Hand => "hand",
            Self::BlindLevel => "blind level",
        };
        f.write_str(repr)
    }
}

/// Engine errors: domain violations, missing references, store failures.
///
/// Domain and not-found errors leave state untouched; a store error aborts
/// the surrounding transaction so no command is ever half-applied.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{0} not found: {1}")]
    NotFound(Entity, String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("game task unavailable")]
    Unavailable,
}

impl EngineError {
    /// True for errors the client caused, false for infrastructure trouble.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Domain(_) | Self::NotFound(..))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
