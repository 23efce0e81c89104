//! Messages understood by the game actor.

use tokio::sync::oneshot;

use crate::engine::{NextHandCommand, PlayerActionCommand};
use crate::game::entities::{Chips, GameId, HandId, PlayerId, Snapshot};
use crate::game::errors::EngineResult;

/// One command plus the channel its result travels back on.
#[derive(Debug)]
pub enum GameMessage {
    StartGame {
        blind_time: i64,
        players_chips: Chips,
        respond: oneshot::Sender<EngineResult<Snapshot>>,
    },
    EndGame {
        game_id: GameId,
        respond: oneshot::Sender<EngineResult<bool>>,
    },
    ActiveGame {
        respond: oneshot::Sender<EngineResult<Option<Snapshot>>>,
    },
    PlayerAction {
        command: PlayerActionCommand,
        respond: oneshot::Sender<EngineResult<Snapshot>>,
    },
    NextHand {
        command: NextHandCommand,
        respond: oneshot::Sender<EngineResult<Snapshot>>,
    },
    Rebuy {
        game_id: GameId,
        hand_id: HandId,
        player_id: PlayerId,
        respond: oneshot::Sender<EngineResult<Snapshot>>,
    },
    /// Stop the actor after draining the inbox.
    Shutdown,
}
