//! Game actor: per-game serial execution of engine commands.
//!
//! Commands against one game must apply one at a time, in arrival order. A
//! single tokio task owning the engine gives exactly that; callers hold a
//! cloneable handle and await
//! their reply on a oneshot channel. A command whose client disconnects
//! still runs to completion, since the actor never observes the caller.

use tokio::sync::{mpsc, oneshot};

use super::messages::GameMessage;
use crate::engine::{Engine, NextHandCommand, PlayerActionCommand};
use crate::game::entities::{Chips, GameId, HandId, PlayerId, Snapshot};
use crate::game::errors::{EngineError, EngineResult};

const INBOX_CAPACITY: usize = 64;

/// Cloneable handle for submitting commands to a running game actor.
#[derive(Clone)]
pub struct GameHandle {
    sender: mpsc::Sender<GameMessage>,
}

impl GameHandle {
    pub async fn start_game(&self, blind_time: i64, players_chips: Chips) -> EngineResult<Snapshot> {
        let (respond, reply) = oneshot::channel();
        self.send(GameMessage::StartGame {
            blind_time,
            players_chips,
            respond,
        })
        .await?;
        reply.await.map_err(|_| EngineError::Unavailable)?
    }

    pub async fn end_game(&self, game_id: GameId) -> EngineResult<bool> {
        let (respond, reply) = oneshot::channel();
        self.send(GameMessage::EndGame { game_id, respond }).await?;
        reply.await.map_err(|_| EngineError::Unavailable)?
    }

    pub async fn active_game(&self) -> EngineResult<Option<Snapshot>> {
        let (respond, reply) = oneshot::channel();
        self.send(GameMessage::ActiveGame { respond }).await?;
        reply.await.map_err(|_| EngineError::Unavailable)?
    }

    pub async fn player_action(&self, command: PlayerActionCommand) -> EngineResult<Snapshot> {
        let (respond, reply) = oneshot::channel();
        self.send(GameMessage::PlayerAction { command, respond })
            .await?;
        reply.await.map_err(|_| EngineError::Unavailable)?
    }

    pub async fn next_hand(&self, command: NextHandCommand) -> EngineResult<Snapshot> {
        let (respond, reply) = oneshot::channel();
        self.send(GameMessage::NextHand { command, respond }).await?;
        reply.await.map_err(|_| EngineError::Unavailable)?
    }

    pub async fn rebuy(
        &self,
        game_id: GameId,
        hand_id: HandId,
        player_id: PlayerId,
    ) -> EngineResult<Snapshot> {
        let (respond, reply) = oneshot::channel();
        self.send(GameMessage::Rebuy {
            game_id,
            hand_id,
            player_id,
            respond,
        })
        .await?;
        reply.await.map_err(|_| EngineError::Unavailable)?
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(GameMessage::Shutdown).await;
    }

    async fn send(&self, message: GameMessage) -> EngineResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| EngineError::Unavailable)
    }
}

/// Owns the engine and drains the inbox strictly in order.
pub struct GameActor {
    engine: Engine,
    inbox: mpsc::Receiver<GameMessage>,
}

impl GameActor {
    /// Spawn the actor task and return a handle to it.
    pub fn spawn(engine: Engine) -> GameHandle {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let actor = Self { engine, inbox };
        tokio::spawn(actor.run());
        GameHandle { sender }
    }

    async fn run(mut self) {
        log::info!("game actor started");
        while let Some(message) = self.inbox.recv().await {
            match message {
                GameMessage::StartGame {
                    blind_time,
                    players_chips,
                    respond,
                } => {
                    let _ = respond.send(self.engine.start_game(blind_time, players_chips).await);
                }
                GameMessage::EndGame { game_id, respond } => {
                    let _ = respond.send(self.engine.end_game(game_id).await);
                }
                GameMessage::ActiveGame { respond } => {
                    let _ = respond.send(self.engine.active_game().await);
                }
                GameMessage::PlayerAction { command, respond } => {
                    let result = self.engine.player_action(command).await;
                    if let Err(err) = &result {
                        if err.is_rejection() {
                            log::warn!("rejected action: {err}");
                        } else {
                            log::error!("action failed: {err}");
                        }
                    }
                    let _ = respond.send(result);
                }
                GameMessage::NextHand { command, respond } => {
                    let _ = respond.send(self.engine.next_hand(command).await);
                }
                GameMessage::Rebuy {
                    game_id,
                    hand_id,
                    player_id,
                    respond,
                } => {
                    let _ = respond.send(self.engine.rebuy(game_id, hand_id, player_id).await);
                }
                GameMessage::Shutdown => break,
            }
        }
        log::info!("game actor stopped");
    }
}
