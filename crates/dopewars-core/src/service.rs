//! Serialized async access to a [`GameEngine`].
//!
//! One tokio task owns the engine and drains a bounded mailbox. Every
//! caller holds a cloneable [`TurnHandle`]; each request carries a
//! `oneshot` reply channel. Because a single task applies commands one at
//! a time, concurrent submissions resolve in one total order and every
//! turn commits or rejects before the next begins.
//!
//! The task exits once every handle is dropped (or [`TurnHandle::shutdown`]
//! is called) and hands the engine back through its `JoinHandle`.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use dopewars_types::{ItemId, LocationId, MarketPool, TurnLog, TurnRecord, TurnRequest, UserAccount, UserId};

use crate::error::TurnError;
use crate::turn::GameEngine;

/// Errors returned through a [`TurnHandle`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The engine task has stopped.
    #[error("turn service is not running")]
    Closed,

    /// The engine rejected the request.
    #[error(transparent)]
    Turn(#[from] TurnError),
}

enum Command {
    Turn {
        request: TurnRequest,
        reply: oneshot::Sender<Result<TurnLog, TurnError>>,
    },
    UserState {
        user: UserId,
        reply: oneshot::Sender<UserAccount>,
    },
    MarketState {
        location: LocationId,
        item: ItemId,
        reply: oneshot::Sender<Result<MarketPool, TurnError>>,
    },
    Clock {
        reply: oneshot::Sender<u64>,
    },
    ViewTurn {
        tick: u64,
        reply: oneshot::Sender<Option<TurnRecord>>,
    },
    Shutdown,
}

/// Owner of the engine task.
#[derive(Debug)]
pub struct TurnService;

impl TurnService {
    /// Move `engine` into a new task and return a handle to it.
    ///
    /// `mailbox_size` bounds how many requests may queue before callers
    /// wait. Must be called from within a tokio runtime.
    pub fn spawn(engine: GameEngine, mailbox_size: usize) -> (TurnHandle, JoinHandle<GameEngine>) {
        let (sender, mailbox) = mpsc::channel(mailbox_size.max(1));
        let task = tokio::spawn(run(engine, mailbox));
        (TurnHandle { sender }, task)
    }
}

async fn run(mut engine: GameEngine, mut mailbox: mpsc::Receiver<Command>) -> GameEngine {
    info!(tick = engine.read_game_clock(), "Turn service started");
    while let Some(command) = mailbox.recv().await {
        let delivered = match command {
            Command::Turn { request, reply } => reply.send(engine.take_turn(request)).is_ok(),
            Command::UserState { user, reply } => reply.send(engine.check_user_state(user)).is_ok(),
            Command::MarketState {
                location,
                item,
                reply,
            } => reply
                .send(engine.check_market_state(location, item))
                .is_ok(),
            Command::Clock { reply } => reply.send(engine.read_game_clock()).is_ok(),
            Command::ViewTurn { tick, reply } => reply
                .send(engine.view_given_turn(tick).cloned())
                .is_ok(),
            Command::Shutdown => break,
        };
        if !delivered {
            debug!("Caller dropped before reply");
        }
    }
    info!(
        tick = engine.read_game_clock(),
        turns = engine.journal().len(),
        "Turn service stopped"
    );
    engine
}

/// Cloneable client of a running [`TurnService`].
#[derive(Debug, Clone)]
pub struct TurnHandle {
    sender: mpsc::Sender<Command>,
}

impl TurnHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_err| ServiceError::Closed)?;
        response.await.map_err(|_err| ServiceError::Closed)
    }

    /// Submit a turn and wait for it to commit or reject.
    pub async fn have_turn(&self, request: TurnRequest) -> Result<TurnLog, ServiceError> {
        Ok(self
            .request(|reply| Command::Turn { request, reply })
            .await??)
    }

    /// Read a player's state.
    pub async fn check_user_state(&self, user: UserId) -> Result<UserAccount, ServiceError> {
        self.request(|reply| Command::UserState { user, reply }).await
    }

    /// Read a market's reserves.
    pub async fn check_market_state(
        &self,
        location: LocationId,
        item: ItemId,
    ) -> Result<MarketPool, ServiceError> {
        Ok(self
            .request(|reply| Command::MarketState {
                location,
                item,
                reply,
            })
            .await??)
    }

    /// Read the global tick.
    pub async fn read_game_clock(&self) -> Result<u64, ServiceError> {
        self.request(|reply| Command::Clock { reply }).await
    }

    /// Read the record of the turn accepted at `tick`.
    pub async fn view_given_turn(&self, tick: u64) -> Result<Option<TurnRecord>, ServiceError> {
        self.request(|reply| Command::ViewTurn { tick, reply }).await
    }

    /// Ask the task to stop after the requests already queued.
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.sender
            .send(Command::Shutdown)
            .await
            .map_err(|_err| ServiceError::Closed)
    }
}
