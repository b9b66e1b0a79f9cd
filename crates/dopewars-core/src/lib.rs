//! Game clock, event engine, and turn orchestration for Dope Wars.
//!
//! This crate owns the turn pipeline: a player trades at one market, a
//! cascade of eleven random events scales the outcome, shipments and
//! seizures ripple to neighboring markets, and the result is committed
//! atomically and journaled.
//!
//! # Modules
//!
//! - [`clock`] -- Global tick counter and the per-player cooldown rule.
//! - [`config`] -- Configuration loading from `dopewars-config.yaml`.
//! - [`random`] -- [`PseudoRandom`] capability and its implementations.
//! - [`events`] -- [`EventEngine`]: event rolls and percentage factors.
//! - [`region`] -- [`RegionalPropagator`] and pluggable neighborhoods.
//! - [`turn`] -- [`GameEngine`], the turn state machine and read API.
//! - [`journal`] -- Append-only [`TurnJournal`] of accepted turns.
//! - [`admin`] -- Bulk initialization of markets and balances.
//! - [`service`] -- [`TurnService`], serialized async access to the engine.
//! - [`error`] -- [`TurnError`], the rejection taxonomy.
//!
//! [`PseudoRandom`]: random::PseudoRandom
//! [`EventEngine`]: events::EventEngine
//! [`RegionalPropagator`]: region::RegionalPropagator
//! [`GameEngine`]: turn::GameEngine
//! [`TurnJournal`]: journal::TurnJournal
//! [`TurnService`]: service::TurnService
//! [`TurnError`]: error::TurnError

pub mod admin;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod journal;
pub mod random;
pub mod region;
pub mod service;
pub mod turn;

pub use admin::AdminError;
pub use config::{ConfigError, EngineConfig};
pub use error::TurnError;
pub use service::{ServiceError, TurnHandle, TurnService};
pub use turn::GameEngine;
