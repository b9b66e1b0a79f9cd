//! Headless binary for the Dope Wars turn engine.
//!
//! Wires configuration, market seeding, the serialized turn service, and
//! a random-stimulus exerciser together, runs one exerciser session, and
//! reports what happened.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `dopewars-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing), honoring `RUST_LOG`
//! 3. Build the game engine and seed every market linearly
//! 4. Move the engine into a [`TurnService`] task
//! 5. Run the exerciser session against the service handle
//! 6. Shut the service down and log the final world state

mod error;
mod exerciser;

use std::path::Path;

use anyhow::Context;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dopewars_core::{EngineConfig, GameEngine, TurnService};

use crate::error::EngineError;
use crate::exerciser::{Exerciser, SessionPlan};

/// Default location of the configuration file.
const CONFIG_PATH: &str = "dopewars-config.yaml";

/// Requests that may queue in the service mailbox before callers wait.
const MAILBOX_SIZE: usize = 64;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, seeding, or the exerciser session
/// fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let path = std::env::var("DOPEWARS_CONFIG").unwrap_or_else(|_| CONFIG_PATH.to_owned());
    let (config, from_file) = load_config(Path::new(&path)).context("loading configuration")?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.logging.level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("dopewars-engine starting");
    if !from_file {
        info!(path = %path, "Config file not found, using defaults");
    }
    info!(
        cities = config.world.cities,
        districts_per_city = config.world.districts_per_city,
        item_types = config.world.item_types,
        seed = config.world.seed,
        min_turn_lockout = config.turn.min_turn_lockout,
        "Configuration loaded"
    );

    // 3. Build and seed the engine.
    let mut engine = GameEngine::new(config.clone()).map_err(EngineError::from)?;
    engine
        .admin_seed_linear(config.markets.item_step, config.markets.money_step)
        .map_err(EngineError::from)
        .context("seeding markets")?;

    let plan = SessionPlan {
        players: config.exerciser.players,
        turns: config.exerciser.turns,
        location_count: engine.location_count(),
        item_types: config.world.item_types,
    };

    // 4. Start the turn service.
    let (handle, task) = TurnService::spawn(engine, MAILBOX_SIZE);

    // 5. Run the exerciser.
    let rng = config
        .exerciser
        .seed
        .map_or_else(|| SmallRng::from_rng(&mut rand::rng()), SmallRng::seed_from_u64);
    let summary = Exerciser::new(handle.clone(), plan, rng)
        .run()
        .await
        .context("running exerciser session")?;

    // 6. Shut down and report.
    handle.shutdown().await.map_err(EngineError::from)?;
    let engine = task.await.map_err(EngineError::from)?;

    info!(
        tick = engine.read_game_clock(),
        journaled = engine.journal().len(),
        players = engine.users().len(),
        markets = engine.markets().len(),
        accepted = summary.accepted,
        rejected = summary.rejected,
        "dopewars-engine finished"
    );
    Ok(())
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist. The flag reports whether the file was read.
fn load_config(path: &Path) -> Result<(EngineConfig, bool), EngineError> {
    if path.exists() {
        Ok((EngineConfig::from_file(path)?, true))
    } else {
        Ok((EngineConfig::default(), false))
    }
}
