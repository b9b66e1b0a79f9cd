//! Random-stimulus exerciser.
//!
//! Simulated players take turns in round-robin order against a running
//! [`TurnService`](dopewars_core::TurnService). On each turn a player:
//!
//! 1. reads their own account,
//! 2. visits locations in shuffled order and lists every affordable action
//!    (buy when they can pay for at least one unit, sell when they hold the
//!    item), stopping at the first location that offers anything,
//! 3. picks one action at random and a random give quantity for it,
//! 4. submits it and records whether the engine accepted it.
//!
//! A player with nothing to do anywhere is benched for the rest of the
//! session. The session ends early once every player is benched.

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use tracing::{debug, info, warn};

use dopewars_core::{ServiceError, TurnHandle};
use dopewars_market::price_for_one;
use dopewars_types::{Direction, ItemId, LocationId, TurnRequest, UserId};

use crate::error::EngineError;

/// Shape of an exerciser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPlan {
    /// Number of simulated players (ids `0..players`).
    pub players: u32,
    /// Number of turns to attempt.
    pub turns: u32,
    /// Number of locations in the world.
    pub location_count: u32,
    /// Number of commodity types (ids `1..=item_types`).
    pub item_types: u32,
}

/// Counters collected over a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Turns submitted to the engine.
    pub submitted: u32,
    /// Submitted turns the engine accepted.
    pub accepted: u32,
    /// Accepted turns whose trade went through (not dashed, not a no-op).
    pub traded: u32,
    /// Submitted turns the engine rejected.
    pub rejected: u32,
    /// Players benched because they had no affordable action.
    pub benched: u32,
}

/// One affordable action found while scanning markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Buy {
        location: LocationId,
        item: ItemId,
        price_for_one: u64,
        max_give: u64,
    },
    Sell {
        location: LocationId,
        item: ItemId,
        held: u64,
    },
}

impl Action {
    fn into_request<R: Rng>(self, user: UserId, rng: &mut R) -> TurnRequest {
        match self {
            Self::Buy {
                location,
                item,
                price_for_one,
                max_give,
            } => TurnRequest {
                user,
                location,
                direction: Direction::Buy,
                item,
                give_quantity: rng.random_range(price_for_one..=max_give),
            },
            Self::Sell {
                location,
                item,
                held,
            } => TurnRequest {
                user,
                location,
                direction: Direction::Sell,
                item,
                give_quantity: rng.random_range(1..=held),
            },
        }
    }
}

/// Drives simulated players against a turn service.
pub struct Exerciser<R> {
    handle: TurnHandle,
    plan: SessionPlan,
    rng: R,
}

impl<R: Rng> Exerciser<R> {
    /// Create an exerciser that submits through `handle`.
    pub const fn new(handle: TurnHandle, plan: SessionPlan, rng: R) -> Self {
        Self { handle, plan, rng }
    }

    /// Run the whole session and return its counters.
    ///
    /// Turn rejections are expected and counted. Only a stopped service
    /// ends the session with an error.
    pub async fn run(&mut self) -> Result<SessionSummary, EngineError> {
        let mut summary = SessionSummary::default();
        let mut benched: BTreeSet<UserId> = BTreeSet::new();

        info!(
            players = self.plan.players,
            turns = self.plan.turns,
            "Exerciser session starting"
        );

        for turn in 0..self.plan.turns {
            let Some(slot) = turn.checked_rem(self.plan.players) else {
                break;
            };
            let user = UserId::new(u64::from(slot));
            if benched.len() >= usize::try_from(self.plan.players).unwrap_or(usize::MAX) {
                info!(turn, "Every player is benched, ending session");
                break;
            }
            if benched.contains(&user) {
                continue;
            }

            let actions = self.scan(user).await?;
            let Some(action) = actions.choose(&mut self.rng).copied() else {
                debug!(user = user.get(), "No affordable action, benching player");
                benched.insert(user);
                summary.benched = summary.benched.saturating_add(1);
                continue;
            };
            let request = action.into_request(user, &mut self.rng);

            summary.submitted = summary.submitted.saturating_add(1);
            match self.handle.have_turn(request).await {
                Ok(log) => {
                    summary.accepted = summary.accepted.saturating_add(1);
                    if log.trade_occurs {
                        summary.traded = summary.traded.saturating_add(1);
                    }
                    debug!(
                        turn,
                        user = user.get(),
                        location = request.location.get(),
                        item = request.item.get(),
                        direction = ?request.direction,
                        give = request.give_quantity,
                        trade_occurs = log.trade_occurs,
                        "Exerciser turn completed"
                    );
                }
                Err(ServiceError::Turn(err)) => {
                    summary.rejected = summary.rejected.saturating_add(1);
                    warn!(turn, user = user.get(), error = %err, "Exerciser turn rejected");
                }
                Err(err) => return Err(err.into()),
            }
        }

        info!(
            submitted = summary.submitted,
            accepted = summary.accepted,
            traded = summary.traded,
            rejected = summary.rejected,
            benched = summary.benched,
            "Exerciser session finished"
        );
        Ok(summary)
    }

    /// List the affordable actions at the first location that has any.
    async fn scan(&mut self, user: UserId) -> Result<Vec<Action>, EngineError> {
        let account = self.handle.check_user_state(user).await?;

        let mut locations: Vec<LocationId> =
            (0..self.plan.location_count).map(LocationId::new).collect();
        locations.shuffle(&mut self.rng);
        let mut items: Vec<ItemId> = (1..=self.plan.item_types).map(ItemId::new).collect();

        let mut actions = Vec::new();
        for location in locations {
            items.shuffle(&mut self.rng);
            for &item in &items {
                let pool = match self.handle.check_market_state(location, item).await {
                    Ok(pool) => pool,
                    // Unseeded market.
                    Err(ServiceError::Turn(_)) => continue,
                    Err(err) => return Err(err.into()),
                };
                if let Some(price) = price_for_one(pool).filter(|&price| account.money >= price) {
                    actions.push(Action::Buy {
                        location,
                        item,
                        price_for_one: price,
                        max_give: account.money,
                    });
                }
                let held = account.item_balance(item);
                if held > 0 {
                    actions.push(Action::Sell {
                        location,
                        item,
                        held,
                    });
                }
            }
            if !actions.is_empty() {
                break;
            }
        }
        Ok(actions)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use dopewars_core::config::{EventOdds, WorldConfig, ZeroOutputPolicy};
    use dopewars_core::{EngineConfig, GameEngine, TurnService};

    use super::*;

    fn small_engine(odds: u8) -> GameEngine {
        let mut config = EngineConfig {
            world: WorldConfig {
                cities: 2,
                districts_per_city: 2,
                item_types: 3,
                seed: 11,
            },
            ..EngineConfig::default()
        };
        config.events.odds = EventOdds::uniform(odds);
        config.turn.zero_output_policy = ZeroOutputPolicy::NoOp;
        let mut engine = GameEngine::new(config).unwrap();
        engine.admin_seed_linear(200, 2000).unwrap();
        engine
    }

    fn plan(players: u32, turns: u32) -> SessionPlan {
        SessionPlan {
            players,
            turns,
            location_count: 4,
            item_types: 3,
        }
    }

    #[tokio::test]
    async fn quiet_session_accepts_every_turn() {
        let (handle, task) = TurnService::spawn(small_engine(0), 16);
        let mut exerciser = Exerciser::new(handle.clone(), plan(5, 40), SmallRng::seed_from_u64(7));

        let summary = exerciser.run().await.unwrap();
        handle.shutdown().await.unwrap();
        let engine = task.await.unwrap();

        // Five players rotate, so the three-tick cooldown never bites.
        assert_eq!(summary.rejected, 0);
        assert_eq!(summary.accepted, summary.submitted);
        assert!(summary.traded <= summary.accepted);
        assert_eq!(u64::from(summary.accepted), engine.read_game_clock());
        assert_eq!(engine.journal().len(), usize::try_from(summary.accepted).unwrap());
    }

    #[tokio::test]
    async fn too_few_players_trip_the_cooldown() {
        let (handle, task) = TurnService::spawn(small_engine(0), 16);
        let mut exerciser = Exerciser::new(handle.clone(), plan(2, 10), SmallRng::seed_from_u64(3));

        let summary = exerciser.run().await.unwrap();
        handle.shutdown().await.unwrap();
        task.await.unwrap();

        assert!(summary.rejected > 0);
        assert_eq!(summary.accepted + summary.rejected, summary.submitted);
    }

    #[tokio::test]
    async fn broke_players_are_benched() {
        let mut engine = small_engine(0);
        engine.admin_set_user_amount(3, 0);
        let (handle, task) = TurnService::spawn(engine, 16);
        let mut exerciser = Exerciser::new(handle.clone(), plan(3, 9), SmallRng::seed_from_u64(1));

        let summary = exerciser.run().await.unwrap();
        handle.shutdown().await.unwrap();
        task.await.unwrap();

        assert_eq!(summary.benched, 3);
        assert_eq!(summary.submitted, 0);
    }

    #[tokio::test]
    async fn stopped_service_ends_the_session() {
        let (handle, task) = TurnService::spawn(small_engine(0), 4);
        handle.shutdown().await.unwrap();
        task.await.unwrap();

        let mut exerciser = Exerciser::new(handle, plan(3, 3), SmallRng::seed_from_u64(2));
        let result = exerciser.run().await;
        assert!(matches!(
            result,
            Err(EngineError::Service {
                source: ServiceError::Closed
            })
        ));
    }
}
