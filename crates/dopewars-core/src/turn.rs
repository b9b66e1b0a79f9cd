//! Turn orchestration: the state machine behind `have_turn`.
//!
//! Each call runs these phases once, in order, with no reentry:
//!
//! 1. **Cooldown check** -- validate ids and quantity, then reject if the
//!    player's lockout has not elapsed. A failure here, or in any later
//!    phase before settlement, ends in `Rejected` with no side effects.
//!
//! 2. **Trading** -- quote the curve, roll the turn's events, and execute
//!    the trade on staged copies of the player and pool unless the dealer
//!    dashed. The rolls are drawn here because the dash gate decides
//!    whether the trade happens; their factors are applied in the next
//!    phase. Conservation of the trade step is verified before moving on.
//!
//! 3. **Event resolution** -- derive factors and scale the player's item
//!    and money and the traded pool's item reserve. Compute neighbor pool
//!    adjustments for the regional factor.
//!
//! 4. **Settlement** -- advance the clock and commit every staged value.
//!    This is the only phase that mutates engine state and nothing in it
//!    can fail after the clock has advanced.
//!
//! 5. **Logged** -- journal the [`TurnRecord`] and return the [`TurnLog`].

use chrono::Utc;
use tracing::{debug, error, info, warn};

use dopewars_market::{
    ConservationResult, MarketBook, TradeSnapshot, UserLedger, amm, credit, debit, verify_trade,
};
use dopewars_types::{
    AmountTrail, Direction, ItemId, LocationId, MarketPool, NEUTRAL_FACTOR, RegionalAdjustment,
    TurnEvents, TurnFactors, TurnId, TurnLog, TurnRecord, TurnRequest, UserAccount, UserId,
};

use crate::clock::{GameClock, cooldown_elapsed};
use crate::config::{ConfigError, EngineConfig, ZeroOutputPolicy};
use crate::error::{TurnError, overflow};
use crate::events::{EventEngine, apply_factor};
use crate::journal::TurnJournal;
use crate::random::{PseudoRandom, XorShiftRandom, turn_seed};
use crate::region::{CityDistricts, Neighborhood, RegionalPropagator};

/// The whole mutable game: clock, markets, players, and journal.
///
/// All mutation goes through [`GameEngine::have_turn`] and the admin
/// initializers. The engine is single-threaded; wrap it in
/// [`TurnService`](crate::service::TurnService) to share it across tasks.
pub struct GameEngine {
    pub(crate) config: EngineConfig,
    pub(crate) location_count: u32,
    clock: GameClock,
    pub(crate) markets: MarketBook,
    pub(crate) users: UserLedger,
    journal: TurnJournal,
    events: EventEngine,
    propagator: RegionalPropagator,
    random: Box<dyn PseudoRandom>,
}

impl core::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GameEngine")
            .field("tick", &self.clock.tick())
            .field("markets", &self.markets.len())
            .field("users", &self.users.len())
            .field("journal", &self.journal.len())
            .finish_non_exhaustive()
    }
}

/// Values staged by the trading phase.
struct Traded {
    trade_occurs: bool,
    events: TurnEvents,
    account: UserAccount,
    pool: MarketPool,
    user_item: (u64, u64),
    user_money: (u64, u64),
    market_item: (u64, u64),
    market_money: (u64, u64),
}

/// Values staged by the event-resolution phase.
struct Resolved {
    log: TurnLog,
    account: UserAccount,
    pool: MarketPool,
    neighbors: Vec<(RegionalAdjustment, MarketPool)>,
}

impl GameEngine {
    /// Create an engine with the default randomness and neighborhood.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails validation.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_random(config, Box::new(XorShiftRandom::new()))
    }

    /// Create an engine with an injected randomness source.
    pub fn with_random(
        config: EngineConfig,
        random: Box<dyn PseudoRandom>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let location_count = config
            .world
            .location_count()
            .ok_or_else(|| ConfigError::Invalid {
                reason: "cities * districts_per_city overflows".to_owned(),
            })?;
        let neighborhood = CityDistricts::new(config.world.districts_per_city, location_count);
        Ok(Self {
            location_count,
            clock: GameClock::new(),
            markets: MarketBook::new(),
            users: UserLedger::new(),
            journal: TurnJournal::new(),
            events: EventEngine::new(config.events.clone()),
            propagator: RegionalPropagator::new(config.region.breadth, Box::new(neighborhood)),
            random,
            config,
        })
    }

    /// Replace the neighborhood used for regional propagation.
    #[must_use]
    pub fn with_neighborhood(mut self, neighborhood: Box<dyn Neighborhood>) -> Self {
        self.propagator = RegionalPropagator::new(self.config.region.breadth, neighborhood);
        self
    }

    // -----------------------------------------------------------------------
    // Read operations
    // -----------------------------------------------------------------------

    /// The configuration the engine runs with.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of locations in the world.
    pub const fn location_count(&self) -> u32 {
        self.location_count
    }

    /// Current global tick.
    pub const fn read_game_clock(&self) -> u64 {
        self.clock.tick()
    }

    /// A player's state. Unknown players read as a fresh account.
    pub fn check_user_state(&self, user: UserId) -> UserAccount {
        self.users
            .snapshot_or_new(user, self.config.economy.starting_money)
    }

    /// A market's reserves.
    pub fn check_market_state(
        &self,
        location: LocationId,
        item: ItemId,
    ) -> Result<MarketPool, TurnError> {
        self.validate_ids(location, item)?;
        Ok(self.markets.get(location, item)?)
    }

    /// The record of the turn accepted at `tick`.
    pub fn view_given_turn(&self, tick: u64) -> Option<&TurnRecord> {
        self.journal.get(tick)
    }

    /// The full turn journal.
    pub const fn journal(&self) -> &TurnJournal {
        &self.journal
    }

    /// Every market pool.
    pub const fn markets(&self) -> &MarketBook {
        &self.markets
    }

    /// Every known player.
    pub const fn users(&self) -> &UserLedger {
        &self.users
    }

    // -----------------------------------------------------------------------
    // Turn
    // -----------------------------------------------------------------------

    /// Take one turn: trade at a market, then suffer or enjoy events.
    ///
    /// `give` is currency on a buy and the item on a sell.
    pub fn have_turn(
        &mut self,
        user: UserId,
        location: LocationId,
        direction: Direction,
        item: ItemId,
        give: u64,
    ) -> Result<TurnLog, TurnError> {
        self.take_turn(TurnRequest {
            user,
            location,
            direction,
            item,
            give_quantity: give,
        })
    }

    /// Take one turn from a prepared request.
    pub fn take_turn(&mut self, request: TurnRequest) -> Result<TurnLog, TurnError> {
        let (account, tick) = self.phase_cooldown_check(&request).inspect_err(|err| {
            warn!(user = request.user.get(), %err, "Turn rejected");
        })?;
        let traded = self.phase_trading(&request, account, tick).inspect_err(|err| {
            warn!(user = request.user.get(), tick, %err, "Turn rejected");
        })?;
        let resolved = self
            .phase_event_resolution(&request, traded)
            .inspect_err(|err| {
                warn!(user = request.user.get(), tick, %err, "Turn rejected");
            })?;
        let tick = self.phase_settlement(&request, &resolved)?;
        Ok(self.phase_logged(request, tick, resolved))
    }

    fn validate_ids(&self, location: LocationId, item: ItemId) -> Result<(), TurnError> {
        if location.get() >= self.location_count {
            return Err(TurnError::InvalidLocation {
                location,
                location_count: self.location_count,
            });
        }
        if item.is_currency() || item.get() > self.config.world.item_types {
            return Err(TurnError::InvalidItem {
                item,
                item_types: self.config.world.item_types,
            });
        }
        Ok(())
    }

    /// Phase 1: ids, quantity, and lockout.
    fn phase_cooldown_check(&self, request: &TurnRequest) -> Result<(UserAccount, u64), TurnError> {
        self.validate_ids(request.location, request.item)?;
        if request.give_quantity == 0 {
            return Err(TurnError::ZeroQuantity);
        }

        let account = self.check_user_state(request.user);
        let attempted_tick = self.clock.next_tick()?;
        let lockout = self.config.turn.min_turn_lockout;
        if !cooldown_elapsed(account.last_turn_tick, attempted_tick, lockout) {
            return Err(TurnError::LockoutViolation {
                user: request.user,
                last_turn_tick: account.last_turn_tick.unwrap_or_default(),
                attempted_tick,
                lockout,
            });
        }

        debug!(user = request.user.get(), attempted_tick, "Cooldown check passed");
        Ok((account, attempted_tick))
    }

    /// Phase 2: quote, roll, and trade on staged copies.
    fn phase_trading(
        &mut self,
        request: &TurnRequest,
        mut account: UserAccount,
        tick: u64,
    ) -> Result<Traded, TurnError> {
        let TurnRequest {
            user,
            location,
            direction,
            item,
            give_quantity: give,
        } = *request;

        let pool_before = self.markets.get(location, item)?;
        let (give_item, get_item) = match direction {
            Direction::Buy => (ItemId::CURRENCY, item),
            Direction::Sell => (item, ItemId::CURRENCY),
        };
        let held = account.balance(give_item);
        if give > held {
            return Err(TurnError::InsufficientFunds {
                item: give_item,
                held,
                requested: give,
            });
        }

        let outcome = amm::trade(pool_before, direction, give)?;
        let zero_output = outcome.received == 0;
        if zero_output && self.config.turn.zero_output_policy == ZeroOutputPolicy::Reject {
            return Err(TurnError::ZeroOutput {
                location,
                item,
                direction,
                give,
            });
        }

        let seed = turn_seed(self.config.world.seed, tick, user, location);
        let events = self.events.roll(self.random.derive(seed));

        let before = TradeSnapshot {
            user_item: account.item_balance(item),
            user_money: account.money,
            pool: pool_before,
        };

        let trade_occurs = events.trade_gate_open() && !zero_output;
        let pool = if trade_occurs {
            debit(&mut account, give_item, give)?;
            credit(&mut account, get_item, outcome.received)?;
            outcome.pool
        } else {
            pool_before
        };

        let after = TradeSnapshot {
            user_item: account.item_balance(item),
            user_money: account.money,
            pool,
        };
        if let ConservationResult::Anomaly(anomaly) = verify_trade(location, item, before, after) {
            error!(tick, %anomaly, "Trade conservation violated");
            return Err(TurnError::ConservationViolated {
                message: anomaly.message,
            });
        }

        debug!(
            user = user.get(),
            tick,
            trade_occurs,
            received = if trade_occurs { outcome.received } else { 0 },
            "Trading phase complete"
        );

        Ok(Traded {
            trade_occurs,
            events,
            account,
            pool,
            user_item: (before.user_item, after.user_item),
            user_money: (before.user_money, after.user_money),
            market_item: (before.pool.item_reserve, after.pool.item_reserve),
            market_money: (before.pool.money_reserve, after.pool.money_reserve),
        })
    }

    /// Phase 3: factors on the player and pools.
    fn phase_event_resolution(
        &self,
        request: &TurnRequest,
        traded: Traded,
    ) -> Result<Resolved, TurnError> {
        let Traded {
            trade_occurs,
            events,
            mut account,
            mut pool,
            user_item,
            user_money,
            market_item,
            market_money,
        } = traded;

        let factors: TurnFactors = self.events.factors(&events);

        let user_item_post = apply_factor(factors.item_reduction_factor, user_item.1)
            .ok_or_else(|| overflow("user item after events"))?;
        let user_money_post = apply_factor(factors.money_reduction_factor, user_money.1)
            .ok_or_else(|| overflow("user money after events"))?;
        let market_item_post = apply_factor(factors.regional_item_reduction_factor, market_item.1)
            .ok_or_else(|| overflow("market item after events"))?;

        account.set_item_balance(request.item, user_item_post);
        account.money = user_money_post;
        pool.item_reserve = market_item_post;

        let neighbors = self
            .propagator
            .neighbor_adjustments(
                &self.markets,
                request.location,
                request.item,
                factors.regional_item_reduction_factor,
            )?
            .into_iter()
            .map(|adjustment| -> Result<_, TurnError> {
                let money_reserve = self
                    .markets
                    .get(adjustment.location, adjustment.item)
                    .map(|p| p.money_reserve)?;
                Ok((
                    adjustment,
                    MarketPool::new(adjustment.item_after, money_reserve),
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let log = TurnLog {
            trade_occurs,
            user_item: trail(user_item, user_item_post),
            user_money: trail(user_money, user_money_post),
            market_item: trail(market_item, market_item_post),
            market_money: trail(market_money, market_money.1),
            factors,
            events,
        };

        debug!(
            user = request.user.get(),
            fired = ?events.fired(),
            item_factor = factors.item_reduction_factor,
            money_factor = factors.money_reduction_factor,
            regional_factor = factors.regional_item_reduction_factor,
            "Event resolution complete"
        );

        Ok(Resolved {
            log,
            account,
            pool,
            neighbors,
        })
    }

    /// Phase 4: advance the clock, then commit every staged value.
    fn phase_settlement(
        &mut self,
        request: &TurnRequest,
        resolved: &Resolved,
    ) -> Result<u64, TurnError> {
        // The only fallible step, taken before anything is written.
        let tick = self.clock.advance()?;

        let mut account = resolved.account.clone();
        account.location = Some(request.location);
        account.last_turn_tick = Some(tick);
        self.users.commit(request.user, account);

        self.markets.set(request.location, request.item, resolved.pool);
        for (adjustment, pool) in &resolved.neighbors {
            self.markets.set(adjustment.location, adjustment.item, *pool);
        }

        Ok(tick)
    }

    /// Phase 5: journal the record and hand back the log.
    fn phase_logged(&mut self, request: TurnRequest, tick: u64, resolved: Resolved) -> TurnLog {
        let Resolved { log, neighbors, .. } = resolved;

        let mut regional = Vec::with_capacity(neighbors.len().saturating_add(1));
        if log.factors.regional_item_reduction_factor != NEUTRAL_FACTOR {
            regional.push(RegionalAdjustment {
                location: request.location,
                item: request.item,
                item_before: log.market_item.post_trade_pre_event,
                item_after: log.market_item.post_trade_post_event,
            });
        }
        regional.extend(neighbors.into_iter().map(|(adjustment, _)| adjustment));

        let record = TurnRecord {
            id: TurnId::new(),
            tick,
            request,
            log,
            regional,
            created_at: Utc::now(),
        };
        if self.journal.record(record).is_some() {
            error!(tick, "Journal already held a record for this tick");
        }

        info!(
            tick,
            user = request.user.get(),
            location = request.location.get(),
            item = request.item.get(),
            direction = ?request.direction,
            give = request.give_quantity,
            trade_occurs = log.trade_occurs,
            "Turn accepted"
        );
        log
    }
}

const fn trail((pre_trade, post_trade_pre_event): (u64, u64), post_trade_post_event: u64) -> AmountTrail {
    AmountTrail {
        pre_trade,
        post_trade_pre_event,
        post_trade_post_event,
    }
}
