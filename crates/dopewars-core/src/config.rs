//! Configuration loading and typed config structures for the turn engine.
//!
//! The canonical configuration lives in `dopewars-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure and a loader that reads and validates the file. Every
//! field has a default, so an empty document is a valid configuration.

use std::path::Path;

use serde::Deserialize;

use dopewars_types::EventKind;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an unusable world.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `dopewars-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// World geometry and seed.
    #[serde(default)]
    pub world: WorldConfig,

    /// Turn acceptance rules.
    #[serde(default)]
    pub turn: TurnConfig,

    /// Player economy parameters.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Event odds and factor magnitudes.
    #[serde(default)]
    pub events: EventConfig,

    /// Regional propagation policy.
    #[serde(default)]
    pub region: RegionConfig,

    /// Linear market seed used at startup.
    #[serde(default)]
    pub markets: MarketSeedConfig,

    /// Random-stimulus exerciser session.
    #[serde(default)]
    pub exerciser: ExerciserConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.cities == 0 || self.world.districts_per_city == 0 {
            return Err(invalid("world must have at least one city and one district"));
        }
        if self.world.item_types == 0 {
            return Err(invalid("world must have at least one item type"));
        }
        if self.world.location_count().is_none() {
            return Err(invalid("cities * districts_per_city overflows"));
        }
        self.events.validate()
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// World geometry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Number of cities.
    #[serde(default = "default_cities")]
    pub cities: u32,

    /// Districts in each city. Locations in one city form a neighborhood.
    #[serde(default = "default_districts_per_city")]
    pub districts_per_city: u32,

    /// Number of tradeable items (ids `1..=item_types`).
    #[serde(default = "default_item_types")]
    pub item_types: u32,

    /// Seed mixed into every turn's event rolls.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl WorldConfig {
    /// Total number of locations, or `None` on overflow.
    pub const fn location_count(&self) -> Option<u32> {
        self.cities.checked_mul(self.districts_per_city)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            cities: default_cities(),
            districts_per_city: default_districts_per_city(),
            item_types: default_item_types(),
            seed: default_seed(),
        }
    }
}

/// What to do when a trade would hand the player nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroOutputPolicy {
    /// Reject the turn with `TurnError::ZeroOutput`.
    #[default]
    Reject,
    /// Accept the turn but skip the trade (`trade_occurs = false`).
    NoOp,
}

/// Turn acceptance rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TurnConfig {
    /// Minimum global ticks between two accepted turns of one player.
    #[serde(default = "default_min_turn_lockout")]
    pub min_turn_lockout: u64,

    /// Handling of trades whose curve output rounds to zero.
    #[serde(default)]
    pub zero_output_policy: ZeroOutputPolicy,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            min_turn_lockout: default_min_turn_lockout(),
            zero_output_policy: ZeroOutputPolicy::default(),
        }
    }
}

/// Player economy parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EconomyConfig {
    /// Currency held by a player seen for the first time in a turn.
    #[serde(default = "default_starting_money")]
    pub starting_money: u64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_money: default_starting_money(),
        }
    }
}

/// Odds (percent, `0..=100`) that each event fires on a turn.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventOdds {
    /// Dealer runs off.
    #[serde(default = "default_rare_odds")]
    pub dealer_dash: u8,
    /// Player catches the dealer.
    #[serde(default = "default_counter_odds")]
    pub wrangle_dashed_dealer: u8,
    /// Player is mugged.
    #[serde(default = "default_mugging_odds")]
    pub mugging: u8,
    /// Player escapes the mugger.
    #[serde(default = "default_counter_odds")]
    pub run_from_mugging: u8,
    /// Gang war breaks out.
    #[serde(default = "default_rare_odds")]
    pub gang_war: u8,
    /// Player defends in the gang war.
    #[serde(default = "default_counter_odds")]
    pub defend_gang_war: u8,
    /// Police raid.
    #[serde(default = "default_rare_odds")]
    pub cop_raid: u8,
    /// Player bribes the police.
    #[serde(default = "default_counter_odds")]
    pub bribe_cops: u8,
    /// Player finds a stash.
    #[serde(default = "default_rare_odds")]
    pub find_item: u8,
    /// Shipment arrives in the city.
    #[serde(default = "default_rare_odds")]
    pub local_shipment: u8,
    /// Warehouse stock seized.
    #[serde(default = "default_rare_odds")]
    pub warehouse_seizure: u8,
}

impl Default for EventOdds {
    fn default() -> Self {
        Self {
            dealer_dash: default_rare_odds(),
            wrangle_dashed_dealer: default_counter_odds(),
            mugging: default_mugging_odds(),
            run_from_mugging: default_counter_odds(),
            gang_war: default_rare_odds(),
            defend_gang_war: default_counter_odds(),
            cop_raid: default_rare_odds(),
            bribe_cops: default_counter_odds(),
            find_item: default_rare_odds(),
            local_shipment: default_rare_odds(),
            warehouse_seizure: default_rare_odds(),
        }
    }
}

impl EventOdds {
    /// Odds for one event.
    pub const fn get(&self, kind: EventKind) -> u8 {
        match kind {
            EventKind::DealerDash => self.dealer_dash,
            EventKind::WrangleDashedDealer => self.wrangle_dashed_dealer,
            EventKind::Mugging => self.mugging,
            EventKind::RunFromMugging => self.run_from_mugging,
            EventKind::GangWar => self.gang_war,
            EventKind::DefendGangWar => self.defend_gang_war,
            EventKind::CopRaid => self.cop_raid,
            EventKind::BribeCops => self.bribe_cops,
            EventKind::FindItem => self.find_item,
            EventKind::LocalShipment => self.local_shipment,
            EventKind::WarehouseSeizure => self.warehouse_seizure,
        }
    }

    /// The same odds for every event (`0` never fires, `100` always fires).
    pub const fn uniform(percent: u8) -> Self {
        Self {
            dealer_dash: percent,
            wrangle_dashed_dealer: percent,
            mugging: percent,
            run_from_mugging: percent,
            gang_war: percent,
            defend_gang_war: percent,
            cop_raid: percent,
            bribe_cops: percent,
            find_item: percent,
            local_shipment: percent,
            warehouse_seizure: percent,
        }
    }
}

/// Event odds and factor magnitudes.
///
/// Magnitudes are the percentage of the pre-event amount that remains:
/// losses must be below 100, gains above it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventConfig {
    /// Per-event odds.
    #[serde(default)]
    pub odds: EventOdds,

    /// Item kept after a landed police raid.
    #[serde(default = "default_cop_raid_item_pct")]
    pub cop_raid_item_pct: u32,

    /// Item kept after a landed gang war.
    #[serde(default = "default_gang_war_item_pct")]
    pub gang_war_item_pct: u32,

    /// Item scaling when a stash is found.
    #[serde(default = "default_find_item_pct")]
    pub find_item_pct: u32,

    /// Money kept after a landed police raid.
    #[serde(default = "default_cop_raid_money_pct")]
    pub cop_raid_money_pct: u32,

    /// Money kept after a landed mugging.
    #[serde(default = "default_mugging_money_pct")]
    pub mugging_money_pct: u32,

    /// Regional item scaling on a shipment.
    #[serde(default = "default_local_shipment_pct")]
    pub local_shipment_pct: u32,

    /// Regional item scaling on a seizure.
    #[serde(default = "default_warehouse_seizure_pct")]
    pub warehouse_seizure_pct: u32,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            odds: EventOdds::default(),
            cop_raid_item_pct: default_cop_raid_item_pct(),
            gang_war_item_pct: default_gang_war_item_pct(),
            find_item_pct: default_find_item_pct(),
            cop_raid_money_pct: default_cop_raid_money_pct(),
            mugging_money_pct: default_mugging_money_pct(),
            local_shipment_pct: default_local_shipment_pct(),
            warehouse_seizure_pct: default_warehouse_seizure_pct(),
        }
    }
}

impl EventConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for kind in EventKind::ALL {
            if self.odds.get(kind) > 100 {
                return Err(ConfigError::Invalid {
                    reason: format!("odds for {kind} exceed 100 percent"),
                });
            }
        }
        let losses = [
            ("cop_raid_item_pct", self.cop_raid_item_pct),
            ("gang_war_item_pct", self.gang_war_item_pct),
            ("cop_raid_money_pct", self.cop_raid_money_pct),
            ("mugging_money_pct", self.mugging_money_pct),
            ("warehouse_seizure_pct", self.warehouse_seizure_pct),
        ];
        for (name, pct) in losses {
            if pct >= 100 {
                return Err(ConfigError::Invalid {
                    reason: format!("{name} must be below 100, got {pct}"),
                });
            }
        }
        let gains = [
            ("find_item_pct", self.find_item_pct),
            ("local_shipment_pct", self.local_shipment_pct),
        ];
        for (name, pct) in gains {
            if pct <= 100 || pct > MAX_GAIN_PCT {
                return Err(ConfigError::Invalid {
                    reason: format!("{name} must be in 101..={MAX_GAIN_PCT}, got {pct}"),
                });
            }
        }
        Ok(())
    }
}

/// Upper bound for gain magnitudes.
const MAX_GAIN_PCT: u32 = 1_000;

/// How far a regional event reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationBreadth {
    /// Only the traded pool is rescaled.
    TradedMarketOnly,
    /// Every same-item pool in the traded location's neighborhood.
    #[default]
    Neighborhood,
}

/// Regional propagation policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegionConfig {
    /// Breadth of regional events.
    #[serde(default)]
    pub breadth: PropagationBreadth,
}

/// Linear market seed: location `i` starts with `(i + 1) * step`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarketSeedConfig {
    /// Item reserve step.
    #[serde(default = "default_item_step")]
    pub item_step: u64,

    /// Money reserve step.
    #[serde(default = "default_money_step")]
    pub money_step: u64,
}

impl Default for MarketSeedConfig {
    fn default() -> Self {
        Self {
            item_step: default_item_step(),
            money_step: default_money_step(),
        }
    }
}

/// Random-stimulus session run by the binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExerciserConfig {
    /// Number of simulated players.
    #[serde(default = "default_players")]
    pub players: u32,

    /// Number of turn submissions.
    #[serde(default = "default_turns")]
    pub turns: u32,

    /// Seed for the players' choices. Unset means OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ExerciserConfig {
    fn default() -> Self {
        Self {
            players: default_players(),
            turns: default_turns(),
            seed: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_cities() -> u32 {
    19
}

const fn default_districts_per_city() -> u32 {
    4
}

const fn default_item_types() -> u32 {
    19
}

const fn default_seed() -> u64 {
    42
}

const fn default_min_turn_lockout() -> u64 {
    3
}

const fn default_starting_money() -> u64 {
    10_000
}

const fn default_rare_odds() -> u8 {
    10
}

const fn default_mugging_odds() -> u8 {
    15
}

const fn default_counter_odds() -> u8 {
    50
}

const fn default_cop_raid_item_pct() -> u32 {
    70
}

const fn default_gang_war_item_pct() -> u32 {
    80
}

const fn default_find_item_pct() -> u32 {
    150
}

const fn default_cop_raid_money_pct() -> u32 {
    80
}

const fn default_mugging_money_pct() -> u32 {
    85
}

const fn default_local_shipment_pct() -> u32 {
    120
}

const fn default_warehouse_seizure_pct() -> u32 {
    70
}

const fn default_item_step() -> u64 {
    200
}

const fn default_money_step() -> u64 {
    2_000
}

const fn default_players() -> u32 {
    15
}

const fn default_turns() -> u32 {
    100
}

fn default_log_level() -> String {
    "info".to_owned()
}
