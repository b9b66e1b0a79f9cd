//! Turn rejection taxonomy.
//!
//! Every variant aborts the whole turn before settlement: no balance, no
//! pool, no journal entry, and no clock tick is consumed. A rejected turn
//! may be resubmitted immediately.

use dopewars_market::MarketError;
use dopewars_types::{Direction, ItemId, LocationId, UserId};

use crate::clock::ClockError;

/// Why a turn was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    /// The player's cooldown has not elapsed.
    #[error(
        "user {user} acted at tick {last_turn_tick}; tick {attempted_tick} is inside the {lockout}-tick lockout"
    )]
    LockoutViolation {
        /// The rejected player.
        user: UserId,
        /// Tick of the player's last accepted turn.
        last_turn_tick: u64,
        /// Tick this turn would have been recorded at.
        attempted_tick: u64,
        /// Configured minimum gap.
        lockout: u64,
    },

    /// The location id is outside the configured world.
    #[error("location {location} out of range (world has {location_count} locations)")]
    InvalidLocation {
        /// The rejected location.
        location: LocationId,
        /// Number of configured locations.
        location_count: u32,
    },

    /// The item id is the currency or above the configured item count.
    #[error("item {item} out of range (tradeable items are 1..={item_types})")]
    InvalidItem {
        /// The rejected item.
        item: ItemId,
        /// Number of configured item types.
        item_types: u32,
    },

    /// The player gave more than they hold of the given side.
    #[error("insufficient funds: held {held} of item {item}, requested {requested}")]
    InsufficientFunds {
        /// The asset given (item 0 is the currency).
        item: ItemId,
        /// Amount held.
        held: u64,
        /// Amount the turn tried to give.
        requested: u64,
    },

    /// A quantity left the numeric domain.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: &'static str,
    },

    /// The turn gave nothing.
    #[error("give quantity must be non-zero")]
    ZeroQuantity,

    /// The trade would hand the player nothing and the policy rejects that.
    #[error("{direction:?} of {give} at location {location} item {item} returns nothing")]
    ZeroOutput {
        /// The traded location.
        location: LocationId,
        /// The traded item.
        item: ItemId,
        /// Trade direction.
        direction: Direction,
        /// Quantity given.
        give: u64,
    },

    /// The market for this location and item was never seeded.
    #[error("no market seeded for item {item} at location {location}")]
    MarketNotSeeded {
        /// The traded location.
        location: LocationId,
        /// The traded item.
        item: ItemId,
    },

    /// The trade step created or destroyed value. Never expected.
    #[error("conservation violated: {message}")]
    ConservationViolated {
        /// Anomaly description.
        message: String,
    },

    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

impl From<MarketError> for TurnError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::ZeroQuantity => Self::ZeroQuantity,
            MarketError::ArithmeticOverflow { context } => Self::ArithmeticOverflow { context },
            MarketError::InsufficientBalance {
                item,
                held,
                requested,
            } => Self::InsufficientFunds {
                item,
                held,
                requested,
            },
            MarketError::UnknownPool { location, item } => Self::MarketNotSeeded { location, item },
        }
    }
}

/// Shorthand for an overflow rejection.
pub(crate) const fn overflow(context: &'static str) -> TurnError {
    TurnError::ArithmeticOverflow { context }
}
