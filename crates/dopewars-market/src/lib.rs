//! Constant-product markets and player balances for the Dope Wars engine.
//!
//! Every unit of currency and every commodity unit that changes hands in a
//! trade moves between exactly two holders: a player and a market pool.
//! Nothing is minted and nothing is burned by the trade step; event
//! factors applied later by the turn orchestrator are the only source of
//! gains and losses.
//!
//! # Modules
//!
//! - [`amm`] -- The constant-product curve: trades, quotes, and prices.
//! - [`pools`] -- [`MarketBook`], the keyed store of `(location, item)` pools.
//! - [`ledger`] -- [`UserLedger`], the keyed store of player accounts.
//! - [`conservation`] -- Verification that a trade moved value without
//!   creating or destroying it.
//!
//! # Curve
//!
//! ```text
//! buy  (give g money): item_out  = floor(item  * g / (money + g))
//! sell (give g item):  money_out = floor(money * g / (item  + g))
//! ```
//!
//! Intermediate products are computed in `u128`, so the curve never
//! overflows for `u64` reserves; only reserve growth past `u64::MAX` is
//! rejected.
//!
//! # Usage
//!
//! ```
//! use dopewars_market::amm;
//! use dopewars_types::{Direction, MarketPool};
//!
//! let pool = MarketPool::new(200, 2_000);
//! let outcome = amm::trade(pool, Direction::Buy, 2_000).ok();
//! assert_eq!(outcome.map(|o| o.received), Some(100));
//! assert_eq!(outcome.map(|o| o.pool), Some(MarketPool::new(100, 4_000)));
//! ```

pub mod amm;
pub mod conservation;
pub mod ledger;
pub mod pools;

// Re-export primary types at crate root.
pub use amm::{TradeOutcome, price_for_one, quote, spot_price, trade};
pub use conservation::{ConservationResult, TradeSnapshot, verify_trade};
pub use ledger::{UserLedger, credit, debit};
pub use pools::MarketBook;

use std::collections::BTreeMap;

use dopewars_types::{ItemId, LocationId};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while pricing a trade or moving balances.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketError {
    /// The quantity given into a trade was zero.
    #[error("trade quantity must be non-zero")]
    ZeroQuantity,

    /// A balance or reserve would leave the `u64` domain.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: &'static str,
    },

    /// A holder does not have enough of an asset.
    #[error("insufficient {item} balance: held {held}, requested {requested}")]
    InsufficientBalance {
        /// The asset (item 0 is the currency).
        item: ItemId,
        /// Amount held.
        held: u64,
        /// Amount requested.
        requested: u64,
    },

    /// No market exists for the location and item.
    #[error("no market for item {item} at location {location}")]
    UnknownPool {
        /// The location queried.
        location: LocationId,
        /// The item queried.
        item: ItemId,
    },
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A conservation violation detected while verifying a trade.
///
/// The turn orchestrator treats this as a fatal integrity alert: the turn
/// is aborted before settlement and the anomaly is logged at `error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeAnomaly {
    /// The market that was traded against.
    pub location: LocationId,
    /// The traded item.
    pub item: ItemId,
    /// Per-asset totals `(before, after)` for each asset that did not
    /// balance. Item 0 is the currency.
    pub imbalances: BTreeMap<ItemId, (u128, u128)>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for TradeAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
