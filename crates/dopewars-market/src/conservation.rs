//! Conservation verification for the trade step.
//!
//! A trade moves currency and the traded item between one player and one
//! pool. For both assets the sum held by the pair must be identical
//! before and after:
//!
//! ```text
//! user_item  + pool.item_reserve  == user_item'  + pool'.item_reserve
//! user_money + pool.money_reserve == user_money' + pool'.money_reserve
//! ```
//!
//! The curve guarantees this by construction. The check runs on every
//! turn anyway, before settlement, so a future bug cannot commit a turn
//! that mints or burns value.

use std::collections::BTreeMap;

use dopewars_types::{ItemId, LocationId, MarketPool};

use crate::TradeAnomaly;

/// The result of a conservation check for one trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// Both assets balanced.
    Balanced,
    /// At least one asset changed total.
    Anomaly(TradeAnomaly),
}

/// The balances of one player and one pool at a point in a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeSnapshot {
    /// Player's balance of the traded item.
    pub user_item: u64,
    /// Player's currency balance.
    pub user_money: u64,
    /// The traded pool.
    pub pool: MarketPool,
}

impl TradeSnapshot {
    fn item_total(self) -> u128 {
        // u64 + u64 always fits u128.
        u128::from(self.user_item).wrapping_add(u128::from(self.pool.item_reserve))
    }

    fn money_total(self) -> u128 {
        u128::from(self.user_money).wrapping_add(u128::from(self.pool.money_reserve))
    }
}

/// Verify that a trade between `before` and `after` conserved both assets.
pub fn verify_trade(
    location: LocationId,
    item: ItemId,
    before: TradeSnapshot,
    after: TradeSnapshot,
) -> ConservationResult {
    let mut imbalances = BTreeMap::new();

    let items = (before.item_total(), after.item_total());
    if items.0 != items.1 {
        imbalances.insert(item, items);
    }
    let money = (before.money_total(), after.money_total());
    if money.0 != money.1 {
        imbalances.insert(ItemId::CURRENCY, money);
    }

    if imbalances.is_empty() {
        ConservationResult::Balanced
    } else {
        let count = imbalances.len();
        ConservationResult::Anomaly(TradeAnomaly {
            location,
            item,
            imbalances,
            message: format!(
                "TRADE_ANOMALY at location {location} item {item}: conservation violated for {count} asset(s)",
            ),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use dopewars_types::Direction;

    use super::*;
    use crate::amm;

    const LOC: LocationId = LocationId::new(0);
    const ITEM: ItemId = ItemId::new(1);

    #[test]
    fn curve_trade_balances() {
        let before = TradeSnapshot {
            user_item: 0,
            user_money: 10_000,
            pool: MarketPool::new(200, 2_000),
        };
        let outcome = amm::trade(before.pool, Direction::Buy, 2_000).unwrap();
        let after = TradeSnapshot {
            user_item: outcome.received,
            user_money: 8_000,
            pool: outcome.pool,
        };
        assert_eq!(
            verify_trade(LOC, ITEM, before, after),
            ConservationResult::Balanced
        );
    }

    #[test]
    fn minted_money_is_flagged() {
        let before = TradeSnapshot {
            user_item: 5,
            user_money: 100,
            pool: MarketPool::new(10, 100),
        };
        let after = TradeSnapshot {
            user_money: 101,
            ..before
        };
        let ConservationResult::Anomaly(anomaly) = verify_trade(LOC, ITEM, before, after) else {
            panic!("expected anomaly");
        };
        assert_eq!(anomaly.imbalances.len(), 1);
        assert_eq!(
            anomaly.imbalances.get(&ItemId::CURRENCY),
            Some(&(200, 201))
        );
        assert!(anomaly.message.contains("TRADE_ANOMALY"));
    }

    #[test]
    fn totals_do_not_overflow_at_u64_max() {
        let snap = TradeSnapshot {
            user_item: u64::MAX,
            user_money: u64::MAX,
            pool: MarketPool::new(u64::MAX, u64::MAX),
        };
        assert_eq!(
            verify_trade(LOC, ITEM, snap, snap),
            ConservationResult::Balanced
        );
    }
}
