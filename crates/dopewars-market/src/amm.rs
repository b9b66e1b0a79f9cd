//! The constant-product pricing curve.
//!
//! All functions here are pure: they take a [`MarketPool`] by value and
//! return the pool as it would be after the trade. Nothing is committed
//! until the caller stores the returned pool.
//!
//! Division truncates, so the caller always receives the floor of the
//! exact curve output and any rounding dust stays in the pool.

use rust_decimal::Decimal;

use dopewars_types::{Direction, MarketPool};

use crate::MarketError;

/// The result of running a trade through the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeOutcome {
    /// Pool reserves after the trade.
    pub pool: MarketPool,
    /// Amount the trader receives: items on a buy, currency on a sell.
    pub received: u64,
}

/// Execute `give` units against the pool.
///
/// A buy gives currency and receives the item; a sell gives the item and
/// receives currency. The returned `received` may be zero when the pool is
/// too shallow for the amount given; callers decide how to treat that.
pub fn trade(pool: MarketPool, direction: Direction, give: u64) -> Result<TradeOutcome, MarketError> {
    if give == 0 {
        return Err(MarketError::ZeroQuantity);
    }

    match direction {
        Direction::Buy => {
            let received = curve_output(pool.item_reserve, pool.money_reserve, give)?;
            let money_reserve =
                pool.money_reserve
                    .checked_add(give)
                    .ok_or(MarketError::ArithmeticOverflow {
                        context: "money reserve after buy",
                    })?;
            let item_reserve =
                pool.item_reserve
                    .checked_sub(received)
                    .ok_or(MarketError::ArithmeticOverflow {
                        context: "item reserve after buy",
                    })?;
            Ok(TradeOutcome {
                pool: MarketPool::new(item_reserve, money_reserve),
                received,
            })
        }
        Direction::Sell => {
            let received = curve_output(pool.money_reserve, pool.item_reserve, give)?;
            let item_reserve =
                pool.item_reserve
                    .checked_add(give)
                    .ok_or(MarketError::ArithmeticOverflow {
                        context: "item reserve after sell",
                    })?;
            let money_reserve =
                pool.money_reserve
                    .checked_sub(received)
                    .ok_or(MarketError::ArithmeticOverflow {
                        context: "money reserve after sell",
                    })?;
            Ok(TradeOutcome {
                pool: MarketPool::new(item_reserve, money_reserve),
                received,
            })
        }
    }
}

/// How much `give` would receive, without producing the new pool.
pub fn quote(pool: MarketPool, direction: Direction, give: u64) -> Result<u64, MarketError> {
    trade(pool, direction, give).map(|outcome| outcome.received)
}

/// The smallest currency amount that buys at least one item.
///
/// Buying one unit requires `item * g >= money + g`, i.e.
/// `g >= money / (item - 1)`. Returns `None` when the pool holds one item
/// or fewer, since no finite payment can then buy a whole unit.
pub fn price_for_one(pool: MarketPool) -> Option<u64> {
    let divisor = pool.item_reserve.checked_sub(1).filter(|d| *d > 0)?;
    let price = pool.money_reserve.div_ceil(divisor);
    Some(price.max(1))
}

/// Marginal price of one item in currency, for display only.
///
/// Settlement never uses this value. Returns `None` for an empty item side.
pub fn spot_price(pool: MarketPool) -> Option<Decimal> {
    Decimal::from(pool.money_reserve).checked_div(Decimal::from(pool.item_reserve))
}

/// `floor(out_reserve * give / (in_reserve + give))` in `u128`.
fn curve_output(out_reserve: u64, in_reserve: u64, give: u64) -> Result<u64, MarketError> {
    let numerator = u128::from(out_reserve)
        .checked_mul(u128::from(give))
        .ok_or(MarketError::ArithmeticOverflow {
            context: "curve numerator",
        })?;
    let denominator = u128::from(in_reserve)
        .checked_add(u128::from(give))
        .ok_or(MarketError::ArithmeticOverflow {
            context: "curve denominator",
        })?;
    let output = numerator
        .checked_div(denominator)
        .ok_or(MarketError::ArithmeticOverflow {
            context: "curve division",
        })?;
    // output <= out_reserve because give / (in_reserve + give) <= 1.
    u64::try_from(output)
        .ok()
        .ok_or(MarketError::ArithmeticOverflow {
            context: "curve output",
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn buy_matches_constant_product_example() {
        let outcome = trade(MarketPool::new(200, 2_000), Direction::Buy, 2_000).unwrap();
        assert_eq!(outcome.received, 100);
        assert_eq!(outcome.pool, MarketPool::new(100, 4_000));
    }

    #[test]
    fn sell_truncates_toward_the_pool() {
        // 2000 * 7 / (200 + 7) = 67.63.. -> 67
        let outcome = trade(MarketPool::new(200, 2_000), Direction::Sell, 7).unwrap();
        assert_eq!(outcome.received, 67);
        assert_eq!(outcome.pool, MarketPool::new(207, 1_933));
    }

    #[test]
    fn product_never_decreases() {
        let pool = MarketPool::new(1_234, 98_765);
        let before = u128::from(pool.item_reserve) * u128::from(pool.money_reserve);
        for give in [1, 13, 999, 50_000] {
            for direction in [Direction::Buy, Direction::Sell] {
                let after = trade(pool, direction, give).unwrap().pool;
                let product = u128::from(after.item_reserve) * u128::from(after.money_reserve);
                assert!(product >= before, "{direction:?} {give}");
            }
        }
    }

    #[test]
    fn zero_give_is_rejected() {
        assert_eq!(
            trade(MarketPool::new(10, 10), Direction::Buy, 0),
            Err(MarketError::ZeroQuantity)
        );
    }

    #[test]
    fn shallow_pool_can_return_nothing() {
        let outcome = trade(MarketPool::new(1, 1_000), Direction::Buy, 500).unwrap();
        assert_eq!(outcome.received, 0);
        assert_eq!(outcome.pool, MarketPool::new(1, 1_500));
    }

    #[test]
    fn reserve_overflow_is_reported() {
        let result = trade(MarketPool::new(10, u64::MAX), Direction::Buy, 1);
        assert!(matches!(result, Err(MarketError::ArithmeticOverflow { .. })));
    }

    #[test]
    fn price_for_one_buys_exactly_one() {
        let pool = MarketPool::new(200, 2_000);
        let price = price_for_one(pool).unwrap();
        assert_eq!(price, 11);
        assert!(quote(pool, Direction::Buy, price).unwrap() >= 1);
        assert_eq!(quote(pool, Direction::Buy, price - 1).unwrap(), 0);
    }

    #[test]
    fn price_for_one_undefined_for_single_item() {
        assert_eq!(price_for_one(MarketPool::new(1, 100)), None);
        assert_eq!(price_for_one(MarketPool::new(0, 100)), None);
    }

    #[test]
    fn spot_price_is_money_per_item() {
        assert_eq!(
            spot_price(MarketPool::new(200, 2_000)),
            Some(Decimal::new(10, 0))
        );
        assert_eq!(spot_price(MarketPool::new(0, 2_000)), None);
    }
}
