//! The market book: every `(location, item)` pool in the world.

use std::collections::BTreeMap;

use dopewars_types::{ItemId, LocationId, MarketPool};

use crate::MarketError;

/// Keyed store of market pools.
///
/// Pools are created by bulk initialization and afterwards only replaced
/// wholesale by turn settlement. A missing key means the market was never
/// seeded; reads treat it as an error rather than an empty pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketBook {
    pools: BTreeMap<(LocationId, ItemId), MarketPool>,
}

impl MarketBook {
    /// Create an empty book.
    pub const fn new() -> Self {
        Self {
            pools: BTreeMap::new(),
        }
    }

    /// Look up a pool.
    pub fn get(&self, location: LocationId, item: ItemId) -> Result<MarketPool, MarketError> {
        self.pools
            .get(&(location, item))
            .copied()
            .ok_or(MarketError::UnknownPool { location, item })
    }

    /// Whether a pool exists.
    pub fn contains(&self, location: LocationId, item: ItemId) -> bool {
        self.pools.contains_key(&(location, item))
    }

    /// Insert or replace a pool.
    pub fn set(&mut self, location: LocationId, item: ItemId, pool: MarketPool) {
        self.pools.insert((location, item), pool);
    }

    /// Number of seeded pools.
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Whether no pool has been seeded.
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// All pools in `(location, item)` order.
    pub fn iter(&self) -> impl Iterator<Item = (LocationId, ItemId, MarketPool)> + '_ {
        self.pools
            .iter()
            .map(|(&(location, item), &pool)| (location, item, pool))
    }

    /// Pools for a single item, in location order.
    pub fn pools_for_item(&self, item: ItemId) -> impl Iterator<Item = (LocationId, MarketPool)> + '_ {
        self.iter()
            .filter(move |(_, pool_item, _)| *pool_item == item)
            .map(|(location, _, pool)| (location, pool))
    }

    /// Total `(item, money)` held across every pool of one item.
    ///
    /// Sums in `u128`; returns `None` only on overflow of that.
    pub fn totals_for_item(&self, item: ItemId) -> Option<(u128, u128)> {
        let mut items: u128 = 0;
        let mut money: u128 = 0;
        for (_, pool) in self.pools_for_item(item) {
            items = items.checked_add(u128::from(pool.item_reserve))?;
            money = money.checked_add(u128::from(pool.money_reserve))?;
        }
        Some((items, money))
    }
}
