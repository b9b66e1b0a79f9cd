//! Administrative bulk initialization.
//!
//! These operations seed markets and player balances before play begins.
//! They bypass the turn pipeline entirely: no cooldown, no clock tick, no
//! journal entry.
//!
//! # Flat spawn order
//!
//! Tooling that ships every market in one list orders it city-major, then
//! district, then item:
//!
//! ```text
//! index = city * districts * items + district * items + (item - 1)
//! ```

use tracing::info;

use dopewars_types::{ItemId, LocationId, MarketPool, UserId};

use crate::turn::GameEngine;

/// Errors from bulk initialization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdminError {
    /// The item id is the currency or above the configured count.
    #[error("item {item} out of range (tradeable items are 1..={item_types})")]
    InvalidItem {
        /// The rejected item.
        item: ItemId,
        /// Number of configured item types.
        item_types: u32,
    },

    /// Reserve lists do not match the number of markets they seed.
    #[error("expected {expected} reserves, got {items} item and {money} money")]
    LengthMismatch {
        /// Length of the item reserve list.
        items: usize,
        /// Length of the money reserve list.
        money: usize,
        /// Number of markets to seed.
        expected: usize,
    },

    /// A seeded quantity does not fit.
    #[error("arithmetic overflow while seeding: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: &'static str,
    },
}

/// Position of a market in the flat spawn list.
///
/// Returns `None` for item 0 or on overflow.
pub fn spawn_index(
    city: u32,
    district: u32,
    item: ItemId,
    districts_per_city: u32,
    item_types: u32,
) -> Option<u64> {
    let item_offset = u64::from(item.get()).checked_sub(1)?;
    let items = u64::from(item_types);
    let city_base = u64::from(city)
        .checked_mul(u64::from(districts_per_city))?
        .checked_mul(items)?;
    let district_base = u64::from(district).checked_mul(items)?;
    city_base.checked_add(district_base)?.checked_add(item_offset)
}

impl GameEngine {
    fn check_item(&self, item: ItemId) -> Result<(), AdminError> {
        let item_types = self.config.world.item_types;
        if item.is_currency() || item.get() > item_types {
            return Err(AdminError::InvalidItem { item, item_types });
        }
        Ok(())
    }

    fn location_count_usize(&self) -> Result<usize, AdminError> {
        usize::try_from(self.location_count).map_err(|_err| AdminError::ArithmeticOverflow {
            context: "location count",
        })
    }

    /// Seed one item's market at every location.
    ///
    /// Entry `i` of each list seeds location `i`; both lists must have one
    /// entry per location.
    pub fn admin_set_pairs(
        &mut self,
        item: ItemId,
        item_reserves: &[u64],
        money_reserves: &[u64],
    ) -> Result<(), AdminError> {
        self.check_item(item)?;
        let expected = self.location_count_usize()?;
        if item_reserves.len() != expected || money_reserves.len() != expected {
            return Err(AdminError::LengthMismatch {
                items: item_reserves.len(),
                money: money_reserves.len(),
                expected,
            });
        }

        for (raw, (item_reserve, money_reserve)) in
            (0..self.location_count).zip(item_reserves.iter().zip(money_reserves))
        {
            self.markets.set(
                LocationId::new(raw),
                item,
                MarketPool::new(*item_reserve, *money_reserve),
            );
        }

        info!(item = item.get(), markets = expected, "Market pairs seeded");
        Ok(())
    }

    /// Seed every market from lists in flat spawn order.
    pub fn admin_set_flat_pairs(
        &mut self,
        item_reserves: &[u64],
        money_reserves: &[u64],
    ) -> Result<(), AdminError> {
        let world = &self.config.world;
        let (cities, districts, item_types) = (world.cities, world.districts_per_city, world.item_types);
        let expected = usize::try_from(u64::from(self.location_count).saturating_mul(u64::from(item_types)))
            .map_err(|_err| AdminError::ArithmeticOverflow {
                context: "flat market count",
            })?;
        if item_reserves.len() != expected || money_reserves.len() != expected {
            return Err(AdminError::LengthMismatch {
                items: item_reserves.len(),
                money: money_reserves.len(),
                expected,
            });
        }

        for city in 0..cities {
            for district in 0..districts {
                let location = LocationId::from_parts(city, district, districts).ok_or(
                    AdminError::ArithmeticOverflow {
                        context: "location id",
                    },
                )?;
                for raw_item in 1..=item_types {
                    let item = ItemId::new(raw_item);
                    let index = spawn_index(city, district, item, districts, item_types)
                        .and_then(|i| usize::try_from(i).ok())
                        .ok_or(AdminError::ArithmeticOverflow {
                            context: "spawn index",
                        })?;
                    let (Some(item_reserve), Some(money_reserve)) =
                        (item_reserves.get(index), money_reserves.get(index))
                    else {
                        return Err(AdminError::LengthMismatch {
                            items: item_reserves.len(),
                            money: money_reserves.len(),
                            expected,
                        });
                    };
                    self.markets
                        .set(location, item, MarketPool::new(*item_reserve, *money_reserve));
                }
            }
        }

        info!(markets = expected, "Flat market list seeded");
        Ok(())
    }

    /// Give users `0..count` exactly `money` currency each.
    pub fn admin_set_user_amount(&mut self, count: u64, money: u64) {
        for raw in 0..count {
            self.users.set_money(UserId::new(raw), money);
        }
        info!(count, money, "User balances seeded");
    }

    /// Seed every item's markets linearly: location `i` gets
    /// `((i + 1) * item_step, (i + 1) * money_step)`.
    pub fn admin_seed_linear(&mut self, item_step: u64, money_step: u64) -> Result<(), AdminError> {
        let mut item_reserves = Vec::new();
        let mut money_reserves = Vec::new();
        for raw in 0..self.location_count {
            let multiple = u64::from(raw).checked_add(1).ok_or(AdminError::ArithmeticOverflow {
                context: "location multiple",
            })?;
            item_reserves.push(multiple.checked_mul(item_step).ok_or(
                AdminError::ArithmeticOverflow {
                    context: "linear item reserve",
                },
            )?);
            money_reserves.push(multiple.checked_mul(money_step).ok_or(
                AdminError::ArithmeticOverflow {
                    context: "linear money reserve",
                },
            )?);
        }

        for raw_item in 1..=self.config.world.item_types {
            self.admin_set_pairs(ItemId::new(raw_item), &item_reserves, &money_reserves)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, WorldConfig};

    fn small_engine() -> GameEngine {
        let config = EngineConfig {
            world: WorldConfig {
                cities: 2,
                districts_per_city: 2,
                item_types: 3,
                seed: 1,
            },
            ..EngineConfig::default()
        };
        GameEngine::new(config).unwrap()
    }

    #[test]
    fn spawn_index_is_city_major() {
        assert_eq!(spawn_index(0, 0, ItemId::new(1), 4, 19), Some(0));
        assert_eq!(spawn_index(0, 1, ItemId::new(1), 4, 19), Some(19));
        assert_eq!(spawn_index(1, 0, ItemId::new(3), 4, 19), Some(78));
        assert_eq!(spawn_index(0, 0, ItemId::CURRENCY, 4, 19), None);
    }

    #[test]
    fn set_pairs_requires_one_entry_per_location() {
        let mut engine = small_engine();
        let err = engine
            .admin_set_pairs(ItemId::new(1), &[1, 2, 3], &[1, 2, 3, 4])
            .unwrap_err();
        assert_eq!(
            err,
            AdminError::LengthMismatch {
                items: 3,
                money: 4,
                expected: 4
            }
        );
        assert!(engine.markets().is_empty());
    }

    #[test]
    fn set_pairs_rejects_currency() {
        let mut engine = small_engine();
        let err = engine
            .admin_set_pairs(ItemId::CURRENCY, &[1; 4], &[1; 4])
            .unwrap_err();
        assert!(matches!(err, AdminError::InvalidItem { .. }));
    }

    #[test]
    fn linear_seed_scales_with_location() {
        let mut engine = small_engine();
        engine.admin_seed_linear(200, 2_000).unwrap();
        assert_eq!(engine.markets().len(), 12);
        assert_eq!(
            engine.check_market_state(LocationId::new(0), ItemId::new(2)).unwrap(),
            MarketPool::new(200, 2_000)
        );
        assert_eq!(
            engine.check_market_state(LocationId::new(3), ItemId::new(3)).unwrap(),
            MarketPool::new(800, 8_000)
        );
    }

    #[test]
    fn flat_pairs_follow_spawn_order() {
        let mut engine = small_engine();
        let items: Vec<u64> = (0..12).collect();
        let money: Vec<u64> = (100..112).collect();
        engine.admin_set_flat_pairs(&items, &money).unwrap();
        // city 1, district 0 is location 2; item 2 sits at 1*2*3 + 0 + 1 = 7.
        assert_eq!(
            engine.check_market_state(LocationId::new(2), ItemId::new(2)).unwrap(),
            MarketPool::new(7, 107)
        );
    }

    #[test]
    fn user_amounts_are_seeded() {
        let mut engine = small_engine();
        engine.admin_set_user_amount(3, 500);
        assert_eq!(engine.users().len(), 3);
        assert_eq!(engine.check_user_state(UserId::new(2)).money, 500);
        assert_eq!(engine.read_game_clock(), 0);
    }
}
