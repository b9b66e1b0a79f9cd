//! Regional propagation of shipment and seizure events.
//!
//! The traded pool's item reserve always takes the regional factor; the
//! orchestrator applies that itself. This module decides which *other*
//! pools the factor reaches. Reach is controlled by two knobs:
//!
//! - a [`Neighborhood`] that maps a location to the locations around it
//!   (default: [`CityDistricts`], every district of the same city), and
//! - a [`PropagationBreadth`] that can switch fan-out off entirely.
//!
//! Neighbors that have no pool for the traded item are skipped.

use std::collections::BTreeSet;

use tracing::debug;

use dopewars_market::MarketBook;
use dopewars_types::{ItemId, LocationId, NEUTRAL_FACTOR, RegionalAdjustment};

use crate::config::PropagationBreadth;
use crate::error::{TurnError, overflow};
use crate::events::apply_factor;

/// Maps a location to its neighbors.
pub trait Neighborhood: Send + Sync {
    /// Locations near `location`. If `location` itself is returned the
    /// propagator ignores it.
    fn neighbors(&self, location: LocationId) -> BTreeSet<LocationId>;
}

/// Same-city grouping: every district that shares `city_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityDistricts {
    districts_per_city: u32,
    location_count: u32,
}

impl CityDistricts {
    /// Create the grouping for a world of `location_count` locations.
    pub const fn new(districts_per_city: u32, location_count: u32) -> Self {
        Self {
            districts_per_city,
            location_count,
        }
    }
}

impl Neighborhood for CityDistricts {
    fn neighbors(&self, location: LocationId) -> BTreeSet<LocationId> {
        let Some(city) = location.city_index(self.districts_per_city) else {
            return BTreeSet::new();
        };
        (0..self.districts_per_city)
            .filter_map(|district| LocationId::from_parts(city, district, self.districts_per_city))
            .filter(|candidate| *candidate != location && candidate.get() < self.location_count)
            .collect()
    }
}

/// Computes the neighbor adjustments a regional factor causes.
pub struct RegionalPropagator {
    breadth: PropagationBreadth,
    neighborhood: Box<dyn Neighborhood>,
}

impl core::fmt::Debug for RegionalPropagator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegionalPropagator")
            .field("breadth", &self.breadth)
            .finish_non_exhaustive()
    }
}

impl RegionalPropagator {
    /// Create a propagator.
    pub fn new(breadth: PropagationBreadth, neighborhood: Box<dyn Neighborhood>) -> Self {
        Self {
            breadth,
            neighborhood,
        }
    }

    /// The configured breadth.
    pub const fn breadth(&self) -> PropagationBreadth {
        self.breadth
    }

    /// Neighbor pools the factor reaches, with their rescaled reserves.
    ///
    /// Pure: reads `book` and returns staged adjustments in location order.
    /// A neutral factor or [`PropagationBreadth::TradedMarketOnly`] yields
    /// nothing. The traded location is never among the results; its pool
    /// is rescaled by the orchestrator from post-trade reserves.
    pub fn neighbor_adjustments(
        &self,
        book: &MarketBook,
        location: LocationId,
        item: ItemId,
        factor: u32,
    ) -> Result<Vec<RegionalAdjustment>, TurnError> {
        if factor == NEUTRAL_FACTOR || self.breadth == PropagationBreadth::TradedMarketOnly {
            return Ok(Vec::new());
        }

        let mut adjustments = Vec::new();
        for neighbor in self.neighborhood.neighbors(location) {
            if neighbor == location {
                continue;
            }
            let Ok(pool) = book.get(neighbor, item) else {
                continue;
            };
            let item_after = apply_factor(factor, pool.item_reserve)
                .ok_or_else(|| overflow("regional item reserve"))?;
            adjustments.push(RegionalAdjustment {
                location: neighbor,
                item,
                item_before: pool.item_reserve,
                item_after,
            });
        }

        debug!(
            location = location.get(),
            item = item.get(),
            factor,
            reached = adjustments.len(),
            "Regional factor propagated"
        );
        Ok(adjustments)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dopewars_types::MarketPool;

    use super::*;

    fn loc(raw: u32) -> LocationId {
        LocationId::new(raw)
    }

    #[test]
    fn city_districts_excludes_self() {
        let hood = CityDistricts::new(4, 76);
        let around: Vec<_> = hood.neighbors(loc(34)).into_iter().collect();
        assert_eq!(around, vec![loc(32), loc(33), loc(35)]);
    }

    #[test]
    fn city_districts_clips_to_world() {
        // A partial last city: locations 8 and 9 exist, 10 and 11 do not.
        let hood = CityDistricts::new(4, 10);
        let around: Vec<_> = hood.neighbors(loc(9)).into_iter().collect();
        assert_eq!(around, vec![loc(8)]);
    }

    fn book() -> MarketBook {
        let mut book = MarketBook::new();
        for raw in 0..8 {
            book.set(loc(raw), ItemId::new(1), MarketPool::new(100, 1_000));
        }
        // Location 2 has no pool for item 1 but one for item 2.
        book.set(loc(2), ItemId::new(2), MarketPool::new(5, 5));
        book
    }

    fn neighborhood_book() -> MarketBook {
        let mut book = book();
        book.set(loc(2), ItemId::new(1), MarketPool::new(100, 1_000));
        book
    }

    #[test]
    fn neighborhood_reaches_same_city_pools() {
        let propagator = RegionalPropagator::new(
            PropagationBreadth::Neighborhood,
            Box::new(CityDistricts::new(4, 8)),
        );
        let adjustments = propagator
            .neighbor_adjustments(&neighborhood_book(), loc(1), ItemId::new(1), 120)
            .unwrap();
        let reached: Vec<_> = adjustments.iter().map(|a| a.location).collect();
        assert_eq!(reached, vec![loc(0), loc(2), loc(3)]);
        assert!(adjustments.iter().all(|a| a.item_before == 100 && a.item_after == 120));
    }

    #[test]
    fn missing_pools_are_skipped() {
        let propagator = RegionalPropagator::new(
            PropagationBreadth::Neighborhood,
            Box::new(CityDistricts::new(4, 8)),
        );
        let adjustments = propagator
            .neighbor_adjustments(&book(), loc(1), ItemId::new(1), 70)
            .unwrap();
        let reached: Vec<_> = adjustments.iter().map(|a| a.location).collect();
        assert_eq!(reached, vec![loc(0), loc(3)]);
    }

    #[test]
    fn neutral_factor_and_traded_only_do_not_fan_out() {
        let neighborhood = RegionalPropagator::new(
            PropagationBreadth::Neighborhood,
            Box::new(CityDistricts::new(4, 8)),
        );
        assert!(
            neighborhood
                .neighbor_adjustments(&book(), loc(1), ItemId::new(1), 100)
                .unwrap()
                .is_empty()
        );

        let traded_only = RegionalPropagator::new(
            PropagationBreadth::TradedMarketOnly,
            Box::new(CityDistricts::new(4, 8)),
        );
        assert!(
            traded_only
                .neighbor_adjustments(&book(), loc(1), ItemId::new(1), 120)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn traded_location_is_never_an_adjustment() {
        struct WholeCity;
        impl Neighborhood for WholeCity {
            fn neighbors(&self, _location: LocationId) -> BTreeSet<LocationId> {
                (0..4).map(LocationId::new).collect()
            }
        }
        let propagator =
            RegionalPropagator::new(PropagationBreadth::Neighborhood, Box::new(WholeCity));
        let adjustments = propagator
            .neighbor_adjustments(&neighborhood_book(), loc(0), ItemId::new(1), 120)
            .unwrap();
        let reached: Vec<_> = adjustments.iter().map(|a| a.location).collect();
        assert_eq!(reached, vec![loc(1), loc(2), loc(3)]);
    }

    #[test]
    fn custom_neighborhood_is_honored() {
        struct Ring;
        impl Neighborhood for Ring {
            fn neighbors(&self, location: LocationId) -> BTreeSet<LocationId> {
                BTreeSet::from([LocationId::new((location.get() + 1) % 8)])
            }
        }
        let propagator = RegionalPropagator::new(PropagationBreadth::Neighborhood, Box::new(Ring));
        let adjustments = propagator
            .neighbor_adjustments(&book(), loc(7), ItemId::new(1), 70)
            .unwrap();
        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments.first().map(|a| a.location), Some(loc(0)));
    }
}
