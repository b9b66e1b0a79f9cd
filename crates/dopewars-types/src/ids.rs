//! Type-safe identifier wrappers.
//!
//! Game entities (players, locations, items) are addressed by small
//! integers so that bulk-loaded market tables and verification tooling can
//! refer to them positionally. Each integer is wrapped in its own newtype to
//! prevent accidental mixing at compile time.
//!
//! Journal records use a time-ordered UUID v7 ([`TurnId`]) in the same way
//! the rest of the workspace identifies persisted entries.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around an unsigned integer with standard derives.
macro_rules! define_int_id {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub $inner);

        impl $name {
            /// Wrap a raw integer identifier.
            pub const fn new(raw: $inner) -> Self {
                Self(raw)
            }

            /// Return the raw integer value.
            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(raw: $inner) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_int_id! {
    /// Identifier of a player account.
    UserId(u64)
}

define_int_id! {
    /// Identifier of a location (one district of one city).
    ///
    /// The city and district are derived from the id:
    /// `city = id / districts_per_city`, `district = id % districts_per_city`.
    LocationId(u32)
}

define_int_id! {
    /// Identifier of a tradeable item.
    ///
    /// Id `0` is reserved for the shared currency, which is never itself
    /// traded as a commodity. Commodities occupy `1..=item_types`.
    ItemId(u32)
}

impl ItemId {
    /// The currency pseudo-item.
    pub const CURRENCY: Self = Self(0);

    /// Whether this id denotes the currency rather than a commodity.
    pub const fn is_currency(self) -> bool {
        self.0 == 0
    }
}

impl LocationId {
    /// The city this location belongs to.
    ///
    /// Returns `None` when `districts_per_city` is zero.
    pub const fn city_index(self, districts_per_city: u32) -> Option<u32> {
        self.0.checked_div(districts_per_city)
    }

    /// The district of this location within its city.
    ///
    /// Returns `None` when `districts_per_city` is zero.
    pub const fn district_index(self, districts_per_city: u32) -> Option<u32> {
        self.0.checked_rem(districts_per_city)
    }

    /// Build a location id from its city and district.
    ///
    /// Returns `None` if the result does not fit a `u32`.
    pub const fn from_parts(city: u32, district: u32, districts_per_city: u32) -> Option<Self> {
        match city.checked_mul(districts_per_city) {
            Some(base) => match base.checked_add(district) {
                Some(raw) => Some(Self(raw)),
                None => None,
            },
            None => None,
        }
    }
}

/// Unique identifier of a journaled turn record (UUID v7, time-ordered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TurnId(pub Uuid);

impl TurnId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TurnId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_geometry_splits_city_and_district() {
        // 34 sits in city 8 (locations 32..=35), district 2.
        let loc = LocationId::new(34);
        assert_eq!(loc.city_index(4), Some(8));
        assert_eq!(loc.district_index(4), Some(2));
        assert_eq!(LocationId::from_parts(8, 2, 4), Some(loc));
    }

    #[test]
    fn zero_districts_has_no_geometry() {
        let loc = LocationId::new(5);
        assert_eq!(loc.city_index(0), None);
        assert_eq!(loc.district_index(0), None);
    }

    #[test]
    fn currency_is_item_zero() {
        assert!(ItemId::CURRENCY.is_currency());
        assert!(!ItemId::new(1).is_currency());
    }

    #[test]
    fn int_ids_serialize_transparently() {
        let json = serde_json::to_string(&UserId::new(7)).ok();
        assert_eq!(json.as_deref(), Some("7"));
        let back: Result<LocationId, _> = serde_json::from_str("12");
        assert_eq!(back.ok(), Some(LocationId::new(12)));
    }

    #[test]
    fn turn_id_display_matches_uuid() {
        let id = TurnId::new();
        assert_eq!(id.to_string(), id.0.to_string());
    }
}
