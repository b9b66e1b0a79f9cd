//! Enumeration types for the turn engine.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Trade direction
// ---------------------------------------------------------------------------

/// Which side of a market the player gives.
///
/// On the wire (turn submissions and legacy tooling) a buy is encoded as
/// `0` and a sell as `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Direction {
    /// Give currency, receive the item.
    Buy,
    /// Give the item, receive currency.
    Sell,
}

impl Direction {
    /// Decode the legacy `buy_or_sell` flag (`0` = buy, `1` = sell).
    pub const fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            0 => Some(Self::Buy),
            1 => Some(Self::Sell),
            _ => None,
        }
    }

    /// Encode as the legacy `buy_or_sell` flag.
    pub const fn as_flag(self) -> u8 {
        match self {
            Self::Buy => 0,
            Self::Sell => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Turn events
// ---------------------------------------------------------------------------

/// One of the eleven randomized events rolled on every turn.
///
/// Variants are declared in turn-log order; [`EventKind::ALL`] preserves
/// that order and is what the 27-field log encoding iterates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventKind {
    /// The dealer runs off before the trade completes.
    DealerDash,
    /// The player catches the dashing dealer and completes the trade.
    WrangleDashedDealer,
    /// The player is mugged for cash.
    Mugging,
    /// The player escapes the mugging.
    RunFromMugging,
    /// A gang war breaks out around the player.
    GangWar,
    /// The player holds their ground in the gang war.
    DefendGangWar,
    /// The police raid the player.
    CopRaid,
    /// The player bribes their way out of the raid.
    BribeCops,
    /// The player finds a stash of the traded item.
    FindItem,
    /// A shipment of the item arrives in the city.
    LocalShipment,
    /// Warehouse stock of the item is seized.
    WarehouseSeizure,
}

impl EventKind {
    /// Every event in turn-log order.
    pub const ALL: [Self; 11] = [
        Self::DealerDash,
        Self::WrangleDashedDealer,
        Self::Mugging,
        Self::RunFromMugging,
        Self::GangWar,
        Self::DefendGangWar,
        Self::CopRaid,
        Self::BribeCops,
        Self::FindItem,
        Self::LocalShipment,
        Self::WarehouseSeizure,
    ];

    /// The event's name as it appears in turn logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::DealerDash => "dealer_dash",
            Self::WrangleDashedDealer => "wrangle_dashed_dealer",
            Self::Mugging => "mugging",
            Self::RunFromMugging => "run_from_mugging",
            Self::GangWar => "gang_war",
            Self::DefendGangWar => "defend_gang_war",
            Self::CopRaid => "cop_raid",
            Self::BribeCops => "bribe_cops",
            Self::FindItem => "find_item",
            Self::LocalShipment => "local_shipment",
            Self::WarehouseSeizure => "warehouse_seizure",
        }
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
