//! Core entity structs: market pools, user accounts, and turn records.
//!
//! These are plain data carriers. The arithmetic that mutates them (the
//! constant-product curve, balance debits and credits, event factors) lives
//! in `dopewars-market` and `dopewars-core`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Direction, EventKind};
use crate::ids::{ItemId, LocationId, TurnId, UserId};

/// Number of fields in the flat turn-log encoding.
pub const TURN_LOG_FIELDS: usize = 27;

/// Factor value meaning "no change" (factors are percentages).
pub const NEUTRAL_FACTOR: u32 = 100;

// ---------------------------------------------------------------------------
// Market pool
// ---------------------------------------------------------------------------

/// Reserves of one `(location, item)` automated market.
///
/// The pool trades the item against the shared currency on a
/// constant-product curve. Pools are created by the admin bulk load and
/// mutated only during turn settlement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MarketPool {
    /// Units of the item held by the market.
    pub item_reserve: u64,
    /// Units of currency held by the market.
    pub money_reserve: u64,
}

impl MarketPool {
    /// Create a pool from its two reserves.
    pub const fn new(item_reserve: u64, money_reserve: u64) -> Self {
        Self {
            item_reserve,
            money_reserve,
        }
    }
}

// ---------------------------------------------------------------------------
// User account
// ---------------------------------------------------------------------------

/// Per-player holdings and turn bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UserAccount {
    /// Currency balance (item id 0).
    pub money: u64,
    /// Commodity balances keyed by item id. Missing keys hold zero.
    pub items: BTreeMap<ItemId, u64>,
    /// Location of the player's most recent accepted turn.
    pub location: Option<LocationId>,
    /// Game-clock tick of the player's most recent accepted turn.
    pub last_turn_tick: Option<u64>,
}

impl UserAccount {
    /// Create an account holding only currency.
    pub const fn with_money(money: u64) -> Self {
        Self {
            money,
            items: BTreeMap::new(),
            location: None,
            last_turn_tick: None,
        }
    }

    /// Balance of a commodity (zero if never held).
    pub fn item_balance(&self, item: ItemId) -> u64 {
        self.items.get(&item).copied().unwrap_or(0)
    }

    /// Balance of any asset, treating [`ItemId::CURRENCY`] as money.
    pub fn balance(&self, item: ItemId) -> u64 {
        if item.is_currency() {
            self.money
        } else {
            self.item_balance(item)
        }
    }

    /// Overwrite the balance of a commodity, dropping zero entries.
    pub fn set_item_balance(&mut self, item: ItemId, amount: u64) {
        if amount == 0 {
            self.items.remove(&item);
        } else {
            self.items.insert(item, amount);
        }
    }
}

// ---------------------------------------------------------------------------
// Turn request
// ---------------------------------------------------------------------------

/// A player's turn submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TurnRequest {
    /// The acting player.
    pub user: UserId,
    /// Where the player trades.
    pub location: LocationId,
    /// Whether the player gives currency (buy) or the item (sell).
    pub direction: Direction,
    /// The commodity traded.
    pub item: ItemId,
    /// Quantity of the given side: currency on a buy, item on a sell.
    pub give_quantity: u64,
}

// ---------------------------------------------------------------------------
// Turn log
// ---------------------------------------------------------------------------

/// One quantity tracked through the three stages of a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AmountTrail {
    /// Before the trade.
    pub pre_trade: u64,
    /// After the trade, before event factors.
    pub post_trade_pre_event: u64,
    /// After event factors.
    pub post_trade_post_event: u64,
}

/// The three percentage factors derived from a turn's events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TurnFactors {
    /// Applied to the player's post-trade currency.
    pub money_reduction_factor: u32,
    /// Applied to the player's post-trade item balance.
    pub item_reduction_factor: u32,
    /// Applied to market item reserves in the region.
    pub regional_item_reduction_factor: u32,
}

impl Default for TurnFactors {
    fn default() -> Self {
        Self {
            money_reduction_factor: NEUTRAL_FACTOR,
            item_reduction_factor: NEUTRAL_FACTOR,
            regional_item_reduction_factor: NEUTRAL_FACTOR,
        }
    }
}

/// Outcome of the eleven event rolls for one turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[allow(clippy::struct_excessive_bools)]
pub struct TurnEvents {
    /// See [`EventKind::DealerDash`].
    pub dealer_dash: bool,
    /// See [`EventKind::WrangleDashedDealer`].
    pub wrangle_dashed_dealer: bool,
    /// See [`EventKind::Mugging`].
    pub mugging: bool,
    /// See [`EventKind::RunFromMugging`].
    pub run_from_mugging: bool,
    /// See [`EventKind::GangWar`].
    pub gang_war: bool,
    /// See [`EventKind::DefendGangWar`].
    pub defend_gang_war: bool,
    /// See [`EventKind::CopRaid`].
    pub cop_raid: bool,
    /// See [`EventKind::BribeCops`].
    pub bribe_cops: bool,
    /// See [`EventKind::FindItem`].
    pub find_item: bool,
    /// See [`EventKind::LocalShipment`].
    pub local_shipment: bool,
    /// See [`EventKind::WarehouseSeizure`].
    pub warehouse_seizure: bool,
}

impl TurnEvents {
    /// Whether the given event fired.
    pub const fn get(&self, kind: EventKind) -> bool {
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

    /// Record whether the given event fired.
    pub const fn set(&mut self, kind: EventKind, fired: bool) {
        match kind {
            EventKind::DealerDash => self.dealer_dash = fired,
            EventKind::WrangleDashedDealer => self.wrangle_dashed_dealer = fired,
            EventKind::Mugging => self.mugging = fired,
            EventKind::RunFromMugging => self.run_from_mugging = fired,
            EventKind::GangWar => self.gang_war = fired,
            EventKind::DefendGangWar => self.defend_gang_war = fired,
            EventKind::CopRaid => self.cop_raid = fired,
            EventKind::BribeCops => self.bribe_cops = fired,
            EventKind::FindItem => self.find_item = fired,
            EventKind::LocalShipment => self.local_shipment = fired,
            EventKind::WarehouseSeizure => self.warehouse_seizure = fired,
        }
    }

    /// Build from a predicate evaluated once per event, in log order.
    pub fn from_fn(mut fired: impl FnMut(EventKind) -> bool) -> Self {
        let mut events = Self::default();
        for kind in EventKind::ALL {
            events.set(kind, fired(kind));
        }
        events
    }

    /// The events that fired, in log order.
    pub fn fired(&self) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind))
            .collect()
    }

    /// The trade executes unless the dealer dashed and was not wrangled.
    pub const fn trade_gate_open(&self) -> bool {
        !(self.dealer_dash && !self.wrangle_dashed_dealer)
    }

    /// The police raid landed (not bribed away).
    pub const fn cop_hit(&self) -> bool {
        self.cop_raid && !self.bribe_cops
    }

    /// The gang war landed (not defended).
    pub const fn gang_hit(&self) -> bool {
        self.gang_war && !self.defend_gang_war
    }

    /// The mugging landed (player did not escape).
    pub const fn mug_hit(&self) -> bool {
        self.mugging && !self.run_from_mugging
    }
}

/// Errors decoding the flat 27-field turn-log form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnLogDecodeError {
    /// The input did not have exactly [`TURN_LOG_FIELDS`] values.
    #[error("turn log must have {expected} fields, got {actual}")]
    WrongLength {
        /// Required field count.
        expected: usize,
        /// Supplied field count.
        actual: usize,
    },

    /// A boolean slot held something other than 0 or 1.
    #[error("turn log field {field} must be 0 or 1, got {value}")]
    NotABoolean {
        /// Name of the offending field.
        field: &'static str,
        /// The value found.
        value: u64,
    },

    /// A factor slot does not fit a `u32` percentage.
    #[error("turn log factor {field} out of range: {value}")]
    FactorOutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The value found.
        value: u64,
    },
}

/// The audit record of one accepted turn.
///
/// The flat encoding produced by [`TurnLog::to_fields`] is a fixed 27-tuple
/// consumed by external verification tooling; its order must never change:
///
/// ```text
///  0      trade_occurs
///  1..=3  user item      (pre-trade, post-trade pre-event, post-event)
///  4..=6  user money     (same stages)
///  7..=9  market item    (same stages)
/// 10..=12 market money   (same stages)
/// 13      money_reduction_factor
/// 14      item_reduction_factor
/// 15      regional_item_reduction_factor
/// 16..=26 event flags in EventKind::ALL order
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TurnLog {
    /// Whether the market trade executed.
    pub trade_occurs: bool,
    /// The player's balance of the traded item.
    pub user_item: AmountTrail,
    /// The player's currency balance.
    pub user_money: AmountTrail,
    /// The traded market's item reserve.
    pub market_item: AmountTrail,
    /// The traded market's currency reserve.
    pub market_money: AmountTrail,
    /// Event factors applied after the trade.
    pub factors: TurnFactors,
    /// Which events fired.
    pub events: TurnEvents,
}

impl TurnLog {
    /// Encode as the fixed 27-field tuple (booleans as 0/1).
    pub fn to_fields(&self) -> [u64; TURN_LOG_FIELDS] {
        let e = &self.events;
        [
            u64::from(self.trade_occurs),
            self.user_item.pre_trade,
            self.user_item.post_trade_pre_event,
            self.user_item.post_trade_post_event,
            self.user_money.pre_trade,
            self.user_money.post_trade_pre_event,
            self.user_money.post_trade_post_event,
            self.market_item.pre_trade,
            self.market_item.post_trade_pre_event,
            self.market_item.post_trade_post_event,
            self.market_money.pre_trade,
            self.market_money.post_trade_pre_event,
            self.market_money.post_trade_post_event,
            u64::from(self.factors.money_reduction_factor),
            u64::from(self.factors.item_reduction_factor),
            u64::from(self.factors.regional_item_reduction_factor),
            u64::from(e.dealer_dash),
            u64::from(e.wrangle_dashed_dealer),
            u64::from(e.mugging),
            u64::from(e.run_from_mugging),
            u64::from(e.gang_war),
            u64::from(e.defend_gang_war),
            u64::from(e.cop_raid),
            u64::from(e.bribe_cops),
            u64::from(e.find_item),
            u64::from(e.local_shipment),
            u64::from(e.warehouse_seizure),
        ]
    }

    /// Decode the fixed 27-field tuple produced by [`TurnLog::to_fields`].
    pub fn from_fields(fields: &[u64]) -> Result<Self, TurnLogDecodeError> {
        let array: [u64; TURN_LOG_FIELDS] =
            fields
                .try_into()
                .map_err(|_err| TurnLogDecodeError::WrongLength {
                    expected: TURN_LOG_FIELDS,
                    actual: fields.len(),
                })?;
        let [
            trade_occurs,
            user_item_pre,
            user_item_mid,
            user_item_post,
            user_money_pre,
            user_money_mid,
            user_money_post,
            market_item_pre,
            market_item_mid,
            market_item_post,
            market_money_pre,
            market_money_mid,
            market_money_post,
            money_factor,
            item_factor,
            regional_factor,
            flags @ ..,
        ] = array;

        let mut events = TurnEvents::default();
        for (kind, value) in EventKind::ALL.into_iter().zip(flags) {
            events.set(kind, decode_flag(kind.name(), value)?);
        }

        Ok(Self {
            trade_occurs: decode_flag("trade_occurs", trade_occurs)?,
            user_item: AmountTrail {
                pre_trade: user_item_pre,
                post_trade_pre_event: user_item_mid,
                post_trade_post_event: user_item_post,
            },
            user_money: AmountTrail {
                pre_trade: user_money_pre,
                post_trade_pre_event: user_money_mid,
                post_trade_post_event: user_money_post,
            },
            market_item: AmountTrail {
                pre_trade: market_item_pre,
                post_trade_pre_event: market_item_mid,
                post_trade_post_event: market_item_post,
            },
            market_money: AmountTrail {
                pre_trade: market_money_pre,
                post_trade_pre_event: market_money_mid,
                post_trade_post_event: market_money_post,
            },
            factors: TurnFactors {
                money_reduction_factor: decode_factor("money_reduction_factor", money_factor)?,
                item_reduction_factor: decode_factor("item_reduction_factor", item_factor)?,
                regional_item_reduction_factor: decode_factor(
                    "regional_item_reduction_factor",
                    regional_factor,
                )?,
            },
            events,
        })
    }
}

fn decode_flag(field: &'static str, value: u64) -> Result<bool, TurnLogDecodeError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(TurnLogDecodeError::NotABoolean { field, value }),
    }
}

fn decode_factor(field: &'static str, value: u64) -> Result<u32, TurnLogDecodeError> {
    u32::try_from(value).map_err(|_err| TurnLogDecodeError::FactorOutOfRange { field, value })
}

// ---------------------------------------------------------------------------
// Journal records
// ---------------------------------------------------------------------------

/// A market item reserve rescaled by a regional event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RegionalAdjustment {
    /// The market's location.
    pub location: LocationId,
    /// The market's item.
    pub item: ItemId,
    /// Item reserve before the regional factor.
    pub item_before: u64,
    /// Item reserve after the regional factor.
    pub item_after: u64,
}

/// A journaled, immutable record of one accepted turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TurnRecord {
    /// Unique record identifier.
    pub id: TurnId,
    /// Game-clock tick at which the turn was accepted.
    pub tick: u64,
    /// The submission that produced this turn.
    pub request: TurnRequest,
    /// The 27-field audit log.
    pub log: TurnLog,
    /// Every market touched by the regional factor, traded market first.
    pub regional: Vec<RegionalAdjustment>,
    /// Real-world timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_log() -> TurnLog {
        TurnLog {
            trade_occurs: true,
            user_item: AmountTrail {
                pre_trade: 0,
                post_trade_pre_event: 100,
                post_trade_post_event: 70,
            },
            user_money: AmountTrail {
                pre_trade: 10_000,
                post_trade_pre_event: 8_000,
                post_trade_post_event: 8_000,
            },
            market_item: AmountTrail {
                pre_trade: 200,
                post_trade_pre_event: 100,
                post_trade_post_event: 120,
            },
            market_money: AmountTrail {
                pre_trade: 2_000,
                post_trade_pre_event: 4_000,
                post_trade_post_event: 4_000,
            },
            factors: TurnFactors {
                money_reduction_factor: 100,
                item_reduction_factor: 70,
                regional_item_reduction_factor: 120,
            },
            events: TurnEvents {
                gang_war: true,
                local_shipment: true,
                ..TurnEvents::default()
            },
        }
    }

    #[test]
    fn fields_follow_fixed_order() {
        let fields = sample_log().to_fields();
        assert_eq!(fields.len(), TURN_LOG_FIELDS);
        assert_eq!(fields.first(), Some(&1));
        assert_eq!(fields.get(2), Some(&100));
        assert_eq!(fields.get(8), Some(&100));
        assert_eq!(fields.get(14), Some(&70));
        assert_eq!(fields.get(15), Some(&120));
        // gang_war is the fifth event flag, local_shipment the tenth.
        assert_eq!(fields.get(20), Some(&1));
        assert_eq!(fields.get(25), Some(&1));
        assert_eq!(fields.iter().skip(16).sum::<u64>(), 2);
    }

    #[test]
    fn fields_decode_back() {
        let log = sample_log();
        let decoded = TurnLog::from_fields(&log.to_fields()).unwrap();
        assert_eq!(decoded, log);
    }

    #[test]
    fn decode_rejects_short_input() {
        let err = TurnLog::from_fields(&[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            TurnLogDecodeError::WrongLength {
                expected: 27,
                actual: 3
            }
        );
    }

    #[test]
    fn decode_rejects_non_boolean_flags() {
        let mut fields = sample_log().to_fields();
        if let Some(slot) = fields.last_mut() {
            *slot = 2;
        }
        let err = TurnLog::from_fields(&fields).unwrap_err();
        assert!(matches!(
            err,
            TurnLogDecodeError::NotABoolean {
                field: "warehouse_seizure",
                value: 2
            }
        ));
    }

    #[test]
    fn trade_gate_closes_only_on_unwrangled_dash() {
        let dashed = TurnEvents {
            dealer_dash: true,
            ..TurnEvents::default()
        };
        assert!(!dashed.trade_gate_open());

        let wrangled = TurnEvents {
            dealer_dash: true,
            wrangle_dashed_dealer: true,
            ..TurnEvents::default()
        };
        assert!(wrangled.trade_gate_open());

        let wrangle_only = TurnEvents {
            wrangle_dashed_dealer: true,
            ..TurnEvents::default()
        };
        assert!(wrangle_only.trade_gate_open());
    }

    #[test]
    fn fired_lists_events_in_order() {
        let events = TurnEvents::from_fn(|kind| {
            matches!(kind, EventKind::WarehouseSeizure | EventKind::Mugging)
        });
        assert_eq!(
            events.fired(),
            vec![EventKind::Mugging, EventKind::WarehouseSeizure]
        );
        assert!(events.mug_hit());
        assert!(!events.cop_hit());
    }

    #[test]
    fn account_balance_treats_item_zero_as_money() {
        let mut account = UserAccount::with_money(500);
        account.set_item_balance(ItemId::new(3), 9);
        assert_eq!(account.balance(ItemId::CURRENCY), 500);
        assert_eq!(account.balance(ItemId::new(3)), 9);
        assert_eq!(account.balance(ItemId::new(4)), 0);

        account.set_item_balance(ItemId::new(3), 0);
        assert!(account.items.is_empty());
    }
}
