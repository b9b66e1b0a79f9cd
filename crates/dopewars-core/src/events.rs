//! Event resolution: eleven rolls per turn and the factors they imply.
//!
//! Each event consumes one word of the turn's [`BitStream`] and fires when
//! `word % 100` is below its configured odds. Paired events (dash/wrangle,
//! mugging/run, gang war/defend, raid/bribe) only matter when the first
//! fires and the second does not.
//!
//! Factors are percentages centered on [`NEUTRAL_FACTOR`]:
//!
//! | Factor | Below 100 | Above 100 |
//! |--------|-----------|-----------|
//! | item | raid or gang war landed, no stash found | nothing landed, stash found |
//! | money | raid or mugging landed | never |
//! | regional item | seizure without shipment | shipment without seizure |
//!
//! Every other combination yields exactly 100. When two losses land on the
//! same amount their magnitudes compound.

use dopewars_types::{EventKind, NEUTRAL_FACTOR, TurnEvents, TurnFactors};

use crate::config::EventConfig;
use crate::random::BitStream;

/// Rolls per event are taken modulo this.
const ROLL_RANGE: u64 = 100;

/// Turns event odds and magnitudes into per-turn outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEngine {
    config: EventConfig,
}

impl EventEngine {
    /// Create an engine from validated event configuration.
    pub const fn new(config: EventConfig) -> Self {
        Self { config }
    }

    /// The configuration this engine rolls against.
    pub const fn config(&self) -> &EventConfig {
        &self.config
    }

    /// Roll all eleven events from a stream, one word each, in log order.
    ///
    /// A stream that runs dry leaves the remaining events unfired.
    pub fn roll(&self, mut stream: BitStream) -> TurnEvents {
        TurnEvents::from_fn(|kind| {
            stream
                .next()
                .and_then(|word| word.checked_rem(ROLL_RANGE))
                .is_some_and(|roll| roll < u64::from(self.config.odds.get(kind)))
        })
    }

    /// Derive the three factors from a set of outcomes.
    pub fn factors(&self, events: &TurnEvents) -> TurnFactors {
        let cfg = &self.config;

        let item_reduction_factor = if events.cop_hit() || events.gang_hit() {
            if events.find_item {
                NEUTRAL_FACTOR
            } else {
                compound([
                    events.cop_hit().then_some(cfg.cop_raid_item_pct),
                    events.gang_hit().then_some(cfg.gang_war_item_pct),
                ])
            }
        } else if events.find_item {
            cfg.find_item_pct
        } else {
            NEUTRAL_FACTOR
        };

        let money_reduction_factor = compound([
            events.cop_hit().then_some(cfg.cop_raid_money_pct),
            events.mug_hit().then_some(cfg.mugging_money_pct),
        ]);

        let regional_item_reduction_factor = match (events.local_shipment, events.warehouse_seizure) {
            (true, false) => cfg.local_shipment_pct,
            (false, true) => cfg.warehouse_seizure_pct,
            _ => NEUTRAL_FACTOR,
        };

        TurnFactors {
            money_reduction_factor,
            item_reduction_factor,
            regional_item_reduction_factor,
        }
    }

    /// Whether a given event could ever fire under this configuration.
    pub fn can_fire(&self, kind: EventKind) -> bool {
        self.config.odds.get(kind) > 0
    }
}

/// Multiply the landed loss percentages together, rescaled to base 100.
///
/// Every input is below 100, so the product stays below 100 and fits.
fn compound<const N: usize>(losses: [Option<u32>; N]) -> u32 {
    losses
        .into_iter()
        .flatten()
        .fold(NEUTRAL_FACTOR, |acc, pct| {
            acc.checked_mul(pct)
                .and_then(|p| p.checked_div(NEUTRAL_FACTOR))
                .unwrap_or(0)
        })
}

/// Scale an amount by a percentage factor: `floor(factor * amount / 100)`.
///
/// Returns `None` when the result does not fit `u64`.
pub fn apply_factor(factor: u32, amount: u64) -> Option<u64> {
    let scaled = u128::from(factor)
        .checked_mul(u128::from(amount))?
        .checked_div(u128::from(NEUTRAL_FACTOR))?;
    u64::try_from(scaled).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::EventOdds;

    fn engine() -> EventEngine {
        EventEngine::new(EventConfig::default())
    }

    fn only(kinds: &[EventKind]) -> TurnEvents {
        TurnEvents::from_fn(|kind| kinds.contains(&kind))
    }

    #[test]
    fn roll_compares_each_word_against_odds() {
        let engine = EventEngine::new(EventConfig {
            odds: EventOdds::uniform(50),
            ..EventConfig::default()
        });
        // 149 % 100 = 49 fires, 50 does not, 1_000 % 100 = 0 fires.
        let words = vec![149, 50, 1_000, 99, 0, 51, 49, 150, 250, 300, 77];
        let events = engine.roll(BitStream::new(words.into_iter()));
        assert_eq!(
            events.fired(),
            vec![
                EventKind::DealerDash,
                EventKind::Mugging,
                EventKind::GangWar,
                EventKind::CopRaid,
                EventKind::LocalShipment,
            ]
        );
    }

    #[test]
    fn short_stream_leaves_rest_unfired() {
        let engine = EventEngine::new(EventConfig {
            odds: EventOdds::uniform(100),
            ..EventConfig::default()
        });
        let events = engine.roll(BitStream::new(vec![0, 0].into_iter()));
        assert_eq!(
            events.fired(),
            vec![EventKind::DealerDash, EventKind::WrangleDashedDealer]
        );
    }

    #[test]
    fn zero_odds_never_fire() {
        let engine = EventEngine::new(EventConfig {
            odds: EventOdds::uniform(0),
            ..EventConfig::default()
        });
        let events = engine.roll(BitStream::new(core::iter::repeat(0)));
        assert!(events.fired().is_empty());
        assert!(!engine.can_fire(EventKind::Mugging));
    }

    #[test]
    fn quiet_turn_is_neutral() {
        assert_eq!(engine().factors(&TurnEvents::default()), TurnFactors::default());
    }

    #[test]
    fn landed_raid_cuts_item_and_money() {
        let factors = engine().factors(&only(&[EventKind::CopRaid]));
        assert_eq!(factors.item_reduction_factor, 70);
        assert_eq!(factors.money_reduction_factor, 80);
        assert_eq!(factors.regional_item_reduction_factor, 100);
    }

    #[test]
    fn bribed_raid_changes_nothing() {
        let factors = engine().factors(&only(&[EventKind::CopRaid, EventKind::BribeCops]));
        assert_eq!(factors, TurnFactors::default());
    }

    #[test]
    fn raid_and_gang_war_compound() {
        let factors = engine().factors(&only(&[EventKind::CopRaid, EventKind::GangWar]));
        // 70 * 80 / 100
        assert_eq!(factors.item_reduction_factor, 56);
    }

    #[test]
    fn find_without_loss_is_a_gain() {
        let factors = engine().factors(&only(&[EventKind::FindItem]));
        assert_eq!(factors.item_reduction_factor, 150);
        assert_eq!(factors.money_reduction_factor, 100);
    }

    #[test]
    fn find_with_loss_cancels_out() {
        let factors = engine().factors(&only(&[EventKind::GangWar, EventKind::FindItem]));
        assert_eq!(factors.item_reduction_factor, 100);
    }

    #[test]
    fn mugging_hits_money_only() {
        let factors = engine().factors(&only(&[EventKind::Mugging]));
        assert_eq!(factors.money_reduction_factor, 85);
        assert_eq!(factors.item_reduction_factor, 100);

        let escaped = engine().factors(&only(&[EventKind::Mugging, EventKind::RunFromMugging]));
        assert_eq!(escaped.money_reduction_factor, 100);
    }

    #[test]
    fn regional_factor_follows_shipment_and_seizure() {
        let e = engine();
        assert_eq!(
            e.factors(&only(&[EventKind::LocalShipment]))
                .regional_item_reduction_factor,
            120
        );
        assert_eq!(
            e.factors(&only(&[EventKind::WarehouseSeizure]))
                .regional_item_reduction_factor,
            70
        );
        assert_eq!(
            e.factors(&only(&[EventKind::LocalShipment, EventKind::WarehouseSeizure]))
                .regional_item_reduction_factor,
            100
        );
    }

    #[test]
    fn every_combination_respects_factor_bounds() {
        let e = engine();
        for mask in 0_u32..(1 << 11) {
            let events = TurnEvents::from_fn(|kind| {
                let bit = EventKind::ALL.iter().position(|k| *k == kind).unwrap();
                mask & (1 << bit) != 0
            });
            let f = e.factors(&events);
            let item_loss = (events.cop_hit() || events.gang_hit()) && !events.find_item;
            let item_gain = !events.cop_hit() && !events.gang_hit() && events.find_item;
            assert_eq!(f.item_reduction_factor < 100, item_loss, "mask {mask}");
            assert_eq!(f.item_reduction_factor > 100, item_gain, "mask {mask}");
            assert_eq!(
                f.money_reduction_factor < 100,
                events.cop_hit() || events.mug_hit(),
                "mask {mask}"
            );
            assert!(f.money_reduction_factor <= 100);
        }
    }

    #[test]
    fn apply_factor_truncates() {
        assert_eq!(apply_factor(70, 101), Some(70));
        assert_eq!(apply_factor(150, 3), Some(4));
        assert_eq!(apply_factor(100, 12_345), Some(12_345));
        assert_eq!(apply_factor(0, 500), Some(0));
        assert_eq!(apply_factor(200, u64::MAX), None);
    }
}
