//! Hybrid drop-cost pricing
//!
//! Prices an ordered sequence of stops as one left fold. The first stop pays
//! its zone's base rate; every later stop pays a drop charge that depends on
//! the previous stop's area and on whether its client was already served
//! earlier in the sequence. Order matters: the same stops in a different
//! order generally price differently.
//!
//! Every call site that prices a sequence goes through [`price_sequence`].

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::defaults::{OTHER_ZONE_DROP_RATE, SAME_ZONE_DROP_RATE};
use crate::types::{DropCharge, OrderRates, Stop};

/// Rule set applied by the fold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingRules {
    /// First stop, repeat client, same area and other area branches
    Standard,
    /// Area adjacency only: repeat clients are charged like any other stop.
    /// Used by bulk delivery confirmation.
    AdjacencyOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedStop {
    pub charge: DropCharge,
    pub cost: Decimal,
}

impl PricedStop {
    /// Persisted rate columns for this stop
    pub fn rates(&self) -> OrderRates {
        let (base_rate, additional_rate) = match self.charge {
            DropCharge::FirstStop => (self.cost, Decimal::ZERO),
            DropCharge::RepeatClient => (Decimal::ZERO, Decimal::ZERO),
            DropCharge::SameZone | DropCharge::OtherZone => (Decimal::ZERO, self.cost),
        };

        OrderRates {
            base_rate,
            additional_rate_type: self.charge.into(),
            additional_rate,
            total_rate: self.cost,
        }
    }
}

/// Per-stop costs, parallel to the input, plus their sum
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedSequence {
    pub stops: Vec<PricedStop>,
    pub total: Decimal,
}

impl PricedSequence {
    /// Running total after each stop
    pub fn cumulative(&self) -> Vec<Decimal> {
        self.stops
            .iter()
            .scan(Decimal::ZERO, |running, stop| {
                *running += stop.cost;
                Some(*running)
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct FoldState {
    seen_clients: HashSet<i64>,
    previous_area: Option<i64>,
}

impl FoldState {
    fn step(&mut self, index: usize, stop: &Stop, rules: PricingRules) -> PricedStop {
        let priced = if index == 0 {
            self.mark_seen(stop.client_id);
            PricedStop { charge: DropCharge::FirstStop, cost: stop.zone_base_rate }
        } else if rules == PricingRules::Standard && self.is_repeat(stop.client_id) {
            PricedStop { charge: DropCharge::RepeatClient, cost: Decimal::ZERO }
        } else {
            self.mark_seen(stop.client_id);
            match (stop.area_id, self.previous_area) {
                (Some(current), Some(previous)) if current == previous => {
                    PricedStop { charge: DropCharge::SameZone, cost: SAME_ZONE_DROP_RATE }
                }
                _ => PricedStop { charge: DropCharge::OtherZone, cost: OTHER_ZONE_DROP_RATE },
            }
        };

        // Updated on every branch, including repeat clients and unknown areas
        self.previous_area = stop.area_id;
        priced
    }

    fn is_repeat(&self, client_id: Option<i64>) -> bool {
        client_id.is_some_and(|id| self.seen_clients.contains(&id))
    }

    fn mark_seen(&mut self, client_id: Option<i64>) {
        if let Some(id) = client_id {
            self.seen_clients.insert(id);
        }
    }
}

/// Price an ordered stop sequence. Pure and deterministic.
pub fn price_sequence(stops: &[Stop], rules: PricingRules) -> PricedSequence {
    let mut state = FoldState::default();
    let priced: Vec<PricedStop> = stops
        .iter()
        .enumerate()
        .map(|(index, stop)| state.step(index, stop, rules))
        .collect();
    let total = priced.iter().map(|stop| stop.cost).sum();

    PricedSequence { stops: priced, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AdditionalRateType;
    use rust_decimal_macros::dec;

    fn stop(client: i64, area: i64) -> Stop {
        Stop {
            client_id: Some(client),
            area_id: Some(area),
            zone_base_rate: dec!(1000),
            distance_from_depot: 0.0,
            is_overdue: false,
        }
    }

    fn costs(sequence: &PricedSequence) -> Vec<Decimal> {
        sequence.stops.iter().map(|s| s.cost).collect()
    }

    #[test]
    fn test_reference_sequence() {
        // A(client 1, area 10), B(client 2, area 10), C(client 1, area 20)
        let stops = vec![stop(1, 10), stop(2, 10), stop(1, 20)];

        let priced = price_sequence(&stops, PricingRules::Standard);

        assert_eq!(costs(&priced), vec![dec!(1000), dec!(250), dec!(0)]);
        assert_eq!(priced.total, dec!(1250));
        assert_eq!(priced.stops[2].charge, DropCharge::RepeatClient);
    }

    #[test]
    fn test_empty_sequence_is_free() {
        let priced = price_sequence(&[], PricingRules::Standard);
        assert!(priced.stops.is_empty());
        assert_eq!(priced.total, Decimal::ZERO);
    }

    #[test]
    fn test_deterministic() {
        let stops = vec![stop(1, 10), stop(2, 20), stop(3, 20), stop(1, 30), stop(4, 10)];

        let first = price_sequence(&stops, PricingRules::Standard);
        for _ in 0..10 {
            assert_eq!(price_sequence(&stops, PricingRules::Standard), first);
        }
    }

    #[test]
    fn test_order_changes_total() {
        let mut stops = vec![stop(1, 10), stop(2, 10), stop(3, 20)];
        stops[2].zone_base_rate = dec!(1800);

        let forward = price_sequence(&stops, PricingRules::Standard);
        stops.reverse();
        let reverse = price_sequence(&stops, PricingRules::Standard);

        // 1000 + 250 + 500 vs 1800 + 500 + 250
        assert_eq!(forward.total, dec!(1750));
        assert_eq!(reverse.total, dec!(2550));
    }

    #[test]
    fn test_first_stop_pays_its_own_zone_rate() {
        let mut first = stop(7, 10);
        first.zone_base_rate = dec!(2350.50);

        let priced = price_sequence(&[first, stop(8, 10)], PricingRules::Standard);

        assert_eq!(priced.stops[0].charge, DropCharge::FirstStop);
        assert_eq!(priced.stops[0].cost, dec!(2350.50));
    }

    #[test]
    fn test_repeat_clients_are_free_after_first_visit() {
        let stops = vec![stop(1, 10), stop(2, 20), stop(1, 30), stop(1, 10), stop(2, 10)];

        let priced = price_sequence(&stops, PricingRules::Standard);

        assert_eq!(costs(&priced), vec![dec!(1000), dec!(500), dec!(0), dec!(0), dec!(0)]);
    }

    #[test]
    fn test_adjacent_area_charges() {
        let priced = price_sequence(
            &[stop(1, 10), stop(2, 10), stop(3, 11), stop(4, 11)],
            PricingRules::Standard,
        );

        assert_eq!(costs(&priced), vec![dec!(1000), dec!(250), dec!(500), dec!(250)]);
    }

    #[test]
    fn test_repeat_client_still_moves_previous_area() {
        // Client 1 revisited in area 20, so client 3 in area 20 is same-zone
        let stops = vec![stop(1, 10), stop(2, 10), stop(1, 20), stop(3, 20)];

        let priced = price_sequence(&stops, PricingRules::Standard);

        assert_eq!(costs(&priced), vec![dec!(1000), dec!(250), dec!(0), dec!(250)]);
    }

    #[test]
    fn test_unknown_areas_never_match() {
        let mut a = stop(1, 10);
        let mut b = stop(2, 10);
        a.area_id = None;
        b.area_id = None;

        let priced = price_sequence(&[a, b, stop(3, 10)], PricingRules::Standard);

        // None == None is not adjacency, and a None predecessor breaks the chain
        assert_eq!(costs(&priced), vec![dec!(1000), dec!(500), dec!(500)]);
    }

    #[test]
    fn test_clientless_stops_are_never_repeats() {
        let mut a = stop(1, 10);
        let mut b = stop(1, 10);
        a.client_id = None;
        b.client_id = None;

        let priced = price_sequence(&[a, b], PricingRules::Standard);
        assert_eq!(priced.stops[1].charge, DropCharge::SameZone);
    }

    #[test]
    fn test_adjacency_only_ignores_repeat_clients() {
        let stops = vec![stop(1, 10), stop(2, 10), stop(1, 20)];

        let priced = price_sequence(&stops, PricingRules::AdjacencyOnly);

        assert_eq!(costs(&priced), vec![dec!(1000), dec!(250), dec!(500)]);
        assert_eq!(priced.total, dec!(1750));
    }

    #[test]
    fn test_cumulative_costs() {
        let priced = price_sequence(&[stop(1, 10), stop(2, 10), stop(1, 20)], PricingRules::Standard);
        assert_eq!(priced.cumulative(), vec![dec!(1000), dec!(1250), dec!(1250)]);
    }

    #[test]
    fn test_rates_split_by_charge() {
        let priced = price_sequence(&[stop(1, 10), stop(2, 10), stop(1, 20)], PricingRules::Standard);

        let first = priced.stops[0].rates();
        assert_eq!(first.base_rate, dec!(1000));
        assert_eq!(first.additional_rate, Decimal::ZERO);
        assert_eq!(first.additional_rate_type, AdditionalRateType::None);
        assert_eq!(first.total_rate, dec!(1000));

        let same_zone = priced.stops[1].rates();
        assert_eq!(same_zone.base_rate, Decimal::ZERO);
        assert_eq!(same_zone.additional_rate, dec!(250));
        assert_eq!(same_zone.additional_rate_type, AdditionalRateType::DropSameZone);

        assert_eq!(priced.stops[2].rates(), OrderRates::zeroed());
    }
}
