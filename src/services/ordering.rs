//! Ordering policies feeding the pricing fold
//!
//! Each caller names the policy it prices under. The policies are
//! independent and are not expected to agree on totals for the same orders.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::services::sequencer::{sequence_route, SequencedRoute};
use crate::types::{OrderStop, Stop};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingPolicy {
    /// Exactly as submitted by the caller
    Submitted,
    /// Ascending po date, ties by order id
    PoDate,
    /// Route sequencer output
    NearestNeighbor,
    /// Zones in order of first appearance, po date within a zone
    ZoneThenPoDate,
    /// Ascending distance from depot, ties by order id
    DistanceAscending,
}

/// Ordered orders and their stops under one policy
#[derive(Debug, Clone)]
pub struct OrderedStops {
    pub orders: Vec<OrderStop>,
    pub stops: Vec<Stop>,
    /// Present for [`OrderingPolicy::NearestNeighbor`] only, re-indexed to `orders`
    pub route: Option<SequencedRoute>,
}

/// Arrange `orders` under `policy`; `planning_date` decides overdue flags.
pub fn arrange(
    mut orders: Vec<OrderStop>,
    policy: OrderingPolicy,
    planning_date: NaiveDate,
) -> OrderedStops {
    let mut route = None;

    match policy {
        OrderingPolicy::Submitted => {}
        OrderingPolicy::PoDate => {
            orders.sort_by(|a, b| a.po_date.cmp(&b.po_date).then(a.order_id.cmp(&b.order_id)));
        }
        OrderingPolicy::DistanceAscending => {
            orders.sort_by(|a, b| {
                a.distance()
                    .total_cmp(&b.distance())
                    .then(a.order_id.cmp(&b.order_id))
            });
        }
        OrderingPolicy::ZoneThenPoDate => {
            let mut zone_rank: HashMap<Option<i64>, usize> = HashMap::new();
            for order in &orders {
                let next_rank = zone_rank.len();
                zone_rank.entry(order.zone_id).or_insert(next_rank);
            }
            orders.sort_by(|a, b| {
                zone_rank[&a.zone_id]
                    .cmp(&zone_rank[&b.zone_id])
                    .then(a.po_date.cmp(&b.po_date))
                    .then(a.order_id.cmp(&b.order_id))
            });
        }
        OrderingPolicy::NearestNeighbor => {
            let stops: Vec<Stop> = orders.iter().map(|o| o.to_stop(planning_date)).collect();
            let sequenced = sequence_route(&stops);
            let mut slots: Vec<Option<OrderStop>> = orders.into_iter().map(Some).collect();
            orders = sequenced
                .order
                .iter()
                .filter_map(|&idx| slots[idx].take())
                .collect();
            route = Some(SequencedRoute {
                order: (0..orders.len()).collect(),
                ..sequenced
            });
        }
    }

    let stops = orders.iter().map(|o| o.to_stop(planning_date)).collect();
    OrderedStops { orders, stops, route }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::pricing::{price_sequence, PricingRules};
    use crate::types::stop::fixtures::order_stop;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn ids(ordered: &OrderedStops) -> Vec<i64> {
        ordered.orders.iter().map(|o| o.order_id).collect()
    }

    fn with_po_date(mut order: OrderStop, d: u32) -> OrderStop {
        order.po_date = day(d);
        order
    }

    fn with_zone(mut order: OrderStop, zone_id: i64) -> OrderStop {
        order.zone_id = Some(zone_id);
        order
    }

    #[test]
    fn test_submitted_keeps_caller_order() {
        let orders = vec![order_stop(5, 1, 10, 9.0), order_stop(2, 2, 10, 1.0), order_stop(7, 3, 11, 4.0)];

        let ordered = arrange(orders, OrderingPolicy::Submitted, day(18));

        assert_eq!(ids(&ordered), vec![5, 2, 7]);
        assert!(ordered.route.is_none());
    }

    #[test]
    fn test_po_date_then_id() {
        let orders = vec![
            with_po_date(order_stop(3, 1, 10, 1.0), 5),
            with_po_date(order_stop(1, 2, 10, 1.0), 5),
            with_po_date(order_stop(2, 3, 10, 1.0), 2),
        ];

        let ordered = arrange(orders, OrderingPolicy::PoDate, day(18));

        assert_eq!(ids(&ordered), vec![2, 1, 3]);
    }

    #[test]
    fn test_distance_ascending() {
        let orders = vec![order_stop(1, 1, 10, 9.0), order_stop(2, 2, 10, 1.5), order_stop(3, 3, 10, 4.0)];

        let ordered = arrange(orders, OrderingPolicy::DistanceAscending, day(18));

        assert_eq!(ids(&ordered), vec![2, 3, 1]);
    }

    #[test]
    fn test_zone_groups_in_first_appearance_order() {
        let orders = vec![
            with_po_date(with_zone(order_stop(1, 1, 20, 1.0), 2), 9),
            with_po_date(with_zone(order_stop(2, 2, 10, 1.0), 1), 3),
            with_po_date(with_zone(order_stop(3, 3, 20, 1.0), 2), 1),
            with_po_date(with_zone(order_stop(4, 4, 10, 1.0), 1), 2),
        ];

        let ordered = arrange(orders, OrderingPolicy::ZoneThenPoDate, day(18));

        assert_eq!(ids(&ordered), vec![3, 1, 4, 2]);
    }

    #[test]
    fn test_nearest_neighbor_reindexes_route() {
        let orders = vec![order_stop(1, 1, 10, 12.0), order_stop(2, 2, 10, 3.0), order_stop(3, 3, 10, 8.0)];

        let ordered = arrange(orders, OrderingPolicy::NearestNeighbor, day(18));

        assert_eq!(ids(&ordered), vec![2, 3, 1]);
        let route = ordered.route.unwrap();
        assert_eq!(route.order, vec![0, 1, 2]);
        assert_eq!(route.leg_distances, vec![0.0, 5.0, 4.0]);
    }

    #[test]
    fn test_overdue_flag_follows_planning_date() {
        let mut late = order_stop(1, 1, 10, 40.0);
        late.scheduled_date = day(10);
        let orders = vec![order_stop(2, 2, 10, 1.0), late];

        let ordered = arrange(orders, OrderingPolicy::NearestNeighbor, day(18));

        assert_eq!(ids(&ordered), vec![1, 2]);
        assert!(ordered.stops[0].is_overdue);
    }

    #[test]
    fn test_policies_price_independently() {
        // Same orders, three policies, three totals
        let make = || {
            vec![
                with_po_date(with_zone(order_stop(1, 1, 10, 20.0), 1), 1),
                with_po_date(with_zone(order_stop(2, 2, 20, 2.0), 2), 2),
                with_po_date(with_zone(order_stop(3, 3, 10, 21.0), 1), 3),
            ]
        };
        let total = |policy| {
            let ordered = arrange(make(), policy, day(18));
            price_sequence(&ordered.stops, PricingRules::Standard).total
        };

        // areas 10, 20, 10
        assert_eq!(total(OrderingPolicy::PoDate), dec!(2000));
        // areas 20, 10, 10
        assert_eq!(total(OrderingPolicy::NearestNeighbor), dec!(1750));
        // areas 10, 10, 20
        assert_eq!(total(OrderingPolicy::ZoneThenPoDate), dec!(1750));
    }
}
