//! Route sequencing
//!
//! Greedy nearest-neighbor over distance-from-depot with an overdue override.
//! Fast and reproducible, never backtracks, makes no optimality claim.

use tracing::debug;

use crate::types::Stop;

/// Result of sequencing: a permutation of the input plus leg distances
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedRoute {
    /// Indices into the input stops in visit order
    pub order: Vec<usize>,
    /// Distance from the previous stop, parallel to `order` (0 for the first)
    pub leg_distances: Vec<f64>,
    /// Sum of legs plus the farthest stop's distance as the return approximation
    pub total_route_km: f64,
}

impl SequencedRoute {
    pub fn empty() -> Self {
        Self {
            order: vec![],
            leg_distances: vec![],
            total_route_km: 0.0,
        }
    }
}

/// Selection key: overdue stops first, then closest to the current position
fn priority(stop: &Stop, current_distance: f64) -> (u8, f64) {
    if stop.is_overdue {
        (0, 0.0)
    } else {
        (1, (stop.distance_from_depot - current_distance).abs())
    }
}

/// Sequence stops starting from the depot (distance 0).
///
/// Ties go to the candidate that appears first in the remaining set, which
/// keeps the input's relative order.
pub fn sequence_route(stops: &[Stop]) -> SequencedRoute {
    if stops.is_empty() {
        return SequencedRoute::empty();
    }

    let mut remaining: Vec<usize> = (0..stops.len()).collect();
    let mut order = Vec::with_capacity(stops.len());
    let mut current_distance = 0.0;

    while !remaining.is_empty() {
        let (position, _) = remaining
            .iter()
            .enumerate()
            .map(|(position, &idx)| (position, priority(&stops[idx], current_distance)))
            .min_by(|(_, a), (_, b)| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)))
            .unwrap_or((0, (0, 0.0)));

        let next = remaining.remove(position);
        current_distance = stops[next].distance_from_depot;
        order.push(next);
    }

    let distances: Vec<f64> = order.iter().map(|&idx| stops[idx].distance_from_depot).collect();
    let leg_distances: Vec<f64> = distances
        .iter()
        .enumerate()
        .map(|(i, &d)| if i == 0 { 0.0 } else { (d - distances[i - 1]).abs() })
        .collect();
    let farthest = distances.iter().copied().fold(0.0, f64::max);
    let total_route_km = leg_distances.iter().sum::<f64>() + farthest;

    debug!(
        "Sequenced {} stops, {:.1} km including return",
        order.len(),
        total_route_km
    );

    SequencedRoute {
        order,
        leg_distances,
        total_route_km,
    }
}
