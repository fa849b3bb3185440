//! Read-only previews over unassigned orders
//!
//! Nothing here writes. Each preview prices under its own ordering policy, so
//! the totals of two previews over the same orders need not agree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;

use crate::db::queries;
use crate::error::DispatchResult;
use crate::services::batch_lifecycle::{check_id_list, in_submitted_order};
use crate::services::ordering::{arrange, OrderingPolicy};
use crate::services::pricing::{price_sequence, PricingRules};
use crate::services::vehicle_rule::recommend_vehicle;
use crate::types::{
    CalculateRouteResponse, CalculatedStop, ListUnallocatedResponse, OrderStop, PlanRouteResponse,
    PlannedStop, UnallocatedOrder, UnallocatedSummary,
};

/// Po-date ordered pool with per-order preview costs
pub fn build_unallocated(date: NaiveDate, orders: Vec<OrderStop>) -> ListUnallocatedResponse {
    let ordered = arrange(orders, OrderingPolicy::PoDate, date);
    let priced = price_sequence(&ordered.stops, PricingRules::Standard);

    let total_value: Decimal = ordered.orders.iter().map(|o| o.total_amount).sum();
    let summary = UnallocatedSummary {
        order_count: ordered.orders.len() as i64,
        total_items: ordered.orders.iter().map(|o| i64::from(o.total_items)).sum(),
        total_value,
        total_rate: priced.total,
        recommended_vehicle: recommend_vehicle(total_value),
    };

    let items = ordered
        .orders
        .into_iter()
        .zip(ordered.stops.iter().zip(&priced.stops))
        .map(|(order, (stop, priced))| UnallocatedOrder {
            order_id: order.order_id,
            po_number: order.po_number,
            po_date: order.po_date,
            scheduled_date: order.scheduled_date,
            client_id: order.client_id,
            client_code: order.client_code,
            area_id: order.area_id,
            zone_id: order.zone_id,
            distance_from_depot: stop.distance_from_depot,
            is_overdue: stop.is_overdue,
            total_amount: order.total_amount,
            total_items: order.total_items,
            charge: priced.charge,
            drop_cost: priced.cost,
        })
        .collect();

    ListUnallocatedResponse { date, items, summary }
}

/// Nearest-neighbor route with leg distances and costs in visit order
pub fn build_route_plan(date: NaiveDate, orders: Vec<OrderStop>) -> PlanRouteResponse {
    let ordered = arrange(orders, OrderingPolicy::NearestNeighbor, date);
    let priced = price_sequence(&ordered.stops, PricingRules::Standard);
    let (legs, total_route_km) = match ordered.route {
        Some(route) => (route.leg_distances, route.total_route_km),
        None => (vec![], 0.0),
    };

    let stops = ordered
        .orders
        .into_iter()
        .zip(ordered.stops.iter().zip(&priced.stops))
        .enumerate()
        .map(|(position, (order, (stop, priced)))| PlannedStop {
            order: position as i32 + 1,
            order_id: order.order_id,
            po_number: order.po_number,
            client_id: order.client_id,
            client_code: order.client_code,
            area_id: order.area_id,
            distance_from_depot: stop.distance_from_depot,
            distance_from_previous_km: legs.get(position).copied().unwrap_or(0.0),
            is_overdue: stop.is_overdue,
            charge: priced.charge,
            drop_cost: priced.cost,
        })
        .collect();

    PlanRouteResponse {
        date,
        stops,
        total_route_km,
        total_rate: priced.total,
    }
}

/// Zone-grouped, po-date ordered costs with running totals
pub fn build_route_costs(orders: Vec<OrderStop>) -> CalculateRouteResponse {
    // Overdue flags do not affect pricing; any date will do
    let ordered = arrange(orders, OrderingPolicy::ZoneThenPoDate, NaiveDate::MIN);
    let priced = price_sequence(&ordered.stops, PricingRules::Standard);
    let cumulative = priced.cumulative();

    let stops = ordered
        .orders
        .into_iter()
        .zip(priced.stops.iter().zip(cumulative))
        .map(|(order, (priced, cumulative_cost))| CalculatedStop {
            order_id: order.order_id,
            po_number: order.po_number,
            po_date: order.po_date,
            zone_id: order.zone_id,
            area_id: order.area_id,
            client_id: order.client_id,
            charge: priced.charge,
            drop_cost: priced.cost,
            cumulative_cost,
        })
        .collect();

    CalculateRouteResponse {
        stops,
        total_rate: priced.total,
    }
}

pub async fn list_unallocated(pool: &PgPool, date: NaiveDate) -> DispatchResult<ListUnallocatedResponse> {
    let orders = queries::order::list_unallocated_stops(pool, date).await?;
    let response = build_unallocated(date, orders);

    debug!(
        "{} unallocated orders for {}, preview rate {}",
        response.summary.order_count, date, response.summary.total_rate
    );
    Ok(response)
}

pub async fn plan_route(pool: &PgPool, date: NaiveDate) -> DispatchResult<PlanRouteResponse> {
    let orders = queries::order::list_unallocated_stops(pool, date).await?;
    Ok(build_route_plan(date, orders))
}

/// Fetched rows back in input order; input order decides zone group order
fn route_cost_orders(order_ids: &[i64], rows: Vec<OrderStop>) -> DispatchResult<Vec<OrderStop>> {
    check_id_list(order_ids)?;
    in_submitted_order(order_ids, rows)
}

/// Preview costs for the given orders; every id must exist once
pub async fn calculate_route(pool: &PgPool, order_ids: &[i64]) -> DispatchResult<CalculateRouteResponse> {
    check_id_list(order_ids)?;

    let rows = queries::order::get_order_stops(pool, order_ids).await?;
    Ok(build_route_costs(route_cost_orders(order_ids, rows)?))
}
