//! Batch lifecycle
//!
//! ```text
//! (unassigned) --allocate--> planned --start--> in_transit --complete--> completed
//!                              |  \
//!                              |   remove member (recompute, or delete when last)
//!                              delete (release all members)
//! ```
//!
//! Each transition is one transaction. Planning (validation, pricing,
//! aggregation) is done by pure functions over locked rows before the first
//! write; any error drops the transaction, which rolls back.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::queries;
use crate::db::queries::batch::NewBatch;
use crate::error::{DispatchError, DispatchResult};
use crate::services::ordering::{arrange, OrderingPolicy};
use crate::services::pricing::{price_sequence, PricedStop, PricingRules};
use crate::types::{
    AllocateRequest, Batch, BatchDetail, BatchListResponse, BatchStatus, BatchTotals,
    ConfirmBulkDeliveryRequest, ConfirmDeliveryRequest, DeleteBatchResponse, DeliveredOrder,
    DeliveryConfirmation, Order, OrderRates, OrderStatus, OrderStop, RemovalOutcome, Stop, Vehicle,
    VehicleType,
};

// ============================================================================
// Planning (pure)
// ============================================================================

/// `B-YYYYMMDD-NNN`, unique per planned date
pub fn batch_number(planned_date: NaiveDate, sequence_no: i32) -> String {
    format!("B-{}-{:03}", planned_date.format("%Y%m%d"), sequence_no)
}

/// Aggregates over members; distance is out to the farthest member and back
pub fn batch_totals(members: &[OrderStop], total_rate: Decimal) -> BatchTotals {
    let farthest = members.iter().map(OrderStop::distance).fold(0.0, f64::max);

    BatchTotals {
        order_count: members.len() as i32,
        total_items: members.iter().map(|m| m.total_items).sum(),
        total_value: members.iter().map(|m| m.total_amount).sum(),
        total_rate,
        total_distance_km: 2.0 * farthest,
    }
}

/// Members in pricing order with the rates each one gets
#[derive(Debug, Clone, PartialEq)]
pub struct PricedMembers {
    pub rates: Vec<(i64, OrderRates)>,
    pub totals: BatchTotals,
}

fn price_members(members: Vec<OrderStop>, policy: OrderingPolicy, planning_date: NaiveDate) -> PricedMembers {
    let ordered = arrange(members, policy, planning_date);
    let priced = price_sequence(&ordered.stops, PricingRules::Standard);

    let rates = ordered
        .orders
        .iter()
        .zip(&priced.stops)
        .map(|(order, stop)| (order.order_id, stop.rates()))
        .collect();

    PricedMembers {
        rates,
        totals: batch_totals(&ordered.orders, priced.total),
    }
}

/// Reject empty and duplicate id lists
pub(crate) fn check_id_list(order_ids: &[i64]) -> DispatchResult<()> {
    if order_ids.is_empty() {
        return Err(DispatchError::validation("No orders selected"));
    }

    let mut seen = HashSet::with_capacity(order_ids.len());
    if let Some(duplicate) = order_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(DispatchError::validation(format!(
            "Order {} is selected more than once",
            duplicate
        )));
    }

    Ok(())
}

/// Reorder fetched rows to match `order_ids`, failing on any unknown id
pub(crate) fn in_submitted_order(order_ids: &[i64], rows: Vec<OrderStop>) -> DispatchResult<Vec<OrderStop>> {
    let mut by_id: HashMap<i64, OrderStop> = rows.into_iter().map(|r| (r.order_id, r)).collect();

    order_ids
        .iter()
        .map(|id| {
            by_id
                .remove(id)
                .ok_or_else(|| DispatchError::validation(format!("Unknown order id {}", id)))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationPlan {
    pub zone_id: i64,
    pub members: PricedMembers,
}

/// Validate an allocation and price it over the submitted order
pub fn plan_allocation(
    order_ids: &[i64],
    rows: Vec<OrderStop>,
    planned_date: NaiveDate,
) -> DispatchResult<AllocationPlan> {
    check_id_list(order_ids)?;
    let members = in_submitted_order(order_ids, rows)?;

    if let Some(taken) = members
        .iter()
        .find(|m| m.batch_id.is_some() || m.status != OrderStatus::Pending)
    {
        return Err(DispatchError::invalid_state(format!(
            "Order {} ({}) is not unassigned",
            taken.order_id, taken.po_number
        )));
    }

    let first = &members[0];
    let zone_id = first
        .zone_id
        .ok_or(DispatchError::ZoneUnresolved { order_id: first.order_id })?;

    Ok(AllocationPlan {
        zone_id,
        members: price_members(members, OrderingPolicy::Submitted, planned_date),
    })
}

/// Re-price what is left of a batch, or `None` when nothing is left
pub fn plan_recompute(remaining: Vec<OrderStop>, planning_date: NaiveDate) -> Option<PricedMembers> {
    if remaining.is_empty() {
        return None;
    }
    Some(price_members(remaining, OrderingPolicy::DistanceAscending, planning_date))
}

/// Rates for a one-order delivery: the supplied base rate, priced as the
/// only stop of its sequence
pub fn single_delivery_rates(base_rate: Decimal) -> OrderRates {
    let stop = Stop {
        client_id: None,
        area_id: None,
        zone_base_rate: base_rate,
        distance_from_depot: 0.0,
        is_overdue: false,
    };

    price_sequence(&[stop], PricingRules::Standard)
        .stops
        .first()
        .map(PricedStop::rates)
        .unwrap_or_else(OrderRates::zeroed)
}

/// A named vehicle must be of the requested type; exceeding its max value only warns
pub fn check_vehicle(vehicle: &Vehicle, requested: VehicleType, total_value: Decimal) -> DispatchResult<()> {
    if vehicle.vehicle_type != requested {
        return Err(DispatchError::validation(format!(
            "Vehicle {} is a {}, not {}",
            vehicle.plate_number,
            vehicle.vehicle_type.as_str(),
            requested.as_str()
        )));
    }

    if total_value > vehicle.max_value {
        warn!(
            "Batch value {} exceeds vehicle {} max value {}",
            total_value, vehicle.plate_number, vehicle.max_value
        );
    }
    Ok(())
}

fn check_directly_confirmable(order_id: i64, batch_id: Option<i64>, status: OrderStatus) -> DispatchResult<()> {
    if let Some(batch_id) = batch_id {
        return Err(DispatchError::invalid_state(format!(
            "Order {} belongs to batch {}; complete the batch instead",
            order_id, batch_id
        )));
    }
    if !status.is_confirmable() {
        return Err(DispatchError::invalid_state(format!(
            "Order {} is already {}",
            order_id,
            status.as_str()
        )));
    }
    Ok(())
}

/// Validate and price a bulk confirmation over the submitted order.
///
/// Uses the adjacency-only rules: a client appearing twice is charged twice.
pub fn plan_bulk_delivery(
    order_ids: &[i64],
    rows: Vec<OrderStop>,
    delivery_date: NaiveDate,
) -> DispatchResult<Vec<DeliveredOrder>> {
    check_id_list(order_ids)?;
    let members = in_submitted_order(order_ids, rows)?;
    for member in &members {
        check_directly_confirmable(member.order_id, member.batch_id, member.status)?;
    }

    let ordered = arrange(members, OrderingPolicy::Submitted, delivery_date);
    let priced = price_sequence(&ordered.stops, PricingRules::AdjacencyOnly);

    Ok(ordered
        .orders
        .iter()
        .zip(&priced.stops)
        .map(|(order, stop)| DeliveredOrder {
            order_id: order.order_id,
            status: OrderStatus::for_delivery(delivery_date, order.scheduled_date),
            rates: stop.rates(),
        })
        .collect())
}

fn require_batch(batch_id: i64, batch: Option<Batch>) -> DispatchResult<Batch> {
    batch.ok_or_else(|| DispatchError::NotFound(format!("Batch {}", batch_id)))
}

fn require_status(batch: &Batch, expected: BatchStatus, action: &str) -> DispatchResult<()> {
    if batch.status != expected {
        return Err(DispatchError::invalid_state(format!(
            "Cannot {} batch {}: status is {}, expected {}",
            action,
            batch.id,
            batch.status.as_str(),
            expected.as_str()
        )));
    }
    Ok(())
}

/// Write to one member order
#[derive(Debug, Clone, PartialEq)]
pub enum MemberWrite {
    /// Back to the unassigned pool: no batch, zeroed rates, pending
    Release,
    Reprice(OrderRates),
    /// Status to in_transit
    Dispatch,
    Deliver { delivery_date: NaiveDate, status: OrderStatus },
}

/// Write to the batch row itself
#[derive(Debug, Clone, PartialEq)]
pub enum BatchWrite {
    Delete,
    Totals(BatchTotals),
    Status { status: BatchStatus, actual_date: Option<NaiveDate> },
}

/// Every write of one transition, decided before the first is applied.
/// Member writes go first so a deleted batch has no members left.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub members: Vec<(i64, MemberWrite)>,
    pub batch: BatchWrite,
}

/// Release one member; re-price the rest, or delete the batch when none remain
pub fn plan_removal(batch: &Batch, order_id: i64, members: Vec<OrderStop>) -> DispatchResult<TransitionPlan> {
    require_status(batch, BatchStatus::Planned, "remove orders from")?;

    if !members.iter().any(|m| m.order_id == order_id) {
        return Err(DispatchError::invalid_state(format!(
            "Order {} left batch {} concurrently",
            order_id, batch.batch_number
        )));
    }

    let remaining: Vec<OrderStop> = members.into_iter().filter(|m| m.order_id != order_id).collect();
    let mut writes = vec![(order_id, MemberWrite::Release)];

    let batch_write = match plan_recompute(remaining, batch.planned_date) {
        None => BatchWrite::Delete,
        Some(recomputed) => {
            writes.extend(
                recomputed
                    .rates
                    .into_iter()
                    .map(|(member_id, rates)| (member_id, MemberWrite::Reprice(rates))),
            );
            BatchWrite::Totals(recomputed.totals)
        }
    };

    Ok(TransitionPlan { members: writes, batch: batch_write })
}

pub fn plan_delete(batch: &Batch, members: &[Order]) -> DispatchResult<TransitionPlan> {
    require_status(batch, BatchStatus::Planned, "delete")?;

    Ok(TransitionPlan {
        members: members.iter().map(|m| (m.id, MemberWrite::Release)).collect(),
        batch: BatchWrite::Delete,
    })
}

pub fn plan_start(batch: &Batch, members: &[Order]) -> DispatchResult<TransitionPlan> {
    require_status(batch, BatchStatus::Planned, "start")?;

    Ok(TransitionPlan {
        members: members.iter().map(|m| (m.id, MemberWrite::Dispatch)).collect(),
        batch: BatchWrite::Status { status: BatchStatus::InTransit, actual_date: None },
    })
}

/// Each member is on time or delayed against its own schedule
pub fn plan_completion(batch: &Batch, members: &[Order], delivery_date: NaiveDate) -> DispatchResult<TransitionPlan> {
    require_status(batch, BatchStatus::InTransit, "complete")?;

    Ok(TransitionPlan {
        members: members
            .iter()
            .map(|m| {
                let status = OrderStatus::for_delivery(delivery_date, m.scheduled_date);
                (m.id, MemberWrite::Deliver { delivery_date, status })
            })
            .collect(),
        batch: BatchWrite::Status { status: BatchStatus::Completed, actual_date: Some(delivery_date) },
    })
}

// ============================================================================
// Transitions
// ============================================================================

async fn apply_transition(
    conn: &mut PgConnection,
    batch_id: i64,
    plan: &TransitionPlan,
    actor_id: Option<Uuid>,
) -> DispatchResult<()> {
    for (order_id, write) in &plan.members {
        match write {
            MemberWrite::Release => {
                queries::order::update_assignment(
                    &mut *conn,
                    *order_id,
                    None,
                    &OrderRates::zeroed(),
                    OrderStatus::Pending,
                    actor_id,
                )
                .await?
            }
            MemberWrite::Reprice(rates) => queries::order::update_rates(&mut *conn, *order_id, rates, actor_id).await?,
            MemberWrite::Dispatch => {
                queries::order::update_status(&mut *conn, *order_id, OrderStatus::InTransit, actor_id).await?
            }
            MemberWrite::Deliver { delivery_date, status } => {
                queries::order::mark_delivered(&mut *conn, *order_id, *delivery_date, *status, actor_id).await?
            }
        }
    }

    match &plan.batch {
        BatchWrite::Delete => {
            queries::batch::delete_batch(&mut *conn, batch_id).await?;
        }
        BatchWrite::Totals(totals) => queries::batch::update_totals(&mut *conn, batch_id, totals, actor_id).await?,
        BatchWrite::Status { status, actual_date } => {
            queries::batch::update_status(&mut *conn, batch_id, *status, *actual_date, actor_id).await?
        }
    }

    Ok(())
}

/// Batch and members as seen by `conn`, so a transition can answer before commit
async fn load_detail(conn: &mut PgConnection, batch_id: i64) -> DispatchResult<BatchDetail> {
    let batch = require_batch(batch_id, queries::batch::get_batch(&mut *conn, batch_id).await?)?;
    let orders = queries::order::list_batch_orders(&mut *conn, batch.id).await?;

    Ok(BatchDetail { batch, orders })
}

/// (unassigned) -> planned
pub async fn allocate(
    pool: &PgPool,
    request: &AllocateRequest,
    actor_id: Option<Uuid>,
) -> DispatchResult<BatchDetail> {
    check_id_list(&request.order_ids)?;

    let mut tx = pool.begin().await?;

    let rows = queries::order::lock_order_stops(&mut tx, &request.order_ids).await?;
    let plan = plan_allocation(&request.order_ids, rows, request.planned_date)?;

    if let Some(vehicle_id) = request.vehicle_id {
        let vehicle = queries::reference::get_vehicle(&mut tx, vehicle_id)
            .await?
            .ok_or_else(|| DispatchError::validation(format!("Unknown vehicle id {}", vehicle_id)))?;
        check_vehicle(&vehicle, request.vehicle_type, plan.members.totals.total_value)?;
    }

    let sequence_no = queries::batch::next_sequence_no(&mut tx, request.planned_date).await?;
    let new_batch = NewBatch {
        batch_number: batch_number(request.planned_date, sequence_no),
        sequence_no,
        planned_date: request.planned_date,
        zone_id: plan.zone_id,
        vehicle_id: request.vehicle_id,
        vehicle_type: request.vehicle_type,
        totals: plan.members.totals,
    };
    let batch = queries::batch::insert_batch(&mut tx, &new_batch, actor_id).await?;

    for (order_id, rates) in &plan.members.rates {
        queries::order::update_assignment(
            &mut tx,
            *order_id,
            Some(batch.id),
            rates,
            OrderStatus::Confirmed,
            actor_id,
        )
        .await?;
    }

    let orders = queries::order::list_batch_orders(&mut tx, batch.id).await?;
    tx.commit().await?;

    info!(
        "Allocated batch {} ({} orders, rate {}, vehicle {})",
        batch.batch_number,
        batch.order_count,
        batch.total_rate,
        batch.vehicle_type.as_str()
    );
    Ok(BatchDetail { batch, orders })
}

/// planned -> (member released); deletes the batch with its last member
pub async fn remove_from_batch(
    pool: &PgPool,
    order_id: i64,
    actor_id: Option<Uuid>,
) -> DispatchResult<RemovalOutcome> {
    let mut tx = pool.begin().await?;

    // Batch row first, then members, matching the lock order of the other transitions
    let batch_id = queries::order::find_batch_id(&mut tx, order_id)
        .await?
        .ok_or_else(|| DispatchError::NotFound(format!("Order {}", order_id)))?
        .ok_or_else(|| DispatchError::invalid_state(format!("Order {} is not in a batch", order_id)))?;

    let batch = require_batch(batch_id, queries::batch::lock_batch(&mut tx, batch_id).await?)?;
    require_status(&batch, BatchStatus::Planned, "remove orders from")?;

    let members = queries::order::lock_batch_member_stops(&mut tx, batch.id).await?;
    let plan = plan_removal(&batch, order_id, members)?;
    apply_transition(&mut tx, batch.id, &plan, actor_id).await?;

    tx.commit().await?;

    let outcome = match plan.batch {
        BatchWrite::Totals(totals) => {
            info!(
                "Removed order {} from batch {}; {} orders remain, rate {} -> {}",
                order_id, batch.batch_number, totals.order_count, batch.total_rate, totals.total_rate
            );
            RemovalOutcome::Recomputed { batch_id: batch.id, totals }
        }
        _ => {
            info!("Removed order {} from batch {}; batch was emptied and deleted", order_id, batch.batch_number);
            RemovalOutcome::BatchDeleted { batch_id: batch.id }
        }
    };
    Ok(outcome)
}

/// planned -> deleted; every member returns to the unassigned pool
pub async fn delete_batch(
    pool: &PgPool,
    batch_id: i64,
    actor_id: Option<Uuid>,
) -> DispatchResult<DeleteBatchResponse> {
    let mut tx = pool.begin().await?;

    let batch = require_batch(batch_id, queries::batch::lock_batch(&mut tx, batch_id).await?)?;
    require_status(&batch, BatchStatus::Planned, "delete")?;

    let members = queries::order::lock_batch_members(&mut tx, batch.id).await?;
    let plan = plan_delete(&batch, &members)?;
    apply_transition(&mut tx, batch.id, &plan, actor_id).await?;

    tx.commit().await?;

    info!("Deleted batch {}, released {} orders", batch.batch_number, plan.members.len());
    Ok(DeleteBatchResponse {
        batch_id: batch.id,
        released_orders: plan.members.len() as i64,
    })
}

/// planned -> in_transit
pub async fn start_delivery(
    pool: &PgPool,
    batch_id: i64,
    actor_id: Option<Uuid>,
) -> DispatchResult<BatchDetail> {
    let mut tx = pool.begin().await?;

    let batch = require_batch(batch_id, queries::batch::lock_batch(&mut tx, batch_id).await?)?;
    require_status(&batch, BatchStatus::Planned, "start")?;

    let members = queries::order::lock_batch_members(&mut tx, batch.id).await?;
    let plan = plan_start(&batch, &members)?;
    apply_transition(&mut tx, batch.id, &plan, actor_id).await?;

    let detail = load_detail(&mut tx, batch.id).await?;
    tx.commit().await?;

    info!("Batch {} in transit with {} orders", batch.batch_number, plan.members.len());
    Ok(detail)
}

/// in_transit -> completed
pub async fn complete_batch(
    pool: &PgPool,
    batch_id: i64,
    delivery_date: NaiveDate,
    actor_id: Option<Uuid>,
) -> DispatchResult<BatchDetail> {
    let mut tx = pool.begin().await?;

    let batch = require_batch(batch_id, queries::batch::lock_batch(&mut tx, batch_id).await?)?;
    require_status(&batch, BatchStatus::InTransit, "complete")?;

    let members = queries::order::lock_batch_members(&mut tx, batch.id).await?;
    let plan = plan_completion(&batch, &members, delivery_date)?;
    apply_transition(&mut tx, batch.id, &plan, actor_id).await?;

    let detail = load_detail(&mut tx, batch.id).await?;
    tx.commit().await?;

    let delayed = detail.orders.iter().filter(|o| o.status == OrderStatus::Delayed).count();
    info!(
        "Completed batch {} on {}: {} orders, {} delayed",
        batch.batch_number,
        delivery_date,
        detail.orders.len(),
        delayed
    );
    Ok(detail)
}

/// Complete one order outside any batch
pub async fn confirm_delivery(
    pool: &PgPool,
    request: &ConfirmDeliveryRequest,
    actor_id: Option<Uuid>,
) -> DispatchResult<DeliveryConfirmation> {
    if request.base_rate < Decimal::ZERO || request.drop_cost < Decimal::ZERO {
        return Err(DispatchError::validation("Rates must not be negative"));
    }

    let mut tx = pool.begin().await?;

    let order = queries::order::lock_orders(&mut tx, &[request.order_id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DispatchError::NotFound(format!("Order {}", request.order_id)))?;
    check_directly_confirmable(order.id, order.batch_id, order.status)?;

    if !request.drop_cost.is_zero() {
        debug!("Order {}: drop cost {} not charged on a single delivery", order.id, request.drop_cost);
    }
    let rates = single_delivery_rates(request.base_rate);
    let status = OrderStatus::for_delivery(request.delivery_date, order.scheduled_date);

    queries::order::update_rates(&mut tx, order.id, &rates, actor_id).await?;
    queries::order::mark_delivered(&mut tx, order.id, request.delivery_date, status, actor_id).await?;

    tx.commit().await?;

    info!("Confirmed delivery of order {} ({}) as {}", order.id, order.po_number, status.as_str());
    Ok(DeliveryConfirmation {
        delivery_date: request.delivery_date,
        total_rate: rates.total_rate,
        orders: vec![DeliveredOrder {
            order_id: order.id,
            status,
            rates,
        }],
    })
}

/// Complete a caller-ordered list of orders outside any batch
pub async fn confirm_bulk_delivery(
    pool: &PgPool,
    request: &ConfirmBulkDeliveryRequest,
    actor_id: Option<Uuid>,
) -> DispatchResult<DeliveryConfirmation> {
    check_id_list(&request.order_ids)?;

    let mut tx = pool.begin().await?;

    let rows = queries::order::lock_order_stops(&mut tx, &request.order_ids).await?;
    let delivered = plan_bulk_delivery(&request.order_ids, rows, request.delivery_date)?;

    for order in &delivered {
        queries::order::update_rates(&mut tx, order.order_id, &order.rates, actor_id).await?;
        queries::order::mark_delivered(&mut tx, order.order_id, request.delivery_date, order.status, actor_id).await?;
    }

    tx.commit().await?;

    let total_rate: Decimal = delivered.iter().map(|o| o.rates.total_rate).sum();
    info!(
        "Confirmed bulk delivery of {} orders on {}, rate {}",
        delivered.len(),
        request.delivery_date,
        total_rate
    );
    Ok(DeliveryConfirmation {
        delivery_date: request.delivery_date,
        orders: delivered,
        total_rate,
    })
}

// ============================================================================
// Lookups
// ============================================================================

pub async fn get_batch(pool: &PgPool, batch_id: i64) -> DispatchResult<BatchDetail> {
    let mut conn = pool.acquire().await?;
    let detail = load_detail(&mut conn, batch_id).await?;
    debug!("Loaded batch {} with {} orders", detail.batch.batch_number, detail.orders.len());

    Ok(detail)
}

/// Batches planned for one date, by batch number
pub async fn list_batches(pool: &PgPool, date: NaiveDate) -> DispatchResult<BatchListResponse> {
    let items = queries::batch::list_batches_for_date(pool, date).await?;
    let total = items.len() as i64;

    Ok(BatchListResponse { items, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::batch::fixtures::batch;
    use crate::types::order::fixtures::order;
    use crate::types::stop::fixtures::order_stop;
    use crate::types::AdditionalRateType;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    /// Orders 5, 2, 7: clients 1, 2, 1 in areas 10, 10, 20
    fn reference_rows() -> Vec<OrderStop> {
        vec![
            order_stop(2, 2, 10, 3.0),
            order_stop(5, 1, 10, 5.0),
            order_stop(7, 1, 20, 8.0),
        ]
    }

    fn rates_of(plan: &PricedMembers, order_id: i64) -> OrderRates {
        plan.rates
            .iter()
            .find(|(id, _)| *id == order_id)
            .map(|(_, rates)| *rates)
            .unwrap()
    }

    #[test]
    fn test_batch_number_format() {
        assert_eq!(batch_number(day(19), 1), "B-20261019-001");
        assert_eq!(batch_number(day(19), 42), "B-20261019-042");
    }

    #[test]
    fn test_allocation_prices_submitted_order() {
        let plan = plan_allocation(&[5, 2, 7], reference_rows(), day(19)).unwrap();

        let ids: Vec<i64> = plan.members.rates.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![5, 2, 7]);
        assert_eq!(plan.members.totals.order_count, 3);
        assert_eq!(plan.members.totals.total_rate, dec!(1250));
        assert_eq!(plan.zone_id, 1);
    }

    #[test]
    fn test_allocation_differs_from_id_order() {
        let submitted = plan_allocation(&[5, 7, 2], reference_rows(), day(19)).unwrap();
        let by_id = plan_allocation(&[2, 5, 7], reference_rows(), day(19)).unwrap();

        // 5,7,2: 1000 + 0 (repeat, now in area 20) + 500; 2,5,7: 1000 + 250 + 0
        assert_eq!(submitted.members.totals.total_rate, dec!(1500));
        assert_eq!(by_id.members.totals.total_rate, dec!(1250));
    }

    #[test]
    fn test_allocation_rates_per_member() {
        let plan = plan_allocation(&[5, 2, 7], reference_rows(), day(19)).unwrap();

        let first = rates_of(&plan.members, 5);
        assert_eq!(first.base_rate, dec!(1000));
        assert_eq!(first.total_rate, dec!(1000));

        let second = rates_of(&plan.members, 2);
        assert_eq!(second.base_rate, Decimal::ZERO);
        assert_eq!(second.additional_rate_type, AdditionalRateType::DropSameZone);
        assert_eq!(second.additional_rate, dec!(250));

        // Repeat client recorded as no additional charge
        assert_eq!(rates_of(&plan.members, 7), OrderRates::zeroed());
    }

    #[test]
    fn test_allocation_totals() {
        let plan = plan_allocation(&[5, 2, 7], reference_rows(), day(19)).unwrap();
        let totals = plan.members.totals;

        assert_eq!(totals.total_items, 12);
        assert_eq!(totals.total_value, dec!(30000));
        assert_eq!(totals.total_distance_km, 16.0);
        let member_sum: Decimal = plan.members.rates.iter().map(|(_, r)| r.total_rate).sum();
        assert_eq!(totals.total_rate, member_sum);
    }

    #[test]
    fn test_allocation_rejects_empty_and_duplicates() {
        let empty = plan_allocation(&[], vec![], day(19)).unwrap_err();
        assert_eq!(empty.code(), "INVALID_REQUEST");

        let duplicate = plan_allocation(&[5, 2, 5], reference_rows(), day(19)).unwrap_err();
        assert!(duplicate.to_string().contains("Order 5"));
    }

    #[test]
    fn test_allocation_rejects_unknown_order() {
        let err = plan_allocation(&[5, 99], reference_rows(), day(19)).unwrap_err();

        assert_eq!(err.code(), "INVALID_REQUEST");
        assert!(err.to_string().contains("99"));
    }

    #[test]
    fn test_allocation_rejects_assigned_order() {
        let mut rows = reference_rows();
        rows[0].batch_id = Some(3);

        let err = plan_allocation(&[5, 2, 7], rows, day(19)).unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");

        let mut rows = reference_rows();
        rows[1].status = OrderStatus::OnTime;
        assert!(plan_allocation(&[5, 2, 7], rows, day(19)).is_err());
    }

    #[test]
    fn test_allocation_requires_first_order_zone() {
        let mut rows = reference_rows();
        rows[1].zone_id = None; // order 5

        let err = plan_allocation(&[5, 2, 7], rows.clone(), day(19)).unwrap_err();
        assert!(matches!(err, DispatchError::ZoneUnresolved { order_id: 5 }));

        // Only the first order's chain decides the batch zone
        let plan = plan_allocation(&[2, 5, 7], rows, day(19)).unwrap();
        assert_eq!(plan.zone_id, 1);
    }

    #[test]
    fn test_recompute_uses_distance_order() {
        // Remaining after removing order 2: 7 (8 km) and 5 (5 km)
        let remaining = vec![order_stop(7, 1, 20, 8.0), order_stop(5, 3, 10, 5.0)];

        let recomputed = plan_recompute(remaining, day(19)).unwrap();

        let ids: Vec<i64> = recomputed.rates.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![5, 7]);
        assert_eq!(recomputed.totals.order_count, 2);
        assert_eq!(recomputed.totals.total_rate, dec!(1500));
        assert_eq!(recomputed.totals.total_distance_km, 16.0);
    }

    #[test]
    fn test_recompute_of_empty_batch_deletes() {
        assert!(plan_recompute(vec![], day(19)).is_none());
    }

    #[test]
    fn test_single_delivery_charges_base_rate() {
        let rates = single_delivery_rates(dec!(1200));

        assert_eq!(rates.base_rate, dec!(1200));
        assert_eq!(rates.additional_rate, Decimal::ZERO);
        assert_eq!(rates.total_rate, dec!(1200));
        assert_eq!(rates.additional_rate_type, AdditionalRateType::None);
    }

    fn vehicle(vehicle_type: VehicleType, max_value: Decimal) -> Vehicle {
        Vehicle {
            id: 3,
            vehicle_type,
            plate_number: "ABC-123".to_string(),
            max_value,
        }
    }

    #[test]
    fn test_vehicle_type_must_match_request() {
        let truck = vehicle(VehicleType::Truck, dec!(500000));

        let err = check_vehicle(&truck, VehicleType::L300, dec!(30000)).unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");
        assert!(err.to_string().contains("ABC-123 is a truck, not l300"));

        assert!(check_vehicle(&truck, VehicleType::Truck, dec!(30000)).is_ok());
    }

    #[test]
    fn test_vehicle_over_max_value_is_allowed() {
        let l300 = vehicle(VehicleType::L300, dec!(20000));
        assert!(check_vehicle(&l300, VehicleType::L300, dec!(30000)).is_ok());
    }

    #[test]
    fn test_bulk_delivery_charges_repeat_clients() {
        let delivered = plan_bulk_delivery(&[5, 2, 7], reference_rows(), day(19)).unwrap();

        let costs: Vec<Decimal> = delivered.iter().map(|d| d.rates.total_rate).collect();
        assert_eq!(costs, vec![dec!(1000), dec!(250), dec!(500)]);
        assert_eq!(delivered[2].rates.additional_rate_type, AdditionalRateType::DropOtherZone);
    }

    #[test]
    fn test_bulk_delivery_statuses() {
        let mut rows = reference_rows();
        rows[0].scheduled_date = day(15); // order 2 is late

        let delivered = plan_bulk_delivery(&[5, 2], rows, day(19)).unwrap();

        assert_eq!(delivered[0].status, OrderStatus::OnTime);
        assert_eq!(delivered[1].status, OrderStatus::Delayed);
    }

    #[test]
    fn test_bulk_delivery_rejects_batched_orders() {
        let mut rows = reference_rows();
        rows[2].batch_id = Some(8);

        let err = plan_bulk_delivery(&[5, 2, 7], rows, day(19)).unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
        assert!(err.to_string().contains("batch 8"));
    }

    #[test]
    fn test_require_status() {
        assert!(require_status(&batch(1, BatchStatus::Planned), BatchStatus::Planned, "start").is_ok());

        let err = require_status(&batch(1, BatchStatus::InTransit), BatchStatus::Planned, "delete").unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
        assert!(err.to_string().contains("in_transit"));
    }

    #[test]
    fn test_missing_batch_is_not_found() {
        let err = require_batch(4, None).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(err.to_string(), "Batch 4 not found");

        assert_eq!(require_batch(4, Some(batch(4, BatchStatus::Planned))).unwrap().id, 4);
    }

    #[test]
    fn test_removal_of_sole_member_deletes_batch() {
        let planned = batch(4, BatchStatus::Planned);

        let plan = plan_removal(&planned, 5, vec![order_stop(5, 1, 10, 5.0)]).unwrap();

        assert_eq!(plan.members, vec![(5, MemberWrite::Release)]);
        assert_eq!(plan.batch, BatchWrite::Delete);

        // Once the plan is applied the batch row is gone
        assert_eq!(require_batch(planned.id, None).unwrap_err().code(), "NOT_FOUND");
    }

    #[test]
    fn test_removal_reprices_remaining_members() {
        let plan = plan_removal(&batch(4, BatchStatus::Planned), 2, reference_rows()).unwrap();

        // Remaining 5 (5 km) then 7 (8 km); 7 repeats client 1
        assert_eq!(
            plan.members,
            vec![
                (2, MemberWrite::Release),
                (
                    5,
                    MemberWrite::Reprice(OrderRates {
                        base_rate: dec!(1000),
                        additional_rate_type: AdditionalRateType::None,
                        additional_rate: Decimal::ZERO,
                        total_rate: dec!(1000),
                    })
                ),
                (7, MemberWrite::Reprice(OrderRates::zeroed())),
            ]
        );
        match plan.batch {
            BatchWrite::Totals(totals) => {
                assert_eq!(totals.order_count, 2);
                assert_eq!(totals.total_rate, dec!(1000));
                assert_eq!(totals.total_distance_km, 16.0);
            }
            other => panic!("expected totals, got {:?}", other),
        }
    }

    #[test]
    fn test_removal_requires_planned_batch() {
        let err = plan_removal(&batch(4, BatchStatus::InTransit), 5, reference_rows()).unwrap_err();

        assert_eq!(err.code(), "INVALID_STATE");
        assert!(err.to_string().contains("remove orders from batch 4: status is in_transit"));
    }

    #[test]
    fn test_removal_of_non_member() {
        let err = plan_removal(&batch(4, BatchStatus::Planned), 9, reference_rows()).unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
    }

    #[test]
    fn test_delete_releases_every_member() {
        let members = vec![order(5, 4, day(19)), order(7, 4, day(19))];

        let plan = plan_delete(&batch(4, BatchStatus::Planned), &members).unwrap();

        assert_eq!(plan.members, vec![(5, MemberWrite::Release), (7, MemberWrite::Release)]);
        assert_eq!(plan.batch, BatchWrite::Delete);

        let err = plan_delete(&batch(4, BatchStatus::Completed), &members).unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
    }

    #[test]
    fn test_start_moves_members_in_transit() {
        let members = vec![order(5, 4, day(19)), order(7, 4, day(19))];

        let plan = plan_start(&batch(4, BatchStatus::Planned), &members).unwrap();

        assert_eq!(plan.members, vec![(5, MemberWrite::Dispatch), (7, MemberWrite::Dispatch)]);
        assert_eq!(
            plan.batch,
            BatchWrite::Status { status: BatchStatus::InTransit, actual_date: None }
        );

        assert!(plan_start(&batch(4, BatchStatus::InTransit), &members).is_err());
    }

    #[test]
    fn test_completion_marks_each_member() {
        let members = vec![order(5, 4, day(19)), order(7, 4, day(17))];

        let plan = plan_completion(&batch(4, BatchStatus::InTransit), &members, day(19)).unwrap();

        assert_eq!(
            plan.members,
            vec![
                (5, MemberWrite::Deliver { delivery_date: day(19), status: OrderStatus::OnTime }),
                (7, MemberWrite::Deliver { delivery_date: day(19), status: OrderStatus::Delayed }),
            ]
        );
        assert_eq!(
            plan.batch,
            BatchWrite::Status { status: BatchStatus::Completed, actual_date: Some(day(19)) }
        );

        let err = plan_completion(&batch(4, BatchStatus::Planned), &members, day(19)).unwrap_err();
        assert!(err.to_string().contains("expected in_transit"));
    }
}
