//! Order database queries

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::types::{Order, OrderRates, OrderStatus, OrderStop};

const ORDER_COLUMNS: &str = r#"
    o.id, o.po_number, o.po_date, o.scheduled_date, o.actual_date,
    o.client_id, o.batch_id, o.is_pickup, o.status,
    o.base_rate, o.additional_rate_type, o.additional_rate, o.total_rate,
    o.total_amount, o.total_items, o.updated_by, o.created_at, o.updated_at
"#;

/// Order plus its client -> area -> zone chain. Outer joins keep orders
/// whose chain is incomplete.
const ORDER_STOP_SELECT: &str = r#"
    SELECT
        o.id AS order_id, o.po_number, o.po_date, o.scheduled_date,
        o.client_id, c.code AS client_code, c.area_id, a.zone_id,
        z.base_rate AS zone_base_rate, c.distance_from_depot,
        o.total_amount, o.total_items, o.batch_id, o.status
    FROM orders o
    LEFT JOIN clients c ON c.id = o.client_id
    LEFT JOIN areas a ON a.id = c.area_id
    LEFT JOIN zones z ON z.id = a.zone_id
"#;

/// Unassigned pending delivery orders due on or before `date`, by po date
pub async fn list_unallocated_stops(pool: &PgPool, date: NaiveDate) -> sqlx::Result<Vec<OrderStop>> {
    let query = format!(
        r#"{ORDER_STOP_SELECT}
        WHERE o.batch_id IS NULL
          AND o.status = 'pending'
          AND o.is_pickup = false
          AND o.scheduled_date <= $1
        ORDER BY o.po_date ASC, o.id ASC"#
    );

    sqlx::query_as::<_, OrderStop>(&query)
        .bind(date)
        .fetch_all(pool)
        .await
}

/// Order stops by id, in no particular order
pub async fn get_order_stops(pool: &PgPool, order_ids: &[i64]) -> sqlx::Result<Vec<OrderStop>> {
    let query = format!("{ORDER_STOP_SELECT} WHERE o.id = ANY($1)");

    sqlx::query_as::<_, OrderStop>(&query)
        .bind(order_ids)
        .fetch_all(pool)
        .await
}

/// Lock the order rows and return their stops
pub async fn lock_order_stops(conn: &mut PgConnection, order_ids: &[i64]) -> sqlx::Result<Vec<OrderStop>> {
    let query = format!("{ORDER_STOP_SELECT} WHERE o.id = ANY($1) ORDER BY o.id FOR UPDATE OF o");

    sqlx::query_as::<_, OrderStop>(&query)
        .bind(order_ids)
        .fetch_all(&mut *conn)
        .await
}

/// Lock every member of a batch and return their stops
pub async fn lock_batch_member_stops(conn: &mut PgConnection, batch_id: i64) -> sqlx::Result<Vec<OrderStop>> {
    let query = format!("{ORDER_STOP_SELECT} WHERE o.batch_id = $1 ORDER BY o.id FOR UPDATE OF o");

    sqlx::query_as::<_, OrderStop>(&query)
        .bind(batch_id)
        .fetch_all(&mut *conn)
        .await
}

/// Lock the order rows and return the full entities
pub async fn lock_orders(conn: &mut PgConnection, order_ids: &[i64]) -> sqlx::Result<Vec<Order>> {
    let query = format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = ANY($1) ORDER BY o.id FOR UPDATE");

    sqlx::query_as::<_, Order>(&query)
        .bind(order_ids)
        .fetch_all(&mut *conn)
        .await
}

pub async fn lock_batch_members(conn: &mut PgConnection, batch_id: i64) -> sqlx::Result<Vec<Order>> {
    let query = format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE o.batch_id = $1 ORDER BY o.id FOR UPDATE");

    sqlx::query_as::<_, Order>(&query)
        .bind(batch_id)
        .fetch_all(&mut *conn)
        .await
}

/// Current batch of an order without locking it; `None` when the order does not exist
pub async fn find_batch_id(conn: &mut PgConnection, order_id: i64) -> sqlx::Result<Option<Option<i64>>> {
    let row: Option<(Option<i64>,)> = sqlx::query_as("SELECT batch_id FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(|(batch_id,)| batch_id))
}

pub async fn list_batch_orders(conn: &mut PgConnection, batch_id: i64) -> sqlx::Result<Vec<Order>> {
    let query = format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE o.batch_id = $1 ORDER BY o.id");

    sqlx::query_as::<_, Order>(&query)
        .bind(batch_id)
        .fetch_all(&mut *conn)
        .await
}

/// Write batch membership, rate columns and status of one order
pub async fn update_assignment(
    conn: &mut PgConnection,
    order_id: i64,
    batch_id: Option<i64>,
    rates: &OrderRates,
    status: OrderStatus,
    actor_id: Option<Uuid>,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE orders
        SET batch_id = $1, base_rate = $2, additional_rate_type = $3,
            additional_rate = $4, total_rate = $5, status = $6,
            updated_by = $7, updated_at = NOW()
        WHERE id = $8
        "#
    )
    .bind(batch_id)
    .bind(rates.base_rate)
    .bind(rates.additional_rate_type)
    .bind(rates.additional_rate)
    .bind(rates.total_rate)
    .bind(status)
    .bind(actor_id)
    .bind(order_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Rewrite rate columns only, leaving membership and status alone
pub async fn update_rates(
    conn: &mut PgConnection,
    order_id: i64,
    rates: &OrderRates,
    actor_id: Option<Uuid>,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE orders
        SET base_rate = $1, additional_rate_type = $2, additional_rate = $3,
            total_rate = $4, updated_by = $5, updated_at = NOW()
        WHERE id = $6
        "#
    )
    .bind(rates.base_rate)
    .bind(rates.additional_rate_type)
    .bind(rates.additional_rate)
    .bind(rates.total_rate)
    .bind(actor_id)
    .bind(order_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Set the status of one order without touching membership or rates
pub async fn update_status(
    conn: &mut PgConnection,
    order_id: i64,
    status: OrderStatus,
    actor_id: Option<Uuid>,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE orders SET status = $1, updated_by = $2, updated_at = NOW() WHERE id = $3")
        .bind(status)
        .bind(actor_id)
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Record the delivery date and final status of one order
pub async fn mark_delivered(
    conn: &mut PgConnection,
    order_id: i64,
    delivery_date: NaiveDate,
    status: OrderStatus,
    actor_id: Option<Uuid>,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE orders
        SET actual_date = $1, status = $2, updated_by = $3, updated_at = NOW()
        WHERE id = $4
        "#
    )
    .bind(delivery_date)
    .bind(status)
    .bind(actor_id)
    .bind(order_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
