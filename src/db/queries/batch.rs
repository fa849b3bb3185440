//! Batch database queries

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::types::{Batch, BatchStatus, BatchTotals, VehicleType};

const BATCH_COLUMNS: &str = r#"
    id, batch_number, sequence_no, planned_date, actual_date, zone_id,
    vehicle_id, vehicle_type, order_count, total_items, total_value,
    total_rate, total_distance_km, status, created_by, updated_by,
    created_at, updated_at
"#;

/// Values for a new batch row
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub batch_number: String,
    pub sequence_no: i32,
    pub planned_date: NaiveDate,
    pub zone_id: i64,
    pub vehicle_id: Option<i64>,
    pub vehicle_type: VehicleType,
    pub totals: BatchTotals,
}

pub async fn get_batch(conn: &mut PgConnection, batch_id: i64) -> sqlx::Result<Option<Batch>> {
    let query = format!("SELECT {BATCH_COLUMNS} FROM batches WHERE id = $1");

    sqlx::query_as::<_, Batch>(&query)
        .bind(batch_id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn lock_batch(conn: &mut PgConnection, batch_id: i64) -> sqlx::Result<Option<Batch>> {
    let query = format!("SELECT {BATCH_COLUMNS} FROM batches WHERE id = $1 FOR UPDATE");

    sqlx::query_as::<_, Batch>(&query)
        .bind(batch_id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn list_batches_for_date(pool: &PgPool, date: NaiveDate) -> sqlx::Result<Vec<Batch>> {
    let query = format!(
        "SELECT {BATCH_COLUMNS} FROM batches WHERE planned_date = $1 ORDER BY sequence_no ASC"
    );

    sqlx::query_as::<_, Batch>(&query)
        .bind(date)
        .fetch_all(pool)
        .await
}

/// Next per-date batch sequence number.
///
/// Takes a transaction-scoped advisory lock on the date first, so concurrent
/// allocations for the same date serialize here until the caller commits.
pub async fn next_sequence_no(conn: &mut PgConnection, planned_date: NaiveDate) -> sqlx::Result<i32> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("batch_sequence:{planned_date}"))
        .execute(&mut *conn)
        .await?;

    let (max,): (Option<i32>,) =
        sqlx::query_as("SELECT MAX(sequence_no) FROM batches WHERE planned_date = $1")
            .bind(planned_date)
            .fetch_one(&mut *conn)
            .await?;

    Ok(max.unwrap_or(0) + 1)
}

pub async fn insert_batch(
    conn: &mut PgConnection,
    batch: &NewBatch,
    actor_id: Option<Uuid>,
) -> sqlx::Result<Batch> {
    let query = format!(
        r#"
        INSERT INTO batches (
            batch_number, sequence_no, planned_date, zone_id, vehicle_id, vehicle_type,
            order_count, total_items, total_value, total_rate, total_distance_km,
            status, created_by, updated_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'planned', $12, $12)
        RETURNING {BATCH_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Batch>(&query)
        .bind(&batch.batch_number)
        .bind(batch.sequence_no)
        .bind(batch.planned_date)
        .bind(batch.zone_id)
        .bind(batch.vehicle_id)
        .bind(batch.vehicle_type)
        .bind(batch.totals.order_count)
        .bind(batch.totals.total_items)
        .bind(batch.totals.total_value)
        .bind(batch.totals.total_rate)
        .bind(batch.totals.total_distance_km)
        .bind(actor_id)
        .fetch_one(&mut *conn)
        .await
}

pub async fn update_totals(
    conn: &mut PgConnection,
    batch_id: i64,
    totals: &BatchTotals,
    actor_id: Option<Uuid>,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE batches
        SET order_count = $1, total_items = $2, total_value = $3,
            total_rate = $4, total_distance_km = $5,
            updated_by = $6, updated_at = NOW()
        WHERE id = $7
        "#
    )
    .bind(totals.order_count)
    .bind(totals.total_items)
    .bind(totals.total_value)
    .bind(totals.total_rate)
    .bind(totals.total_distance_km)
    .bind(actor_id)
    .bind(batch_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn update_status(
    conn: &mut PgConnection,
    batch_id: i64,
    status: BatchStatus,
    actual_date: Option<NaiveDate>,
    actor_id: Option<Uuid>,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE batches
        SET status = $1, actual_date = COALESCE($2, actual_date),
            updated_by = $3, updated_at = NOW()
        WHERE id = $4
        "#
    )
    .bind(status)
    .bind(actual_date)
    .bind(actor_id)
    .bind(batch_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn delete_batch(conn: &mut PgConnection, batch_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM batches WHERE id = $1")
        .bind(batch_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}
