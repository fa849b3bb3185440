//! Delivery batch types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Order, VehicleType};

/// Batch status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "batch_status", rename_all = "snake_case")]
pub enum BatchStatus {
    Planned,
    InTransit,
    Completed,
    Cancelled,
}

impl BatchStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            BatchStatus::Planned => "planned",
            BatchStatus::InTransit => "in_transit",
            BatchStatus::Completed => "completed",
            BatchStatus::Cancelled => "cancelled",
        }
    }
}

/// Batch entity: orders committed to one vehicle and date
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: i64,
    pub batch_number: String,
    pub sequence_no: i32,
    pub planned_date: NaiveDate,
    pub actual_date: Option<NaiveDate>,
    pub zone_id: i64,
    pub vehicle_id: Option<i64>,
    pub vehicle_type: VehicleType,
    pub order_count: i32,
    pub total_items: i32,
    pub total_value: Decimal,
    pub total_rate: Decimal,
    pub total_distance_km: f64,
    pub status: BatchStatus,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate columns derived from a batch's members
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTotals {
    pub order_count: i32,
    pub total_items: i32,
    pub total_value: Decimal,
    pub total_rate: Decimal,
    pub total_distance_km: f64,
}

/// Request to allocate unassigned orders into a new batch.
///
/// `order_ids` order is the pricing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateRequest {
    pub order_ids: Vec<i64>,
    pub planned_date: NaiveDate,
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub vehicle_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchIdRequest {
    pub batch_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromBatchRequest {
    pub order_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteBatchRequest {
    pub batch_id: i64,
    pub delivery_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBatchesRequest {
    pub date: NaiveDate,
}

/// Batch with its member orders
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDetail {
    pub batch: Batch,
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchListResponse {
    pub items: Vec<Batch>,
    pub total: i64,
}

/// Outcome of releasing one member from a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "outcome")]
pub enum RemovalOutcome {
    /// Remaining members were re-priced
    Recomputed { batch_id: i64, totals: BatchTotals },
    /// The released order was the last member; the batch row is gone
    BatchDeleted { batch_id: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBatchResponse {
    pub batch_id: i64,
    pub released_orders: i64,
}
