//! Order types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{DropCharge, VehicleType};

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    InTransit,
    OnTime,
    Delayed,
    Cancelled,
}

impl OrderStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::OnTime => "on_time",
            OrderStatus::Delayed => "delayed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Completed on or before the scheduled date counts as on time
    pub fn for_delivery(delivery_date: NaiveDate, scheduled_date: NaiveDate) -> Self {
        if delivery_date <= scheduled_date {
            OrderStatus::OnTime
        } else {
            OrderStatus::Delayed
        }
    }

    /// Statuses an order may be directly confirmed as delivered from
    pub const fn is_confirmable(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }
}

/// Persisted drop-charge tag. Closed set: a repeat-client stop and the
/// first stop are both stored as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "additional_rate_type", rename_all = "snake_case")]
pub enum AdditionalRateType {
    None,
    DropSameZone,
    DropOtherZone,
}

impl From<DropCharge> for AdditionalRateType {
    fn from(charge: DropCharge) -> Self {
        match charge {
            DropCharge::FirstStop | DropCharge::RepeatClient => AdditionalRateType::None,
            DropCharge::SameZone => AdditionalRateType::DropSameZone,
            DropCharge::OtherZone => AdditionalRateType::DropOtherZone,
        }
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub po_number: String,
    pub po_date: NaiveDate,
    pub scheduled_date: NaiveDate,
    pub actual_date: Option<NaiveDate>,
    pub client_id: Option<i64>,
    pub batch_id: Option<i64>,
    pub is_pickup: bool,
    pub status: OrderStatus,
    pub base_rate: Decimal,
    pub additional_rate_type: AdditionalRateType,
    pub additional_rate: Decimal,
    pub total_rate: Decimal,
    pub total_amount: Decimal,
    pub total_items: i32,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rate columns written for one order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRates {
    pub base_rate: Decimal,
    pub additional_rate_type: AdditionalRateType,
    pub additional_rate: Decimal,
    pub total_rate: Decimal,
}

impl OrderRates {
    /// Rates of an order back in the unassigned pool
    pub const fn zeroed() -> Self {
        Self {
            base_rate: Decimal::ZERO,
            additional_rate_type: AdditionalRateType::None,
            additional_rate: Decimal::ZERO,
            total_rate: Decimal::ZERO,
        }
    }
}

// ============================================================================
// listUnallocated
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUnallocatedRequest {
    pub date: NaiveDate,
}

/// One unassigned order with its priced position in the po-date sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnallocatedOrder {
    pub order_id: i64,
    pub po_number: String,
    pub po_date: NaiveDate,
    pub scheduled_date: NaiveDate,
    pub client_id: Option<i64>,
    pub client_code: Option<String>,
    pub area_id: Option<i64>,
    pub zone_id: Option<i64>,
    pub distance_from_depot: f64,
    pub is_overdue: bool,
    pub total_amount: Decimal,
    pub total_items: i32,
    pub charge: DropCharge,
    pub drop_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnallocatedSummary {
    pub order_count: i64,
    pub total_items: i64,
    pub total_value: Decimal,
    pub total_rate: Decimal,
    pub recommended_vehicle: VehicleType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUnallocatedResponse {
    pub date: NaiveDate,
    pub items: Vec<UnallocatedOrder>,
    pub summary: UnallocatedSummary,
}

// ============================================================================
// Direct delivery confirmation
// ============================================================================

/// Complete one order outside any batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmDeliveryRequest {
    pub order_id: i64,
    pub delivery_date: NaiveDate,
    pub base_rate: Decimal,
    #[serde(default)]
    pub drop_cost: Decimal,
}

/// Complete a caller-ordered list of orders outside any batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmBulkDeliveryRequest {
    pub order_ids: Vec<i64>,
    pub delivery_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredOrder {
    pub order_id: i64,
    pub status: OrderStatus,
    pub rates: OrderRates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryConfirmation {
    pub delivery_date: NaiveDate,
    pub orders: Vec<DeliveredOrder>,
    pub total_rate: Decimal,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use rust_decimal_macros::dec;

    /// Confirmed member of `batch_id`, scheduled for `scheduled_date`
    pub fn order(id: i64, batch_id: i64, scheduled_date: NaiveDate) -> Order {
        Order {
            id,
            po_number: format!("PO-{id}"),
            po_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            scheduled_date,
            actual_date: None,
            client_id: Some(id),
            batch_id: Some(batch_id),
            is_pickup: false,
            status: OrderStatus::Confirmed,
            base_rate: Decimal::ZERO,
            additional_rate_type: AdditionalRateType::DropSameZone,
            additional_rate: dec!(250),
            total_rate: dec!(250),
            total_amount: dec!(10000),
            total_items: 4,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
