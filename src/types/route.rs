//! Route preview types

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::DropCharge;

/// Request to sequence the pending orders of a date
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRouteRequest {
    pub date: NaiveDate,
}

/// A stop in the nearest-neighbor sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedStop {
    /// 1-based position in the route
    pub order: i32,
    pub order_id: i64,
    pub po_number: String,
    pub client_id: Option<i64>,
    pub client_code: Option<String>,
    pub area_id: Option<i64>,
    pub distance_from_depot: f64,
    pub distance_from_previous_km: f64,
    pub is_overdue: bool,
    pub charge: DropCharge,
    pub drop_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRouteResponse {
    pub date: NaiveDate,
    pub stops: Vec<PlannedStop>,
    pub total_route_km: f64,
    pub total_rate: Decimal,
}

/// Request for the zone-grouped cost preview
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRouteRequest {
    pub order_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedStop {
    pub order_id: i64,
    pub po_number: String,
    pub po_date: NaiveDate,
    pub zone_id: Option<i64>,
    pub area_id: Option<i64>,
    pub client_id: Option<i64>,
    pub charge: DropCharge,
    pub drop_cost: Decimal,
    pub cumulative_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRouteResponse {
    pub stops: Vec<CalculatedStop>,
    pub total_rate: Decimal,
}
