//! Reference data read by the dispatch core
//!
//! Clients, areas, zones and vehicles are maintained elsewhere. Clients,
//! areas and zones reach this worker only through the joined order stop.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Vehicle tier a batch is dispatched with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "vehicle_type", rename_all = "snake_case")]
pub enum VehicleType {
    L300,
    Truck,
}

impl VehicleType {
    pub const fn as_str(self) -> &'static str {
        match self {
            VehicleType::L300 => "l300",
            VehicleType::Truck => "truck",
        }
    }
}

/// Vehicle with the cargo value it is rated for
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub vehicle_type: VehicleType,
    pub plate_number: String,
    pub max_value: Decimal,
}

/// Request for the advisory vehicle tier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendVehicleRequest {
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendVehicleResponse {
    pub vehicle_type: VehicleType,
}
