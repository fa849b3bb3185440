//! Stops: one order as seen by pricing and sequencing

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::OrderStatus;

/// Transient pricing/routing view of one order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub client_id: Option<i64>,
    pub area_id: Option<i64>,
    /// Depot->zone rate of the stop's own zone, zero when unresolved
    pub zone_base_rate: Decimal,
    pub distance_from_depot: f64,
    pub is_overdue: bool,
}

/// Which pricing branch produced a stop's drop cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropCharge {
    /// Index 0: the stop's zone base rate
    FirstStop,
    /// Client already served earlier in the sequence: free
    RepeatClient,
    /// Same area as the previous stop
    SameZone,
    /// Different (or unknown) area than the previous stop
    OtherZone,
}

/// Order joined with its client -> area -> zone chain
#[derive(Debug, Clone, FromRow)]
pub struct OrderStop {
    pub order_id: i64,
    pub po_number: String,
    pub po_date: NaiveDate,
    pub scheduled_date: NaiveDate,
    pub client_id: Option<i64>,
    pub client_code: Option<String>,
    pub area_id: Option<i64>,
    pub zone_id: Option<i64>,
    pub zone_base_rate: Option<Decimal>,
    pub distance_from_depot: Option<f64>,
    pub total_amount: Decimal,
    pub total_items: i32,
    pub batch_id: Option<i64>,
    pub status: OrderStatus,
}

impl OrderStop {
    /// Overdue when scheduled strictly before the planning date
    pub fn is_overdue(&self, planning_date: NaiveDate) -> bool {
        self.scheduled_date < planning_date
    }

    pub fn distance(&self) -> f64 {
        self.distance_from_depot.unwrap_or(0.0)
    }

    pub fn to_stop(&self, planning_date: NaiveDate) -> Stop {
        Stop {
            client_id: self.client_id,
            area_id: self.area_id,
            zone_base_rate: self.zone_base_rate.unwrap_or(Decimal::ZERO),
            distance_from_depot: self.distance(),
            is_overdue: self.is_overdue(planning_date),
        }
    }
}
