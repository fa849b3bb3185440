//! Advisory vehicle tier for a batch value

use rust_decimal::Decimal;

use crate::defaults::L300_MAX_VALUE;
use crate::types::VehicleType;

/// Suggest a vehicle for the given total order value. Callers may override.
pub fn recommend_vehicle(total_value: Decimal) -> VehicleType {
    if total_value <= L300_MAX_VALUE {
        VehicleType::L300
    } else {
        VehicleType::Truck
    }
}
