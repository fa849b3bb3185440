use rust_decimal::Decimal;

/// Drop cost for a stop in the same area as the previous stop
pub const SAME_ZONE_DROP_RATE: Decimal = Decimal::from_parts(250, 0, 0, false, 0);

/// Drop cost for a stop in a different area than the previous stop
pub const OTHER_ZONE_DROP_RATE: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Highest batch value an L300 is recommended for
pub const L300_MAX_VALUE: Decimal = Decimal::from_parts(150_000, 0, 0, false, 0);

pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;
