//! Reference data lookups (read-only)

use sqlx::PgConnection;

use crate::types::Vehicle;

pub async fn get_vehicle(conn: &mut PgConnection, vehicle_id: i64) -> sqlx::Result<Option<Vehicle>> {
    sqlx::query_as::<_, Vehicle>(
        "SELECT id, type, plate_number, max_value FROM vehicles WHERE id = $1"
    )
    .bind(vehicle_id)
    .fetch_optional(&mut *conn)
    .await
}
