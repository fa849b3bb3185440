//! NATS message handlers

pub mod batch;
pub mod delivery;
pub mod ping;
pub mod preview;
pub mod vehicle;

use anyhow::Result;
use async_nats::Client;
use sqlx::PgPool;
use tokio::select;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::types::ErrorResponse;

/// Log a failed operation and build its reply. Storage failures are errors;
/// everything else is a rejected request.
pub(crate) fn error_reply(request_id: Uuid, operation: &str, e: &DispatchError) -> ErrorResponse {
    match e {
        DispatchError::Database(_) => error!("Failed to {}: {}", operation, e),
        _ => warn!("Rejected {}: {}", operation, e),
    }
    ErrorResponse::new(request_id, e.code(), e.to_string())
}

/// Start all message handlers
pub async fn start_handlers(client: Client, pool: PgPool) -> Result<()> {
    info!("Starting message handlers...");

    // Subscribe to all subjects
    let ping_sub = client.subscribe("dispatch.ping").await?;
    let unallocated_sub = client.subscribe("dispatch.order.unallocated").await?;
    let route_plan_sub = client.subscribe("dispatch.route.plan").await?;
    let route_calculate_sub = client.subscribe("dispatch.route.calculate").await?;
    let vehicle_recommend_sub = client.subscribe("dispatch.vehicle.recommend").await?;

    // Batch subjects
    let batch_allocate_sub = client.subscribe("dispatch.batch.allocate").await?;
    let batch_remove_member_sub = client.subscribe("dispatch.batch.remove_member").await?;
    let batch_delete_sub = client.subscribe("dispatch.batch.delete").await?;
    let batch_start_sub = client.subscribe("dispatch.batch.start").await?;
    let batch_complete_sub = client.subscribe("dispatch.batch.complete").await?;
    let batch_get_sub = client.subscribe("dispatch.batch.get").await?;
    let batch_list_sub = client.subscribe("dispatch.batch.list").await?;

    // Delivery subjects
    let delivery_confirm_sub = client.subscribe("dispatch.delivery.confirm").await?;
    let delivery_confirm_bulk_sub = client.subscribe("dispatch.delivery.confirm_bulk").await?;

    info!("Subscribed to NATS subjects");

    let client_ping = client.clone();
    let pool_ping = pool.clone();
    let ping_handle = tokio::spawn(async move {
        ping::handle_ping(client_ping, ping_sub, pool_ping).await
    });

    let client_unallocated = client.clone();
    let pool_unallocated = pool.clone();
    let unallocated_handle = tokio::spawn(async move {
        preview::handle_unallocated(client_unallocated, unallocated_sub, pool_unallocated).await
    });

    let client_route_plan = client.clone();
    let pool_route_plan = pool.clone();
    let route_plan_handle = tokio::spawn(async move {
        preview::handle_plan(client_route_plan, route_plan_sub, pool_route_plan).await
    });

    let client_route_calculate = client.clone();
    let pool_route_calculate = pool.clone();
    let route_calculate_handle = tokio::spawn(async move {
        preview::handle_calculate(client_route_calculate, route_calculate_sub, pool_route_calculate).await
    });

    let client_vehicle_recommend = client.clone();
    let vehicle_recommend_handle = tokio::spawn(async move {
        vehicle::handle_recommend(client_vehicle_recommend, vehicle_recommend_sub).await
    });

    let client_batch_allocate = client.clone();
    let pool_batch_allocate = pool.clone();
    let batch_allocate_handle = tokio::spawn(async move {
        batch::handle_allocate(client_batch_allocate, batch_allocate_sub, pool_batch_allocate).await
    });

    let client_batch_remove_member = client.clone();
    let pool_batch_remove_member = pool.clone();
    let batch_remove_member_handle = tokio::spawn(async move {
        batch::handle_remove_member(client_batch_remove_member, batch_remove_member_sub, pool_batch_remove_member).await
    });

    let client_batch_delete = client.clone();
    let pool_batch_delete = pool.clone();
    let batch_delete_handle = tokio::spawn(async move {
        batch::handle_delete(client_batch_delete, batch_delete_sub, pool_batch_delete).await
    });

    let client_batch_start = client.clone();
    let pool_batch_start = pool.clone();
    let batch_start_handle = tokio::spawn(async move {
        batch::handle_start(client_batch_start, batch_start_sub, pool_batch_start).await
    });

    let client_batch_complete = client.clone();
    let pool_batch_complete = pool.clone();
    let batch_complete_handle = tokio::spawn(async move {
        batch::handle_complete(client_batch_complete, batch_complete_sub, pool_batch_complete).await
    });

    let client_batch_get = client.clone();
    let pool_batch_get = pool.clone();
    let batch_get_handle = tokio::spawn(async move {
        batch::handle_get(client_batch_get, batch_get_sub, pool_batch_get).await
    });

    let client_batch_list = client.clone();
    let pool_batch_list = pool.clone();
    let batch_list_handle = tokio::spawn(async move {
        batch::handle_list(client_batch_list, batch_list_sub, pool_batch_list).await
    });

    let client_delivery_confirm = client.clone();
    let pool_delivery_confirm = pool.clone();
    let delivery_confirm_handle = tokio::spawn(async move {
        delivery::handle_confirm(client_delivery_confirm, delivery_confirm_sub, pool_delivery_confirm).await
    });

    let client_delivery_confirm_bulk = client.clone();
    let pool_delivery_confirm_bulk = pool.clone();
    let delivery_confirm_bulk_handle = tokio::spawn(async move {
        delivery::handle_confirm_bulk(client_delivery_confirm_bulk, delivery_confirm_bulk_sub, pool_delivery_confirm_bulk).await
    });

    info!("All handlers started, waiting for messages...");

    // Wait for any handler to finish (which shouldn't happen normally)
    select! {
        result = ping_handle => {
            error!("Ping handler finished: {:?}", result);
        }
        result = unallocated_handle => {
            error!("Unallocated orders handler finished: {:?}", result);
        }
        result = route_plan_handle => {
            error!("Route plan handler finished: {:?}", result);
        }
        result = route_calculate_handle => {
            error!("Route calculate handler finished: {:?}", result);
        }
        result = vehicle_recommend_handle => {
            error!("Vehicle recommend handler finished: {:?}", result);
        }
        // Batch handlers
        result = batch_allocate_handle => {
            error!("Batch allocate handler finished: {:?}", result);
        }
        result = batch_remove_member_handle => {
            error!("Batch remove member handler finished: {:?}", result);
        }
        result = batch_delete_handle => {
            error!("Batch delete handler finished: {:?}", result);
        }
        result = batch_start_handle => {
            error!("Batch start handler finished: {:?}", result);
        }
        result = batch_complete_handle => {
            error!("Batch complete handler finished: {:?}", result);
        }
        result = batch_get_handle => {
            error!("Batch get handler finished: {:?}", result);
        }
        result = batch_list_handle => {
            error!("Batch list handler finished: {:?}", result);
        }
        // Delivery handlers
        result = delivery_confirm_handle => {
            error!("Delivery confirm handler finished: {:?}", result);
        }
        result = delivery_confirm_bulk_handle => {
            error!("Delivery confirm bulk handler finished: {:?}", result);
        }
    }

    Ok(())
}
