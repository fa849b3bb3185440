//! Vehicle recommendation handler

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use rust_decimal::Decimal;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::services::vehicle_rule::recommend_vehicle;
use crate::types::{
    ErrorResponse, RecommendVehicleRequest, RecommendVehicleResponse, Request, SuccessResponse,
};

/// Handle vehicle.recommend messages
pub async fn handle_recommend(client: Client, mut subscriber: Subscriber) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received vehicle.recommend message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let request: Request<RecommendVehicleRequest> = match serde_json::from_slice(&msg.payload) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                let error = ErrorResponse::new(Uuid::nil(), "INVALID_REQUEST", e.to_string());
                let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
                continue;
            }
        };

        let total_value = request.payload.total_value;
        if total_value < Decimal::ZERO {
            let error = ErrorResponse::new(request.id, "INVALID_REQUEST", "Total value must not be negative");
            let _ = client.publish(reply, serde_json::to_vec(&error)?.into()).await;
            continue;
        }

        let response = SuccessResponse::new(
            request.id,
            RecommendVehicleResponse {
                vehicle_type: recommend_vehicle(total_value),
            },
        );
        let _ = client.publish(reply, serde_json::to_vec(&response)?.into()).await;
    }

    Ok(())
}
