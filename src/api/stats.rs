// src/api/stats.rs
use actix_web::{HttpResponse, Responder};
use serde_json::json;

use super::CoordinatorData;
use crate::network::ComputeService;
use crate::stats::metrics;
use crate::store::SharedStore;

/// Never fails: store outages come back as `degraded: true`
pub async fn get_stats<C: ComputeService, S: SharedStore>(
    coordinator: CoordinatorData<C, S>,
) -> impl Responder {
    HttpResponse::Ok().json(coordinator.stats().await)
}

pub async fn get_recent<C: ComputeService, S: SharedStore>(
    coordinator: CoordinatorData<C, S>,
) -> impl Responder {
    match coordinator.recent_results().await {
        Ok(results) => HttpResponse::Ok().json(results),
        Err(e) => {
            log::warn!("Recent results unavailable: {}", e);
            HttpResponse::ServiceUnavailable().json(json!({ "error": e.to_string() }))
        }
    }
}

pub async fn get_metrics() -> impl Responder {
    match metrics::render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}
