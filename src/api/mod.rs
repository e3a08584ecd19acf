// src/api/mod.rs
//! HTTP control surface
//!
//! Thin actix-web layer over [`Coordinator`]; every route maps to one
//! coordinator operation.

mod control;
mod stats;

use crate::miner::Coordinator;
use crate::network::ComputeService;
use crate::store::SharedStore;
use actix_web::web::{self, ServiceConfig};

/// Registers all routes for a coordinator stored as `web::Data`
pub fn init_routes<C: ComputeService, S: SharedStore>(cfg: &mut ServiceConfig) {
    cfg.route("/", web::get().to(control::health::<C, S>))
        .route("/start", web::post().to(control::start::<C, S>))
        .route("/stop", web::post().to(control::stop::<C, S>))
        .route("/stats", web::get().to(stats::get_stats::<C, S>))
        .route("/recent", web::get().to(stats::get_recent::<C, S>))
        .route("/metrics", web::get().to(stats::get_metrics));
}

/// Shorthand for the shared coordinator handle
pub type CoordinatorData<C, S> = web::Data<Coordinator<C, S>>;
