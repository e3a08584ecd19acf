// src/api/control.rs
use actix_web::{HttpResponse, Responder};

use super::CoordinatorData;
use crate::network::ComputeService;
use crate::store::SharedStore;
use crate::types::ControlReply;

pub async fn health<C: ComputeService, S: SharedStore>(
    coordinator: CoordinatorData<C, S>,
) -> impl Responder {
    HttpResponse::Ok().json(coordinator.health())
}

pub async fn start<C: ComputeService, S: SharedStore>(
    coordinator: CoordinatorData<C, S>,
) -> impl Responder {
    let status = coordinator.start().await;
    HttpResponse::Ok().json(ControlReply { status })
}

pub async fn stop<C: ComputeService, S: SharedStore>(
    coordinator: CoordinatorData<C, S>,
) -> impl Responder {
    let status = coordinator.stop().await;
    HttpResponse::Ok().json(ControlReply { status })
}
