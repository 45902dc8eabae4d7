//! Simple liveness / readiness probe

use actix_web::{get, web, HttpResponse, Responder};

use crate::service::MarketService;

#[get("/healthz")]
pub async fn healthz(svc: web::Data<MarketService>) -> impl Responder {
    if let Err(e) = svc.health().await {
        log::warn!("health check failed: {e:?}");
        return HttpResponse::ServiceUnavailable().body("db");
    }

    HttpResponse::Ok().body("ok")
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(healthz);
}
