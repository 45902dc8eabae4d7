use crate::error::{ApiError, GatewayError};
use crate::http;
use actix_web::{web, HttpRequest, HttpResponse};

/// Mount every HTTP sub-module.
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(http::market::init_routes)
        .configure(http::legacy::init_routes)
        .configure(http::util::init_routes)
        .configure(http::admin::init_routes)
        .configure(http::health::init_routes);
}

/// Fallback for every unmatched path.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    Err(ApiError::new(GatewayError::NotFound, &req))
}
