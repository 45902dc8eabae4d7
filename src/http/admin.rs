//! Administrative refresh of the collection dumps.

use actix_web::{dev::Payload, post, web, FromRequest, HttpRequest, HttpResponse};
use futures_util::future::{ready, Ready};

use super::respond;
use crate::error::{ApiError, GatewayError};
use crate::service::MarketService;

/// Header carrying the shared admin secret.
const API_KEY_HEADER: &str = "apikey";
/// Presence of this header turns a refresh into a clear.
const CLEAR_HEADER: &str = "c";

/// Rejects the request unless `apikey` matches the configured secret.
#[derive(Debug, Clone, Copy)]
pub struct AdminKey;

impl FromRequest for AdminKey {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _pl: &mut Payload) -> Self::Future {
        let res = (|| -> Result<Self, GatewayError> {
            let svc = req
                .app_data::<web::Data<MarketService>>()
                .ok_or_else(|| GatewayError::Internal("market service not registered".into()))?;
            let key = req
                .headers()
                .get(API_KEY_HEADER)
                .and_then(|v| v.to_str().ok());
            svc.check_admin_key(key)?;
            Ok(AdminKey)
        })();

        ready(res.map_err(|e| ApiError::new(e, req)))
    }
}

/// Warm every collection into the dump cache, or clear it when `c` is set.
/// Answers only once all loads finished.
#[post("/scraper")]
pub async fn scraper(
    req: HttpRequest,
    _auth: AdminKey,
    svc: web::Data<MarketService>,
) -> Result<HttpResponse, ApiError> {
    if req.headers().contains_key(CLEAR_HEADER) {
        svc.clear_dumps().await;
        return respond::done(&req, Ok(()));
    }
    let result = svc.warm_dumps().await;
    respond::done(&req, result)
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(scraper);
}
