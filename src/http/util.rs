//! `/util/{kind}`: item and recipe metadata straight from the store.

use actix_web::{routes, web, HttpRequest, HttpResponse};

use super::params::MarketParams;
use super::respond;
use crate::error::{ApiError, GatewayError};
use crate::keys::CollectionKind;
use crate::service::MarketService;

fn kind(segment: &str) -> Result<CollectionKind, GatewayError> {
    CollectionKind::from_segment(segment).ok_or(GatewayError::NotFound)
}

#[routes]
#[get("/{kind}")]
#[post("/{kind}")]
pub async fn documents(
    req: HttpRequest,
    segment: web::Path<String>,
    params: MarketParams,
    svc: web::Data<MarketService>,
) -> Result<HttpResponse, ApiError> {
    let result = async {
        let kind = kind(&segment)?;
        let ids = params.ints("id")?;
        svc.documents(kind, &ids, params.opt_str("lang")).await
    }
    .await;
    respond::collapsed(&req, result)
}

#[routes]
#[get("/{kind}/dump")]
#[post("/{kind}/dump")]
pub async fn dump(
    req: HttpRequest,
    segment: web::Path<String>,
    params: MarketParams,
    svc: web::Data<MarketService>,
) -> Result<HttpResponse, ApiError> {
    let result = async {
        let kind = kind(&segment)?;
        svc.dump(kind, params.opt_str("lang")).await
    }
    .await;
    respond::json(&req, result)
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/util").service(dump).service(documents));
}
