//! `/v2/{region}`: enriched, localized market data.

use actix_web::{routes, web, HttpRequest, HttpResponse};

use super::params::MarketParams;
use super::respond;
use crate::error::ApiError;
use crate::service::MarketService;

#[routes]
#[get("/GetWorldMarketHotList")]
#[post("/GetWorldMarketHotList")]
pub async fn hot_list(
    req: HttpRequest,
    region: web::Path<String>,
    params: MarketParams,
    svc: web::Data<MarketService>,
) -> Result<HttpResponse, ApiError> {
    let result = svc.hot_list(&region, params.opt_str("lang")).await;
    respond::json(&req, result)
}

#[routes]
#[get("/GetWorldMarketList")]
#[post("/GetWorldMarketList")]
pub async fn market_list(
    req: HttpRequest,
    region: web::Path<String>,
    params: MarketParams,
    svc: web::Data<MarketService>,
) -> Result<HttpResponse, ApiError> {
    let result = async {
        let main = params.int("mainCategory")?;
        let sub = params.int("subCategory")?;
        svc.market_list(&region, main, sub).await
    }
    .await;
    respond::json(&req, result)
}

#[routes]
#[get("/GetWorldMarketSubList")]
#[post("/GetWorldMarketSubList")]
#[get("/item")]
#[post("/item")]
pub async fn sub_list(
    req: HttpRequest,
    region: web::Path<String>,
    params: MarketParams,
    svc: web::Data<MarketService>,
) -> Result<HttpResponse, ApiError> {
    let result = async {
        let ids = params.required_ints("id")?;
        svc.sub_list(&region, &ids, params.opt_str("lang")).await
    }
    .await;
    respond::collapsed(&req, result)
}

#[routes]
#[get("/GetWorldMarketSearchList")]
#[post("/GetWorldMarketSearchList")]
pub async fn search_list(
    req: HttpRequest,
    region: web::Path<String>,
    params: MarketParams,
    svc: web::Data<MarketService>,
) -> Result<HttpResponse, ApiError> {
    let result = async {
        let ids = params.required_ints("ids")?;
        svc.search_list(&region, &ids).await
    }
    .await;
    respond::collapsed(&req, result)
}

#[routes]
#[get("/GetBiddingInfoList")]
#[post("/GetBiddingInfoList")]
#[get("/orders")]
#[post("/orders")]
pub async fn bidding_list(
    req: HttpRequest,
    region: web::Path<String>,
    params: MarketParams,
    svc: web::Data<MarketService>,
) -> Result<HttpResponse, ApiError> {
    let result = async {
        let ids = params.required_ints("id")?;
        let sids = params.ints("sid")?;
        svc.bidding_list(&region, &ids, &sids).await
    }
    .await;
    respond::collapsed(&req, result)
}

#[routes]
#[get("/GetMarketPriceInfo")]
#[post("/GetMarketPriceInfo")]
#[get("/history")]
#[post("/history")]
pub async fn price_info(
    req: HttpRequest,
    region: web::Path<String>,
    params: MarketParams,
    svc: web::Data<MarketService>,
) -> Result<HttpResponse, ApiError> {
    let result = async {
        let ids = params.required_ints("id")?;
        let sids = params.ints("sid")?;
        svc.price_info(&region, &ids, &sids).await
    }
    .await;
    respond::collapsed(&req, result)
}

#[routes]
#[get("/GetWorldMarketWaitList")]
#[post("/GetWorldMarketWaitList")]
pub async fn wait_list(
    req: HttpRequest,
    region: web::Path<String>,
    params: MarketParams,
    svc: web::Data<MarketService>,
) -> Result<HttpResponse, ApiError> {
    let result = svc.wait_list(&region, params.opt_str("lang")).await;
    respond::json(&req, result)
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v2/{region}")
            .service(hot_list)
            .service(market_list)
            .service(sub_list)
            .service(search_list)
            .service(bidding_list)
            .service(price_info)
            .service(wait_list),
    );
}
