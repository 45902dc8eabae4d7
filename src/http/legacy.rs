//! `/v1/{region}`: upstream responses passed through as received, plus the
//! single-level price lookup.

use actix_web::{routes, web, HttpRequest, HttpResponse};

use super::params::MarketParams;
use super::respond;
use crate::error::ApiError;
use crate::keys::{Endpoint, ItemId};
use crate::service::MarketService;

#[routes]
#[get("/GetWorldMarketWaitList")]
#[post("/GetWorldMarketWaitList")]
pub async fn wait_list(
    req: HttpRequest,
    region: web::Path<String>,
    svc: web::Data<MarketService>,
) -> Result<HttpResponse, ApiError> {
    let result = svc
        .raw(&region, Endpoint::WaitList, vec![(ItemId::Int(0), 0)])
        .await;
    respond::collapsed(&req, result)
}

#[routes]
#[get("/GetWorldMarketHotList")]
#[post("/GetWorldMarketHotList")]
pub async fn hot_list(
    req: HttpRequest,
    region: web::Path<String>,
    svc: web::Data<MarketService>,
) -> Result<HttpResponse, ApiError> {
    let result = svc
        .raw(&region, Endpoint::HotList, vec![(ItemId::Int(0), 0)])
        .await;
    respond::collapsed(&req, result)
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
        svc.raw(&region, Endpoint::MarketList, vec![(ItemId::from(main), sub)])
            .await
    }
    .await;
    respond::collapsed(&req, result)
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
        svc.raw_sub_list(&region, &ids).await
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
        svc.raw_search(&region, &ids).await
    }
    .await;
    respond::json(&req, result)
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
        svc.raw_per_level(&region, Endpoint::BiddingList, &ids, &sids)
            .await
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
        svc.raw_per_level(&region, Endpoint::PriceInfo, &ids, &sids)
            .await
    }
    .await;
    respond::collapsed(&req, result)
}

#[routes]
#[get("/price")]
#[post("/price")]
pub async fn price(
    req: HttpRequest,
    region: web::Path<String>,
    params: MarketParams,
    svc: web::Data<MarketService>,
) -> Result<HttpResponse, ApiError> {
    let result = async {
        let id = params.int("id")?;
        let sid = params.opt_int("sid")?.unwrap_or(0);
        svc.price(&region, id, sid, params.opt_str("lang")).await
    }
    .await;
    respond::json(&req, result)
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1/{region}")
            .service(wait_list)
            .service(hot_list)
            .service(market_list)
            .service(sub_list)
            .service(search_list)
            .service(bidding_list)
            .service(price_info)
            .service(price),
    );
}
