//! Client for the regional Trademarket endpoints.

pub mod items;
pub mod parse;
pub mod request;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::RegionRegistry;
use crate::error::GatewayError;
use crate::keys::RawKey;

/// Result code the upstream uses for "nothing recorded for this item".
pub const NO_DATA_CODE: i64 = 8;

/// A decoded upstream response body. Serializes as the body itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MarketResponse {
    body: Value,
}

impl MarketResponse {
    /// Wrap a JSON body; anything but an object is rejected.
    pub fn from_json(body: Value) -> Result<Self, GatewayError> {
        if !body.is_object() {
            return Err(GatewayError::Upstream(
                "market body is not a JSON object".into(),
            ));
        }
        Ok(Self { body })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GatewayError> {
        let body = serde_json::from_slice(bytes)
            .map_err(|e| GatewayError::Upstream(format!("market body is not JSON: {e}")))?;
        Self::from_json(body)
    }

    /// The delimited payload.
    pub fn result_msg(&self) -> Result<&str, GatewayError> {
        self.body
            .get("resultMsg")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::Decode("response has no `resultMsg`".into()))
    }

    pub fn result_code(&self) -> Option<i64> {
        self.body.get("resultCode").and_then(Value::as_i64)
    }

    /// `"0"` payload or result code 8.
    pub fn is_no_data(&self) -> bool {
        self.result_code() == Some(NO_DATA_CODE)
            || matches!(self.result_msg(), Ok(parse::NO_RESULTS))
    }
}

/// Anything that can answer a [`RawKey`] with an upstream response.
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn fetch(&self, key: &RawKey) -> Result<MarketResponse, GatewayError>;
}

/// HTTPS client for the real Trademarket. One attempt per call, no retry.
pub struct Marketplace {
    client: Client,
    regions: RegionRegistry,
}

const USER_AGENT: &str = "BlackDesert";

impl Marketplace {
    pub fn new(regions: RegionRegistry, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Internal(format!("building market client: {e}")))?;
        Ok(Self { client, regions })
    }

    fn url(&self, key: &RawKey) -> Result<String, GatewayError> {
        let host = self
            .regions
            .host(&key.region)
            .ok_or_else(|| GatewayError::InvalidRegion(key.region.clone()))?;
        Ok(format!(
            "https://{host}/Trademarket/{}",
            key.endpoint.upstream_name()
        ))
    }
}

#[async_trait]
impl MarketSource for Marketplace {
    async fn fetch(&self, key: &RawKey) -> Result<MarketResponse, GatewayError> {
        let url = self.url(key)?;
        log::debug!("market request {key} -> {url}");

        let mut req = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json");
        if let Some(body) = request::body(key) {
            req = req.json(&body);
        }

        let res = req
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(format!("{key}: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            return Err(GatewayError::Upstream(format!("{key}: status {status}")));
        }

        let bytes = res
            .bytes()
            .await
            .map_err(|e| GatewayError::Upstream(format!("{key}: reading body: {e}")))?;
        MarketResponse::from_bytes(&bytes)
    }
}
