//! Error taxonomy shared by the gateway, the caches and the HTTP layer.

use actix_web::{http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Every failure a request can end in.
///
/// `Clone` because a single-flight load hands the same failure to every
/// waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not authorized")]
    Unauthorized,

    #[error("route not found")]
    NotFound,

    #[error("item could not be found")]
    ItemNotFound,

    #[error("invalid region `{0}`")]
    InvalidRegion(String),

    #[error("{ids} ids but {sids} sids")]
    MismatchedIds { ids: usize, sids: usize },

    #[error("invalid language `{0}`")]
    InvalidLanguage(String),

    #[error("item {id} has no sub item {sid}")]
    NoSubItem { id: i64, sid: i64 },

    #[error("invalid price item {id}/{sid}")]
    InvalidPriceItem { id: i64, sid: i64 },

    #[error("internal error: {0}")]
    Internal(String),

    #[error("metadata store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("could not decode market response: {0}")]
    Decode(String),

    #[error("upstream market failure: {0}")]
    Upstream(String),
}

impl GatewayError {
    /// Stable numeric code, also used as the HTTP status.
    pub fn code(&self) -> u16 {
        match self {
            GatewayError::BadRequest(_) => 400,
            GatewayError::Unauthorized => 401,
            GatewayError::NotFound => 404,
            GatewayError::ItemNotFound => 452,
            GatewayError::InvalidRegion(_) => 453,
            GatewayError::MismatchedIds { .. } => 454,
            GatewayError::InvalidLanguage(_) => 456,
            GatewayError::NoSubItem { .. } => 457,
            GatewayError::InvalidPriceItem { .. } => 458,
            GatewayError::Internal(_) => 500,
            GatewayError::StoreUnavailable(_) => 512,
            GatewayError::Decode(_) => 513,
            GatewayError::Upstream(_) => 514,
        }
    }

    /// Client-facing message. Never includes internal detail.
    pub fn message(&self) -> &'static str {
        match self {
            GatewayError::BadRequest(_) => "Bad request",
            GatewayError::Unauthorized => "Not authorized",
            GatewayError::NotFound => "Not found",
            GatewayError::ItemNotFound => "Item could not be found",
            GatewayError::InvalidRegion(_) => "Invalid region",
            GatewayError::MismatchedIds { .. } => {
                "Invalid arguments: There must be an SID for every ID given"
            }
            GatewayError::InvalidLanguage(_) => "Invalid language provided",
            GatewayError::NoSubItem { .. } => "Item does not have sub item by that sid",
            GatewayError::InvalidPriceItem { .. } => "Invalid price item",
            GatewayError::Internal(_) => "Internal server error",
            GatewayError::StoreUnavailable(_) => "Database is unreachable",
            GatewayError::Decode(_) => "Encountered an error parsing market response",
            GatewayError::Upstream(_) => "Web market did not respond",
        }
    }

    /// Caused by the caller's input rather than by us or a dependency.
    pub fn is_client_error(&self) -> bool {
        self.code() < 500
    }
}

/// JSON body of every failed response.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: u16,
    pub message: &'static str,
    pub request: String,
    #[serde(rename = "request-id")]
    pub request_id: Uuid,
}

/// A [`GatewayError`] bound to the request that produced it.
#[derive(Debug)]
pub struct ApiError {
    pub error: GatewayError,
    pub request: String,
    pub request_id: Uuid,
}

impl ApiError {
    /// Wrap `error`, echoing path and query of `req`, and log it under a
    /// fresh correlation id.
    pub fn new(error: GatewayError, req: &HttpRequest) -> Self {
        let request = match req.query_string() {
            "" => req.path().to_owned(),
            q => format!("{}?{}", req.path(), q),
        };
        let request_id = Uuid::new_v4();

        log::error!(
            "{}: {} | {} | {}",
            req.method(),
            request,
            error.message(),
            request_id
        );
        if !error.is_client_error() {
            log::error!("{request_id}: {error}");
        }

        Self {
            error,
            request,
            request_id,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: self.error.code(),
            message: self.error.message(),
            request: self.request.clone(),
            request_id: self.request_id,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.error, self.request_id)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.error.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let body = serde_json::to_string_pretty(&self.envelope()).unwrap_or_default();
        HttpResponse::build(self.status_code())
            .content_type("application/json")
            .body(body)
    }
}
