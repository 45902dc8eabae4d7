//! Success and failure rendering shared by every route.

use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;

use crate::error::{ApiError, GatewayError};

/// Pretty-printed JSON, readable from any origin.
pub fn json<T: Serialize>(
    req: &HttpRequest,
    result: Result<T, GatewayError>,
) -> Result<HttpResponse, ApiError> {
    let value = result.map_err(|e| ApiError::new(e, req))?;
    let body = serde_json::to_string_pretty(&value)
        .map_err(|e| ApiError::new(GatewayError::Internal(e.to_string()), req))?;

    log::info!("{}: {}", req.method(), req.uri());
    Ok(HttpResponse::Ok()
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .content_type("application/json")
        .body(body))
}

/// Like [`json`], but a single result is sent bare instead of as a
/// one-element array.
pub fn collapsed<T: Serialize>(
    req: &HttpRequest,
    result: Result<Vec<T>, GatewayError>,
) -> Result<HttpResponse, ApiError> {
    match result {
        Ok(mut items) if items.len() == 1 => json(req, Ok(items.remove(0))),
        other => json(req, other),
    }
}

/// Empty 200 for endpoints that only report success.
pub fn done(req: &HttpRequest, result: Result<(), GatewayError>) -> Result<HttpResponse, ApiError> {
    result.map_err(|e| ApiError::new(e, req))?;
    log::info!("{}: {}", req.method(), req.uri());
    Ok(HttpResponse::Ok().finish())
}
