use crate::core::AppError;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use std::future::{ready, Ready};

/// Resolved tenant and actor identity for a request.
///
/// Authentication itself happens upstream (edge gateway); by the time a
/// request reaches this service the gateway has verified the credential and
/// injected `X-Store-Id` / `X-User-Id`. The core only trusts and propagates
/// that context; every query downstream is scoped by `store_id`.
#[derive(Debug, Clone)]
pub struct StoreContext {
    pub store_id: String,
    pub user_id: String,
}

impl FromRequest for StoreContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_context(req))
    }
}

fn extract_context(req: &HttpRequest) -> Result<StoreContext, AppError> {
    let store_id = header_value(req, "X-Store-Id")?;
    let user_id = header_value(req, "X-User-Id")?;

    Ok(StoreContext { store_id, user_id })
}

fn header_value(req: &HttpRequest, name: &str) -> Result<String, AppError> {
    let value = req
        .headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::unauthorized(format!("Missing {} header", name)))?;

    Ok(value.to_string())
}
