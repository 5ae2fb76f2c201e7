use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

use crate::error::{ApiError, UNAUTHORIZED_MESSAGE};
use crate::middleware::response::{Enveloped, ResponseEnvelope};

/// Outermost filter: nothing raised further down the chain reaches the client raw.
///
/// - a panic becomes a 500 envelope;
/// - an error response without an envelope (route or method miss, extractor
///   rejection) is rewritten into one, keeping its status and headers;
/// - envelopes pass through untouched.
pub async fn exception_filter(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => envelope_raw_error(response, &method, &path),
        Err(panic) => {
            tracing::error!(%method, %path, "Request handler panicked: {}", panic_message(panic.as_ref()));
            ApiError::internal_server_error("Internal server error").into_response()
        }
    }
}

fn envelope_raw_error(response: Response, method: &axum::http::Method, path: &str) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || response.extensions().get::<Enveloped>().is_some() {
        return response;
    }

    tracing::debug!(%method, %path, status = status.as_u16(), "Wrapping raw error response");

    let (parts, _body) = response.into_parts();
    let mut converted = ResponseEnvelope::<()>::error(status, safe_message(status)).into_response();
    for (name, value) in &parts.headers {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            converted.headers_mut().append(name.clone(), value.clone());
        }
    }
    converted
}

/// Message for a status whose original body is discarded
pub fn safe_message(status: StatusCode) -> String {
    match status {
        StatusCode::UNAUTHORIZED => UNAUTHORIZED_MESSAGE.to_string(),
        s if s.is_server_error() => "Internal server error".to_string(),
        s => s.canonical_reason().unwrap_or("Request failed").to_string(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
