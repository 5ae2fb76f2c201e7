use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{AuthenticationOutcome, RejectReason};
use crate::error::ApiError;
use crate::middleware::pipeline::{AccessRule, ChainScope};

/// Key extraction filter for the protected prefix.
///
/// Reads the configured key header, resolves it through the authenticator and
/// either attaches the `Principal` to the request or stops the chain with a 401.
/// Paths outside the prefix pass straight through without a store lookup.
pub async fn api_key_filter(
    State(scope): State<Arc<ChainScope>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_owned();
    if !scope.prefix.matches(&path) {
        return Ok(next.run(request).await);
    }

    let outcome = match request.headers().get(&scope.header) {
        None => scope.authenticator.authenticate(None).await?,
        Some(value) => match value.to_str() {
            Ok(raw) => scope.authenticator.authenticate(Some(raw)).await?,
            Err(_) => AuthenticationOutcome::Rejected(RejectReason::InvalidCredential),
        },
    };

    match outcome {
        AuthenticationOutcome::Authenticated(principal) => {
            tracing::debug!(principal = %principal.id, %path, "Request authenticated");
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        AuthenticationOutcome::Rejected(RejectReason::MissingCredential)
            if scope.access_rule == AccessRule::PermitAll =>
        {
            Ok(next.run(request).await)
        }
        AuthenticationOutcome::Rejected(reason) => {
            tracing::warn!(%reason, method = %request.method(), %path, "Rejected API key request");
            Err(ApiError::unauthorized())
        }
    }
}
