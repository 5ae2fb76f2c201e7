use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::middleware::pipeline::{AccessRule, ChainScope};

/// Catch-all rule: under `Authenticated`, nothing below the protected prefix
/// reaches a handler without a principal.
pub async fn access_rule_filter(
    State(scope): State<Arc<ChainScope>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if scope.access_rule == AccessRule::Authenticated
        && scope.prefix.matches(request.uri().path())
        && request.extensions().get::<Principal>().is_none()
    {
        tracing::warn!(path = request.uri().path(), "Unauthenticated request reached access rule");
        return Err(ApiError::unauthorized());
    }

    Ok(next.run(request).await)
}
