use axum::{
    extract::{Request, State},
    http::header::{COOKIE, SET_COOKIE},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::middleware::pipeline::{ChainScope, SessionPolicy};

/// Enforce the session policy on the protected prefix: under `Stateless` no
/// cookie reaches a handler and none leaves in a response.
pub async fn session_filter(State(scope): State<Arc<ChainScope>>, mut request: Request, next: Next) -> Response {
    if scope.session_policy == SessionPolicy::Passthrough || !scope.prefix.matches(request.uri().path()) {
        return next.run(request).await;
    }

    request.headers_mut().remove(COOKIE);
    let mut response = next.run(request).await;
    if response.headers_mut().remove(SET_COOKIE).is_some() {
        tracing::debug!("Dropped Set-Cookie from stateless response");
    }
    response
}
