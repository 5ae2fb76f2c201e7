//! Assembly of the request filter chain.
//!
//! Outer to inner:
//!
//! 1. exception filter (turns every failure below it into an envelope)
//! 2. CORS policy, global; preflights are answered here
//! 3. API key extraction, bound to the protected prefix
//! 4. session policy
//! 5. access rule ("every request under the prefix is authenticated")
//!
//! There is no CSRF token check: the API is stateless and authenticated by a
//! header that browsers never attach on their own.

use axum::{http::HeaderName, middleware, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower::ServiceBuilder;

use crate::auth::KeyAuthenticator;
use crate::middleware::api_key::api_key_filter;
use crate::middleware::authorize::access_rule_filter;
use crate::middleware::cors::CorsPolicy;
use crate::middleware::exception::exception_filter;
use crate::middleware::session::session_filter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPolicy {
    /// No cookies in, no cookies out
    Stateless,
    Passthrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessRule {
    Authenticated,
    PermitAll,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid API key header name: {0}")]
    InvalidHeaderName(String),
}

/// Plain configuration consumed by [`build_pipeline`]
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub api_key_header: String,
    pub protected_prefix: String,
    pub cors: CorsPolicy,
    pub session_policy: SessionPolicy,
    pub access_rule: AccessRule,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_key_header: "x-api-key".to_string(),
            protected_prefix: "/api/v1".to_string(),
            cors: CorsPolicy::default(),
            session_policy: SessionPolicy::Stateless,
            access_rule: AccessRule::Authenticated,
        }
    }
}

/// URL prefix guarded by the key filter. `/api/v1` matches `/api/v1` and
/// `/api/v1/...`, never `/api/v10`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedPrefix(String);

impl ProtectedPrefix {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim().trim_end_matches("/**").trim_end_matches('/');
        if trimmed.is_empty() {
            Self(String::new())
        } else if trimmed.starts_with('/') {
            Self(trimmed.to_string())
        } else {
            Self(format!("/{trimmed}"))
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.0.is_empty() {
            return true;
        }
        match path.strip_prefix(self.0.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Immutable per-process state shared by the prefix-bound filters
pub struct ChainScope {
    pub authenticator: Arc<KeyAuthenticator>,
    pub header: HeaderName,
    pub prefix: ProtectedPrefix,
    pub session_policy: SessionPolicy,
    pub access_rule: AccessRule,
}

/// Wrap `router` in the filter chain. Call after every route and the fallback
/// are registered so the chain covers them all.
pub fn build_pipeline(
    router: Router,
    config: &PipelineConfig,
    authenticator: Arc<KeyAuthenticator>,
) -> Result<Router, PipelineError> {
    let header = HeaderName::from_bytes(config.api_key_header.as_bytes())
        .map_err(|_| PipelineError::InvalidHeaderName(config.api_key_header.clone()))?;

    let scope = Arc::new(ChainScope {
        authenticator,
        header,
        prefix: ProtectedPrefix::new(&config.protected_prefix),
        session_policy: config.session_policy,
        access_rule: config.access_rule,
    });

    tracing::info!(
        prefix = scope.prefix.as_str(),
        header = %scope.header,
        session = ?scope.session_policy,
        access = ?scope.access_rule,
        any_origin = config.cors.allows_any_origin(),
        "Request pipeline assembled"
    );

    Ok(router.layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn(exception_filter))
            .layer(config.cors.layer())
            .layer(middleware::from_fn_with_state(scope.clone(), api_key_filter))
            .layer(middleware::from_fn_with_state(scope.clone(), session_filter))
            .layer(middleware::from_fn_with_state(scope, access_rule_filter)),
    ))
}
