use axum::http::{HeaderName, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub const ALLOWED_METHODS: &[&str] = &["GET", "POST", "HEAD", "OPTIONS", "PUT", "PATCH", "DELETE"];

pub const ALLOWED_HEADERS: &[&str] = &[
    "Accept",
    "Access-Control-Request-Method",
    "Access-Control-Request-Headers",
    "Access-Control-Allow-Origin",
    "Access-Control-Expose-Headers",
    "Accept-Language",
    "Authorization",
    "Content-Type",
    "Request-Name",
    "Request-Surname",
    "Origin",
    "X-Api-Key",
    "X-Request-AppVersion",
    "X-Request-OsVersion",
    "X-Request-Device",
    "X-Requested-With",
];

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(10);

/// Static cross-origin policy applied to every path.
///
/// Credentials are never allowed: a wildcard origin and credentialed requests
/// are mutually exclusive, so `*` stays valid only while this holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub max_age: Duration,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ALLOWED_METHODS.iter().map(|m| m.to_string()).collect(),
            allowed_headers: ALLOWED_HEADERS.iter().map(|h| h.to_string()).collect(),
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

impl CorsPolicy {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }

    pub fn layer(&self) -> CorsLayer {
        let origin = if self.allows_any_origin() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(self.allowed_origins.iter().filter_map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|_| tracing::warn!("Ignoring invalid CORS origin: {}", origin))
                    .ok()
            }))
        };

        let methods: Vec<Method> = self
            .allowed_methods
            .iter()
            .filter_map(|m| {
                Method::from_bytes(m.as_bytes())
                    .map_err(|_| tracing::warn!("Ignoring invalid CORS method: {}", m))
                    .ok()
            })
            .collect();

        let headers: Vec<HeaderName> = self
            .allowed_headers
            .iter()
            .filter_map(|h| {
                HeaderName::from_bytes(h.as_bytes())
                    .map_err(|_| tracing::warn!("Ignoring invalid CORS header: {}", h))
                    .ok()
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers(headers)
            .max_age(self.max_age)
    }
}
