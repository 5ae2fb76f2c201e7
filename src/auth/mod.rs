//! API-key authentication.
//!
//! [`KeyAuthenticator`] turns the raw value of the key header into an
//! [`AuthenticationOutcome`]. The key extraction middleware attaches the
//! resulting [`Principal`] to the request, and handlers pull it back out with
//! the `Principal` extractor.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::database::models::{hash_key, ApiKeyRecord};
use crate::database::{with_timeout, ApiKeyStore, DatabaseError};
use crate::error::ApiError;

/// Granted authority. Every key-authenticated caller gets `ROLE_USER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Authority {
    #[serde(rename = "ROLE_USER")]
    User,
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authority::User => write!(f, "ROLE_USER"),
        }
    }
}

/// Identity resolved from a valid key; lives for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Owner of the key
    pub id: Uuid,
    pub key_id: Uuid,
    pub key_name: String,
    pub authorities: Vec<Authority>,
}

impl Principal {
    fn from_record(record: ApiKeyRecord) -> Self {
        Self {
            id: record.owner_id,
            key_id: record.id,
            key_name: record.name,
            authorities: vec![Authority::User],
        }
    }

    pub fn has_authority(&self, authority: Authority) -> bool {
        self.authorities.contains(&authority)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingCredential,
    /// Unknown, revoked or expired
    InvalidCredential,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingCredential => write!(f, "missing credential"),
            RejectReason::InvalidCredential => write!(f, "invalid credential"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationOutcome {
    Authenticated(Principal),
    Rejected(RejectReason),
}

/// Validates presented keys against the key store
pub struct KeyAuthenticator {
    store: Arc<dyn ApiKeyStore>,
    timeout: Duration,
}

impl KeyAuthenticator {
    pub fn new(store: Arc<dyn ApiKeyStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Resolve a raw header value. `Err` is reserved for store failures; every
    /// credential problem is an `Ok(Rejected(..))`.
    pub async fn authenticate(&self, raw: Option<&str>) -> Result<AuthenticationOutcome, DatabaseError> {
        let key = match raw.map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => return Ok(AuthenticationOutcome::Rejected(RejectReason::MissingCredential)),
        };

        let key_hash = hash_key(key);
        let record = with_timeout(self.timeout, self.store.find_by_hash(&key_hash)).await?;

        let outcome = match record {
            Some(record) if record.is_active(Utc::now()) => {
                tracing::debug!(key_id = %record.id, owner_id = %record.owner_id, "API key accepted");
                AuthenticationOutcome::Authenticated(Principal::from_record(record))
            }
            Some(record) => {
                tracing::debug!(key_id = %record.id, revoked = record.revoked, "API key inactive");
                AuthenticationOutcome::Rejected(RejectReason::InvalidCredential)
            }
            None => AuthenticationOutcome::Rejected(RejectReason::InvalidCredential),
        };

        Ok(outcome)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(ApiError::unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use chrono::Duration as ChronoDuration;

    async fn authenticator_with(records: Vec<ApiKeyRecord>) -> KeyAuthenticator {
        let store = MemoryStore::new();
        for record in records {
            store.insert_api_key(record).await;
        }
        KeyAuthenticator::new(Arc::new(store), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn missing_and_blank_headers_are_missing_credentials() {
        let auth = authenticator_with(vec![]).await;
        for raw in [None, Some(""), Some("   ")] {
            assert_eq!(
                auth.authenticate(raw).await.unwrap(),
                AuthenticationOutcome::Rejected(RejectReason::MissingCredential)
            );
        }
    }

    #[tokio::test]
    async fn unknown_key_is_invalid() {
        let auth = authenticator_with(vec![]).await;
        assert_eq!(
            auth.authenticate(Some("bk_nope")).await.unwrap(),
            AuthenticationOutcome::Rejected(RejectReason::InvalidCredential)
        );
    }

    #[tokio::test]
    async fn revoked_and_expired_keys_are_invalid() {
        let owner = Uuid::new_v4();
        let mut revoked = ApiKeyRecord::new("revoked", "bk_revoked", owner, None);
        revoked.revoked = true;
        let expired = ApiKeyRecord::new("expired", "bk_expired", owner, Some(Utc::now() - ChronoDuration::minutes(1)));
        let auth = authenticator_with(vec![revoked, expired]).await;

        for raw in ["bk_revoked", "bk_expired"] {
            assert_eq!(
                auth.authenticate(Some(raw)).await.unwrap(),
                AuthenticationOutcome::Rejected(RejectReason::InvalidCredential)
            );
        }
    }

    #[tokio::test]
    async fn valid_key_yields_owner_principal() {
        let owner = Uuid::new_v4();
        let record = ApiKeyRecord::new("mobile", "bk_good", owner, Some(Utc::now() + ChronoDuration::days(1)));
        let key_id = record.id;
        let auth = authenticator_with(vec![record]).await;

        match auth.authenticate(Some("bk_good")).await.unwrap() {
            AuthenticationOutcome::Authenticated(principal) => {
                assert_eq!(principal.id, owner);
                assert_eq!(principal.key_id, key_id);
                assert!(principal.has_authority(Authority::User));
            }
            other => panic!("expected authenticated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn surrounding_whitespace_is_ignored() {
        let record = ApiKeyRecord::new("k", "bk_trim", Uuid::new_v4(), None);
        let auth = authenticator_with(vec![record]).await;
        assert!(matches!(
            auth.authenticate(Some("  bk_trim ")).await.unwrap(),
            AuthenticationOutcome::Authenticated(_)
        ));
    }

    #[test]
    fn reject_reasons_never_include_key_material() {
        assert_eq!(RejectReason::MissingCredential.to_string(), "missing credential");
        assert_eq!(RejectReason::InvalidCredential.to_string(), "invalid credential");
        assert_eq!(Authority::User.to_string(), "ROLE_USER");
    }

    #[test]
    fn principal_serializes_with_camel_case_names() {
        let record = ApiKeyRecord::new("mobile", "bk_wire", Uuid::new_v4(), None);
        let principal = Principal::from_record(record.clone());
        let value = serde_json::to_value(&principal).unwrap();

        assert_eq!(value["keyId"], record.id.to_string());
        assert_eq!(value["keyName"], "mobile");
        assert!(value.get("key_id").is_none());
    }
}
