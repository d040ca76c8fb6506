//! Token results and the identity-provider seam.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use firefly_core::Uid;

use crate::{Claims, UserHandle};

/// Result of an ID-token request.
///
/// Only `claims` drives authorization. The remaining fields are whatever
/// metadata the provider reports; they are carried for display/logging and
/// are never verified here (signature checks belong to the provider).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResult {
    pub claims: Claims,

    /// Raw encoded token.
    #[serde(default)]
    pub token: String,

    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub auth_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub sign_in_provider: Option<String>,
}

impl TokenResult {
    pub fn with_claims(claims: Claims) -> Self {
        Self {
            claims,
            token: String::new(),
            issued_at: None,
            expires_at: None,
            auth_time: None,
            sign_in_provider: None,
        }
    }

    /// Take the claims out, dropping the metadata.
    pub fn into_claims(self) -> Claims {
        self.claims
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenFetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("user account is disabled")]
    UserDisabled,

    #[error("token has been revoked")]
    TokenRevoked,

    #[error("no token available for user '{0}'")]
    UnknownUser(Uid),

    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Source of ID-token results (the identity provider).
///
/// `force_refresh = true` must bypass any cached token so the returned
/// claims reflect the latest server-side assignment.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn get_id_token_result(
        &self,
        user: &UserHandle,
        force_refresh: bool,
    ) -> Result<TokenResult, TokenFetchError>;
}

#[async_trait]
impl<T> TokenSource for Arc<T>
where
    T: TokenSource + ?Sized,
{
    async fn get_id_token_result(
        &self,
        user: &UserHandle,
        force_refresh: bool,
    ) -> Result<TokenResult, TokenFetchError> {
        (**self).get_id_token_result(user, force_refresh).await
    }
}

/// In-memory token source for tests/dev.
///
/// - Answers from a fixed uid → result table
/// - Records every request (uid, force_refresh) in call order
#[derive(Debug, Default)]
pub struct StaticTokenSource {
    results: Mutex<HashMap<Uid, Result<Claims, TokenFetchError>>>,
    calls: Mutex<Vec<(Uid, bool)>>,
}

impl StaticTokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_claims(self, uid: Uid, claims: Claims) -> Self {
        self.set(uid, Ok(claims));
        self
    }

    pub fn with_error(self, uid: Uid, error: TokenFetchError) -> Self {
        self.set(uid, Err(error));
        self
    }

    /// Replace the answer for `uid` (e.g. to simulate a server-side claim change).
    pub fn set(&self, uid: Uid, result: Result<Claims, TokenFetchError>) {
        if let Ok(mut results) = self.results.lock() {
            results.insert(uid, result);
        }
    }

    pub fn calls(&self) -> Vec<(Uid, bool)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn get_id_token_result(
        &self,
        user: &UserHandle,
        force_refresh: bool,
    ) -> Result<TokenResult, TokenFetchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((user.uid.clone(), force_refresh));
        }

        let results = self
            .results
            .lock()
            .map_err(|_| TokenFetchError::Provider("token table poisoned".to_string()))?;

        match results.get(&user.uid) {
            Some(Ok(claims)) => Ok(TokenResult::with_claims(claims.clone())),
            Some(Err(e)) => Err(e.clone()),
            None => Err(TokenFetchError::UnknownUser(user.uid.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ADMIN_CLAIM;

    fn uid(s: &str) -> Uid {
        Uid::parse(s).unwrap()
    }

    #[tokio::test]
    async fn static_source_answers_and_records_calls() {
        let source = StaticTokenSource::new()
            .with_claims(uid("u1"), Claims::new().with(ADMIN_CLAIM, true))
            .with_error(uid("u2"), TokenFetchError::UserDisabled);

        let ok = source
            .get_id_token_result(&UserHandle::new(uid("u1")), true)
            .await
            .unwrap();
        assert!(ok.claims.is_admin());

        let err = source
            .get_id_token_result(&UserHandle::new(uid("u2")), true)
            .await
            .unwrap_err();
        assert_eq!(err, TokenFetchError::UserDisabled);

        let unknown = source
            .get_id_token_result(&UserHandle::new(uid("u3")), false)
            .await
            .unwrap_err();
        assert!(matches!(unknown, TokenFetchError::UnknownUser(_)));

        assert_eq!(
            source.calls(),
            vec![(uid("u1"), true), (uid("u2"), true), (uid("u3"), false)]
        );
    }

    #[test]
    fn token_result_parses_provider_payload() {
        let result: TokenResult = serde_json::from_str(
            r#"{
                "claims": {"isAdmin": true},
                "token": "eyJ...",
                "issuedAt": "2026-10-19T10:00:00Z",
                "expiresAt": "2026-10-19T11:00:00Z",
                "signInProvider": "password"
            }"#,
        )
        .unwrap();

        assert!(result.claims.is_admin());
        assert_eq!(result.sign_in_provider.as_deref(), Some("password"));
        assert!(result.issued_at < result.expires_at);
        assert_eq!(result.auth_time, None);
    }
}
