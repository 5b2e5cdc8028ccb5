//! Storage seams for consumers, tokens and the nonce ledger.
//!
//! The provider takes these as injected trait objects so the durable backend
//! stays swappable; the crate ships the in-memory implementations in
//! [`crate::memory`].

use async_trait::async_trait;

use crate::types::{AccessToken, Consumer, OAuthError, RequestToken};

/// Durable store of registered consumers, keyed by (key, kind).
#[async_trait]
pub trait ConsumerStore: Send + Sync + 'static {
    /// Persists a new consumer. The key must be unique within its kind.
    async fn create(&self, consumer: Consumer) -> Result<(), OAuthError>;

    /// Fetches the unique consumer with this key and kind. Fails with
    /// `ConsumerNotFound` on zero or ambiguous results.
    async fn find_by_key(&self, key: &str, kind: &str) -> Result<Consumer, OAuthError>;

    /// Deletes a consumer registration.
    async fn delete(&self, key: &str, kind: &str) -> Result<(), OAuthError>;
}

/// Durable store of request and access tokens, keyed by token key.
#[async_trait]
pub trait TokenStore: Send + Sync + 'static {
    async fn put_request_token(&self, token: RequestToken) -> Result<(), OAuthError>;

    async fn get_request_token(&self, key: &str) -> Result<Option<RequestToken>, OAuthError>;

    /// Atomically removes and returns a request token. Exactly one of any
    /// number of concurrent callers observes the token; this is what makes
    /// promotion to an access token at-most-once.
    async fn take_request_token(&self, key: &str) -> Result<Option<RequestToken>, OAuthError>;

    async fn delete_request_token(&self, key: &str) -> Result<(), OAuthError>;

    /// Flips a request token to authorized, recording the approving
    /// principal. Fails with `InvalidToken` if the token does not exist.
    async fn set_request_token_authorized(
        &self,
        key: &str,
        principal: u64,
    ) -> Result<(), OAuthError>;

    async fn put_access_token(&self, token: AccessToken) -> Result<(), OAuthError>;

    async fn get_access_token(&self, key: &str) -> Result<Option<AccessToken>, OAuthError>;

    /// Deletes an access token. Fails with `InvalidToken` if it does not
    /// exist, so revocation of an unknown key is reported.
    async fn delete_access_token(&self, key: &str) -> Result<(), OAuthError>;
}

/// Per-principal replay ledger mapping timestamps to nonce values.
#[async_trait]
pub trait NonceStore: Send + Sync + 'static {
    /// Atomically checks and records a nonce for the given ledger.
    ///
    /// Fails with `NonceAlreadyUsed` when the nonce value appears anywhere in
    /// the ledger; otherwise records `timestamp -> nonce` and prunes entries
    /// older than `now - window` seconds. The check and the record happen
    /// under one lock so two concurrent requests cannot both pass with the
    /// same nonce.
    async fn check_and_record(
        &self,
        ledger: &str,
        timestamp: i64,
        nonce: &str,
        window: i64,
    ) -> Result<(), OAuthError>;
}
