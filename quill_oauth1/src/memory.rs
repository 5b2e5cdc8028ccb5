//! In-memory default implementations for the store traits.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::store::{ConsumerStore, NonceStore, TokenStore};
use crate::types::{AccessToken, Consumer, OAuthError, RequestToken};

/// Consumers keyed by `(kind, key)`.
///
/// The composite key makes an ambiguous lookup impossible by construction,
/// which is the in-memory rendering of the key-uniqueness constraint.
#[derive(Clone, Default)]
pub struct InMemoryConsumerStore {
    consumers: Arc<DashMap<(String, String), Consumer>>,
}

impl InMemoryConsumerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConsumerStore for InMemoryConsumerStore {
    async fn create(&self, consumer: Consumer) -> Result<(), OAuthError> {
        self.consumers
            .insert((consumer.kind.clone(), consumer.key.clone()), consumer);
        Ok(())
    }

    async fn find_by_key(&self, key: &str, kind: &str) -> Result<Consumer, OAuthError> {
        self.consumers
            .get(&(kind.to_string(), key.to_string()))
            .map(|entry| entry.value().clone())
            .ok_or(OAuthError::ConsumerNotFound)
    }

    async fn delete(&self, key: &str, kind: &str) -> Result<(), OAuthError> {
        self.consumers.remove(&(kind.to_string(), key.to_string()));
        Ok(())
    }
}

/// Request and access tokens keyed by token key.
#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    request_tokens: Arc<DashMap<String, RequestToken>>,
    access_tokens: Arc<DashMap<String, AccessToken>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn put_request_token(&self, token: RequestToken) -> Result<(), OAuthError> {
        self.request_tokens.insert(token.key.clone(), token);
        Ok(())
    }

    async fn get_request_token(&self, key: &str) -> Result<Option<RequestToken>, OAuthError> {
        Ok(self
            .request_tokens
            .get(key)
            .map(|entry| entry.value().clone()))
    }

    async fn take_request_token(&self, key: &str) -> Result<Option<RequestToken>, OAuthError> {
        // DashMap::remove is the compare-and-swap here: one concurrent caller
        // gets Some, the rest get None.
        Ok(self.request_tokens.remove(key).map(|(_, token)| token))
    }

    async fn delete_request_token(&self, key: &str) -> Result<(), OAuthError> {
        self.request_tokens.remove(key);
        Ok(())
    }

    async fn set_request_token_authorized(
        &self,
        key: &str,
        principal: u64,
    ) -> Result<(), OAuthError> {
        let mut entry = self
            .request_tokens
            .get_mut(key)
            .ok_or(OAuthError::InvalidToken)?;
        entry.authorized = true;
        entry.authorized_by = Some(principal);
        Ok(())
    }

    async fn put_access_token(&self, token: AccessToken) -> Result<(), OAuthError> {
        self.access_tokens.insert(token.key.clone(), token);
        Ok(())
    }

    async fn get_access_token(&self, key: &str) -> Result<Option<AccessToken>, OAuthError> {
        Ok(self
            .access_tokens
            .get(key)
            .map(|entry| entry.value().clone()))
    }

    async fn delete_access_token(&self, key: &str) -> Result<(), OAuthError> {
        self.access_tokens
            .remove(key)
            .map(|_| ())
            .ok_or(OAuthError::InvalidToken)
    }
}

/// Per-ledger nonce maps, mutated under the DashMap shard lock so the
/// check-and-record step is atomic.
#[derive(Clone, Default)]
pub struct InMemoryNonceStore {
    ledgers: Arc<DashMap<String, BTreeMap<i64, String>>>,
}

impl InMemoryNonceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NonceStore for InMemoryNonceStore {
    async fn check_and_record(
        &self,
        ledger: &str,
        timestamp: i64,
        nonce: &str,
        window: i64,
    ) -> Result<(), OAuthError> {
        let mut entry = self.ledgers.entry(ledger.to_string()).or_default();
        // Linear scan of recorded nonce values, regardless of timestamp key.
        if entry.values().any(|used| used == nonce) {
            return Err(OAuthError::NonceAlreadyUsed);
        }
        entry.insert(timestamp, nonce.to_string());
        let horizon = Utc::now().timestamp() - window;
        entry.retain(|recorded, _| *recorded >= horizon);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn take_request_token_is_at_most_once() {
        let store = InMemoryTokenStore::new();
        store
            .put_request_token(RequestToken {
                key: "rt".into(),
                secret: "s".into(),
                consumer: 1,
                authorized: true,
                authorized_by: Some(7),
                expiration: i64::MAX,
            })
            .await
            .unwrap();
        assert!(store.take_request_token("rt").await.unwrap().is_some());
        assert!(store.take_request_token("rt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn nonce_ledgers_are_isolated_per_principal() {
        let store = InMemoryNonceStore::new();
        let now = Utc::now().timestamp();
        store.check_and_record("1", now, "abc", 900).await.unwrap();
        // Same nonce, different ledger: allowed.
        store.check_and_record("2", now, "abc", 900).await.unwrap();
        // Same ledger, same nonce under a different timestamp: rejected.
        let err = store
            .check_and_record("1", now + 1, "abc", 900)
            .await
            .unwrap_err();
        assert_eq!(err, OAuthError::NonceAlreadyUsed);
    }

    #[tokio::test]
    async fn old_entries_are_pruned_at_the_window_horizon() {
        let store = InMemoryNonceStore::new();
        let now = Utc::now().timestamp();
        store
            .check_and_record("1", now - 2000, "stale", 900)
            .await
            .unwrap();
        // The stale entry was pruned on the next check, so its nonce is free
        // again.
        store.check_and_record("1", now, "stale", 900).await.unwrap();
    }
}
