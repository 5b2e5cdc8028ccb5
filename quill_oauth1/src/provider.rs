//! The OAuth 1.0a provider: consumer registry, token lifecycle and request
//! verification, wired into the core authentication chain.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use quill_core::auth::{AuthOutcome, Authenticator, Principal};
use quill_core::http::method::HttpMethod;
use quill_core::http::request::Request;
use tracing::{debug, instrument};

use crate::header::collect_oauth_params;
use crate::keys::{
    CONSUMER_KEY_LENGTH, SECRET_LENGTH, TOKEN_KEY_LENGTH, generate_key, generate_secret,
};
use crate::memory::{InMemoryConsumerStore, InMemoryNonceStore, InMemoryTokenStore};
use crate::signature::{self, SignatureMethod};
use crate::store::{ConsumerStore, NonceStore, TokenStore};
use crate::types::{AccessToken, CONSUMER_KIND, Consumer, OAuthError, RequestToken};

/// Provider configuration. Every knob has a builder setter on
/// [`OAuth1Provider`].
#[derive(Debug, Clone)]
pub struct OAuth1Config {
    /// Replay window for timestamp and nonce checks, in seconds.
    pub replay_window: i64,
    /// Lifetime of an unauthorized request token, in seconds.
    pub request_token_ttl: i64,
    /// Scheme and authority prepended to the request path when rebuilding
    /// the signed base URL.
    pub base_url: String,
    /// Path of the request-token endpoint.
    pub request_endpoint: String,
    /// Path of the access-token exchange endpoint.
    pub access_endpoint: String,
}

impl Default for OAuth1Config {
    fn default() -> Self {
        OAuth1Config {
            replay_window: 15 * 60,
            request_token_ttl: 24 * 60 * 60,
            base_url: "http://localhost".to_string(),
            request_endpoint: "/oauth1/request".to_string(),
            access_endpoint: "/oauth1/access".to_string(),
        }
    }
}

/// OAuth1 authentication provider with configurable stores and endpoints.
pub struct OAuth1Provider {
    consumers: Arc<dyn ConsumerStore>,
    tokens: Arc<dyn TokenStore>,
    nonces: Arc<dyn NonceStore>,
    config: OAuth1Config,
    next_consumer_id: AtomicU64,
}

impl OAuth1Provider {
    /// Creates a provider with in-memory stores and default endpoints.
    pub fn new() -> Self {
        OAuth1Provider {
            consumers: Arc::new(InMemoryConsumerStore::new()),
            tokens: Arc::new(InMemoryTokenStore::new()),
            nonces: Arc::new(InMemoryNonceStore::new()),
            config: OAuth1Config::default(),
            next_consumer_id: AtomicU64::new(1),
        }
    }

    /// Sets a custom consumer store.
    pub fn consumer_store(mut self, store: Arc<dyn ConsumerStore>) -> Self {
        self.consumers = store;
        self
    }

    /// Sets a custom token store.
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.tokens = store;
        self
    }

    /// Sets a custom nonce store.
    pub fn nonce_store(mut self, store: Arc<dyn NonceStore>) -> Self {
        self.nonces = store;
        self
    }

    /// Overrides the replay window, in seconds.
    pub fn replay_window(mut self, seconds: i64) -> Self {
        self.config.replay_window = seconds;
        self
    }

    /// Overrides the request-token lifetime, in seconds.
    pub fn request_token_ttl(mut self, seconds: i64) -> Self {
        self.config.request_token_ttl = seconds;
        self
    }

    /// Overrides the base URL used for signature verification.
    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Overrides the request-token endpoint path.
    pub fn request_endpoint<S: Into<String>>(mut self, path: S) -> Self {
        self.config.request_endpoint = path.into();
        self
    }

    /// Overrides the access-token endpoint path.
    pub fn access_endpoint<S: Into<String>>(mut self, path: S) -> Self {
        self.config.access_endpoint = path.into();
        self
    }

    pub fn config(&self) -> &OAuth1Config {
        &self.config
    }

    /// Registers a consumer for the given owner. The key is always
    /// generated (12 characters); the secret is generated (48 characters)
    /// unless supplied.
    #[instrument(skip(self, secret))]
    pub async fn register_consumer(
        &self,
        owner: u64,
        secret: Option<String>,
    ) -> Result<Consumer, OAuthError> {
        let consumer = Consumer {
            id: self.next_consumer_id.fetch_add(1, Ordering::Relaxed),
            key: generate_key(CONSUMER_KEY_LENGTH),
            secret: secret.unwrap_or_else(|| generate_secret(SECRET_LENGTH)),
            owner,
            kind: CONSUMER_KIND.to_string(),
        };
        self.consumers.create(consumer.clone()).await?;
        debug!(consumer = consumer.id, "registered consumer");
        Ok(consumer)
    }

    pub async fn lookup_consumer(&self, key: &str) -> Result<Consumer, OAuthError> {
        self.consumers.find_by_key(key, CONSUMER_KIND).await
    }

    /// Revokes a consumer registration.
    pub async fn delete_consumer(&self, key: &str) -> Result<(), OAuthError> {
        self.consumers.delete(key, CONSUMER_KIND).await
    }

    /// Issues an unauthorized request token. The request must carry a valid
    /// consumer signature but no token.
    #[instrument(skip(self, request))]
    pub async fn issue_request_token(&self, request: &Request) -> Result<RequestToken, OAuthError> {
        let params = collect_oauth_params(request)
            .ok_or_else(|| OAuthError::MissingParameter("oauth_consumer_key".to_string()))?;
        let consumer = self.resolve_consumer(&params).await?;
        self.check_signature(request, &params, &consumer)?;
        // No principal is bound yet; the handshake ledger belongs to the
        // consumer's owner.
        self.check_params_timestamp_and_nonce(&params, consumer.owner)
            .await?;
        let token = RequestToken {
            key: generate_key(TOKEN_KEY_LENGTH),
            secret: generate_secret(SECRET_LENGTH),
            consumer: consumer.id,
            authorized: false,
            authorized_by: None,
            expiration: Utc::now().timestamp() + self.config.request_token_ttl,
        };
        self.tokens.put_request_token(token.clone()).await?;
        debug!(consumer = consumer.id, "issued request token");
        Ok(token)
    }

    /// The out-of-band approval step: flips a live request token to
    /// authorized on behalf of `principal`.
    #[instrument(skip(self))]
    pub async fn authorize_request_token(
        &self,
        key: &str,
        principal: u64,
    ) -> Result<(), OAuthError> {
        let token = self.live_request_token(key).await?;
        self.tokens
            .set_request_token_authorized(&token.key, principal)
            .await
    }

    /// Exchanges an authorized request token for an access token. The
    /// request token is consumed atomically, so of any number of concurrent
    /// exchanges exactly one succeeds.
    #[instrument(skip(self, request))]
    pub async fn exchange_request_token(
        &self,
        request: &Request,
    ) -> Result<AccessToken, OAuthError> {
        let params = collect_oauth_params(request)
            .ok_or_else(|| OAuthError::MissingParameter("oauth_consumer_key".to_string()))?;
        let consumer = self.resolve_consumer(&params).await?;
        let token_key = params
            .get("oauth_token")
            .ok_or_else(|| OAuthError::MissingParameter("oauth_token".to_string()))?;
        let token = self.live_request_token(token_key).await?;
        if token.consumer != consumer.id {
            return Err(OAuthError::ConsumerMismatch);
        }
        if !token.authorized {
            return Err(OAuthError::UnauthorizedToken);
        }
        self.check_signature(request, &params, &consumer)?;
        let principal = token.authorized_by.ok_or(OAuthError::UnauthorizedToken)?;
        self.check_params_timestamp_and_nonce(&params, principal)
            .await?;
        let token = self
            .tokens
            .take_request_token(token_key)
            .await?
            .ok_or(OAuthError::InvalidToken)?;
        let access = AccessToken {
            key: generate_key(TOKEN_KEY_LENGTH),
            secret: generate_secret(SECRET_LENGTH),
            consumer: consumer.id,
            principal: token.authorized_by.ok_or(OAuthError::UnauthorizedToken)?,
        };
        self.tokens.put_access_token(access.clone()).await?;
        debug!(consumer = consumer.id, principal, "issued access token");
        Ok(access)
    }

    /// Revokes an access token; fails with `InvalidToken` if it is unknown.
    #[instrument(skip(self))]
    pub async fn revoke_access_token(&self, key: &str) -> Result<(), OAuthError> {
        self.tokens.delete_access_token(key).await
    }

    /// Verifies a timestamp against the replay window (boundary inclusive)
    /// and records the nonce in the principal's ledger.
    pub async fn check_timestamp_and_nonce(
        &self,
        principal: u64,
        timestamp: i64,
        nonce: &str,
    ) -> Result<(), OAuthError> {
        let now = Utc::now().timestamp();
        if (now - timestamp).abs() > self.config.replay_window {
            return Err(OAuthError::InvalidTimestamp);
        }
        self.nonces
            .check_and_record(
                &principal.to_string(),
                timestamp,
                nonce,
                self.config.replay_window,
            )
            .await
    }

    /// Fetches a request token, lazily deleting it if it has expired.
    async fn live_request_token(&self, key: &str) -> Result<RequestToken, OAuthError> {
        let token = self
            .tokens
            .get_request_token(key)
            .await?
            .ok_or(OAuthError::InvalidToken)?;
        if Utc::now().timestamp() > token.expiration {
            self.tokens.delete_request_token(key).await?;
            return Err(OAuthError::ExpiredToken);
        }
        Ok(token)
    }

    async fn resolve_consumer(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<Consumer, OAuthError> {
        let key = params
            .get("oauth_consumer_key")
            .ok_or_else(|| OAuthError::MissingParameter("oauth_consumer_key".to_string()))?;
        self.lookup_consumer(key).await
    }

    /// Rebuilds the signed parameter set and verifies the supplied
    /// signature against the consumer secret.
    fn check_signature(
        &self,
        request: &Request,
        params: &HashMap<String, String>,
        consumer: &Consumer,
    ) -> Result<(), OAuthError> {
        let supplied = params
            .get("oauth_signature")
            .ok_or_else(|| OAuthError::MissingParameter("oauth_signature".to_string()))?;
        let method_name = params
            .get("oauth_signature_method")
            .ok_or_else(|| OAuthError::MissingParameter("oauth_signature_method".to_string()))?;
        let signature_method = SignatureMethod::from_string(method_name)?;
        let mut signed: HashMap<String, String> = match request.method() {
            HttpMethod::POST | HttpMethod::PUT | HttpMethod::PATCH => {
                request.body_params().clone()
            }
            _ => request.query_params().clone(),
        };
        for (key, value) in params {
            signed.insert(key.clone(), value.clone());
        }
        signed.remove("oauth_signature");
        let base_url = format!("{}{}", self.config.base_url, request.path());
        signature::verify(
            request.method(),
            &base_url,
            &signed,
            signature_method,
            &consumer.secret,
            supplied,
        )
    }

    async fn check_params_timestamp_and_nonce(
        &self,
        params: &HashMap<String, String>,
        principal: u64,
    ) -> Result<(), OAuthError> {
        let timestamp: i64 = params
            .get("oauth_timestamp")
            .ok_or_else(|| OAuthError::MissingParameter("oauth_timestamp".to_string()))?
            .parse()
            .map_err(|_| OAuthError::InvalidTimestamp)?;
        let nonce = params
            .get("oauth_nonce")
            .ok_or_else(|| OAuthError::MissingParameter("oauth_nonce".to_string()))?;
        self.check_timestamp_and_nonce(principal, timestamp, nonce)
            .await
    }

    /// Full verification of a signed API call: consumer, access token,
    /// signature, then timestamp and nonce against the token's principal.
    async fn authenticate_request(&self, request: &Request) -> Result<Principal, OAuthError> {
        let params = collect_oauth_params(request)
            .ok_or_else(|| OAuthError::MissingParameter("oauth_consumer_key".to_string()))?;
        let consumer = self.resolve_consumer(&params).await?;
        let token_key = params
            .get("oauth_token")
            .ok_or_else(|| OAuthError::MissingParameter("oauth_token".to_string()))?;
        let token = self
            .tokens
            .get_access_token(token_key)
            .await?
            .ok_or(OAuthError::InvalidToken)?;
        if token.consumer != consumer.id {
            return Err(OAuthError::ConsumerMismatch);
        }
        self.check_signature(request, &params, &consumer)?;
        self.check_params_timestamp_and_nonce(&params, token.principal)
            .await?;
        Ok(Principal::new(token.principal))
    }
}

impl Default for OAuth1Provider {
    fn default() -> Self {
        OAuth1Provider::new()
    }
}

#[async_trait]
impl Authenticator for OAuth1Provider {
    async fn authenticate(&self, request: &Request, prior: AuthOutcome) -> AuthOutcome {
        if prior.is_settled() {
            return prior;
        }
        // The token endpoints verify their own credentials in the handler.
        let path = request.path();
        if path == self.config.request_endpoint || path == self.config.access_endpoint {
            return AuthOutcome::Pass;
        }
        if collect_oauth_params(request).is_none() {
            return AuthOutcome::Pass;
        }
        match self.authenticate_request(request).await {
            Ok(principal) => AuthOutcome::Success(principal),
            Err(err) => AuthOutcome::Failure(err.into()),
        }
    }
}
