//! The authentication provider chain run ahead of dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::http::request::Request;

/// The authenticated identity on whose behalf a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: u64,
}

impl Principal {
    pub fn new(id: u64) -> Self {
        Principal { id }
    }
}

/// The outcome an authenticator hands to the next one in the chain.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    /// The authenticator did not attempt to authenticate this request.
    Pass,
    /// Credentials were presented and verified.
    Success(Principal),
    /// Credentials were presented and rejected; terminal for the request.
    Failure(ApiError),
}

impl AuthOutcome {
    /// Whether a later authenticator must return this outcome unchanged.
    pub fn is_settled(&self) -> bool {
        !matches!(self, AuthOutcome::Pass)
    }
}

/// A pluggable authenticator.
///
/// Every authenticator in the chain is invoked on every request and receives
/// the prior outcome; if that outcome is already settled it must be returned
/// unchanged, so only one authenticator ever performs work per request.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    async fn authenticate(&self, request: &Request, prior: AuthOutcome) -> AuthOutcome;
}

/// An ordered chain of authenticators, run before dispatch.
pub struct AuthChain {
    entries: Vec<(i32, Arc<dyn Authenticator>)>,
}

impl AuthChain {
    pub fn new() -> Self {
        AuthChain {
            entries: Vec::new(),
        }
    }

    /// Registers an authenticator at the given priority. Lower priorities run
    /// first; equal priorities keep registration order.
    pub fn add(&mut self, priority: i32, authenticator: Arc<dyn Authenticator>) {
        self.entries.push((priority, authenticator));
        self.entries.sort_by_key(|(priority, _)| *priority);
    }

    /// Runs the chain. The first `Failure` aborts the request with that
    /// error, a `Success` authenticates it, and all-`Pass` leaves the request
    /// anonymous.
    pub async fn run(&self, request: &Request) -> AuthOutcome {
        let mut outcome = AuthOutcome::Pass;
        for (priority, authenticator) in &self.entries {
            outcome = authenticator.authenticate(request, outcome).await;
            if let AuthOutcome::Failure(err) = &outcome {
                debug!(priority, error_code = err.code(), "authenticator rejected request");
            }
        }
        outcome
    }
}

impl Default for AuthChain {
    fn default() -> Self {
        AuthChain::new()
    }
}
