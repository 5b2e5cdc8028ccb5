//! OAuth 1.0a authentication provider for the quill REST core.
//!
//! The crate covers the full three-legged flow: consumer registration,
//! request-token issuance, out-of-band authorization, access-token exchange
//! and per-request signature verification, with pluggable storage behind
//! async traits and in-memory defaults.

pub mod endpoints;
pub mod header;
pub mod keys;
pub mod memory;
pub mod provider;
pub mod signature;
pub mod store;
pub mod types;

pub use endpoints::register_routes;
pub use header::{collect_oauth_params, parse_authorization_header};
pub use memory::{InMemoryConsumerStore, InMemoryNonceStore, InMemoryTokenStore};
pub use provider::{OAuth1Config, OAuth1Provider};
pub use signature::SignatureMethod;
pub use store::{ConsumerStore, NonceStore, TokenStore};
pub use types::{AccessToken, Consumer, OAuthError, RequestToken};
