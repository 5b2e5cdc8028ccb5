//! OAuth 1.0a core primitives: consumers, tokens and errors.

use quill_core::error::ApiError;
use quill_core::http::response::Response;
use quill_core::http::status::StatusCode;
use serde::{Deserialize, Serialize};

/// The type tag under which OAuth1 consumers are persisted.
pub const CONSUMER_KIND: &str = "oauth1";

/// A registered OAuth1 client identity.
///
/// Created by an administrative registration call; immutable except for
/// revocation. The key is unique within its kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consumer {
    pub id: u64,
    /// Public consumer key, 12 characters by default.
    pub key: String,
    /// Private consumer secret, 48 characters by default.
    pub secret: String,
    /// The principal who owns this consumer registration.
    pub owner: u64,
    /// Type tag, `"oauth1"` for this provider.
    pub kind: String,
}

/// A short-lived, pre-authorization credential initiating the handshake.
///
/// Mutated exactly once, when an external approval step flips `authorized`;
/// deleted on promotion to an [`AccessToken`] or lazily on first access
/// after expiration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestToken {
    /// Token key, 24 characters.
    pub key: String,
    /// Token secret, 48 characters.
    pub secret: String,
    /// Id of the consumer this token was issued to.
    pub consumer: u64,
    pub authorized: bool,
    /// The principal who approved this token, once authorized.
    pub authorized_by: Option<u64>,
    /// Absolute expiry as a unix timestamp.
    pub expiration: i64,
}

/// A long-lived credential used to sign authenticated API calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// Token key, 24 characters.
    pub key: String,
    /// Token secret, 48 characters.
    pub secret: String,
    /// Id of the consumer this token is bound to.
    pub consumer: u64,
    /// The principal on whose behalf this token acts.
    pub principal: u64,
}

/// OAuth1 verification and lifecycle error kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OAuthError {
    /// A required protocol parameter was not supplied.
    MissingParameter(String),
    /// The signature method is neither HMAC-SHA1 nor HMAC-SHA256.
    InvalidSignatureMethod,
    /// The supplied signature does not match the expected HMAC.
    SignatureMismatch,
    /// The timestamp falls outside the replay window.
    InvalidTimestamp,
    /// The nonce was already used within the replay window.
    NonceAlreadyUsed,
    /// No consumer is registered under the supplied key.
    ConsumerNotFound,
    /// The token is bound to a different consumer than the one claimed.
    ConsumerMismatch,
    /// The request token passed its expiration.
    ExpiredToken,
    /// The request token has not been approved yet.
    UnauthorizedToken,
    /// No such token.
    InvalidToken,
    /// Parameter normalization could not establish a deterministic order.
    ParameterSortError,
    /// Underlying store failure, with description.
    StoreFailure(String),
}

impl OAuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            OAuthError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            OAuthError::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            OAuthError::MissingParameter(_) => "json_oauth1_missing_parameter",
            OAuthError::InvalidSignatureMethod => "json_oauth1_invalid_signature_method",
            OAuthError::SignatureMismatch => "json_oauth1_signature_mismatch",
            OAuthError::InvalidTimestamp => "json_oauth1_invalid_timestamp",
            OAuthError::NonceAlreadyUsed => "json_oauth1_nonce_already_used",
            OAuthError::ConsumerNotFound => "json_oauth1_consumer_not_found",
            OAuthError::ConsumerMismatch => "json_oauth1_consumer_mismatch",
            OAuthError::ExpiredToken => "json_oauth1_expired_token",
            OAuthError::UnauthorizedToken => "json_oauth1_unauthorized_token",
            OAuthError::InvalidToken => "json_oauth1_invalid_token",
            OAuthError::ParameterSortError => "json_oauth1_parameter_sort_error",
            OAuthError::StoreFailure(_) => "json_oauth1_store_failure",
        }
    }

    pub fn description(&self) -> String {
        match self {
            OAuthError::MissingParameter(name) => {
                format!("Missing OAuth parameter {}", name)
            }
            OAuthError::InvalidSignatureMethod => {
                "Signature method must be HMAC-SHA1 or HMAC-SHA256".to_string()
            }
            OAuthError::SignatureMismatch => "OAuth signature does not match".to_string(),
            OAuthError::InvalidTimestamp => {
                "OAuth timestamp is outside the allowed window".to_string()
            }
            OAuthError::NonceAlreadyUsed => "OAuth nonce was already used".to_string(),
            OAuthError::ConsumerNotFound => "Consumer key is invalid".to_string(),
            OAuthError::ConsumerMismatch => {
                "Token is not issued to this consumer".to_string()
            }
            OAuthError::ExpiredToken => "OAuth request token has expired".to_string(),
            OAuthError::UnauthorizedToken => {
                "OAuth request token has not been authorized".to_string()
            }
            OAuthError::InvalidToken => "Invalid OAuth token".to_string(),
            OAuthError::ParameterSortError => {
                "Could not establish a deterministic parameter order".to_string()
            }
            OAuthError::StoreFailure(err) => format!("Store failure: {}", err),
        }
    }

    /// Converts this error into an HTTP JSON response with proper status.
    pub fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

impl From<OAuthError> for ApiError {
    fn from(err: OAuthError) -> Self {
        ApiError::new(err.code(), err.description(), err.status())
    }
}

impl std::fmt::Display for OAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}

impl std::error::Error for OAuthError {}
