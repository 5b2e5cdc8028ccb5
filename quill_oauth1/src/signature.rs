//! Canonical base-string construction and HMAC signature verification.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quill_core::http::method::HttpMethod;
use quill_core::urlenc::{rfc3986_encode, url_decode};
use ring::{constant_time, hmac};

use crate::types::OAuthError;

/// The signature methods this provider accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureMethod {
    HmacSha1,
    HmacSha256,
}

impl SignatureMethod {
    pub fn from_string(method: &str) -> Result<Self, OAuthError> {
        match method {
            "HMAC-SHA1" => Ok(SignatureMethod::HmacSha1),
            "HMAC-SHA256" => Ok(SignatureMethod::HmacSha256),
            _ => Err(OAuthError::InvalidSignatureMethod),
        }
    }

    fn algorithm(&self) -> hmac::Algorithm {
        match self {
            SignatureMethod::HmacSha1 => hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
            SignatureMethod::HmacSha256 => hmac::HMAC_SHA256,
        }
    }
}

impl std::fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureMethod::HmacSha1 => write!(f, "HMAC-SHA1"),
            SignatureMethod::HmacSha256 => write!(f, "HMAC-SHA256"),
        }
    }
}

/// Builds the canonical signature base string.
///
/// Every parameter key and value is URL-decoded once and then RFC 3986
/// encoded, which is idempotent for already-encoded input and mandatory for
/// un-encoded input. Pairs are sorted byte-wise by key and joined in the
/// doubly-encoded `key%3Dvalue%26...` form; the base string joins the
/// uppercased method, the encoded base URL and that query string with
/// literal `&`.
pub fn build_base_string(
    method: HttpMethod,
    base_url: &str,
    params: &HashMap<String, String>,
) -> Result<String, OAuthError> {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(key, value)| {
            (
                rfc3986_encode(&url_decode(key)),
                rfc3986_encode(&url_decode(value)),
            )
        })
        .collect();
    pairs.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    // Two distinct raw keys can normalize to the same encoded key, which
    // leaves the relative order of their values undefined.
    if pairs.windows(2).any(|pair| pair[0].0 == pair[1].0) {
        return Err(OAuthError::ParameterSortError);
    }
    let query_string = pairs
        .iter()
        .map(|(key, value)| format!("{}%3D{}", key, value))
        .collect::<Vec<_>>()
        .join("%26");
    Ok(format!(
        "{}&{}&{}",
        method.to_string().to_uppercase(),
        rfc3986_encode(base_url),
        query_string
    ))
}

/// Computes `base64(HMAC(method, base_string, secret))` over the given
/// request. `params` must not contain `oauth_signature`.
pub fn sign(
    method: HttpMethod,
    base_url: &str,
    params: &HashMap<String, String>,
    signature_method: SignatureMethod,
    secret: &str,
) -> Result<String, OAuthError> {
    let base_string = build_base_string(method, base_url, params)?;
    let key = hmac::Key::new(signature_method.algorithm(), secret.as_bytes());
    let tag = hmac::sign(&key, base_string.as_bytes());
    Ok(STANDARD.encode(tag.as_ref()))
}

/// Verifies a supplied signature against the expected HMAC in constant
/// time.
pub fn verify(
    method: HttpMethod,
    base_url: &str,
    params: &HashMap<String, String>,
    signature_method: SignatureMethod,
    secret: &str,
    supplied: &str,
) -> Result<(), OAuthError> {
    let expected = sign(method, base_url, params, signature_method, secret)?;
    constant_time::verify_slices_are_equal(expected.as_bytes(), supplied.as_bytes())
        .map_err(|_| OAuthError::SignatureMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn base_string_sorts_and_double_encodes() {
        let base = build_base_string(
            HttpMethod::GET,
            "http://api.local/posts",
            &params(&[("b", "2"), ("a", "1")]),
        )
        .unwrap();
        assert_eq!(base, "GET&http%3A%2F%2Fapi.local%2Fposts&a%3D1%26b%3D2");
    }

    #[test]
    fn normalization_is_idempotent_for_encoded_input() {
        let plain = build_base_string(
            HttpMethod::GET,
            "http://api.local/posts",
            &params(&[("q", "a b")]),
        )
        .unwrap();
        let pre_encoded = build_base_string(
            HttpMethod::GET,
            "http://api.local/posts",
            &params(&[("q", "a%20b")]),
        )
        .unwrap();
        assert_eq!(plain, pre_encoded);
    }

    #[test]
    fn colliding_normalized_keys_are_rejected() {
        let err = build_base_string(
            HttpMethod::GET,
            "http://api.local/posts",
            &params(&[("a b", "1"), ("a%20b", "2")]),
        )
        .unwrap_err();
        assert_eq!(err, OAuthError::ParameterSortError);
    }

    #[test]
    fn unknown_signature_method_is_rejected() {
        assert_eq!(
            SignatureMethod::from_string("PLAINTEXT").unwrap_err(),
            OAuthError::InvalidSignatureMethod
        );
        assert_eq!(
            SignatureMethod::from_string("hmac-sha1").unwrap_err(),
            OAuthError::InvalidSignatureMethod
        );
    }

    #[test]
    fn verify_accepts_its_own_signature() {
        let params = params(&[("oauth_consumer_key", "abc"), ("oauth_nonce", "n1")]);
        for method in [SignatureMethod::HmacSha1, SignatureMethod::HmacSha256] {
            let sig = sign(
                HttpMethod::POST,
                "http://api.local/oauth1/request",
                &params,
                method,
                "secret",
            )
            .unwrap();
            verify(
                HttpMethod::POST,
                "http://api.local/oauth1/request",
                &params,
                method,
                "secret",
                &sig,
            )
            .unwrap();
        }
    }

    #[test]
    fn a_corrupted_signature_is_rejected() {
        let params = params(&[("oauth_consumer_key", "abc")]);
        let sig = sign(
            HttpMethod::GET,
            "http://api.local/posts",
            &params,
            SignatureMethod::HmacSha1,
            "secret",
        )
        .unwrap();
        let mut corrupted = sig.into_bytes();
        corrupted[0] ^= 1;
        let corrupted = String::from_utf8(corrupted).unwrap();
        assert_eq!(
            verify(
                HttpMethod::GET,
                "http://api.local/posts",
                &params,
                SignatureMethod::HmacSha1,
                "secret",
                &corrupted,
            )
            .unwrap_err(),
            OAuthError::SignatureMismatch
        );
    }
}
