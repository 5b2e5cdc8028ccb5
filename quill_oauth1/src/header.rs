//! The `Authorization: OAuth ...` header grammar.

use std::collections::HashMap;

use lazy_static::lazy_static;
use quill_core::http::method::HttpMethod;
use quill_core::http::request::Request;
use quill_core::urlenc::url_decode;
use regex::Regex;

lazy_static! {
    static ref OAUTH_KEY_RE: Regex = Regex::new(r"^oauth_[a-z_-]*$").unwrap();
}

/// Parses an `Authorization` header into its OAuth parameters.
///
/// Returns `None` when the `OAuth ` prefix is missing, which means "not an
/// OAuth request" rather than an error. The body is comma-separated
/// `key="value"` or `key=value` pairs; only keys matching `oauth_[a-z_-]*`
/// are kept, a `realm` parameter is recognized and discarded, and values are
/// URL-decoded.
pub fn parse_authorization_header(header: &str) -> Option<HashMap<String, String>> {
    let trimmed = header.trim_start();
    let bytes = trimmed.as_bytes();
    if bytes.len() < 6 || !bytes[..5].eq_ignore_ascii_case(b"oauth") || bytes[5] != b' ' {
        return None;
    }
    let rest = &trimmed[6..];
    let mut params = HashMap::new();
    for part in rest.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key == "realm" {
            continue;
        }
        if !OAUTH_KEY_RE.is_match(key) {
            continue;
        }
        let value = value.trim().trim_matches('"');
        params.insert(key.to_string(), url_decode(value));
    }
    Some(params)
}

/// Collects the OAuth protocol parameters for a request.
///
/// The `Authorization` header wins; equivalent `oauth_*` query or body
/// parameters are the fallback. Returns `None` when the request carries no
/// OAuth credentials at all.
pub fn collect_oauth_params(request: &Request) -> Option<HashMap<String, String>> {
    let mut params: HashMap<String, String> = HashMap::new();
    let buckets: [&HashMap<String, String>; 2] = match request.method() {
        HttpMethod::POST | HttpMethod::PUT | HttpMethod::PATCH => {
            [request.query_params(), request.body_params()]
        }
        _ => [request.url_params(), request.query_params()],
    };
    for bucket in buckets {
        for (key, value) in bucket {
            if OAUTH_KEY_RE.is_match(key) {
                params.insert(key.clone(), value.clone());
            }
        }
    }
    let header_params = request
        .get_header("authorization")
        .and_then(|value| parse_authorization_header(&value));
    if let Some(header_params) = header_params {
        params.extend(header_params);
    } else if !params.contains_key("oauth_consumer_key") {
        return None;
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_prefix_is_required() {
        assert!(parse_authorization_header("Bearer abc").is_none());
        assert!(parse_authorization_header("OAuthish oauth_nonce=1").is_none());
    }

    #[test]
    fn quoted_and_bare_values_both_parse() {
        let params = parse_authorization_header(
            r#"OAuth oauth_consumer_key="abc123", oauth_nonce=xyz, oauth_timestamp="123""#,
        )
        .unwrap();
        assert_eq!(params["oauth_consumer_key"], "abc123");
        assert_eq!(params["oauth_nonce"], "xyz");
        assert_eq!(params["oauth_timestamp"], "123");
    }

    #[test]
    fn realm_is_recognized_and_discarded() {
        let params = parse_authorization_header(
            r#"OAuth realm="api", oauth_consumer_key="abc123""#,
        )
        .unwrap();
        assert!(!params.contains_key("realm"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn values_are_url_decoded() {
        let params = parse_authorization_header(
            r#"OAuth oauth_signature="a%2Bb%3D""#,
        )
        .unwrap();
        assert_eq!(params["oauth_signature"], "a+b=");
    }

    #[test]
    fn non_oauth_keys_are_ignored() {
        let params = parse_authorization_header(
            r#"OAuth oauth_nonce="n", version="1.0", OAUTH_TOKEN="shout""#,
        )
        .unwrap();
        assert_eq!(params.len(), 1);
        assert!(params.contains_key("oauth_nonce"));
    }
}
