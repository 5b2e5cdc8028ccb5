//! The full three-legged flow against a provider with in-memory stores:
//! issuance, authorization, exchange and signed API calls.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use quill_core::urlenc::rfc3986_encode;
use quill_core::{AuthOutcome, Authenticator, HttpMethod, Principal, Request, RouteTable,
    StatusCode};
use quill_oauth1::signature::{self, SignatureMethod};
use quill_oauth1::types::{Consumer, OAuthError};
use quill_oauth1::{OAuth1Provider, register_routes};

fn base_oauth_params(consumer: &Consumer, nonce: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    params.insert("oauth_consumer_key".to_string(), consumer.key.clone());
    params.insert(
        "oauth_signature_method".to_string(),
        "HMAC-SHA1".to_string(),
    );
    params.insert(
        "oauth_timestamp".to_string(),
        Utc::now().timestamp().to_string(),
    );
    params.insert("oauth_nonce".to_string(), nonce.to_string());
    params
}

/// Builds a request carrying signed OAuth parameters in the body bucket for
/// editing methods and the query bucket otherwise.
fn signed_request(
    method: HttpMethod,
    path: &str,
    consumer: &Consumer,
    extra: &[(&str, &str)],
    nonce: &str,
) -> Request {
    let mut params = base_oauth_params(consumer, nonce);
    for (key, value) in extra {
        params.insert(key.to_string(), value.to_string());
    }
    let base_url = format!("http://localhost{}", path);
    let sig = signature::sign(
        method,
        &base_url,
        &params,
        SignatureMethod::HmacSha1,
        &consumer.secret,
    )
    .unwrap();
    params.insert("oauth_signature".to_string(), sig);
    let mut request = Request::new(method, path);
    match method {
        HttpMethod::POST | HttpMethod::PUT | HttpMethod::PATCH => request.set_body_params(params),
        _ => request.set_query_params(params),
    }
    request
}

/// Runs issuance, authorization and exchange, returning the access token
/// key for follow-up API calls.
async fn provision_access_token(
    provider: &OAuth1Provider,
    consumer: &Consumer,
    principal: u64,
) -> String {
    let request = signed_request(
        HttpMethod::POST,
        "/oauth1/request",
        consumer,
        &[],
        "nonce-issue",
    );
    let token = provider.issue_request_token(&request).await.unwrap();
    provider
        .authorize_request_token(&token.key, principal)
        .await
        .unwrap();
    let request = signed_request(
        HttpMethod::POST,
        "/oauth1/access",
        consumer,
        &[("oauth_token", &token.key)],
        "nonce-exchange",
    );
    let access = provider.exchange_request_token(&request).await.unwrap();
    access.key
}

#[tokio::test]
async fn three_legged_flow_yields_a_usable_access_token() {
    let provider = OAuth1Provider::new();
    let consumer = provider.register_consumer(10, None).await.unwrap();
    assert_eq!(consumer.key.len(), 12);
    assert_eq!(consumer.secret.len(), 48);

    let request = signed_request(HttpMethod::POST, "/oauth1/request", &consumer, &[], "n1");
    let token = provider.issue_request_token(&request).await.unwrap();
    assert_eq!(token.key.len(), 24);
    assert_eq!(token.secret.len(), 48);
    assert!(!token.authorized);
    assert_eq!(token.consumer, consumer.id);

    provider
        .authorize_request_token(&token.key, 42)
        .await
        .unwrap();

    let request = signed_request(
        HttpMethod::POST,
        "/oauth1/access",
        &consumer,
        &[("oauth_token", &token.key)],
        "n2",
    );
    let access = provider.exchange_request_token(&request).await.unwrap();
    assert_eq!(access.principal, 42);
    assert_eq!(access.consumer, consumer.id);
    assert_eq!(access.key.len(), 24);

    let api_call = signed_request(
        HttpMethod::GET,
        "/posts",
        &consumer,
        &[("oauth_token", &access.key)],
        "n3",
    );
    match provider.authenticate(&api_call, AuthOutcome::Pass).await {
        AuthOutcome::Success(principal) => assert_eq!(principal.id, 42),
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn exchange_consumes_the_request_token_exactly_once() {
    let provider = OAuth1Provider::new();
    let consumer = provider.register_consumer(10, None).await.unwrap();
    let key = provision_access_token(&provider, &consumer, 42).await;
    assert_eq!(key.len(), 24);

    // The request token is gone, so a replayed exchange cannot mint a
    // second grant.
    let replay = signed_request(
        HttpMethod::POST,
        "/oauth1/access",
        &consumer,
        &[("oauth_token", "gone")],
        "n-replay",
    );
    assert_eq!(
        provider.exchange_request_token(&replay).await.unwrap_err(),
        OAuthError::InvalidToken
    );
}

#[tokio::test]
async fn unauthorized_token_cannot_be_exchanged() {
    let provider = OAuth1Provider::new();
    let consumer = provider.register_consumer(10, None).await.unwrap();
    let request = signed_request(HttpMethod::POST, "/oauth1/request", &consumer, &[], "n1");
    let token = provider.issue_request_token(&request).await.unwrap();

    let request = signed_request(
        HttpMethod::POST,
        "/oauth1/access",
        &consumer,
        &[("oauth_token", &token.key)],
        "n2",
    );
    assert_eq!(
        provider.exchange_request_token(&request).await.unwrap_err(),
        OAuthError::UnauthorizedToken
    );
}

#[tokio::test]
async fn expired_request_token_is_deleted_on_first_use() {
    let provider = OAuth1Provider::new().request_token_ttl(-10);
    let consumer = provider.register_consumer(10, None).await.unwrap();
    let request = signed_request(HttpMethod::POST, "/oauth1/request", &consumer, &[], "n1");
    let token = provider.issue_request_token(&request).await.unwrap();

    assert_eq!(
        provider
            .authorize_request_token(&token.key, 42)
            .await
            .unwrap_err(),
        OAuthError::ExpiredToken
    );
    // Lazy expiry deleted the token, so the next lookup no longer sees it.
    assert_eq!(
        provider
            .authorize_request_token(&token.key, 42)
            .await
            .unwrap_err(),
        OAuthError::InvalidToken
    );
}

#[tokio::test]
async fn token_bound_to_another_consumer_is_rejected() {
    let provider = OAuth1Provider::new();
    let owner_consumer = provider.register_consumer(10, None).await.unwrap();
    let other_consumer = provider.register_consumer(11, None).await.unwrap();

    let request = signed_request(
        HttpMethod::POST,
        "/oauth1/request",
        &owner_consumer,
        &[],
        "n1",
    );
    let token = provider.issue_request_token(&request).await.unwrap();
    provider
        .authorize_request_token(&token.key, 42)
        .await
        .unwrap();

    let request = signed_request(
        HttpMethod::POST,
        "/oauth1/access",
        &other_consumer,
        &[("oauth_token", &token.key)],
        "n2",
    );
    assert_eq!(
        provider.exchange_request_token(&request).await.unwrap_err(),
        OAuthError::ConsumerMismatch
    );
}

#[tokio::test]
async fn timestamps_at_the_window_edge_pass_and_beyond_it_fail() {
    let provider = OAuth1Provider::new().replay_window(100);
    let now = Utc::now().timestamp();

    provider
        .check_timestamp_and_nonce(1, now - 100, "n1")
        .await
        .unwrap();
    provider
        .check_timestamp_and_nonce(1, now + 100, "n2")
        .await
        .unwrap();
    assert_eq!(
        provider
            .check_timestamp_and_nonce(1, now - 101, "n3")
            .await
            .unwrap_err(),
        OAuthError::InvalidTimestamp
    );
    assert_eq!(
        provider
            .check_timestamp_and_nonce(1, now + 101, "n4")
            .await
            .unwrap_err(),
        OAuthError::InvalidTimestamp
    );
}

#[tokio::test]
async fn nonce_reuse_within_the_window_is_rejected() {
    let provider = OAuth1Provider::new();
    let now = Utc::now().timestamp();

    provider
        .check_timestamp_and_nonce(1, now, "only-once")
        .await
        .unwrap();
    assert_eq!(
        provider
            .check_timestamp_and_nonce(1, now, "only-once")
            .await
            .unwrap_err(),
        OAuthError::NonceAlreadyUsed
    );
    // Another principal's ledger is unaffected.
    provider
        .check_timestamp_and_nonce(2, now, "only-once")
        .await
        .unwrap();
}

#[tokio::test]
async fn tampering_with_a_signed_parameter_breaks_the_signature() {
    let provider = OAuth1Provider::new();
    let consumer = provider.register_consumer(10, None).await.unwrap();
    let mut request = signed_request(HttpMethod::POST, "/oauth1/request", &consumer, &[], "n1");

    let mut params = request.body_params().clone();
    params.insert("injected".to_string(), "value".to_string());
    request.set_body_params(params);

    assert_eq!(
        provider.issue_request_token(&request).await.unwrap_err(),
        OAuthError::SignatureMismatch
    );
}

#[tokio::test]
async fn unsupported_signature_methods_are_rejected() {
    let provider = OAuth1Provider::new();
    let consumer = provider.register_consumer(10, None).await.unwrap();
    let mut request = signed_request(HttpMethod::POST, "/oauth1/request", &consumer, &[], "n1");

    let mut params = request.body_params().clone();
    params.insert(
        "oauth_signature_method".to_string(),
        "PLAINTEXT".to_string(),
    );
    request.set_body_params(params);

    assert_eq!(
        provider.issue_request_token(&request).await.unwrap_err(),
        OAuthError::InvalidSignatureMethod
    );
}

#[tokio::test]
async fn header_credentials_authenticate_like_query_credentials() {
    let provider = OAuth1Provider::new();
    let consumer = provider.register_consumer(10, None).await.unwrap();
    let access_key = provision_access_token(&provider, &consumer, 42).await;

    let mut params = base_oauth_params(&consumer, "n-header");
    params.insert("oauth_token".to_string(), access_key);
    let sig = signature::sign(
        HttpMethod::GET,
        "http://localhost/posts",
        &params,
        SignatureMethod::HmacSha1,
        &consumer.secret,
    )
    .unwrap();
    params.insert("oauth_signature".to_string(), sig);

    let header = format!(
        "OAuth {}",
        params
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"", key, rfc3986_encode(value)))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let mut request = Request::new(HttpMethod::GET, "/posts");
    request.set_header("Authorization", header);

    match provider.authenticate(&request, AuthOutcome::Pass).await {
        AuthOutcome::Success(principal) => assert_eq!(principal.id, 42),
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn authenticator_passes_on_unsigned_requests_and_its_own_endpoints() {
    let provider = OAuth1Provider::new();

    let anonymous = Request::new(HttpMethod::GET, "/posts");
    assert!(matches!(
        provider.authenticate(&anonymous, AuthOutcome::Pass).await,
        AuthOutcome::Pass
    ));

    let handshake = Request::new(HttpMethod::POST, "/oauth1/request");
    assert!(matches!(
        provider.authenticate(&handshake, AuthOutcome::Pass).await,
        AuthOutcome::Pass
    ));

    // A prior settled outcome travels through untouched.
    let prior = AuthOutcome::Success(Principal::new(5));
    match provider.authenticate(&anonymous, prior).await {
        AuthOutcome::Success(principal) => assert_eq!(principal.id, 5),
        other => panic!("expected the prior outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn signed_call_without_a_token_is_a_missing_parameter_failure() {
    let provider = OAuth1Provider::new();
    let consumer = provider.register_consumer(10, None).await.unwrap();
    let request = signed_request(HttpMethod::GET, "/posts", &consumer, &[], "n1");

    match provider.authenticate(&request, AuthOutcome::Pass).await {
        AuthOutcome::Failure(err) => {
            assert_eq!(err.code(), "json_oauth1_missing_parameter");
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn revoked_access_tokens_stop_authenticating() {
    let provider = OAuth1Provider::new();
    let consumer = provider.register_consumer(10, None).await.unwrap();
    let access_key = provision_access_token(&provider, &consumer, 42).await;

    provider.revoke_access_token(&access_key).await.unwrap();
    assert_eq!(
        provider.revoke_access_token(&access_key).await.unwrap_err(),
        OAuthError::InvalidToken
    );

    let request = signed_request(
        HttpMethod::GET,
        "/posts",
        &consumer,
        &[("oauth_token", &access_key)],
        "n-after-revoke",
    );
    match provider.authenticate(&request, AuthOutcome::Pass).await {
        AuthOutcome::Failure(err) => assert_eq!(err.code(), "json_oauth1_invalid_token"),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn token_endpoints_serve_form_encoded_grants() {
    let provider = Arc::new(OAuth1Provider::new());
    let consumer = provider.register_consumer(10, None).await.unwrap();
    let mut table = RouteTable::new();
    register_routes(provider.clone(), &mut table).unwrap();

    let request = signed_request(HttpMethod::POST, "/oauth1/request", &consumer, &[], "n1");
    let response = table.dispatch(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.get_header("Content-Type").as_deref(),
        Some("application/x-www-form-urlencoded")
    );
    let body = match response.body() {
        quill_core::Body::Text(text) => text.clone(),
        other => panic!("expected a form body, got {:?}", other),
    };
    assert!(body.starts_with("oauth_token="));
    assert!(body.contains("&oauth_token_secret="));

    // The endpoints are POST-only.
    let err = table
        .dispatch(Request::new(HttpMethod::GET, "/oauth1/request"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "json_no_route");
}
