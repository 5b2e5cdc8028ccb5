//! Token endpoint handlers and their route registration.

use std::sync::Arc;

use quill_core::error::ApiError;
use quill_core::http::method::MethodSet;
use quill_core::http::request::Request;
use quill_core::http::response::response_templates::form_response;
use quill_core::http::status::StatusCode;
use quill_core::router::{Endpoint, RouteTable};
use quill_core::urlenc::rfc3986_encode;

use crate::provider::OAuth1Provider;

/// Renders a token grant as a form-encoded body with RFC 3986 escaping.
pub fn grant_body(key: &str, secret: &str) -> String {
    format!(
        "oauth_token={}&oauth_token_secret={}",
        rfc3986_encode(key),
        rfc3986_encode(secret)
    )
}

/// Registers the POST-only request-token and access-token endpoints at the
/// provider's configured paths.
pub fn register_routes(
    provider: Arc<OAuth1Provider>,
    table: &mut RouteTable,
) -> Result<(), ApiError> {
    let request_path = provider.config().request_endpoint.clone();
    let access_path = provider.config().access_endpoint.clone();

    let issuer = provider.clone();
    table.register(
        &regex::escape(&request_path),
        vec![Endpoint::new(
            move |request: Request| {
                let issuer = issuer.clone();
                async move {
                    let token = issuer
                        .issue_request_token(&request)
                        .await
                        .map_err(ApiError::from)?;
                    Ok(form_response(
                        StatusCode::OK,
                        grant_body(&token.key, &token.secret),
                    ))
                }
            },
            MethodSet::POST,
        )],
    )?;

    let exchanger = provider;
    table.register(
        &regex::escape(&access_path),
        vec![Endpoint::new(
            move |request: Request| {
                let exchanger = exchanger.clone();
                async move {
                    let token = exchanger
                        .exchange_request_token(&request)
                        .await
                        .map_err(ApiError::from)?;
                    Ok(form_response(
                        StatusCode::OK,
                        grant_body(&token.key, &token.secret),
                    ))
                }
            },
            MethodSet::POST,
        )],
    )
}
