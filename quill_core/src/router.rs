//! The route table: ordered path patterns dispatched by method and regex.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::error::ApiError;
use crate::http::method::MethodSet;
use crate::http::request::Request;
use crate::http::response::Response;

/// A route callback. Implemented for any async closure taking the request.
pub trait Handler: Send + Sync + 'static {
    fn call(
        &self,
        request: Request,
    ) -> Pin<Box<dyn Future<Output = Result<Response, ApiError>> + Send>>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, ApiError>> + Send + 'static,
{
    fn call(
        &self,
        request: Request,
    ) -> Pin<Box<dyn Future<Output = Result<Response, ApiError>> + Send>> {
        Box::pin((self)(request))
    }
}

/// One handler entry under a route: callback, allowed methods and flags.
#[derive(Clone)]
pub struct Endpoint {
    callback: Option<Arc<dyn Handler>>,
    methods: MethodSet,
    accept_json: bool,
    hidden: bool,
}

impl Endpoint {
    pub fn new(callback: impl Handler, methods: MethodSet) -> Self {
        Endpoint {
            callback: Some(Arc::new(callback)),
            methods,
            accept_json: false,
            hidden: false,
        }
    }

    /// An endpoint registered without a callback; dispatching to it yields a
    /// 500-class error.
    pub fn placeholder(methods: MethodSet) -> Self {
        Endpoint {
            callback: None,
            methods,
            accept_json: false,
            hidden: false,
        }
    }

    /// Marks the endpoint as accepting a JSON parameter bucket.
    pub fn accept_json(mut self) -> Self {
        self.accept_json = true;
        self
    }

    /// Hides the endpoint from index listings.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }
}

struct Route {
    raw: String,
    pattern: Regex,
    endpoints: Vec<Endpoint>,
}

/// An ordered registry mapping path patterns to endpoint lists.
///
/// Iteration order is registration order, so callers must register more
/// specific routes before catch-alls.
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        RouteTable { routes: Vec::new() }
    }

    /// Appends a route. The pattern is compiled as a full-string,
    /// case-insensitive match; named capture groups become URL parameters.
    /// Duplicate patterns are permitted.
    pub fn register(&mut self, pattern: &str, endpoints: Vec<Endpoint>) -> Result<(), ApiError> {
        let compiled = RegexBuilder::new(&format!("\\A(?:{})\\z", pattern))
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                ApiError::new(
                    "json_route_invalid",
                    format!("Route pattern could not be compiled: {}", e),
                    crate::http::status::StatusCode::INTERNAL_SERVER_ERROR,
                )
            })?;
        self.routes.push(Route {
            raw: pattern.to_string(),
            pattern: compiled,
            endpoints,
        });
        Ok(())
    }

    /// Matches the request against the table and invokes the winning
    /// endpoint. The first endpoint whose route pattern matches the path and
    /// whose method set allows the request method short-circuits dispatch.
    pub async fn dispatch(&self, mut request: Request) -> Result<Response, ApiError> {
        for route in &self.routes {
            for endpoint in &route.endpoints {
                if !endpoint.methods.allows(request.method()) {
                    continue;
                }
                let captured = capture_url_params(&route.pattern, request.path());
                let Some(captured) = captured else {
                    continue;
                };
                debug!(pattern = %route.raw, method = %request.method(), "route matched");
                let mut params = request.url_params().clone();
                params.extend(captured);
                request.set_url_params(params);
                request.set_matched_pattern(&route.raw);
                request.set_accept_json(endpoint.accept_json);
                let Some(callback) = &endpoint.callback else {
                    return Err(ApiError::handler_not_callable());
                };
                return callback.call(request).await;
            }
        }
        Err(ApiError::no_route())
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        RouteTable::new()
    }
}

fn capture_url_params(pattern: &Regex, path: &str) -> Option<HashMap<String, String>> {
    let caps = pattern.captures(path)?;
    let mut params = HashMap::new();
    for name in pattern.capture_names().flatten() {
        if let Some(m) = caps.name(name) {
            params.insert(name.to_string(), m.as_str().to_string());
        }
    }
    Some(params)
}
