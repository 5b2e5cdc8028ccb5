use std::collections::HashMap;

use serde_json::{Map, Value};

use super::headers::{HeaderMap, HeaderValue, canonical_header_name};
use super::method::HttpMethod;
use crate::auth::Principal;

/// The parameter buckets a lookup may consult, in walk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// The parsed JSON body, consulted only for JSON requests on endpoints
    /// that opted in.
    Json,
    /// Form/body parameters, consulted only for editing methods.
    Body,
    /// Query-string parameters.
    Query,
    /// Parameters captured from the matched route pattern.
    Url,
}

const DEFAULT_PARAM_ORDER: [ParamSource; 4] = [
    ParamSource::Json,
    ParamSource::Body,
    ParamSource::Query,
    ParamSource::Url,
];

/// An incoming API request, normalized behind one parameter-lookup contract.
///
/// Headers are keyed by canonical names (see [`canonical_header_name`]), and
/// parameters live in four buckets walked in a configurable priority order.
pub struct Request {
    method: HttpMethod,
    path: String,
    headers: HeaderMap,
    url_params: HashMap<String, String>,
    query_params: HashMap<String, String>,
    body_params: HashMap<String, String>,
    body: Option<String>,
    /// Outer `None` means the body has not been parsed yet; inner `None`
    /// means parsing was attempted and produced no JSON object.
    json_cache: Option<Option<Map<String, Value>>>,
    accept_json: bool,
    matched_pattern: Option<String>,
    param_order: Vec<ParamSource>,
    principal: Option<Principal>,
}

impl Request {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Request {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            url_params: HashMap::new(),
            query_params: HashMap::new(),
            body_params: HashMap::new(),
            body: None,
            json_cache: None,
            accept_json: false,
            matched_pattern: None,
            param_order: DEFAULT_PARAM_ORDER.to_vec(),
            principal: None,
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn set_method(&mut self, method: HttpMethod) {
        self.method = method;
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Sets a header, replacing any previous value under the canonical name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers
            .insert(canonical_header_name(name), HeaderValue::new(value));
    }

    /// Adds a header value without replacing existing ones.
    pub fn add_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        self.headers
            .entry(canonical_header_name(name))
            .and_modify(|v| v.append(value.clone()))
            .or_insert_with(|| HeaderValue::new(value));
    }

    /// Returns the header values joined with `,`, or `None` if unset.
    pub fn get_header(&self, name: &str) -> Option<String> {
        self.headers
            .get(&canonical_header_name(name))
            .map(|v| v.join(","))
    }

    pub fn set_query_params(&mut self, params: HashMap<String, String>) {
        self.query_params = params;
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    pub fn set_body_params(&mut self, params: HashMap<String, String>) {
        self.body_params = params;
    }

    pub fn body_params(&self) -> &HashMap<String, String> {
        &self.body_params
    }

    pub fn set_url_params(&mut self, params: HashMap<String, String>) {
        self.url_params = params;
    }

    pub fn url_params(&self) -> &HashMap<String, String> {
        &self.url_params
    }

    /// Sets the raw body, invalidating any cached JSON parse.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = Some(body.into());
        self.json_cache = None;
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Whether the matched endpoint accepts a JSON parameter bucket.
    pub fn accept_json(&self) -> bool {
        self.accept_json
    }

    pub fn set_accept_json(&mut self, accept: bool) {
        self.accept_json = accept;
    }

    /// The raw pattern of the route this request matched, if dispatched.
    pub fn matched_pattern(&self) -> Option<&str> {
        self.matched_pattern.as_deref()
    }

    pub fn set_matched_pattern(&mut self, pattern: impl Into<String>) {
        self.matched_pattern = Some(pattern.into());
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn set_principal(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    /// Overrides the bucket walk order used by [`Request::get_param`].
    pub fn set_param_order(&mut self, order: Vec<ParamSource>) {
        self.param_order = order;
    }

    /// Whether the declared content type is exactly `application/json`.
    pub fn is_json_content_type(&self) -> bool {
        self.get_header("content-type").as_deref() == Some("application/json")
    }

    /// Lazily parses the raw body as a JSON object.
    ///
    /// Only consulted when the content type is exactly `application/json`.
    /// A parse failure is treated as "no JSON params", not an error.
    pub fn json_params(&mut self) -> Option<&Map<String, Value>> {
        if !self.is_json_content_type() {
            return None;
        }
        if self.json_cache.is_none() {
            let parsed = self
                .body
                .as_deref()
                .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
                .and_then(|value| match value {
                    Value::Object(map) => Some(map),
                    _ => None,
                });
            self.json_cache = Some(parsed);
        }
        match &self.json_cache {
            Some(Some(map)) => Some(map),
            _ => None,
        }
    }

    /// Walks the priority-ordered buckets and returns the first value found
    /// under `key`, or `None` when no bucket contains it.
    pub fn get_param(&mut self, key: &str) -> Option<Value> {
        for source in self.param_order.clone() {
            match source {
                ParamSource::Json => {
                    if !self.accept_json {
                        continue;
                    }
                    if let Some(map) = self.json_params() {
                        if let Some(value) = map.get(key) {
                            return Some(value.clone());
                        }
                    }
                }
                ParamSource::Body => {
                    if !matches!(
                        self.method,
                        HttpMethod::POST | HttpMethod::PUT | HttpMethod::PATCH
                    ) {
                        continue;
                    }
                    if let Some(value) = self.body_params.get(key) {
                        return Some(Value::String(value.clone()));
                    }
                }
                ParamSource::Query => {
                    if let Some(value) = self.query_params.get(key) {
                        return Some(Value::String(value.clone()));
                    }
                }
                ParamSource::Url => {
                    if let Some(value) = self.url_params.get(key) {
                        return Some(Value::String(value.clone()));
                    }
                }
            }
        }
        None
    }
}
