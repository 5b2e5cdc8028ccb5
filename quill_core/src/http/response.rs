use serde::Serialize;
use serde_json::Value;

use super::headers::{HeaderMap, HeaderValue, canonical_header_name};
use super::status::StatusCode;

/// Response payload variants.
///
/// JSON covers every API resource; text carries form-encoded token grants.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Text(String),
}

/// An outgoing response envelope: status code, header multimap and payload.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
}

impl Response {
    pub fn new() -> Self {
        Response {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Body::Empty,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Sets a header. With `replace = false` an existing value is kept and the
    /// new one appended with a `, ` separator; `Link` headers always
    /// accumulate as separate RFC 5988 entries and are never overwritten.
    pub fn header(&mut self, name: &str, value: impl Into<String>, replace: bool) {
        let key = canonical_header_name(name);
        let value = value.into();
        if key == "link" {
            self.headers
                .entry(key)
                .and_modify(|v| v.append(value.clone()))
                .or_insert_with(|| HeaderValue::new(value));
            return;
        }
        if replace {
            self.headers.insert(key, HeaderValue::new(value));
        } else {
            match self.headers.get_mut(&key) {
                Some(existing) => {
                    let joined = format!("{}, {}", existing.join(", "), value);
                    *existing = HeaderValue::new(joined);
                }
                None => {
                    self.headers.insert(key, HeaderValue::new(value));
                }
            }
        }
    }

    /// Returns the header values joined with `, `, or `None` if unset.
    pub fn get_header(&self, name: &str) -> Option<String> {
        self.headers
            .get(&canonical_header_name(name))
            .map(|v| v.join(", "))
    }

    /// Individual entries for a header, one per emitted line.
    pub fn header_entries(&self, name: &str) -> Vec<String> {
        self.headers
            .get(&canonical_header_name(name))
            .map(|v| v.entries().into_iter().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Adds an RFC 5988 `Link` header entry: `<target>; rel="…"; k="v"`.
    pub fn link_header(&mut self, rel: &str, target: &str, params: &[(&str, &str)]) {
        let mut entry = format!("<{}>; rel=\"{}\"", target, rel);
        for (key, value) in params {
            entry.push_str(&format!("; {}=\"{}\"", key, value));
        }
        self.header("Link", entry, false);
    }

    /// Emits pagination headers for a 1-indexed `page` out of `total_pages`:
    /// `X-WP-Total`, `X-WP-TotalPages` and `prev`/`next` Link relations,
    /// rewriting the `page` query parameter of `base_url` for each relation.
    pub fn query_navigation_headers(
        &mut self,
        page: u64,
        total: u64,
        total_pages: u64,
        base_url: &str,
    ) {
        self.header("X-WP-Total", total.to_string(), true);
        self.header("X-WP-TotalPages", total_pages.to_string(), true);
        if page > 1 {
            self.link_header("prev", &replace_page_param(base_url, page - 1), &[]);
        }
        if page < total_pages {
            self.link_header("next", &replace_page_param(base_url, page + 1), &[]);
        }
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Sets a JSON payload from any serializable value.
    ///
    /// Serialization recurses through the whole payload graph; `Serialize`
    /// itself guarantees the graph is acyclic.
    pub fn set_json<T: Serialize>(&mut self, data: &T) -> Result<(), serde_json::Error> {
        self.body = Body::Json(serde_json::to_value(data)?);
        Ok(())
    }

    pub fn set_text(&mut self, body: impl Into<String>) {
        self.body = Body::Text(body.into());
    }

    /// Renders the response in wire form: status line, header block, body.
    /// Multi-valued headers are emitted as repeated lines.
    pub fn to_bytes(&self) -> Vec<u8> {
        let body_bytes: Vec<u8> = match &self.body {
            Body::Empty => Vec::new(),
            Body::Json(value) => serde_json::to_vec(value).unwrap_or_default(),
            Body::Text(text) => text.clone().into_bytes(),
        };
        let mut out = format!("HTTP/1.1 {}\r\n", self.status).into_bytes();
        let mut names: Vec<&String> = self.headers.keys().collect();
        names.sort();
        for name in names {
            if let Some(value) = self.headers.get(name) {
                // Canonical names fold dashes to underscores; undo that on the wire.
                let wire_name = name.replace('_', "-");
                for entry in value.entries() {
                    out.extend_from_slice(format!("{}: {}\r\n", wire_name, entry).as_bytes());
                }
            }
        }
        out.extend_from_slice(format!("content-length: {}\r\n\r\n", body_bytes.len()).as_bytes());
        out.extend_from_slice(&body_bytes);
        out
    }
}

impl Default for Response {
    fn default() -> Self {
        Response::new()
    }
}

/// Removes any `page` query parameter from `url` and re-adds `page=<page>`.
fn replace_page_param(url: &str, page: u64) -> String {
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base, query),
        None => (url, ""),
    };
    let mut pairs: Vec<String> = query
        .split('&')
        .filter(|pair| !pair.is_empty() && *pair != "page" && !pair.starts_with("page="))
        .map(String::from)
        .collect();
    pairs.push(format!("page={}", page));
    format!("{}?{}", base, pairs.join("&"))
}

/// Helpers to build the common response shapes.
pub mod response_templates {
    use serde_json::Value;

    use super::super::status::StatusCode;
    use super::{Body, Response};

    pub fn json_response(status: StatusCode, value: Value) -> Response {
        let mut resp = Response::new();
        resp.set_status(status);
        resp.header("Content-Type", "application/json", true);
        resp.body = Body::Json(value);
        resp
    }

    pub fn form_response(status: StatusCode, body: String) -> Response {
        let mut resp = Response::new();
        resp.set_status(status);
        resp.header("Content-Type", "application/x-www-form-urlencoded", true);
        resp.set_text(body);
        resp
    }

    pub fn status_response(status: StatusCode) -> Response {
        let mut resp = Response::new();
        resp.set_status(status);
        resp
    }
}
