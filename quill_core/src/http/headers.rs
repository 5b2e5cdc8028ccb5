use std::collections::HashMap;

/// A value for an HTTP header, either a single string or multiple values.
///
/// Most headers combine multiple values with commas; `Link` headers keep
/// separate entries so each relation is emitted as its own header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Single(String),
    Multiple(Vec<String>),
}

impl HeaderValue {
    pub fn new<T: Into<String>>(value: T) -> Self {
        HeaderValue::Single(value.into())
    }

    /// Appends a value, converting a single entry into a multiple one.
    pub fn append<T: Into<String>>(&mut self, value: T) {
        match self {
            HeaderValue::Single(s) => {
                *self = HeaderValue::Multiple(vec![std::mem::take(s), value.into()]);
            }
            HeaderValue::Multiple(v) => v.push(value.into()),
        }
    }

    /// Joins the value(s) with the given separator.
    pub fn join(&self, sep: &str) -> String {
        match self {
            HeaderValue::Single(s) => s.clone(),
            HeaderValue::Multiple(v) => v.join(sep),
        }
    }

    /// The individual entries, one per header line for multi-valued headers.
    pub fn entries(&self) -> Vec<&str> {
        match self {
            HeaderValue::Single(s) => vec![s.as_str()],
            HeaderValue::Multiple(v) => v.iter().map(|s| s.as_str()).collect(),
        }
    }
}

/// Canonicalizes a header name: lowercased with dashes folded to underscores,
/// so `Content-Type`, `content-type` and `CONTENT_TYPE` all collide.
pub fn canonical_header_name(name: &str) -> String {
    name.to_ascii_lowercase().replace('-', "_")
}

/// A header map keyed by canonical names.
pub type HeaderMap = HashMap<String, HeaderValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalization_folds_case_and_dashes() {
        assert_eq!(canonical_header_name("Content-Type"), "content_type");
        assert_eq!(canonical_header_name("CONTENT_TYPE"), "content_type");
        assert_eq!(canonical_header_name("X-WP-Total"), "x_wp_total");
    }

    #[test]
    fn append_promotes_to_multiple() {
        let mut value = HeaderValue::new("text/html");
        value.append("application/json");
        assert_eq!(value.join(","), "text/html,application/json");
        assert_eq!(value.entries().len(), 2);
    }
}
