//! Percent-encoding helpers shared by the dispatcher and the auth providers.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode, percent_encode};

/// RFC 3986 encode set: every character except unreserved
/// (ALPHA / DIGIT / "-" / "." / "_" / "~") is escaped.
const RFC3986_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Encodes a string with the RFC 3986 unreserved-character set and returns an
/// owned `String`.
///
/// # Example
/// ```
/// use quill_core::urlenc::rfc3986_encode;
/// assert_eq!(rfc3986_encode("a b&c"), "a%20b%26c");
/// ```
pub fn rfc3986_encode(input: &str) -> String {
    percent_encode(input.as_bytes(), RFC3986_SET).to_string()
}

/// Decodes a percent-encoded string and returns an owned `String`.
///
/// Invalid UTF-8 after decoding is replaced lossily rather than rejected.
pub fn url_decode(input: &str) -> String {
    percent_decode(input.as_bytes())
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreserved_characters_pass_through() {
        assert_eq!(rfc3986_encode("AZaz09-._~"), "AZaz09-._~");
    }

    #[test]
    fn reserved_characters_are_escaped() {
        assert_eq!(rfc3986_encode("k=v&x y"), "k%3Dv%26x%20y");
        assert_eq!(rfc3986_encode("http://a/b"), "http%3A%2F%2Fa%2Fb");
    }

    #[test]
    fn decode_reverses_encode() {
        let raw = "oauth token=+&/%";
        assert_eq!(url_decode(&rfc3986_encode(raw)), raw);
    }
}
