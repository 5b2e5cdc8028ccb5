use std::fmt;
use std::ops::BitOr;

/// HTTP request methods understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
    HEAD,
    OPTIONS,
    UNKNOWN,
}

impl HttpMethod {
    pub fn from_string(method: &str) -> Self {
        match method {
            "GET" => HttpMethod::GET,
            "POST" => HttpMethod::POST,
            "PUT" => HttpMethod::PUT,
            "PATCH" => HttpMethod::PATCH,
            "DELETE" => HttpMethod::DELETE,
            "HEAD" => HttpMethod::HEAD,
            "OPTIONS" => HttpMethod::OPTIONS,
            _ => HttpMethod::UNKNOWN,
        }
    }

    fn bit(&self) -> u16 {
        match self {
            HttpMethod::GET => 1 << 0,
            HttpMethod::POST => 1 << 1,
            HttpMethod::PUT => 1 << 2,
            HttpMethod::PATCH => 1 << 3,
            HttpMethod::DELETE => 1 << 4,
            HttpMethod::HEAD => 1 << 5,
            HttpMethod::OPTIONS => 1 << 6,
            HttpMethod::UNKNOWN => 0,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::UNKNOWN => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// A set of allowed HTTP methods for a registered endpoint, stored as a bitmask.
///
/// Sets compose with `|`, so `MethodSet::GET | MethodSet::POST` allows both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MethodSet(u16);

impl MethodSet {
    pub const NONE: MethodSet = MethodSet(0);
    pub const GET: MethodSet = MethodSet(1 << 0);
    pub const POST: MethodSet = MethodSet(1 << 1);
    pub const PUT: MethodSet = MethodSet(1 << 2);
    pub const PATCH: MethodSet = MethodSet(1 << 3);
    pub const DELETE: MethodSet = MethodSet(1 << 4);
    pub const HEAD: MethodSet = MethodSet(1 << 5);
    pub const OPTIONS: MethodSet = MethodSet(1 << 6);

    /// Methods that read a resource.
    pub const READABLE: MethodSet = MethodSet(Self::GET.0 | Self::HEAD.0);
    /// Methods that create or modify a resource.
    pub const EDITABLE: MethodSet = MethodSet(Self::POST.0 | Self::PUT.0 | Self::PATCH.0);
    /// Every method the dispatcher knows about.
    pub const ALL: MethodSet = MethodSet(
        Self::READABLE.0 | Self::EDITABLE.0 | Self::DELETE.0 | Self::OPTIONS.0,
    );

    pub fn single(method: HttpMethod) -> Self {
        MethodSet(method.bit())
    }

    pub fn allows(&self, method: HttpMethod) -> bool {
        let bit = method.bit();
        bit != 0 && self.0 & bit == bit
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for MethodSet {
    type Output = MethodSet;

    fn bitor(self, rhs: MethodSet) -> MethodSet {
        MethodSet(self.0 | rhs.0)
    }
}

impl From<HttpMethod> for MethodSet {
    fn from(method: HttpMethod) -> Self {
        MethodSet::single(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_round_trip() {
        for name in ["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"] {
            assert_eq!(HttpMethod::from_string(name).to_string(), name);
        }
        assert_eq!(HttpMethod::from_string("BREW"), HttpMethod::UNKNOWN);
    }

    #[test]
    fn method_set_composition() {
        let set = MethodSet::GET | MethodSet::POST;
        assert!(set.allows(HttpMethod::GET));
        assert!(set.allows(HttpMethod::POST));
        assert!(!set.allows(HttpMethod::DELETE));
    }

    #[test]
    fn readable_and_editable_aliases() {
        assert!(MethodSet::READABLE.allows(HttpMethod::HEAD));
        assert!(!MethodSet::READABLE.allows(HttpMethod::POST));
        assert!(MethodSet::EDITABLE.allows(HttpMethod::PUT));
        assert!(MethodSet::ALL.allows(HttpMethod::OPTIONS));
        assert!(!MethodSet::ALL.allows(HttpMethod::UNKNOWN));
    }
}
