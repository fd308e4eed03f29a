//! Route matching logic.
//!
//! # Responsibilities
//! - Match the decoded URI or the raw URI by prefix or exact value
//! - Match a fixed set of URIs
//! - Provide the catch-all that terminates every table
//!
//! # Design Decisions
//! - Matching is case-sensitive and byte-exact
//! - No regex in predicates; handlers that need one apply it after matching
//! - Whether a predicate looks at the raw or the decoded URI is part of the
//!   route, because percent-encoded prefixes must not match decoded routes

/// The URI pair a route predicate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteTarget<'a> {
    /// Percent-decoded URI.
    pub uri: &'a str,
    /// URI as received.
    pub raw_uri: &'a str,
}

impl<'a> RouteTarget<'a> {
    pub fn new(uri: &'a str, raw_uri: &'a str) -> Self {
        Self { uri, raw_uri }
    }

    fn get(&self, form: UriForm) -> &'a str {
        match form {
            UriForm::Decoded => self.uri,
            UriForm::Raw => self.raw_uri,
        }
    }
}

/// Which URI form a predicate inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriForm {
    Decoded,
    Raw,
}

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, target: &RouteTarget<'_>) -> bool;
}

/// Matches a URI prefix.
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    prefix: String,
    form: UriForm,
}

impl PrefixMatcher {
    /// Prefix of the decoded URI.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            form: UriForm::Decoded,
        }
    }

    /// Prefix of the raw URI.
    pub fn raw(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            form: UriForm::Raw,
        }
    }
}

impl Matcher for PrefixMatcher {
    fn matches(&self, target: &RouteTarget<'_>) -> bool {
        target.get(self.form).starts_with(&self.prefix)
    }
}

/// Matches one URI exactly.
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    uri: String,
    form: UriForm,
}

impl ExactMatcher {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            form: UriForm::Decoded,
        }
    }

    pub fn raw(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            form: UriForm::Raw,
        }
    }
}

impl Matcher for ExactMatcher {
    fn matches(&self, target: &RouteTarget<'_>) -> bool {
        target.get(self.form) == self.uri
    }
}

/// Matches any of a fixed set of decoded URIs.
#[derive(Debug, Clone)]
pub struct OneOfMatcher {
    uris: Vec<String>,
}

impl OneOfMatcher {
    pub fn new<I, S>(uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            uris: uris.into_iter().map(Into::into).collect(),
        }
    }
}

impl Matcher for OneOfMatcher {
    fn matches(&self, target: &RouteTarget<'_>) -> bool {
        self.uris.iter().any(|uri| uri == target.uri)
    }
}

/// Matches everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatchAllMatcher;

impl Matcher for CatchAllMatcher {
    fn matches(&self, _target: &RouteTarget<'_>) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matcher() {
        let decoded = PrefixMatcher::new("/proxy/");
        let raw = PrefixMatcher::raw("/proxy/");

        let plain = RouteTarget::new("/proxy/x", "/proxy/x");
        assert!(decoded.matches(&plain));
        assert!(raw.matches(&plain));

        let encoded = RouteTarget::new("/proxy/x", "/pro%78y/x");
        assert!(decoded.matches(&encoded));
        assert!(!raw.matches(&encoded));

        assert!(!decoded.matches(&RouteTarget::new("/Proxy/x", "/Proxy/x")));
    }

    #[test]
    fn test_exact_matcher() {
        let matcher = ExactMatcher::new("/discard");
        assert!(matcher.matches(&RouteTarget::new("/discard", "/discard")));
        assert!(!matcher.matches(&RouteTarget::new("/discard/", "/discard/")));

        let raw = ExactMatcher::raw("/ua_class");
        assert!(raw.matches(&RouteTarget::new("/ua_class", "/ua_class")));
        assert!(!raw.matches(&RouteTarget::new("/ua_class", "/ua%5Fclass")));
    }

    #[test]
    fn test_one_of_matcher() {
        let matcher = OneOfMatcher::new(["/null", "/zero", "/urandom"]);
        assert!(matcher.matches(&RouteTarget::new("/zero", "/zero")));
        assert!(!matcher.matches(&RouteTarget::new("/random", "/random")));
    }

    #[test]
    fn test_catch_all() {
        assert!(CatchAllMatcher.matches(&RouteTarget::new("", "")));
    }
}
