//! Route construction for the WhatsApp Business Cloud API.
//!
//! A [`Route`] pairs an HTTP method with a fully resolved URL. Path templates
//! use `{name}` placeholders that are substituted at construction time;
//! string substitutions are percent-encoded with path-segment escaping.

use http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped when a text parameter is substituted into a path.
///
/// Unreserved characters and `/` pass through, everything else is
/// percent-escaped.
const PATH_SEGMENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Returns the fixed API base, `https://graph.facebook.com/v{N}.0`.
pub fn api_base() -> String {
    format!("https://graph.facebook.com/v{}.0", crate::API_VERSION)
}

/// A substitution value for a `{name}` placeholder in a path template.
#[derive(Debug, Clone)]
pub enum PathValue {
    /// Percent-encoded before substitution.
    Text(String),
    /// Substituted via its plain decimal form.
    Number(i64),
}

impl From<&str> for PathValue {
    fn from(value: &str) -> Self {
        PathValue::Text(value.to_string())
    }
}

impl From<String> for PathValue {
    fn from(value: String) -> Self {
        PathValue::Text(value)
    }
}

impl From<i64> for PathValue {
    fn from(value: i64) -> Self {
        PathValue::Number(value)
    }
}

impl PathValue {
    fn resolve(&self) -> String {
        match self {
            PathValue::Text(text) => utf8_percent_encode(text, PATH_SEGMENT_SET).to_string(),
            PathValue::Number(n) => n.to_string(),
        }
    }
}

/// An HTTP route to the WhatsApp Business Cloud API.
///
/// Immutable once built; construct a fresh `Route` per call.
#[derive(Debug, Clone)]
pub struct Route {
    method: Method,
    path: String,
    url: String,
}

impl Route {
    /// Builds a route with no path parameters against the fixed API base.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self::against(&api_base(), method, path, &[])
    }

    /// Builds a route against the fixed API base, substituting `params` into
    /// the `{name}` placeholders of `path`.
    ///
    /// # Panics
    ///
    /// Panics if a placeholder in the template has no matching parameter.
    /// An unresolved placeholder is a caller bug, not an API failure.
    pub fn with_params(
        method: Method,
        path: impl Into<String>,
        params: &[(&str, PathValue)],
    ) -> Self {
        Self::against(&api_base(), method, path, params)
    }

    /// Builds a route against an explicit base URL.
    ///
    /// The client uses this with its configured base so that every resolved
    /// URL stays prefixed by it; with the default configuration the base is
    /// exactly [`api_base`].
    ///
    /// # Panics
    ///
    /// Panics if a placeholder in the template has no matching parameter.
    pub fn against(
        base: &str,
        method: Method,
        path: impl Into<String>,
        params: &[(&str, PathValue)],
    ) -> Self {
        let path = path.into();
        let mut url = format!("{}{}", base.trim_end_matches('/'), path);
        for (name, value) in params {
            url = url.replace(&format!("{{{}}}", name), &value.resolve());
        }
        if let Some(open) = url.find('{') {
            panic!("unresolved placeholder in route template: {}", &url[open..]);
        }
        Self { method, path, url }
    }

    /// The HTTP method for this route.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path template this route was built from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The fully resolved URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}
