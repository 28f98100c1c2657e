//! Request context and runtime condition guards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The request attributes a route is matched against (besides the path).
///
/// ```
/// use waypost_routing::RequestContext;
///
/// let ctx = RequestContext::default().with_method("post").with_host("Example.COM");
/// assert_eq!(ctx.method(), "POST");
/// assert_eq!(ctx.host(), "example.com");
/// assert_eq!(ctx.scheme(), "http");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    method: String,
    host: String,
    scheme: String,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            method: "GET".into(),
            host: "localhost".into(),
            scheme: "http".into(),
        }
    }
}

impl RequestContext {
    pub fn new(method: &str, host: &str, scheme: &str) -> Self {
        Self::default()
            .with_method(method)
            .with_host(host)
            .with_scheme(scheme)
    }

    /// Sets the method (uppercased).
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_uppercase();
        self
    }

    /// Sets the host (lowercased).
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_lowercase();
        self
    }

    /// Sets the scheme (lowercased).
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_lowercase();
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Method that also satisfies route method requirements: `HEAD` counts as `GET`.
    pub fn canonical_method(&self) -> &str {
        if self.method == "HEAD" { "GET" } else { &self.method }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

/// A route condition with the index assigned at compile time.
///
/// Identical expressions share one index; indexes start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub index: usize,
    pub expression: String,
}

/// Evaluates route conditions after a structural match.
///
/// Returning `false` rejects the candidate and matching continues with the
/// next one. Closures with the same signature implement this trait.
pub trait ConditionChecker {
    fn check(
        &self,
        condition: &Condition,
        context: &RequestContext,
        params: &IndexMap<String, String>,
    ) -> bool;
}

impl<F> ConditionChecker for F
where
    F: Fn(&Condition, &RequestContext, &IndexMap<String, String>) -> bool,
{
    fn check(
        &self,
        condition: &Condition,
        context: &RequestContext,
        params: &IndexMap<String, String>,
    ) -> bool {
        self(condition, context, params)
    }
}

/// Checker used when none is supplied: every condition fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectConditions;

impl ConditionChecker for RejectConditions {
    fn check(&self, _: &Condition, _: &RequestContext, _: &IndexMap<String, String>) -> bool {
        false
    }
}
