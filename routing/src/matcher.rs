//! Request matching against compiled tables.
//!
//! The static table is always consulted first; only when none of its
//! candidates accepts the request are the combined regexes scanned, in
//! order. Inside one structural match, candidates are filtered by condition,
//! trailing slash, scheme and method, in that order. Method rejections are
//! collected so a miss can be reported as "method not allowed".

use indexmap::IndexMap;
use serde::Serialize;
use tracing::trace;

use crate::context::{ConditionChecker, RejectConditions, RequestContext};
use crate::error::MatchError;
use crate::table::{Candidate, CompiledRoutes, TrailingSlash};

/// A successful match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    /// Name of the matched route.
    pub route: String,
    /// Route defaults overlaid with captured variables.
    pub params: IndexMap<String, String>,
    /// Canonical location when the request should be redirected (trailing
    /// slash or scheme mismatch in [`TrailingSlash::Redirect`] mode).
    pub redirect: Option<String>,
}

enum Outcome {
    Matched(RouteMatch),
    /// A `GET`-capable route differs only by a trailing slash.
    SlashMismatch,
    Missed,
}

#[derive(Default)]
struct Rejections {
    methods: Vec<String>,
    schemes: Vec<String>,
}

impl Rejections {
    fn clear(&mut self) {
        self.methods.clear();
        self.schemes.clear();
    }
}

fn extend_unique(into: &mut Vec<String>, values: &[String]) {
    for value in values {
        if !into.contains(value) {
            into.push(value.clone());
        }
    }
}

/// Matches paths against [`CompiledRoutes`] with a condition checker.
///
/// ```
/// use waypost_routing::*;
///
/// let mut routes = RouteCollection::new();
/// routes.add("admin", Route::new("/admin").with_condition("is_admin"));
/// let compiled = CompiledRoutes::compile(&routes, CompileOptions::default())?;
///
/// let admin = |_: &Condition, ctx: &RequestContext, _: &indexmap::IndexMap<String, String>| {
///     ctx.host() == "admin.local"
/// };
/// let matcher = compiled.matcher().with_conditions(&admin);
/// let ctx = RequestContext::default().with_host("admin.local");
/// assert_eq!(matcher.match_path("/admin", &ctx)?.route, "admin");
/// assert!(matcher.match_path("/admin", &RequestContext::default()).is_err());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Matcher<'a> {
    routes: &'a CompiledRoutes,
    checker: &'a dyn ConditionChecker,
}

impl CompiledRoutes {
    /// A matcher that rejects every route condition.
    pub fn matcher(&self) -> Matcher<'_> {
        Matcher {
            routes: self,
            checker: &RejectConditions,
        }
    }

    /// Matches without a condition checker; routes with conditions never match.
    pub fn match_request(
        &self,
        path: &str,
        context: &RequestContext,
    ) -> Result<RouteMatch, MatchError> {
        self.matcher().match_path(path, context)
    }
}

impl<'a> Matcher<'a> {
    pub fn with_conditions(mut self, checker: &'a dyn ConditionChecker) -> Self {
        self.checker = checker;
        self
    }

    /// Resolves `path` for `context`.
    ///
    /// # Errors
    ///
    /// [`MatchError::MethodNotAllowed`] when some route matched structurally
    /// but rejected the method, [`MatchError::NotFound`] otherwise.
    pub fn match_path(&self, path: &str, context: &RequestContext) -> Result<RouteMatch, MatchError> {
        let mut rejections = Rejections::default();
        if let Outcome::Matched(found) = self.do_match(path, context, &mut rejections) {
            return Ok(found);
        }
        if !rejections.methods.is_empty() {
            return Err(MatchError::MethodNotAllowed {
                path: path.to_string(),
                allowed: rejections.methods,
            });
        }

        let not_found = || MatchError::NotFound {
            path: path.to_string(),
        };
        if self.routes.trailing_slash != TrailingSlash::Redirect
            || !matches!(context.method(), "GET" | "HEAD")
        {
            return Err(not_found());
        }
        if !rejections.schemes.is_empty() {
            return self
                .redirect_scheme(path, context, &rejections.schemes)
                .ok_or_else(not_found);
        }

        let trimmed = trim_slashes(path);
        if trimmed == "/" {
            return Err(not_found());
        }
        let alternate = if trimmed == path {
            format!("{path}/")
        } else {
            trimmed.to_string()
        };
        let mut retry = Rejections::default();
        match self.do_match(&alternate, context, &mut retry) {
            Outcome::Matched(mut found) => {
                trace!(from = path, to = %alternate, "trailing slash redirect");
                found.redirect = Some(alternate);
                Ok(found)
            }
            _ if !retry.schemes.is_empty() => self
                .redirect_scheme(&alternate, context, &retry.schemes)
                .ok_or_else(not_found),
            _ => Err(not_found()),
        }
    }

    /// Retries with the first allowed scheme and, on success, redirects to it.
    fn redirect_scheme(
        &self,
        path: &str,
        context: &RequestContext,
        schemes: &[String],
    ) -> Option<RouteMatch> {
        let scheme = schemes.first()?;
        let context = context.clone().with_scheme(scheme);
        match self.do_match(path, &context, &mut Rejections::default()) {
            Outcome::Matched(mut found) => {
                trace!(path, scheme = %scheme, "scheme redirect");
                found.redirect = Some(format!("{scheme}://{}{path}", context.host()));
                Some(found)
            }
            _ => None,
        }
    }

    fn do_match(&self, path: &str, context: &RequestContext, rejections: &mut Rejections) -> Outcome {
        let trimmed = trim_slashes(path);
        let supports_redirect =
            self.routes.trailing_slash == TrailingSlash::Redirect && context.canonical_method() == "GET";

        for candidate in self.routes.static_routes.get(trimmed).into_iter().flatten() {
            if let Some(host) = &candidate.host {
                if host != context.host() {
                    trace!(route = %candidate.name, "static route rejected: host");
                    continue;
                }
            }
            let params = candidate.defaults.clone();
            match self.filter(candidate, path, trimmed, false, params, context, rejections, supports_redirect) {
                Outcome::Missed => continue,
                outcome => return outcome,
            }
        }

        trace!(path, "no static route, scanning regexes");
        let subject = self.subject(path, context);
        let trimmed_subject = self.subject(trimmed, context);

        for chunk in &self.routes.chunks {
            let mut start = 0;
            while let Some(hit) = chunk.find(&subject, start) {
                let alternative = &chunk.alternatives[hit.alternative];
                for candidate in &alternative.candidates {
                    let mut values = hit.values.clone();
                    let mut has_trailing_var = trimmed != path && candidate.has_trailing_var;
                    let last_needs_check = candidate.has_trailing_slash
                        || values
                            .last()
                            .and_then(Option::as_deref)
                            .is_none_or(|v| !v.is_empty() && !v.ends_with('/'));
                    if has_trailing_var && last_needs_check {
                        if let Some(retry) = chunk
                            .find(&trimmed_subject, start)
                            .filter(|retry| retry.alternative == hit.alternative)
                        {
                            if candidate.has_trailing_slash {
                                values = retry.values;
                            } else {
                                has_trailing_var = false;
                            }
                        }
                    }

                    let mut params = candidate.defaults.clone();
                    for (name, value) in alternative.variables.iter().zip(values) {
                        if let Some(value) = value {
                            params.insert(name.clone(), value);
                        }
                    }
                    match self.filter(
                        candidate,
                        path,
                        trimmed,
                        has_trailing_var,
                        params,
                        context,
                        rejections,
                        supports_redirect,
                    ) {
                        Outcome::Missed => continue,
                        outcome => return outcome,
                    }
                }
                start = hit.alternative + 1;
            }
        }

        Outcome::Missed
    }

    /// Applies condition, trailing slash, scheme and method checks.
    #[allow(clippy::too_many_arguments)]
    fn filter(
        &self,
        candidate: &Candidate,
        path: &str,
        trimmed: &str,
        has_trailing_var: bool,
        params: IndexMap<String, String>,
        context: &RequestContext,
        rejections: &mut Rejections,
        supports_redirect: bool,
    ) -> Outcome {
        if let Some(condition) = &candidate.condition {
            if !self.checker.check(condition, context, &params) {
                trace!(route = %candidate.name, condition = condition.index, "rejected: condition");
                return Outcome::Missed;
            }
        }

        if path != "/" && !has_trailing_var && candidate.has_trailing_slash == (trimmed == path) {
            if supports_redirect && candidate.allows_method("GET") {
                rejections.clear();
                return Outcome::SlashMismatch;
            }
            trace!(route = %candidate.name, "rejected: trailing slash");
            return Outcome::Missed;
        }

        if !candidate.allows_scheme(context.scheme()) {
            trace!(route = %candidate.name, scheme = context.scheme(), "rejected: scheme");
            extend_unique(&mut rejections.schemes, &candidate.schemes);
            return Outcome::Missed;
        }

        if !candidate.allows_method(context.canonical_method())
            && !candidate.allows_method(context.method())
        {
            trace!(route = %candidate.name, method = context.method(), "rejected: method");
            extend_unique(&mut rejections.methods, &candidate.methods);
            return Outcome::Missed;
        }

        Outcome::Matched(RouteMatch {
            route: candidate.name.clone(),
            params,
            redirect: None,
        })
    }

    fn subject(&self, path: &str, context: &RequestContext) -> String {
        if self.routes.match_host {
            format!("{}.{path}", context.host())
        } else {
            path.to_string()
        }
    }
}

/// `path` without trailing slashes, or `/` when nothing else remains.
fn trim_slashes(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Condition;
    use crate::{CompileOptions, Route, RouteCollection};

    fn compile(routes: Vec<(&str, Route)>) -> CompiledRoutes {
        compile_with(routes, CompileOptions::default())
    }

    fn compile_with(routes: Vec<(&str, Route)>, options: CompileOptions) -> CompiledRoutes {
        let routes: RouteCollection = routes.into_iter().collect();
        CompiledRoutes::compile(&routes, options).unwrap()
    }

    fn get() -> RequestContext {
        RequestContext::default()
    }

    fn params(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_static_route_wins_over_earlier_dynamic_route() {
        let compiled = compile(vec![
            ("dynamic", Route::new("/a/{p}")),
            ("fixed", Route::new("/a/fixed")),
        ]);
        assert_eq!(compiled.match_request("/a/fixed", &get()).unwrap().route, "fixed");
        let other = compiled.match_request("/a/other", &get()).unwrap();
        assert_eq!(other.route, "dynamic");
        assert_eq!(other.params, params(&[("p", "other")]));
    }

    #[test]
    fn test_defaults_are_merged() {
        let compiled = compile(vec![(
            "foo",
            Route::new("/foo/{bar}").with_default("def", "test"),
        )]);
        let found = compiled.match_request("/foo/baz", &get()).unwrap();
        assert_eq!(found.params, params(&[("def", "test"), ("bar", "baz")]));
    }

    #[test]
    fn test_optional_variables() {
        let compiled = compile(vec![(
            "bar",
            Route::new("/{foo}/{bar}")
                .with_default("foo", "foo")
                .with_default("bar", "bar"),
        )]);
        let found = |path| compiled.match_request(path, &get()).unwrap().params;
        assert_eq!(found("/"), params(&[("foo", "foo"), ("bar", "bar")]));
        assert_eq!(found("/a"), params(&[("foo", "a"), ("bar", "bar")]));
        assert_eq!(found("/a/b"), params(&[("foo", "a"), ("bar", "b")]));
    }

    #[test]
    fn test_optional_variable_without_real_separator() {
        let compiled = compile(vec![("test", Route::new("/get{what}").with_default("what", "All"))]);
        let found = compiled.match_request("/get", &get()).unwrap();
        assert_eq!(found.params["what"], "All");
        let found = compiled.match_request("/getSites", &get()).unwrap();
        assert_eq!(found.params["what"], "Sites");
        assert!(compiled.match_request("/ge", &get()).is_err());
    }

    #[test]
    fn test_adjacent_variables() {
        let compiled = compile(vec![(
            "test",
            Route::new("/{w}{x}{y}{z}.{_format}")
                .with_default("z", "default-z")
                .with_default("_format", "html")
                .with_requirement("y", "y|Y"),
        )]);
        let found = compiled.match_request("/wwwwwxYZ.xml", &get()).unwrap();
        assert_eq!(
            found.params,
            params(&[
                ("z", "Z"),
                ("_format", "xml"),
                ("w", "wwwww"),
                ("x", "x"),
                ("y", "Y")
            ])
        );
        let found = compiled.match_request("/wwwwwxy", &get()).unwrap();
        assert_eq!(found.params["z"], "default-z");
        assert!(compiled.match_request("/wxy.html", &get()).is_err());
    }

    #[test]
    fn test_method_not_allowed_aggregates() {
        let compiled = compile(vec![
            ("get", Route::new("/foo").with_methods(["GET"])),
            ("post", Route::new("/foo").with_methods(["POST", "DELETE"])),
        ]);
        let err = compiled
            .match_request("/foo", &get().with_method("PUT"))
            .unwrap_err();
        assert_eq!(err.allowed_methods(), ["GET", "POST", "DELETE"]);
    }

    #[test]
    fn test_head_matches_get_routes() {
        let compiled = compile(vec![("foo", Route::new("/foo/{bar}").with_methods(["GET"]))]);
        assert!(compiled.match_request("/foo/x", &get().with_method("HEAD")).is_ok());
    }

    #[test]
    fn test_head_only_routes_accept_head() {
        let compiled = compile(vec![
            ("static_head", Route::new("/foo").with_methods(["HEAD"])),
            ("dynamic_head", Route::new("/bar/{id}").with_methods(["HEAD"])),
        ]);
        let head = get().with_method("HEAD");
        assert_eq!(compiled.match_request("/foo", &head).unwrap().route, "static_head");
        let found = compiled.match_request("/bar/1", &head).unwrap();
        assert_eq!(found.route, "dynamic_head");
        assert_eq!(found.params["id"], "1");

        let err = compiled.match_request("/bar/1", &get()).unwrap_err();
        assert_eq!(err.allowed_methods(), ["HEAD"]);
    }

    #[test]
    fn test_scheme_mismatch_is_not_found() {
        let compiled = compile(vec![
            ("https_route", Route::new("/").with_schemes(["https"])),
            ("http_route", Route::new("/").with_schemes(["http"])),
            ("secure", Route::new("/secure").with_schemes(["https"])),
        ]);
        assert_eq!(compiled.match_request("/", &get()).unwrap().route, "http_route");
        assert_eq!(
            compiled.match_request("/secure", &get()).unwrap_err(),
            MatchError::NotFound {
                path: "/secure".into()
            }
        );
    }

    #[test]
    fn test_strict_trailing_slash() {
        let compiled = compile(vec![
            ("dir", Route::new("/foo/")),
            ("file", Route::new("/bar")),
            ("var", Route::new("/baz/{x}")),
        ]);
        assert!(compiled.match_request("/foo/", &get()).is_ok());
        assert!(compiled.match_request("/foo", &get()).is_err());
        assert!(compiled.match_request("/bar/", &get()).is_err());
        assert!(compiled.match_request("/baz/x/", &get()).is_err());
    }

    #[test]
    fn test_redirect_trailing_slash() {
        let options = CompileOptions {
            trailing_slash: TrailingSlash::Redirect,
            ..CompileOptions::default()
        };
        let compiled = compile_with(
            vec![
                ("dir", Route::new("/foo/")),
                ("file", Route::new("/bar/{x}")),
                ("post_only", Route::new("/post").with_methods(["POST"])),
            ],
            options,
        );
        let found = compiled.match_request("/foo", &get()).unwrap();
        assert_eq!(found.route, "dir");
        assert_eq!(found.redirect.as_deref(), Some("/foo/"));

        let found = compiled.match_request("/bar/x/", &get()).unwrap();
        assert_eq!(found.route, "file");
        assert_eq!(found.redirect.as_deref(), Some("/bar/x"));

        assert!(compiled.match_request("/foo", &get().with_method("POST")).is_err());
        assert!(compiled.match_request("/post/", &get().with_method("POST")).is_err());
    }

    #[test]
    fn test_redirect_scheme() {
        let options = CompileOptions {
            trailing_slash: TrailingSlash::Redirect,
            ..CompileOptions::default()
        };
        let compiled = compile_with(vec![("secure", Route::new("/secure").with_schemes(["https"]))], options);
        let found = compiled.match_request("/secure", &get()).unwrap();
        assert_eq!(found.redirect.as_deref(), Some("https://localhost/secure"));
    }

    #[test]
    fn test_rejected_alternative_resumes_with_later_ones() {
        let compiled = compile(vec![
            ("post", Route::new("/{a}/{b}").with_methods(["POST"])),
            ("any", Route::new("/{e}/{f}").with_requirement("e", ".+")),
        ]);
        let found = compiled.match_request("/x/y", &get()).unwrap();
        assert_eq!(found.route, "any");
        assert_eq!(found.params, params(&[("e", "x"), ("f", "y")]));
    }

    #[test]
    fn test_trailing_slash_captured_by_greedy_variable() {
        let compiled = compile(vec![(
            "greedy",
            Route::new("/{a}").with_requirement("a", ".+"),
        )]);
        let found = compiled.match_request("/foo/", &get()).unwrap();
        assert_eq!(found.params["a"], "foo/");
    }

    #[test]
    fn test_host_routes() {
        let compiled = compile(vec![
            (
                "tenant",
                Route::new("/{page}").with_host("{tenant}.example.com"),
            ),
            ("plain", Route::new("/plain/{x}")),
            ("literal", Route::new("/about").with_host("www.example.com")),
        ]);
        let ctx = get().with_host("ACME.example.com");
        let found = compiled.match_request("/home", &ctx).unwrap();
        assert_eq!(found.params, params(&[("tenant", "acme"), ("page", "home")]));

        let found = compiled.match_request("/plain/1", &ctx).unwrap();
        assert_eq!(found.route, "plain");

        assert!(compiled.match_request("/about", &ctx).is_err());
        let found = compiled
            .match_request("/about", &get().with_host("WWW.example.com"))
            .unwrap();
        assert_eq!(found.route, "literal");
    }

    #[test]
    fn test_conditions() {
        let compiled = compile(vec![
            ("guarded", Route::new("/foo/{id}").with_condition("id_is_42")),
            ("fallback", Route::new("/foo/{id}")),
        ]);
        let checker = |condition: &Condition, _: &RequestContext, params: &IndexMap<String, String>| {
            condition.expression == "id_is_42" && params.get("id").map(String::as_str) == Some("42")
        };
        let matcher = compiled.matcher().with_conditions(&checker);
        assert_eq!(matcher.match_path("/foo/42", &get()).unwrap().route, "guarded");
        assert_eq!(matcher.match_path("/foo/7", &get()).unwrap().route, "fallback");
        // without a checker the guarded route never matches
        assert_eq!(compiled.match_request("/foo/42", &get()).unwrap().route, "fallback");
    }
}
