//! Route definitions and ordered route collections.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::Serialize;

static INLINE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(!?)(\w+)(<.*?>)?(\?[^}]*)?\}").expect("static regex must compile")
});

/// A single route: path pattern plus the constraints a request must meet.
///
/// Placeholders use `{name}`. Requirements and defaults may be given inline
/// (`{id<\d+>}`, `{page?1}`, `{page<\d+>?1}`) or through the builder
/// methods; inline values are extracted when the path is set.
///
/// # Examples
///
/// ```
/// use waypost_routing::Route;
///
/// let route = Route::new("blog/{page<\\d+>?1}").with_methods(["get", "head"]);
/// assert_eq!(route.path(), "/blog/{page}");
/// assert_eq!(route.requirement("page"), Some("\\d+"));
/// assert_eq!(route.default_value("page"), Some("1"));
/// assert_eq!(route.methods(), ["GET", "HEAD"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    path: String,
    host: Option<String>,
    methods: Vec<String>,
    schemes: Vec<String>,
    defaults: IndexMap<String, String>,
    requirements: IndexMap<String, String>,
    condition: Option<String>,
}

impl Route {
    /// Creates a route for `path`, normalised to start with `/`.
    pub fn new(path: impl AsRef<str>) -> Self {
        let mut route = Self {
            path: String::new(),
            host: None,
            methods: Vec::new(),
            schemes: Vec::new(),
            defaults: IndexMap::new(),
            requirements: IndexMap::new(),
            condition: None,
        };
        route.set_path(path.as_ref());
        route
    }

    pub fn set_path(&mut self, path: &str) {
        let path = format!("/{}", path.trim().trim_start_matches('/'));
        self.path = self.extract_inline(&path);
    }

    /// Sets a host pattern; an empty host clears it.
    pub fn with_host(mut self, host: impl AsRef<str>) -> Self {
        self.set_host(host.as_ref());
        self
    }

    pub fn set_host(&mut self, host: &str) {
        self.host = if host.is_empty() {
            None
        } else {
            Some(self.extract_inline(host))
        };
    }

    /// Restricts the route to the given HTTP methods (uppercased).
    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.methods = normalize(methods, str::to_uppercase);
        self
    }

    /// Restricts the route to the given schemes (lowercased).
    pub fn with_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.schemes = normalize(schemes, str::to_lowercase);
        self
    }

    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Adds a requirement; leading `^`/`\A` and trailing `$`/`\z` anchors
    /// are stripped.
    pub fn with_requirement(mut self, name: impl Into<String>, regex: &str) -> Self {
        self.requirements
            .insert(name.into(), sanitize_requirement(regex).to_string());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        let condition = condition.into();
        self.condition = (!condition.is_empty()).then_some(condition);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub fn schemes(&self) -> &[String] {
        &self.schemes
    }

    pub fn defaults(&self) -> &IndexMap<String, String> {
        &self.defaults
    }

    pub fn default_value(&self, name: &str) -> Option<&str> {
        self.defaults.get(name).map(String::as_str)
    }

    pub fn has_default(&self, name: &str) -> bool {
        self.defaults.contains_key(name)
    }

    pub fn requirements(&self) -> &IndexMap<String, String> {
        &self.requirements
    }

    pub fn requirement(&self, name: &str) -> Option<&str> {
        self.requirements.get(name).map(String::as_str)
    }

    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    /// Moves `{name<req>?default}` pieces into the requirement and default maps.
    fn extract_inline(&mut self, pattern: &str) -> String {
        if !pattern.contains(['?', '<']) {
            return pattern.to_string();
        }
        INLINE_PLACEHOLDER
            .replace_all(pattern, |caps: &Captures<'_>| {
                let name = &caps[2];
                if let Some(default) = caps.get(4) {
                    self.defaults
                        .insert(name.to_string(), default.as_str()[1..].to_string());
                }
                if let Some(requirement) = caps.get(3) {
                    let requirement = requirement.as_str();
                    self.requirements.insert(
                        name.to_string(),
                        sanitize_requirement(&requirement[1..requirement.len() - 1]).to_string(),
                    );
                }
                format!("{{{}{name}}}", &caps[1])
            })
            .into_owned()
    }
}

fn normalize<I, S>(values: I, case: fn(&str) -> String) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let value = case(value.as_ref());
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

fn sanitize_requirement(regex: &str) -> &str {
    let regex = regex
        .strip_prefix('^')
        .or_else(|| regex.strip_prefix(r"\A"))
        .unwrap_or(regex);
    regex
        .strip_suffix('$')
        .or_else(|| regex.strip_suffix(r"\z"))
        .unwrap_or(regex)
}

/// Routes keyed by name, in priority order.
///
/// Adding a route under an existing name replaces it and moves it to the end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteCollection {
    routes: IndexMap<String, Route>,
}

impl RouteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, route: Route) {
        let name = name.into();
        self.routes.shift_remove(&name);
        self.routes.insert(name, route);
    }

    pub fn get(&self, name: &str) -> Option<&Route> {
        self.routes.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Route> {
        self.routes.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Route)> {
        self.routes.iter().map(|(name, route)| (name.as_str(), route))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Appends every route of `other`, overriding (and re-ordering) routes
    /// with the same name.
    pub fn add_collection(&mut self, other: RouteCollection) {
        for (name, route) in other.routes {
            self.add(name, route);
        }
    }

    /// Prefixes every path; an empty or `/` prefix is a no-op.
    pub fn add_prefix(&mut self, prefix: &str) {
        let prefix = prefix.trim().trim_matches('/');
        if prefix.is_empty() {
            return;
        }
        for route in self.routes.values_mut() {
            let path = format!("/{prefix}{}", route.path);
            route.set_path(&path);
        }
    }

    pub fn set_host(&mut self, host: &str) {
        for route in self.routes.values_mut() {
            route.set_host(host);
        }
    }

    /// Adds defaults to every route, overriding existing keys.
    pub fn add_defaults(&mut self, defaults: &IndexMap<String, String>) {
        for route in self.routes.values_mut() {
            for (name, value) in defaults {
                route.defaults.insert(name.clone(), value.clone());
            }
        }
    }

    pub fn add_requirements(&mut self, requirements: &IndexMap<String, String>) {
        for route in self.routes.values_mut() {
            for (name, regex) in requirements {
                route
                    .requirements
                    .insert(name.clone(), sanitize_requirement(regex).to_string());
            }
        }
    }

    pub fn set_methods(&mut self, methods: &[&str]) {
        for route in self.routes.values_mut() {
            route.methods = normalize(methods, str::to_uppercase);
        }
    }

    pub fn set_schemes(&mut self, schemes: &[&str]) {
        for route in self.routes.values_mut() {
            route.schemes = normalize(schemes, str::to_lowercase);
        }
    }
}

impl<'a> IntoIterator for &'a RouteCollection {
    type Item = (&'a String, &'a Route);
    type IntoIter = indexmap::map::Iter<'a, String, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

impl<N: Into<String>> FromIterator<(N, Route)> for RouteCollection {
    fn from_iter<T: IntoIterator<Item = (N, Route)>>(iter: T) -> Self {
        let mut collection = Self::new();
        for (name, route) in iter {
            collection.add(name, route);
        }
        collection
    }
}
