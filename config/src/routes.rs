//! Route tables declared in configuration files.
//!
//! # Example YAML
//!
//! ```yaml
//! matcher:
//!   trailing_slash: redirect
//!   max_alternatives_per_regex: 200
//! routes:
//!   blog_show:
//!     path: /blog/{slug}
//!     methods: [GET, HEAD]
//!   blog_page:
//!     path: /blog/page/{page}
//!     defaults: { page: 1 }
//!     requirements: { page: '\d+' }
//!   tenant_home:
//!     path: /
//!     host: '{tenant}.example.com'
//!     schemes: [https]
//!     condition: tenant_is_active
//! ```

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use tracing::debug;
use waypost_routing::{CompileOptions, CompiledRoutes, Route, RouteCollection};

use crate::error::Result;
use crate::format;

/// One route entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemes: Vec<String>,
    /// Default values; scalars of any type are stored as strings.
    #[serde(
        default,
        skip_serializing_if = "IndexMap::is_empty",
        deserialize_with = "scalar_map"
    )]
    pub defaults: IndexMap<String, String>,
    #[serde(
        default,
        skip_serializing_if = "IndexMap::is_empty",
        deserialize_with = "scalar_map"
    )]
    pub requirements: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl RouteConfig {
    /// Builds the route, extracting inline requirements and defaults.
    pub fn to_route(&self) -> Route {
        let mut route = Route::new(&self.path)
            .with_methods(&self.methods)
            .with_schemes(&self.schemes);
        if let Some(host) = &self.host {
            route = route.with_host(host);
        }
        for (name, value) in &self.defaults {
            route = route.with_default(name, value);
        }
        for (name, regex) in &self.requirements {
            route = route.with_requirement(name, regex);
        }
        if let Some(condition) = &self.condition {
            route = route.with_condition(condition);
        }
        route
    }
}

/// Named routes in priority order, plus matcher compile options.
///
/// # Examples
///
/// ```
/// use waypost_config::RoutesConfig;
/// use waypost_routing::RequestContext;
///
/// let yaml = r"
/// routes:
///   home: { path: / }
///   post: { path: '/post/{id<\d+>}' }
/// ";
/// let config: RoutesConfig = serde_yaml::from_str(yaml).unwrap();
/// let compiled = config.compile().unwrap();
/// let found = compiled.match_request("/post/7", &RequestContext::default()).unwrap();
/// assert_eq!(found.route, "post");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutesConfig {
    #[serde(default)]
    pub matcher: CompileOptions,
    #[serde(default)]
    pub routes: IndexMap<String, RouteConfig>,
}

impl RoutesConfig {
    /// Loads routes from a YAML (`.yaml`/`.yml`) or JSON (`.json`) file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ConfigError::IoError) if the file cannot be
    /// read, [`UnsupportedFormat`](crate::ConfigError::UnsupportedFormat) for
    /// other extensions, or a parse error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: Self = format::read(path)?;
        debug!(path = %path.display(), routes = config.routes.len(), "loaded routes config");
        Ok(config)
    }

    /// Saves the routes in the format implied by the extension.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ConfigError::IoError) if the file cannot be
    /// written, or a serialization error.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        format::write(path.as_ref(), self)
    }

    /// Builds the route collection in declaration order.
    pub fn to_collection(&self) -> RouteCollection {
        self.routes
            .iter()
            .map(|(name, route)| (name.as_str(), route.to_route()))
            .collect()
    }

    /// Compiles the routes with the configured matcher options.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`](crate::ConfigError::RouteError) when a route
    /// fails to compile.
    pub fn compile(&self) -> Result<CompiledRoutes> {
        Ok(CompiledRoutes::compile(&self.to_collection(), self.matcher)?)
    }
}

/// Deserializes a map whose values may be strings, numbers or booleans.
fn scalar_map<'de, D>(deserializer: D) -> std::result::Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScalarMap;

    impl<'de> Visitor<'de> for ScalarMap {
        type Value = IndexMap<String, String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of scalar values")
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(IndexMap::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
            let mut out = IndexMap::new();
            while let Some((key, value)) = map.next_entry::<String, Scalar>()? {
                out.insert(key, value.0);
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(ScalarMap)
}

struct Scalar(String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ScalarVisitor;

        impl Visitor<'_> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string, number or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Scalar, E> {
                Ok(Scalar(String::new()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;
    use waypost_routing::{RequestContext, RouteError, TrailingSlash};

    fn sample_yaml() -> &'static str {
        r#"
matcher:
  trailing_slash: redirect
  max_alternatives_per_regex: 50
routes:
  blog_index:
    path: /blog/
  blog_page:
    path: /blog/page/{page}
    defaults: { page: 1, _format: html, archived: false }
    requirements: { page: '\d+' }
  blog_edit:
    path: /blog/{slug}/edit
    methods: [get, post]
  login:
    path: /login
    schemes: [HTTPS]
    condition: not_logged_in
  tenant:
    path: /
    host: '{tenant}.example.com'
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: RoutesConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.matcher.trailing_slash, TrailingSlash::Redirect);
        assert_eq!(config.matcher.max_alternatives_per_regex, Some(50));
        let names: Vec<&str> = config.routes.keys().map(String::as_str).collect();
        assert_eq!(names, ["blog_index", "blog_page", "blog_edit", "login", "tenant"]);

        let page = &config.routes["blog_page"];
        assert_eq!(page.defaults["page"], "1");
        assert_eq!(page.defaults["archived"], "false");
        assert_eq!(page.requirements["page"], "\\d+");
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: RoutesConfig = serde_yaml::from_str("routes: {}").unwrap();
        assert!(config.routes.is_empty());
        assert_eq!(config.matcher, CompileOptions::default());
        assert!(config.to_collection().is_empty());
    }

    #[test]
    fn test_to_collection_normalizes_routes() {
        let config: RoutesConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        let routes = config.to_collection();
        assert_eq!(routes.len(), 5);
        assert_eq!(routes.get("blog_edit").unwrap().methods(), ["GET", "POST"]);
        assert_eq!(routes.get("login").unwrap().schemes(), ["https"]);
        assert_eq!(routes.get("login").unwrap().condition(), Some("not_logged_in"));
        assert_eq!(
            routes.get("tenant").unwrap().host(),
            Some("{tenant}.example.com")
        );
    }

    #[test]
    fn test_compile_uses_matcher_options() {
        let config: RoutesConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        let compiled = config.compile().unwrap();
        assert_eq!(compiled.conditions(), ["not_logged_in"]);

        let found = compiled
            .match_request("/blog", &RequestContext::default())
            .unwrap();
        assert_eq!(found.route, "blog_index");
        assert_eq!(found.redirect.as_deref(), Some("/blog/"));
    }

    #[test]
    fn test_invalid_route_is_reported() {
        let yaml = "routes:\n  bad:\n    path: /{1st}\n";
        let config: RoutesConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            config.compile(),
            Err(ConfigError::RouteError(RouteError::VariableStartsWithDigit { .. }))
        ));
    }

    #[test]
    fn test_non_scalar_default_fails_to_parse() {
        let yaml = "routes:\n  r:\n    path: /\n    defaults: { a: [1, 2] }\n";
        assert!(serde_yaml::from_str::<RoutesConfig>(yaml).is_err());
    }
}
