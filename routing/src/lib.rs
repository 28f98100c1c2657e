//! Route compilation and URL matching.
//!
//! Routes are declared with path patterns such as `/blog/{slug}` or
//! `/{page<\d+>?1}` and collected in a [`RouteCollection`] in priority order.
//! [`CompiledRoutes::compile`] turns the collection into matcher tables:
//!
//! - routes without variables land in a static table keyed by literal path;
//! - the rest are grouped into a few combined regexes, one alternative per
//!   distinct pattern, with the matched alternative identifying the routes to
//!   try.
//!
//! Matching resolves a path plus a [`RequestContext`] (method, host, scheme)
//! to a [`RouteMatch`] holding the route name and its parameters, or a
//! [`MatchError`] telling "not found" apart from "method not allowed".
//!
//! # Example
//!
//! ```
//! use waypost_routing::*;
//!
//! let mut routes = RouteCollection::new();
//! routes.add("blog", Route::new("/blog/{page<\\d+>?1}"));
//! routes.add("create", Route::new("/blog").with_methods(["POST"]));
//!
//! let compiled = CompiledRoutes::compile(&routes, CompileOptions::default())?;
//! let ctx = RequestContext::default();
//!
//! assert_eq!(compiled.match_request("/blog/7", &ctx)?.params["page"], "7");
//! assert_eq!(compiled.match_request("/blog", &ctx)?.params["page"], "1");
//!
//! let err = compiled.match_request("/blog/x", &ctx).unwrap_err();
//! assert!(matches!(err, MatchError::NotFound { .. }));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod compiler;
mod context;
mod error;
mod matcher;
mod route;
mod table;

pub use compiler::{CompiledRoute, SEPARATORS, VARIABLE_MAXIMUM_LENGTH};
pub use context::{Condition, ConditionChecker, RejectConditions, RequestContext};
pub use error::{MatchError, RouteError};
pub use matcher::{Matcher, RouteMatch};
pub use route::{Route, RouteCollection};
pub use table::{
    AlternativeSummary, CompileOptions, CompiledRoutes, RegexSummary, RoutesSummary, TrailingSlash,
};
