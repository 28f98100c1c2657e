//! Compiled matcher tables.
//!
//! Routes are split into two tables:
//!
//! - a static table keyed by the literal path (trailing slash trimmed), for
//!   routes without path or host variables;
//! - a list of chunks, each one combined regex of the form
//!   `^(?:(alt0)|(alt1)|...)/?$`. Every alternative is wrapped in its own
//!   capture group; the wrapper that participated in a match identifies the
//!   alternative, and the groups that follow it hold its variables.
//!
//! Consecutive routes with identical patterns share one alternative and are
//! tried in declaration order.

use std::sync::{LazyLock, OnceLock};

use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::compiler::CompiledRoute;
use crate::context::Condition;
use crate::error::RouteError;
use crate::route::{Route, RouteCollection};

static TRAILING_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{!?\w+\}/?$").expect("static regex must compile"));

/// Host prefix used by host-less routes when any route has a host.
const ANY_HOST: &str = r"(?:[^./]*\.)+";

/// What happens when a path differs from a route only by a trailing slash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingSlash {
    /// The route does not match.
    #[default]
    Strict,
    /// `GET`/`HEAD` requests match with a redirect to the canonical path.
    Redirect,
}

/// Options for [`CompiledRoutes::compile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub trailing_slash: TrailingSlash,
    /// Upper bound on alternatives per combined regex; unbounded when `None`.
    pub max_alternatives_per_regex: Option<usize>,
    /// Size limit handed to the regex engine; the engine default when `None`.
    pub regex_size_limit: Option<usize>,
}

/// One route as seen by the matcher.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub(crate) name: String,
    pub(crate) defaults: IndexMap<String, String>,
    /// Literal host, static routes only.
    pub(crate) host: Option<String>,
    pub(crate) methods: Vec<String>,
    pub(crate) schemes: Vec<String>,
    pub(crate) has_trailing_slash: bool,
    pub(crate) has_trailing_var: bool,
    pub(crate) condition: Option<Condition>,
}

impl Candidate {
    pub(crate) fn allows_method(&self, method: &str) -> bool {
        self.methods.is_empty() || self.methods.iter().any(|m| m == method)
    }

    pub(crate) fn allows_scheme(&self, scheme: &str) -> bool {
        self.schemes.is_empty() || self.schemes.iter().any(|s| s == scheme)
    }
}

/// One branch of a combined regex.
#[derive(Debug)]
pub(crate) struct Alternative {
    pub(crate) pattern: String,
    pub(crate) variables: Vec<String>,
    pub(crate) candidates: Vec<Candidate>,
    standalone: OnceLock<Option<Regex>>,
}

impl Alternative {
    /// The branch on its own, wrapper group at index 1; built on first use.
    fn standalone(&self) -> Option<&Regex> {
        self.standalone
            .get_or_init(|| {
                let source = format!("(?s)^({})/?$", self.pattern);
                match Regex::new(&source) {
                    Ok(regex) => Some(regex),
                    Err(err) => {
                        warn!(pattern = %self.pattern, error = %err, "alternative regex failed to compile");
                        None
                    }
                }
            })
            .as_ref()
    }
}

/// A structural match inside a chunk.
#[derive(Debug)]
pub(crate) struct Hit {
    pub(crate) alternative: usize,
    pub(crate) values: Vec<Option<String>>,
}

/// One combined regex and the alternatives it dispatches to.
#[derive(Debug)]
pub(crate) struct Chunk {
    regex: Regex,
    groups: Vec<usize>,
    pub(crate) alternatives: Vec<Alternative>,
}

impl Chunk {
    /// First alternative at or after `start` that matches `subject`.
    ///
    /// From the first alternative the combined regex is used; resuming after
    /// a rejected alternative falls back to the remaining branches one by one.
    pub(crate) fn find(&self, subject: &str, start: usize) -> Option<Hit> {
        if start == 0 {
            let caps = self.regex.captures(subject)?;
            let alternative = self.groups.iter().position(|&g| caps.get(g).is_some())?;
            let base = self.groups[alternative];
            let values = (1..=self.alternatives[alternative].variables.len())
                .map(|i| caps.get(base + i).map(|m| m.as_str().to_string()))
                .collect();
            return Some(Hit {
                alternative,
                values,
            });
        }

        self.alternatives
            .iter()
            .enumerate()
            .skip(start)
            .find_map(|(alternative, alt)| {
                let caps = alt.standalone()?.captures(subject)?;
                let values = (1..=alt.variables.len())
                    .map(|i| caps.get(1 + i).map(|m| m.as_str().to_string()))
                    .collect();
                Some(Hit {
                    alternative,
                    values,
                })
            })
    }
}

/// Immutable matcher tables built from a [`RouteCollection`].
///
/// Tables are `Send + Sync` and can be shared between threads.
///
/// # Examples
///
/// ```
/// use waypost_routing::*;
///
/// let mut routes = RouteCollection::new();
/// routes.add("home", Route::new("/"));
/// routes.add("post", Route::new("/post/{slug}"));
///
/// let compiled = CompiledRoutes::compile(&routes, CompileOptions::default())?;
/// let found = compiled.match_request("/post/hello", &RequestContext::default())?;
/// assert_eq!(found.route, "post");
/// assert_eq!(found.params["slug"], "hello");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct CompiledRoutes {
    pub(crate) match_host: bool,
    pub(crate) trailing_slash: TrailingSlash,
    pub(crate) static_routes: IndexMap<String, Vec<Candidate>>,
    pub(crate) chunks: Vec<Chunk>,
    pub(crate) conditions: Vec<String>,
}

impl CompiledRoutes {
    /// Compiles every route of `routes`.
    ///
    /// # Errors
    ///
    /// Any [`RouteError`] raised by a route's patterns, or
    /// [`RouteError::RegexTooLarge`] when a single alternative exceeds the
    /// regex size limit.
    pub fn compile(routes: &RouteCollection, options: CompileOptions) -> Result<Self, RouteError> {
        let match_host = routes.iter().any(|(_, route)| route.host().is_some());
        let mut conditions: Vec<String> = Vec::new();
        let mut static_routes: IndexMap<String, Vec<Candidate>> = IndexMap::new();
        let mut alternatives: Vec<Alternative> = Vec::new();

        for (name, route) in routes.iter() {
            let compiled = CompiledRoute::compile(name, route)?;
            let condition = route
                .condition()
                .map(|expression| intern_condition(&mut conditions, expression));

            if compiled.path_variables().is_empty() && compiled.host_variables().is_empty() {
                let path = route.path();
                let has_trailing_slash = path != "/" && path.ends_with('/');
                let key = if has_trailing_slash {
                    &path[..path.len() - 1]
                } else {
                    path
                };
                let candidate = candidate(name, route, condition, has_trailing_slash, false);
                static_routes
                    .entry(key.to_string())
                    .or_default()
                    .push(Candidate {
                        host: route.host().map(str::to_lowercase),
                        ..candidate
                    });
                continue;
            }

            let mut body = compiled.path_regex();
            let has_trailing_slash = body != "/" && body.ends_with('/');
            if has_trailing_slash {
                body = &body[..body.len() - 1];
            }
            let has_trailing_var = TRAILING_VARIABLE.is_match(route.path());
            let pattern = if match_host {
                let host = match compiled.host_regex() {
                    Some(host) => format!(r"(?i:{host})\."),
                    None => ANY_HOST.to_string(),
                };
                format!("{host}{body}")
            } else {
                body.to_string()
            };

            let candidate = candidate(name, route, condition, has_trailing_slash, has_trailing_var);
            match alternatives.last_mut() {
                Some(last) if last.pattern == pattern => last.candidates.push(candidate),
                _ => alternatives.push(Alternative {
                    pattern,
                    variables: compiled.variables().cloned().collect(),
                    candidates: vec![candidate],
                    standalone: OnceLock::new(),
                }),
            }
        }

        let chunks = build_chunks(alternatives, &options)?;
        debug!(
            static_paths = static_routes.len(),
            regex_chunks = chunks.len(),
            alternatives = chunks.iter().map(|c| c.alternatives.len()).sum::<usize>(),
            conditions = conditions.len(),
            "compiled routes"
        );

        Ok(Self {
            match_host,
            trailing_slash: options.trailing_slash,
            static_routes,
            chunks,
            conditions,
        })
    }

    /// Condition expressions in index order (index 1 first).
    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    /// Returns `true` when the dynamic subject includes the host.
    pub fn matches_host(&self) -> bool {
        self.match_host
    }

    /// Serialisable view of the tables.
    pub fn describe(&self) -> RoutesSummary {
        RoutesSummary {
            match_host: self.match_host,
            trailing_slash: self.trailing_slash,
            static_routes: self
                .static_routes
                .iter()
                .map(|(path, candidates)| (path.clone(), names(candidates)))
                .collect(),
            regexes: self
                .chunks
                .iter()
                .map(|chunk| RegexSummary {
                    source: chunk.regex.as_str().to_string(),
                    alternatives: chunk
                        .alternatives
                        .iter()
                        .zip(&chunk.groups)
                        .map(|(alt, &group)| AlternativeSummary {
                            group,
                            pattern: alt.pattern.clone(),
                            variables: alt.variables.clone(),
                            routes: names(&alt.candidates),
                        })
                        .collect(),
                })
                .collect(),
            conditions: self
                .conditions
                .iter()
                .enumerate()
                .map(|(i, expression)| Condition {
                    index: i + 1,
                    expression: expression.clone(),
                })
                .collect(),
        }
    }
}

/// Summary of compiled tables, see [`CompiledRoutes::describe`].
#[derive(Debug, Clone, Serialize)]
pub struct RoutesSummary {
    pub match_host: bool,
    pub trailing_slash: TrailingSlash,
    pub static_routes: IndexMap<String, Vec<String>>,
    pub regexes: Vec<RegexSummary>,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegexSummary {
    pub source: String,
    pub alternatives: Vec<AlternativeSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlternativeSummary {
    /// Index of the wrapper capture group.
    pub group: usize,
    pub pattern: String,
    pub variables: Vec<String>,
    pub routes: Vec<String>,
}

fn names(candidates: &[Candidate]) -> Vec<String> {
    candidates.iter().map(|c| c.name.clone()).collect()
}

fn intern_condition(conditions: &mut Vec<String>, expression: &str) -> Condition {
    let index = match conditions.iter().position(|c| c == expression) {
        Some(i) => i + 1,
        None => {
            conditions.push(expression.to_string());
            conditions.len()
        }
    };
    Condition {
        index,
        expression: expression.to_string(),
    }
}

fn candidate(
    name: &str,
    route: &Route,
    condition: Option<Condition>,
    has_trailing_slash: bool,
    has_trailing_var: bool,
) -> Candidate {
    Candidate {
        name: name.to_string(),
        defaults: route.defaults().clone(),
        host: None,
        methods: route.methods().to_vec(),
        schemes: route.schemes().to_vec(),
        has_trailing_slash,
        has_trailing_var,
        condition,
    }
}

/// Splits alternatives into combined regexes, halving the chunk size each
/// time the engine rejects a regex as too large.
fn build_chunks(
    alternatives: Vec<Alternative>,
    options: &CompileOptions,
) -> Result<Vec<Chunk>, RouteError> {
    if alternatives.is_empty() {
        return Ok(Vec::new());
    }
    let mut limit = options
        .max_alternatives_per_regex
        .unwrap_or(usize::MAX)
        .clamp(1, alternatives.len());

    let regexes = loop {
        match alternatives
            .chunks(limit)
            .map(|chunk| combine(chunk, options.regex_size_limit))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(regexes) => break regexes,
            Err((regex::Error::CompiledTooBig(_), _)) if limit > 1 => {
                limit /= 2;
                debug!(limit, "combined regex too large, splitting chunks");
            }
            Err((regex::Error::CompiledTooBig(_), route)) => {
                return Err(RouteError::RegexTooLarge(route));
            }
            Err((err, route)) => {
                return Err(RouteError::InvalidRegex {
                    route,
                    message: err.to_string(),
                });
            }
        }
    };

    let mut alternatives = alternatives.into_iter();
    Ok(regexes
        .into_iter()
        .map(|(regex, groups)| Chunk {
            alternatives: alternatives.by_ref().take(groups.len()).collect(),
            regex,
            groups,
        })
        .collect())
}

/// Builds `^(?:(alt0)|(alt1)|...)/?$` and the wrapper group of each branch.
///
/// Errors carry the name of the chunk's first route.
fn combine(
    alternatives: &[Alternative],
    size_limit: Option<usize>,
) -> Result<(Regex, Vec<usize>), (regex::Error, String)> {
    let mut groups = Vec::with_capacity(alternatives.len());
    let mut branches = Vec::with_capacity(alternatives.len());
    let mut group = 1;
    for alt in alternatives {
        groups.push(group);
        group += 1 + alt.variables.len();
        branches.push(format!("({})", alt.pattern));
    }
    let source = format!("(?s)^(?:{})/?$", branches.join("|"));

    let mut builder = RegexBuilder::new(&source);
    if let Some(limit) = size_limit {
        builder.size_limit(limit);
    }
    let first = || {
        alternatives
            .first()
            .and_then(|alt| alt.candidates.first())
            .map(|c| c.name.clone())
            .unwrap_or_default()
    };
    let regex = builder.build().map_err(|err| (err, first()))?;
    if regex.captures_len() != group {
        let message = format!(
            "expected {} capture groups, found {}",
            group - 1,
            regex.captures_len() - 1
        );
        return Err((regex::Error::Syntax(message), first()));
    }
    Ok((regex, groups))
}
