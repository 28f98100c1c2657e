//! Translation of a single route's path and host patterns into regexes.
//!
//! A pattern is split into text and variable tokens. Each variable captures
//! with its requirement (or a default requirement that stops at the next
//! separator) and absorbs one preceding separator character. Trailing
//! variables that have defaults become optional, nested so that `/a/b`
//! can drop `b` alone but never `a` alone.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::RouteError;
use crate::route::Route;

/// Characters that may separate a variable from the text before it.
pub const SEPARATORS: &str = "/,;.:-_~+*=@|";

/// Maximum length of a placeholder name.
pub const VARIABLE_MAXIMUM_LENGTH: usize = 32;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(!)?(\w+)\}").expect("static regex must compile"));

/// Regex bodies and variable names derived from a [`Route`].
///
/// Bodies carry no anchors; variables are plain (unnamed) capture groups,
/// host variables first, and requirement regexes contribute no groups of
/// their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRoute {
    path_regex: String,
    host_regex: Option<String>,
    path_variables: Vec<String>,
    host_variables: Vec<String>,
}

impl CompiledRoute {
    /// Compiles `route`. `name` is only used in error messages.
    pub fn compile(name: &str, route: &Route) -> Result<Self, RouteError> {
        for (variable, requirement) in route.requirements() {
            if requirement.is_empty() {
                return Err(RouteError::EmptyRequirement(variable.clone()));
            }
        }

        let (host_regex, host_variables) = match route.host() {
            Some(host) => {
                let (regex, variables) = compile_pattern(route, host, true)?;
                (Some(regex), variables)
            }
            None => (None, Vec::new()),
        };
        let (path_regex, path_variables) = compile_pattern(route, route.path(), false)?;

        let compiled = Self {
            path_regex,
            host_regex,
            path_variables,
            host_variables,
        };
        // invalid requirements surface per route, not per combined regex
        Regex::new(&compiled.anchored_path())
            .map_err(|err| invalid_regex(name, &err))?;
        if let Some(host) = compiled.anchored_host() {
            Regex::new(&host).map_err(|err| invalid_regex(name, &err))?;
        }
        Ok(compiled)
    }

    /// Path regex body, e.g. `/blog/([^/]+)`.
    pub fn path_regex(&self) -> &str {
        &self.path_regex
    }

    /// Host regex body, if the route has a host pattern.
    pub fn host_regex(&self) -> Option<&str> {
        self.host_regex.as_deref()
    }

    pub fn path_variables(&self) -> &[String] {
        &self.path_variables
    }

    pub fn host_variables(&self) -> &[String] {
        &self.host_variables
    }

    /// Host variables followed by path variables, in capture order.
    pub fn variables(&self) -> impl Iterator<Item = &String> {
        self.host_variables.iter().chain(&self.path_variables)
    }

    /// Full path regex, anchored and dot-all.
    pub fn anchored_path(&self) -> String {
        format!("(?s)^{}$", self.path_regex)
    }

    /// Full host regex, anchored and case-insensitive.
    pub fn anchored_host(&self) -> Option<String> {
        self.host_regex
            .as_ref()
            .map(|host| format!("(?si)^{host}$"))
    }
}

fn invalid_regex(name: &str, err: &regex::Error) -> RouteError {
    RouteError::InvalidRegex {
        route: name.to_string(),
        message: err.to_string(),
    }
}

#[derive(Debug)]
enum Token {
    Text(String),
    Variable {
        separator: String,
        regex: String,
        name: String,
        important: bool,
    },
}

fn compile_pattern(
    route: &Route,
    pattern: &str,
    is_host: bool,
) -> Result<(String, Vec<String>), RouteError> {
    let default_separator = if is_host { '.' } else { '/' };
    let mut tokens = Vec::new();
    let mut variables: Vec<String> = Vec::new();
    let mut pos = 0;

    for caps in PLACEHOLDER.captures_iter(pattern) {
        let Some(whole) = caps.get(0) else { continue };
        let important = caps.get(1).is_some();
        let name = caps[2].to_string();
        let preceding = &pattern[pos..whole.start()];
        pos = whole.end();

        let preceding_char = preceding.chars().last();
        let separator = preceding_char.filter(|c| SEPARATORS.contains(*c));

        if name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(RouteError::VariableStartsWithDigit {
                name,
                pattern: pattern.to_string(),
            });
        }
        if variables.contains(&name) {
            return Err(RouteError::DuplicateVariable {
                name,
                pattern: pattern.to_string(),
            });
        }
        if name.len() > VARIABLE_MAXIMUM_LENGTH {
            return Err(RouteError::VariableTooLong {
                name,
                pattern: pattern.to_string(),
                max: VARIABLE_MAXIMUM_LENGTH,
            });
        }

        let text = match separator {
            Some(sep) => &preceding[..preceding.len() - sep.len_utf8()],
            None => preceding,
        };
        if !text.is_empty() {
            tokens.push(Token::Text(text.to_string()));
        }

        let regex = match route.requirement(&name) {
            Some(requirement) => non_capturing(requirement),
            None => {
                let next = next_separator(&pattern[pos..]);
                let mut class = regex::escape(&default_separator.to_string());
                if let Some(next) = next.filter(|&c| c != default_separator) {
                    class.push_str(&regex::escape(&next.to_string()));
                }
                format!("[^{class}]+")
            }
        };

        tokens.push(Token::Variable {
            separator: separator.map(String::from).unwrap_or_default(),
            regex,
            name: name.clone(),
            important,
        });
        variables.push(name);
    }

    if pos < pattern.len() {
        tokens.push(Token::Text(pattern[pos..].to_string()));
    }

    let mut first_optional = usize::MAX;
    if !is_host {
        for (i, token) in tokens.iter().enumerate().rev() {
            match token {
                Token::Variable {
                    name, important, ..
                } if !important && route.has_default(name) => first_optional = i,
                _ => break,
            }
        }
    }

    let regex: String = (0..tokens.len())
        .map(|i| token_regex(&tokens, i, first_optional))
        .collect();
    Ok((regex, variables))
}

fn token_regex(tokens: &[Token], index: usize, first_optional: usize) -> String {
    match &tokens[index] {
        Token::Text(text) => regex::escape(text),
        Token::Variable {
            separator, regex, ..
        } => {
            let separator = regex::escape(separator);
            if index == 0 && first_optional == 0 {
                // a sole optional variable keeps its separator mandatory
                return format!("{separator}({regex})?");
            }
            let mut out = format!("{separator}({regex})");
            if index >= first_optional {
                out.insert_str(0, "(?:");
                if index == tokens.len() - 1 {
                    let closing = tokens.len() - first_optional - usize::from(first_optional == 0);
                    out.push_str(&")?".repeat(closing));
                }
            }
            out
        }
    }
}

/// First static separator after the placeholders that directly follow.
fn next_separator(following: &str) -> Option<char> {
    if following.is_empty() {
        return None;
    }
    let stripped = PLACEHOLDER.replace_all(following, "");
    stripped.chars().next().filter(|c| SEPARATORS.contains(*c))
}

/// Rewrites capturing groups of a requirement as non-capturing ones,
/// including named groups, so capture indexes stay predictable.
fn non_capturing(regex: &str) -> String {
    let bytes = regex.as_bytes();
    let mut out = String::with_capacity(regex.len() + 8);
    let mut copied = 0;
    let mut in_class = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'[' => in_class = true,
            b']' => in_class = false,
            b'(' if !in_class => {
                let rest = &regex[i + 1..];
                let named = rest.strip_prefix("?P<").or_else(|| {
                    rest.strip_prefix("?<")
                        .filter(|r| !r.starts_with(['=', '!']))
                });
                if let Some(after) = named {
                    if let Some(end) = after.find('>') {
                        out.push_str(&regex[copied..=i]);
                        out.push_str("?:");
                        copied = i + 1 + (rest.len() - after.len()) + end + 1;
                        i = copied;
                        continue;
                    }
                } else if !rest.starts_with(['?', '*']) {
                    out.push_str(&regex[copied..=i]);
                    out.push_str("?:");
                    copied = i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    out.push_str(&regex[copied.min(regex.len())..]);
    out
}
