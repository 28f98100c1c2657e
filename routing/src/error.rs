//! Error types for route compilation and matching.

use thiserror::Error;

/// Errors raised while compiling routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Placeholder names must not start with a digit.
    #[error(
        "Variable name \"{name}\" cannot start with a digit in route pattern \"{pattern}\". Please use a different name."
    )]
    VariableStartsWithDigit { name: String, pattern: String },

    /// Placeholder names are limited in length.
    #[error(
        "Variable name \"{name}\" cannot be longer than {max} characters in route pattern \"{pattern}\". Please use a shorter name."
    )]
    VariableTooLong {
        name: String,
        pattern: String,
        max: usize,
    },

    /// A pattern references the same placeholder twice.
    #[error("Route pattern \"{pattern}\" cannot reference variable name \"{name}\" more than once.")]
    DuplicateVariable { name: String, pattern: String },

    /// A requirement is empty after stripping anchors.
    #[error("Routing requirement for \"{0}\" cannot be empty.")]
    EmptyRequirement(String),

    /// A requirement or generated pattern is not a valid regex.
    #[error("Invalid regex for route \"{route}\": {message}")]
    InvalidRegex { route: String, message: String },

    /// A single route produces a regex larger than the engine accepts.
    #[error("Compiled regex is too large even for a single route (\"{0}\").")]
    RegexTooLarge(String),
}

/// Errors raised when a request matches no route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// No route matched structurally, or only scheme/condition/trailing
    /// slash checks failed.
    #[error("No routes found for \"{path}\".")]
    NotFound { path: String },

    /// At least one route matched structurally but none accepted the method.
    #[error("No route found for \"{path}\": method not allowed (allow: {}).", .allowed.join(", "))]
    MethodNotAllowed { path: String, allowed: Vec<String> },
}

impl MatchError {
    /// Allowed methods for a method mismatch, empty otherwise.
    pub fn allowed_methods(&self) -> &[String] {
        match self {
            Self::MethodNotAllowed { allowed, .. } => allowed,
            Self::NotFound { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_not_allowed_message() {
        let err = MatchError::MethodNotAllowed {
            path: "/foo".into(),
            allowed: vec!["GET".into(), "POST".into()],
        };
        assert_eq!(
            err.to_string(),
            "No route found for \"/foo\": method not allowed (allow: GET, POST)."
        );
        assert_eq!(err.allowed_methods(), ["GET", "POST"]);
    }

    #[test]
    fn test_variable_errors_name_the_pattern() {
        let err = RouteError::VariableStartsWithDigit {
            name: "1st".into(),
            pattern: "/{1st}".into(),
        };
        assert!(err.to_string().contains("\"/{1st}\""));
    }
}
