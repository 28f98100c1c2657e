//! Completion suggestion sources for arguments and options.

use std::fmt;
use std::sync::Arc;

/// Callback producing suggestions from the partially typed value.
pub type SuggestionCallback = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Where completion values for an argument or option come from.
///
/// # Examples
///
/// ```
/// use waypost_console::Suggestions;
///
/// let fixed = Suggestions::values(["json", "yaml", "toml"]);
/// assert_eq!(fixed.complete("y"), vec!["yaml"]);
///
/// let late = Suggestions::callback(|partial| vec![format!("{partial}-1")]);
/// assert_eq!(late.complete("v"), vec!["v-1"]);
/// ```
#[derive(Clone, Default)]
pub enum Suggestions {
    /// No completion support.
    #[default]
    None,
    /// Fixed list, filtered by prefix at completion time.
    Values(Vec<String>),
    /// Late-bound source, receives the partial input verbatim.
    Callback(SuggestionCallback),
}

impl Suggestions {
    /// Creates a fixed suggestion list.
    pub fn values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Values(values.into_iter().map(Into::into).collect())
    }

    /// Creates a late-bound suggestion source.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&str) -> Vec<String> + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(f))
    }

    /// Returns `true` when completion values are available.
    pub fn has_completion(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Produces completion values for `partial`.
    pub fn complete(&self, partial: &str) -> Vec<String> {
        match self {
            Self::None => Vec::new(),
            Self::Values(values) => values
                .iter()
                .filter(|v| v.starts_with(partial))
                .cloned()
                .collect(),
            Self::Callback(f) => f(partial),
        }
    }
}

impl fmt::Debug for Suggestions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Values(values) => f.debug_tuple("Values").field(values).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl PartialEq for Suggestions {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Values(a), Self::Values(b)) => a == b,
            (Self::Callback(a), Self::Callback(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
