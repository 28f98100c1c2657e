//! Values bound to arguments and options.

use serde::{Deserialize, Serialize};

/// A value bound to an argument or option.
///
/// Values are either absent ([`Null`](InputValue::Null)), a boolean (flag
/// options and negations), a string, or a list of strings (array arguments
/// and array options).
///
/// # Examples
///
/// ```
/// use waypost_console::InputValue;
///
/// assert_eq!(InputValue::from("bar").as_str(), Some("bar"));
/// assert_eq!(InputValue::from(true).as_bool(), Some(true));
/// assert!(InputValue::default().is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    /// No value.
    #[default]
    Null,
    /// Boolean value (flags and negatable options).
    Bool(bool),
    /// Single string value.
    String(String),
    /// Sequence of string values.
    List(Vec<String>),
}

impl InputValue {
    /// Returns `true` for [`InputValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for [`InputValue::List`].
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Loose truthiness used when inverting negatable options.
    pub(crate) fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::String(s) => !s.is_empty() && s != "0",
            Self::List(values) => !values.is_empty(),
        }
    }

    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the list payload, if any.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for InputValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for InputValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(String::from).collect())
    }
}

impl<T: Into<InputValue>> From<Option<T>> for InputValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
