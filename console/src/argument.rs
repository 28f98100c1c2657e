//! Positional argument declarations.

use crate::error::DefinitionError;
use crate::suggestions::Suggestions;
use crate::value::InputValue;

/// Arity of a positional argument.
///
/// Array arguments are always optional and must be the last argument of a
/// definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgumentMode {
    /// Must be supplied.
    Required,
    /// May be omitted (the default).
    #[default]
    Optional,
    /// Absorbs every remaining positional token.
    OptionalArray,
}

impl ArgumentMode {
    /// Bit for [`ArgumentMode::Required`].
    pub const REQUIRED: u8 = 1;
    /// Bit for [`ArgumentMode::Optional`].
    pub const OPTIONAL: u8 = 2;
    /// Bit marking an array argument; only valid alongside `OPTIONAL`.
    pub const IS_ARRAY: u8 = 4;

    /// Returns `true` for [`ArgumentMode::Required`].
    pub fn is_required(self) -> bool {
        matches!(self, Self::Required)
    }

    /// Returns `true` for [`ArgumentMode::OptionalArray`].
    pub fn is_array(self) -> bool {
        matches!(self, Self::OptionalArray)
    }
}

impl TryFrom<u8> for ArgumentMode {
    type Error = DefinitionError;

    /// Converts a bitmask of [`REQUIRED`](Self::REQUIRED),
    /// [`OPTIONAL`](Self::OPTIONAL) and [`IS_ARRAY`](Self::IS_ARRAY).
    ///
    /// ```
    /// use waypost_console::ArgumentMode;
    ///
    /// let mode = ArgumentMode::try_from(ArgumentMode::OPTIONAL | ArgumentMode::IS_ARRAY).unwrap();
    /// assert_eq!(mode, ArgumentMode::OptionalArray);
    /// assert!(ArgumentMode::try_from(ArgumentMode::REQUIRED | ArgumentMode::IS_ARRAY).is_err());
    /// ```
    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            Self::REQUIRED => Ok(Self::Required),
            Self::OPTIONAL => Ok(Self::Optional),
            b if b == Self::IS_ARRAY || b == Self::OPTIONAL | Self::IS_ARRAY => {
                Ok(Self::OptionalArray)
            }
            other => Err(DefinitionError::InvalidArgumentMode(other)),
        }
    }
}

/// A positional argument declaration.
///
/// # Examples
///
/// ```
/// use waypost_console::{ArgumentMode, InputArgument, InputValue};
///
/// let tags = InputArgument::new("tags", ArgumentMode::OptionalArray)
///     .unwrap()
///     .with_description("Tags to apply");
/// assert!(tags.is_array());
/// assert_eq!(tags.default_value(), &InputValue::List(vec![]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InputArgument {
    name: String,
    mode: ArgumentMode,
    description: String,
    default: InputValue,
    suggestions: Suggestions,
}

impl InputArgument {
    /// Creates an argument with the mode's implicit default.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::EmptyArgumentName`] for an empty name.
    pub fn new(name: impl Into<String>, mode: ArgumentMode) -> Result<Self, DefinitionError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DefinitionError::EmptyArgumentName);
        }
        let default = if mode.is_array() {
            InputValue::List(Vec::new())
        } else {
            InputValue::Null
        };
        Ok(Self {
            name,
            mode,
            description: String::new(),
            default,
            suggestions: Suggestions::None,
        })
    }

    /// Sets the default value.
    ///
    /// `Null` resets to the mode's implicit default.
    ///
    /// # Errors
    ///
    /// Required arguments reject any non-null default; array arguments
    /// require a list and scalar arguments reject one.
    pub fn with_default(mut self, default: impl Into<InputValue>) -> Result<Self, DefinitionError> {
        let default = default.into();
        match (self.mode, default) {
            (ArgumentMode::Required, InputValue::Null) => {}
            (ArgumentMode::Required, _) => return Err(DefinitionError::RequiredArgumentDefault),
            (ArgumentMode::OptionalArray, InputValue::Null) => {
                self.default = InputValue::List(Vec::new());
            }
            (ArgumentMode::OptionalArray, list @ InputValue::List(_)) => self.default = list,
            (ArgumentMode::OptionalArray, _) => {
                return Err(DefinitionError::ArrayDefaultNotList("argument"));
            }
            (ArgumentMode::Optional, InputValue::List(_)) => {
                return Err(DefinitionError::ScalarDefaultIsList("argument"));
            }
            (ArgumentMode::Optional, value) => self.default = value,
        }
        Ok(self)
    }

    /// Sets the help description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attaches a completion source.
    pub fn with_suggestions(mut self, suggestions: Suggestions) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> ArgumentMode {
        self.mode
    }

    pub fn is_required(&self) -> bool {
        self.mode.is_required()
    }

    pub fn is_array(&self) -> bool {
        self.mode.is_array()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn default_value(&self) -> &InputValue {
        &self.default
    }

    pub fn suggestions(&self) -> &Suggestions {
        &self.suggestions
    }

    /// Completion values for a partially typed argument.
    pub fn complete(&self, partial: &str) -> Vec<String> {
        self.suggestions.complete(partial)
    }
}
