//! Bound input state and the contract shared by all input sources.
//!
//! Every source ([`ArgvInput`](crate::ArgvInput),
//! [`StringInput`](crate::StringInput), [`ArrayInput`](crate::ArrayInput))
//! binds against an [`InputDefinition`] and produces a [`ParsedInput`]. Only
//! values actually supplied are stored; reads fall back to the definition's
//! defaults.

use indexmap::IndexMap;
use tracing::trace;

use crate::definition::InputDefinition;
use crate::error::{InputError, NotFoundError};
use crate::value::InputValue;

/// A raw input that can be bound against a definition.
pub trait InputSource {
    /// Parses the raw input against `definition`.
    ///
    /// Binding does not check required arguments; call
    /// [`ParsedInput::validate`] (or [`parse`](InputSource::parse)) for that.
    fn bind(&self, definition: &InputDefinition) -> Result<ParsedInput, InputError>;

    /// First positional-looking token, inspected without a definition.
    fn first_argument(&self) -> Option<&str>;

    /// Returns `true` if any of `names` (with dashes, e.g. `--help`, `-h`)
    /// appears in the raw input.
    ///
    /// With `only_params`, tokens after a bare `--` are ignored.
    fn has_parameter_option(&self, names: &[&str], only_params: bool) -> bool;

    /// Raw value following the first of `names` found in the input.
    ///
    /// Returns `None` when no name is present and `Some(InputValue::Null)`
    /// when the option is present but no value follows it.
    fn parameter_option(&self, names: &[&str], only_params: bool) -> Option<InputValue>;

    /// Binds and validates in one step.
    fn parse(&self, definition: &InputDefinition) -> Result<ParsedInput, InputError> {
        let input = self.bind(definition)?;
        input.validate()?;
        Ok(input)
    }
}

/// Arguments and options bound against a definition.
#[derive(Debug, Clone)]
pub struct ParsedInput {
    definition: InputDefinition,
    arguments: IndexMap<String, InputValue>,
    options: IndexMap<String, InputValue>,
    interactive: bool,
}

impl ParsedInput {
    /// Checks that every required argument received a value.
    ///
    /// All missing arguments are reported in one error.
    pub fn validate(&self) -> Result<(), InputError> {
        let missing: Vec<String> = self
            .definition
            .arguments()
            .filter(|arg| arg.is_required() && !self.arguments.contains_key(arg.name()))
            .map(|arg| arg.name().to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(InputError::NotEnoughArguments(missing))
        }
    }

    /// Definition this input was bound against.
    pub fn definition(&self) -> &InputDefinition {
        &self.definition
    }

    /// All arguments, defaults merged with supplied values.
    pub fn arguments(&self) -> IndexMap<String, InputValue> {
        let mut merged = self.definition.argument_defaults();
        for (name, value) in &self.arguments {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }

    /// Only the arguments that were actually supplied.
    pub fn given_arguments(&self) -> &IndexMap<String, InputValue> {
        &self.arguments
    }

    /// Value of one argument, or its default.
    pub fn argument(&self, name: &str) -> Result<&InputValue, InputError> {
        let declared = self.definition.argument(name)?;
        Ok(self.arguments.get(name).unwrap_or(declared.default_value()))
    }

    /// Overrides an argument value.
    pub fn set_argument(
        &mut self,
        name: &str,
        value: impl Into<InputValue>,
    ) -> Result<(), InputError> {
        self.definition.argument(name)?;
        self.arguments.insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn has_argument(&self, name: &str) -> bool {
        self.definition.has_argument(name)
    }

    /// All options, defaults merged with supplied values.
    pub fn options(&self) -> IndexMap<String, InputValue> {
        let mut merged = self.definition.option_defaults();
        for (name, value) in &self.options {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }

    /// Only the options that were actually supplied.
    pub fn given_options(&self) -> &IndexMap<String, InputValue> {
        &self.options
    }

    /// Value of one option, or its default.
    ///
    /// A negation name (`no-foo`) yields the inverse of `foo`, or `Null`
    /// when `foo` is unset.
    pub fn option(&self, name: &str) -> Result<InputValue, InputError> {
        if self.definition.has_negation(name) {
            let target = self.definition.negation_to_name(name)?;
            return Ok(match self.option(target)? {
                InputValue::Null => InputValue::Null,
                value => InputValue::Bool(!value.is_truthy()),
            });
        }
        let declared = self.definition.option(name)?;
        Ok(self
            .options
            .get(name)
            .unwrap_or(declared.default_value())
            .clone())
    }

    /// Overrides an option value; a negation name stores the inverse.
    pub fn set_option(
        &mut self,
        name: &str,
        value: impl Into<InputValue>,
    ) -> Result<(), InputError> {
        let value = value.into();
        if self.definition.has_negation(name) {
            let target = self.definition.negation_to_name(name)?.to_string();
            self.options
                .insert(target, InputValue::Bool(!value.is_truthy()));
            return Ok(());
        }
        self.definition.option(name)?;
        self.options.insert(name.to_string(), value);
        Ok(())
    }

    /// Returns `true` for declared options and negations.
    pub fn has_option(&self, name: &str) -> bool {
        self.definition.has_option(name) || self.definition.has_negation(name)
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }
}

/// Quotes a token for a POSIX shell unless it is a plain word.
///
/// ```
/// use waypost_console::escape_token;
///
/// assert_eq!(escape_token("foo-bar_1"), "foo-bar_1");
/// assert_eq!(escape_token("a b"), "'a b'");
/// assert_eq!(escape_token("it's"), r"'it'\''s'");
/// ```
pub fn escape_token(token: &str) -> String {
    let plain = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if plain {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}

/// Mutable binding state shared by the input sources.
pub(crate) struct Binder<'d> {
    definition: &'d InputDefinition,
    arguments: IndexMap<String, InputValue>,
    options: IndexMap<String, InputValue>,
}

impl<'d> Binder<'d> {
    pub(crate) fn new(definition: &'d InputDefinition) -> Self {
        Self {
            definition,
            arguments: IndexMap::new(),
            options: IndexMap::new(),
        }
    }

    pub(crate) fn definition(&self) -> &'d InputDefinition {
        self.definition
    }

    pub(crate) fn finish(self) -> ParsedInput {
        ParsedInput {
            definition: self.definition.clone(),
            arguments: self.arguments,
            options: self.options,
            interactive: true,
        }
    }

    /// Places a positional token into the next free argument slot.
    pub(crate) fn push_argument(&mut self, token: String) -> Result<(), InputError> {
        let definition = self.definition;
        let count = self.arguments.len();

        if let Ok(argument) = definition.argument(count) {
            trace!(argument = argument.name(), value = %token, "bound positional argument");
            let value = if argument.is_array() {
                InputValue::List(vec![token])
            } else {
                InputValue::String(token)
            };
            self.arguments.insert(argument.name().to_string(), value);
            return Ok(());
        }

        if let Some(last) = count.checked_sub(1).and_then(|i| definition.argument(i).ok()) {
            if last.is_array() {
                if let Some(InputValue::List(values)) = self.arguments.get_mut(last.name()) {
                    values.push(token);
                    return Ok(());
                }
            }
        }

        let mut expected: Vec<String> = definition
            .arguments()
            .map(|arg| arg.name().to_string())
            .collect();
        let mut command = None;
        if expected.first().is_some_and(|first| first == "command") {
            expected.remove(0);
            command = self
                .arguments
                .get("command")
                .and_then(InputValue::as_str)
                .map(String::from);
        }
        Err(InputError::TooManyArguments {
            command,
            expected,
            token,
        })
    }

    /// Sets a named argument directly (array-style input).
    pub(crate) fn set_argument(&mut self, name: &str, value: InputValue) -> Result<(), InputError> {
        let argument = self.definition.argument(name)?;
        let value = match value {
            InputValue::String(s) if argument.is_array() => InputValue::List(vec![s]),
            other => other,
        };
        self.arguments.insert(name.to_string(), value);
        Ok(())
    }

    /// Records a `--no-<name>` occurrence, if `name` is a known negation.
    ///
    /// Returns `Ok(false)` when `name` is not a negation.
    pub(crate) fn negate(&mut self, name: &str, has_value: bool) -> Result<bool, InputError> {
        let definition = self.definition;
        if !definition.has_negation(name) {
            return Ok(false);
        }
        if has_value {
            return Err(InputError::UnexpectedValue(name.to_string()));
        }
        let target = definition.negation_to_name(name)?;
        self.options
            .insert(target.to_string(), InputValue::Bool(false));
        Ok(true)
    }

    /// Stores a resolved option value, appending for array options.
    pub(crate) fn store_option(&mut self, name: &str, value: InputValue) -> Result<(), InputError> {
        let option = self.definition.option(name)?;
        if !option.is_array() {
            self.options.insert(name.to_string(), value);
            return Ok(());
        }
        let entry = self
            .options
            .entry(name.to_string())
            .or_insert_with(|| InputValue::List(Vec::new()));
        if let InputValue::List(values) = entry {
            match value {
                InputValue::String(v) => values.push(v),
                InputValue::List(vs) => values.extend(vs),
                _ => {}
            }
        }
        Ok(())
    }

    /// Resolves a shortcut to its option name.
    pub(crate) fn shortcut_name(&self, shortcut: char) -> Result<&'d str, InputError> {
        let definition = self.definition;
        definition
            .shortcut_to_name(shortcut)
            .map_err(|_| InputError::UnknownOption(format!("-{shortcut}")))
    }
}
