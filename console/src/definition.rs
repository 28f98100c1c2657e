//! Input definitions: the schema user input is validated against.
//!
//! An [`InputDefinition`] holds the ordered positional arguments, the named
//! options, and two derived indexes (shortcut → option, negation → option).
//! The indexes are only ever written by [`InputDefinition::add_option`] and
//! the rebuild performed by [`InputDefinition::set_options`], after the
//! incoming option has been fully checked, so a failed call leaves the
//! definition untouched.
//!
//! # Examples
//!
//! ```
//! use waypost_console::*;
//!
//! let definition = InputDefinition::builder()
//!     .argument(InputArgument::new("name", ArgumentMode::Required)?)
//!     .argument(InputArgument::new("tags", ArgumentMode::OptionalArray)?)
//!     .option(InputOption::new("format", Some("f"), OptionMode::ValueRequired)?)
//!     .option(InputOption::new("color", None, OptionMode::Negatable)?)
//!     .build()?;
//!
//! assert_eq!(
//!     definition.synopsis(false),
//!     "[-f|--format FORMAT] [--color|--no-color] [--] <name> [<tags>...]"
//! );
//! assert_eq!(definition.synopsis(true), "[options] [--] <name> [<tags>...]");
//! # Ok::<(), DefinitionError>(())
//! ```

use indexmap::IndexMap;

use crate::argument::InputArgument;
use crate::error::{DefinitionError, NotFoundError};
use crate::option::InputOption;
use crate::value::InputValue;

/// Argument lookup key: a name or a 0-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentRef<'a> {
    Name(&'a str),
    Position(usize),
}

impl<'a> From<&'a str> for ArgumentRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for ArgumentRef<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for ArgumentRef<'_> {
    fn from(position: usize) -> Self {
        Self::Position(position)
    }
}

/// Declared arguments and options of a command.
#[derive(Debug, Clone, Default)]
pub struct InputDefinition {
    arguments: IndexMap<String, InputArgument>,
    options: IndexMap<String, InputOption>,
    shortcuts: IndexMap<char, String>,
    negations: IndexMap<String, String>,
}

impl InputDefinition {
    /// Creates an empty definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a builder that collects declarations and validates them once.
    pub fn builder() -> InputDefinitionBuilder {
        InputDefinitionBuilder::default()
    }

    // ---------------------------------------------------------------------
    // Arguments
    // ---------------------------------------------------------------------

    /// Replaces all arguments.
    ///
    /// On error the previous arguments are kept.
    pub fn set_arguments(
        &mut self,
        arguments: impl IntoIterator<Item = InputArgument>,
    ) -> Result<(), DefinitionError> {
        let previous = std::mem::take(&mut self.arguments);
        if let Err(err) = self.add_arguments(arguments) {
            self.arguments = previous;
            return Err(err);
        }
        Ok(())
    }

    /// Adds several arguments in order, stopping at the first error.
    pub fn add_arguments(
        &mut self,
        arguments: impl IntoIterator<Item = InputArgument>,
    ) -> Result<(), DefinitionError> {
        for argument in arguments {
            self.add_argument(argument)?;
        }
        Ok(())
    }

    /// Adds one positional argument.
    ///
    /// # Errors
    ///
    /// - [`DefinitionError::DuplicateArgument`] when the name is taken.
    /// - [`DefinitionError::ArgumentAfterArray`] when the last argument is an
    ///   array argument.
    /// - [`DefinitionError::RequiredAfterOptional`] when a required argument
    ///   follows an optional one.
    pub fn add_argument(&mut self, argument: InputArgument) -> Result<(), DefinitionError> {
        if self.arguments.contains_key(argument.name()) {
            return Err(DefinitionError::DuplicateArgument(argument.name().to_string()));
        }
        if let Some((_, last)) = self.arguments.last() {
            if last.is_array() {
                return Err(DefinitionError::ArgumentAfterArray);
            }
            if argument.is_required() && !last.is_required() {
                return Err(DefinitionError::RequiredAfterOptional);
            }
        }
        self.arguments.insert(argument.name().to_string(), argument);
        Ok(())
    }

    /// Looks up an argument by name or position.
    ///
    /// ```
    /// use waypost_console::*;
    ///
    /// let mut definition = InputDefinition::new();
    /// definition.add_argument(InputArgument::new("src", ArgumentMode::Required)?)?;
    /// assert_eq!(definition.argument(0)?.name(), "src");
    /// assert_eq!(definition.argument("src")?.name(), "src");
    /// assert!(definition.argument(1).is_err());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn argument<'a>(
        &self,
        key: impl Into<ArgumentRef<'a>>,
    ) -> Result<&InputArgument, NotFoundError> {
        match key.into() {
            ArgumentRef::Name(name) => self
                .arguments
                .get(name)
                .ok_or_else(|| NotFoundError::Argument(name.to_string())),
            ArgumentRef::Position(pos) => self
                .arguments
                .get_index(pos)
                .map(|(_, arg)| arg)
                .ok_or(NotFoundError::ArgumentPosition(pos)),
        }
    }

    /// Returns `true` if an argument exists for the name or position.
    pub fn has_argument<'a>(&self, key: impl Into<ArgumentRef<'a>>) -> bool {
        match key.into() {
            ArgumentRef::Name(name) => self.arguments.contains_key(name),
            ArgumentRef::Position(pos) => pos < self.arguments.len(),
        }
    }

    /// Arguments in positional order.
    pub fn arguments(&self) -> impl Iterator<Item = &InputArgument> {
        self.arguments.values()
    }

    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    pub fn argument_required_count(&self) -> usize {
        self.arguments.values().filter(|a| a.is_required()).count()
    }

    /// Default value of every argument, keyed by name in positional order.
    pub fn argument_defaults(&self) -> IndexMap<String, InputValue> {
        self.arguments
            .iter()
            .map(|(name, arg)| (name.clone(), arg.default_value().clone()))
            .collect()
    }

    // ---------------------------------------------------------------------
    // Options
    // ---------------------------------------------------------------------

    /// Replaces all options and rebuilds the shortcut and negation indexes.
    ///
    /// On error the previous options are kept.
    pub fn set_options(
        &mut self,
        options: impl IntoIterator<Item = InputOption>,
    ) -> Result<(), DefinitionError> {
        let previous_options = std::mem::take(&mut self.options);
        let previous_shortcuts = std::mem::take(&mut self.shortcuts);
        let previous_negations = std::mem::take(&mut self.negations);
        if let Err(err) = self.add_options(options) {
            self.options = previous_options;
            self.shortcuts = previous_shortcuts;
            self.negations = previous_negations;
            return Err(err);
        }
        Ok(())
    }

    /// Adds several options in order, stopping at the first error.
    pub fn add_options(
        &mut self,
        options: impl IntoIterator<Item = InputOption>,
    ) -> Result<(), DefinitionError> {
        for option in options {
            self.add_option(option)?;
        }
        Ok(())
    }

    /// Adds one option.
    ///
    /// Re-adding an option equivalent to an existing one (same name,
    /// shortcuts, mode and default) succeeds and replaces it.
    ///
    /// # Errors
    ///
    /// - [`DefinitionError::DuplicateOption`] when a different option (or a
    ///   negation) already uses the name, or when this option's negation
    ///   collides with an existing option.
    /// - [`DefinitionError::DuplicateShortcut`] when a shortcut belongs to a
    ///   different option.
    pub fn add_option(&mut self, option: InputOption) -> Result<(), DefinitionError> {
        let name = option.name();
        if let Some(existing) = self.options.get(name) {
            if !option.is_equivalent(existing) {
                return Err(DefinitionError::DuplicateOption(name.to_string()));
            }
        }
        if self.negations.contains_key(name) {
            return Err(DefinitionError::DuplicateOption(name.to_string()));
        }
        for shortcut in option.shortcuts() {
            if let Some(owner) = self.shortcuts.get(shortcut) {
                let same = self
                    .options
                    .get(owner)
                    .is_some_and(|existing| option.is_equivalent(existing));
                if !same {
                    return Err(DefinitionError::DuplicateShortcut(*shortcut));
                }
            }
        }
        let negation = option.negation();
        if let Some(negated) = &negation {
            if self.options.contains_key(negated) {
                return Err(DefinitionError::DuplicateOption(negated.clone()));
            }
        }

        let name = name.to_string();
        for shortcut in option.shortcuts() {
            self.shortcuts.insert(*shortcut, name.clone());
        }
        if let Some(negated) = negation {
            self.negations.insert(negated, name.clone());
        }
        self.options.insert(name, option);
        Ok(())
    }

    /// Looks up an option by name (without dashes).
    pub fn option(&self, name: &str) -> Result<&InputOption, NotFoundError> {
        self.options
            .get(name)
            .ok_or_else(|| NotFoundError::Option(name.to_string()))
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    /// Options in declaration order.
    pub fn options(&self) -> impl Iterator<Item = &InputOption> {
        self.options.values()
    }

    pub fn has_shortcut(&self, shortcut: char) -> bool {
        self.shortcuts.contains_key(&shortcut)
    }

    /// Returns `true` if `name` is the `no-<option>` form of a negatable option.
    pub fn has_negation(&self, name: &str) -> bool {
        self.negations.contains_key(name)
    }

    /// Looks up the option a shortcut belongs to.
    pub fn option_for_shortcut(&self, shortcut: char) -> Result<&InputOption, NotFoundError> {
        let name = self.shortcut_to_name(shortcut)?;
        self.option(name)
    }

    /// Resolves a shortcut to its option name.
    pub fn shortcut_to_name(&self, shortcut: char) -> Result<&str, NotFoundError> {
        self.shortcuts
            .get(&shortcut)
            .map(String::as_str)
            .ok_or(NotFoundError::Shortcut(shortcut))
    }

    /// Resolves a negation (`no-foo`) to the negated option name (`foo`).
    pub fn negation_to_name(&self, negation: &str) -> Result<&str, NotFoundError> {
        self.negations
            .get(negation)
            .map(String::as_str)
            .ok_or_else(|| NotFoundError::Option(negation.to_string()))
    }

    /// Default value of every option, keyed by name in declaration order.
    pub fn option_defaults(&self) -> IndexMap<String, InputValue> {
        self.options
            .iter()
            .map(|(name, opt)| (name.clone(), opt.default_value().clone()))
            .collect()
    }

    // ---------------------------------------------------------------------
    // Help
    // ---------------------------------------------------------------------

    /// Builds a one-line usage string.
    ///
    /// In short mode all options collapse to `[options]`.
    pub fn synopsis(&self, short: bool) -> String {
        let mut elements = Vec::new();

        if short && !self.options.is_empty() {
            elements.push("[options]".to_string());
        } else if !short {
            for option in self.options.values() {
                let value = if option.accepts_value() {
                    let placeholder = option.name().to_uppercase();
                    if option.is_value_optional() {
                        format!(" [{placeholder}]")
                    } else {
                        format!(" {placeholder}")
                    }
                } else {
                    String::new()
                };
                let shortcut = option
                    .shortcut_string()
                    .map(|s| format!("-{}|", s.replace('|', "|-")))
                    .unwrap_or_default();
                let negation = option
                    .negation()
                    .map(|n| format!("|--{n}"))
                    .unwrap_or_default();
                elements.push(format!(
                    "[{shortcut}--{}{value}{negation}]",
                    option.name()
                ));
            }
        }

        if !elements.is_empty() && !self.arguments.is_empty() {
            elements.push("[--]".to_string());
        }

        let mut tail = String::new();
        for argument in self.arguments.values() {
            let mut element = format!("<{}>", argument.name());
            if argument.is_array() {
                element.push_str("...");
            }
            if !argument.is_required() {
                element.insert(0, '[');
                tail.push(']');
            }
            elements.push(element);
        }

        elements.join(" ") + &tail
    }
}

/// Collects arguments and options, then validates them in one pass.
///
/// Errors are reported by [`build`](InputDefinitionBuilder::build) in
/// declaration order: arguments first, then options.
#[derive(Debug, Default)]
pub struct InputDefinitionBuilder {
    arguments: Vec<InputArgument>,
    options: Vec<InputOption>,
}

impl InputDefinitionBuilder {
    /// Appends a positional argument.
    pub fn argument(mut self, argument: InputArgument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Appends an option.
    pub fn option(mut self, option: InputOption) -> Self {
        self.options.push(option);
        self
    }

    /// Validates the declarations and derives the lookup indexes.
    pub fn build(self) -> Result<InputDefinition, DefinitionError> {
        let mut definition = InputDefinition::new();
        definition.add_arguments(self.arguments)?;
        definition.add_options(self.options)?;
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArgumentMode, OptionMode};

    fn arg(name: &str, mode: ArgumentMode) -> InputArgument {
        InputArgument::new(name, mode).unwrap()
    }

    fn opt(name: &str, shortcut: Option<&str>, mode: OptionMode) -> InputOption {
        InputOption::new(name, shortcut, mode).unwrap()
    }

    #[test]
    fn test_add_argument_rejects_duplicate_name() {
        let mut definition = InputDefinition::new();
        definition.add_argument(arg("foo", ArgumentMode::Optional)).unwrap();
        assert_eq!(
            definition.add_argument(arg("foo", ArgumentMode::Optional)),
            Err(DefinitionError::DuplicateArgument("foo".into()))
        );
    }

    #[test]
    fn test_add_argument_after_array_fails() {
        let mut definition = InputDefinition::new();
        definition.add_argument(arg("files", ArgumentMode::OptionalArray)).unwrap();
        for mode in [
            ArgumentMode::Required,
            ArgumentMode::Optional,
            ArgumentMode::OptionalArray,
        ] {
            assert_eq!(
                definition.add_argument(arg("next", mode)),
                Err(DefinitionError::ArgumentAfterArray)
            );
        }
    }

    #[test]
    fn test_required_after_optional_fails() {
        let mut definition = InputDefinition::new();
        definition.add_argument(arg("foo", ArgumentMode::Optional)).unwrap();
        assert_eq!(
            definition.add_argument(arg("bar", ArgumentMode::Required)),
            Err(DefinitionError::RequiredAfterOptional)
        );
    }

    #[test]
    fn test_set_arguments_restores_on_error() {
        let mut definition = InputDefinition::new();
        definition.add_argument(arg("keep", ArgumentMode::Required)).unwrap();
        let result = definition.set_arguments([
            arg("a", ArgumentMode::Optional),
            arg("b", ArgumentMode::Required),
        ]);
        assert!(result.is_err());
        assert_eq!(definition.argument_count(), 1);
        assert!(definition.has_argument("keep"));
    }

    #[test]
    fn test_argument_counts_and_defaults() {
        let definition = InputDefinition::builder()
            .argument(arg("foo1", ArgumentMode::Required))
            .argument(
                arg("foo2", ArgumentMode::Optional)
                    .with_default("default")
                    .unwrap(),
            )
            .argument(arg("foo3", ArgumentMode::OptionalArray))
            .build()
            .unwrap();
        assert_eq!(definition.argument_count(), 3);
        assert_eq!(definition.argument_required_count(), 1);

        let defaults = definition.argument_defaults();
        assert_eq!(defaults["foo1"], InputValue::Null);
        assert_eq!(defaults["foo2"], InputValue::from("default"));
        assert_eq!(defaults["foo3"], InputValue::List(vec![]));
    }

    #[test]
    fn test_add_option_conflicts() {
        let mut definition = InputDefinition::new();
        definition.add_option(opt("foo", Some("f"), OptionMode::None)).unwrap();

        // equivalent re-registration is accepted
        definition
            .add_option(opt("foo", Some("f"), OptionMode::None).with_description("again"))
            .unwrap();

        assert_eq!(
            definition.add_option(opt("foo", None, OptionMode::ValueRequired)),
            Err(DefinitionError::DuplicateOption("foo".into()))
        );
        assert_eq!(
            definition.add_option(opt("bar", Some("f"), OptionMode::None)),
            Err(DefinitionError::DuplicateShortcut('f'))
        );
    }

    #[test]
    fn test_negation_name_collisions() {
        let mut definition = InputDefinition::new();
        definition.add_option(opt("color", None, OptionMode::Negatable)).unwrap();
        assert_eq!(
            definition.add_option(opt("no-color", None, OptionMode::None)),
            Err(DefinitionError::DuplicateOption("no-color".into()))
        );

        let mut definition = InputDefinition::new();
        definition.add_option(opt("no-cache", None, OptionMode::None)).unwrap();
        assert_eq!(
            definition.add_option(opt("cache", None, OptionMode::Negatable)),
            Err(DefinitionError::DuplicateOption("no-cache".into()))
        );
    }

    #[test]
    fn test_set_options_rebuilds_shortcuts() {
        let mut definition = InputDefinition::new();
        definition.add_option(opt("foo", Some("f"), OptionMode::None)).unwrap();
        definition
            .set_options([opt("bar", Some("b"), OptionMode::None)])
            .unwrap();
        assert!(!definition.has_shortcut('f'));
        assert_eq!(
            definition.option_for_shortcut('f').unwrap_err(),
            NotFoundError::Shortcut('f')
        );
        assert_eq!(definition.option_for_shortcut('b').unwrap().name(), "bar");
    }

    #[test]
    fn test_lookup_errors() {
        let definition = InputDefinition::new();
        assert_eq!(
            definition.argument("bar").unwrap_err().to_string(),
            "The \"bar\" argument does not exist."
        );
        assert_eq!(
            definition.option("bar").unwrap_err().to_string(),
            "The \"--bar\" option does not exist."
        );
        assert_eq!(
            definition.option_for_shortcut('l').unwrap_err().to_string(),
            "The \"-l\" option does not exist."
        );
    }

    #[test]
    fn test_option_defaults() {
        let definition = InputDefinition::builder()
            .option(opt("foo1", None, OptionMode::None))
            .option(opt("foo2", None, OptionMode::ValueRequired))
            .option(
                opt("foo3", None, OptionMode::ValueRequired)
                    .with_default("default")
                    .unwrap(),
            )
            .option(opt("foo6", None, OptionMode::ArrayOptional))
            .option(
                opt("foo7", None, OptionMode::ArrayOptional)
                    .with_default(vec!["1", "2"])
                    .unwrap(),
            )
            .build()
            .unwrap();
        let defaults = definition.option_defaults();
        assert_eq!(defaults["foo1"], InputValue::Bool(false));
        assert_eq!(defaults["foo2"], InputValue::Null);
        assert_eq!(defaults["foo3"], InputValue::from("default"));
        assert_eq!(defaults["foo6"], InputValue::List(vec![]));
        assert_eq!(defaults["foo7"], InputValue::from(vec!["1", "2"]));
    }

    #[test]
    fn test_synopsis_forms() {
        let cases: Vec<(InputDefinition, &str)> = vec![
            (
                InputDefinition::builder()
                    .option(opt("foo", None, OptionMode::None))
                    .build()
                    .unwrap(),
                "[--foo]",
            ),
            (
                InputDefinition::builder()
                    .option(opt("foo", Some("f"), OptionMode::None))
                    .build()
                    .unwrap(),
                "[-f|--foo]",
            ),
            (
                InputDefinition::builder()
                    .option(opt("foo", Some("f|g"), OptionMode::ValueRequired))
                    .build()
                    .unwrap(),
                "[-f|-g|--foo FOO]",
            ),
            (
                InputDefinition::builder()
                    .option(opt("foo", Some("f"), OptionMode::ValueOptional))
                    .build()
                    .unwrap(),
                "[-f|--foo [FOO]]",
            ),
            (
                InputDefinition::builder()
                    .argument(arg("foo", ArgumentMode::Optional))
                    .build()
                    .unwrap(),
                "[<foo>]",
            ),
            (
                InputDefinition::builder()
                    .argument(arg("foo", ArgumentMode::Required))
                    .build()
                    .unwrap(),
                "<foo>",
            ),
            (
                InputDefinition::builder()
                    .argument(arg("foo", ArgumentMode::Optional))
                    .argument(arg("bar", ArgumentMode::OptionalArray))
                    .build()
                    .unwrap(),
                "[<foo> [<bar>...]]",
            ),
        ];
        for (definition, expected) in cases {
            assert_eq!(definition.synopsis(false), expected);
        }
    }

    #[test]
    fn test_builder_reports_first_error() {
        let result = InputDefinition::builder()
            .argument(arg("a", ArgumentMode::OptionalArray))
            .argument(arg("b", ArgumentMode::Optional))
            .build();
        assert_eq!(result.unwrap_err(), DefinitionError::ArgumentAfterArray);
    }
}
