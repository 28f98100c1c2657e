//! Error types for input definitions and input parsing.
//!
//! [`DefinitionError`] covers mistakes made while declaring arguments and
//! options. [`NotFoundError`] is returned by definition lookups.
//! [`InputError`] covers everything that can go wrong while binding user
//! input against a definition.

use thiserror::Error;

/// Errors raised while constructing arguments, options or definitions.
///
/// These are configuration-time failures: they indicate a programming
/// mistake in the command declaration rather than bad user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// Argument declared with an empty name.
    #[error("An argument name cannot be empty.")]
    EmptyArgumentName,
    /// Option declared with an empty name (or only dashes).
    #[error("An option name cannot be empty.")]
    EmptyOptionName,
    /// Shortcut string was given but contains no usable shortcut.
    #[error("An option shortcut cannot be empty.")]
    EmptyShortcut,
    /// Shortcut longer than one character.
    #[error("An option shortcut must be a single character, got \"{0}\".")]
    InvalidShortcut(String),
    /// Raw argument mode bits do not describe a valid mode.
    #[error("Argument mode \"{0}\" is not valid.")]
    InvalidArgumentMode(u8),
    /// Raw option mode bits do not describe a valid mode.
    #[error("Option mode \"{0}\" is not valid.")]
    InvalidOptionMode(u8),
    /// `IS_ARRAY` combined with an option that takes no value.
    #[error(
        "Impossible to have an option mode VALUE_IS_ARRAY if the option does not accept a value."
    )]
    ArrayOptionWithoutValue,
    /// `NEGATABLE` combined with an option that takes a value.
    #[error(
        "Impossible to have an option mode VALUE_NEGATABLE if the option also accepts a value."
    )]
    NegatableWithValue,
    /// Default supplied for a required argument.
    #[error("Cannot set a default value except for optional arguments.")]
    RequiredArgumentDefault,
    /// Default supplied for an option that takes no value.
    #[error("Cannot set a default value when the option does not accept a value.")]
    FlagOptionDefault,
    /// Negatable options only carry boolean defaults.
    #[error("A default value for a negatable option must be a boolean.")]
    NegatableDefault,
    /// Array argument/option default is not a list.
    #[error("A default value for an array {0} must be a list.")]
    ArrayDefaultNotList(&'static str),
    /// Scalar argument/option default is a list.
    #[error("A default value for a non-array {0} cannot be a list.")]
    ScalarDefaultIsList(&'static str),
    /// Two arguments share a name.
    #[error("An argument with name \"{0}\" already exists.")]
    DuplicateArgument(String),
    /// An argument was added after an array argument.
    #[error("Cannot add an argument after an array argument.")]
    ArgumentAfterArray,
    /// A required argument was added after an optional one.
    #[error("Cannot add a required argument after an optional one.")]
    RequiredAfterOptional,
    /// Two non-equivalent options share a name (or a negated name).
    #[error("An option named \"{0}\" already exists.")]
    DuplicateOption(String),
    /// Two non-equivalent options share a shortcut.
    #[error("An option with shortcut \"{0}\" already exists.")]
    DuplicateShortcut(char),
}

/// Lookup failures on an [`InputDefinition`](crate::InputDefinition).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    /// No argument with this name.
    #[error("The \"{0}\" argument does not exist.")]
    Argument(String),
    /// No argument at this position.
    #[error("The \"{0}\" argument does not exist.")]
    ArgumentPosition(usize),
    /// No option with this name (also used for unknown negations).
    #[error("The \"--{0}\" option does not exist.")]
    Option(String),
    /// No option for this shortcut.
    #[error("The \"-{0}\" option does not exist.")]
    Shortcut(char),
}

/// Errors raised while binding or validating user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Option token that matches neither an option, a negation nor a shortcut.
    ///
    /// The payload keeps the leading dashes (`--foo`, `-x`).
    #[error("The \"{0}\" option does not exist.")]
    UnknownOption(String),
    /// A value was attached to an option that does not take one.
    #[error("The \"--{0}\" option does not accept a value.")]
    UnexpectedValue(String),
    /// A value-required option was given without a value.
    #[error("The \"--{0}\" option requires a value.")]
    MissingValue(String),
    /// More positional tokens than declared arguments.
    #[error("{}", too_many_arguments_message(.command.as_deref(), .expected, .token))]
    TooManyArguments {
        /// Value of the leading `command` pseudo-argument, if one was bound.
        command: Option<String>,
        /// Declared argument names, excluding the `command` pseudo-argument.
        expected: Vec<String>,
        /// The first token that could not be placed.
        token: String,
    },
    /// Required arguments left unbound after parsing.
    #[error("Not enough arguments (missing: \"{}\").", .0.join(", "))]
    NotEnoughArguments(Vec<String>),
    /// Shell-like input could not be split into tokens.
    #[error("Unable to parse input near \"... {0} ...\".")]
    Tokenize(String),
    /// Lookup of an undeclared argument or option.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
}

fn too_many_arguments_message(command: Option<&str>, expected: &[String], token: &str) -> String {
    match (command, expected.is_empty()) {
        (Some(command), false) => format!(
            "Too many arguments to \"{command}\" command, expected arguments \"{}\".",
            expected.join("\" \"")
        ),
        (None, false) => format!(
            "Too many arguments, expected arguments \"{}\".",
            expected.join("\" \"")
        ),
        (Some(command), true) => {
            format!("No arguments expected for \"{command}\" command, got \"{token}\".")
        }
        (None, true) => format!("No arguments expected, got \"{token}\"."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_arguments_messages() {
        let err = InputError::TooManyArguments {
            command: None,
            expected: vec!["name".into(), "tags".into()],
            token: "extra".into(),
        };
        assert_eq!(
            err.to_string(),
            "Too many arguments, expected arguments \"name\" \"tags\"."
        );

        let err = InputError::TooManyArguments {
            command: Some("greet".into()),
            expected: vec![],
            token: "extra".into(),
        };
        assert_eq!(
            err.to_string(),
            "No arguments expected for \"greet\" command, got \"extra\"."
        );
    }

    #[test]
    fn test_not_enough_arguments_lists_all() {
        let err = InputError::NotEnoughArguments(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "Not enough arguments (missing: \"a, b\").");
    }

    #[test]
    fn test_not_found_wraps_transparently() {
        let err: InputError = NotFoundError::Shortcut('x').into();
        assert_eq!(err.to_string(), "The \"-x\" option does not exist.");
    }
}
