//! Argv-style input: a sequence of raw tokens.
//!
//! Tokens are classified left to right:
//!
//! 1. an empty token is a positional argument;
//! 2. a bare `--` ends option parsing, everything after it is positional;
//! 3. `--name` / `--name=value` is a long option (or a `--no-name` negation);
//! 4. `-x`, `-xVALUE` and `-abc` are short options, clustered flags are
//!    expanded left to right until a value-taking shortcut swallows the rest;
//! 5. anything else fills the next argument slot.

use std::collections::VecDeque;
use std::fmt;

use tracing::trace;

use crate::definition::InputDefinition;
use crate::error::InputError;
use crate::input::{Binder, InputSource, ParsedInput, escape_token};
use crate::value::InputValue;

/// Input backed by an argument vector.
///
/// # Examples
///
/// ```
/// use waypost_console::*;
///
/// let definition = InputDefinition::builder()
///     .argument(InputArgument::new("name", ArgumentMode::Required)?)
///     .option(InputOption::new("foo", Some("f"), OptionMode::ValueRequired)?)
///     .build()?;
///
/// let input = ArgvInput::new(["--foo=bar", "alice"]).parse(&definition)?;
/// assert_eq!(input.option("foo")?, InputValue::from("bar"));
/// assert_eq!(input.argument("name")?.as_str(), Some("alice"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgvInput {
    tokens: Vec<String>,
}

impl ArgvInput {
    /// Creates an input from tokens (without the program name).
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an input from the process arguments, skipping the program name.
    pub fn from_env() -> Self {
        Self::new(std::env::args().skip(1))
    }

    /// Raw tokens.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// First positional token, skipping values of options the definition
    /// declares as value-taking.
    ///
    /// ```
    /// use waypost_console::*;
    ///
    /// let definition = InputDefinition::builder()
    ///     .option(InputOption::new("env", Some("e"), OptionMode::ValueRequired)?)
    ///     .build()?;
    /// let input = ArgvInput::new(["--env", "prod", "cache:clear"]);
    /// assert_eq!(input.first_argument(), Some("prod"));
    /// assert_eq!(input.first_argument_with(&definition), Some("cache:clear"));
    /// # Ok::<(), DefinitionError>(())
    /// ```
    pub fn first_argument_with(&self, definition: &InputDefinition) -> Option<&str> {
        let mut skip_next = false;
        for (i, token) in self.tokens.iter().enumerate() {
            if skip_next {
                skip_next = false;
                continue;
            }
            if token == "--" {
                return self.tokens.get(i + 1).map(String::as_str);
            }
            if !looks_like_option(token) {
                return Some(token);
            }
            let Some(next) = self.tokens.get(i + 1) else {
                continue;
            };
            if token.contains('=') || next.starts_with('-') {
                continue;
            }
            skip_next = takes_separate_value(definition, token);
        }
        None
    }
}

impl InputSource for ArgvInput {
    fn bind(&self, definition: &InputDefinition) -> Result<ParsedInput, InputError> {
        let mut parser = ArgvParser {
            binder: Binder::new(definition),
            pending: self.tokens.iter().cloned().collect(),
        };
        parser.run()?;
        Ok(parser.binder.finish())
    }

    fn first_argument(&self) -> Option<&str> {
        self.first_argument_with(&InputDefinition::default())
    }

    fn has_parameter_option(&self, names: &[&str], only_params: bool) -> bool {
        for token in &self.tokens {
            if only_params && token == "--" {
                return false;
            }
            if names.iter().any(|name| matches_parameter(token, name).is_some()) {
                return true;
            }
        }
        false
    }

    fn parameter_option(&self, names: &[&str], only_params: bool) -> Option<InputValue> {
        let mut tokens = self.tokens.iter();
        while let Some(token) = tokens.next() {
            if only_params && token == "--" {
                return None;
            }
            for name in names {
                match matches_parameter(token, name) {
                    Some(ParameterMatch::Exact) => {
                        return Some(tokens.next().cloned().into());
                    }
                    Some(ParameterMatch::Glued(value)) => return Some(value.into()),
                    None => {}
                }
            }
        }
        None
    }
}

impl fmt::Display for ArgvInput {
    /// Renders the tokens back into a shell-safe command line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .tokens
            .iter()
            .map(|token| {
                if token.starts_with('-') {
                    match token.split_once('=') {
                        Some((name, value)) if name.len() > 1 && !value.is_empty() => {
                            format!("{name}={}", escape_token(value))
                        }
                        _ => token.clone(),
                    }
                } else if token.is_empty() {
                    token.clone()
                } else {
                    escape_token(token)
                }
            })
            .collect();
        f.write_str(&rendered.join(" "))
    }
}

enum ParameterMatch<'a> {
    Exact,
    Glued(&'a str),
}

/// `--name` matches `--name` and `--name=value`; `-n` matches `-n` and `-nvalue`.
fn matches_parameter<'a>(token: &'a str, name: &str) -> Option<ParameterMatch<'a>> {
    if token == name {
        return Some(ParameterMatch::Exact);
    }
    if name.is_empty() {
        return None;
    }
    let rest = if name.starts_with("--") {
        token.strip_prefix(name)?.strip_prefix('=')?
    } else {
        token.strip_prefix(name)?
    };
    Some(ParameterMatch::Glued(rest))
}

fn looks_like_option(token: &str) -> bool {
    token.starts_with('-') && token != "-"
}

/// Whether an option token without `=` consumes the following token.
fn takes_separate_value(definition: &InputDefinition, token: &str) -> bool {
    if let Some(name) = token.strip_prefix("--") {
        return definition.option(name).is_ok_and(|o| o.accepts_value());
    }
    let name = &token[1..];
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let accepts = |c: char| {
        definition
            .option_for_shortcut(c)
            .is_ok_and(|o| o.accepts_value())
    };
    if chars.as_str().is_empty() {
        return accepts(first);
    }
    // -xVALUE carries its own value
    if accepts(first) {
        return false;
    }
    // only the last shortcut of a cluster may take the next token
    name.chars().last().is_some_and(accepts)
}

struct ArgvParser<'d> {
    binder: Binder<'d>,
    pending: VecDeque<String>,
}

impl ArgvParser<'_> {
    fn run(&mut self) -> Result<(), InputError> {
        let mut parse_options = true;
        while let Some(token) = self.pending.pop_front() {
            if !parse_options {
                self.binder.push_argument(token)?;
            } else if token.is_empty() {
                trace!("empty token bound as argument");
                self.binder.push_argument(token)?;
            } else if token == "--" {
                trace!("option parsing stopped by --");
                parse_options = false;
            } else if let Some(name) = token.strip_prefix("--") {
                trace!(token = %token, "long option");
                let name = name.to_string();
                self.parse_long_option(&name)?;
            } else if looks_like_option(&token) {
                trace!(token = %token, "short option");
                self.parse_short_option(&token[1..])?;
            } else {
                self.binder.push_argument(token)?;
            }
        }
        Ok(())
    }

    fn parse_long_option(&mut self, name: &str) -> Result<(), InputError> {
        match name.split_once('=') {
            Some((name, value)) => {
                if value.is_empty() {
                    self.pending.push_front(String::new());
                }
                self.add_long_option(name, Some(value.to_string()))
            }
            None => self.add_long_option(name, None),
        }
    }

    fn parse_short_option(&mut self, name: &str) -> Result<(), InputError> {
        let definition = self.binder.definition();
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return Ok(());
        };
        let rest = chars.as_str();
        if rest.is_empty() {
            return self.add_short_option(first, None);
        }

        let glued_value = definition
            .option_for_shortcut(first)
            .is_ok_and(|o| o.accepts_value());
        if glued_value {
            self.add_short_option(first, Some(rest.to_string()))
        } else {
            self.parse_short_option_set(name)
        }
    }

    fn parse_short_option_set(&mut self, name: &str) -> Result<(), InputError> {
        let definition = self.binder.definition();
        for (i, shortcut) in name.char_indices() {
            let option_name = self.binder.shortcut_name(shortcut)?;
            let option = definition.option(option_name)?;
            if option.accepts_value() {
                let rest = &name[i + shortcut.len_utf8()..];
                let value = (!rest.is_empty()).then(|| rest.to_string());
                return self.add_long_option(option_name, value);
            }
            self.add_long_option(option_name, None)?;
        }
        Ok(())
    }

    fn add_short_option(&mut self, shortcut: char, value: Option<String>) -> Result<(), InputError> {
        let name = self.binder.shortcut_name(shortcut)?;
        self.add_long_option(name, value)
    }

    fn add_long_option(&mut self, name: &str, value: Option<String>) -> Result<(), InputError> {
        let definition = self.binder.definition();
        let Ok(option) = definition.option(name) else {
            if self.binder.negate(name, value.is_some())? {
                return Ok(());
            }
            return Err(InputError::UnknownOption(format!("--{name}")));
        };

        if value.is_some() && !option.accepts_value() {
            return Err(InputError::UnexpectedValue(name.to_string()));
        }

        let mut value = value;
        if option.accepts_value() && value.as_deref().is_none_or(str::is_empty) {
            if let Some(next) = self.pending.pop_front() {
                if next.starts_with('-') {
                    self.pending.push_front(next);
                } else {
                    value = Some(next);
                }
            }
        }

        let value = match value {
            Some(value) => InputValue::String(value),
            None if option.is_value_required() => {
                return Err(InputError::MissingValue(name.to_string()));
            }
            None if !option.is_array() && !option.is_value_optional() => InputValue::Bool(true),
            None => InputValue::Null,
        };
        self.binder.store_option(name, value)
    }
}
