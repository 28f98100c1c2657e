//! Input given as ordered key/value pairs.
//!
//! Keys starting with `--` name long options (or negations), keys starting
//! with `-` name shortcuts, a `--` key stops parsing and every other key is
//! an argument name.

use std::fmt;

use indexmap::IndexMap;
use tracing::trace;

use crate::definition::InputDefinition;
use crate::error::{InputError, NotFoundError};
use crate::input::{Binder, InputSource, ParsedInput, escape_token};
use crate::value::InputValue;

/// Programmatic input.
///
/// ```
/// use waypost_console::*;
///
/// let definition = InputDefinition::builder()
///     .argument(InputArgument::new("name", ArgumentMode::Required)?)
///     .option(InputOption::new("yell", Some("y"), OptionMode::None)?)
///     .build()?;
///
/// let input = ArrayInput::new([("name", "bob".into()), ("-y", InputValue::Null)]);
/// let parsed = input.parse(&definition)?;
/// assert_eq!(parsed.argument("name")?.as_str(), Some("bob"));
/// assert_eq!(parsed.option("yell")?, InputValue::Bool(true));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ArrayInput {
    parameters: IndexMap<String, InputValue>,
}

impl ArrayInput {
    pub fn new<I, K>(parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, InputValue)>,
        K: Into<String>,
    {
        Self {
            parameters: parameters
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        }
    }

    pub fn parameters(&self) -> &IndexMap<String, InputValue> {
        &self.parameters
    }
}

impl From<IndexMap<String, InputValue>> for ArrayInput {
    fn from(parameters: IndexMap<String, InputValue>) -> Self {
        Self { parameters }
    }
}

impl InputSource for ArrayInput {
    fn bind(&self, definition: &InputDefinition) -> Result<ParsedInput, InputError> {
        let mut binder = Binder::new(definition);
        for (key, value) in &self.parameters {
            if key == "--" {
                trace!("array input stopped at --");
                break;
            }
            if let Some(name) = key.strip_prefix("--") {
                add_long_option(&mut binder, name, value.clone())?;
            } else if let Some(name) = key.strip_prefix('-') {
                let mut chars = name.chars();
                let shortcut = match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => return Err(InputError::UnknownOption(key.clone())),
                };
                let name = binder.shortcut_name(shortcut)?;
                add_long_option(&mut binder, name, value.clone())?;
            } else {
                binder.set_argument(key, value.clone())?;
            }
        }
        Ok(binder.finish())
    }

    fn first_argument(&self) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(key, _)| !key.starts_with('-'))
            .and_then(|(_, value)| value.as_str())
    }

    fn has_parameter_option(&self, names: &[&str], only_params: bool) -> bool {
        for key in self.parameters.keys() {
            if only_params && key == "--" {
                return false;
            }
            if names.contains(&key.as_str()) {
                return true;
            }
        }
        false
    }

    fn parameter_option(&self, names: &[&str], only_params: bool) -> Option<InputValue> {
        for (key, value) in &self.parameters {
            if only_params && key == "--" {
                return None;
            }
            if names.contains(&key.as_str()) {
                return Some(value.clone());
            }
        }
        None
    }
}

fn add_long_option(binder: &mut Binder<'_>, name: &str, value: InputValue) -> Result<(), InputError> {
    let definition = binder.definition();
    let Ok(option) = definition.option(name) else {
        if binder.negate(name, false)? {
            return Ok(());
        }
        return Err(NotFoundError::Option(name.to_string()).into());
    };
    let value = match value {
        InputValue::Null if option.is_value_required() => {
            return Err(InputError::MissingValue(name.to_string()));
        }
        InputValue::Null if !option.is_value_optional() && !option.is_array() => {
            InputValue::Bool(true)
        }
        other => other,
    };
    binder.store_option(name, value)
}

impl fmt::Display for ArrayInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rendered = Vec::new();
        for (key, value) in &self.parameters {
            if key.starts_with('-') && key != "-" {
                let glue = if key.starts_with("--") { '=' } else { ' ' };
                let values: Vec<String> = match value {
                    InputValue::String(s) if !s.is_empty() => vec![s.clone()],
                    InputValue::List(values) => values.clone(),
                    _ => vec![String::new()],
                };
                for v in values {
                    if v.is_empty() {
                        rendered.push(key.clone());
                    } else {
                        rendered.push(format!("{key}{glue}{}", escape_token(&v)));
                    }
                }
            } else {
                match value {
                    InputValue::List(values) => {
                        rendered.extend(values.iter().map(|v| escape_token(v)));
                    }
                    InputValue::String(s) => rendered.push(escape_token(s)),
                    InputValue::Bool(b) => rendered.push(if *b { "1" } else { "0" }.to_string()),
                    InputValue::Null => rendered.push(escape_token("")),
                }
            }
        }
        f.write_str(&rendered.join(" "))
    }
}
