//! Command definitions declared in configuration files.
//!
//! # Example YAML
//!
//! ```yaml
//! name: deploy
//! description: Deploy a release
//! arguments:
//!   - name: target
//!     mode: required
//!     suggestions: [staging, production]
//!   - name: hosts
//!     mode: array
//! options:
//!   - name: env
//!     shortcut: e
//!     mode: required
//!     default: prod
//!   - name: cache
//!     mode: negatable
//!     default: true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use waypost_console::{
    ArgumentMode, InputArgument, InputDefinition, InputOption, InputValue, OptionMode, Suggestions,
};

use crate::error::Result;
use crate::format;

/// Arity of a configured argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentKind {
    Required,
    #[default]
    Optional,
    Array,
}

impl From<ArgumentKind> for ArgumentMode {
    fn from(kind: ArgumentKind) -> Self {
        match kind {
            ArgumentKind::Required => Self::Required,
            ArgumentKind::Optional => Self::Optional,
            ArgumentKind::Array => Self::OptionalArray,
        }
    }
}

/// Value handling of a configured option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    #[default]
    None,
    Required,
    Optional,
    RequiredArray,
    OptionalArray,
    Negatable,
}

impl From<OptionKind> for OptionMode {
    fn from(kind: OptionKind) -> Self {
        match kind {
            OptionKind::None => Self::None,
            OptionKind::Required => Self::ValueRequired,
            OptionKind::Optional => Self::ValueOptional,
            OptionKind::RequiredArray => Self::ArrayRequired,
            OptionKind::OptionalArray => Self::ArrayOptional,
            OptionKind::Negatable => Self::Negatable,
        }
    }
}

/// One positional argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentConfig {
    pub name: String,
    #[serde(default)]
    pub mode: ArgumentKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "InputValue::is_null")]
    pub default: InputValue,
    /// Fixed completion values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ArgumentConfig {
    /// Builds the argument declaration.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError`](waypost_console::DefinitionError) (wrapped)
    /// for an empty name or a default the mode does not allow.
    pub fn to_argument(&self) -> Result<InputArgument> {
        let mut argument = InputArgument::new(&self.name, self.mode.into())?
            .with_default(self.default.clone())?
            .with_description(&self.description);
        if !self.suggestions.is_empty() {
            argument = argument.with_suggestions(Suggestions::values(self.suggestions.clone()));
        }
        Ok(argument)
    }
}

/// One named option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionConfig {
    pub name: String,
    /// Shortcut letters, `|`-separated (`"v"`, `"q|s"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
    #[serde(default)]
    pub mode: OptionKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "InputValue::is_null")]
    pub default: InputValue,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl OptionConfig {
    /// Builds the option declaration.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError`](waypost_console::DefinitionError) (wrapped)
    /// for invalid names, shortcuts or defaults.
    pub fn to_option(&self) -> Result<InputOption> {
        let mut option = InputOption::new(&self.name, self.shortcut.as_deref(), self.mode.into())?
            .with_default(self.default.clone())?
            .with_description(&self.description);
        if !self.suggestions.is_empty() {
            option = option.with_suggestions(Suggestions::values(self.suggestions.clone()));
        }
        Ok(option)
    }
}

/// A command: its name, help text and input definition.
///
/// # Examples
///
/// ```
/// use waypost_config::CommandConfig;
///
/// let yaml = "
/// name: greet
/// arguments:
///   - { name: who, mode: required }
/// options:
///   - { name: yell, shortcut: y }
/// ";
/// let config: CommandConfig = serde_yaml::from_str(yaml).unwrap();
/// let definition = config.to_definition().unwrap();
/// assert_eq!(definition.synopsis(false), "[-y|--yell] [--] <who>");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub arguments: Vec<ArgumentConfig>,
    #[serde(default)]
    pub options: Vec<OptionConfig>,
}

impl CommandConfig {
    /// Loads a command from a YAML (`.yaml`/`.yml`) or JSON (`.json`) file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ConfigError::IoError) if the file cannot be
    /// read, [`UnsupportedFormat`](crate::ConfigError::UnsupportedFormat) for
    /// other extensions, or a parse error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: Self = format::read(path)?;
        debug!(
            path = %path.display(),
            command = %config.name,
            arguments = config.arguments.len(),
            options = config.options.len(),
            "loaded command config"
        );
        Ok(config)
    }

    /// Saves the command in the format implied by the extension.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ConfigError::IoError) if the file cannot be
    /// written, or a serialization error.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        format::write(path.as_ref(), self)
    }

    /// Builds the validated input definition.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError`](crate::ConfigError::DefinitionError) for
    /// invalid declarations or conflicts between them (duplicate names,
    /// shortcuts, argument ordering).
    pub fn to_definition(&self) -> Result<InputDefinition> {
        let mut builder = InputDefinition::builder();
        for argument in &self.arguments {
            builder = builder.argument(argument.to_argument()?);
        }
        for option in &self.options {
            builder = builder.option(option.to_option()?);
        }
        Ok(builder.build()?)
    }
}
