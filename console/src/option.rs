//! Named option declarations.

use crate::error::DefinitionError;
use crate::suggestions::Suggestions;
use crate::value::InputValue;

/// How an option consumes values.
///
/// Every valid combination of the classic `VALUE_*` bits is a variant, so
/// invalid combinations (an array flag, a negatable option with a value)
/// cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionMode {
    /// Boolean flag, no value (the default).
    #[default]
    None,
    /// Boolean flag with an implicit `--no-<name>` counterpart.
    Negatable,
    /// A value must follow the option.
    ValueRequired,
    /// A value may follow the option.
    ValueOptional,
    /// Repeatable, each occurrence must carry a value.
    ArrayRequired,
    /// Repeatable, values are optional.
    ArrayOptional,
}

impl OptionMode {
    /// Bit for a flag option.
    pub const NONE: u8 = 1;
    /// Bit for a required value.
    pub const REQUIRED: u8 = 2;
    /// Bit for an optional value.
    pub const OPTIONAL: u8 = 4;
    /// Bit for a repeatable option.
    pub const IS_ARRAY: u8 = 8;
    /// Bit for a negatable flag.
    pub const NEGATABLE: u8 = 16;

    pub fn accepts_value(self) -> bool {
        self.is_value_required() || self.is_value_optional()
    }

    pub fn is_value_required(self) -> bool {
        matches!(self, Self::ValueRequired | Self::ArrayRequired)
    }

    pub fn is_value_optional(self) -> bool {
        matches!(self, Self::ValueOptional | Self::ArrayOptional)
    }

    pub fn is_array(self) -> bool {
        matches!(self, Self::ArrayRequired | Self::ArrayOptional)
    }

    pub fn is_negatable(self) -> bool {
        matches!(self, Self::Negatable)
    }
}

impl TryFrom<u8> for OptionMode {
    type Error = DefinitionError;

    /// Converts a bitmask of the `VALUE_*` style constants.
    ///
    /// ```
    /// use waypost_console::OptionMode;
    ///
    /// let mode = OptionMode::try_from(OptionMode::OPTIONAL | OptionMode::IS_ARRAY).unwrap();
    /// assert_eq!(mode, OptionMode::ArrayOptional);
    /// assert!(OptionMode::try_from(OptionMode::NONE | OptionMode::IS_ARRAY).is_err());
    /// ```
    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        if bits == 0 || bits > 31 {
            return Err(DefinitionError::InvalidOptionMode(bits));
        }
        let none = bits & Self::NONE != 0;
        let required = bits & Self::REQUIRED != 0;
        let optional = bits & Self::OPTIONAL != 0;
        let array = bits & Self::IS_ARRAY != 0;
        let negatable = bits & Self::NEGATABLE != 0;

        if (required && optional) || (none && (required || optional)) {
            return Err(DefinitionError::InvalidOptionMode(bits));
        }
        let accepts_value = required || optional;
        if array && !accepts_value {
            return Err(DefinitionError::ArrayOptionWithoutValue);
        }
        if negatable && accepts_value {
            return Err(DefinitionError::NegatableWithValue);
        }

        Ok(match (required, optional, array, negatable) {
            (true, _, true, _) => Self::ArrayRequired,
            (true, _, false, _) => Self::ValueRequired,
            (_, true, true, _) => Self::ArrayOptional,
            (_, true, false, _) => Self::ValueOptional,
            (_, _, _, true) => Self::Negatable,
            _ => Self::None,
        })
    }
}

/// A named option declaration (`--name`, with optional `-x` shortcuts).
///
/// # Examples
///
/// ```
/// use waypost_console::{InputOption, OptionMode};
///
/// let format = InputOption::new("--format", Some("f|F"), OptionMode::ValueRequired)
///     .unwrap()
///     .with_default("json")
///     .unwrap();
/// assert_eq!(format.name(), "format");
/// assert_eq!(format.shortcuts(), &['f', 'F']);
/// assert_eq!(format.shortcut_string().as_deref(), Some("f|F"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InputOption {
    name: String,
    shortcuts: Vec<char>,
    mode: OptionMode,
    description: String,
    default: InputValue,
    suggestions: Suggestions,
}

impl InputOption {
    /// Creates an option.
    ///
    /// Leading dashes are stripped from `name` and from every `|`-separated
    /// shortcut; empty shortcut pieces are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::EmptyOptionName`],
    /// [`DefinitionError::EmptyShortcut`] or
    /// [`DefinitionError::InvalidShortcut`].
    pub fn new(
        name: impl AsRef<str>,
        shortcut: Option<&str>,
        mode: OptionMode,
    ) -> Result<Self, DefinitionError> {
        let name = name.as_ref();
        let name = name.strip_prefix("--").unwrap_or(name);
        if name.is_empty() {
            return Err(DefinitionError::EmptyOptionName);
        }

        let shortcuts = match shortcut {
            None | Some("") => Vec::new(),
            Some(raw) => parse_shortcuts(raw)?,
        };

        let default = match mode {
            OptionMode::None => InputValue::Bool(false),
            m if m.is_array() => InputValue::List(Vec::new()),
            _ => InputValue::Null,
        };

        Ok(Self {
            name: name.to_string(),
            shortcuts,
            mode,
            description: String::new(),
            default,
            suggestions: Suggestions::None,
        })
    }

    /// Sets the default value.
    ///
    /// # Errors
    ///
    /// Flag options reject defaults entirely, negatable options only take
    /// booleans, array options require a list.
    pub fn with_default(mut self, default: impl Into<InputValue>) -> Result<Self, DefinitionError> {
        let default = default.into();
        self.default = match (self.mode, default) {
            (OptionMode::None, InputValue::Null) => InputValue::Bool(false),
            (OptionMode::None, _) => return Err(DefinitionError::FlagOptionDefault),
            (OptionMode::Negatable, InputValue::Null) => InputValue::Null,
            (OptionMode::Negatable, b @ InputValue::Bool(_)) => b,
            (OptionMode::Negatable, _) => return Err(DefinitionError::NegatableDefault),
            (m, InputValue::Null) if m.is_array() => InputValue::List(Vec::new()),
            (m, list @ InputValue::List(_)) if m.is_array() => list,
            (m, _) if m.is_array() => return Err(DefinitionError::ArrayDefaultNotList("option")),
            (_, InputValue::List(_)) => return Err(DefinitionError::ScalarDefaultIsList("option")),
            (_, value) => value,
        };
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

    pub fn shortcuts(&self) -> &[char] {
        &self.shortcuts
    }

    /// Shortcuts joined with `|`, as written in declarations.
    pub fn shortcut_string(&self) -> Option<String> {
        if self.shortcuts.is_empty() {
            return None;
        }
        let parts: Vec<String> = self.shortcuts.iter().map(char::to_string).collect();
        Some(parts.join("|"))
    }

    pub fn mode(&self) -> OptionMode {
        self.mode
    }

    pub fn accepts_value(&self) -> bool {
        self.mode.accepts_value()
    }

    pub fn is_value_required(&self) -> bool {
        self.mode.is_value_required()
    }

    pub fn is_value_optional(&self) -> bool {
        self.mode.is_value_optional()
    }

    pub fn is_array(&self) -> bool {
        self.mode.is_array()
    }

    pub fn is_negatable(&self) -> bool {
        self.mode.is_negatable()
    }

    /// Name of the implicit negation (`no-<name>`), for negatable options.
    pub fn negation(&self) -> Option<String> {
        self.is_negatable().then(|| format!("no-{}", self.name))
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

    /// Completion values for a partially typed option value.
    pub fn complete(&self, partial: &str) -> Vec<String> {
        self.suggestions.complete(partial)
    }

    /// Structural equivalence: same name, shortcuts, mode and default.
    ///
    /// Descriptions and suggestions are ignored, so re-registering an option
    /// with different help text is not a conflict.
    pub fn is_equivalent(&self, other: &InputOption) -> bool {
        self.name == other.name
            && self.shortcuts == other.shortcuts
            && self.mode == other.mode
            && self.default == other.default
    }
}

fn parse_shortcuts(raw: &str) -> Result<Vec<char>, DefinitionError> {
    let mut shortcuts = Vec::new();
    for piece in raw.split('|') {
        let piece = piece.trim_start_matches('-');
        if piece.is_empty() {
            continue;
        }
        let mut chars = piece.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => shortcuts.push(c),
            _ => return Err(DefinitionError::InvalidShortcut(piece.to_string())),
        }
    }
    if shortcuts.is_empty() {
        return Err(DefinitionError::EmptyShortcut);
    }
    Ok(shortcuts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_strips_leading_dashes() {
        let opt = InputOption::new("--foo", None, OptionMode::None).unwrap();
        assert_eq!(opt.name(), "foo");
        assert_eq!(
            InputOption::new("--", None, OptionMode::None),
            Err(DefinitionError::EmptyOptionName)
        );
    }

    #[test]
    fn test_shortcut_parsing() {
        let opt = InputOption::new("foo", Some("-f|-g||h"), OptionMode::None).unwrap();
        assert_eq!(opt.shortcuts(), &['f', 'g', 'h']);
        assert_eq!(
            InputOption::new("foo", Some("-|"), OptionMode::None),
            Err(DefinitionError::EmptyShortcut)
        );
        assert_eq!(
            InputOption::new("foo", Some("ff"), OptionMode::None),
            Err(DefinitionError::InvalidShortcut("ff".into()))
        );
    }

    #[test]
    fn test_implicit_defaults() {
        let flag = InputOption::new("v", None, OptionMode::None).unwrap();
        assert_eq!(flag.default_value(), &InputValue::Bool(false));
        let list = InputOption::new("tag", None, OptionMode::ArrayRequired).unwrap();
        assert_eq!(list.default_value(), &InputValue::List(vec![]));
        let value = InputOption::new("out", None, OptionMode::ValueOptional).unwrap();
        assert_eq!(value.default_value(), &InputValue::Null);
    }

    #[test]
    fn test_default_constraints() {
        let flag = InputOption::new("v", None, OptionMode::None).unwrap();
        assert_eq!(
            flag.with_default("x"),
            Err(DefinitionError::FlagOptionDefault)
        );

        let neg = InputOption::new("color", None, OptionMode::Negatable)
            .unwrap()
            .with_default(true)
            .unwrap();
        assert_eq!(neg.default_value(), &InputValue::Bool(true));
        assert_eq!(neg.negation().as_deref(), Some("no-color"));

        let list = InputOption::new("tag", None, OptionMode::ArrayOptional).unwrap();
        assert_eq!(
            list.with_default("a"),
            Err(DefinitionError::ArrayDefaultNotList("option"))
        );
    }

    #[test]
    fn test_mode_bits_validation() {
        assert_eq!(
            OptionMode::try_from(OptionMode::IS_ARRAY),
            Err(DefinitionError::ArrayOptionWithoutValue)
        );
        assert_eq!(
            OptionMode::try_from(OptionMode::REQUIRED | OptionMode::NEGATABLE),
            Err(DefinitionError::NegatableWithValue)
        );
        assert_eq!(
            OptionMode::try_from(OptionMode::NONE | OptionMode::NEGATABLE),
            Ok(OptionMode::Negatable)
        );
        assert_eq!(
            OptionMode::try_from(OptionMode::REQUIRED),
            Ok(OptionMode::ValueRequired)
        );
        assert_eq!(OptionMode::try_from(0), Err(DefinitionError::InvalidOptionMode(0)));
    }

    #[test]
    fn test_equivalence_ignores_description() {
        let a = InputOption::new("foo", Some("f"), OptionMode::None).unwrap();
        let b = a.clone().with_description("other text");
        assert!(a.is_equivalent(&b));
        let c = InputOption::new("foo", Some("g"), OptionMode::None).unwrap();
        assert!(!a.is_equivalent(&c));
    }
}
