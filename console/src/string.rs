//! Input parsed from a single command-line string.

use std::fmt;

use crate::argv::ArgvInput;
use crate::definition::InputDefinition;
use crate::error::InputError;
use crate::input::{InputSource, ParsedInput};
use crate::value::InputValue;

/// Input built by tokenizing a shell-like string.
///
/// ```
/// use waypost_console::*;
///
/// let input = StringInput::new(r#"--name="John Doe" 'a b' c\ d"#)?;
/// assert_eq!(input.tokens(), ["--name=John Doe", "a b", "c d"]);
/// # Ok::<(), InputError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringInput {
    inner: ArgvInput,
}

impl StringInput {
    /// Tokenizes `input`.
    pub fn new(input: &str) -> Result<Self, InputError> {
        Ok(Self {
            inner: ArgvInput::new(tokenize(input)?),
        })
    }

    pub fn tokens(&self) -> &[String] {
        self.inner.tokens()
    }

    /// Underlying argv input.
    pub fn as_argv(&self) -> &ArgvInput {
        &self.inner
    }
}

impl InputSource for StringInput {
    fn bind(&self, definition: &InputDefinition) -> Result<ParsedInput, InputError> {
        self.inner.bind(definition)
    }

    fn first_argument(&self) -> Option<&str> {
        self.inner.first_argument()
    }

    fn has_parameter_option(&self, names: &[&str], only_params: bool) -> bool {
        self.inner.has_parameter_option(names, only_params)
    }

    fn parameter_option(&self, names: &[&str], only_params: bool) -> Option<InputValue> {
        self.inner.parameter_option(names, only_params)
    }
}

impl fmt::Display for StringInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    Single,
    Double,
}

/// Splits a command line into tokens.
///
/// Whitespace separates tokens unless quoted. Quotes may appear anywhere
/// within a token (`--name="a b"`) and are removed. Inside quotes a
/// backslash escapes the next character (`\n`, `\t`, `\r`, `\0` and `\\`
/// are decoded); outside quotes it makes the next character literal.
///
/// ```
/// use waypost_console::tokenize;
///
/// assert_eq!(tokenize("a  'b c'\t\"d\\\"e\"")?, ["a", "b c", "d\"e"]);
/// assert!(tokenize("foo 'bar").is_err());
/// # Ok::<(), waypost_console::InputError>(())
/// ```
pub fn tokenize(input: &str) -> Result<Vec<String>, InputError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<(Quote, usize)> = None;
    let mut chars = input.char_indices();

    while let Some((pos, c)) = chars.next() {
        match quote {
            Some((kind, _)) => match c {
                '\'' if kind == Quote::Single => quote = None,
                '"' if kind == Quote::Double => quote = None,
                '\\' => match chars.next() {
                    Some((_, escaped)) => current.push(unescape(escaped)),
                    None => current.push('\\'),
                },
                _ => current.push(c),
            },
            None => match c {
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                '\'' => {
                    quote = Some((Quote::Single, pos));
                    in_token = true;
                }
                '"' => {
                    quote = Some((Quote::Double, pos));
                    in_token = true;
                }
                '\\' => {
                    in_token = true;
                    match chars.next() {
                        Some((_, escaped)) => current.push(escaped),
                        None => current.push('\\'),
                    }
                }
                _ => {
                    in_token = true;
                    current.push(c);
                }
            },
        }
    }

    if let Some((_, start)) = quote {
        let snippet: String = input[start..].chars().take(10).collect();
        return Err(InputError::Tokenize(snippet));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_plain_and_whitespace() {
        assert_eq!(tokenize("").unwrap(), Vec::<String>::new());
        assert_eq!(tokenize("   ").unwrap(), Vec::<String>::new());
        assert_eq!(tokenize(" foo \n bar\tbaz ").unwrap(), ["foo", "bar", "baz"]);
    }

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(tokenize("\"quoted\"").unwrap(), ["quoted"]);
        assert_eq!(tokenize("''").unwrap(), [""]);
        assert_eq!(tokenize("--foo='bar baz'").unwrap(), ["--foo=bar baz"]);
        assert_eq!(tokenize("-a\"b c\"d").unwrap(), ["-ab cd"]);
        assert_eq!(tokenize("'a\"b'").unwrap(), ["a\"b"]);
        assert_eq!(tokenize("\"a'b\"").unwrap(), ["a'b"]);
    }

    #[test]
    fn test_tokenize_escapes() {
        assert_eq!(tokenize(r#""a\"b""#).unwrap(), ["a\"b"]);
        assert_eq!(tokenize(r#"'it\'s'"#).unwrap(), ["it's"]);
        assert_eq!(tokenize(r#""tab\there""#).unwrap(), ["tab\there"]);
        assert_eq!(tokenize(r"foo\ bar").unwrap(), ["foo bar"]);
    }

    #[test]
    fn test_tokenize_unterminated_quote() {
        let err = tokenize("run \"unterminated string").unwrap_err();
        assert_eq!(err, InputError::Tokenize("\"untermina".into()));
    }

    #[test]
    fn test_string_input_binds_like_argv() {
        use crate::{InputOption, OptionMode};

        let definition = InputDefinition::builder()
            .option(InputOption::new("name", None, OptionMode::ValueRequired).unwrap())
            .build()
            .unwrap();
        let input = StringInput::new("--name 'John Doe'").unwrap();
        let parsed = input.parse(&definition).unwrap();
        assert_eq!(parsed.option("name").unwrap(), InputValue::from("John Doe"));
        assert_eq!(input.to_string(), "--name 'John Doe'");
    }
}
