//! Console input definitions and parsing.
//!
//! This crate models what a command accepts and turns raw user input into
//! validated values:
//!
//! - [`InputArgument`] and [`InputOption`] declare positional arguments and
//!   named options (flags, value options, array options, negatable flags).
//! - [`InputDefinition`] is the ordered, validated collection of both, with
//!   shortcut and negation indexes and a rendered synopsis.
//! - [`ArgvInput`], [`StringInput`] and [`ArrayInput`] are the input sources.
//!   Each implements [`InputSource`] and binds against a definition to
//!   produce a [`ParsedInput`].
//!
//! # Example
//!
//! ```
//! use waypost_console::*;
//!
//! let definition = InputDefinition::builder()
//!     .argument(InputArgument::new("name", ArgumentMode::Required)?)
//!     .option(InputOption::new("yell", Some("y"), OptionMode::None)?)
//!     .option(InputOption::new("times", Some("t"), OptionMode::ValueRequired)?)
//!     .build()?;
//!
//! let input = ArgvInput::new(["-yt3", "world"]).parse(&definition)?;
//! assert_eq!(input.argument("name")?.as_str(), Some("world"));
//! assert_eq!(input.option("yell")?, InputValue::Bool(true));
//! assert_eq!(input.option("times")?, InputValue::from("3"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod argument;
mod argv;
mod array;
mod definition;
mod error;
mod input;
mod option;
mod string;
mod suggestions;
mod value;

pub use argument::{ArgumentMode, InputArgument};
pub use argv::ArgvInput;
pub use array::ArrayInput;
pub use definition::{ArgumentRef, InputDefinition, InputDefinitionBuilder};
pub use error::{DefinitionError, InputError, NotFoundError};
pub use input::{InputSource, ParsedInput, escape_token};
pub use option::{InputOption, OptionMode};
pub use string::{StringInput, tokenize};
pub use suggestions::{SuggestionCallback, Suggestions};
pub use value::InputValue;
