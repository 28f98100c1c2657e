//! Configuration files for waypost command definitions and route tables.
//!
//! Both kinds of configuration load from YAML (`.yaml`, `.yml`) or JSON
//! (`.json`), chosen by file extension, and convert into the runtime types of
//! the sibling crates:
//!
//! - [`CommandConfig`] builds a [`waypost_console::InputDefinition`];
//! - [`RoutesConfig`] builds a [`waypost_routing::RouteCollection`] and
//!   compiles it with the configured [`waypost_routing::CompileOptions`].
//!
//! # Quick start
//!
//! ```no_run
//! use waypost_config::{CommandConfig, RoutesConfig};
//! use waypost_console::{ArgvInput, InputSource};
//! use waypost_routing::RequestContext;
//!
//! let definition = CommandConfig::load("deploy.yaml")?.to_definition()?;
//! let _input = ArgvInput::from_env().parse(&definition)?;
//!
//! let routes = RoutesConfig::load("routes.yaml")?.compile()?;
//! let _found = routes.match_request("/blog/hello", &RequestContext::default())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod command;
mod error;
mod format;
mod routes;

pub use command::{ArgumentConfig, ArgumentKind, CommandConfig, OptionConfig, OptionKind};
pub use error::{ConfigError, Result};
pub use format::Format;
pub use routes::{RouteConfig, RoutesConfig};
