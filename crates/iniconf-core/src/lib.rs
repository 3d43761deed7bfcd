//! iniconf-core: sectioned configuration reader with interpolation
//!
//! This crate parses an INI-like format into sections of string options,
//! resolves `%section(key)` interpolation markers across sections, and binds
//! declared typed options (integer, boolean, string, list) to the result.
//!
//! # Example
//!
//! ```rust
//! use iniconf_core::Parser;
//!
//! let text = "\
//! [global]
//! master = /opt/apps
//! [app1]
//! port = 8000
//! bindir = %global(master)/bin
//! ";
//!
//! let mut parser = Parser::new();
//! let port = parser.int_option("port", "app1", 1000, false);
//!
//! let config = parser.parse_str(text).unwrap();
//! assert_eq!(port.get(), 8000);
//! assert_eq!(config.get_option("app1", "bindir").unwrap(), "/opt/apps/bin");
//! ```

pub mod classifier;
pub mod error;
pub mod interpolation;
pub mod resolver;
pub mod typed;

mod config;
mod parser;

pub use config::{Config, ConfigOptions};
pub use error::{CoercionError, Error, ErrorKind, Result};
pub use interpolation::ReferenceStyle;
pub use parser::Parser;
pub use typed::{OptionHandle, OptionSet, OptionSpec, OptionType};
