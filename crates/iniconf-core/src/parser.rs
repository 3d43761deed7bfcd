//! One-shot parsing with typed option binding
//!
//! A [`Parser`] pairs [`ConfigOptions`] with an [`OptionSet`]. Each
//! `parse_*` call builds a fresh [`Config`] and then binds the declared
//! options against it; any failure along the way is returned and no
//! handle is updated.

use std::path::Path;

use crate::config::{Config, ConfigOptions};
use crate::error::Result;
use crate::typed::{OptionHandle, OptionSet};

/// Parses configuration input and binds declared options
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ConfigOptions,
    declarations: OptionSet,
}

impl Parser {
    /// Create a parser with default options and no declarations
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom options
    pub fn with_options(options: ConfigOptions) -> Self {
        Self {
            options,
            declarations: OptionSet::new(),
        }
    }

    /// Create a parser from options and an existing declaration set
    pub fn with_declarations(options: ConfigOptions, declarations: OptionSet) -> Self {
        Self {
            options,
            declarations,
        }
    }

    /// Declared options
    pub fn declarations(&self) -> &OptionSet {
        &self.declarations
    }

    /// Declare an integer option
    pub fn int_option(
        &mut self,
        name: &str,
        section: &str,
        default: i64,
        required: bool,
    ) -> OptionHandle<i64> {
        self.declarations
            .int_option(name, section, default, required)
    }

    /// Declare a boolean option
    pub fn bool_option(
        &mut self,
        name: &str,
        section: &str,
        default: bool,
        required: bool,
    ) -> OptionHandle<bool> {
        self.declarations
            .bool_option(name, section, default, required)
    }

    /// Declare a string option
    pub fn string_option(
        &mut self,
        name: &str,
        section: &str,
        default: impl Into<String>,
        required: bool,
    ) -> OptionHandle<String> {
        self.declarations
            .string_option(name, section, default, required)
    }

    /// Declare a list option
    pub fn list_option(
        &mut self,
        name: &str,
        section: &str,
        default: Vec<String>,
        required: bool,
    ) -> OptionHandle<Vec<String>> {
        self.declarations
            .list_option(name, section, default, required)
    }

    /// Parse lines and bind declared options
    pub fn parse_lines<I, S>(&self, lines: I) -> Result<Config>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let config = Config::from_lines(lines, &self.options)?;
        self.bind(config)
    }

    /// Parse text and bind declared options
    pub fn parse_str(&self, text: &str) -> Result<Config> {
        self.parse_lines(text.lines())
    }

    /// Load a file and bind declared options
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Config> {
        let config = Config::load_with_options(path, &self.options)?;
        self.bind(config)
    }

    fn bind(&self, config: Config) -> Result<Config> {
        self.declarations.bind(&config)?;
        log::debug!(
            "Parsed {} section(s), bound {} declared option(s)",
            config.len(),
            self.declarations.len()
        );
        Ok(config)
    }
}
