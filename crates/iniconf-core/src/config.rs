//! Main Config type for iniconf
//!
//! A [`Config`] is the fully resolved section table. It is built in one shot
//! from text lines (classify, then resolve) and is read-only afterwards.

use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;

use crate::classifier::{self, DEFAULT_SOURCE};
use crate::error::{Error, Result};
use crate::interpolation::ReferenceStyle;
use crate::resolver::{self, Sections};
use crate::typed;

/// Configuration options for parsing
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    /// Name reported in error locations (defaults to the file name, or `<input>`)
    pub source_name: Option<String>,
    /// Marker syntax and section selection used for interpolation
    pub references: ReferenceStyle,
}

impl ConfigOptions {
    /// Options using the given reference style
    pub fn with_references(references: ReferenceStyle) -> Self {
        Self {
            references,
            ..Self::default()
        }
    }

    fn source(&self) -> &str {
        self.source_name.as_deref().unwrap_or(DEFAULT_SOURCE)
    }
}

/// A parsed configuration with all interpolation markers resolved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Config {
    sections: Sections,
}

impl Config {
    /// Parse a sequence of lines
    pub fn from_lines<I, S>(lines: I, options: &ConfigOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let table = classifier::classify(lines, &options.references, options.source())?;
        log::debug!(
            "Classified {} section(s) with {} interpolation marker(s) from {}",
            table.sections.len(),
            table.marker_count(),
            options.source()
        );
        let sections = resolver::resolve(&table)?;
        Ok(Self { sections })
    }

    /// Parse configuration text with default options
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_lines(text.lines(), &ConfigOptions::default())
    }

    /// Parse configuration text with options
    pub fn parse_with_options(text: &str, options: &ConfigOptions) -> Result<Self> {
        Self::from_lines(text.lines(), options)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_options(path, &ConfigOptions::default())
    }

    /// Load a configuration file with options
    ///
    /// Unless `options.source_name` is set, errors are reported against the
    /// file's name.
    pub fn load_with_options(path: impl AsRef<Path>, options: &ConfigOptions) -> Result<Self> {
        let path = path.as_ref();
        let content = read_file(path)?;

        if options.source_name.is_some() {
            return Self::parse_with_options(&content, options);
        }
        let options = ConfigOptions {
            source_name: Some(display_name(path)),
            ..options.clone()
        };
        Self::parse_with_options(&content, &options)
    }

    /// Check if the named section exists
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Check if the named option exists in the section
    pub fn has_option(&self, section: &str, option: &str) -> bool {
        self.sections
            .get(section)
            .is_some_and(|options| options.contains_key(option))
    }

    /// Options of one section, if it exists
    pub fn section(&self, section: &str) -> Option<&IndexMap<String, String>> {
        self.sections.get(section)
    }

    /// Section names in the order they were declared
    pub fn section_names(&self) -> Vec<&str> {
        self.sections.keys().map(String::as_str).collect()
    }

    /// Number of sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Check if the config has no sections
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Get the value of an option
    ///
    /// Fails with `SectionNotFound` or `OptionNotFound` depending on which
    /// part is missing.
    pub fn get_option(&self, section: &str, option: &str) -> Result<&str> {
        let options = self
            .sections
            .get(section)
            .ok_or_else(|| Error::section_not_found(section))?;
        options
            .get(option)
            .map(String::as_str)
            .ok_or_else(|| Error::option_not_found(section, option))
    }

    /// Get an option as an integer, using the typed option rules
    pub fn get_i64(&self, section: &str, option: &str) -> Result<i64> {
        let text = self.get_option(section, option)?;
        typed::parse_integer(text)
            .map_err(|e| Error::coercion(format!("{}.{}", section, option), e))
    }

    /// Get an option as a boolean, using the typed option rules
    pub fn get_bool(&self, section: &str, option: &str) -> Result<bool> {
        let text = self.get_option(section, option)?;
        typed::parse_bool(text)
            .map_err(|e| Error::coercion(format!("{}.{}", section, option), e))
    }

    /// Get an option as a comma separated list, using the typed option rules
    pub fn get_list(&self, section: &str, option: &str) -> Result<Vec<String>> {
        let text = self.get_option(section, option)?;
        typed::parse_list(text)
            .map_err(|e| Error::coercion(format!("{}.{}", section, option), e))
    }

    /// Copy of the full section to option to value structure
    pub fn to_nested_map(&self) -> Sections {
        self.sections.clone()
    }

    /// Merge all sections into one option to value map
    ///
    /// Fails if any option name occurs in more than one section.
    pub fn to_flat_map(&self) -> Result<IndexMap<String, String>> {
        let mut flat = IndexMap::new();
        let mut owners: IndexMap<&str, &str> = IndexMap::new();

        for (section, options) in &self.sections {
            for (option, value) in options {
                if let Some(first) = owners.insert(option, section) {
                    return Err(Error::duplicate_key_across_sections(option, first, section));
                }
                flat.insert(option.clone(), value.clone());
            }
        }

        Ok(flat)
    }

    /// Iterate over `(section, options)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexMap<String, String>)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::io(path.display().to_string(), e))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    const BASIC: &str = "[app1]\nport = 8000\nrunning = true\n[global]\nmaster = /opt/applications\napps = app1, app2\n";

    #[test]
    fn test_parse_basic() {
        let config = Config::parse(BASIC).unwrap();

        assert_eq!(config.len(), 2);
        assert_eq!(config.section_names(), vec!["app1", "global"]);
        assert!(config.has_section("app1"));
        assert!(!config.has_section("app2"));
        assert!(config.has_option("app1", "port"));
        assert!(!config.has_option("app1", "master"));
        assert!(!config.has_option("nowhere", "port"));
    }

    #[test]
    fn test_get_option() {
        let config = Config::parse(BASIC).unwrap();

        assert_eq!(config.get_option("global", "master").unwrap(), "/opt/applications");

        let err = config.get_option("app1", "badOpt").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::OptionNotFound {
                section: "app1".into(),
                option: "badOpt".into()
            }
        );

        let err = config.get_option("app2", "no option").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::SectionNotFound {
                section: "app2".into()
            }
        );
    }

    #[test]
    fn test_typed_getters() {
        let config = Config::parse(BASIC).unwrap();

        assert_eq!(config.get_i64("app1", "port").unwrap(), 8000);
        assert!(config.get_bool("app1", "running").unwrap());
        assert_eq!(config.get_list("global", "apps").unwrap(), vec!["app1", "app2"]);

        let err = config.get_i64("global", "master").unwrap_err();
        assert_eq!(err.path.as_deref(), Some("global.master"));
    }

    #[test]
    fn test_nested_map_is_a_copy() {
        let config = Config::parse(BASIC).unwrap();
        let mut nested = config.to_nested_map();
        nested["app1"].insert("port".into(), "1".into());
        nested.shift_remove("global");

        assert_eq!(config.get_option("app1", "port").unwrap(), "8000");
        assert!(config.has_section("global"));
    }

    #[test]
    fn test_flat_map() {
        let config = Config::parse(BASIC).unwrap();
        let flat = config.to_flat_map().unwrap();

        assert_eq!(flat.len(), 4);
        assert_eq!(flat["port"], "8000");
        assert_eq!(flat["apps"], "app1, app2");
    }

    #[test]
    fn test_flat_map_collision() {
        let config = Config::parse("[a]\nport = 1\n[b]\nport = 2\n").unwrap();

        let err = config.to_flat_map().unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::DuplicateKeyAcrossSections {
                key: "port".into(),
                first: "a".into(),
                second: "b".into(),
            }
        );
        assert_eq!(config.to_nested_map().len(), 2);
    }

    #[test]
    fn test_interpolated_parse() {
        let config = Config::parse(
            "[global]\nbasepath = /opt/app\n[app1]\nmaster = /opt/apps\nbindir = %local(master)/bin\nlogdir = %global(basepath)/logs\n",
        )
        .unwrap();

        assert_eq!(config.get_option("app1", "bindir").unwrap(), "/opt/apps/bin");
        assert_eq!(config.get_option("app1", "logdir").unwrap(), "/opt/app/logs");
    }

    #[test]
    fn test_reference_style_option() {
        let options = ConfigOptions::with_references(ReferenceStyle::flag("common"));
        let config =
            Config::parse_with_options("[common]\nroot = /srv\n[web]\ndocs = %g(root)/www\n", &options)
                .unwrap();

        assert_eq!(config.get_option("web", "docs").unwrap(), "/srv/www");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let text = "[b]\nx = %a(y)\n[a]\ny = 1\nz = 2\n";
        assert_eq!(Config::parse(text).unwrap(), Config::parse(text).unwrap());
    }

    #[test]
    fn test_error_reports_source_name() {
        let options = ConfigOptions {
            source_name: Some("app.cfg".into()),
            ..ConfigOptions::default()
        };
        let err = Config::parse_with_options("[a]\n[a]\n", &options).unwrap_err();
        assert!(err.to_string().contains("File: app.cfg:2"));
    }

    #[test]
    fn test_serialize_nested() {
        let config = Config::parse("[a]\nx = 1\n").unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"a":{"x":"1"}}"#);
    }

    #[test]
    fn test_empty_input() {
        let config = Config::parse("").unwrap();
        assert!(config.is_empty());
        assert!(config.to_flat_map().unwrap().is_empty());
    }
}
