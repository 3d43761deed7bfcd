//! Typed option declarations
//!
//! An [`OptionSet`] holds declarations of the options an application expects,
//! each with a target type, a default and a required flag. Declaring an
//! option returns an [`OptionHandle`] that reads the bound value once
//! [`OptionSet::bind`] has run against a parsed [`Config`].
//!
//! ```rust
//! use iniconf_core::{Config, OptionSet};
//!
//! let mut options = OptionSet::new();
//! let port = options.int_option("port", "app1", 1000, false);
//! assert_eq!(port.get(), 1000);
//!
//! let config = Config::parse("[app1]\nport = 8000\n").unwrap();
//! options.bind(&config).unwrap();
//! assert_eq!(port.get(), 8000);
//! ```

use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use indexmap::IndexMap;
use regex::Regex;

use crate::config::Config;
use crate::error::{CoercionError, Error, Result};

static LIST_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,\s*").expect("list separator pattern is valid"));

/// Parse an integer in decimal, or with a `0x`, `0o` or `0b` prefix
pub fn parse_integer(text: &str) -> std::result::Result<i64, CoercionError> {
    let invalid = || CoercionError::InvalidInteger {
        value: text.to_string(),
    };
    let trimmed = text.trim();

    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let (radix, digits) = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
        .iter()
        .find_map(|(prefix, radix)| unsigned.strip_prefix(prefix).map(|d| (*radix, d)))
        .unwrap_or((10, unsigned));

    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(invalid());
    }

    let signed = if negative {
        format!("-{}", digits)
    } else {
        digits.to_string()
    };
    i64::from_str_radix(&signed, radix).map_err(|_| invalid())
}

/// Parse a boolean token, case-insensitively
///
/// Accepted: `true`/`false`, `t`/`f`, `yes`/`no`, `y`/`n`, `on`/`off`, `1`/`0`.
pub fn parse_bool(text: &str) -> std::result::Result<bool, CoercionError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
        _ => Err(CoercionError::InvalidBoolean {
            value: text.to_string(),
        }),
    }
}

/// Split a comma separated list, ignoring whitespace around each comma
pub fn parse_list(text: &str) -> std::result::Result<Vec<String>, CoercionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoercionError::InvalidList {
            value: text.to_string(),
        });
    }
    Ok(LIST_SEPARATOR
        .split(trimmed)
        .map(str::to_string)
        .collect())
}

/// The semantic type an option is declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Integer,
    Boolean,
    String,
    List,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptionType::Integer => "integer",
            OptionType::Boolean => "boolean",
            OptionType::String => "string",
            OptionType::List => "list",
        };
        f.write_str(name)
    }
}

/// Shared view of a declared option's value
///
/// Starts out holding the declared default and is updated when the owning
/// [`OptionSet`] binds a config that defines the option.
#[derive(Debug)]
pub struct OptionHandle<T> {
    slot: Arc<RwLock<T>>,
}

impl<T> Clone for OptionHandle<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: Clone> OptionHandle<T> {
    fn new(default: T) -> Self {
        Self {
            slot: Arc::new(RwLock::new(default)),
        }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, value: T) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

/// Storage for one declared option, one case per supported type
#[derive(Debug, Clone)]
enum Slot {
    Integer(OptionHandle<i64>),
    Boolean(OptionHandle<bool>),
    String(OptionHandle<String>),
    List(OptionHandle<Vec<String>>),
}

impl Slot {
    fn option_type(&self) -> OptionType {
        match self {
            Slot::Integer(_) => OptionType::Integer,
            Slot::Boolean(_) => OptionType::Boolean,
            Slot::String(_) => OptionType::String,
            Slot::List(_) => OptionType::List,
        }
    }

    /// Coerce `text` for this slot without touching its handle
    fn prepare(&self, text: &str) -> std::result::Result<Pending<'_>, CoercionError> {
        Ok(match self {
            Slot::Integer(h) => Pending::Integer(h, parse_integer(text)?),
            Slot::Boolean(h) => Pending::Boolean(h, parse_bool(text)?),
            Slot::String(h) => Pending::String(h, text.to_string()),
            Slot::List(h) => Pending::List(h, parse_list(text)?),
        })
    }
}

/// A coerced value waiting to be written to its handle
enum Pending<'a> {
    Integer(&'a OptionHandle<i64>, i64),
    Boolean(&'a OptionHandle<bool>, bool),
    String(&'a OptionHandle<String>, String),
    List(&'a OptionHandle<Vec<String>>, Vec<String>),
}

impl Pending<'_> {
    fn commit(self) {
        match self {
            Pending::Integer(h, v) => h.store(v),
            Pending::Boolean(h, v) => h.store(v),
            Pending::String(h, v) => h.store(v),
            Pending::List(h, v) => h.store(v),
        }
    }
}

/// Declaration of one expected option
#[derive(Debug, Clone)]
pub struct OptionSpec {
    name: String,
    section: Option<String>,
    required: bool,
    slot: Slot,
}

impl OptionSpec {
    /// Option key
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning section, or `None` to search every section
    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    /// Whether binding fails when the option is absent
    pub fn required(&self) -> bool {
        self.required
    }

    /// Declared type
    pub fn option_type(&self) -> OptionType {
        self.slot.option_type()
    }

    /// `section.name`, or just `name` for top-level options
    pub fn path(&self) -> String {
        match &self.section {
            Some(section) => format!("{}.{}", section, self.name),
            None => self.name.clone(),
        }
    }

    /// Coerce `text` and store it in this option's handle
    pub fn set(&self, text: &str) -> std::result::Result<(), CoercionError> {
        self.slot.prepare(text)?.commit();
        Ok(())
    }
}

type SpecKey = (String, Option<String>);

/// An explicit set of option declarations, bound against a config on demand
#[derive(Debug, Clone, Default)]
pub struct OptionSet {
    specs: IndexMap<SpecKey, OptionSpec>,
}

impl OptionSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of declarations
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Check if nothing has been declared
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Iterate declarations in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &OptionSpec> {
        self.specs.values()
    }

    /// Look up the declaration for `name` in `section` (empty for top-level)
    pub fn get(&self, name: &str, section: &str) -> Option<&OptionSpec> {
        self.specs
            .get(&(name.to_string(), section_key(section)))
    }

    /// Declare an integer option
    pub fn int_option(
        &mut self,
        name: &str,
        section: &str,
        default: i64,
        required: bool,
    ) -> OptionHandle<i64> {
        let handle = OptionHandle::new(default);
        self.declare(name, section, required, Slot::Integer(handle.clone()));
        handle
    }

    /// Declare a boolean option
    pub fn bool_option(
        &mut self,
        name: &str,
        section: &str,
        default: bool,
        required: bool,
    ) -> OptionHandle<bool> {
        let handle = OptionHandle::new(default);
        self.declare(name, section, required, Slot::Boolean(handle.clone()));
        handle
    }

    /// Declare a string option
    pub fn string_option(
        &mut self,
        name: &str,
        section: &str,
        default: impl Into<String>,
        required: bool,
    ) -> OptionHandle<String> {
        let handle = OptionHandle::new(default.into());
        self.declare(name, section, required, Slot::String(handle.clone()));
        handle
    }

    /// Declare a list option
    pub fn list_option(
        &mut self,
        name: &str,
        section: &str,
        default: Vec<String>,
        required: bool,
    ) -> OptionHandle<Vec<String>> {
        let handle = OptionHandle::new(default);
        self.declare(name, section, required, Slot::List(handle.clone()));
        handle
    }

    fn declare(&mut self, name: &str, section: &str, required: bool, slot: Slot) {
        let spec = OptionSpec {
            name: name.to_string(),
            section: section_key(section),
            required,
            slot,
        };
        let key = (spec.name.clone(), spec.section.clone());
        if let Some(previous) = self.specs.insert(key, spec) {
            log::warn!(
                "Option '{}' declared again; the earlier {} declaration will not be bound",
                previous.path(),
                previous.option_type()
            );
        }
    }

    /// Bind every declaration against `config`
    ///
    /// Section-scoped options are looked up in their section; top-level ones
    /// in the flattened config, which fails if any key occurs in more than
    /// one section. All values are coerced before any handle is updated, so
    /// on error every handle keeps its previous value.
    pub fn bind(&self, config: &Config) -> Result<()> {
        let mut flat: Option<IndexMap<String, String>> = None;
        let mut staged = Vec::with_capacity(self.specs.len());

        for spec in self.specs.values() {
            let text = match &spec.section {
                Some(section) => config
                    .section(section)
                    .and_then(|options| options.get(&spec.name)),
                None => {
                    if flat.is_none() {
                        flat = Some(config.to_flat_map()?);
                    }
                    flat.as_ref().and_then(|f| f.get(&spec.name))
                }
            };

            let Some(text) = text else {
                if spec.required {
                    return Err(Error::required_option_missing(
                        &spec.name,
                        spec.section.clone(),
                    ));
                }
                log::debug!("Option '{}' not set, keeping default", spec.path());
                continue;
            };

            let pending = spec
                .slot
                .prepare(text)
                .map_err(|e| Error::coercion(spec.path(), e))?;
            staged.push((spec, pending));
        }

        for (spec, pending) in staged {
            log::debug!("Bound {} option '{}'", spec.option_type(), spec.path());
            pending.commit();
        }

        Ok(())
    }
}

fn section_key(section: &str) -> Option<String> {
    if section.is_empty() {
        None
    } else {
        Some(section.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    const BASIC: &str = "[app1]\nport = 8000\nrunning = true\n[global]\nmaster = /opt/applications\napps = app1, app2\n";

    fn basic() -> Config {
        Config::parse(BASIC).unwrap()
    }

    #[test]
    fn test_parse_integer_forms() {
        assert_eq!(parse_integer("8000"), Ok(8000));
        assert_eq!(parse_integer("-42"), Ok(-42));
        assert_eq!(parse_integer("+7"), Ok(7));
        assert_eq!(parse_integer("0x1F"), Ok(31));
        assert_eq!(parse_integer("0o17"), Ok(15));
        assert_eq!(parse_integer("0b101"), Ok(5));
        assert_eq!(parse_integer("-0x10"), Ok(-16));
        assert_eq!(parse_integer(" 12 "), Ok(12));
    }

    #[test]
    fn test_parse_integer_rejects_malformed() {
        for text in ["", "eighty", "0x", "12abc", "--1", "+-1", "1.5", "0xZZ"] {
            assert_eq!(
                parse_integer(text),
                Err(CoercionError::InvalidInteger { value: text.into() }),
                "{:?}",
                text
            );
        }
    }

    #[test]
    fn test_parse_integer_overflow() {
        assert!(parse_integer("9223372036854775807").is_ok());
        assert!(parse_integer("-9223372036854775808").is_ok());
        assert!(parse_integer("9223372036854775808").is_err());
    }

    #[test]
    fn test_parse_bool_tokens() {
        for text in ["true", "TRUE", "True", "t", "yes", "y", "on", "1"] {
            assert_eq!(parse_bool(text), Ok(true), "{:?}", text);
        }
        for text in ["false", "F", "no", "n", "off", "0"] {
            assert_eq!(parse_bool(text), Ok(false), "{:?}", text);
        }
        assert!(matches!(
            parse_bool("maybe"),
            Err(CoercionError::InvalidBoolean { .. })
        ));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("app1, app2").unwrap(), vec!["app1", "app2"]);
        assert_eq!(parse_list("a ,b,  c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(parse_list("single").unwrap(), vec!["single"]);
        assert_eq!(
            parse_list("   "),
            Err(CoercionError::InvalidList {
                value: "   ".into()
            })
        );
    }

    #[test]
    fn test_defaults_before_bind() {
        let mut options = OptionSet::new();
        let port = options.int_option("port", "app1", 1000, false);
        let name = options.string_option("master", "global", "def_string", false);

        assert_eq!(port.get(), 1000);
        assert_eq!(name.get(), "def_string");
    }

    #[test]
    fn test_bind_all_types() {
        let mut options = OptionSet::new();
        let port = options.int_option("port", "app1", 1000, false);
        let running = options.bool_option("running", "app1", false, true);
        let master = options.string_option("master", "global", "def_string", false);
        let apps = options.list_option("apps", "global", Vec::new(), false);

        options.bind(&basic()).unwrap();

        assert_eq!(port.get(), 8000);
        assert!(running.get());
        assert_eq!(master.get(), "/opt/applications");
        assert_eq!(apps.get(), vec!["app1".to_string(), "app2".to_string()]);
    }

    #[test]
    fn test_required_missing_in_section() {
        let mut options = OptionSet::new();
        options.string_option("not_there", "global", "", true);

        let err = options.bind(&basic()).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::RequiredOptionMissing {
                name: "not_there".into(),
                section: Some("global".into()),
            }
        );
    }

    #[test]
    fn test_required_missing_section() {
        let mut options = OptionSet::new();
        options.int_option("port", "app9", 0, true);

        let err = options.bind(&basic()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::RequiredOptionMissing { .. }));
    }

    #[test]
    fn test_required_top_level_missing() {
        let mut options = OptionSet::new();
        let absent = options.string_option("absent", "", "", true);

        let err = options.bind(&basic()).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::RequiredOptionMissing {
                name: "absent".into(),
                section: None,
            }
        );
        assert_eq!(err.path.as_deref(), Some("absent"));
        assert_eq!(absent.get(), "");
    }

    #[test]
    fn test_optional_missing_keeps_default() {
        let mut options = OptionSet::new();
        let timeout = options.int_option("timeout", "app1", 30, false);

        options.bind(&basic()).unwrap();
        assert_eq!(timeout.get(), 30);
    }

    #[test]
    fn test_top_level_lookup() {
        let mut options = OptionSet::new();
        let master = options.string_option("master", "", "none", true);

        options.bind(&basic()).unwrap();
        assert_eq!(master.get(), "/opt/applications");
    }

    #[test]
    fn test_top_level_lookup_fails_on_flatten_collision() {
        let config = Config::parse("[a]\nport = 1\nname = x\n[b]\nport = 2\n").unwrap();
        let mut options = OptionSet::new();
        options.string_option("name", "", "", false);

        let err = options.bind(&config).unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::DuplicateKeyAcrossSections { .. }
        ));
    }

    #[test]
    fn test_scoped_lookup_ignores_flatten_collision() {
        let config = Config::parse("[a]\nport = 1\n[b]\nport = 2\n").unwrap();
        let mut options = OptionSet::new();
        let port = options.int_option("port", "b", 0, true);

        options.bind(&config).unwrap();
        assert_eq!(port.get(), 2);
    }

    #[test]
    fn test_invalid_integer_aborts_without_partial_update() {
        let config = Config::parse("[app1]\nport = 8000\nworkers = many\n").unwrap();
        let mut options = OptionSet::new();
        let port = options.int_option("port", "app1", 1, false);
        options.int_option("workers", "app1", 4, false);

        let err = options.bind(&config).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::Coercion(CoercionError::InvalidInteger {
                value: "many".into()
            })
        );
        assert_eq!(err.path.as_deref(), Some("app1.workers"));
        assert_eq!(port.get(), 1);
    }

    #[test]
    fn test_invalid_boolean() {
        let config = Config::parse("[app1]\nrunning = perhaps\n").unwrap();
        let mut options = OptionSet::new();
        options.bool_option("running", "app1", false, false);

        let err = options.bind(&config).unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::Coercion(CoercionError::InvalidBoolean { .. })
        ));
    }

    #[test]
    fn test_invalid_empty_list() {
        let config = Config::parse("[global]\napps = \n").unwrap();
        let mut options = OptionSet::new();
        options.list_option("apps", "global", Vec::new(), false);

        let err = options.bind(&config).unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::Coercion(CoercionError::InvalidList { .. })
        ));
    }

    #[test]
    fn test_redeclaration_replaces() {
        let mut options = OptionSet::new();
        let first = options.int_option("port", "app1", 1, false);
        let second = options.int_option("port", "app1", 2, false);

        assert_eq!(options.len(), 1);
        options.bind(&basic()).unwrap();
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 8000);
    }

    #[test]
    fn test_spec_set_and_accessors() {
        let mut options = OptionSet::new();
        let port = options.int_option("port", "app1", 0, true);
        let spec = options.get("port", "app1").unwrap();

        assert_eq!(spec.name(), "port");
        assert_eq!(spec.section(), Some("app1"));
        assert!(spec.required());
        assert_eq!(spec.option_type(), OptionType::Integer);

        spec.set("0x10").unwrap();
        assert_eq!(port.get(), 16);
        assert!(spec.set("nope").is_err());
        assert_eq!(port.get(), 16);
    }

    #[test]
    fn test_spec_set_each_type() {
        let mut options = OptionSet::new();
        let running = options.bool_option("running", "app1", false, false);
        let master = options.string_option("master", "global", "", false);
        let apps = options.list_option("apps", "global", Vec::new(), false);

        options.get("running", "app1").unwrap().set("Yes").unwrap();
        options.get("master", "global").unwrap().set(" /srv ").unwrap();
        options.get("apps", "global").unwrap().set("a, b").unwrap();

        assert!(running.get());
        assert_eq!(master.get(), " /srv ");
        assert_eq!(apps.get(), vec!["a", "b"]);

        let err = options.get("apps", "global").unwrap().set("  ").unwrap_err();
        assert!(matches!(err, CoercionError::InvalidList { .. }));
        assert_eq!(apps.get(), vec!["a", "b"]);
    }

    #[test]
    fn test_declarations_in_order() {
        let mut options = OptionSet::new();
        assert!(options.is_empty());

        options.list_option("apps", "global", Vec::new(), false);
        options.int_option("port", "app1", 0, true);
        options.string_option("master", "", "", false);

        assert!(!options.is_empty());
        let paths: Vec<String> = options.iter().map(OptionSpec::path).collect();
        assert_eq!(paths, vec!["global.apps", "app1.port", "master"]);
    }

    #[test]
    fn test_empty_section_means_top_level() {
        let mut options = OptionSet::new();
        options.bool_option("running", "", false, false);

        let spec = options.get("running", "").unwrap();
        assert_eq!(spec.section(), None);
        assert_eq!(spec.path(), "running");
    }
}
