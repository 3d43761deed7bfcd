//! Interpolation marker detection
//!
//! A marker embeds another option's value inside a value string:
//! - `%local(key)` - `key` from the section declaring the marker
//! - `%global(key)` - `key` from the section named `global`
//! - `%g(key)` / `%l(key)` - the single-letter variant, see [`ReferenceStyle::Flag`]
//!
//! Only one [`ReferenceStyle`] is active for a parse. Text that does not match
//! the active style is left untouched as a literal.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static NAMED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%(\w+)\((\w+)\)").expect("named marker pattern is valid"));

static FLAG_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%([gl])\((\w+)\)").expect("flag marker pattern is valid"));

/// Designator that refers to the declaring section in the named style
pub const LOCAL_DESIGNATOR: &str = "local";

/// How a marker's designator selects the section it reads from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReferenceStyle {
    /// `%<section>(key)`, with `%local(key)` meaning the declaring section
    #[default]
    Named,
    /// `%g(key)` reads from `global_section`, `%l(key)` from the declaring section
    Flag {
        /// Section that `%g(...)` markers resolve against
        global_section: String,
    },
}

impl ReferenceStyle {
    /// Flag style with `global_section` as the `%g` target
    pub fn flag(global_section: impl Into<String>) -> Self {
        ReferenceStyle::Flag {
            global_section: global_section.into(),
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            ReferenceStyle::Named => &*NAMED_MARKER,
            ReferenceStyle::Flag { .. } => &*FLAG_MARKER,
        }
    }

    fn target(&self, designator: &str) -> Target {
        match self {
            ReferenceStyle::Named if designator == LOCAL_DESIGNATOR => Target::Local,
            ReferenceStyle::Named => Target::Section(designator.to_string()),
            ReferenceStyle::Flag { .. } if designator == "l" => Target::Local,
            ReferenceStyle::Flag { global_section } => Target::Section(global_section.clone()),
        }
    }

    /// Find every marker in `value`, in order of appearance
    pub fn scan(&self, value: &str) -> Vec<Marker> {
        self.pattern()
            .captures_iter(value)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let designator = caps.get(1)?.as_str();
                let key = caps.get(2)?.as_str();
                Some(Marker {
                    target: self.target(designator),
                    key: key.to_string(),
                    span: whole.range(),
                })
            })
            .collect()
    }

    /// Check if `value` contains at least one marker
    pub fn contains_marker(&self, value: &str) -> bool {
        self.pattern().is_match(value)
    }
}

/// The section a marker reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The section that declares the marker
    Local,
    /// An explicitly named section
    Section(String),
}

impl Target {
    /// Name of the section this target denotes when declared in `current`
    pub fn section_name<'a>(&'a self, current: &'a str) -> &'a str {
        match self {
            Target::Local => current,
            Target::Section(name) => name,
        }
    }
}

/// A reference recorded for one option value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Section the referenced key lives in
    pub target: Target,
    /// Referenced option key
    pub key: String,
    /// Byte range of the marker text inside the raw value
    pub span: Range<usize>,
}

/// Replace each marker span in `value` with its replacement
///
/// `markers` must be in order of appearance and `replacements` aligned with
/// them. Replacement text is inserted verbatim and never rescanned.
pub fn substitute(value: &str, markers: &[Marker], replacements: &[&str]) -> String {
    let mut out = String::with_capacity(value.len());
    let mut cursor = 0;

    for (marker, replacement) in markers.iter().zip(replacements) {
        out.push_str(&value[cursor..marker.span.start]);
        out.push_str(replacement);
        cursor = marker.span.end;
    }
    out.push_str(&value[cursor..]);

    out
}
