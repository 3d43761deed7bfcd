//! Line classification
//!
//! Turns raw text lines into a [`RawTable`] of sections and options.
//! Recognised lines:
//! - `[name]` - opens a section
//! - `key = value` - an option in the current section (at least one space
//!   on each side of `=`, value is the rest of the line)
//!
//! Anything else (blank lines, comments, malformed text) is skipped.
//! Classification stops at the first structural error.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{Error, Result, SourceLocation};
use crate::interpolation::{Marker, ReferenceStyle};

static SECTION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.+)\]$").expect("section pattern is valid"));

static OPTION_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s+=\s+(.*)$").expect("option pattern is valid"));

/// Source name used when the input did not come from a file
pub const DEFAULT_SOURCE: &str = "<input>";

/// What a single line contains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// `[name]`
    Section(&'a str),
    /// `key = value`
    Pair { key: &'a str, value: &'a str },
    /// Anything the classifier does not recognise
    Ignored,
}

/// Classify one line of input
pub fn classify_line(line: &str) -> Line<'_> {
    let line = line.strip_suffix('\r').unwrap_or(line);

    if let Some(caps) = SECTION_HEADER.captures(line) {
        if let Some(name) = caps.get(1) {
            return Line::Section(name.as_str());
        }
    }

    if let Some(caps) = OPTION_PAIR.captures(line) {
        if let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) {
            return Line::Pair {
                key: key.as_str(),
                value: value.as_str(),
            };
        }
    }

    Line::Ignored
}

/// Options of one section before interpolation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSection {
    /// Option values as written, markers included
    pub options: IndexMap<String, String>,
    /// Markers found in each option value, keyed by option name
    pub markers: IndexMap<String, Vec<Marker>>,
}

impl RawSection {
    /// Check if the option's value carries at least one marker
    pub fn is_interpolated(&self, option: &str) -> bool {
        self.markers.contains_key(option)
    }
}

/// Sections and options as read, before interpolation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub sections: IndexMap<String, RawSection>,
    /// Marker syntax the values were scanned with
    pub style: ReferenceStyle,
}

impl RawTable {
    /// Number of markers recorded across all sections
    pub fn marker_count(&self) -> usize {
        self.sections
            .values()
            .flat_map(|s| s.markers.values())
            .map(Vec::len)
            .sum()
    }
}

/// Builds a [`RawTable`] one line at a time
pub struct Classifier<'a> {
    style: &'a ReferenceStyle,
    source: &'a str,
    table: RawTable,
    current: Option<String>,
    line_no: usize,
}

impl<'a> Classifier<'a> {
    /// Create a classifier that records markers in `style` and reports
    /// errors against `source`
    pub fn new(style: &'a ReferenceStyle, source: &'a str) -> Self {
        Self {
            style,
            source,
            table: RawTable {
                style: style.clone(),
                ..RawTable::default()
            },
            current: None,
            line_no: 0,
        }
    }

    /// Feed the next line
    pub fn push_line(&mut self, line: &str) -> Result<()> {
        self.line_no += 1;
        let line = line.strip_suffix('\r').unwrap_or(line);

        let result = match classify_line(line) {
            Line::Section(name) => self.open_section(name),
            Line::Pair { key, value } => self.add_option(line, key, value),
            Line::Ignored => {
                log::trace!("{}: ignoring line {:?}", self.location(), line);
                Ok(())
            }
        };
        result.map_err(|e| e.with_source_location(self.location()))
    }

    /// Consume the classifier and return the table
    pub fn finish(self) -> RawTable {
        self.table
    }

    fn location(&self) -> SourceLocation {
        SourceLocation {
            file: self.source.to_string(),
            line: self.line_no,
        }
    }

    fn open_section(&mut self, name: &str) -> Result<()> {
        if self.table.sections.contains_key(name) {
            return Err(Error::duplicate_section(name));
        }
        log::debug!("{}: section [{}]", self.location(), name);
        self.table
            .sections
            .insert(name.to_string(), RawSection::default());
        self.current = Some(name.to_string());
        Ok(())
    }

    fn add_option(&mut self, line: &str, key: &str, value: &str) -> Result<()> {
        let Some(section_name) = self.current.as_deref() else {
            return Err(Error::no_active_section(line));
        };
        let Some(section) = self.table.sections.get_mut(section_name) else {
            return Err(Error::section_not_found(section_name));
        };
        if section.options.contains_key(key) {
            return Err(Error::duplicate_option(section_name, key));
        }

        let markers = self.style.scan(value);
        if !markers.is_empty() {
            log::trace!(
                "{}.{}: {} interpolation marker(s)",
                section_name,
                key,
                markers.len()
            );
            section.markers.insert(key.to_string(), markers);
        }
        section.options.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Classify every line of `lines`
pub fn classify<I, S>(lines: I, style: &ReferenceStyle, source: &str) -> Result<RawTable>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut classifier = Classifier::new(style, source);
    for line in lines {
        classifier.push_line(line.as_ref())?;
    }
    Ok(classifier.finish())
}
