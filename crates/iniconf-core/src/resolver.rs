//! Interpolation resolution
//!
//! Rewrites every marked option value by replacing each marker with the
//! value it references. Resolution is a single pass: a marker may only
//! reference a literal (unmarked) value, and substituted text is never
//! scanned again. A reference to a value that is itself interpolated fails
//! with [`ErrorKind::ChainedReference`](crate::error::ErrorKind::ChainedReference).
//! A substitution whose result reads as a marker in the table's style, such
//! as `%%local(k)(x)` with `k = global`, fails with
//! [`ErrorKind::FormedMarker`](crate::error::ErrorKind::FormedMarker).

use indexmap::IndexMap;

use crate::classifier::RawTable;
use crate::error::{Error, Result};
use crate::interpolation::{self, Marker};

/// Section name to option name to value
pub type Sections = IndexMap<String, IndexMap<String, String>>;

/// Resolves the markers recorded in a [`RawTable`]
pub struct Resolver<'a> {
    table: &'a RawTable,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over `table`
    pub fn new(table: &'a RawTable) -> Self {
        Self { table }
    }

    /// Look up the value a single marker refers to
    ///
    /// `section` and `option` identify the value that declares the marker.
    pub fn lookup(&self, section: &str, option: &str, marker: &Marker) -> Result<&'a str> {
        let target = marker.target.section_name(section);

        let Some(target_section) = self.table.sections.get(target) else {
            return Err(Error::unknown_section(section, option, target));
        };
        let Some(value) = target_section.options.get(&marker.key) else {
            return Err(Error::unknown_option(section, option, target, &marker.key));
        };
        if target_section.is_interpolated(&marker.key) {
            return Err(Error::chained_reference(section, option, target, &marker.key));
        }

        Ok(value.as_str())
    }

    /// Compute the resolved value of one marked option
    pub fn resolve_option(&self, section: &str, option: &str) -> Result<Option<String>> {
        let Some(raw) = self.table.sections.get(section) else {
            return Err(Error::section_not_found(section));
        };
        let Some(value) = raw.options.get(option) else {
            return Err(Error::option_not_found(section, option));
        };
        let Some(markers) = raw.markers.get(option) else {
            return Ok(None);
        };

        let replacements = markers
            .iter()
            .map(|m| self.lookup(section, option, m))
            .collect::<Result<Vec<_>>>()?;
        let resolved = interpolation::substitute(value, markers, &replacements);
        if self.table.style.contains_marker(&resolved) {
            return Err(Error::formed_marker(section, option, resolved));
        }

        log::debug!("Interpolated {}.{}: {:?} -> {:?}", section, option, value, resolved);
        Ok(Some(resolved))
    }

    /// Resolve every marked option, failing on the first bad reference
    pub fn resolve_all(&self) -> Result<Sections> {
        let mut resolved: Sections = IndexMap::with_capacity(self.table.sections.len());

        for (name, section) in &self.table.sections {
            let mut options = section.options.clone();
            for option in section.markers.keys() {
                if let Some(value) = self.resolve_option(name, option)? {
                    options.insert(option.clone(), value);
                }
            }
            resolved.insert(name.clone(), options);
        }

        Ok(resolved)
    }
}

/// Resolve all markers in `table`
pub fn resolve(table: &RawTable) -> Result<Sections> {
    Resolver::new(table).resolve_all()
}
