//! Error types for iniconf
//!
//! Errors are structured: a kind describing what went wrong, the
//! `section.option` path it concerns, the source line when it came from
//! the classifier, and an actionable help message.

use std::fmt;
use std::sync::Arc;

/// Result type alias for iniconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for iniconf operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Section or `section.option` the error concerns
    pub path: Option<String>,
    /// Source location (file, line) if available
    pub source_location: Option<SourceLocation>,
    /// Actionable help message
    pub help: Option<String>,
    /// Additional detail, e.g. the offending line
    pub cause: Option<String>,
    /// Underlying I/O error, kept intact for `source()`
    io: Option<Arc<std::io::Error>>,
}

/// Location in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// File name, or `<input>` for in-memory text
    pub file: String,
    /// 1-based line number
    pub line: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// A section header appeared twice in one input
    #[error("Duplicate section found: '{section}'")]
    DuplicateSection { section: String },

    /// An option line appeared before any section header
    #[error("Option pair not declared within a section")]
    NoActiveSection,

    /// An option key appeared twice within one section
    #[error("Duplicate option '{option}' found in section '{section}'")]
    DuplicateOption { section: String, option: String },

    /// An interpolation marker names a section that does not exist
    #[error("Cannot interpolate '{option}', section '{target}' not defined")]
    UnknownSection { option: String, target: String },

    /// An interpolation marker names a key missing from its target section
    #[error("Cannot interpolate '{option}', section '{target}' does not contain key '{key}'")]
    UnknownOption {
        option: String,
        target: String,
        key: String,
    },

    /// An interpolation marker points at a value that carries a marker itself
    #[error("Cannot interpolate '{option}', '{target}.{key}' is itself interpolated")]
    ChainedReference {
        option: String,
        target: String,
        key: String,
    },

    /// Substituted text joined with its surroundings into a new marker
    #[error("Cannot interpolate '{option}', result '{value}' contains a marker")]
    FormedMarker { option: String, value: String },

    /// Direct lookup of a missing section
    #[error("Section '{section}' does not exist")]
    SectionNotFound { section: String },

    /// Direct lookup of a missing option in an existing section
    #[error("Option '{option}' does not exist in section '{section}'")]
    OptionNotFound { section: String, option: String },

    /// The same key is defined in more than one section
    #[error("Cannot create flat config map, duplicate option found: '{key}' (sections '{first}' and '{second}')")]
    DuplicateKeyAcrossSections {
        key: String,
        first: String,
        second: String,
    },

    /// A declared required option is absent
    #[error("Required option '{name}' has not been set")]
    RequiredOptionMissing { name: String, section: Option<String> },

    /// A value could not be coerced to its declared type
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// Reading the input failed
    #[error("I/O error reading '{path}'")]
    Io { path: String },
}

/// Failure to coerce option text into a typed value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoercionError {
    #[error("Invalid value for integer option: '{value}'")]
    InvalidInteger { value: String },

    #[error("Invalid value for boolean option: '{value}'")]
    InvalidBoolean { value: String },

    #[error("Invalid list value: '{value}'")]
    InvalidList { value: String },
}

impl Error {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: None,
            source_location: None,
            help: None,
            cause: None,
            io: None,
        }
    }

    /// Create a duplicate section error
    pub fn duplicate_section(section: impl Into<String>) -> Self {
        let section = section.into();
        Self {
            path: Some(section.clone()),
            help: Some(format!(
                "Merge the two '[{}]' blocks or rename one of them",
                section
            )),
            ..Self::new(ErrorKind::DuplicateSection { section })
        }
    }

    /// Create an error for an option line outside any section
    pub fn no_active_section(line: impl Into<String>) -> Self {
        Self {
            help: Some("Add a '[section]' header before the first option".into()),
            cause: Some(format!("Line: {}", line.into())),
            ..Self::new(ErrorKind::NoActiveSection)
        }
    }

    /// Create a duplicate option error
    pub fn duplicate_option(section: impl Into<String>, option: impl Into<String>) -> Self {
        let section = section.into();
        let option = option.into();
        Self {
            path: Some(format!("{}.{}", section, option)),
            help: Some(format!("Remove one of the '{}' entries", option)),
            ..Self::new(ErrorKind::DuplicateOption { section, option })
        }
    }

    /// Create an unknown reference section error
    pub fn unknown_section(
        section: impl Into<String>,
        option: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        let option = option.into();
        let target = target.into();
        Self {
            path: Some(format!("{}.{}", section.into(), option)),
            help: Some(format!(
                "Declare a '[{}]' section or fix the reference",
                target
            )),
            ..Self::new(ErrorKind::UnknownSection { option, target })
        }
    }

    /// Create an unknown reference option error
    pub fn unknown_option(
        section: impl Into<String>,
        option: impl Into<String>,
        target: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        let option = option.into();
        let target = target.into();
        let key = key.into();
        Self {
            path: Some(format!("{}.{}", section.into(), option)),
            help: Some(format!("Check that '{}' exists in section '{}'", key, target)),
            ..Self::new(ErrorKind::UnknownOption {
                option,
                target,
                key,
            })
        }
    }

    /// Create an error for a reference to a value that is interpolated itself
    pub fn chained_reference(
        section: impl Into<String>,
        option: impl Into<String>,
        target: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        let option = option.into();
        Self {
            path: Some(format!("{}.{}", section.into(), option)),
            help: Some("Reference a literal value; interpolation is a single pass".into()),
            ..Self::new(ErrorKind::ChainedReference {
                option,
                target: target.into(),
                key: key.into(),
            })
        }
    }

    /// Create an error for a resolved value that still reads as a marker
    pub fn formed_marker(
        section: impl Into<String>,
        option: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let option = option.into();
        Self {
            path: Some(format!("{}.{}", section.into(), option)),
            help: Some("Markers are not rescanned after substitution".into()),
            ..Self::new(ErrorKind::FormedMarker {
                option,
                value: value.into(),
            })
        }
    }

    /// Create a section not found error
    pub fn section_not_found(section: impl Into<String>) -> Self {
        let section = section.into();
        Self {
            path: Some(section.clone()),
            ..Self::new(ErrorKind::SectionNotFound { section })
        }
    }

    /// Create an option not found error
    pub fn option_not_found(section: impl Into<String>, option: impl Into<String>) -> Self {
        let section = section.into();
        let option = option.into();
        Self {
            path: Some(format!("{}.{}", section, option)),
            ..Self::new(ErrorKind::OptionNotFound { section, option })
        }
    }

    /// Create a flattening collision error
    pub fn duplicate_key_across_sections(
        key: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        let key = key.into();
        Self {
            help: Some(format!(
                "Rename '{}' in one section or use the nested map instead",
                key
            )),
            ..Self::new(ErrorKind::DuplicateKeyAcrossSections {
                key,
                first: first.into(),
                second: second.into(),
            })
        }
    }

    /// Create a required option missing error
    pub fn required_option_missing(name: impl Into<String>, section: Option<String>) -> Self {
        let name = name.into();
        let (path, help) = match &section {
            Some(s) => (
                format!("{}.{}", s, name),
                format!("Add '{} = <value>' to section '[{}]'", name, s),
            ),
            None => (
                name.clone(),
                format!("Add '{} = <value>' to any section", name),
            ),
        };
        Self {
            path: Some(path),
            help: Some(help),
            ..Self::new(ErrorKind::RequiredOptionMissing { name, section })
        }
    }

    /// Create a coercion error for the option at `path`
    pub fn coercion(path: impl Into<String>, err: CoercionError) -> Self {
        let help = match &err {
            CoercionError::InvalidInteger { .. } => {
                "Use a decimal integer or a 0x/0o/0b prefixed one"
            }
            CoercionError::InvalidBoolean { .. } => {
                "Use one of true/false, yes/no, on/off, 1/0"
            }
            CoercionError::InvalidList { .. } => "Provide at least one comma-separated item",
        };
        Self {
            path: Some(path.into()),
            help: Some(help.into()),
            ..Self::new(ErrorKind::Coercion(err))
        }
    }

    /// Wrap an I/O error encountered while reading `path`
    pub fn io(path: impl Into<String>, err: std::io::Error) -> Self {
        Self {
            cause: Some(err.to_string()),
            io: Some(Arc::new(err)),
            ..Self::new(ErrorKind::Io { path: path.into() })
        }
    }

    /// The underlying I/O error, if this error came from reading input
    pub fn io_error(&self) -> Option<&std::io::Error> {
        self.io.as_deref()
    }

    /// Add source location to the error
    pub fn with_source_location(mut self, loc: SourceLocation) -> Self {
        self.source_location = Some(loc);
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(path) = &self.path {
            write!(f, "\n  Path: {}", path)?;
        }

        if let Some(loc) = &self.source_location {
            write!(f, "\n  File: {}", loc)?;
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.io {
            Some(io) => Some(io.as_ref()),
            None => None,
        }
    }
}
