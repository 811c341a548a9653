//! Datafile version parsing and compatibility rules.
//!
//! A datafile is readable when it was written by the same major version and
//! an equal or older minor version of the library. The patch component never
//! matters. Newer-minor datafiles are rejected because they may rely on
//! features this library does not know about.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    #[error("empty version string")]
    Empty,

    #[error("invalid version component '{component}' in '{input}'")]
    InvalidComponent { input: String, component: String },
}

/// Dotted version as an ordered sequence of non-negative integers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FormatVersion(Vec<u64>);

impl FormatVersion {
    pub fn new(components: Vec<u64>) -> Self {
        Self(components)
    }

    /// Version of this library.
    pub fn current() -> Self {
        crate::VERSION
            .parse()
            .unwrap_or_else(|_| Self(vec![0]))
    }

    pub fn components(&self) -> &[u64] {
        &self.0
    }

    pub fn major(&self) -> u64 {
        self.0.first().copied().unwrap_or(0)
    }

    /// Minor component; a version written as `"3"` has minor `0`.
    pub fn minor(&self) -> u64 {
        self.0.get(1).copied().unwrap_or(0)
    }

    /// Whether a datafile written by `bundle` can be read by `self`.
    pub fn can_read(&self, bundle: &FormatVersion) -> bool {
        is_compatible(self, bundle)
    }
}

impl FromStr for FormatVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionParseError::Empty);
        }
        let components = trimmed
            .split('.')
            .map(|part| {
                part.parse::<u64>().map_err(|_| VersionParseError::InvalidComponent {
                    input: s.to_string(),
                    component: part.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(components))
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Same major, running minor at least the bundle's minor.
pub fn is_compatible(running: &FormatVersion, bundle: &FormatVersion) -> bool {
    running.major() == bundle.major() && running.minor() >= bundle.minor()
}

/// Outcome of checking a datafile's recorded version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCheck {
    Compatible,
    /// No version recorded. Callers warn and continue.
    Missing,
    /// A version is recorded but cannot be parsed. Callers warn and continue.
    Unparsable(String),
    /// Hard failure unless the caller opted out of the check.
    Incompatible { running: String, bundle: String },
}

impl VersionCheck {
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Missing | Self::Unparsable(_))
    }
}

/// Compare the running library version against a datafile's stored version.
pub fn check(running: &FormatVersion, bundle: Option<&str>) -> VersionCheck {
    let Some(raw) = bundle else {
        return VersionCheck::Missing;
    };
    match raw.parse::<FormatVersion>() {
        Err(_) => VersionCheck::Unparsable(raw.to_string()),
        Ok(theirs) if is_compatible(running, &theirs) => VersionCheck::Compatible,
        Ok(_) => VersionCheck::Incompatible {
            running: running.to_string(),
            bundle: raw.to_string(),
        },
    }
}
