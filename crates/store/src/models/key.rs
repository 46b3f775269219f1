use crate::error::{Error, ErrorKind};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static KUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: the pattern is a compile-time constant.
    Regex::new(r"^(?:kuid:-?\d+:\d+|kuid2:-?\d+:\d+:\d+)$").unwrap()
});

/// Length of every [`FileId`], in characters.
pub const FILE_ID_LENGTH: usize = 32;

/// Key Unique ID of a content asset.
///
/// Two textual forms are accepted: `kuid:<user>:<content>` and
/// `kuid2:<user>:<content>:<version>`, where the user component may be
/// negative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Kuid(String);

impl Kuid {
    /// Rows already in the catalogue are trusted; validation happens at the
    /// API boundary.
    pub(crate) fn from_trusted(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Kuid {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !KUID_PATTERN.is_match(s) {
            exn::bail!(ErrorKind::InvalidKuid(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for Kuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier correlated 1:1 with an asset's current content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId(String);

impl FileId {
    pub(crate) fn from_trusted(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for FileId {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.chars().count() != FILE_ID_LENGTH {
            exn::bail!(ErrorKind::InvalidFileId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
