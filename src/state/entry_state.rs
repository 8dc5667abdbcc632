/// Queue entry state definitions
///
/// This module defines the values a queue row can carry in its `path` and
/// `verify` columns, and the status a lookup reports for a key.
use std::fmt;
use std::path::PathBuf;

/// The `path` column of a fetched queue row
///
/// A row whose path is `NULL` is still waiting and has no `EntryPath`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryPath {
    /// Content was mirrored into this directory
    Stored(PathBuf),

    // ===== Terminal Sentinels =====
    /// The wiki reported that the page does not exist
    Missing,

    /// Fetching failed; not retried
    Error,

    /// Listed in the ignore seeds; never fetched
    Ignored,
}

impl EntryPath {
    const MISSING: &'static str = "__MISSING__";
    const ERROR: &'static str = "__ERROR__";
    const IGNORED: &'static str = "__IGNORE__";

    /// Returns true if this is one of the terminal sentinels
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Self::Stored(_))
    }

    /// Returns the content directory, if any
    pub fn dir(&self) -> Option<&PathBuf> {
        match self {
            Self::Stored(dir) => Some(dir),
            _ => None,
        }
    }

    /// Converts the path to its database string representation
    pub fn to_db_string(&self) -> String {
        match self {
            Self::Stored(dir) => dir.to_string_lossy().into_owned(),
            Self::Missing => Self::MISSING.to_string(),
            Self::Error => Self::ERROR.to_string(),
            Self::Ignored => Self::IGNORED.to_string(),
        }
    }

    /// Parses a path from its database string representation
    ///
    /// Any string that is not a sentinel is a content directory.
    pub fn from_db_string(s: &str) -> Self {
        match s {
            Self::MISSING => Self::Missing,
            Self::ERROR => Self::Error,
            Self::IGNORED => Self::Ignored,
            other => Self::Stored(PathBuf::from(other)),
        }
    }

    /// Short outcome label used in logs and statistics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stored(_) => "stored",
            Self::Missing => "missing",
            Self::Error => "error",
            Self::Ignored => "ignored",
        }
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Confidence that a queue entry is a genuine crawl target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verify {
    /// Found in an article; recorded but not fetched until confirmed
    Discovered,

    /// An entry point; always fetched
    Confirmed,

    /// A redirect alias of a confirmed article
    Redirect,
}

impl Verify {
    pub fn to_db_int(self) -> i64 {
        match self {
            Self::Discovered => 0,
            Self::Confirmed => 1,
            Self::Redirect => 2,
        }
    }

    /// Parses the `verify` column; unknown values count as unconfirmed
    pub fn from_db_int(value: i64) -> Self {
        match value {
            1 => Self::Confirmed,
            2 => Self::Redirect,
            _ => Self::Discovered,
        }
    }
}

/// Status of a `(site, title)` key as reported by a store lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueStatus {
    /// No row exists
    New,

    /// A row exists without a path
    Waiting,

    /// A row exists with a path or a terminal sentinel
    Done,
}

impl QueueStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Waiting => "waiting",
            Self::Done => "done",
        };
        write!(f, "{}", s)
    }
}
