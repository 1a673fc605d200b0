//! Column catalogue
//!
//! The table schema is a closed set. Every row supplies exactly one field
//! per column; the loader rejects anything else.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column key of a learning-task table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnKey {
    /// Learning step title
    Step,
    /// Hours allotted to the step
    Hours,
    /// Learning content, the primary narrative column
    Content,
    /// What students do
    StudentActivity,
    /// What the instructor does
    TeacherActivity,
    /// Expected learning outcome
    Outcome,
    /// Learning resources
    Resources,
}

impl ColumnKey {
    /// All columns in display order
    pub const ALL: [ColumnKey; 7] = [
        ColumnKey::Step,
        ColumnKey::Hours,
        ColumnKey::Content,
        ColumnKey::StudentActivity,
        ColumnKey::TeacherActivity,
        ColumnKey::Outcome,
        ColumnKey::Resources,
    ];

    /// Column whose field receives row-scoped regeneration output
    pub const PRIMARY: ColumnKey = ColumnKey::Content;

    /// Wire name as used in documents
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKey::Step => "step",
            ColumnKey::Hours => "hours",
            ColumnKey::Content => "content",
            ColumnKey::StudentActivity => "studentActivity",
            ColumnKey::TeacherActivity => "teacherActivity",
            ColumnKey::Outcome => "outcome",
            ColumnKey::Resources => "resources",
        }
    }

    /// Column definition (header and display width)
    #[inline]
    #[must_use]
    pub fn def(&self) -> ColumnDef {
        let (header, width) = match self {
            ColumnKey::Step => ("Learning step", 12),
            ColumnKey::Hours => ("Hours", 6),
            ColumnKey::Content => ("Learning content", 40),
            ColumnKey::StudentActivity => ("Student activity", 40),
            ColumnKey::TeacherActivity => ("Teacher activity", 40),
            ColumnKey::Outcome => ("Learning outcome", 30),
            ColumnKey::Resources => ("Learning resources", 30),
        };
        ColumnDef {
            key: *self,
            header,
            width,
        }
    }

    /// Whether this is the primary narrative column
    #[inline]
    #[must_use]
    pub fn is_primary(&self) -> bool {
        *self == Self::PRIMARY
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnKey {
    type Err = UnknownColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownColumn(s.to_string()))
    }
}

/// Error for a column key outside the catalogue
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown column key: {0}")]
pub struct UnknownColumn(pub String);

/// Display metadata for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column key
    pub key: ColumnKey,
    /// Header label
    pub header: &'static str,
    /// Display width in characters
    pub width: usize,
}

/// Column definitions in display order
#[must_use]
pub fn columns() -> Vec<ColumnDef> {
    ColumnKey::ALL.iter().map(ColumnKey::def).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for key in ColumnKey::ALL {
            assert_eq!(key.as_str().parse::<ColumnKey>(), Ok(key));
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!("activities".parse::<ColumnKey>().is_err());
    }

    #[test]
    fn content_is_the_only_primary_column() {
        let primaries: Vec<_> = ColumnKey::ALL.into_iter().filter(ColumnKey::is_primary).collect();
        assert_eq!(primaries, vec![ColumnKey::Content]);
    }
}
