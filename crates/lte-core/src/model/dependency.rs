//! Dependency edges
//!
//! A dependency records which prior content a field was derived from,
//! together with a snapshot of that content and a staleness flag.

use super::ids::DependencyId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a field's content relates to its source
///
/// Descriptive only: it never changes processing, just display and triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Cited only
    Reference,
    /// Duplicated verbatim
    Copy,
    /// Elaborated from the source
    Expand,
    /// Derived by computation
    Logic,
}

impl DependencyKind {
    /// Review priority, higher first
    ///
    /// Computed and verbatim content break first when a source drifts.
    #[inline]
    #[must_use]
    pub fn triage_priority(&self) -> u8 {
        match self {
            DependencyKind::Logic => 3,
            DependencyKind::Copy => 2,
            DependencyKind::Expand => 1,
            DependencyKind::Reference => 0,
        }
    }

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Reference => "reference",
            DependencyKind::Copy => "copy",
            DependencyKind::Expand => "expand",
            DependencyKind::Logic => "logic",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One provenance edge from a field to a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    id: DependencyId,
    source: String,
    #[serde(rename = "type")]
    kind: DependencyKind,
    content: String,
    #[serde(default)]
    affected: bool,
}

impl Dependency {
    /// Create an unaffected dependency
    #[must_use]
    pub fn new(
        id: impl Into<DependencyId>,
        source: impl Into<String>,
        kind: DependencyKind,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            kind,
            content: content.into(),
            affected: false,
        }
    }

    /// Dependency ID
    #[inline]
    #[must_use]
    pub fn id(&self) -> &DependencyId {
        &self.id
    }

    /// Source label
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Relationship kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> DependencyKind {
        self.kind
    }

    /// Source snapshot taken when the dependency was recorded
    #[inline]
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the snapshot may be stale
    #[inline]
    #[must_use]
    pub fn is_affected(&self) -> bool {
        self.affected
    }

    // Only the cascade marker and resolver write the flag.
    pub(crate) fn set_affected(&mut self, affected: bool) {
        self.affected = affected;
    }
}
