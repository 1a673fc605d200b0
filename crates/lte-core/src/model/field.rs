//! Fields: addressable content cells

use super::column::ColumnKey;
use super::dependency::Dependency;
use super::ids::FieldId;
use serde::{Deserialize, Serialize};

/// One content cell of a row
///
/// `id` and `key` never change after load; only the value and the
/// dependency flags are written, and only by the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    id: FieldId,
    key: ColumnKey,
    value: String,
    #[serde(default)]
    dependencies: Vec<Dependency>,
}

impl Field {
    /// Create field
    #[must_use]
    pub fn new(id: impl Into<FieldId>, key: ColumnKey, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key,
            value: value.into(),
            dependencies: Vec::new(),
        }
    }

    /// With dependencies, in display order
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Field ID
    #[inline]
    #[must_use]
    pub fn id(&self) -> &FieldId {
        &self.id
    }

    /// Column key
    #[inline]
    #[must_use]
    pub fn key(&self) -> ColumnKey {
        self.key
    }

    /// Current content
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Dependencies in insertion order
    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Number of dependencies flagged as possibly stale
    #[must_use]
    pub fn affected_count(&self) -> usize {
        self.dependencies.iter().filter(|d| d.is_affected()).count()
    }

    /// Affected dependencies, highest triage priority first
    ///
    /// Ties keep insertion order.
    #[must_use]
    pub fn affected_by_triage(&self) -> Vec<&Dependency> {
        let mut affected: Vec<&Dependency> =
            self.dependencies.iter().filter(|d| d.is_affected()).collect();
        affected.sort_by_key(|d| std::cmp::Reverse(d.kind().triage_priority()));
        affected
    }

    pub(crate) fn set_value(&mut self, value: String) {
        self.value = value;
    }

    /// Set every dependency flag, returning how many changed
    pub(crate) fn flag_dependencies(&mut self, affected: bool) -> usize {
        let mut changed = 0;
        for dep in &mut self.dependencies {
            if dep.is_affected() != affected {
                dep.set_affected(affected);
                changed += 1;
            }
        }
        changed
    }
}
