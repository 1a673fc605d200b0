//! Rows and tasks

use super::column::ColumnKey;
use super::field::Field;
use super::ids::{FieldId, RowId, TaskId};
use serde::Serialize;
use std::collections::BTreeMap;

/// One instructional step: a field per column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    id: RowId,
    fields: BTreeMap<ColumnKey, Field>,
}

impl Row {
    /// Create row from fields
    ///
    /// Completeness is checked when the row becomes part of a document.
    #[must_use]
    pub fn new(id: impl Into<RowId>, fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            id: id.into(),
            fields: fields.into_iter().map(|f| (f.key(), f)).collect(),
        }
    }

    /// Row ID
    #[inline]
    #[must_use]
    pub fn id(&self) -> &RowId {
        &self.id
    }

    /// Field for a column
    #[inline]
    #[must_use]
    pub fn field(&self, key: ColumnKey) -> Option<&Field> {
        self.fields.get(&key)
    }

    /// Fields in column order
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    /// Find a field by ID
    #[must_use]
    pub fn field_by_id(&self, id: &FieldId) -> Option<&Field> {
        self.fields.values().find(|f| f.id() == id)
    }

    /// Columns missing from this row
    #[must_use]
    pub fn missing_columns(&self) -> Vec<ColumnKey> {
        ColumnKey::ALL
            .into_iter()
            .filter(|k| !self.fields.contains_key(k))
            .collect()
    }

    pub(crate) fn field_mut(&mut self, key: ColumnKey) -> Option<&mut Field> {
        self.fields.get_mut(&key)
    }

    pub(crate) fn fields_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.fields.values_mut()
    }
}

/// A learning task: named, ordered rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    id: TaskId,
    name: String,
    rows: Vec<Row>,
}

impl Task {
    /// Create task
    #[must_use]
    pub fn new(id: impl Into<TaskId>, name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rows,
        }
    }

    /// Task ID
    #[inline]
    #[must_use]
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    /// Display name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rows in instructional order
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Find a row by ID
    #[must_use]
    pub fn row(&self, id: &RowId) -> Option<&Row> {
        self.rows.iter().find(|r| r.id() == id)
    }

    /// Total affected dependencies across all fields
    #[must_use]
    pub fn affected_total(&self) -> usize {
        self.rows
            .iter()
            .flat_map(Row::fields)
            .map(Field::affected_count)
            .sum()
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub(crate) fn row_mut(&mut self, id: &RowId) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| r.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_are_reported_in_display_order() {
        let row = Row::new(
            "r1",
            vec![
                Field::new("a", ColumnKey::Step, "1"),
                Field::new("b", ColumnKey::Content, "x"),
            ],
        );
        assert_eq!(
            row.missing_columns(),
            vec![
                ColumnKey::Hours,
                ColumnKey::StudentActivity,
                ColumnKey::TeacherActivity,
                ColumnKey::Outcome,
                ColumnKey::Resources
            ]
        );
    }

    #[test]
    fn fields_iterate_in_column_order() {
        let row = Row::new(
            "r1",
            vec![
                Field::new("c", ColumnKey::Resources, ""),
                Field::new("a", ColumnKey::Step, ""),
            ],
        );
        let keys: Vec<_> = row.fields().map(Field::key).collect();
        assert_eq!(keys, vec![ColumnKey::Step, ColumnKey::Resources]);
    }
}
