//! Document state
//!
//! Owns every task of a learning-task document plus the navigation state
//! (active task, focused field). Construction validates the model
//! invariants; afterwards the structure is fixed and only field values and
//! dependency flags change.

use crate::error::ModelError;
use crate::model::{ColumnKey, Field, FieldId, Row, RowId, Task, TaskId};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Where a field lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldLocation {
    /// Owning task
    pub task: TaskId,
    /// Owning row
    pub row: RowId,
    /// Column
    pub key: ColumnKey,
}

/// The whole editable document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    tasks: IndexMap<TaskId, Task>,
    fields: HashMap<FieldId, FieldLocation>,
    rows: HashMap<RowId, TaskId>,
    active_task: TaskId,
    focus: Option<FieldId>,
}

impl Document {
    /// Build a document, activating the first task
    ///
    /// # Errors
    /// Any [`ModelError`] invariant violation.
    pub fn new(tasks: Vec<Task>) -> Result<Self, ModelError> {
        let first = tasks.first().map(|t| t.id().clone());
        let active = first.ok_or(ModelError::EmptyDocument)?;
        Self::with_active_task(tasks, active)
    }

    /// Build a document with an explicit active task
    ///
    /// # Errors
    /// Any [`ModelError`] invariant violation.
    pub fn with_active_task(tasks: Vec<Task>, active: TaskId) -> Result<Self, ModelError> {
        if tasks.is_empty() {
            return Err(ModelError::EmptyDocument);
        }

        let mut by_id = IndexMap::with_capacity(tasks.len());
        let mut fields = HashMap::new();
        let mut rows = HashMap::new();

        for task in tasks {
            if by_id.contains_key(task.id()) {
                return Err(ModelError::DuplicateTask(task.id().clone()));
            }
            for row in task.rows() {
                index_row(task.id(), row, &mut rows, &mut fields)?;
            }
            by_id.insert(task.id().clone(), task);
        }

        if !by_id.contains_key(&active) {
            return Err(ModelError::UnknownActiveTask(active));
        }

        Ok(Self {
            tasks: by_id,
            fields,
            rows,
            active_task: active,
            focus: None,
        })
    }

    /// Tasks in document order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Number of tasks
    #[inline]
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Task by ID
    #[inline]
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Active task ID
    #[inline]
    #[must_use]
    pub fn active_task_id(&self) -> &TaskId {
        &self.active_task
    }

    /// Active task
    #[must_use]
    pub fn active_task(&self) -> &Task {
        // Construction and `set_active_task` keep the ID valid.
        &self.tasks[&self.active_task]
    }

    /// Focused field ID
    #[inline]
    #[must_use]
    pub fn focus(&self) -> Option<&FieldId> {
        self.focus.as_ref()
    }

    /// Focused field
    #[must_use]
    pub fn focused_field(&self) -> Option<&Field> {
        self.focus.as_ref().and_then(|id| self.field(id))
    }

    /// Location of a field
    #[inline]
    #[must_use]
    pub fn locate(&self, id: &FieldId) -> Option<&FieldLocation> {
        self.fields.get(id)
    }

    /// Field by ID, anywhere in the document
    #[must_use]
    pub fn field(&self, id: &FieldId) -> Option<&Field> {
        let loc = self.fields.get(id)?;
        self.tasks.get(&loc.task)?.row(&loc.row)?.field(loc.key)
    }

    /// Task owning a row
    #[inline]
    #[must_use]
    pub fn task_of_row(&self, row: &RowId) -> Option<&TaskId> {
        self.rows.get(row)
    }

    /// Row by ID, anywhere in the document
    #[must_use]
    pub fn row(&self, id: &RowId) -> Option<&Row> {
        let task = self.rows.get(id)?;
        self.tasks.get(task)?.row(id)
    }

    /// All fields, task by task, row by row, in column order
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.tasks
            .values()
            .flat_map(|t| t.rows().iter())
            .flat_map(Row::fields)
    }

    pub(crate) fn set_active_task(&mut self, id: &TaskId) -> bool {
        match self.tasks.get_key_value(id) {
            Some((key, _)) => {
                self.active_task = key.clone();
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_focus(&mut self, id: &FieldId) -> bool {
        if self.fields.contains_key(id) {
            self.focus = Some(id.clone());
            true
        } else {
            false
        }
    }

    pub(crate) fn field_mut(&mut self, id: &FieldId) -> Option<&mut Field> {
        let loc = self.fields.get(id)?;
        self.tasks
            .get_mut(&loc.task)?
            .row_mut(&loc.row)?
            .field_mut(loc.key)
    }

    pub(crate) fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }
}

fn index_row(
    task: &TaskId,
    row: &Row,
    rows: &mut HashMap<RowId, TaskId>,
    fields: &mut HashMap<FieldId, FieldLocation>,
) -> Result<(), ModelError> {
    if rows.insert(row.id().clone(), task.clone()).is_some() {
        return Err(ModelError::DuplicateRow(row.id().clone()));
    }

    let missing = row.missing_columns();
    if !missing.is_empty() {
        return Err(ModelError::MissingColumns {
            row: row.id().clone(),
            columns: missing,
        });
    }

    for field in row.fields() {
        let location = FieldLocation {
            task: task.clone(),
            row: row.id().clone(),
            key: field.key(),
        };
        if fields.insert(field.id().clone(), location).is_some() {
            return Err(ModelError::DuplicateField(field.id().clone()));
        }

        let mut seen = HashSet::new();
        for dep in field.dependencies() {
            if !seen.insert(dep.id()) {
                return Err(ModelError::DuplicateDependency {
                    field: field.id().clone(),
                    dependency: dep.id().clone(),
                });
            }
        }
    }

    Ok(())
}
