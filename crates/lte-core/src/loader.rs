//! JSON document loader
//!
//! Wire format:
//!
//! ```json
//! {
//!   "activeTaskId": "task-1",
//!   "tasks": [
//!     { "id": "task-1", "name": "...", "rows": [
//!       { "id": "row-1", "fields": {
//!         "content": { "id": "r1-content", "key": "content", "value": "...",
//!                      "dependencies": [ { "id": "...", "source": "...",
//!                        "type": "copy", "content": "...", "affected": false } ] },
//!         ...
//!       } }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Saving writes the same shape, so dependency flags survive a round trip.

use crate::document::Document;
use crate::error::{LoadError, ModelError};
use crate::model::{ColumnKey, Field, Row, RowId, Task, TaskId};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRecord {
    #[serde(default)]
    active_task_id: Option<TaskId>,
    tasks: Vec<TaskRecord>,
}

#[derive(Debug, Deserialize)]
struct TaskRecord {
    id: TaskId,
    name: String,
    #[serde(default)]
    rows: Vec<RowRecord>,
}

#[derive(Debug, Deserialize)]
struct RowRecord {
    id: RowId,
    #[serde(deserialize_with = "column_entries")]
    fields: Vec<(ColumnKey, Field)>,
}

/// Keep every `fields` entry in order; a map would let a repeated key win
fn column_entries<'de, D>(deserializer: D) -> Result<Vec<(ColumnKey, Field)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ColumnEntriesVisitor;

    impl<'de> serde::de::Visitor<'de> for ColumnEntriesVisitor {
        type Value = Vec<(ColumnKey, Field)>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a map from column key to field")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(ColumnKey::ALL.len()));
            while let Some(entry) = map.next_entry::<ColumnKey, Field>()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(ColumnEntriesVisitor)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentOut<'a> {
    active_task_id: &'a TaskId,
    tasks: Vec<&'a Task>,
}

impl RowRecord {
    fn into_row(self) -> Result<Row, ModelError> {
        let mut columns = BTreeMap::new();
        for (stored, field) in self.fields {
            if field.key() != stored {
                return Err(ModelError::KeyMismatch {
                    field: field.id().clone(),
                    declared: field.key(),
                    stored,
                });
            }
            if columns.insert(stored, field).is_some() {
                return Err(ModelError::DuplicateColumn {
                    row: self.id,
                    key: stored,
                });
            }
        }
        Ok(Row::new(self.id, columns.into_values()))
    }
}

impl DocumentRecord {
    fn into_document(self) -> Result<Document, ModelError> {
        let tasks = self
            .tasks
            .into_iter()
            .map(|t| {
                let rows = t
                    .rows
                    .into_iter()
                    .map(RowRecord::into_row)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Task::new(t.id, t.name, rows))
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        match self.active_task_id {
            Some(active) => Document::with_active_task(tasks, active),
            None => Document::new(tasks),
        }
    }
}

/// Parse and validate a document from JSON text
///
/// # Errors
/// [`LoadError::Format`] for malformed JSON, [`LoadError::Invalid`] for
/// invariant violations.
pub fn from_json_str(json: &str) -> Result<Document, LoadError> {
    let record: DocumentRecord = serde_json::from_str(json)?;
    let document = record.into_document()?;
    tracing::debug!(
        tasks = document.task_count(),
        active = %document.active_task_id(),
        "document loaded"
    );
    Ok(document)
}

/// Parse and validate a document from a reader
///
/// # Errors
/// Same as [`from_json_str`].
pub fn from_reader(reader: impl Read) -> Result<Document, LoadError> {
    let record: DocumentRecord = serde_json::from_reader(reader)?;
    Ok(record.into_document()?)
}

/// Load a document file
///
/// # Errors
/// [`LoadError::Io`] if the file cannot be read, otherwise as
/// [`from_json_str`].
pub fn load(path: impl AsRef<Path>) -> Result<Document, LoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_json_str(&text)
}

/// Serialize a document to pretty JSON
///
/// # Errors
/// [`LoadError::Format`] if serialization fails.
pub fn to_json_string(document: &Document) -> Result<String, LoadError> {
    let out = DocumentOut {
        active_task_id: document.active_task_id(),
        tasks: document.tasks().collect(),
    };
    Ok(serde_json::to_string_pretty(&out)?)
}

/// Write a document file
///
/// # Errors
/// [`LoadError::Io`] if the file cannot be written.
pub fn save(document: &Document, path: impl AsRef<Path>) -> Result<(), LoadError> {
    let path = path.as_ref();
    let json = to_json_string(document)?;
    std::fs::write(path, json).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldId;

    fn row_json(row: &str, override_key: Option<(&str, &str)>) -> String {
        let fields: Vec<String> = ColumnKey::ALL
            .iter()
            .map(|k| {
                let (stored, declared) = match override_key {
                    Some((s, d)) if s == k.as_str() => (s.to_string(), d.to_string()),
                    _ => (k.to_string(), k.to_string()),
                };
                format!(
                    r#""{stored}": {{"id": "{row}-{k}", "key": "{declared}", "value": "v", "dependencies": []}}"#
                )
            })
            .collect();
        format!(r#"{{"id": "{row}", "fields": {{{}}}}}"#, fields.join(","))
    }

    #[test]
    fn loads_minimal_document() {
        let json = format!(
            r#"{{"tasks": [{{"id": "t1", "name": "Task", "rows": [{}]}}]}}"#,
            row_json("r1", None)
        );
        let doc = from_json_str(&json).unwrap();
        assert_eq!(doc.active_task_id().as_str(), "t1");
        assert!(doc.field(&FieldId::new("r1-outcome")).is_some());
    }

    #[test]
    fn rejects_key_mismatch() {
        let json = format!(
            r#"{{"tasks": [{{"id": "t1", "name": "Task", "rows": [{}]}}]}}"#,
            row_json("r1", Some(("hours", "step")))
        );
        let err = from_json_str(&json).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid(ModelError::KeyMismatch {
                declared: ColumnKey::Step,
                stored: ColumnKey::Hours,
                ..
            })
        ));
    }

    #[test]
    fn rejects_repeated_column() {
        let row = row_json("r1", None);
        let row = row.replacen(
            r#""fields": {"#,
            r#""fields": {"content": {"id": "r1-content-dup", "key": "content", "value": "dup", "dependencies": []},"#,
            1,
        );
        let json = format!(r#"{{"tasks": [{{"id": "t1", "name": "Task", "rows": [{row}]}}]}}"#);
        let err = from_json_str(&json).unwrap_err();
        assert!(
            matches!(
                &err,
                LoadError::Invalid(ModelError::DuplicateColumn { row, key: ColumnKey::Content })
                    if row.as_str() == "r1"
            ),
            "got {err:?}"
        );
    }

    #[test]
    fn rejects_unknown_column() {
        let json = r#"{"tasks": [{"id": "t1", "name": "T", "rows": [
            {"id": "r1", "fields": {"activities": {"id": "x", "key": "activities", "value": ""}}}
        ]}]}"#;
        assert!(matches!(from_json_str(json), Err(LoadError::Format(_))));
    }

    #[test]
    fn save_and_reload_preserves_structure() {
        let json = format!(
            r#"{{"activeTaskId": "t2", "tasks": [
                {{"id": "t1", "name": "One", "rows": [{}]}},
                {{"id": "t2", "name": "Two", "rows": [{}]}}
            ]}}"#,
            row_json("r1", None),
            row_json("r2", None)
        );
        let doc = from_json_str(&json).unwrap();
        let reloaded = from_json_str(&to_json_string(&doc).unwrap()).unwrap();
        assert_eq!(reloaded, doc);
        assert_eq!(reloaded.active_task_id().as_str(), "t2");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
