use lte_core::{loader, ColumnKey, DependencyKind, Editor, FieldId, LoadError, ModelError, RowId, TaskId};
use lte_test_utils::sample_document;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/sample-plan.json")
}

#[test]
fn bundled_plan_matches_fixture() {
    let doc = loader::load(sample_path()).unwrap();
    assert_eq!(doc, sample_document());
    assert_eq!(doc.active_task_id(), &TaskId::new("task-1"));
    assert_eq!(doc.task_count(), 2);
}

#[test]
fn bundled_plan_triage_order() {
    let mut editor = Editor::new(loader::load(sample_path()).unwrap());
    editor.select_field(&FieldId::new("r2-content")).unwrap();
    editor.request_row_regeneration(&RowId::new("row-1")).unwrap();
    let pending = editor.begin_regeneration("x").unwrap();
    editor.complete_regeneration(pending.id, Ok("y".into())).unwrap();

    let view = editor.active_field().unwrap();
    assert_eq!(view.key, ColumnKey::Content);
    let kinds: Vec<_> = view.review.iter().map(|d| d.kind()).collect();
    assert_eq!(kinds, vec![DependencyKind::Logic, DependencyKind::Expand]);
}

#[test]
fn flags_survive_save_and_reload() {
    let mut editor = Editor::new(sample_document());
    editor.select_field(&FieldId::new("r21-out")).unwrap();
    editor.request_row_regeneration(&RowId::new("row-2-1")).unwrap();
    let pending = editor.begin_regeneration("x").unwrap();
    editor.complete_regeneration(pending.id, Ok("saved".into())).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.json");
    loader::save(editor.document(), &path).unwrap();

    let reloaded = loader::load(&path).unwrap();
    assert_eq!(reloaded.field(&FieldId::new("r21-content")).unwrap().value(), "saved");
    assert_eq!(reloaded.field(&FieldId::new("r21-out")).unwrap().affected_count(), 2);
}

#[test]
fn row_missing_a_column_is_rejected() {
    let json = r#"{
        "tasks": [{ "id": "t", "name": "T", "rows": [{ "id": "r", "fields": {
            "content": { "id": "f", "key": "content", "value": "v" }
        } }] }]
    }"#;
    let err = loader::from_json_str(json).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid(ModelError::MissingColumns { ref row, .. }) if row == &RowId::new("r")
    ));
}

#[test]
fn empty_document_is_rejected() {
    let err = loader::from_json_str(r#"{ "tasks": [] }"#).unwrap_err();
    assert!(matches!(err, LoadError::Invalid(ModelError::EmptyDocument)));
}
