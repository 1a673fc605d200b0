use lte_core::{
    Document, Editor, EditorConfig, EditorError, FieldId, GenerationOutcome, Phase, ProviderError, RowId, Session,
    TaskId,
};
use lte_test_utils::{
    sample_document, scenario_document, ScriptedProvider, SlowProvider, StaticProvider,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn field_ids(doc: &Document) -> Vec<FieldId> {
    doc.fields().map(|f| f.id().clone()).collect()
}

fn row_ids(doc: &Document) -> Vec<RowId> {
    doc.tasks()
        .flat_map(|t| t.rows())
        .map(|r| r.id().clone())
        .collect()
}

fn run_row(editor: &mut Editor, row: &RowId, reply: Result<String, ProviderError>) -> GenerationOutcome {
    editor.request_row_regeneration(row).unwrap();
    let pending = editor.begin_regeneration("x").unwrap();
    editor.complete_regeneration(pending.id, reply).unwrap()
}

#[tokio::test]
async fn scenario_draft_to_revised() {
    let provider = Arc::new(StaticProvider::new("revised text"));
    let session = Session::new(Editor::new(scenario_document()), provider);
    let focus = FieldId::new("r1-content");

    session.select_field(&focus).unwrap();
    session.request_row_regeneration(&RowId::new("r1")).unwrap();
    let outcome = session.confirm_regeneration("make it safer").await.unwrap();
    assert!(outcome.is_applied());

    let doc = session.snapshot();
    let field = doc.field(&focus).unwrap();
    assert_eq!(field.value(), "revised text");
    assert_eq!(field.affected_count(), 2);

    session.resolve_cascade().unwrap();
    let doc = session.snapshot();
    assert_eq!(doc.field(&focus).unwrap().affected_count(), 0);
    assert!(session.read(|e| e.cascade_alert().is_none()));
}

#[tokio::test]
async fn provider_sees_captured_target() {
    let provider = Arc::new(ScriptedProvider::new([
        Err(ProviderError::Status {
            status: 503,
            message: "busy".into(),
        }),
        Ok("second try".into()),
    ]));
    let session = Session::new(Editor::new(sample_document()), provider.clone());

    session.request_row_regeneration(&RowId::new("row-2")).unwrap();
    let first = session.confirm_regeneration("tighten").await.unwrap();
    assert!(!first.is_applied());
    assert_eq!(session.phase(), Phase::Failed);

    let second = session.confirm_regeneration("tighten more").await.unwrap();
    assert!(second.is_applied());
    assert_eq!(provider.remaining(), 0);

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.target_row_id == Some(RowId::new("row-2"))));
    assert_eq!(requests[1].instruction, "tighten more");
    assert_eq!(
        session.snapshot().field(&FieldId::new("r2-content")).unwrap().value(),
        "second try"
    );
}

#[tokio::test]
async fn page_regeneration_through_session() {
    let session = Session::new(sample_editor_with_focus("r21-out"), Arc::new(StaticProvider::new("plan")));
    session.request_page_regeneration(&TaskId::new("task-1")).unwrap();
    let outcome = session.confirm_regeneration("replan").await.unwrap();

    let GenerationOutcome::Applied { written, .. } = outcome else {
        panic!("expected applied outcome");
    };
    assert_eq!(written.len(), 3);
    let doc = session.snapshot();
    assert_eq!(doc.field(&FieldId::new("r3-content")).unwrap().value(), "plan");
    assert_ne!(doc.field(&FieldId::new("r21-content")).unwrap().value(), "plan");
    assert_eq!(doc.field(&FieldId::new("r21-out")).unwrap().affected_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_provider_within_budget_then_past_it() {
    let config = EditorConfig::new().with_timeout(Duration::from_secs(5));
    let provider = Arc::new(SlowProvider::new(Duration::from_secs(3), "slow but fine"));
    let session = Session::new(Editor::with_config(scenario_document(), config), provider);
    session.request_row_regeneration(&RowId::new("r1")).unwrap();
    assert!(session.confirm_regeneration("x").await.unwrap().is_applied());

    let config = EditorConfig::new().with_timeout(Duration::from_secs(2));
    let provider = Arc::new(SlowProvider::new(Duration::from_secs(3), "too late"));
    let session = Session::new(Editor::with_config(scenario_document(), config), provider);
    session.request_row_regeneration(&RowId::new("r1")).unwrap();
    let outcome = session.confirm_regeneration("x").await.unwrap();
    assert!(matches!(
        outcome,
        GenerationOutcome::Failed {
            error: ProviderError::Timeout { .. },
            ..
        }
    ));
    assert_eq!(
        session.snapshot().field(&FieldId::new("r1-content")).unwrap().value(),
        "draft text"
    );
}

fn sample_editor_with_focus(field: &str) -> Editor {
    let mut editor = Editor::new(sample_document());
    editor.select_field(&FieldId::new(field)).unwrap();
    editor
}

#[test]
fn second_start_is_refused_without_state_change() {
    let mut editor = Editor::new(sample_document());
    editor.request_row_regeneration(&RowId::new("row-1")).unwrap();
    let pending = editor.begin_regeneration("x").unwrap();

    for row in row_ids(editor.document()) {
        assert_eq!(
            editor.request_row_regeneration(&row),
            Err(EditorError::RequestPending(Phase::Requesting))
        );
    }
    assert_eq!(editor.orchestrator().in_flight(), Some(pending.id));
    assert_eq!(editor.orchestrator().scope(), Some(&pending.scope));
}

proptest! {
    #[test]
    fn row_regeneration_touches_only_target_and_focus(row_idx in 0usize..4, focus_idx in 0usize..28) {
        let doc = sample_document();
        let rows = row_ids(&doc);
        let fields = field_ids(&doc);
        let row = &rows[row_idx];
        let focus = &fields[focus_idx];
        let target = doc.row(row).unwrap().field(lte_core::ColumnKey::PRIMARY).unwrap().id().clone();

        let mut editor = Editor::new(doc.clone());
        editor.select_field(focus).unwrap();
        run_row(&mut editor, row, Ok("fresh".into()));

        let after = editor.document();
        for id in &fields {
            let (old, new) = (doc.field(id).unwrap(), after.field(id).unwrap());
            if id == &target {
                prop_assert_eq!(new.value(), "fresh");
            } else {
                prop_assert_eq!(new.value(), old.value());
            }
            if id == focus {
                prop_assert!(new.dependencies().iter().all(|d| d.is_affected()));
            } else {
                prop_assert_eq!(new.dependencies(), old.dependencies());
            }
        }
        prop_assert_eq!(editor.cascade_alert().map(|a| &a.field), Some(focus));
    }

    #[test]
    fn resolve_clears_exactly_the_focus(first in 0usize..28, second in 0usize..28) {
        let doc = sample_document();
        let fields = field_ids(&doc);
        let mut editor = Editor::new(doc);
        let row = RowId::new("row-1");

        editor.select_field(&fields[first]).unwrap();
        run_row(&mut editor, &row, Ok("a".into()));
        editor.select_field(&fields[second]).unwrap();
        run_row(&mut editor, &row, Ok("b".into()));
        let before = editor.document().clone();

        editor.resolve_cascade().unwrap();
        for id in &fields {
            let field = editor.document().field(id).unwrap();
            if id == &fields[second] {
                prop_assert_eq!(field.affected_count(), 0);
            } else {
                prop_assert_eq!(field.dependencies(), before.field(id).unwrap().dependencies());
            }
        }
    }

    #[test]
    fn focus_switch_drops_alert_but_keeps_flags(marked in 0usize..28, next in 0usize..28) {
        let doc = sample_document();
        let fields = field_ids(&doc);
        let mut editor = Editor::new(doc);

        editor.select_field(&fields[marked]).unwrap();
        run_row(&mut editor, &RowId::new("row-3"), Ok("c".into()));
        prop_assert!(editor.cascade_alert().is_some());

        editor.select_field(&fields[next]).unwrap();
        prop_assert!(editor.cascade_alert().is_none());
        prop_assert_eq!(editor.affected_count(&fields[marked]), Some(2));
    }

    #[test]
    fn failure_leaves_document_unchanged(row_idx in 0usize..4, focus_idx in 0usize..28, status in 400u16..600) {
        let doc = sample_document();
        let rows = row_ids(&doc);
        let fields = field_ids(&doc);
        let mut editor = Editor::new(doc);
        editor.select_field(&fields[focus_idx]).unwrap();
        let before = editor.document().clone();

        let outcome = run_row(
            &mut editor,
            &rows[row_idx],
            Err(ProviderError::Status { status, message: "no".into() }),
        );
        prop_assert!(!outcome.is_applied());
        prop_assert_eq!(editor.document(), &before);
        prop_assert_eq!(editor.phase(), Phase::Failed);
        prop_assert!(editor.cascade_alert().is_none());
    }
}
