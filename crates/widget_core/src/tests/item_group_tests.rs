use std::sync::Arc;

use serde_json::json;

use super::*;

fn list(entries: &[(&str, bool)]) -> ToggleList {
    entries
        .iter()
        .map(|(name, checked)| ToggleRecord::new(*name, *checked))
        .collect()
}

fn collect_changes(group: &ItemGroupWidget) -> (Arc<Mutex<Vec<ItemGroupChanged>>>, Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription =
        group.on_change(move |change| sink.lock().expect("seen").push(change.clone()));
    (seen, subscription)
}

#[test]
fn assigned_value_round_trips_and_renders_one_row_per_record() {
    let group = ItemGroupWidget::new();
    group
        .set_value(&json!([{"a": false}, {"b": true}, {"c": false}]))
        .expect("valid");

    assert_eq!(group.value(), list(&[("a", false), ("b", true), ("c", false)]));
    assert_eq!(group.row_count(), 3);
}

#[test]
fn rows_pair_indexed_controls_with_labels() {
    let group = ItemGroupWidget::from_attribute(r#"[{"a": false}, {"b": true}]"#);
    let tree = group.render();

    assert_eq!(tree.kind, NodeKind::Fieldset);
    let b = tree.find_by_id("b_1").expect("control b");
    assert_eq!(b.name.as_deref(), Some("b"));
    assert!(b.checked);
    assert_eq!(
        tree.find_label_for("b_1").and_then(|label| label.text.as_deref()),
        Some("b")
    );
}

#[test]
fn duplicate_names_get_distinct_ids_but_share_control_name() {
    let group = ItemGroupWidget::from_attribute(r#"[{"a": true}, {"a": false}]"#);
    let tree = group.render();

    let first = tree.find_by_id("a_0").expect("first");
    let second = tree.find_by_id("a_1").expect("second");
    assert_eq!(first.name, second.name);
    assert_eq!(group.row_count(), 2);
}

#[test]
fn rejected_values_keep_previous_state() {
    let group = ItemGroupWidget::from_attribute(r#"[{"a": true}]"#);
    let before = group.render();

    let not_sequence = group.set_value(&json!({"a": true})).expect_err("not a sequence");
    assert!(matches!(not_sequence, ValidationError::NotASequence { .. }));
    group
        .set_value(&json!([{"b": true}, 3]))
        .expect_err("non-object element");
    group
        .set_value(&json!([{"b": true, "c": "x"}]))
        .expect_err("non-boolean entry");

    assert_eq!(group.value(), list(&[("a", true)]));
    assert_eq!(group.render(), before);
}

#[test]
fn invalid_json_attribute_is_reported_and_skipped() {
    let group = ItemGroupWidget::from_attribute(r#"[{"a": true}]"#);
    let diagnostics = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&diagnostics);
    let _subscription = group.on_diagnostic(move |diagnostic| {
        sink.lock().expect("diagnostics").push(diagnostic.clone())
    });

    let err = group
        .set_attribute(VALUE_ATTRIBUTE, "[{\"a\": tru")
        .expect_err("invalid json");

    assert!(matches!(err, AttributeError::InvalidJson(_)));
    assert_eq!(group.value(), list(&[("a", true)]));
    let diagnostics = diagnostics.lock().expect("diagnostics");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, shared::error::ErrorKind::Encoding);
}

#[test]
fn attribute_with_invalid_shape_is_rejected() {
    let group = ItemGroupWidget::from_attribute(r#"[{"a": true}]"#);
    let err = group
        .set_attribute(VALUE_ATTRIBUTE, r#"{"a": true}"#)
        .expect_err("not a sequence");
    assert!(matches!(err, AttributeError::Invalid(_)));
    assert_eq!(group.row_count(), 1);
}

#[test]
fn removed_value_attribute_is_rejected_as_null() {
    let group = ItemGroupWidget::from_attribute(r#"[{"a": true}]"#);
    let err = group
        .attribute_changed(VALUE_ATTRIBUTE, None)
        .expect_err("null");
    assert!(matches!(
        err,
        AttributeError::Invalid(ValidationError::NotASequence { found: "null" })
    ));
    assert_eq!(group.row_count(), 1);
}

#[test]
fn unobserved_attributes_do_not_touch_value() {
    let group = ItemGroupWidget::from_attribute(r#"[{"a": true}]"#);
    group.set_attribute("title", "not json").expect("ignored");
    assert_eq!(group.attribute("title").as_deref(), Some("not json"));
    assert_eq!(group.value(), list(&[("a", true)]));
}

#[test]
fn toggling_a_row_emits_full_list_once() {
    let group = ItemGroupWidget::from_attribute(r#"[{"a": false}, {"b": true}]"#);
    let (seen, _subscription) = collect_changes(&group);

    group.click(0).expect("row a");

    assert_eq!(
        *seen.lock().expect("seen"),
        vec![ItemGroupChanged {
            value: list(&[("a", true), ("b", true)]),
        }]
    );
}

#[test]
fn emitted_value_reflects_rendered_state_not_stored_value() {
    let group = ItemGroupWidget::from_attribute(r#"[{"a": false}, {"b": false}]"#);
    let (seen, _subscription) = collect_changes(&group);

    group.interact(0, true).expect("row a");
    group.interact(1, true).expect("row b");

    let seen = seen.lock().expect("seen");
    assert_eq!(seen[1].value, list(&[("a", true), ("b", true)]));
    assert_eq!(group.value(), list(&[("a", false), ("b", false)]));
    assert_eq!(group.rendered_selection(), list(&[("a", true), ("b", true)]));
}

#[test]
fn reassigning_value_resets_drifted_rows() {
    let group = ItemGroupWidget::from_attribute(r#"[{"a": false}, {"b": true}]"#);
    let pristine = group.render();

    group.click(0).expect("row a");
    group.assign(group.value());

    assert_eq!(group.render(), pristine);
}

#[test]
fn out_of_range_row_is_an_error_without_event() {
    let group = ItemGroupWidget::from_attribute(r#"[{"a": false}]"#);
    let (seen, _subscription) = collect_changes(&group);
    let diagnostics = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&diagnostics);
    let _diagnostics = group.on_diagnostic(move |diagnostic| {
        sink.lock().expect("diagnostics").push(diagnostic.clone())
    });

    let err = group.click(4).expect_err("no such row");
    group.interact(7, true).expect_err("no such row");

    assert_eq!(err, InteractionError::NoSuchRow { row: 4, rows: 1 });
    assert!(seen.lock().expect("seen").is_empty());
    let diagnostics = diagnostics.lock().expect("diagnostics");
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics
        .iter()
        .all(|diagnostic| diagnostic.kind == shared::error::ErrorKind::Interaction));
    assert!(diagnostics[0].message.contains("no rendered row 4"));
}

#[test]
fn interacting_with_unchanged_state_emits_nothing() {
    let group = ItemGroupWidget::from_attribute(r#"[{"a": false}, {"b": true}]"#);
    let (seen, _subscription) = collect_changes(&group);

    assert!(!group.interact(0, false).expect("row a"));
    assert!(!group.interact(1, true).expect("row b"));
    assert!(group.interact(1, false).expect("row b"));

    let seen = seen.lock().expect("seen");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].value, list(&[("a", false), ("b", false)]));
}

#[test]
fn value_attribute_mirrors_held_value() {
    let group = ItemGroupWidget::new();
    group.assign(list(&[("Common", true)]));
    assert_eq!(group.value_attribute(), r#"[{"Common":true}]"#);
}

#[tokio::test]
async fn broadcast_subscribers_receive_group_changes() {
    let group = ItemGroupWidget::from_attribute(r#"[{"a": false}]"#);
    let mut events = group.subscribe_events();

    group.click(0).expect("row a");

    let event = events.recv().await.expect("event");
    assert_eq!(event.value, list(&[("a", true)]));
}
