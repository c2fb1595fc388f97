use super::*;
use crate::intercept::{FieldConfig, InterceptionConfig, Tracked};
use crate::{Error, Fields, HookResult};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

type Changes = Rc<RefCell<Vec<(String, ChangeRecord)>>>;

fn record(
    changes: &Changes,
    tag: &'static str,
) -> impl FnMut(&mut Fields, &ChangeRecord) -> HookResult {
    let changes = Rc::clone(changes);
    move |_: &mut Fields, change: &ChangeRecord| {
        changes.borrow_mut().push((tag.to_owned(), change.clone()));
        Ok(())
    }
}

fn tracked_props(changes: &Changes) -> Tracked<Fields> {
    let mut root = Fields::new();
    root.insert("props".to_owned(), json!({ "a": 1, "nested": { "x": 1 } }));
    root.insert("title".to_owned(), json!("card"));
    let config = InterceptionConfig::new()
        .on_change(record(changes, "global"))
        .field("props", FieldConfig::new().members(record(changes, "members")));
    match Tracked::new(root, config) {
        Ok(tracked) => tracked,
        Err(err) => panic!("failed to wrap props: {err}"),
    }
}

#[test]
fn member_write_reports_full_path_to_member_hook_only() {
    let changes = Changes::default();
    let mut tracked = tracked_props(&changes);

    tracked
        .nested("props")
        .unwrap()
        .set_path(["nested", "x"], 2)
        .unwrap();

    let changes = changes.borrow();
    assert_eq!(changes.len(), 1);
    let (tag, change) = &changes[0];
    assert_eq!(tag, "members");
    assert_eq!(change.path(), &FieldPath::from(["props", "nested", "x"]));
    assert_eq!(change.previous(), &json!(1));
    assert_eq!(change.value(), &json!(2));
    assert_eq!(tracked["props"], json!({ "a": 1, "nested": { "x": 2 } }));
}

#[test]
fn replaced_props_are_tracked_and_the_old_value_is_detached() {
    let changes = Changes::default();
    let mut tracked = tracked_props(&changes);

    let mut old = tracked.replace("props", json!({ "a": 5 })).unwrap();
    tracked.nested("props").unwrap().set("a", 6).unwrap();
    old["a"] = json!(100);

    let tags: Vec<String> = changes
        .borrow()
        .iter()
        .map(|(tag, change)| format!("{tag}:{}", change.path()))
        .collect();
    assert_eq!(tags, vec!["global:props", "members:props.a"]);
    assert_eq!(tracked["props"], json!({ "a": 6 }));
}

#[test]
fn view_epoch_follows_replacements() {
    let changes = Changes::default();
    let mut tracked = tracked_props(&changes);
    assert_eq!(tracked.nested("props").unwrap().epoch(), 0);

    tracked.set("props", json!({})).unwrap();
    tracked.set("props", json!({ "b": 1 })).unwrap();

    let view = tracked.nested("props").unwrap();
    assert_eq!(view.field(), "props");
    assert_eq!(view.epoch(), 2);
}

#[test]
fn values_read_from_a_view_are_plain_copies() {
    let changes = Changes::default();
    let mut tracked = tracked_props(&changes);

    let mut nested = tracked.nested("props").unwrap().get("nested").unwrap();
    nested["x"] = json!(42);

    assert!(changes.borrow().is_empty());
    assert_eq!(
        tracked.nested("props").unwrap().get_path("nested.x").unwrap(),
        json!(1)
    );
}

#[test]
fn replace_path_returns_the_displaced_leaf() {
    let changes = Changes::default();
    let mut tracked = tracked_props(&changes);
    let mut props = tracked.nested("props").unwrap();

    assert_eq!(props.replace_path("a", 2).unwrap(), json!(1));
    assert_eq!(props.replace_path("fresh", true).unwrap(), Value::Null);
    assert_eq!(
        props.snapshot().unwrap(),
        json!({ "a": 2, "fresh": true, "nested": { "x": 1 } })
    );
}

#[test]
fn writes_outside_the_sub_object_are_rejected() {
    let changes = Changes::default();
    let mut tracked = tracked_props(&changes);
    let mut props = tracked.nested("props").unwrap();

    assert!(matches!(
        props.set_path("", 1),
        Err(Error::Field(FieldError::Path(_)))
    ));
    assert!(matches!(
        props.set_path("missing.deep", 1),
        Err(Error::Field(FieldError::Path(_)))
    ));
    assert!(changes.borrow().is_empty());
}

#[test]
fn title_writes_reach_the_global_hook_not_the_member_hook() {
    let changes = Changes::default();
    let mut tracked = tracked_props(&changes);

    tracked.set("title", "list").unwrap();

    let changes = changes.borrow();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].0, "global");
    assert_eq!(changes[0].1.field(), "title");
}
