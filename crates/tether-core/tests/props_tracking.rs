use std::cell::RefCell;

use serde_json::json;
use tether_core::{
    render_once, ChangeRecord, Component, ComponentHandle, Error, FieldError, Fields, HookResult,
    Instance, Result, Tracked,
};
use tether_macros::Record;
use tether_testing::{fields, TestHost};

thread_local! {
    static SEEN: RefCell<Vec<(&'static str, ChangeRecord)>> = const { RefCell::new(Vec::new()) };
}

fn seen() -> Vec<(&'static str, ChangeRecord)> {
    SEEN.with(|seen| seen.borrow_mut().drain(..).collect())
}

#[derive(Record)]
struct Panel {
    #[record(readonly)]
    kind: String,
    #[record(skip)]
    cache: Option<String>,
}

impl Component for Panel {
    type Props = Fields;
    type Output = String;

    fn create(_props: &Fields) -> Self {
        Panel {
            kind: "panel".to_owned(),
            cache: None,
        }
    }

    fn on_changes(_this: &mut Instance<Self>, change: &ChangeRecord) -> HookResult {
        SEEN.with(|seen| seen.borrow_mut().push(("changes", change.clone())));
        Ok(())
    }

    fn on_props_change(this: &mut Instance<Self>, change: &ChangeRecord) -> HookResult {
        this.cache = None;
        SEEN.with(|seen| seen.borrow_mut().push(("props", change.clone())));
        Ok(())
    }

    fn render(this: &mut Tracked<Instance<Self>>) -> Result<String> {
        let label = this.cache.clone().unwrap_or_else(|| this.kind.clone());
        Ok(format!("{label} {}", json!(this.props())))
    }
}

fn mounted(props: Fields) -> ComponentHandle<Panel> {
    seen();
    let mut host = TestHost::<Fields, String>::new();
    host.render::<Panel>(props).unwrap();
    host.slot().handle::<Panel>().unwrap()
}

#[test]
fn nested_member_write_reports_the_full_path_once() {
    let handle = mounted(fields(json!({ "a": 1, "nested": { "x": 1 } })));

    handle.with_mut(|tracked| {
        tracked
            .nested("props")
            .unwrap()
            .set_path("nested.x", 2)
            .unwrap();
    });

    let seen = seen();
    assert_eq!(seen.len(), 1);
    let (hook, change) = &seen[0];
    assert_eq!(*hook, "props");
    assert_eq!(change.path(), &["props", "nested", "x"]);
    assert_eq!(change.previous(), &json!(1));
    assert_eq!(change.value(), &json!(2));
}

#[test]
fn replacing_props_reports_once_and_detaches_the_old_value() {
    let handle = mounted(fields(json!({ "a": 1 })));

    let mut old = handle.with_mut(|tracked| tracked.replace("props", json!({ "a": 2 })).unwrap());
    let replaced = seen();
    assert_eq!(replaced.len(), 1);
    assert_eq!(replaced[0].0, "changes");
    assert_eq!(replaced[0].1.field(), "props");

    old["a"] = json!(99);
    assert!(seen().is_empty());

    handle.with_mut(|tracked| tracked.nested("props").unwrap().set("a", 3).unwrap());
    let member = seen();
    assert_eq!(member.len(), 1);
    assert_eq!(member[0].0, "props");
    assert_eq!(member[0].1.previous(), &json!(2));

    handle.with(|tracked| {
        assert_eq!(tracked.props(), &fields(json!({ "a": 3 })));
        assert_eq!(tracked.original_props(), &fields(json!({ "a": 1 })));
    });
}

#[test]
fn original_props_and_read_only_fields_reject_writes() {
    let handle = mounted(fields(json!({ "a": 1 })));

    handle.with_mut(|tracked| {
        assert!(matches!(
            tracked.set("original_props", json!({})),
            Err(Error::Field(FieldError::ReadOnly(_)))
        ));
        assert!(matches!(
            tracked.set("kind", "other"),
            Err(Error::Field(FieldError::ReadOnly(_)))
        ));
        assert!(matches!(
            tracked.set("cache", "warm"),
            Err(Error::Field(FieldError::Unknown(_)))
        ));
    });
    assert!(seen().is_empty());
}

#[test]
fn host_props_with_new_keys_replace_the_whole_bag() {
    seen();
    let mut host = TestHost::<Fields, String>::new();
    host.render::<Panel>(fields(json!({ "a": 1 }))).unwrap();
    seen();

    let output = host
        .render::<Panel>(fields(json!({ "a": 1, "b": 2 })))
        .unwrap();

    assert_eq!(output, r#"panel {"a":1,"b":2}"#);
    let seen = seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "changes");
}

#[test]
fn host_children_follow_the_props_bag() {
    seen();
    let mut host = TestHost::<Fields, String>::new();
    host.render::<Panel>(fields(json!({ "children": ["a"] })))
        .unwrap();
    let handle = host.slot().handle::<Panel>().unwrap();
    seen();

    host.render::<Panel>(fields(json!({ "children": ["a", "b"] })))
        .unwrap();

    handle.with(|tracked| assert_eq!(tracked.children(), Some(&json!(["a", "b"]))));
    let paths: Vec<String> = seen()
        .iter()
        .map(|(hook, change)| format!("{hook}:{}", change.path()))
        .collect();
    assert_eq!(paths, vec!["props:props.children", "changes:children"]);
}

#[test]
fn static_render_matches_the_first_mounted_render() {
    let props = fields(json!({ "title": "t" }));
    let mut host = TestHost::<Fields, String>::new();

    assert_eq!(
        render_once::<Panel>(props.clone()).unwrap(),
        host.render::<Panel>(props).unwrap()
    );
}

#[test]
fn member_writes_can_add_new_keys_to_a_props_bag() {
    let handle = mounted(fields(json!({ "a": 1 })));

    handle.with_mut(|tracked| tracked.nested("props").unwrap().set("b", 2).unwrap());

    let seen = seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "props");
    assert_eq!(seen[0].1.path(), &["props", "b"]);
    assert_eq!(seen[0].1.previous(), &json!(null));
    assert_eq!(seen[0].1.value(), &json!(2));
    handle.with(|tracked| assert_eq!(tracked.props(), &fields(json!({ "a": 1, "b": 2 }))));
}

#[derive(Record)]
struct Strict {}

impl Component for Strict {
    type Props = Fields;
    type Output = ();

    fn create(_props: &Fields) -> Self {
        Strict {}
    }

    fn on_props_change(_this: &mut Instance<Self>, change: &ChangeRecord) -> HookResult {
        SEEN.with(|seen| seen.borrow_mut().push(("props", change.clone())));
        Err(format!("refused {}", change.path()).into())
    }

    fn render(_this: &mut Tracked<Instance<Self>>) -> Result<()> {
        Ok(())
    }
}

#[test]
fn failing_props_hook_still_applies_every_incoming_member() {
    seen();
    let mut host = TestHost::<Fields, ()>::new();
    host.render::<Strict>(fields(json!({ "a": 1, "b": 1 })))
        .unwrap();
    let handle = host.slot().handle::<Strict>().unwrap();

    let err = host
        .render::<Strict>(fields(json!({ "a": 2, "b": 2 })))
        .unwrap_err();

    assert_eq!(err.to_string(), "refused props.a");
    assert_eq!(seen().len(), 2);
    handle.with(|tracked| assert_eq!(tracked.props(), &fields(json!({ "a": 2, "b": 2 }))));
}
