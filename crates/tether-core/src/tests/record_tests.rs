use super::*;
use serde_json::json;

struct Point {
    x: i64,
    label: String,
}

fn read_x(point: &Point) -> Result<Value, serde_json::Error> {
    serde_json::to_value(point.x)
}

fn write_x(point: &mut Point, value: Value) -> Result<(), serde_json::Error> {
    point.x = serde_json::from_value(value)?;
    Ok(())
}

fn read_label(point: &Point) -> Result<Value, serde_json::Error> {
    serde_json::to_value(&point.label)
}

static POINT_DESCRIPTORS: [FieldDescriptor<Point>; 2] = [
    FieldDescriptor {
        name: "x",
        read: read_x,
        write: Some(write_x),
    },
    FieldDescriptor {
        name: "label",
        read: read_label,
        write: None,
    },
];

static POINT_FIELDS: FieldTable<Point> = FieldTable::new(&POINT_DESCRIPTORS);

impl Record for Point {
    fn field_names(&self) -> Vec<&str> {
        POINT_FIELDS.names()
    }

    fn read_field(&self, name: &str) -> Result<Value, FieldError> {
        POINT_FIELDS.read(self, name)
    }

    fn write_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
        POINT_FIELDS.write(self, name, value)
    }
}

fn point() -> Point {
    Point {
        x: 3,
        label: "origin".to_owned(),
    }
}

#[test]
fn table_reads_and_writes_through_descriptors() {
    let mut point = point();
    assert_eq!(point.field_names(), vec!["x", "label"]);
    assert_eq!(point.read_field("x").unwrap(), json!(3));

    point.write_field("x", json!(9)).unwrap();
    assert_eq!(point.x, 9);
}

#[test]
fn table_rejects_unknown_and_read_only_fields() {
    let mut point = point();
    assert!(matches!(
        point.read_field("y"),
        Err(FieldError::Unknown(name)) if name == "y"
    ));
    assert!(matches!(
        point.write_field("label", json!("moved")),
        Err(FieldError::ReadOnly(name)) if name == "label"
    ));
    assert_eq!(point.label, "origin");
}

#[test]
fn table_reports_values_of_the_wrong_shape() {
    let mut point = point();
    let err = point.write_field("x", json!("three")).unwrap_err();
    assert!(matches!(err, FieldError::Value { ref field, .. } if field == "x"));
    assert_eq!(point.x, 3);
}

#[test]
fn dotted_paths_drop_empty_segments() {
    let path = FieldPath::parse("props..nested.x.");
    assert_eq!(path, ["props", "nested", "x"]);
    assert_eq!(path.to_string(), "props.nested.x");
    assert_eq!(path.head(), Some("props"));
    assert!(FieldPath::parse("").is_empty());
}

#[test]
fn joined_path_keeps_segment_order() {
    let path = FieldPath::root("props").join(&FieldPath::from("nested.x"));
    assert_eq!(path.len(), 3);
    assert_eq!(path.segments(), &["props", "nested", "x"]);
}

#[test]
fn read_path_walks_objects_and_arrays() {
    let mut fields = Fields::new();
    fields.insert("nested".to_owned(), json!({ "x": 1, "items": [10, 20] }));

    assert_eq!(fields.read_path(&"nested.x".into()).unwrap(), json!(1));
    assert_eq!(fields.read_path(&"nested.items.1".into()).unwrap(), json!(20));
    assert_eq!(fields.read_path(&"nested.missing".into()).unwrap(), Value::Null);
    assert!(matches!(
        fields.read_path(&"absent.x".into()),
        Err(FieldError::Unknown(_))
    ));
}

#[test]
fn write_path_rewrites_the_head_field() {
    let mut fields = Fields::new();
    fields.insert("nested".to_owned(), json!({ "x": 1, "items": [10, 20] }));

    fields.write_path(&"nested.x".into(), json!(2)).unwrap();
    fields.write_path(&"nested.y".into(), json!(true)).unwrap();
    fields.write_path(&"nested.items.0".into(), json!(11)).unwrap();

    assert_eq!(
        fields["nested"],
        json!({ "x": 2, "y": true, "items": [11, 20] })
    );
}

#[test]
fn write_path_fails_without_a_parent() {
    let mut fields = Fields::new();
    fields.insert("nested".to_owned(), json!({ "items": [10] }));

    let missing_parent = FieldPath::parse("nested.deep.x");
    assert!(matches!(
        fields.write_path(&missing_parent, json!(1)),
        Err(FieldError::Path(path)) if path == missing_parent
    ));
    assert!(matches!(
        fields.write_path(&"nested.items.4".into(), json!(1)),
        Err(FieldError::Path(_))
    ));
    assert!(matches!(
        fields.write_path(&FieldPath::default(), json!(1)),
        Err(FieldError::Path(_))
    ));
    assert_eq!(fields["nested"], json!({ "items": [10] }));
}

#[test]
fn dynamic_fields_accept_new_keys() {
    let mut fields = Fields::new();
    assert!(!fields.has_field("a"));
    fields.write_field("a", json!(1)).unwrap();
    assert!(fields.has_field("a"));
    assert_eq!(fields.field_names(), vec!["a"]);
}
