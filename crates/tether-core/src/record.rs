//! Field-level access to records through an explicit descriptor table.
//!
//! A [`Record`] exposes its fields by name as [`serde_json::Value`]s. Plain
//! structs get a [`FieldTable`] generated by `#[derive(Record)]`; dynamic
//! property bags use [`Fields`] directly. Paths address values below a field
//! (`nested.x`), walking objects by key and arrays by index.

use std::fmt;

use serde_json::{Map, Value};

/// Dynamic record: an ordered bag of named values.
pub type Fields = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("field `{0}` does not exist")]
    Unknown(String),
    #[error("field `{0}` is read-only")]
    ReadOnly(String),
    #[error("field `{0}` has no member tracker")]
    Untracked(String),
    #[error("path `{0}` does not resolve to a writable location")]
    Path(FieldPath),
    #[error("field `{field}` rejected value: {source}")]
    Value {
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FieldError {
    pub(crate) fn value(field: &str, source: serde_json::Error) -> Self {
        FieldError::Value {
            field: field.to_owned(),
            source,
        }
    }
}

/// Ordered field names from a root record down to a changed leaf.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn root(field: &str) -> Self {
        Self(vec![field.to_owned()])
    }

    /// Parses dotted notation. Empty segments are dropped, so `""` is the
    /// empty path.
    pub fn parse(dotted: &str) -> Self {
        Self::new(dotted.split('.').filter(|segment| !segment.is_empty()))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn head(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn split_first(&self) -> Option<(&str, &[String])> {
        self.0
            .split_first()
            .map(|(head, rest)| (head.as_str(), rest))
    }

    pub fn join(&self, tail: &FieldPath) -> FieldPath {
        let mut segments = self.0.clone();
        segments.extend(tail.0.iter().cloned());
        FieldPath(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(dotted: &str) -> Self {
        FieldPath::parse(dotted)
    }
}

impl From<Vec<String>> for FieldPath {
    fn from(segments: Vec<String>) -> Self {
        FieldPath(segments)
    }
}

impl<const N: usize> From<[&str; N]> for FieldPath {
    fn from(segments: [&str; N]) -> Self {
        FieldPath::new(segments)
    }
}

impl<const N: usize> PartialEq<[&str; N]> for FieldPath {
    fn eq(&self, other: &[&str; N]) -> bool {
        self.0.len() == N && self.0.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

/// Uniform field access used by the interceptor.
pub trait Record: 'static {
    fn field_names(&self) -> Vec<&str>;

    fn read_field(&self, name: &str) -> Result<Value, FieldError>;

    fn write_field(&mut self, name: &str, value: Value) -> Result<(), FieldError>;

    fn has_field(&self, name: &str) -> bool {
        self.field_names().contains(&name)
    }

    /// Reads the value at `path`. A missing leaf below an existing field
    /// reads as `Value::Null`.
    fn read_path(&self, path: &FieldPath) -> Result<Value, FieldError> {
        resolve_path(self, path)
    }

    /// Writes `value` at `path`, by default by rewriting the head field as a
    /// whole.
    fn write_path(&mut self, path: &FieldPath, value: Value) -> Result<(), FieldError> {
        assign_path(self, path, value)
    }
}

/// Path lookup through `record`'s field accessors. This is what
/// [`Record::read_path`] does unless a record overrides it.
pub fn resolve_path<R: Record + ?Sized>(
    record: &R,
    path: &FieldPath,
) -> Result<Value, FieldError> {
    let (head, rest) = path
        .split_first()
        .ok_or_else(|| FieldError::Path(path.clone()))?;
    let value = record.read_field(head)?;
    if rest.is_empty() {
        return Ok(value);
    }
    Ok(value_at(&value, rest).cloned().unwrap_or(Value::Null))
}

/// Default [`Record::write_path`]: reads the head field, patches the leaf
/// and writes the head field back as a whole.
pub fn assign_path<R: Record + ?Sized>(
    record: &mut R,
    path: &FieldPath,
    value: Value,
) -> Result<(), FieldError> {
    let (head, rest) = path
        .split_first()
        .ok_or_else(|| FieldError::Path(path.clone()))?;
    if rest.is_empty() {
        return record.write_field(head, value);
    }
    let mut root = record.read_field(head)?;
    if !write_at(&mut root, rest, value) {
        return Err(FieldError::Path(path.clone()));
    }
    record.write_field(head, root)
}

impl Record for Fields {
    fn field_names(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn has_field(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn read_field(&self, name: &str) -> Result<Value, FieldError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| FieldError::Unknown(name.to_owned()))
    }

    fn write_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
        self.insert(name.to_owned(), value);
        Ok(())
    }
}

pub type ReadFn<R> = fn(&R) -> Result<Value, serde_json::Error>;
pub type WriteFn<R> = fn(&mut R, Value) -> Result<(), serde_json::Error>;

/// One named field of a statically shaped record.
pub struct FieldDescriptor<R: 'static> {
    pub name: &'static str,
    pub read: ReadFn<R>,
    /// `None` marks the field read-only.
    pub write: Option<WriteFn<R>>,
}

/// Descriptor table backing a derived [`Record`] implementation.
pub struct FieldTable<R: 'static> {
    descriptors: &'static [FieldDescriptor<R>],
}

impl<R: 'static> FieldTable<R> {
    pub const fn new(descriptors: &'static [FieldDescriptor<R>]) -> Self {
        Self { descriptors }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.descriptors.iter().map(|d| d.name).collect()
    }

    pub fn descriptor(&self, name: &str) -> Option<&'static FieldDescriptor<R>> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn read(&self, record: &R, name: &str) -> Result<Value, FieldError> {
        let descriptor = self
            .descriptor(name)
            .ok_or_else(|| FieldError::Unknown(name.to_owned()))?;
        (descriptor.read)(record).map_err(|source| FieldError::value(name, source))
    }

    pub fn write(&self, record: &mut R, name: &str, value: Value) -> Result<(), FieldError> {
        let descriptor = self
            .descriptor(name)
            .ok_or_else(|| FieldError::Unknown(name.to_owned()))?;
        let write = descriptor
            .write
            .ok_or_else(|| FieldError::ReadOnly(name.to_owned()))?;
        write(record, value).map_err(|source| FieldError::value(name, source))
    }
}

fn step<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn step_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

pub(crate) fn value_at<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter()
        .try_fold(root, |value, segment| step(value, segment))
}

/// Sets the leaf at `path` inside `root`. Objects accept new keys; arrays
/// only accept in-bounds indices. Returns `false` when the parent does not
/// exist.
pub(crate) fn write_at(root: &mut Value, path: &[String], new_value: Value) -> bool {
    let Some((leaf, parents)) = path.split_last() else {
        *root = new_value;
        return true;
    };
    let mut parent = root;
    for segment in parents {
        match step_mut(parent, segment) {
            Some(next) => parent = next,
            None => return false,
        }
    }
    match parent {
        Value::Object(map) => {
            map.insert(leaf.clone(), new_value);
            true
        }
        Value::Array(items) => match leaf.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
            Some(slot) => {
                *slot = new_value;
                true
            }
            None => false,
        },
        _ => false,
    }
}

#[cfg(test)]
#[path = "tests/record_tests.rs"]
mod tests;
