//! Member tracking for one nominated sub-object of a tracked record.
//!
//! Writes made through a [`NestedView`] land inside the sub-object and are
//! reported to the field-scoped member hook with the full path from the
//! root (`props.nested.x`). They never reach the object-level hooks.
//!
//! Replacing the sub-object wholesale goes through [`Tracked::replace`],
//! which re-binds the tracker to the new value and bumps its epoch. Values
//! read out of a view are plain copies and are not tracked.
//!
//! [`Tracked::replace`]: crate::Tracked::replace

use serde_json::Value;

use crate::intercept::{ChangeHook, ChangeRecord};
use crate::record::{FieldError, FieldPath, Record};
use crate::Result;

pub(crate) struct NestedFieldTracker<R> {
    field: String,
    hook: ChangeHook<R>,
    epoch: u64,
}

impl<R: Record> NestedFieldTracker<R> {
    pub(crate) fn new(field: &str, hook: ChangeHook<R>) -> Self {
        Self {
            field: field.to_owned(),
            hook,
            epoch: 0,
        }
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn reinstall(&mut self) {
        self.epoch += 1;
        log::trace!(
            "member tracker for `{}` re-bound (epoch {})",
            self.field,
            self.epoch
        );
    }

    fn write(&mut self, root: &mut R, member: &FieldPath, value: Value) -> Result<Value> {
        if member.is_empty() {
            return Err(FieldError::Path(member.clone()).into());
        }
        let path = FieldPath::root(&self.field).join(member);
        // A member the sub-object does not have yet reads as `Null`; the
        // write below decides whether it may be added.
        let previous = match root.read_path(&path) {
            Err(FieldError::Unknown(_)) => Value::Null,
            read => read?,
        };
        root.write_path(&path, value)?;
        let current = root.read_path(&path)?;
        let change = ChangeRecord::new(path, previous.clone(), current);
        (self.hook)(root, &change)?;
        Ok(previous)
    }
}

/// Borrowed access to the members of a tracked sub-object.
pub struct NestedView<'a, R: Record> {
    target: &'a mut R,
    tracker: &'a mut NestedFieldTracker<R>,
}

impl<'a, R: Record> NestedView<'a, R> {
    pub(crate) fn new(target: &'a mut R, tracker: &'a mut NestedFieldTracker<R>) -> Self {
        Self { target, tracker }
    }

    pub fn field(&self) -> &str {
        &self.tracker.field
    }

    pub fn epoch(&self) -> u64 {
        self.tracker.epoch
    }

    /// The whole sub-object, detached.
    pub fn snapshot(&self) -> Result<Value> {
        Ok(self.target.read_field(&self.tracker.field)?)
    }

    pub fn get(&self, member: &str) -> Result<Value> {
        self.get_path(FieldPath::root(member))
    }

    pub fn get_path(&self, member: impl Into<FieldPath>) -> Result<Value> {
        let path = FieldPath::root(&self.tracker.field).join(&member.into());
        Ok(self.target.read_path(&path)?)
    }

    pub fn set(&mut self, member: &str, value: impl Into<Value>) -> Result<()> {
        self.replace_path(FieldPath::root(member), value).map(drop)
    }

    pub fn set_path(&mut self, member: impl Into<FieldPath>, value: impl Into<Value>) -> Result<()> {
        self.replace_path(member, value).map(drop)
    }

    /// Writes below the sub-object and returns the displaced leaf value.
    pub fn replace_path(
        &mut self,
        member: impl Into<FieldPath>,
        value: impl Into<Value>,
    ) -> Result<Value> {
        self.tracker
            .write(self.target, &member.into(), value.into())
    }
}

#[cfg(test)]
#[path = "tests/nested_tests.rs"]
mod tests;
