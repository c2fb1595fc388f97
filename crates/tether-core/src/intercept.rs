//! Field-level change interception for a single record.
//!
//! [`Tracked`] owns a record and mediates dynamic reads and writes:
//!
//! - every intercepted write is applied first, then reported as a
//!   [`ChangeRecord`] to the field's own hook and then to the global hook;
//! - reads of fields with an `on_get` transform return the transformed value;
//! - fields configured with a member hook get a subordinate tracker (see
//!   [`nested`](crate::nested)).
//!
//! Hooks never veto a write, and their errors reach the writer unchanged.
//! Typed reads go through `Deref` and are never intercepted.

use std::fmt;
use std::ops::Deref;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::collections::{sorted_keys, FieldMap};
use crate::nested::{NestedFieldTracker, NestedView};
use crate::record::{FieldError, FieldPath, Record};
use crate::{Error, HookResult, Result};

pub type ChangeHook<R> = Box<dyn FnMut(&mut R, &ChangeRecord) -> HookResult>;
pub type GetTransform<R> = Box<dyn Fn(&R, Value) -> Value>;

/// One observed mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeRecord {
    path: FieldPath,
    previous: Value,
    value: Value,
}

impl ChangeRecord {
    pub fn new(path: FieldPath, previous: Value, value: Value) -> Self {
        Self {
            path,
            previous,
            value,
        }
    }

    /// Path from the tracked root to the changed leaf.
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Top-level field the change happened under.
    pub fn field(&self) -> &str {
        self.path.head().unwrap_or_default()
    }

    pub fn previous(&self) -> &Value {
        &self.previous
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn previous_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.previous.clone())
    }

    pub fn value_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.value.clone())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InterceptMode {
    /// Every field is intercepted.
    #[default]
    All,
    /// Only fields named in the config are intercepted; the rest pass through.
    ConfiguredOnly,
}

/// Per-field hooks.
pub struct FieldConfig<R> {
    pub(crate) on_change: Option<ChangeHook<R>>,
    pub(crate) on_get: Option<GetTransform<R>>,
    pub(crate) members: Option<ChangeHook<R>>,
}

impl<R> Default for FieldConfig<R> {
    fn default() -> Self {
        Self {
            on_change: None,
            on_get: None,
            members: None,
        }
    }
}

impl<R: Record> FieldConfig<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs before the global hook whenever the field itself is written.
    pub fn on_change(
        mut self,
        hook: impl FnMut(&mut R, &ChangeRecord) -> HookResult + 'static,
    ) -> Self {
        self.on_change = Some(Box::new(hook));
        self
    }

    pub fn on_get(mut self, transform: impl Fn(&R, Value) -> Value + 'static) -> Self {
        self.on_get = Some(Box::new(transform));
        self
    }

    /// Tracks writes to members of the field's value and reports them to
    /// `hook` instead of the global hook.
    pub fn members(
        mut self,
        hook: impl FnMut(&mut R, &ChangeRecord) -> HookResult + 'static,
    ) -> Self {
        self.members = Some(Box::new(hook));
        self
    }
}

impl<R> fmt::Debug for FieldConfig<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConfig")
            .field("on_change", &self.on_change.is_some())
            .field("on_get", &self.on_get.is_some())
            .field("members", &self.members.is_some())
            .finish()
    }
}

pub struct InterceptionConfig<R> {
    on_change: Option<ChangeHook<R>>,
    fields: FieldMap<FieldConfig<R>>,
    mode: InterceptMode,
}

impl<R> Default for InterceptionConfig<R> {
    fn default() -> Self {
        Self {
            on_change: None,
            fields: FieldMap::default(),
            mode: InterceptMode::default(),
        }
    }
}

impl<R: Record> InterceptionConfig<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Global hook, invoked for every intercepted write after the field hook.
    pub fn on_change(
        mut self,
        hook: impl FnMut(&mut R, &ChangeRecord) -> HookResult + 'static,
    ) -> Self {
        self.on_change = Some(Box::new(hook));
        self
    }

    pub fn field(mut self, name: impl Into<String>, config: FieldConfig<R>) -> Self {
        self.fields.insert(name.into(), config);
        self
    }

    pub fn mode(mut self, mode: InterceptMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Interception wrapper around a record.
pub struct Tracked<R: Record> {
    target: R,
    on_change: Option<ChangeHook<R>>,
    fields: FieldMap<FieldConfig<R>>,
    nested: FieldMap<NestedFieldTracker<R>>,
    mode: InterceptMode,
}

impl<R: Record> Tracked<R> {
    /// Wraps `target`. Fails if the config names a field `target` lacks.
    pub fn new(target: R, config: InterceptionConfig<R>) -> Result<Self> {
        let InterceptionConfig {
            on_change,
            mut fields,
            mode,
        } = config;

        if let Some(missing) = sorted_keys(&fields)
            .into_iter()
            .find(|name| !target.has_field(name))
        {
            return Err(Error::Configuration {
                field: missing.to_owned(),
            });
        }

        let mut nested = FieldMap::default();
        for (name, field) in fields.iter_mut() {
            if let Some(hook) = field.members.take() {
                log::trace!("installing member tracker for `{name}`");
                nested.insert(name.clone(), NestedFieldTracker::new(name, hook));
            }
        }

        Ok(Self {
            target,
            on_change,
            fields,
            nested,
            mode,
        })
    }

    /// Wraps `target` with no hooks at all.
    pub fn passthrough(target: R) -> Self {
        Self {
            target,
            on_change: None,
            fields: FieldMap::default(),
            nested: FieldMap::default(),
            mode: InterceptMode::ConfiguredOnly,
        }
    }

    pub fn target(&self) -> &R {
        &self.target
    }

    pub fn into_inner(self) -> R {
        self.target
    }

    pub fn mode(&self) -> InterceptMode {
        self.mode
    }

    pub fn intercepts(&self, field: &str) -> bool {
        match self.mode {
            InterceptMode::All => true,
            InterceptMode::ConfiguredOnly => {
                self.fields.contains_key(field) || self.nested.contains_key(field)
            }
        }
    }

    pub fn get(&self, field: &str) -> Result<Value> {
        let raw = self.target.read_field(field)?;
        if !self.intercepts(field) {
            return Ok(raw);
        }
        match self.fields.get(field).and_then(|c| c.on_get.as_ref()) {
            Some(transform) => Ok(transform(&self.target, raw)),
            None => Ok(raw),
        }
    }

    pub fn get_as<T: DeserializeOwned>(&self, field: &str) -> Result<T> {
        let value = self.get(field)?;
        serde_json::from_value(value).map_err(|source| FieldError::value(field, source).into())
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.replace(field, value).map(drop)
    }

    pub fn set_as<T: Serialize + ?Sized>(&mut self, field: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|source| FieldError::value(field, source))?;
        self.set(field, value)
    }

    /// Writes `value` and returns the displaced value (`Null` for a field the
    /// record did not have yet).
    ///
    /// When `field` carries a member tracker the tracker is re-bound to the
    /// new value; the returned old value is detached and never reports again.
    pub fn replace(&mut self, field: &str, value: impl Into<Value>) -> Result<Value> {
        let previous = if self.target.has_field(field) {
            self.target.read_field(field)?
        } else {
            Value::Null
        };
        self.target.write_field(field, value.into())?;
        if !self.intercepts(field) {
            return Ok(previous);
        }

        if let Some(tracker) = self.nested.get_mut(field) {
            tracker.reinstall();
        }

        let current = self.target.read_field(field)?;
        let change = ChangeRecord::new(FieldPath::root(field), previous.clone(), current);
        self.dispatch(&change)?;
        Ok(previous)
    }

    /// Member-level access to a field configured with a member hook.
    pub fn nested(&mut self, field: &str) -> Result<NestedView<'_, R>> {
        let tracker = self
            .nested
            .get_mut(field)
            .ok_or_else(|| FieldError::Untracked(field.to_owned()))?;
        Ok(NestedView::new(&mut self.target, tracker))
    }

    /// How many times the member tracker on `field` has been re-bound.
    pub fn tracker_epoch(&self, field: &str) -> Option<u64> {
        self.nested.get(field).map(NestedFieldTracker::epoch)
    }

    fn dispatch(&mut self, change: &ChangeRecord) -> Result<()> {
        let field = change.field();
        if let Some(hook) = self
            .fields
            .get_mut(field)
            .and_then(|config| config.on_change.as_mut())
        {
            hook(&mut self.target, change)?;
        }
        if let Some(hook) = self.on_change.as_mut() {
            hook(&mut self.target, change)?;
        }
        Ok(())
    }
}

impl<R: Record> Deref for Tracked<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.target
    }
}

impl<R: Record + fmt::Debug> fmt::Debug for Tracked<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("target", &self.target)
            .field("mode", &self.mode)
            .field("fields", &sorted_keys(&self.fields))
            .field("nested", &sorted_keys(&self.nested))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "tests/intercept_tests.rs"]
mod tests;
