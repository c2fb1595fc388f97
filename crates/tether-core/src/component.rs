//! Component declarations and the instances that back them.
//!
//! An [`Instance`] pairs the author's component struct with the input
//! properties it was created from. Instances are always handed out wrapped:
//! the host and the component's own lifecycle methods see a
//! [`Tracked<Instance<C>>`], so writes made while rendering are reported to
//! [`Component::on_changes`] and writes into `props` to
//! [`Component::on_props_change`].

use std::cell::RefCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::intercept::{ChangeRecord, FieldConfig, InterceptionConfig, Tracked};
use crate::lifecycle::Variant;
use crate::platform::RenderSignal;
use crate::record::{assign_path, resolve_path, FieldError, FieldPath, Record};
use crate::view::ViewUpdater;
use crate::{HookResult, Result};

pub const ORIGINAL_PROPS: &str = "original_props";
pub const PROPS: &str = "props";
pub const CHILDREN: &str = "children";

/// A component declaration. Each implementing type is one variant.
///
/// Lifecycle methods are associated functions taking the instance
/// explicitly: hooks receive the raw instance, everything else the tracked
/// wrapper.
pub trait Component: Record + Sized {
    type Props: Record + Clone + Serialize + DeserializeOwned;
    type Output: 'static;

    fn create(props: &Self::Props) -> Self;

    /// Runs once per instance, right after it is first mounted.
    fn on_init(_this: &mut Tracked<Instance<Self>>) -> Result<()> {
        Ok(())
    }

    /// Runs before every render. Must tolerate being called repeatedly.
    fn setup_hooks(_this: &mut Tracked<Instance<Self>>) -> Result<()> {
        Ok(())
    }

    fn on_changes(_this: &mut Instance<Self>, _change: &ChangeRecord) -> HookResult {
        Ok(())
    }

    fn on_props_change(_this: &mut Instance<Self>, _change: &ChangeRecord) -> HookResult {
        Ok(())
    }

    fn render(this: &mut Tracked<Instance<Self>>) -> Result<Self::Output>;
}

/// Backing record for one mounted component.
pub struct Instance<C: Component> {
    original_props: C::Props,
    props: C::Props,
    children: Option<Value>,
    view: ViewUpdater,
    state: C,
}

impl<C: Component> Instance<C> {
    pub fn new(props: C::Props) -> Self {
        Self::with_view(props, ViewUpdater::default())
    }

    pub(crate) fn with_view(props: C::Props, view: ViewUpdater) -> Self {
        let children = props
            .read_field(CHILDREN)
            .ok()
            .filter(|children| !children.is_null());
        let state = C::create(&props);
        Self {
            original_props: props.clone(),
            props,
            children,
            view,
            state,
        }
    }

    /// Input properties exactly as constructed.
    pub fn original_props(&self) -> &C::Props {
        &self.original_props
    }

    pub fn props(&self) -> &C::Props {
        &self.props
    }

    pub fn children(&self) -> Option<&Value> {
        self.children.as_ref()
    }

    pub fn state(&self) -> &C {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut C {
        &mut self.state
    }

    pub fn variant(&self) -> Variant {
        Variant::of::<C>()
    }

    pub fn view(&self) -> &ViewUpdater {
        &self.view
    }

    /// Asks the host to render this component again.
    ///
    /// Fails with [`Error::NotMounted`](crate::Error::NotMounted) until the
    /// host has bound a render trigger.
    pub fn update_view(&self) -> Result<RenderSignal> {
        self.view.request()
    }
}

impl<C: Component> Deref for Instance<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.state
    }
}

impl<C: Component> DerefMut for Instance<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.state
    }
}

impl<C: Component> Record for Instance<C> {
    fn field_names(&self) -> Vec<&str> {
        let mut names = vec![ORIGINAL_PROPS, PROPS, CHILDREN];
        names.extend(
            self.state
                .field_names()
                .into_iter()
                .filter(|name| ![ORIGINAL_PROPS, PROPS, CHILDREN].contains(name)),
        );
        names
    }

    fn read_field(&self, name: &str) -> Result<Value, FieldError> {
        match name {
            ORIGINAL_PROPS => serde_json::to_value(&self.original_props)
                .map_err(|source| FieldError::value(name, source)),
            PROPS => {
                serde_json::to_value(&self.props).map_err(|source| FieldError::value(name, source))
            }
            CHILDREN => Ok(self.children.clone().unwrap_or(Value::Null)),
            _ => self.state.read_field(name),
        }
    }

    fn write_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
        match name {
            ORIGINAL_PROPS => Err(FieldError::ReadOnly(name.to_owned())),
            PROPS => {
                self.props =
                    serde_json::from_value(value).map_err(|source| FieldError::value(name, source))?;
                Ok(())
            }
            CHILDREN => {
                self.children = Some(value).filter(|children| !children.is_null());
                Ok(())
            }
            _ => self.state.write_field(name, value),
        }
    }

    // Members of `props` resolve through the props record itself, so its
    // field names and read-only markers apply to member paths too.
    fn read_path(&self, path: &FieldPath) -> Result<Value, FieldError> {
        match props_member(path) {
            Some(member) => self
                .props
                .read_path(&member)
                .map_err(|err| rebase(err, path)),
            None => resolve_path(self, path),
        }
    }

    fn write_path(&mut self, path: &FieldPath, value: Value) -> Result<(), FieldError> {
        match props_member(path) {
            Some(member) => self
                .props
                .write_path(&member, value)
                .map_err(|err| rebase(err, path)),
            None => assign_path(self, path, value),
        }
    }
}

fn props_member(path: &FieldPath) -> Option<FieldPath> {
    match path.split_first() {
        Some((PROPS, rest)) if !rest.is_empty() => Some(FieldPath::from(rest.to_vec())),
        _ => None,
    }
}

fn rebase(err: FieldError, path: &FieldPath) -> FieldError {
    match err {
        FieldError::Path(_) => FieldError::Path(path.clone()),
        other => other,
    }
}

impl<C: Component + fmt::Debug> fmt::Debug for Instance<C>
where
    C::Props: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("variant", &Variant::of::<C>().name())
            .field("props", &self.props)
            .field("children", &self.children)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Hook wiring shared by every instance: the global hook goes to
/// `on_changes`, member writes under `props` to `on_props_change`.
pub(crate) fn interception_config<C: Component>() -> InterceptionConfig<Instance<C>> {
    InterceptionConfig::new()
        .on_change(C::on_changes)
        .field(PROPS, FieldConfig::new().members(C::on_props_change))
}

/// The externally visible instance: a shared handle to the tracked wrapper.
pub struct ComponentHandle<C: Component> {
    inner: Rc<RefCell<Tracked<Instance<C>>>>,
}

impl<C: Component> ComponentHandle<C> {
    /// Wraps a raw instance. The raw value is moved in and never handed back.
    pub fn wrap(instance: Instance<C>) -> Result<Self> {
        let tracked = Tracked::new(instance, interception_config::<C>())?;
        Ok(Self {
            inner: Rc::new(RefCell::new(tracked)),
        })
    }

    pub fn with<R>(&self, f: impl FnOnce(&Tracked<Instance<C>>) -> R) -> R {
        f(&*self.inner.borrow())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Tracked<Instance<C>>) -> R) -> R {
        f(&mut *self.inner.borrow_mut())
    }

    pub fn update_view(&self) -> Result<RenderSignal> {
        self.with(|tracked| tracked.update_view())
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<C: Component> Clone for ComponentHandle<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C: Component> fmt::Debug for ComponentHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("variant", &Variant::of::<C>().name())
            .field("ptr", &Rc::as_ptr(&self.inner))
            .finish()
    }
}

/// Renders a component once with no slot, no `on_init` and no trigger.
pub fn render_once<C: Component>(props: C::Props) -> Result<C::Output> {
    let mut tracked = Tracked::new(Instance::<C>::new(props), interception_config::<C>())?;
    C::render(&mut tracked)
}

#[cfg(test)]
#[path = "tests/component_tests.rs"]
mod tests;
