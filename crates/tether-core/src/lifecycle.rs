//! Mount/update orchestration for one host slot.
//!
//! The host keeps a [`Lifecycle`] per position in its tree and calls
//! [`Lifecycle::invoke`] on every pass. The slot decides whether the incoming
//! component continues the instance it already holds or replaces it, and it
//! owns the [`ViewUpdater`] shared by every instance that ever occupies it.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::Value;

use crate::component::{Component, ComponentHandle, Instance, CHILDREN, PROPS};
use crate::platform::{RenderSignal, RenderTrigger};
use crate::rebind::{as_receiver_parameter, rebind, Rebound};
use crate::record::Record;
use crate::view::ViewUpdater;
use crate::{Error, Result};

/// Declaration identity of a component type.
#[derive(Clone, Copy)]
pub struct Variant {
    id: TypeId,
    name: &'static str,
}

impl Variant {
    pub fn of<C: 'static>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Variant {}

impl Hash for Variant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Variant").field(&self.name).finish()
    }
}

/// Decides whether `(held, incoming)` continue the same instance.
pub type VariantPredicate = Box<dyn Fn(&Variant, &Variant) -> bool>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    Unmounted,
    Mounted,
    Updating,
}

enum Continuity {
    Mount,
    Keep,
    Replace,
}

/// Type-erased view of the instance held by a slot.
trait Slotted<P, O> {
    fn variant(&self) -> Variant;
    fn on_init(&self) -> Result<()>;
    fn setup_hooks(&self) -> Result<()>;
    fn render(&self) -> Result<O>;
    fn apply_props(&self, props: &P) -> Result<()>;
    fn as_any(&self) -> &dyn Any;
}

struct Mounted<C: Component> {
    handle: ComponentHandle<C>,
    render: Rebound<ComponentHandle<C>, Value, Result<C::Output>>,
}

impl<C: Component> Mounted<C> {
    fn wrap(instance: Instance<C>) -> Result<Self> {
        let handle = ComponentHandle::wrap(instance)?;
        let render = rebind(
            as_receiver_parameter(|handle: ComponentHandle<C>, _args: Vec<Value>| {
                handle.with_mut(C::render)
            }),
            handle.clone(),
        );
        Ok(Self { handle, render })
    }
}

impl<C: Component> Slotted<C::Props, C::Output> for Mounted<C> {
    fn variant(&self) -> Variant {
        Variant::of::<C>()
    }

    fn on_init(&self) -> Result<()> {
        self.handle.with_mut(C::on_init)
    }

    fn setup_hooks(&self) -> Result<()> {
        self.handle.with_mut(C::setup_hooks)
    }

    fn render(&self) -> Result<C::Output> {
        self.render.call(Vec::new())
    }

    fn apply_props(&self, props: &C::Props) -> Result<()> {
        let children = props
            .read_field(CHILDREN)
            .ok()
            .filter(|children| !children.is_null());
        // Every incoming value is written even when a hook fails; the first
        // failure is returned once the instance holds the new props.
        self.handle.with_mut(|tracked| -> Result<()> {
            let mut first_error = None;
            match changed_members(tracked.props(), props)? {
                Some(changed) => {
                    let mut view = tracked.nested(PROPS)?;
                    for (name, value) in changed {
                        if let Err(err) = view.set(name, value) {
                            first_error.get_or_insert(err);
                        }
                    }
                }
                None => {
                    if let Err(err) = tracked.set_as(PROPS, props) {
                        first_error.get_or_insert(err);
                    }
                }
            }
            if tracked.children() != children.as_ref() {
                if let Err(err) = tracked.set(CHILDREN, children.unwrap_or(Value::Null)) {
                    first_error.get_or_insert(err);
                }
            }
            first_error.map_or(Ok(()), Err)
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Members of `incoming` that differ from `current`, or `None` when the
/// two cannot be reconciled member by member (different field sets, or a
/// changed member that is read-only).
fn changed_members<'a, P: Record + Clone>(
    current: &P,
    incoming: &'a P,
) -> Result<Option<Vec<(&'a str, Value)>>> {
    let names = incoming.field_names();
    let existing = current.field_names();
    if names.len() != existing.len() || names.iter().any(|name| !existing.contains(name)) {
        return Ok(None);
    }

    let mut probe = current.clone();
    let mut changed = Vec::new();
    for name in names {
        let value = incoming.read_field(name)?;
        if current.read_field(name)? == value {
            continue;
        }
        if probe.write_field(name, value.clone()).is_err() {
            return Ok(None);
        }
        changed.push((name, value));
    }
    Ok(Some(changed))
}

/// Explicit slot owned by the host for one component position.
///
/// `P` and `O` are the props and output types shared by every variant the
/// slot may hold.
pub struct Lifecycle<P, O> {
    held: Option<Box<dyn Slotted<P, O>>>,
    state: LifecycleState,
    view: ViewUpdater,
    same_variant: VariantPredicate,
}

impl<P: 'static, O: 'static> Default for Lifecycle<P, O> {
    fn default() -> Self {
        Self {
            held: None,
            state: LifecycleState::Unmounted,
            view: ViewUpdater::new(),
            same_variant: Box::new(|held: &Variant, incoming: &Variant| held == incoming),
        }
    }
}

impl<P: 'static, O: 'static> Lifecycle<P, O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the default nominal comparison used by the continuity rule.
    pub fn with_variant_predicate(
        mut self,
        predicate: impl Fn(&Variant, &Variant) -> bool + 'static,
    ) -> Self {
        self.same_variant = Box::new(predicate);
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Records the host's re-render capability. May be called at any time,
    /// before or after the first mount.
    pub fn bind_trigger(&self, trigger: impl RenderTrigger + 'static) {
        self.view.bind(trigger);
    }

    pub fn view(&self) -> &ViewUpdater {
        &self.view
    }

    pub fn update_view(&self) -> Result<RenderSignal> {
        self.view.request()
    }

    /// Variant of the held instance, if any.
    pub fn variant(&self) -> Option<Variant> {
        self.held.as_ref().map(|held| held.variant())
    }

    /// The externally visible handle, when the slot holds a `C`.
    pub fn handle<C>(&self) -> Option<ComponentHandle<C>>
    where
        C: Component<Props = P, Output = O>,
    {
        self.held
            .as_ref()?
            .as_any()
            .downcast_ref::<Mounted<C>>()
            .map(|mounted| mounted.handle.clone())
    }

    /// Runs one host pass with freshly supplied props for variant `C`.
    ///
    /// On a variant change the new instance only becomes visible once its
    /// `on_init` succeeded; if it fails the slot keeps the previous instance.
    pub fn invoke<C>(&mut self, props: P) -> Result<O>
    where
        C: Component<Props = P, Output = O>,
    {
        let incoming = Variant::of::<C>();
        let continuity = match &self.held {
            None => Continuity::Mount,
            Some(held) if (self.same_variant)(&held.variant(), &incoming) => Continuity::Keep,
            Some(_) => Continuity::Replace,
        };

        match continuity {
            Continuity::Mount => {
                let mounted = self.mount::<C>(props)?;
                log::debug!("mounted {}", incoming.name());
                self.held = Some(mounted);
            }
            Continuity::Keep => {
                if let Some(held) = &self.held {
                    held.apply_props(&props)?;
                }
            }
            Continuity::Replace => {
                let mounted = self.mount::<C>(props)?;
                if let Some(previous) = self.held.replace(mounted) {
                    log::debug!(
                        "variant changed from {} to {}",
                        previous.variant().name(),
                        incoming.name()
                    );
                }
                if self.view.is_bound() {
                    self.view.request()?;
                }
            }
        }

        self.render()
    }

    fn mount<C>(&self, props: P) -> Result<Box<dyn Slotted<P, O>>>
    where
        C: Component<Props = P, Output = O>,
    {
        let mounted = Mounted::<C>::wrap(Instance::with_view(props, self.view.clone()))?;
        mounted.on_init()?;
        Ok(Box::new(mounted))
    }

    fn render(&mut self) -> Result<O> {
        let held = self.held.as_ref().ok_or(Error::NotMounted)?;
        self.state = LifecycleState::Updating;
        let output = held.setup_hooks().and_then(|()| held.render());
        self.state = LifecycleState::Mounted;
        output
    }
}

impl<P, O> fmt::Debug for Lifecycle<P, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state)
            .field("variant", &self.held.as_ref().map(|held| held.variant()))
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "tests/lifecycle_tests.rs"]
mod tests;
