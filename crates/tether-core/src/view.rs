//! The re-render request path from a mounted slot to its host.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::platform::{RenderSignal, RenderTrigger};
use crate::{Error, Result};

#[derive(Default)]
struct ViewUpdaterInner {
    trigger: RefCell<Option<Rc<dyn RenderTrigger>>>,
    last_signal: Cell<u64>,
}

/// Shared link between a mounted slot and the host's re-render trigger.
///
/// Clones share the same trigger and signal counter, so every instance that
/// ever occupied a slot requests renders through whatever trigger the host
/// bound most recently.
#[derive(Clone, Default)]
pub struct ViewUpdater {
    inner: Rc<ViewUpdaterInner>,
}

impl ViewUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs (or replaces) the host trigger.
    pub fn bind(&self, trigger: impl RenderTrigger + 'static) {
        *self.inner.trigger.borrow_mut() = Some(Rc::new(trigger));
    }

    pub fn unbind(&self) {
        self.inner.trigger.borrow_mut().take();
    }

    pub fn is_bound(&self) -> bool {
        self.inner.trigger.borrow().is_some()
    }

    pub fn last_signal(&self) -> Option<RenderSignal> {
        match self.inner.last_signal.get() {
            0 => None,
            value => Some(RenderSignal::new(value)),
        }
    }

    /// Asks the host to render again.
    pub fn request(&self) -> Result<RenderSignal> {
        let trigger = self
            .inner
            .trigger
            .borrow()
            .clone()
            .ok_or(Error::NotMounted)?;
        let signal = RenderSignal::new(self.inner.last_signal.get() + 1);
        self.inner.last_signal.set(signal.get());
        log::trace!("requesting {signal}");
        trigger.request_render(signal);
        Ok(signal)
    }

    pub fn ptr_eq(&self, other: &ViewUpdater) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ViewUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewUpdater")
            .field("bound", &self.is_bound())
            .field("last_signal", &self.last_signal())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
