//! Host abstraction for re-render requests.
//!
//! The host rendering framework owns the render loop. Tether only asks it to
//! run again; it never observes when (or whether) the host complies.

use std::fmt;

/// Value handed to the host on every re-render request.
///
/// Signals issued by one [`ViewUpdater`](crate::ViewUpdater) strictly increase,
/// so two consecutive requests are never equal and cannot be collapsed by a
/// host that deduplicates unchanged state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderSignal(u64);

impl RenderSignal {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RenderSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "render#{}", self.0)
    }
}

/// Re-render capability injected by the host after construction.
///
/// Invoking it must eventually make the host render the current handle
/// again. Any `Fn(RenderSignal)` closure qualifies.
pub trait RenderTrigger {
    fn request_render(&self, signal: RenderSignal);
}

impl<F> RenderTrigger for F
where
    F: Fn(RenderSignal),
{
    fn request_render(&self, signal: RenderSignal) {
        self(signal)
    }
}
