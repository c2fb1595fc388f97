use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tether_core::{
    ChangeRecord, Component, Fields, HookResult, Lifecycle, Record, RenderSignal, RenderTrigger,
    Result,
};

/// Builds a dynamic props bag from a `json!` object literal.
///
/// # Panics
///
/// Panics if `value` is not a JSON object.
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Shared log of observed changes. Clones append to the same log.
#[derive(Clone, Default)]
pub struct ChangeLog {
    records: Rc<RefCell<Vec<ChangeRecord>>>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A hook that appends every change it sees.
    pub fn hook<R: Record>(&self) -> impl FnMut(&mut R, &ChangeRecord) -> HookResult + 'static {
        let records = Rc::clone(&self.records);
        move |_: &mut R, change: &ChangeRecord| {
            records.borrow_mut().push(change.clone());
            Ok(())
        }
    }

    /// Like [`ChangeLog::hook`], but appends a tagged copy into `order`
    /// as well, for asserting the relative order of several hooks.
    pub fn tagged_hook<R: Record>(
        &self,
        tag: &'static str,
        order: &CallOrder,
    ) -> impl FnMut(&mut R, &ChangeRecord) -> HookResult + 'static {
        let records = Rc::clone(&self.records);
        let order = order.clone();
        move |_: &mut R, change: &ChangeRecord| {
            order.push(tag);
            records.borrow_mut().push(change.clone());
            Ok(())
        }
    }

    pub fn records(&self) -> Vec<ChangeRecord> {
        self.records.borrow().clone()
    }

    /// Dotted paths of every recorded change, oldest first.
    pub fn paths(&self) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .map(|change| change.path().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

/// Ordered list of tags pushed by cooperating hooks.
#[derive(Clone, Default)]
pub struct CallOrder {
    calls: Rc<RefCell<Vec<&'static str>>>,
}

impl CallOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, tag: &'static str) {
        self.calls.borrow_mut().push(tag);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
}

/// Fake host trigger that remembers every signal it received.
#[derive(Clone, Default)]
pub struct SignalRecorder {
    signals: Rc<RefCell<Vec<RenderSignal>>>,
}

impl SignalRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<RenderSignal> {
        self.signals.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.signals.borrow().len()
    }

    pub fn last(&self) -> Option<RenderSignal> {
        self.signals.borrow().last().copied()
    }

    /// Forgets every signal received so far and returns how many there were.
    pub fn drain(&self) -> usize {
        self.signals.borrow_mut().drain(..).count()
    }
}

impl RenderTrigger for SignalRecorder {
    fn request_render(&self, signal: RenderSignal) {
        self.signals.borrow_mut().push(signal);
    }
}

/// Minimal host: one slot plus a recording render trigger.
///
/// The trigger is bound after the first successful render, the way a real
/// host hands over its capability once the component exists.
pub struct TestHost<P, O> {
    slot: Lifecycle<P, O>,
    recorder: SignalRecorder,
    bound: bool,
    manual: bool,
}

impl<P: 'static, O: 'static> TestHost<P, O> {
    pub fn new() -> Self {
        Self::with_slot(Lifecycle::new())
    }

    pub fn with_slot(slot: Lifecycle<P, O>) -> Self {
        Self {
            slot,
            recorder: SignalRecorder::new(),
            bound: false,
            manual: false,
        }
    }

    /// Keeps the trigger unbound until [`TestHost::bind`] is called.
    pub fn manual_binding(mut self) -> Self {
        self.manual = true;
        self
    }

    pub fn bind(&mut self) {
        self.slot.bind_trigger(self.recorder.clone());
        self.bound = true;
    }

    /// Runs one host pass for variant `C`.
    pub fn render<C>(&mut self, props: P) -> Result<O>
    where
        C: Component<Props = P, Output = O>,
    {
        let output = self.slot.invoke::<C>(props)?;
        if !self.bound && !self.manual {
            self.bind();
        }
        Ok(output)
    }

    pub fn slot(&self) -> &Lifecycle<P, O> {
        &self.slot
    }

    pub fn slot_mut(&mut self) -> &mut Lifecycle<P, O> {
        &mut self.slot
    }

    pub fn recorder(&self) -> &SignalRecorder {
        &self.recorder
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }
}

impl<P: 'static, O: 'static> Default for TestHost<P, O> {
    fn default() -> Self {
        Self::new()
    }
}
