//! Mock instances for faked action classes.

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::action::{Action, ActionResult, Capability, CapabilitySet, ClassId, Param, ReducedParam};

/// State shared between every mock instance of one faked class.
#[derive(Debug)]
pub(crate) struct MockState {
    class_id: ClassId,
    capabilities: CapabilitySet,
    returns: Mutex<Value>,
    calls: Mutex<Vec<Vec<ReducedParam>>>,
}

impl MockState {
    pub(crate) fn new(class_id: ClassId, capabilities: CapabilitySet) -> Self {
        Self {
            class_id,
            // A mock must never be swapped for another mock.
            capabilities: capabilities.without(Capability::Fake),
            returns: Mutex::new(Value::Null),
            calls: Mutex::new(Vec::new()),
        }
    }
}

/// Stand-in instance built while a class is faked.
///
/// It keeps the original class id and role capabilities so it is decorated
/// exactly like the real class would be, records every call to `handle` and
/// answers with the value programmed on its [`MockHandle`].
#[derive(Debug)]
pub struct MockAction {
    state: Arc<MockState>,
}

impl MockAction {
    pub(crate) fn new(state: Arc<MockState>) -> Self {
        Self { state }
    }
}

impl Action for MockAction {
    fn class_id(&self) -> &str {
        self.state.class_id.as_str()
    }

    fn capabilities(&self) -> CapabilitySet {
        self.state.capabilities
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn handle(&self, args: &[Param]) -> Option<ActionResult> {
        self.state
            .calls
            .lock()
            .push(args.iter().map(Param::reduce).collect());
        Some(Ok(self.state.returns.lock().clone()))
    }
}

/// Test-side handle on a faked class.
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<MockState>,
}

impl MockHandle {
    pub(crate) fn new(state: Arc<MockState>) -> Self {
        Self { state }
    }

    /// Value every subsequent call returns.
    pub fn returning(&self, value: Value) -> &Self {
        *self.state.returns.lock() = value;
        self
    }

    /// Arguments of every call so far, entities collapsed to locators.
    pub fn calls(&self) -> Vec<Vec<ReducedParam>> {
        self.state.calls.lock().clone()
    }

    pub fn times_called(&self) -> usize {
        self.state.calls.lock().len()
    }

    pub fn was_called(&self) -> bool {
        self.times_called() > 0
    }
}
