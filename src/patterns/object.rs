use serde_json::Value;

use super::DesignPattern;
use crate::action::{ActionBox, ActionClass, Capability, Param};
use crate::container::Container;
use crate::decorators::Resolved;
use crate::error::ActionError;
use crate::probe::{self, CallFrame};

/// Recognizes the static `run` entry point. The instance is returned as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectPattern;

impl DesignPattern for ObjectPattern {
    fn capability(&self) -> Capability {
        Capability::Object
    }

    fn recognize_frame(&self, frame: &CallFrame) -> bool {
        frame.matches_static("run")
    }

    fn decorate(&self, instance: ActionBox, _frame: &CallFrame) -> Resolved {
        Resolved::Action(instance)
    }
}

/// Resolve a fresh `A` and call its `handle` with `args`.
///
/// Returns `Ok(None)` when the class declares no `handle`.
pub fn run<A: ActionClass>(container: &Container, args: &[Param]) -> Result<Option<Value>, ActionError> {
    let action = probe::within(CallFrame::static_call::<A>("run"), || container.make(A::CLASS))?;
    action.handle(args).transpose()
}
