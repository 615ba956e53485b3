use serde_json::Value;

use crate::action::{Action, ActionBox, ActionResult, Param};
use crate::host::Event;

/// Adapts a plain instance to the event dispatcher's listener contract.
#[derive(Debug)]
pub struct ListenerDecorator {
    action: ActionBox,
}

impl ListenerDecorator {
    pub fn new(action: ActionBox) -> Self {
        Self { action }
    }

    pub fn action(&self) -> &dyn Action {
        self.action.as_ref()
    }

    pub fn into_action(self) -> ActionBox {
        self.action
    }

    pub fn handle(&self, event: &Event) -> ActionResult {
        if let Some(result) = self.action.as_listener().and_then(|l| l.as_listener(event)) {
            return result;
        }

        match self.action.handle(&[Param::Value(event.payload.clone())]) {
            Some(result) => result,
            None => {
                log::warn!("{} declares no listener entry point", self.action.class_id());
                Ok(Value::Null)
            }
        }
    }
}
