//! Event dispatcher stand-in.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::ClassId;
use crate::container::Container;
use crate::error::ActionError;
use crate::probe::{self, CallFrame};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub payload: Value,
}

impl Event {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Caller object of the listener construction frame.
#[derive(Debug, Clone)]
pub struct ListenerResolution {
    pub event: String,
}

/// Maps event names to listener classes.
#[derive(Debug, Default)]
pub struct EventDispatcher {
    listeners: HashMap<String, Vec<ClassId>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen(&mut self, event: impl Into<String>, class: impl Into<ClassId>) {
        self.listeners.entry(event.into()).or_default().push(class.into());
    }

    pub fn has_listeners(&self, event: &str) -> bool {
        self.listeners.get(event).is_some_and(|l| !l.is_empty())
    }

    /// Build each listener for `event` in registration order and run it.
    pub fn dispatch(&self, container: &Container, event: &Event) -> Result<Vec<Value>, ActionError> {
        let Some(classes) = self.listeners.get(&event.name) else {
            return Ok(Vec::new());
        };

        let mut results = Vec::with_capacity(classes.len());
        for class in classes {
            let caller = Arc::new(ListenerResolution {
                event: event.name.clone(),
            });
            let resolved = probe::within(CallFrame::method(caller, "make_listener"), || {
                container.resolve(class.as_str())
            })?;

            let listener = resolved
                .into_listener()
                .ok_or_else(|| ActionError::NotInvokable {
                    class: class.to_string(),
                    role: "listener".to_string(),
                })?;
            results.push(listener.handle(event)?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dispatch_without_listeners_is_empty() {
        let dispatcher = EventDispatcher::new();
        let results = dispatcher
            .dispatch(&Container::new(), &Event::new("unheard", json!(null)))
            .unwrap();
        assert!(results.is_empty());
        assert!(!dispatcher.has_listeners("unheard"));
    }

    #[test]
    fn test_dispatch_runs_listeners_as_listeners() {
        use crate::action::ActionClass;
        use crate::fixtures::{container_with_users, GenerateReport, SendWelcomeEmail};
        use crate::registry::RoleRegistry;

        let container = container_with_users();
        Arc::new(RoleRegistry::with_default_patterns()).install_all(&container);

        let mut dispatcher = EventDispatcher::new();
        dispatcher.listen("user.registered", SendWelcomeEmail::CLASS);
        let results = dispatcher
            .dispatch(&container, &Event::new("user.registered", json!({"user": "ada"})))
            .unwrap();
        assert_eq!(results, vec![json!({"welcomed": "ada"})]);

        // Not a listener: no pattern recognizes the frame.
        dispatcher.listen("month.closed", GenerateReport::CLASS);
        let err = dispatcher
            .dispatch(&container, &Event::new("month.closed", json!({})))
            .unwrap_err();
        assert!(matches!(err, ActionError::NotInvokable { .. }));
    }

    #[test]
    fn test_unknown_listener_class_fails() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.listen("user.registered", "missing");
        let err = dispatcher
            .dispatch(&Container::new(), &Event::new("user.registered", json!({})))
            .unwrap_err();
        assert!(matches!(err, ActionError::Container(_)));
    }
}
