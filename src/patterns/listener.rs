use super::DesignPattern;
use crate::action::{ActionBox, Capability};
use crate::decorators::{ListenerDecorator, Resolved};
use crate::host::ListenerResolution;
use crate::probe::CallFrame;

/// Recognizes construction by the event dispatcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerPattern;

impl DesignPattern for ListenerPattern {
    fn capability(&self) -> Capability {
        Capability::Listener
    }

    fn recognize_frame(&self, frame: &CallFrame) -> bool {
        frame.matches::<ListenerResolution>("make_listener")
    }

    fn decorate(&self, instance: ActionBox, _frame: &CallFrame) -> Resolved {
        Resolved::Listener(ListenerDecorator::new(instance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::SendWelcomeEmail;
    use std::sync::Arc;

    #[test]
    fn test_recognizes_listener_construction() {
        let frame = CallFrame::method(
            Arc::new(ListenerResolution {
                event: "user.registered".to_string(),
            }),
            "make_listener",
        );
        assert!(ListenerPattern.recognize_frame(&frame));
        assert!(!ListenerPattern.recognize_frame(&CallFrame::function("make_listener")));

        let resolved = ListenerPattern.decorate(Box::new(SendWelcomeEmail), &frame);
        assert_eq!(resolved.role(), Some(Capability::Listener));
    }
}
