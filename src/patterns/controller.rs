use super::DesignPattern;
use crate::action::{ActionBox, Capability};
use crate::decorators::{ControllerDecorator, Resolved};
use crate::host::RouteDispatch;
use crate::probe::CallFrame;

/// Recognizes construction from inside the router's dispatch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerPattern;

impl DesignPattern for ControllerPattern {
    fn capability(&self) -> Capability {
        Capability::Controller
    }

    fn recognize_frame(&self, frame: &CallFrame) -> bool {
        frame.matches::<RouteDispatch>("dispatch")
    }

    fn decorate(&self, instance: ActionBox, frame: &CallFrame) -> Resolved {
        match frame.caller_as::<RouteDispatch>() {
            Some(dispatch) => {
                Resolved::Controller(ControllerDecorator::new(instance, dispatch.route.clone()))
            }
            None => Resolved::Action(instance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::PublishPost;
    use crate::host::{Method, Route};
    use std::sync::Arc;

    fn dispatch_frame() -> CallFrame {
        let route = Route::new(Method::Post, "/posts/{post}/publish", "posts.publish");
        CallFrame::method(Arc::new(RouteDispatch { route }), "dispatch")
    }

    #[test]
    fn test_recognizes_router_dispatch() {
        assert!(ControllerPattern.recognize_frame(&dispatch_frame()));
        assert!(!ControllerPattern.recognize_frame(&CallFrame::function("dispatch")));
        assert!(!ControllerPattern.recognize_frame(&CallFrame::static_call::<RouteDispatch>("dispatch")));
    }

    #[test]
    fn test_decorates_with_dispatched_route() {
        let resolved = ControllerPattern.decorate(Box::new(PublishPost::default()), &dispatch_frame());
        let controller = resolved.into_controller().unwrap();
        assert_eq!(controller.route().uri, "/posts/{post}/publish");
    }
}
