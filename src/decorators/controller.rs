use serde_json::Value;

use crate::action::{Action, ActionBox, ActionResult, Param};
use crate::error::ActionError;
use crate::host::{Request, Route};

/// Adapts a plain instance to the router's controller contract.
#[derive(Debug)]
pub struct ControllerDecorator {
    action: ActionBox,
    route: Route,
}

impl ControllerDecorator {
    pub fn new(action: ActionBox, route: Route) -> Self {
        Self { action, route }
    }

    pub fn action(&self) -> &dyn Action {
        self.action.as_ref()
    }

    pub fn into_action(self) -> ActionBox {
        self.action
    }

    /// The route being dispatched when this decorator was built.
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Route middleware followed by the action's own controller middleware.
    pub fn middleware(&self) -> Vec<String> {
        let mut middleware = self.route.middleware.clone();
        if let Some(controller) = self.action.as_controller() {
            middleware.extend(controller.get_controller_middleware());
        }
        middleware
    }

    /// Authorize, validate, then run the controller entry point.
    pub fn call(&self, request: &Request) -> ActionResult {
        if let Some(controller) = self.action.as_controller() {
            if !controller.authorize(request) {
                return Err(ActionError::Unauthorized(self.action.class_id().to_string()));
            }
            controller.validate(request).map_err(ActionError::Validation)?;

            if let Some(result) = controller.as_controller(request) {
                return result;
            }
        }

        match self.action.handle(&[Param::Value(request.all())]) {
            Some(result) => result,
            None => {
                log::warn!(
                    "{} declares no controller entry point; responding with null",
                    self.action.class_id()
                );
                Ok(Value::Null)
            }
        }
    }
}
