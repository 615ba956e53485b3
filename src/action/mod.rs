//! Plain action classes.
//!
//! An action is a plain struct with no knowledge of the roles it may play.
//! It declares its capabilities once, statically, through [`ActionClass`],
//! and exposes optional role conventions through the `as_*` accessors on
//! [`Action`]. Which role is active is decided at construction time by the
//! [`RoleRegistry`](crate::registry::RoleRegistry).

pub mod capability;
pub mod concerns;
pub mod param;

use std::any::Any;
use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use capability::{Capability, CapabilitySet};
pub use concerns::{AsCommand, AsController, AsJob, AsListener};
pub use param::{Entity, Locator, Param, ReducedParam};

use crate::container::Container;
use crate::error::{ActionError, ContainerError};
use crate::host::Router;

/// Result of running an action through any entry point.
pub type ActionResult = Result<Value, ActionError>;

/// A boxed plain instance, as produced by the container.
pub type ActionBox = Box<dyn Action>;

/// Identifier of an action class, the key it is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub String);

impl ClassId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ClassId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for ClassId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Object-safe surface of a plain instance.
///
/// Only `class_id`, `capabilities` and `as_any` are required; use
/// [`action_meta!`](crate::action_meta) to derive them from [`ActionClass`].
pub trait Action: Send + Sync + 'static {
    fn class_id(&self) -> &str;

    fn capabilities(&self) -> CapabilitySet;

    fn as_any(&self) -> &dyn Any;

    /// Generic execution entry point. `None` means the action declares none.
    fn handle(&self, _args: &[Param]) -> Option<ActionResult> {
        None
    }

    fn as_controller(&self) -> Option<&dyn AsController> {
        None
    }

    fn as_command(&self) -> Option<&dyn AsCommand> {
        None
    }

    fn as_listener(&self) -> Option<&dyn AsListener> {
        None
    }

    fn as_job(&self) -> Option<&dyn AsJob> {
        None
    }
}

impl fmt::Debug for dyn Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("class", &self.class_id())
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// Static declaration of an action class.
///
/// This is what the container registers and what the registrars scan.
pub trait ActionClass: Action + Sized {
    /// Identifier the class is registered and serialized under.
    const CLASS: &'static str;

    /// Capabilities the class declares.
    const CAPABILITIES: CapabilitySet;

    /// Static route declaration, for classes reachable over HTTP.
    const ROUTES: Option<fn(&mut dyn Router)> = None;

    /// Declared console signature.
    const COMMAND_SIGNATURE: Option<&'static str> = None;

    /// Console signature getter, consulted before `COMMAND_SIGNATURE`.
    fn command_signature() -> Option<String> {
        None
    }

    /// Build a fresh instance, pulling dependencies from the container.
    fn make(container: &Container) -> Result<Self, ContainerError>;
}

/// Implements the required [`Action`] methods from the [`ActionClass`] consts.
///
/// ```ignore
/// impl Action for PublishPost {
///     role_actions::action_meta!();
///
///     fn handle(&self, args: &[Param]) -> Option<ActionResult> { /* ... */ }
/// }
/// ```
#[macro_export]
macro_rules! action_meta {
    () => {
        fn class_id(&self) -> &str {
            <Self as $crate::action::ActionClass>::CLASS
        }

        fn capabilities(&self) -> $crate::action::CapabilitySet {
            <Self as $crate::action::ActionClass>::CAPABILITIES
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }
    };
}

/// Downcast a plain instance to its concrete class.
pub fn downcast_action<A: Action>(action: &dyn Action) -> Option<&A> {
    action.as_any().downcast_ref::<A>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::PublishPost;
    use serde_json::json;

    #[test]
    fn test_action_meta_reads_class_consts() {
        let action: ActionBox = Box::new(PublishPost::default());
        assert_eq!(action.class_id(), PublishPost::CLASS);
        assert_eq!(action.capabilities(), PublishPost::CAPABILITIES);
        assert!(downcast_action::<PublishPost>(action.as_ref()).is_some());
    }

    #[test]
    fn test_class_id_serializes_transparently() {
        let id = ClassId::from("app.publish_post");
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("app.publish_post"));
        assert_eq!(id.to_string(), "app.publish_post");
    }
}
