//! Capability descriptors.
//!
//! A [`DesignPattern`] pairs one [`Capability`] with the call-site shape that
//! proves the capability is active and with the decoration that adapts a
//! plain instance to that role. The set is closed; the matcher never needs
//! to change when a pattern is added.

mod command;
mod controller;
mod listener;
mod object;

use std::sync::Arc;

pub use command::CommandPattern;
pub use controller::ControllerPattern;
pub use listener::ListenerPattern;
pub use object::{run, ObjectPattern};

use crate::action::{ActionBox, Capability};
use crate::decorators::Resolved;
use crate::probe::CallFrame;

/// Describes one recognizable role.
pub trait DesignPattern: Send + Sync {
    /// The marker a class must declare for this pattern to apply.
    fn capability(&self) -> Capability;

    /// Whether `frame` is the call site of this role.
    fn recognize_frame(&self, frame: &CallFrame) -> bool;

    /// Wrap `instance` for the role recognized at `frame`.
    fn decorate(&self, instance: ActionBox, frame: &CallFrame) -> Resolved;
}

impl std::fmt::Debug for dyn DesignPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DesignPattern({})", self.capability())
    }
}

/// The pattern registered for `capability`, if the capability has one.
///
/// `Job` and `Fake` have none: jobs are wrapped explicitly by
/// [`JobDecorator`](crate::decorators::JobDecorator) and fakes are handled
/// before matching.
pub fn pattern_for(capability: Capability) -> Option<Arc<dyn DesignPattern>> {
    match capability {
        Capability::Controller => Some(Arc::new(ControllerPattern)),
        Capability::Listener => Some(Arc::new(ListenerPattern)),
        Capability::Command => Some(Arc::new(CommandPattern)),
        Capability::Object => Some(Arc::new(ObjectPattern)),
        Capability::Job | Capability::Fake => None,
    }
}

/// Default registration order.
pub const DEFAULT_ORDER: [Capability; 4] = [
    Capability::Controller,
    Capability::Listener,
    Capability::Command,
    Capability::Object,
];

pub fn default_patterns() -> Vec<Arc<dyn DesignPattern>> {
    DEFAULT_ORDER.iter().filter_map(|c| pattern_for(*c)).collect()
}
