//! Role wrappers.
//!
//! Each decorator owns the plain instance exclusively and exposes the
//! contract its host expects. Calls outside that contract are forwarded to
//! the instance in a fixed fallback order: the role-specific entry point
//! first, then `Action::handle`.

mod command;
mod controller;
mod job;
mod listener;

use std::fmt;

pub use command::CommandDecorator;
pub use controller::ControllerDecorator;
pub use job::{Backoff, JobDecorator, JobOptions, JobPayload};
pub use listener::ListenerDecorator;

use crate::action::{Action, ActionBox, Capability};

/// What a construction through the container yields.
pub enum Resolved {
    /// The plain instance, undecorated.
    Action(ActionBox),
    Controller(ControllerDecorator),
    Command(CommandDecorator),
    Listener(ListenerDecorator),
}

impl Resolved {
    /// The role this construction was decorated for, if any.
    pub fn role(&self) -> Option<Capability> {
        match self {
            Self::Action(_) => None,
            Self::Controller(_) => Some(Capability::Controller),
            Self::Command(_) => Some(Capability::Command),
            Self::Listener(_) => Some(Capability::Listener),
        }
    }

    pub fn role_name(&self) -> &'static str {
        self.role().map_or("plain instance", |c| c.name())
    }

    pub fn is_decorated(&self) -> bool {
        self.role().is_some()
    }

    /// The wrapped plain instance.
    pub fn action(&self) -> &dyn Action {
        match self {
            Self::Action(a) => a.as_ref(),
            Self::Controller(d) => d.action(),
            Self::Command(d) => d.action(),
            Self::Listener(d) => d.action(),
        }
    }

    pub fn into_action(self) -> ActionBox {
        match self {
            Self::Action(a) => a,
            Self::Controller(d) => d.into_action(),
            Self::Command(d) => d.into_action(),
            Self::Listener(d) => d.into_action(),
        }
    }

    pub fn into_controller(self) -> Option<ControllerDecorator> {
        match self {
            Self::Controller(d) => Some(d),
            _ => None,
        }
    }

    pub fn into_command(self) -> Option<CommandDecorator> {
        match self {
            Self::Command(d) => Some(d),
            _ => None,
        }
    }

    pub fn into_listener(self) -> Option<ListenerDecorator> {
        match self {
            Self::Listener(d) => Some(d),
            _ => None,
        }
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("role", &self.role_name())
            .field("class", &self.action().class_id())
            .finish()
    }
}
