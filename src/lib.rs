//! # Role Actions
//!
//! Lets one plain action class play several execution roles (HTTP
//! controller, queued job, console command, event listener, plain object)
//! without inheriting from role-specific base types.
//!
//! Each class declares its capabilities statically through
//! [`ActionClass`]. A [`RoleRegistry`] intercepts constructions of those
//! classes in the [`Container`], inspects the recorded call context, and
//! wraps the fresh instance in the decorator for the role being played:
//!
//! - the router's dispatch yields a [`ControllerDecorator`],
//! - the console kernel yields a [`CommandDecorator`],
//! - the event dispatcher yields a [`ListenerDecorator`],
//! - anything else yields the plain instance.
//!
//! Jobs are wrapped explicitly by [`JobDecorator`], which also owns the
//! serialize/deserialize transforms that make plain instances durable.
//!
//! [`ControllerDecorator`]: decorators::ControllerDecorator
//! [`CommandDecorator`]: decorators::CommandDecorator
//! [`ListenerDecorator`]: decorators::ListenerDecorator

pub mod action;
pub mod config;
pub mod container;
pub mod decorators;
pub mod error;
pub mod host;
pub mod patterns;
pub mod probe;
pub mod queue;
pub mod registrar;
pub mod registry;

#[cfg(test)]
mod fixtures;

pub use action::{
    Action, ActionBox, ActionClass, ActionResult, Capability, CapabilitySet, ClassId, Entity,
    Locator, Param,
};
pub use config::ActionsConfig;
pub use container::Container;
pub use decorators::{JobDecorator, JobPayload, Resolved};
pub use error::{ActionError, ConfigError, ContainerError, QueueError, SerializationError};
pub use queue::{InMemoryQueue, Queue, QueueJob};
pub use registry::RoleRegistry;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
