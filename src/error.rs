//! Error types for the role decoration engine.
//!
//! Unmatched capabilities and double installation are not errors; they are
//! defined pass-through outcomes. Only container resolution and durable
//! payload handling fail.

use thiserror::Error;

use crate::action::Locator;

/// Errors raised by the dependency container.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// No class is registered under the requested identifier.
    #[error("Class not found in container: {0}")]
    ClassNotFound(String),

    /// No resolver is bound for an entity kind.
    #[error("No entity resolver bound for kind: {0}")]
    NoEntityResolver(String),

    /// The entity resolver ran but found nothing for the key.
    #[error("Entity not found: {kind} [{key}]")]
    EntityNotFound { kind: String, key: String },

    /// A class factory failed while building an instance.
    #[error("Failed to build {class}: {source}")]
    Factory {
        class: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors raised while executing an action through one of its roles.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The controller role refused the request.
    #[error("This action is unauthorized: {0}")]
    Unauthorized(String),

    /// Input validation failed.
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// The resolved instance does not expose the role the caller asked for.
    #[error("{class} cannot be invoked as a {role}")]
    NotInvokable { class: String, role: String },

    /// No route matches the request.
    #[error("No route matches {0}")]
    RouteNotFound(String),

    /// No console command is registered under the name.
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    /// A job was executed while its action was collapsed for storage.
    #[error("Job for {0} has not been rehydrated")]
    NotHydrated(String),

    /// Container failure while resolving the action.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// Failure raised by the action body itself.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors raised by the serialize/deserialize transforms around a job.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// The action class could not be re-resolved after reading a payload.
    #[error("Failed to resolve action class {class}: {source}")]
    Resolution {
        class: String,
        #[source]
        source: ContainerError,
    },

    /// A locator in the parameter list no longer resolves.
    #[error("Unresolvable locator {}[{}]: {source}", .locator.kind, .locator.key)]
    UnresolvableLocator {
        locator: Locator,
        #[source]
        source: ContainerError,
    },

    /// Encoding or decoding the payload bytes failed.
    #[error("Payload codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Errors raised by the queue transport.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("Job {display_name} failed after {attempts} attempt(s): {source}")]
    Failed {
        display_name: String,
        attempts: u32,
        #[source]
        source: ActionError,
    },

    #[error("Job {0} expired before it could run")]
    Expired(String),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },
}
