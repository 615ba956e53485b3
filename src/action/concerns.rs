//! Optional role interfaces a plain action may implement.
//!
//! An action opts into a role's conventions by implementing the matching
//! trait and returning it from the corresponding `Action::as_*` accessor.
//! Every method has a default so an implementor only overrides what it
//! declares. Methods named `get_*` are getters and receive the action's
//! parameters; the others stand for declared properties.

use chrono::{DateTime, Utc};

use super::{ActionResult, Param};
use crate::decorators::{Backoff, JobDecorator};
use crate::host::{CommandInput, Event, Request};

/// HTTP endpoint conventions.
pub trait AsController {
    /// Controller-specific entry point, preferred over `Action::handle`.
    fn as_controller(&self, _request: &Request) -> Option<ActionResult> {
        None
    }

    fn authorize(&self, _request: &Request) -> bool {
        true
    }

    /// Validate the request input. Each `Err` entry is one failed rule.
    fn validate(&self, _request: &Request) -> Result<(), Vec<String>> {
        Ok(())
    }

    fn get_controller_middleware(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Console command conventions.
pub trait AsCommand {
    /// Command-specific entry point, preferred over `Action::handle`.
    fn as_command(&self, _input: &CommandInput) -> Option<ActionResult> {
        None
    }

    fn get_command_description(&self) -> Option<String> {
        None
    }

    fn command_description(&self) -> Option<String> {
        None
    }

    fn is_command_hidden(&self) -> bool {
        false
    }
}

/// Event listener conventions.
pub trait AsListener {
    /// Listener-specific entry point, preferred over `Action::handle`.
    fn as_listener(&self, _event: &Event) -> Option<ActionResult> {
        None
    }
}

/// Queued job conventions.
pub trait AsJob {
    /// Job-specific entry point, preferred over `Action::handle`.
    fn as_job(&self, _args: &[Param]) -> Option<ActionResult> {
        None
    }

    fn job_connection(&self) -> Option<String> {
        None
    }

    fn job_queue(&self) -> Option<String> {
        None
    }

    fn job_tries(&self) -> Option<u32> {
        None
    }

    fn job_max_exceptions(&self) -> Option<u32> {
        None
    }

    fn job_timeout(&self) -> Option<u32> {
        None
    }

    fn job_backoff(&self) -> Option<Backoff> {
        None
    }

    fn get_job_backoff(&self, _args: &[Param]) -> Option<Backoff> {
        None
    }

    fn job_retry_until(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn get_job_retry_until(&self, _args: &[Param]) -> Option<DateTime<Utc>> {
        None
    }

    fn job_middleware(&self) -> Option<Vec<String>> {
        None
    }

    fn get_job_middleware(&self, _args: &[Param]) -> Option<Vec<String>> {
        None
    }

    fn job_tags(&self) -> Option<Vec<String>> {
        None
    }

    fn get_job_tags(&self, _args: &[Param]) -> Option<Vec<String>> {
        None
    }

    fn job_display_name(&self) -> Option<String> {
        None
    }

    fn get_job_display_name(&self, _args: &[Param]) -> Option<String> {
        None
    }

    /// Called once at construction with the adapter, after the declared
    /// properties are applied. The adapter's instance is detached for the
    /// duration of the call.
    fn configure_job(&self, _job: &mut JobDecorator) {}
}
