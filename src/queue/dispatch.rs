//! Dispatch helpers for job-capable action classes.

use serde_json::Value;
use uuid::Uuid;

use super::{Queue, QueueJob};
use crate::action::{ActionClass, Param};
use crate::container::Container;
use crate::decorators::JobDecorator;
use crate::error::{ActionError, ContainerError, QueueError};

/// Wrap a fresh instance of `A` as a job.
pub fn make_job<A: ActionClass>(
    container: &Container,
    parameters: Vec<Param>,
) -> Result<JobDecorator, ContainerError> {
    JobDecorator::new(container, A::CLASS, parameters)
}

/// Wrap `A` as a job and push it onto `queue`.
pub fn dispatch<A: ActionClass>(
    container: &Container,
    queue: &dyn Queue,
    parameters: Vec<Param>,
) -> Result<Uuid, QueueError> {
    queue.push(make_job::<A>(container, parameters)?)
}

pub fn dispatch_if<A: ActionClass>(
    condition: bool,
    container: &Container,
    queue: &dyn Queue,
    parameters: Vec<Param>,
) -> Result<Option<Uuid>, QueueError> {
    if !condition {
        return Ok(None);
    }
    dispatch::<A>(container, queue, parameters).map(Some)
}

pub fn dispatch_unless<A: ActionClass>(
    condition: bool,
    container: &Container,
    queue: &dyn Queue,
    parameters: Vec<Param>,
) -> Result<Option<Uuid>, QueueError> {
    dispatch_if::<A>(!condition, container, queue, parameters)
}

/// Run `A` as a job immediately, without going through storage.
pub fn dispatch_sync<A: ActionClass>(
    container: &Container,
    parameters: Vec<Param>,
) -> Result<Option<Value>, ActionError> {
    make_job::<A>(container, parameters)?.handle()
}
