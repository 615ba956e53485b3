//! Job adapter.
//!
//! [`JobDecorator`] lets a plain instance satisfy the queue transport's
//! [`QueueJob`] contract. Policy members (backoff, retry-until, middleware,
//! tags, display name) are read from the instance's [`AsJob`] conventions
//! through one primitive, [`JobDecorator::resolve_from_instance`], with a
//! fixed precedence: getter, then declared property, then default.
//!
//! Plain instances are not durable. Before storage the decorator collapses
//! its live instance to the class id and every entity parameter to a
//! [`Locator`](crate::action::Locator); after reading it re-resolves both
//! through the container. The durable form is [`JobPayload`], which wraps
//! the transport's own [`JobOptions`] without touching them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::{Action, ActionBox, AsJob, ClassId, Param, ReducedParam};
use crate::container::Container;
use crate::error::{ActionError, ContainerError, SerializationError};
use crate::probe::{self, CallFrame};
use crate::queue::QueueJob;

/// Delay before a failed job is retried, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Backoff {
    /// Same delay after every attempt.
    Fixed(u64),
    /// Delay per attempt; the last entry repeats.
    Steps(Vec<u64>),
}

impl Backoff {
    /// Delay after the `attempt`-th failure (1-based).
    pub fn delay_for(&self, attempt: u32) -> u64 {
        match self {
            Self::Fixed(secs) => *secs,
            Self::Steps(steps) => {
                let index = (attempt.max(1) as usize - 1).min(steps.len().saturating_sub(1));
                steps.get(index).copied().unwrap_or(0)
            }
        }
    }
}

/// Queue placement and limits, owned by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    /// Seconds before the job becomes available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_exceptions: Option<u32>,
    /// Seconds the job may run; passed through, not enforced here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
}

impl JobOptions {
    pub fn on_connection(&mut self, connection: impl Into<String>) -> &mut Self {
        self.connection = Some(connection.into());
        self
    }

    pub fn on_queue(&mut self, queue: impl Into<String>) -> &mut Self {
        self.queue = Some(queue.into());
        self
    }

    pub fn delay(&mut self, secs: u64) -> &mut Self {
        self.delay = Some(secs);
        self
    }

    pub fn set_tries(&mut self, tries: u32) -> &mut Self {
        self.tries = Some(tries);
        self
    }

    pub fn set_max_exceptions(&mut self, max_exceptions: u32) -> &mut Self {
        self.max_exceptions = Some(max_exceptions);
        self
    }

    pub fn set_timeout(&mut self, timeout: u32) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Durable form of a [`JobDecorator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub action_class: ClassId,
    pub parameters: Vec<ReducedParam>,
    #[serde(flatten)]
    pub options: JobOptions,
}

impl JobPayload {
    pub fn encode(&self) -> Result<Vec<u8>, SerializationError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SerializationError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Rebuild a live job: resolve the class and every locator.
    pub fn into_job(self, container: &Container) -> Result<JobDecorator, SerializationError> {
        let mut job = JobDecorator {
            action_class: self.action_class,
            action: None,
            parameters: self.parameters.into_iter().map(Param::from).collect(),
            options: self.options,
        };
        job.unserialize_properties(container)?;
        Ok(job)
    }
}

/// Wraps a plain instance as a queued job.
#[derive(Debug)]
pub struct JobDecorator {
    action_class: ClassId,
    /// `None` while collapsed for storage.
    action: Option<ActionBox>,
    parameters: Vec<Param>,
    pub options: JobOptions,
}

impl JobDecorator {
    /// Resolve a fresh instance of `class` and apply its job configuration.
    pub fn new(
        container: &Container,
        class: &str,
        parameters: Vec<Param>,
    ) -> Result<Self, ContainerError> {
        let action = probe::within(CallFrame::static_call::<Self>("new"), || {
            container.make(class)
        })?;

        let mut job = Self {
            action_class: ClassId::from(class),
            action: Some(action),
            parameters,
            options: JobOptions::default(),
        };
        job.constructed();
        Ok(job)
    }

    fn constructed(&mut self) {
        let Some(action) = self.action.take() else {
            return;
        };

        if let Some(job) = action.as_job() {
            if let Some(connection) = job.job_connection() {
                self.options.on_connection(connection);
            }
            if let Some(queue) = job.job_queue() {
                self.options.on_queue(queue);
            }
            if let Some(tries) = job.job_tries() {
                self.options.set_tries(tries);
            }
            if let Some(max_exceptions) = job.job_max_exceptions() {
                self.options.set_max_exceptions(max_exceptions);
            }
            if let Some(timeout) = job.job_timeout() {
                self.options.set_timeout(timeout);
            }

            // The hook sees the adapter without its instance.
            job.configure_job(self);
        }

        self.action = Some(action);
    }

    pub fn action_class(&self) -> &ClassId {
        &self.action_class
    }

    /// The live instance, `None` while collapsed for storage.
    pub fn action(&self) -> Option<&dyn Action> {
        self.action.as_deref()
    }

    pub fn parameters(&self) -> &[Param] {
        &self.parameters
    }

    /// Whether this job wraps an instance of `class`.
    pub fn decorates(&self, class: &str) -> bool {
        self.action_class.as_str() == class
    }

    /// Read a policy value from the instance: `method` (a getter, given the
    /// job parameters) first, then `property`, then `default`.
    pub fn resolve_from_instance<T>(
        &self,
        method: impl FnOnce(&dyn AsJob, &[Param]) -> Option<T>,
        property: impl FnOnce(&dyn AsJob) -> Option<T>,
        default: T,
    ) -> T {
        let Some(job) = self.action.as_deref().and_then(Action::as_job) else {
            return default;
        };
        method(job, &self.parameters)
            .or_else(|| property(job))
            .unwrap_or(default)
    }

    /// Collapse for storage and produce the durable form.
    pub fn to_payload(&mut self) -> JobPayload {
        self.serialize_properties();
        JobPayload {
            action_class: self.action_class.clone(),
            parameters: self.parameters.iter().map(Param::reduce).collect(),
            options: self.options.clone(),
        }
    }

    pub fn from_payload(
        payload: JobPayload,
        container: &Container,
    ) -> Result<Self, SerializationError> {
        payload.into_job(container)
    }
}

impl QueueJob for JobDecorator {
    /// Runs `as_job`, else `handle`. An instance declaring neither yields `None`.
    fn handle(&self) -> Result<Option<Value>, ActionError> {
        let action = self
            .action
            .as_deref()
            .ok_or_else(|| ActionError::NotHydrated(self.action_class.to_string()))?;

        if let Some(result) = action.as_job().and_then(|j| j.as_job(&self.parameters)) {
            return result.map(Some);
        }
        if let Some(result) = action.handle(&self.parameters) {
            return result.map(Some);
        }

        log::warn!("{} declares no job entry point", self.action_class);
        Ok(None)
    }

    fn options(&self) -> &JobOptions {
        &self.options
    }

    fn backoff(&self) -> Option<Backoff> {
        self.resolve_from_instance(
            |j, args| j.get_job_backoff(args).map(Some),
            |j| j.job_backoff().map(Some),
            None,
        )
    }

    fn retry_until(&self) -> Option<DateTime<Utc>> {
        self.resolve_from_instance(
            |j, args| j.get_job_retry_until(args).map(Some),
            |j| j.job_retry_until().map(Some),
            None,
        )
    }

    fn middleware(&self) -> Vec<String> {
        self.resolve_from_instance(
            |j, args| j.get_job_middleware(args),
            |j| j.job_middleware(),
            Vec::new(),
        )
    }

    fn tags(&self) -> Vec<String> {
        self.resolve_from_instance(|j, args| j.get_job_tags(args), |j| j.job_tags(), Vec::new())
    }

    fn display_name(&self) -> String {
        self.resolve_from_instance(
            |j, args| j.get_job_display_name(args),
            |j| j.job_display_name(),
            self.action_class.to_string(),
        )
    }

    fn serialize_properties(&mut self) {
        if self.action.take().is_some() {
            log::debug!("Collapsed {} for storage", self.action_class);
        }
        self.parameters.iter_mut().for_each(Param::collapse);
    }

    fn unserialize_properties(&mut self, container: &Container) -> Result<(), SerializationError> {
        if self.action.is_none() {
            let action = probe::within(CallFrame::static_call::<Self>("unserialize"), || {
                container.make(self.action_class.as_str())
            })
            .map_err(|source| SerializationError::Resolution {
                class: self.action_class.to_string(),
                source,
            })?;
            self.action = Some(action);
        }

        for param in self.parameters.iter_mut() {
            param
                .restore(container)
                .map_err(|(locator, source)| SerializationError::UnresolvableLocator {
                    locator,
                    source,
                })?;
        }

        log::debug!("Rehydrated {}", self.action_class);
        Ok(())
    }
}
