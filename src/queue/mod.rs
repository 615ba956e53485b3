//! Queue transport contract and an in-memory transport.
//!
//! [`QueueJob`] is the surface a transport expects from anything it stores
//! and runs. The serialize/deserialize pair are the transport's two
//! injection points: called right before a job is written and right after
//! it is read back.

mod dispatch;

use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub use dispatch::{dispatch, dispatch_if, dispatch_sync, dispatch_unless, make_job};

use crate::action::ClassId;
use crate::config::ActionsConfig;
use crate::container::Container;
use crate::decorators::{Backoff, JobDecorator, JobOptions, JobPayload};
use crate::error::{ActionError, QueueError, SerializationError};

/// Queue name used when neither the job nor the transport names one.
pub const DEFAULT_QUEUE: &str = "default";

/// `now` plus `delay` seconds. A delay past the representable range never
/// becomes available.
fn available_after(now: DateTime<Utc>, delay: u64) -> DateTime<Utc> {
    i64::try_from(delay)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// What a queue transport requires from a job.
pub trait QueueJob {
    /// Execution entry point.
    fn handle(&self) -> Result<Option<Value>, ActionError>;

    /// Placement and limits.
    fn options(&self) -> &JobOptions;

    fn tries(&self) -> Option<u32> {
        self.options().tries
    }

    fn max_exceptions(&self) -> Option<u32> {
        self.options().max_exceptions
    }

    fn timeout(&self) -> Option<u32> {
        self.options().timeout
    }

    fn backoff(&self) -> Option<Backoff>;

    fn retry_until(&self) -> Option<DateTime<Utc>>;

    fn middleware(&self) -> Vec<String>;

    fn tags(&self) -> Vec<String>;

    fn display_name(&self) -> String;

    /// Called before the job is written to storage.
    fn serialize_properties(&mut self);

    /// Called after the job is read back from storage.
    fn unserialize_properties(&mut self, container: &Container) -> Result<(), SerializationError>;
}

/// A transport that accepts jobs.
pub trait Queue {
    fn push(&self, job: JobDecorator) -> Result<Uuid, QueueError>;
}

/// A stored job with the metadata the transport read before collapsing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: Uuid,
    pub action_class: ClassId,
    pub display_name: String,
    pub queue: String,
    pub tags: Vec<String>,
    pub attempts: u32,
    pub backoff: Option<Backoff>,
    pub retry_until: Option<DateTime<Utc>>,
    pub available_at: DateTime<Utc>,
    pub pushed_at: DateTime<Utc>,
    pub payload: Vec<u8>,
}

/// Outcome of running one job.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkOutcome {
    /// The job ran; the value is whatever its entry point returned.
    Completed(Option<Value>),
    /// The job failed and was put back with a delay in seconds.
    Released { attempts: u32, delay: u64 },
}

/// In-process transport storing encoded payloads.
#[derive(Debug)]
pub struct InMemoryQueue {
    default_queue: String,
    default_connection: Option<String>,
    jobs: Mutex<VecDeque<QueuedJob>>,
    /// Class and queue of every push, kept for inspection until cleared.
    history: Mutex<Vec<(ClassId, String)>>,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self {
            default_queue: DEFAULT_QUEUE.to_string(),
            default_connection: None,
            jobs: Mutex::new(VecDeque::new()),
            history: Mutex::new(Vec::new()),
        }
    }
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ActionsConfig) -> Self {
        Self {
            default_queue: config
                .default_queue
                .clone()
                .unwrap_or_else(|| DEFAULT_QUEUE.to_string()),
            default_connection: config.default_connection.clone(),
            ..Self::default()
        }
    }

    /// Number of jobs waiting on `queue`, including delayed ones.
    pub fn size(&self, queue: &str) -> usize {
        self.jobs.lock().iter().filter(|j| j.queue == queue).count()
    }

    /// Take the first job on `queue` that is available now.
    pub fn pop(&self, queue: &str) -> Option<QueuedJob> {
        let now = Utc::now();
        let mut jobs = self.jobs.lock();
        let index = jobs
            .iter()
            .position(|j| j.queue == queue && j.available_at <= now)?;
        jobs.remove(index)
    }

    /// Pop, rehydrate and run the next available job on `queue`.
    ///
    /// A failed job is released back while it has attempts left (`tries`
    /// defaults to one); after that the failure is returned.
    pub fn work_next(
        &self,
        container: &Container,
        queue: &str,
    ) -> Option<Result<WorkOutcome, QueueError>> {
        let queued = self.pop(queue)?;
        Some(self.run(container, queued))
    }

    fn run(&self, container: &Container, mut queued: QueuedJob) -> Result<WorkOutcome, QueueError> {
        if queued.retry_until.is_some_and(|until| Utc::now() > until) {
            return Err(QueueError::Expired(queued.display_name));
        }

        let payload = JobPayload::decode(&queued.payload)?;
        let tries = payload.options.tries.unwrap_or(1);
        let job = payload.into_job(container)?;

        queued.attempts += 1;
        match job.handle() {
            Ok(value) => Ok(WorkOutcome::Completed(value)),
            Err(source) if queued.attempts < tries => {
                let attempts = queued.attempts;
                let delay = queued
                    .backoff
                    .as_ref()
                    .map_or(0, |b| b.delay_for(attempts));
                log::warn!(
                    "{} failed on attempt {}/{}: {}; releasing for {}s",
                    queued.display_name,
                    attempts,
                    tries,
                    source,
                    delay
                );
                queued.available_at = available_after(Utc::now(), delay);
                self.jobs.lock().push_back(queued);
                Ok(WorkOutcome::Released { attempts, delay })
            }
            Err(source) => Err(QueueError::Failed {
                display_name: queued.display_name,
                attempts: queued.attempts,
                source,
            }),
        }
    }

    /// Forget the push history behind `pushed_count` and `pushed_on`.
    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    /// How many jobs wrapping `class` were pushed since the history was last cleared.
    pub fn pushed_count(&self, class: &str) -> usize {
        self.history
            .lock()
            .iter()
            .filter(|(c, _)| c.as_str() == class)
            .count()
    }

    /// How many jobs wrapping `class` were pushed onto `queue`.
    pub fn pushed_on(&self, queue: &str, class: &str) -> usize {
        self.history
            .lock()
            .iter()
            .filter(|(c, q)| c.as_str() == class && q == queue)
            .count()
    }
}

impl Queue for InMemoryQueue {
    fn push(&self, mut job: JobDecorator) -> Result<Uuid, QueueError> {
        if job.options.queue.is_none() {
            job.options.on_queue(self.default_queue.clone());
        }
        if job.options.connection.is_none() {
            if let Some(connection) = &self.default_connection {
                job.options.on_connection(connection.clone());
            }
        }

        // Policy members need the live instance; read them before collapsing.
        let display_name = job.display_name();
        let tags = job.tags();
        let backoff = job.backoff();
        let retry_until = job.retry_until();
        let queue = job.options.queue.clone().unwrap_or_default();
        let delay = job.options.delay.unwrap_or(0);

        let payload = job.to_payload().encode()?;
        let now = Utc::now();
        let queued = QueuedJob {
            id: Uuid::new_v4(),
            action_class: job.action_class().clone(),
            display_name,
            queue: queue.clone(),
            tags,
            attempts: 0,
            backoff,
            retry_until,
            available_at: available_after(now, delay),
            pushed_at: now,
            payload,
        };
        let id = queued.id;

        log::debug!("Pushed {} ({}) onto {}", queued.display_name, id, queue);
        self.history.lock().push((queued.action_class.clone(), queue));
        self.jobs.lock().push_back(queued);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionClass, Param};
    use crate::fixtures::{
        container_with_users, FlakyJob, GenerateReport, PublishPost, SendWelcomeEmail, User,
    };
    use serde_json::json;

    #[test]
    fn test_push_then_work_round_trips_through_storage() {
        let container = container_with_users();
        let queue = InMemoryQueue::new();
        let job = JobDecorator::new(
            &container,
            SendWelcomeEmail::CLASS,
            vec![Param::entity(User::new(3, "linus"))],
        )
        .unwrap();

        queue.push(job).unwrap();
        assert_eq!(queue.size(DEFAULT_QUEUE), 1);

        let outcome = queue.work_next(&container, DEFAULT_QUEUE).unwrap().unwrap();
        assert_eq!(outcome, WorkOutcome::Completed(Some(json!({"emailed": "linus"}))));
        assert_eq!(queue.size(DEFAULT_QUEUE), 0);
        assert!(queue.work_next(&container, DEFAULT_QUEUE).is_none());
    }

    #[test]
    fn test_push_records_metadata_from_live_instance() {
        let container = container_with_users();
        let queue = InMemoryQueue::new();
        let job = JobDecorator::new(&container, PublishPost::CLASS, vec![Param::Value(json!(12))])
            .unwrap();

        queue.push(job).unwrap();
        let queued = queue.pop("publishing").unwrap();
        assert_eq!(queued.display_name, "Publish post 12");
        assert_eq!(queued.tags, vec!["post:12".to_string()]);
        assert_eq!(queue.pushed_on("publishing", PublishPost::CLASS), 1);
        assert_eq!(queue.pushed_count(PublishPost::CLASS), 1);
    }

    #[test]
    fn test_delayed_job_is_not_available_yet() {
        let container = container_with_users();
        let queue = InMemoryQueue::new();
        // GenerateReport configures a 30 second delay.
        queue
            .push(JobDecorator::new(&container, GenerateReport::CLASS, vec![]).unwrap())
            .unwrap();

        assert_eq!(queue.size(DEFAULT_QUEUE), 1);
        assert!(queue.pop(DEFAULT_QUEUE).is_none());
    }

    #[test]
    fn test_out_of_range_delay_is_never_available() {
        let container = container_with_users();
        let queue = InMemoryQueue::new();

        for delay in [u64::MAX, 10_000_000_000_000_000] {
            let mut job = JobDecorator::new(&container, SendWelcomeEmail::CLASS, vec![]).unwrap();
            job.options.delay(delay);
            queue.push(job).unwrap();
        }

        assert_eq!(queue.size(DEFAULT_QUEUE), 2);
        assert!(queue.pop(DEFAULT_QUEUE).is_none());
    }

    #[test]
    fn test_available_after_saturates() {
        let now = Utc::now();
        assert_eq!(available_after(now, 0), now);
        assert_eq!(available_after(now, 60), now + TimeDelta::seconds(60));
        assert_eq!(available_after(now, u64::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(available_after(now, i64::MAX as u64), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_clear_history() {
        let container = container_with_users();
        let queue = InMemoryQueue::new();
        queue
            .push(JobDecorator::new(&container, SendWelcomeEmail::CLASS, vec![]).unwrap())
            .unwrap();
        assert_eq!(queue.pushed_count(SendWelcomeEmail::CLASS), 1);

        queue.clear_history();
        assert_eq!(queue.pushed_count(SendWelcomeEmail::CLASS), 0);
        assert_eq!(queue.size(DEFAULT_QUEUE), 1);
    }

    #[test]
    fn test_failed_job_is_released_until_tries_exhausted() {
        let container = container_with_users();
        let queue = InMemoryQueue::new();
        queue
            .push(JobDecorator::new(&container, FlakyJob::CLASS, vec![]).unwrap())
            .unwrap();

        let first = queue.work_next(&container, DEFAULT_QUEUE).unwrap().unwrap();
        assert_eq!(first, WorkOutcome::Released { attempts: 1, delay: 0 });

        let second = queue.work_next(&container, DEFAULT_QUEUE).unwrap();
        match second {
            Err(QueueError::Failed { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults_from_config() {
        let config = ActionsConfig {
            default_queue: Some("low".to_string()),
            default_connection: Some("sqs".to_string()),
            ..ActionsConfig::default()
        };
        let container = container_with_users();
        let queue = InMemoryQueue::from_config(&config);
        queue
            .push(JobDecorator::new(&container, SendWelcomeEmail::CLASS, vec![]).unwrap())
            .unwrap();

        let queued = queue.pop("low").unwrap();
        let payload = JobPayload::decode(&queued.payload).unwrap();
        assert_eq!(payload.options.connection.as_deref(), Some("sqs"));
    }
}
