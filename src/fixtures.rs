//! Action classes shared by the unit tests.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use serde_json::{json, Value};

use crate::action::{
    Action, ActionClass, ActionResult, AsCommand, AsController, AsJob, AsListener, Capability,
    CapabilitySet, Entity, Locator, Param,
};
use crate::action_meta;
use crate::container::Container;
use crate::decorators::{Backoff, JobDecorator};
use crate::error::{ActionError, ContainerError};
use crate::host::{CommandInput, Event, Method, Request, Route, Router};

fn first_value(args: &[Param]) -> Value {
    args.first().and_then(Param::as_value).cloned().unwrap_or(Value::Null)
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
}

impl User {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl Entity for User {
    fn locator(&self) -> Locator {
        Locator::new("user", self.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Container with every fixture registered and users 1, 3 and 7 stored.
pub fn container_with_users() -> Container {
    let users: HashMap<u64, User> = [(1, "grace"), (3, "linus"), (7, "ada")]
        .into_iter()
        .map(|(id, name)| (id, User::new(id, name)))
        .collect();

    let container = Container::new();
    container
        .register::<PublishPost>()
        .register::<GenerateReport>()
        .register::<SendWelcomeEmail>()
        .register::<PruneUsers>()
        .register::<BareJob>()
        .register::<FlakyJob>()
        .register::<ImportFeed>()
        .register::<RequiresSecret>();
    container.bind_entity("user", move |locator| {
        let user = users.get(&locator.key.as_u64()?)?;
        Some(Arc::new(user.clone()) as Arc<dyn Entity>)
    });
    container
}

/// Controller and job; fakeable.
#[derive(Debug, Default)]
pub struct PublishPost;

impl PublishPost {
    fn routes(router: &mut dyn Router) {
        router.add_route(
            Route::new(Method::Post, "/posts/{post}/publish", Self::CLASS).name("posts.publish"),
        );
    }
}

impl ActionClass for PublishPost {
    const CLASS: &'static str = "posts.publish";
    const CAPABILITIES: CapabilitySet =
        CapabilitySet::of(&[Capability::Controller, Capability::Job, Capability::Fake]);
    const ROUTES: Option<fn(&mut dyn Router)> = Some(Self::routes);

    fn make(_container: &Container) -> Result<Self, ContainerError> {
        Ok(Self)
    }
}

impl Action for PublishPost {
    action_meta!();

    fn handle(&self, args: &[Param]) -> Option<ActionResult> {
        let input = first_value(args);
        let post = input.get("post").cloned().unwrap_or(input);
        Some(Ok(json!({ "published": post })))
    }

    fn as_controller(&self) -> Option<&dyn AsController> {
        Some(self)
    }

    fn as_job(&self) -> Option<&dyn AsJob> {
        Some(self)
    }
}

impl AsController for PublishPost {
    fn authorize(&self, request: &Request) -> bool {
        request.input("user") != Some(&json!("guest"))
    }

    fn validate(&self, request: &Request) -> Result<(), Vec<String>> {
        match request.all().get("post") {
            Some(_) => Ok(()),
            None => Err(vec!["post is required".to_string()]),
        }
    }

    fn get_controller_middleware(&self) -> Vec<String> {
        vec!["auth".to_string()]
    }
}

impl AsJob for PublishPost {
    fn as_job(&self, args: &[Param]) -> Option<ActionResult> {
        Some(Ok(json!({ "queued_publish": first_value(args) })))
    }

    fn job_queue(&self) -> Option<String> {
        Some("publishing".to_string())
    }

    fn job_tags(&self) -> Option<Vec<String>> {
        Some(vec!["posts".to_string()])
    }

    fn get_job_tags(&self, args: &[Param]) -> Option<Vec<String>> {
        let post = args.first()?.as_value()?;
        Some(vec![format!("post:{post}")])
    }

    fn get_job_display_name(&self, args: &[Param]) -> Option<String> {
        let post = args.first()?.as_value()?;
        Some(format!("Publish post {post}"))
    }
}

/// Object, command and job; declares job properties but no getters.
#[derive(Debug)]
pub struct GenerateReport {
    default_period: &'static str,
}

impl Default for GenerateReport {
    fn default() -> Self {
        Self {
            default_period: "monthly",
        }
    }
}

impl ActionClass for GenerateReport {
    const CLASS: &'static str = "reports.generate";
    const CAPABILITIES: CapabilitySet =
        CapabilitySet::of(&[Capability::Object, Capability::Job, Capability::Command]);
    const COMMAND_SIGNATURE: Option<&'static str> = Some("reports:generate {period} {--format=}");

    fn make(_container: &Container) -> Result<Self, ContainerError> {
        Ok(Self::default())
    }
}

impl Action for GenerateReport {
    action_meta!();

    fn handle(&self, args: &[Param]) -> Option<ActionResult> {
        let input = first_value(args);
        let period = input
            .get("period")
            .and_then(Value::as_str)
            .unwrap_or(self.default_period);
        Some(Ok(json!({ "report": period })))
    }

    fn as_command(&self) -> Option<&dyn AsCommand> {
        Some(self)
    }

    fn as_job(&self) -> Option<&dyn AsJob> {
        Some(self)
    }
}

impl AsCommand for GenerateReport {
    fn as_command(&self, input: &CommandInput) -> Option<ActionResult> {
        Some(Ok(json!({
            "report": input.argument("period").unwrap_or(self.default_period),
            "format": input.option("format").unwrap_or("pdf"),
            "via": "command",
        })))
    }

    fn command_description(&self) -> Option<String> {
        Some("Generate a report for a period".to_string())
    }
}

impl AsJob for GenerateReport {
    fn job_connection(&self) -> Option<String> {
        Some("redis".to_string())
    }

    fn job_max_exceptions(&self) -> Option<u32> {
        Some(2)
    }

    fn job_timeout(&self) -> Option<u32> {
        Some(120)
    }

    fn job_backoff(&self) -> Option<Backoff> {
        Some(Backoff::Fixed(5))
    }

    fn job_tags(&self) -> Option<Vec<String>> {
        Some(vec!["reports".to_string()])
    }

    fn configure_job(&self, job: &mut JobDecorator) {
        job.options.delay(30);
    }
}

/// Listener and job; its job entry point is `handle`.
#[derive(Debug)]
pub struct SendWelcomeEmail;

impl ActionClass for SendWelcomeEmail {
    const CLASS: &'static str = "emails.welcome";
    const CAPABILITIES: CapabilitySet = CapabilitySet::of(&[Capability::Listener, Capability::Job]);

    fn make(_container: &Container) -> Result<Self, ContainerError> {
        Ok(Self)
    }
}

impl Action for SendWelcomeEmail {
    action_meta!();

    fn handle(&self, args: &[Param]) -> Option<ActionResult> {
        let user = args.iter().find_map(Param::as_entity::<User>);
        Some(match user {
            Some(user) => Ok(json!({ "emailed": user.name })),
            None => Err(ActionError::Other(anyhow!("no recipient given"))),
        })
    }

    fn as_listener(&self) -> Option<&dyn AsListener> {
        Some(self)
    }

    fn as_job(&self) -> Option<&dyn AsJob> {
        Some(self)
    }
}

impl AsListener for SendWelcomeEmail {
    fn as_listener(&self, event: &Event) -> Option<ActionResult> {
        Some(Ok(json!({ "welcomed": event.payload["user"] })))
    }
}

impl AsJob for SendWelcomeEmail {}

/// Hidden command whose signature comes from a getter.
#[derive(Debug)]
pub struct PruneUsers;

impl ActionClass for PruneUsers {
    const CLASS: &'static str = "users.prune";
    const CAPABILITIES: CapabilitySet = CapabilitySet::of(&[Capability::Command]);

    fn command_signature() -> Option<String> {
        Some("users:prune {days}".to_string())
    }

    fn make(_container: &Container) -> Result<Self, ContainerError> {
        Ok(Self)
    }
}

impl Action for PruneUsers {
    action_meta!();

    fn handle(&self, args: &[Param]) -> Option<ActionResult> {
        Some(Ok(json!({ "pruned_older_than": first_value(args)["days"] })))
    }

    fn as_command(&self) -> Option<&dyn AsCommand> {
        Some(self)
    }
}

impl AsCommand for PruneUsers {
    fn is_command_hidden(&self) -> bool {
        true
    }
}

/// Declares the job capability and nothing else.
#[derive(Debug)]
pub struct BareJob;

impl ActionClass for BareJob {
    const CLASS: &'static str = "jobs.bare";
    const CAPABILITIES: CapabilitySet = CapabilitySet::of(&[Capability::Job]);

    fn make(_container: &Container) -> Result<Self, ContainerError> {
        Ok(Self)
    }
}

impl Action for BareJob {
    action_meta!();
}

/// Always fails; allows two attempts.
#[derive(Debug)]
pub struct FlakyJob;

impl ActionClass for FlakyJob {
    const CLASS: &'static str = "jobs.flaky";
    const CAPABILITIES: CapabilitySet = CapabilitySet::of(&[Capability::Job]);

    fn make(_container: &Container) -> Result<Self, ContainerError> {
        Ok(Self)
    }
}

impl Action for FlakyJob {
    action_meta!();

    fn handle(&self, _args: &[Param]) -> Option<ActionResult> {
        Some(Err(ActionError::Other(anyhow!("upstream unavailable"))))
    }

    fn as_job(&self) -> Option<&dyn AsJob> {
        Some(self)
    }
}

impl AsJob for FlakyJob {
    fn job_tries(&self) -> Option<u32> {
        Some(2)
    }
}

/// Picks its queue from its parameters while being configured.
#[derive(Debug)]
pub struct ImportFeed;

impl ActionClass for ImportFeed {
    const CLASS: &'static str = "feeds.import";
    const CAPABILITIES: CapabilitySet = CapabilitySet::of(&[Capability::Job]);

    fn make(_container: &Container) -> Result<Self, ContainerError> {
        Ok(Self)
    }
}

impl Action for ImportFeed {
    action_meta!();

    fn as_job(&self) -> Option<&dyn AsJob> {
        Some(self)
    }
}

impl AsJob for ImportFeed {
    fn job_queue(&self) -> Option<String> {
        Some("imports".to_string())
    }

    fn configure_job(&self, job: &mut JobDecorator) {
        let urgent = job.decorates(Self::CLASS)
            && first_value(job.parameters())["priority"] == json!("high");
        if urgent {
            job.options.on_queue("imports-high").set_tries(3);
        }
    }
}

/// Its factory always fails.
#[derive(Debug)]
pub struct RequiresSecret;

impl ActionClass for RequiresSecret {
    const CLASS: &'static str = "secrets.require";
    const CAPABILITIES: CapabilitySet = CapabilitySet::of(&[Capability::Object, Capability::Job]);

    fn make(_container: &Container) -> Result<Self, ContainerError> {
        Err(ContainerError::Factory {
            class: Self::CLASS.to_string(),
            source: anyhow!("SECRET is not configured"),
        })
    }
}

impl Action for RequiresSecret {
    action_meta!();
}
