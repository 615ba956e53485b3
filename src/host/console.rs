//! Console kernel stand-in.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::action::{ActionResult, ClassId};
use crate::container::Container;
use crate::decorators::CommandDecorator;
use crate::error::ActionError;
use crate::probe::{self, CallFrame};

/// Parsed console arguments and options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandInput {
    pub arguments: BTreeMap<String, String>,
    /// Option name to value; flags without a value map to `None`.
    pub options: BTreeMap<String, Option<String>>,
}

impl CommandInput {
    /// Bind raw arguments against a signature such as
    /// `reports:generate {period} {--format=} {--force}`.
    ///
    /// Positional tokens fill `{name}` placeholders in order; `--name` and
    /// `--name=value` tokens become options.
    pub fn parse(signature: &str, args: &[&str]) -> Self {
        let names: Vec<&str> = signature
            .split_whitespace()
            .skip(1)
            .filter_map(|token| token.strip_prefix('{')?.strip_suffix('}'))
            .filter(|name| !name.starts_with("--"))
            .map(|name| name.trim_end_matches('?'))
            .collect();

        let mut input = Self::default();
        let mut positional = names.iter();
        for arg in args {
            if let Some(option) = arg.strip_prefix("--") {
                match option.split_once('=') {
                    Some((name, value)) => {
                        input.options.insert(name.to_string(), Some(value.to_string()));
                    }
                    None => {
                        input.options.insert(option.to_string(), None);
                    }
                }
            } else if let Some(name) = positional.next() {
                input.arguments.insert(name.to_string(), arg.to_string());
            }
        }
        input
    }

    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).map(String::as_str)
    }

    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).and_then(|v| v.as_deref())
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    /// Arguments and options as one JSON object; flags map to `true`.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (name, value) in &self.arguments {
            map.insert(name.clone(), Value::String(value.clone()));
        }
        for (name, value) in &self.options {
            let value = match value {
                Some(v) => Value::String(v.clone()),
                None => Value::Bool(true),
            };
            map.insert(name.clone(), value);
        }
        Value::Object(map)
    }
}

/// Caller object of the console resolution frame.
#[derive(Debug, Clone)]
pub struct CommandResolution {
    pub class: ClassId,
    pub signature: String,
}

type Bootstrapper = Box<dyn FnOnce(&mut ConsoleKernel, &Container) -> Result<(), ActionError> + Send>;

/// Resolves command classes and runs them by name.
#[derive(Default)]
pub struct ConsoleKernel {
    commands: BTreeMap<String, CommandDecorator>,
    bootstrappers: Vec<Bootstrapper>,
}

impl ConsoleKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer work until the kernel boots.
    pub fn starting<F>(&mut self, bootstrapper: F)
    where
        F: FnOnce(&mut ConsoleKernel, &Container) -> Result<(), ActionError> + Send + 'static,
    {
        self.bootstrappers.push(Box::new(bootstrapper));
    }

    /// Run and drop every pending bootstrapper.
    pub fn boot(&mut self, container: &Container) -> Result<(), ActionError> {
        for bootstrapper in std::mem::take(&mut self.bootstrappers) {
            bootstrapper(self, container)?;
        }
        Ok(())
    }

    /// Resolve `class` through the container and register the command it yields.
    pub fn resolve(&mut self, container: &Container, class: &str) -> Result<(), ActionError> {
        let signature = container
            .definition(class)
            .and_then(|d| d.command_signature)
            .ok_or_else(|| ActionError::NotInvokable {
                class: class.to_string(),
                role: "command".to_string(),
            })?;

        let caller = Arc::new(CommandResolution {
            class: ClassId::from(class),
            signature,
        });
        let resolved = probe::within(CallFrame::method(caller, "resolve"), || {
            container.resolve(class)
        })?;

        let command = resolved
            .into_command()
            .ok_or_else(|| ActionError::NotInvokable {
                class: class.to_string(),
                role: "command".to_string(),
            })?;

        log::debug!("Registered command {} -> {}", command.name(), class);
        self.commands.insert(command.name().to_string(), command);
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn command(&self, name: &str) -> Option<&CommandDecorator> {
        self.commands.get(name)
    }

    /// Names of the visible commands.
    pub fn names(&self) -> Vec<&str> {
        self.commands
            .values()
            .filter(|c| !c.is_hidden())
            .map(CommandDecorator::name)
            .collect()
    }

    pub fn call(&self, name: &str, args: &[&str]) -> ActionResult {
        let command = self
            .commands
            .get(name)
            .ok_or_else(|| ActionError::CommandNotFound(name.to_string()))?;
        command.run(&CommandInput::parse(command.signature(), args))
    }
}

impl fmt::Debug for ConsoleKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleKernel")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("pending_bootstrappers", &self.bootstrappers.len())
            .finish()
    }
}
