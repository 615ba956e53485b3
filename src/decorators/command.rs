use serde_json::Value;

use crate::action::{Action, ActionBox, ActionResult, Param};
use crate::host::CommandInput;

/// Adapts a plain instance to the console's command contract.
#[derive(Debug)]
pub struct CommandDecorator {
    action: ActionBox,
    signature: String,
    description: String,
    hidden: bool,
}

impl CommandDecorator {
    /// `signature` is the declared console signature, e.g. `reports:generate {period}`.
    pub fn new(action: ActionBox, signature: impl Into<String>) -> Self {
        let (description, hidden) = match action.as_command() {
            Some(command) => (
                command
                    .get_command_description()
                    .or_else(|| command.command_description())
                    .unwrap_or_default(),
                command.is_command_hidden(),
            ),
            None => (String::new(), false),
        };

        Self {
            action,
            signature: signature.into(),
            description,
            hidden,
        }
    }

    pub fn action(&self) -> &dyn Action {
        self.action.as_ref()
    }

    pub fn into_action(self) -> ActionBox {
        self.action
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The command name, the first token of the signature.
    pub fn name(&self) -> &str {
        self.signature.split_whitespace().next().unwrap_or_default()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Run the command entry point with parsed console input.
    pub fn run(&self, input: &CommandInput) -> ActionResult {
        if let Some(result) = self.action.as_command().and_then(|c| c.as_command(input)) {
            return result;
        }

        match self.action.handle(&[Param::Value(input.to_value())]) {
            Some(result) => result,
            None => {
                log::warn!("{} declares no command entry point", self.action.class_id());
                Ok(Value::Null)
            }
        }
    }
}
