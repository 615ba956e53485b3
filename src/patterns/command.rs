use super::DesignPattern;
use crate::action::{ActionBox, Capability};
use crate::decorators::{CommandDecorator, Resolved};
use crate::host::CommandResolution;
use crate::probe::CallFrame;

/// Recognizes construction by the console kernel's command resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandPattern;

impl DesignPattern for CommandPattern {
    fn capability(&self) -> Capability {
        Capability::Command
    }

    fn recognize_frame(&self, frame: &CallFrame) -> bool {
        frame.matches::<CommandResolution>("resolve")
    }

    fn decorate(&self, instance: ActionBox, frame: &CallFrame) -> Resolved {
        match frame.caller_as::<CommandResolution>() {
            Some(resolution) => {
                Resolved::Command(CommandDecorator::new(instance, resolution.signature.clone()))
            }
            None => Resolved::Action(instance),
        }
    }
}
