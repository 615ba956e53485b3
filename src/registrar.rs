//! Route and command registrars.
//!
//! Discovery runs over the container's class catalog; a path selects the
//! classes whose Rust type path lives under that module.

use crate::action::{ActionClass, Capability};
use crate::container::{ClassDefinition, Container};
use crate::host::{ConsoleKernel, Router};

/// Registered classes living under any of `paths`, ordered by class id.
pub fn classes_under<S: AsRef<str>>(container: &Container, paths: &[S]) -> Vec<ClassDefinition> {
    container
        .definitions()
        .into_iter()
        .filter(|d| paths.iter().any(|p| d.is_under(p.as_ref())))
        .collect()
}

/// Let every controller under `paths` declare its routes on `router`.
///
/// Returns the number of classes that declared routes.
pub fn register_routes<S: AsRef<str>>(container: &Container, router: &mut dyn Router, paths: &[S]) -> usize {
    let mut count = 0;
    for definition in classes_under(container, paths) {
        if !definition.capabilities.contains(Capability::Controller) {
            continue;
        }
        if let Some(declare) = definition.routes {
            log::debug!("Registering routes of {}", definition.id);
            declare(router);
            count += 1;
        }
    }
    count
}

pub fn register_routes_for<A: ActionClass>(router: &mut dyn Router) -> bool {
    match A::ROUTES {
        Some(declare) if A::CAPABILITIES.contains(Capability::Controller) => {
            declare(router);
            true
        }
        _ => false,
    }
}

/// Queue every command under `paths` for resolution when `kernel` boots.
///
/// A class qualifies when it declares the command capability and a
/// signature. Returns the number of classes queued.
pub fn register_commands<S: AsRef<str>>(
    container: &Container,
    kernel: &mut ConsoleKernel,
    paths: &[S],
) -> usize {
    let mut count = 0;
    for definition in classes_under(container, paths) {
        if !definition.capabilities.contains(Capability::Command)
            || definition.command_signature.is_none()
        {
            continue;
        }
        let class = definition.id;
        kernel.starting(move |kernel, container| kernel.resolve(container, class.as_str()));
        count += 1;
    }
    count
}

pub fn register_command_for<A: ActionClass>(kernel: &mut ConsoleKernel) -> bool {
    let has_signature = A::command_signature().is_some() || A::COMMAND_SIGNATURE.is_some();
    if !A::CAPABILITIES.contains(Capability::Command) || !has_signature {
        return false;
    }
    kernel.starting(|kernel, container| kernel.resolve(container, A::CLASS));
    true
}
