//! Dependency container.
//!
//! Stand-in for the host runtime's container, reduced to the extension
//! points the role engine needs:
//!
//! - class definitions with a factory per construction point,
//! - `extend`: run a transform over every future construction of a class,
//! - `before_resolving`: observe a construction point before it is built,
//! - entity resolvers, used to turn [`Locator`]s back into live objects,
//! - fake bindings, so a class can be swapped for a [`MockAction`].

pub mod fake;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

pub use fake::{MockAction, MockHandle};

use crate::action::{ActionBox, ActionClass, CapabilitySet, ClassId, Entity, Locator};
use crate::decorators::Resolved;
use crate::error::ContainerError;
use crate::host::Router;
use fake::MockState;

/// Builds a fresh plain instance.
pub type ClassFactory = Arc<dyn Fn(&Container) -> Result<ActionBox, ContainerError> + Send + Sync>;

/// Transform applied to every construction of an intercepted class.
pub type Extender = Arc<dyn Fn(Resolved, &Container) -> Resolved + Send + Sync>;

/// Observer called with the construction point before anything is built.
pub type BeforeResolvingHook = Arc<dyn Fn(&str, &Container) + Send + Sync>;

/// Looks an entity up by locator. `None` means not found.
pub type EntityResolver = Arc<dyn Fn(&Locator) -> Option<Arc<dyn Entity>> + Send + Sync>;

/// Everything the container knows about one action class.
#[derive(Clone)]
pub struct ClassDefinition {
    pub id: ClassId,
    /// Full Rust type path of the class, used for path-scoped discovery.
    pub type_path: &'static str,
    pub capabilities: CapabilitySet,
    pub routes: Option<fn(&mut dyn Router)>,
    pub command_signature: Option<String>,
    factory: ClassFactory,
}

impl ClassDefinition {
    /// Definition for a statically declared action class.
    pub fn of<A: ActionClass>() -> Self {
        Self {
            id: ClassId::from(A::CLASS),
            type_path: std::any::type_name::<A>(),
            capabilities: A::CAPABILITIES,
            routes: A::ROUTES,
            command_signature: A::command_signature()
                .or_else(|| A::COMMAND_SIGNATURE.map(String::from)),
            factory: Arc::new(|container: &Container| -> Result<ActionBox, ContainerError> {
                Ok(Box::new(A::make(container)?))
            }),
        }
    }

    /// True when the class lives under the module path `path`.
    pub fn is_under(&self, path: &str) -> bool {
        let path = path.trim_end_matches("::");
        match self.type_path.strip_prefix(path) {
            Some(rest) => rest.starts_with("::"),
            None => false,
        }
    }
}

impl fmt::Debug for ClassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDefinition")
            .field("id", &self.id)
            .field("type_path", &self.type_path)
            .field("capabilities", &self.capabilities)
            .field("has_routes", &self.routes.is_some())
            .field("command_signature", &self.command_signature)
            .finish()
    }
}

/// The dependency container.
#[derive(Default)]
pub struct Container {
    classes: RwLock<HashMap<ClassId, ClassDefinition>>,
    extenders: RwLock<HashMap<ClassId, Vec<Extender>>>,
    before_resolving: RwLock<Vec<BeforeResolvingHook>>,
    entities: RwLock<HashMap<String, EntityResolver>>,
    fakes: DashMap<ClassId, Arc<MockState>>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a statically declared action class.
    pub fn register<A: ActionClass>(&self) -> &Self {
        self.bind(ClassDefinition::of::<A>())
    }

    /// Register a class definition, replacing any previous one with the same id.
    pub fn bind(&self, definition: ClassDefinition) -> &Self {
        log::debug!("Binding {} ({})", definition.id, definition.type_path);
        self.classes.write().insert(definition.id.clone(), definition);
        self
    }

    pub fn has(&self, class: &str) -> bool {
        self.classes.read().contains_key(class)
    }

    pub fn definition(&self, class: &str) -> Option<ClassDefinition> {
        self.classes.read().get(class).cloned()
    }

    /// All definitions, ordered by class id.
    pub fn definitions(&self) -> Vec<ClassDefinition> {
        let mut definitions: Vec<_> = self.classes.read().values().cloned().collect();
        definitions.sort_by(|a, b| a.id.cmp(&b.id));
        definitions
    }

    /// Run `extender` over every future construction of `class`.
    pub fn extend<F>(&self, class: &str, extender: F)
    where
        F: Fn(Resolved, &Container) -> Resolved + Send + Sync + 'static,
    {
        self.extenders
            .write()
            .entry(ClassId::from(class))
            .or_default()
            .push(Arc::new(extender));
    }

    /// Number of extenders installed for `class`.
    pub fn extender_count(&self, class: &str) -> usize {
        self.extenders.read().get(class).map_or(0, Vec::len)
    }

    pub fn before_resolving<F>(&self, hook: F)
    where
        F: Fn(&str, &Container) + Send + Sync + 'static,
    {
        self.before_resolving.write().push(Arc::new(hook));
    }

    /// Build `class` and pass the result through its extenders.
    pub fn resolve(&self, class: &str) -> Result<Resolved, ContainerError> {
        // Hooks and factories may call back into the container, so no lock is
        // held while they run.
        let hooks = self.before_resolving.read().clone();
        for hook in &hooks {
            hook(class, self);
        }

        let factory = self
            .classes
            .read()
            .get(class)
            .map(|d| Arc::clone(&d.factory))
            .ok_or_else(|| ContainerError::ClassNotFound(class.to_string()))?;
        let instance = factory(self)?;

        let extenders = self.extenders.read().get(class).cloned().unwrap_or_default();
        let resolved = extenders
            .iter()
            .fold(Resolved::Action(instance), |resolved, extender| {
                extender(resolved, self)
            });

        log::debug!("Resolved {} as {}", class, resolved.role_name());
        Ok(resolved)
    }

    /// Build `class` and unwrap whatever role it was decorated with.
    pub fn make(&self, class: &str) -> Result<ActionBox, ContainerError> {
        Ok(self.resolve(class)?.into_action())
    }

    /// Bind the resolver used to re-resolve locators of `kind`.
    pub fn bind_entity<F>(&self, kind: impl Into<String>, resolver: F) -> &Self
    where
        F: Fn(&Locator) -> Option<Arc<dyn Entity>> + Send + Sync + 'static,
    {
        self.entities.write().insert(kind.into(), Arc::new(resolver));
        self
    }

    pub fn resolve_entity(&self, locator: &Locator) -> Result<Arc<dyn Entity>, ContainerError> {
        let resolver = self
            .entities
            .read()
            .get(&locator.kind)
            .cloned()
            .ok_or_else(|| ContainerError::NoEntityResolver(locator.kind.clone()))?;

        resolver(locator).ok_or_else(|| ContainerError::EntityNotFound {
            kind: locator.kind.clone(),
            key: locator.key.to_string(),
        })
    }

    /// Swap `class` for a mock. Every construction while the fake is active
    /// yields a [`MockAction`] sharing the returned handle's state.
    pub fn mock(&self, class: &str) -> Result<MockHandle, ContainerError> {
        let definition = self
            .definition(class)
            .ok_or_else(|| ContainerError::ClassNotFound(class.to_string()))?;

        let state = Arc::new(MockState::new(
            definition.id.clone(),
            definition.capabilities,
        ));
        self.fakes.insert(definition.id, Arc::clone(&state));
        Ok(MockHandle::new(state))
    }

    pub fn is_fake(&self, class: &str) -> bool {
        self.fakes.contains_key(class)
    }

    pub fn clear_fake(&self, class: &str) {
        self.fakes.remove(class);
    }

    /// A fresh mock instance for `class`, if it is faked.
    pub fn make_mock(&self, class: &str) -> Option<ActionBox> {
        let state = self.fakes.get(class).map(|entry| Arc::clone(entry.value()))?;
        Some(Box::new(MockAction::new(state)))
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("classes", &self.classes.read().len())
            .field("entities", &self.entities.read().len())
            .field("fakes", &self.fakes.len())
            .finish()
    }
}
