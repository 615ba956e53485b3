//! Role registry.
//!
//! The [`RoleRegistry`] owns the ordered pattern set and decides, per
//! construction point, whether the container should route constructions
//! through [`RoleRegistry::decorate`]. Installation is idempotent: the
//! installation record is checked and updated under one lock, so a point is
//! never extended twice and no instance is double-wrapped.
//!
//! At decoration time the registry swaps faked classes for their mock,
//! captures the call context through its [`ContextProbe`], and asks the
//! [`CapabilityMatcher`] which role is active. No match is a valid outcome:
//! the plain instance is returned as-is.

mod matcher;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

pub use matcher::{CapabilityMatcher, Match, DEFAULT_PROBE_DEPTH};

use crate::action::{ActionBox, Capability, CapabilitySet, ClassId};
use crate::config::ActionsConfig;
use crate::container::Container;
use crate::decorators::Resolved;
use crate::patterns::{default_patterns, pattern_for, DesignPattern};
use crate::probe::{ContextProbe, ThreadStackProbe};

pub struct RoleRegistry {
    matcher: RwLock<CapabilityMatcher>,
    /// Construction points already intercepted.
    installed: Mutex<HashSet<ClassId>>,
    probe: Arc<dyn ContextProbe>,
    probe_depth: usize,
}

impl RoleRegistry {
    /// Registry over `patterns`, in tie-break order.
    pub fn new(patterns: Vec<Arc<dyn DesignPattern>>) -> Self {
        Self {
            matcher: RwLock::new(CapabilityMatcher::new(patterns)),
            installed: Mutex::new(HashSet::new()),
            probe: Arc::new(ThreadStackProbe),
            probe_depth: DEFAULT_PROBE_DEPTH,
        }
    }

    pub fn with_default_patterns() -> Self {
        Self::new(default_patterns())
    }

    pub fn from_config(config: &ActionsConfig) -> Self {
        let patterns = config.patterns.iter().filter_map(|c| pattern_for(*c)).collect();
        Self::new(patterns).with_probe_depth(config.probe_depth)
    }

    /// Replace the call context source.
    pub fn with_probe(mut self, probe: Arc<dyn ContextProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_probe_depth(mut self, depth: usize) -> Self {
        self.probe_depth = depth;
        self
    }

    pub fn probe_depth(&self) -> usize {
        self.probe_depth
    }

    /// Replace the registered patterns.
    pub fn set_patterns(&self, patterns: Vec<Arc<dyn DesignPattern>>) {
        *self.matcher.write() = CapabilityMatcher::new(patterns);
    }

    pub fn patterns(&self) -> Vec<Arc<dyn DesignPattern>> {
        self.matcher.read().patterns().to_vec()
    }

    /// Registered patterns applicable to `capabilities`, in order.
    pub fn patterns_matching(&self, capabilities: CapabilitySet) -> Vec<Arc<dyn DesignPattern>> {
        self.matcher.read().matching(capabilities)
    }

    /// Whether constructions of `point` need to pass through decoration: the
    /// class declares a capability with a registered pattern, or is fakeable.
    pub fn should_install(&self, container: &Container, point: &str) -> bool {
        let Some(definition) = container.definition(point) else {
            return false;
        };
        definition.capabilities.contains(Capability::Fake)
            || !self.patterns_matching(definition.capabilities).is_empty()
    }

    pub fn is_intercepting(&self, point: &str) -> bool {
        self.installed.lock().contains(point)
    }

    /// Route every future construction of `point` through [`decorate`].
    ///
    /// Returns `true` when interception was installed by this call; a point
    /// already intercepted, or one that does not need it, is left untouched.
    ///
    /// [`decorate`]: RoleRegistry::decorate
    pub fn install_interception(self: &Arc<Self>, container: &Container, point: &str) -> bool {
        let mut installed = self.installed.lock();
        if installed.contains(point) || !self.should_install(container, point) {
            return false;
        }

        let registry = Arc::clone(self);
        container.extend(point, move |resolved, container| match resolved {
            Resolved::Action(instance) => registry.decorate(instance, container),
            decorated => decorated,
        });
        installed.insert(ClassId::from(point));

        log::debug!("Intercepting constructions of {}", point);
        true
    }

    /// Install interception for every registered class that needs it.
    pub fn install_all(self: &Arc<Self>, container: &Container) -> usize {
        container
            .definitions()
            .iter()
            .filter(|d| self.install_interception(container, d.id.as_str()))
            .count()
    }

    /// Install interception lazily, the first time each point is resolved.
    pub fn attach(self: &Arc<Self>, container: &Container) {
        let registry = Arc::clone(self);
        container.before_resolving(move |point, container| {
            if !registry.is_intercepting(point) {
                registry.install_interception(container, point);
            }
        });
    }

    /// Wrap `instance` for the role active in the current call context.
    pub fn decorate(&self, instance: ActionBox, container: &Container) -> Resolved {
        self.decorate_with_depth(instance, container, self.probe_depth)
    }

    pub fn decorate_with_depth(
        &self,
        instance: ActionBox,
        container: &Container,
        depth: usize,
    ) -> Resolved {
        let instance = self.substitute_fake(instance, container);

        let frames = self.probe.capture(depth);
        let found = self
            .matcher
            .read()
            .identify(instance.capabilities(), &frames, depth);

        match found {
            Some(Match { pattern, frame }) => {
                log::debug!(
                    "{} identified as {} at {}",
                    instance.class_id(),
                    pattern.capability(),
                    frame.function_name()
                );
                pattern.decorate(instance, frame)
            }
            None => Resolved::Action(instance),
        }
    }

    /// Mocks replace the instance before matching and are never wrapped twice.
    fn substitute_fake(&self, instance: ActionBox, container: &Container) -> ActionBox {
        if !instance.capabilities().contains(Capability::Fake) {
            return instance;
        }
        match container.make_mock(instance.class_id()) {
            Some(mock) => {
                log::debug!("Substituted mock for {}", instance.class_id());
                mock
            }
            None => instance,
        }
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::with_default_patterns()
    }
}

impl fmt::Debug for RoleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleRegistry")
            .field("patterns", &self.matcher.read().patterns())
            .field("installed", &self.installed.lock().len())
            .field("probe_depth", &self.probe_depth)
            .finish()
    }
}
