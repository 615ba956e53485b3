//! Capability markers and the per-class capability set.

use serde::{Deserialize, Serialize};

/// A behavioural marker a class opts into.
///
/// The set is closed: adding a role means adding a variant here and a
/// [`DesignPattern`](crate::patterns::DesignPattern) for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Plain object invoked through the static `run` entry point.
    Object,
    /// HTTP endpoint handler.
    Controller,
    /// Event listener.
    Listener,
    /// Console command.
    Command,
    /// Queued background job.
    Job,
    /// The class can be swapped for a mock.
    Fake,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 6] = [
        Capability::Object,
        Capability::Controller,
        Capability::Listener,
        Capability::Command,
        Capability::Job,
        Capability::Fake,
    ];

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Lowercase name used in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Controller => "controller",
            Self::Listener => "listener",
            Self::Command => "command",
            Self::Job => "job",
            Self::Fake => "fake",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The set of capabilities a class declares.
///
/// Built at compile time so a class can declare it as an associated const:
///
/// ```
/// use role_actions::{Capability, CapabilitySet};
///
/// const CAPS: CapabilitySet = CapabilitySet::of(&[Capability::Controller, Capability::Job]);
/// assert!(CAPS.contains(Capability::Job));
/// assert!(!CAPS.contains(Capability::Command));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build a set from a slice of capabilities.
    pub const fn of(capabilities: &[Capability]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < capabilities.len() {
            bits |= capabilities[i].bit();
            i += 1;
        }
        Self(bits)
    }

    /// Return a copy with `capability` added.
    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    /// Return a copy with `capability` removed.
    pub const fn without(self, capability: Capability) -> Self {
        Self(self.0 & !capability.bit())
    }

    pub const fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate over the members in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

impl std::fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |set, c| set.with(c))
    }
}
