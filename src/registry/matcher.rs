//! Capability matcher.
//!
//! Pure function over a declared capability set and a captured frame
//! sequence; it never touches the container or the probe.

use std::sync::Arc;

use crate::action::CapabilitySet;
use crate::patterns::DesignPattern;
use crate::probe::CallFrame;

/// Default number of frames inspected.
pub const DEFAULT_PROBE_DEPTH: usize = 10;

/// A recognized role: the pattern and the frame it recognized.
#[derive(Debug)]
pub struct Match<'a> {
    pub pattern: Arc<dyn DesignPattern>,
    pub frame: &'a CallFrame,
}

/// Ordered pattern set. Registration order is the tie-break.
#[derive(Debug, Clone, Default)]
pub struct CapabilityMatcher {
    patterns: Vec<Arc<dyn DesignPattern>>,
}

impl CapabilityMatcher {
    pub fn new(patterns: Vec<Arc<dyn DesignPattern>>) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &[Arc<dyn DesignPattern>] {
        &self.patterns
    }

    /// Patterns whose capability is in `capabilities`, in registration order.
    pub fn matching(&self, capabilities: CapabilitySet) -> Vec<Arc<dyn DesignPattern>> {
        self.patterns
            .iter()
            .filter(|p| capabilities.contains(p.capability()))
            .cloned()
            .collect()
    }

    /// Walk `frames` innermost first, at most `max_depth` of them, and return
    /// the first frame some candidate pattern recognizes. Within a frame the
    /// earliest registered pattern wins.
    pub fn identify<'a>(
        &self,
        capabilities: CapabilitySet,
        frames: &'a [CallFrame],
        max_depth: usize,
    ) -> Option<Match<'a>> {
        let candidates = self.matching(capabilities);
        if candidates.is_empty() {
            return None;
        }

        frames.iter().take(max_depth).find_map(|frame| {
            candidates
                .iter()
                .find(|p| p.recognize_frame(frame))
                .map(|pattern| Match {
                    pattern: Arc::clone(pattern),
                    frame,
                })
        })
    }
}
