use std::fmt;

use crate::error::{FlowError, Result};
use crate::screen::ScreenFactory;

/// Stable identifier for one step of a flow. Doubles as the screen-cache key.
pub type StepId = String;

/// How the navigator should move when entering a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Push,
}

/// One node of a flow: a step id, a transition kind, and the factory used to
/// create the step's screen on first visit.
#[derive(Clone)]
pub struct FlowStep {
    pub id: StepId,
    pub transition: TransitionKind,
    pub factory: ScreenFactory,
}

impl FlowStep {
    pub fn new<F>(id: impl Into<StepId>, transition: TransitionKind, factory: F) -> Self
    where
        F: Fn() -> Option<Box<dyn crate::screen::Screen>> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            transition,
            factory: std::sync::Arc::new(factory),
        }
    }

    /// Shorthand for the common case; push is currently the only transition.
    pub fn push<F>(id: impl Into<StepId>, factory: F) -> Self
    where
        F: Fn() -> Option<Box<dyn crate::screen::Screen>> + Send + Sync + 'static,
    {
        Self::new(id, TransitionKind::Push, factory)
    }
}

impl fmt::Debug for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowStep")
            .field("id", &self.id)
            .field("transition", &self.transition)
            .finish_non_exhaustive()
    }
}

/// Ordered sequence of steps defining a flow's canonical forward order.
///
/// Step ids must be unique within a path; the cache is keyed by id, so a
/// repeat would alias two logical positions to one screen instance.
#[derive(Debug, Clone, Default)]
pub struct FlowPath {
    steps: Vec<FlowStep>,
}

impl FlowPath {
    pub fn new(steps: Vec<FlowStep>) -> Result<Self> {
        for (i, step) in steps.iter().enumerate() {
            if steps[..i].iter().any(|s| s.id == step.id) {
                return Err(FlowError::DuplicateStep(step.id.clone()));
            }
        }
        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[FlowStep] {
        &self.steps
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.id == id)
    }

    pub fn step_at(&self, index: usize) -> Option<&FlowStep> {
        self.steps.get(index)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.steps.len().checked_sub(1)
    }

    /// Concatenation used by attach; rejects ids that would repeat across
    /// the combined path.
    pub fn concat(&self, other: &FlowPath) -> Result<FlowPath> {
        let mut steps = self.steps.clone();
        steps.extend(other.steps.iter().cloned());
        FlowPath::new(steps)
    }
}
