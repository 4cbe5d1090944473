use std::fmt;
use std::sync::{Arc, Mutex};

use crate::coordinator::CoordinatorId;
use crate::query::{self, Query};
use crate::step::StepId;

/// Contract implemented by host screens. The engine never renders; it only
/// creates, caches, and sequences screens, so the required surface is small.
pub trait Screen: Send {
    fn name(&self) -> &str {
        "screen"
    }
}

/// Factory responsible for creating a step's screen on first visit.
/// Returning `None` surfaces as [`FlowError::ScreenInstantiation`].
///
/// [`FlowError::ScreenInstantiation`]: crate::FlowError::ScreenInstantiation
pub type ScreenFactory = Arc<dyn Fn() -> Option<Box<dyn Screen>> + Send + Sync>;

struct ScreenState {
    step_id: StepId,
    screen: Box<dyn Screen>,
    coordinator: Option<CoordinatorId>,
    bound: bool,
    initial_query: Option<Query>,
    query: Option<Query>,
}

/// Shared handle to one created screen instance.
///
/// The handle carries the coordinator binding and the payload pair alongside
/// the host screen. Identity is handle identity: two handles are the same
/// instance iff [`ScreenHandle::same_instance`] holds.
#[derive(Clone)]
pub struct ScreenHandle {
    inner: Arc<Mutex<ScreenState>>,
}

impl ScreenHandle {
    pub fn new(step_id: impl Into<StepId>, screen: Box<dyn Screen>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ScreenState {
                step_id: step_id.into(),
                screen,
                coordinator: None,
                bound: false,
                initial_query: None,
                query: None,
            })),
        }
    }

    pub fn step_id(&self) -> StepId {
        self.lock().step_id.clone()
    }

    pub fn name(&self) -> String {
        self.lock().screen.name().to_string()
    }

    /// Identifier of the coordinator this screen is bound to, when the
    /// coordinator carries one.
    pub fn coordinator(&self) -> Option<CoordinatorId> {
        self.lock().coordinator.clone()
    }

    pub fn is_bound(&self) -> bool {
        self.lock().bound
    }

    pub fn query(&self) -> Option<Query> {
        self.lock().query.clone()
    }

    pub fn initial_query(&self) -> Option<Query> {
        self.lock().initial_query.clone()
    }

    /// Replace the current payload. Ignored once the handle has been severed
    /// from its coordinator; a torn-down flow must not be mutated through
    /// stale handles.
    pub fn set_query(&self, query: Option<Query>) {
        let mut state = self.lock();
        if state.bound {
            state.query = query;
        }
    }

    /// Whether `query` carries different inputs than the payload this screen
    /// was entered with.
    pub fn has_changes(&self, query: &str) -> bool {
        let state = self.lock();
        query::has_changes(state.initial_query.as_deref(), query)
    }

    /// Borrow the host screen for the duration of `f`.
    pub fn with_screen<R>(&self, f: impl FnOnce(&dyn Screen) -> R) -> R {
        f(self.lock().screen.as_ref())
    }

    pub fn same_instance(a: &ScreenHandle, b: &ScreenHandle) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Entering a step sets the payload as both current and initial value.
    pub(crate) fn enter_with(&self, query: Option<&Query>) {
        let mut state = self.lock();
        state.query = query.cloned();
        state.initial_query = query.cloned();
    }

    pub(crate) fn bind(&self, coordinator: Option<CoordinatorId>) {
        let mut state = self.lock();
        state.coordinator = coordinator;
        state.bound = true;
    }

    pub(crate) fn sever(&self) {
        let mut state = self.lock();
        state.coordinator = None;
        state.bound = false;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScreenState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for ScreenHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ScreenHandle")
            .field("step_id", &state.step_id)
            .field("bound", &state.bound)
            .finish_non_exhaustive()
    }
}
