//! The flow coordinator: drives one navigation stack through an ordered
//! sequence of steps, caching screen instances and supporting temporary
//! attachment of a sub-flow.
//!
//! The coordinator's position is explicit state, moved transactionally by
//! each transition. Where it must be re-derived from the navigator (after a
//! pop, or when constructed over a pre-populated stack), that happens in one
//! place, [`Coordinator::resync_position`], so a desynchronized stack is
//! observable instead of silently degrading every operation.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use serde_json::{Value, json};

use crate::cache::ScreenCache;
use crate::error::{FlowError, Result};
use crate::logging::{LogEvent, LogLevel, Logger, field};
use crate::metrics::FlowMetrics;
use crate::navigator::{NavigatorAdapter, StackNavigator};
use crate::query::Query;
use crate::screen::ScreenHandle;
use crate::step::{FlowPath, FlowStep, TransitionKind};

const LOG_TARGET: &str = "wayline::coordinator";

/// Opaque identifier for external coordinator lookup.
pub type CoordinatorId = String;

/// Shared handle to the object that spawned a flow and is told when it ends.
pub type SharedOwner = Arc<Mutex<dyn FlowOwner>>;

/// Wrap a concrete owner into the shared handle the coordinator expects.
pub fn shared_owner<O>(owner: O) -> SharedOwner
where
    O: FlowOwner + 'static,
{
    Arc::new(Mutex::new(owner))
}

/// The external object that instantiated a coordinator. Every method has a
/// no-op default, so hosts implement only what they care about.
///
/// The four notify methods exist because some host toolkits fail to deliver
/// appearance notifications across a modal dismiss; the coordinator re-issues
/// them explicitly around `dismiss` and `complete`. Omitting them in a host
/// adapter reproduces the toolkit bug.
pub trait FlowOwner: Send {
    fn present(&mut self, _navigator: &mut dyn NavigatorAdapter, _animated: bool) {}

    fn dismiss(&mut self, _animated: bool) {}

    fn notify_will_appear(&mut self, _animated: bool) {}

    fn notify_did_appear(&mut self, _animated: bool) {}

    fn notify_will_disappear(&mut self, _animated: bool) {}

    fn notify_did_disappear(&mut self, _animated: bool) {}

    fn on_flow_completed(&mut self, _coordinator: &Coordinator, _query: Option<&str>) {}
}

/// Configuration knobs for a coordinator.
#[derive(Clone, Default)]
pub struct CoordinatorConfig {
    /// Optional structured logger for transition events.
    pub logger: Option<Logger>,
    /// Optional metrics accumulator shared with the host.
    pub metrics: Option<Arc<Mutex<FlowMetrics>>>,
}

impl CoordinatorConfig {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(FlowMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<FlowMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// Result of a forward transition.
#[derive(Debug)]
pub enum Advance {
    /// Moved one step forward; carries the (possibly fresh) screen instance.
    Pushed(ScreenHandle),
    /// An attached sub-flow finished; the stack popped back to the last step
    /// of the original path and the merge was rolled back.
    Collapsed(ScreenHandle),
    /// The flow reached its terminal step; the coordinator completed and is
    /// now inert.
    Completed,
}

/// Rollback snapshot taken when a sub-flow is attached. All three parts are
/// restored or discarded together; the overlay never exists partially.
struct Attachment {
    original_path: FlowPath,
    original_cache: ScreenCache,
    attached_path: FlowPath,
}

/// Stateful engine driving a single navigation stack through a [`FlowPath`].
pub struct Coordinator {
    identifier: Option<CoordinatorId>,
    owner: Option<Weak<Mutex<dyn FlowOwner>>>,
    navigator: Option<Box<dyn NavigatorAdapter>>,
    active_path: Option<FlowPath>,
    cache: ScreenCache,
    position: Option<usize>,
    attachment: Option<Attachment>,
    config: CoordinatorConfig,
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("identifier", &self.identifier)
            .field("position", &self.position)
            .field("cached_screens", &self.cache.len())
            .field("merged", &self.attachment.is_some())
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    /// Create a coordinator over a fresh in-memory stack, instantiating the
    /// path's entry screen immediately.
    ///
    /// Only a weak reference to `owner` is kept; the caller holds the strong
    /// one for as long as it wants to hear about the flow.
    pub fn new(
        identifier: Option<CoordinatorId>,
        path: FlowPath,
        owner: Option<&SharedOwner>,
    ) -> Result<Self> {
        let len = path.len();
        let mut coordinator = Self {
            identifier,
            owner: owner.map(Arc::downgrade),
            navigator: Some(Box::new(StackNavigator::new())),
            active_path: Some(path),
            cache: ScreenCache::new(),
            position: None,
            attachment: None,
            config: CoordinatorConfig::default(),
        };

        let entry = coordinator
            .active_path
            .as_ref()
            .and_then(|path| path.step_at(0))
            .cloned()
            .ok_or(FlowError::StepIndexOutOfRange { index: 0, len })?;
        let handle = coordinator.obtain_screen(&entry)?;
        handle.bind(coordinator.identifier.clone());
        if let Some(nav) = coordinator.navigator.as_mut() {
            nav.push(handle, entry.transition, false);
        }
        coordinator.position = Some(0);
        Ok(coordinator)
    }

    /// Create a coordinator over a pre-populated navigator. Existing screens
    /// seed the cache and are bound to this coordinator; the position is
    /// derived from the topmost screen.
    pub fn with_navigator(
        identifier: Option<CoordinatorId>,
        path: FlowPath,
        owner: Option<&SharedOwner>,
        navigator: Box<dyn NavigatorAdapter>,
    ) -> Self {
        let mut coordinator = Self {
            identifier,
            owner: owner.map(Arc::downgrade),
            navigator: Some(navigator),
            active_path: Some(path),
            cache: ScreenCache::new(),
            position: None,
            attachment: None,
            config: CoordinatorConfig::default(),
        };

        let existing = coordinator
            .navigator
            .as_ref()
            .map(|nav| nav.stack())
            .unwrap_or_default();
        for handle in existing {
            handle.bind(coordinator.identifier.clone());
            coordinator.cache.insert(handle);
        }
        coordinator.resync_position();
        coordinator
    }

    pub fn identifier(&self) -> Option<&CoordinatorId> {
        self.identifier.as_ref()
    }

    pub fn set_owner(&mut self, owner: Option<&SharedOwner>) {
        self.owner = owner.map(Arc::downgrade);
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut CoordinatorConfig {
        &mut self.config
    }

    /// Index of the current step within the active path, when well defined.
    pub fn current_index(&self) -> Option<usize> {
        self.position
    }

    pub fn active_path(&self) -> Option<&FlowPath> {
        self.active_path.as_ref()
    }

    /// Whether an attached sub-flow is currently grafted onto the path.
    pub fn is_merged(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn cached_screens(&self) -> usize {
        self.cache.len()
    }

    pub fn navigator(&self) -> Option<&dyn NavigatorAdapter> {
        self.navigator.as_deref()
    }

    /// Whether a step exists beyond the current position. An undefined
    /// position has no defined next step.
    pub fn has_next(&self) -> bool {
        match (self.active_path.as_ref(), self.position) {
            (Some(path), Some(index)) => path.last_index() != Some(index),
            _ => false,
        }
    }

    /// Move one step forward.
    ///
    /// In priority order: collapse a finished attachment, complete the flow
    /// at the terminal step, or push the next step's screen with `query` as
    /// both its current and initial payload.
    pub fn advance(&mut self, query: Option<Query>, animated: bool) -> Result<Advance> {
        let len = self
            .active_path
            .as_ref()
            .ok_or(FlowError::NoActivePath)?
            .len();
        if self.navigator.is_none() {
            return Err(FlowError::NoActivePath);
        }
        let index = self.position.ok_or(FlowError::PositionNotFound)?;
        let last = len.saturating_sub(1);

        if self.attachment.is_some() && index == last {
            return self.collapse_attachment(query, animated);
        }

        if index == last {
            if let Some(nav) = self.navigator.as_mut() {
                nav.pop_to_root(animated);
            }
            self.complete(query)?;
            return Ok(Advance::Completed);
        }

        let next = index + 1;
        let step = self
            .active_path
            .as_ref()
            .and_then(|path| path.step_at(next))
            .cloned()
            .ok_or(FlowError::StepIndexOutOfRange { index: next, len })?;
        let handle = self.obtain_screen(&step)?;
        handle.bind(self.identifier.clone());
        handle.enter_with(query.as_ref());
        match step.transition {
            TransitionKind::Push => {
                if let Some(nav) = self.navigator.as_mut() {
                    nav.push(handle.clone(), step.transition, animated);
                }
            }
        }
        self.position = Some(next);
        self.with_metrics(|metrics| metrics.record_advance());
        self.log(
            LogLevel::Debug,
            "advanced",
            [field("to", json!(step.id)), field("index", json!(next))],
        );
        Ok(Advance::Pushed(handle))
    }

    /// Move one step backward, evicting the current step's screen instance.
    /// Leaving an attachment at its first or last step rolls the merge back
    /// first. Returns the screen left visible, if any.
    pub fn retreat(&mut self, animated: bool) -> Result<Option<ScreenHandle>> {
        let len = self
            .active_path
            .as_ref()
            .ok_or(FlowError::NoActivePath)?
            .len();
        let index = self.position.ok_or(FlowError::PositionNotFound)?;
        let step = self
            .active_path
            .as_ref()
            .and_then(|path| path.step_at(index))
            .cloned()
            .ok_or(FlowError::StepIndexOutOfRange { index, len })?;

        self.cache.remove(&step.id);

        let crosses_boundary = self
            .attachment
            .as_ref()
            .and_then(|attachment| {
                attachment
                    .attached_path
                    .index_of(&step.id)
                    .map(|i| i == 0 || Some(i) == attachment.attached_path.last_index())
            })
            .unwrap_or(false);
        if crosses_boundary {
            self.unmerge();
        }

        match step.transition {
            TransitionKind::Push => {
                if let Some(nav) = self.navigator.as_mut() {
                    nav.pop_one(animated);
                }
            }
        }
        self.resync_position();
        self.with_metrics(|metrics| metrics.record_retreat());
        self.log(
            LogLevel::Debug,
            "retreated",
            [field("from", json!(step.id))],
        );
        Ok(self.navigator.as_ref().and_then(|nav| nav.topmost()))
    }

    /// Graft `path` onto the end of the active path, snapshotting the current
    /// path and cache for exact rollback. Nested attachment is rejected.
    pub fn attach(&mut self, path: FlowPath) -> Result<()> {
        if self.attachment.is_some() {
            return Err(FlowError::AttachmentActive);
        }
        let Some(current) = self.active_path.take() else {
            return Err(FlowError::NoActivePath);
        };
        let merged = match current.concat(&path) {
            Ok(merged) => merged,
            Err(err) => {
                self.active_path = Some(current);
                return Err(err);
            }
        };

        let attached_len = path.len();
        self.attachment = Some(Attachment {
            original_path: current,
            original_cache: self.cache.clone(),
            attached_path: path,
        });
        self.active_path = Some(merged);
        self.with_metrics(|metrics| metrics.record_attach());
        self.log(
            LogLevel::Info,
            "path_attached",
            [field("steps", json!(attached_len))],
        );
        Ok(())
    }

    /// Propagate `query` and this coordinator to every screen already on the
    /// stack, then ask the owner to present the navigator modally. Returns
    /// the stack's first screen.
    pub fn present(
        &mut self,
        query: Option<Query>,
        animated: bool,
    ) -> Result<Option<ScreenHandle>> {
        let owner = self.owner_handle();
        let identifier = self.identifier.clone();
        let Some(nav) = self.navigator.as_mut() else {
            return Err(FlowError::NoActivePath);
        };

        let stack = nav.stack();
        for handle in &stack {
            handle.bind(identifier.clone());
            if query.is_some() {
                handle.enter_with(query.as_ref());
            }
        }
        if let Some(owner) = owner {
            if let Ok(mut guard) = owner.lock() {
                guard.present(nav.as_mut(), animated);
            }
        }
        self.log(
            LogLevel::Info,
            "presented",
            [field("screens", json!(stack.len()))],
        );
        Ok(stack.first().cloned())
    }

    /// Ask the owner to dismiss the presented navigator, re-issuing the
    /// disappear notification pair immediately before (see [`FlowOwner`]).
    pub fn dismiss(&mut self, animated: bool) -> Result<()> {
        if let Some(owner) = self.owner_handle() {
            if let Ok(mut guard) = owner.lock() {
                guard.notify_will_disappear(animated);
                guard.notify_did_disappear(animated);
                guard.dismiss(animated);
            }
        }
        self.log(LogLevel::Info, "dismissed", std::iter::empty());
        Ok(())
    }

    /// Tear the flow down: roll back any attachment, clear the cache
    /// (severing every screen's binding), drop the navigator, and notify the
    /// owner. The coordinator accepts no transitions afterwards.
    pub fn complete(&mut self, query: Option<Query>) -> Result<()> {
        if self.active_path.is_none() {
            return Err(FlowError::NoActivePath);
        }
        self.unmerge();
        self.cache.clear_all();
        self.navigator = None;
        self.active_path = None;
        self.position = None;
        self.with_metrics(|metrics| metrics.record_completion());
        self.log(
            LogLevel::Info,
            "flow_completed",
            [field("query", json!(query))],
        );

        if let Some(owner) = self.owner_handle() {
            if let Ok(mut guard) = owner.lock() {
                guard.on_flow_completed(self, query.as_deref());
                guard.notify_will_appear(true);
                guard.notify_did_appear(true);
            }
        }
        Ok(())
    }

    /// The attached sub-flow finished: hand `query` to the last step of the
    /// original path, pop back to its screen, and roll the merge back.
    fn collapse_attachment(&mut self, query: Option<Query>, animated: bool) -> Result<Advance> {
        let original_len = self
            .attachment
            .as_ref()
            .map(|attachment| attachment.original_path.len())
            .ok_or(FlowError::NoActivePath)?;
        let target = original_len
            .checked_sub(1)
            .ok_or(FlowError::StepIndexOutOfRange { index: 0, len: 0 })?;
        let step = self
            .active_path
            .as_ref()
            .and_then(|path| path.step_at(target))
            .cloned()
            .ok_or(FlowError::StepIndexOutOfRange {
                index: target,
                len: original_len,
            })?;

        let handle = self.obtain_screen(&step)?;
        handle.bind(self.identifier.clone());
        // Current payload only; the screen keeps the initial payload it was
        // entered with, so change detection still works after the collapse.
        handle.set_query(query);
        if let Some(nav) = self.navigator.as_mut() {
            nav.pop_to(&handle, animated);
        }
        self.unmerge();
        self.resync_position();
        self.with_metrics(|metrics| metrics.record_collapse());
        self.log(
            LogLevel::Info,
            "attachment_collapsed",
            [field("to", json!(step.id))],
        );
        Ok(Advance::Collapsed(handle))
    }

    /// Restore the pre-attach path and cache. Screens created only under the
    /// overlay lose their binding along with their cache entries.
    fn unmerge(&mut self) -> bool {
        let Some(attachment) = self.attachment.take() else {
            return false;
        };
        self.cache.sever_missing_from(&attachment.original_cache);
        self.active_path = Some(attachment.original_path);
        self.cache = attachment.original_cache;
        self.log(LogLevel::Debug, "path_unmerged", std::iter::empty());
        true
    }

    fn obtain_screen(&mut self, step: &FlowStep) -> Result<ScreenHandle> {
        let existed = self.cache.contains(&step.id);
        let handle = self.cache.get_or_create(step)?;
        if !existed {
            self.with_metrics(|metrics| metrics.record_screen_created());
        }
        Ok(handle)
    }

    /// Single place the position is re-derived from the navigator. A stack
    /// whose top is not on the active path leaves the position undefined and
    /// is logged, since every position-dependent operation will refuse to run.
    fn resync_position(&mut self) {
        let top = self.navigator.as_ref().and_then(|nav| nav.topmost());
        self.position = match (self.active_path.as_ref(), top.as_ref()) {
            (Some(path), Some(top)) => path.index_of(&top.step_id()),
            _ => None,
        };
        if self.active_path.is_some() && self.position.is_none() {
            let visible = top.map(|handle| handle.step_id());
            self.log(
                LogLevel::Warn,
                "position_desynced",
                [field("visible", json!(visible))],
            );
        }
    }

    fn owner_handle(&self) -> Option<SharedOwner> {
        self.owner.as_ref().and_then(Weak::upgrade)
    }

    fn with_metrics(&self, f: impl FnOnce(&mut FlowMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                f(&mut guard);
            }
        }
    }

    fn log(&self, level: LogLevel, message: &str, fields: impl IntoIterator<Item = (String, Value)>) {
        if let Some(logger) = self.config.logger.as_ref() {
            let mut event = LogEvent::with_fields(level, LOG_TARGET, message, fields);
            if let Some(id) = self.identifier.as_ref() {
                event.fields.insert("coordinator".to_string(), json!(id));
            }
            let _ = logger.log_event(event);
        }
    }
}
