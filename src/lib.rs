//! Navigation engine for screen-flow applications.
//!
//! A host declares a flow as an ordered [`FlowPath`] of steps, then drives a
//! single navigation stack through it with a [`Coordinator`]: forward and
//! backward transitions, per-step screen caching, temporary attachment of a
//! sub-flow onto the active path, and an opaque key-value payload propagated
//! between steps so a screen can tell whether its inputs changed since it
//! was last shown. Rendering and the platform stack itself stay outside the
//! crate, behind the [`NavigatorAdapter`] and [`FlowOwner`] seams.

pub mod cache;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod navigator;
pub mod query;
pub mod screen;
pub mod step;

pub use cache::ScreenCache;
pub use coordinator::{
    Advance, Coordinator, CoordinatorConfig, CoordinatorId, FlowOwner, SharedOwner, shared_owner,
};
pub use error::{FlowError, Result};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink, NullSink,
};
pub use metrics::{FlowMetrics, FlowSnapshot};
pub use navigator::{NavigatorAdapter, StackNavigator};
pub use query::{Mergeable, Query, QueryMap, QueryRepresentable};
pub use screen::{Screen, ScreenFactory, ScreenHandle};
pub use step::{FlowPath, FlowStep, StepId, TransitionKind};
