use thiserror::Error;

use crate::step::StepId;

/// Unified result type for the wayline crate.
pub type Result<T> = std::result::Result<T, FlowError>;

/// Failure conditions surfaced by flow operations.
///
/// None of these are fatal: a transition that fails leaves the coordinator
/// untouched, so a caller that discards the result gets a plain no-op.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// A path-requiring operation ran before a path was set, or after
    /// `complete` tore the coordinator down.
    #[error("no active path")]
    NoActivePath,
    /// The visible screen does not correspond to any step of the active path.
    #[error("current position not found in active path")]
    PositionNotFound,
    #[error("step index {index} out of range for path of length {len}")]
    StepIndexOutOfRange { index: usize, len: usize },
    /// The step's screen factory declined to produce an instance.
    #[error("screen factory for step `{0}` produced no instance")]
    ScreenInstantiation(StepId),
    /// Paths are keyed by step id; a repeated id would alias two positions
    /// to one cached screen.
    #[error("step `{0}` appears more than once in the path")]
    DuplicateStep(StepId),
    /// Nested attachment is unsupported; a second overlay would discard the
    /// first one's rollback snapshot.
    #[error("a path is already attached")]
    AttachmentActive,
}
