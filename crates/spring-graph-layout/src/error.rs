//! Error types for layout operations.

use thiserror::Error;

/// Result type alias for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Errors that can occur while configuring or running a layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The graph has no nodes to lay out.
    #[error("graph has no nodes")]
    EmptyGraph,

    /// Canvas dimensions must be strictly positive.
    #[error("invalid canvas dimensions: {width} x {height}")]
    InvalidDimensions { width: f64, height: f64 },

    /// A configuration field failed validation.
    #[error("invalid config: {field} = {value} ({reason})")]
    InvalidConfig {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    /// An operation was called in the wrong phase of the state machine.
    #[error("invalid phase: {operation} requires {required}, layout is {actual}")]
    InvalidPhase {
        operation: &'static str,
        required: &'static str,
        actual: &'static str,
    },

    /// A force pass produced a NaN or infinite value. This indicates a real
    /// bug (coincident points, zero mass, bad configuration) and aborts the
    /// run rather than being coerced away.
    #[error("non-finite force for node {node} during {pass} pass")]
    NonFiniteForce { node: String, pass: &'static str },

    /// The background relax thread panicked.
    #[error("relax worker thread panicked")]
    WorkerPanicked,
}
