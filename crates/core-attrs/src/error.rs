//! Error taxonomy shared by every document-core crate (spec.md §7).
//!
//! Lives in `core-attrs` because it's the lowest layer everything else
//! depends on; re-exported by `core-doc`, `core-marks`, and `core-viewport`
//! rather than duplicated. A `thiserror` library error type, kept separate
//! from the `anyhow` app-level glue the binary uses for its own errors.

use thiserror::Error;

/// The five-way outcome of a core operation.
///
/// `Fallthrough` is deliberately its own variant rather than folded into
/// `Fail`: it means "I did not handle this, try the parent", which a caller
/// must be able to distinguish from a genuine, recoverable failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A required parameter is missing; no state changed.
    #[error("missing required argument: {0}")]
    NoArg(&'static str),

    /// An argument is structurally wrong (view index out of range,
    /// cross-document mark comparison, etc.); no state changed.
    #[error("invalid argument: {0}")]
    Invalid(String),

    /// The underlying `Doc` declined the operation (e.g. start-of-file
    /// while walking backward). Propagated for the caller to retry or stop.
    #[error("operation failed: {0}")]
    Fail(&'static str),

    /// This handler chose not to handle the request; the dispatcher should
    /// continue with the parent. Never conflate with `Fail`.
    #[error("fallthrough")]
    Fallthrough,

    /// A debug invariant (seq ordering, list membership) failed.
    #[error("inconsistent state detected: {0}")]
    Inconsistent(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
