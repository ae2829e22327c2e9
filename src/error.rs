//! Failure taxonomy for async-backed cells.
//!
//! Recoverable failures — a computation that errors out, a stream that emits
//! an error event — are captured at the await boundary and folded into
//! snapshot state as a [`SnapshotError`]. They flow to consumers through the
//! same listener-notification channel as successful values. Programmer errors
//! (reading data that is not there) panic instead; see
//! [`crate::snapshot::AsyncSnapshot::require_data`].

use std::error::Error;
use std::fmt;
use std::rc::Rc;

/// Shared, type-erased error value.
///
/// `Rc` rather than `Box` so snapshots carrying an error stay cheaply
/// cloneable.
pub type DynError = Rc<dyn Error>;

// ---------------------------------------------------------------------------
// ErrorContext
// ---------------------------------------------------------------------------

/// Which operation captured a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorContext {
    /// The cell's own computation: the initial run, `refresh`, or `reload`.
    Compute,
    /// A `write` replacement computation.
    Write,
    /// A `defer` side effect.
    Defer,
    /// An error event emitted by a subscribed stream.
    Stream,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorContext::Compute => "compute",
            ErrorContext::Write => "write",
            ErrorContext::Defer => "defer",
            ErrorContext::Stream => "stream",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// SnapshotError
// ---------------------------------------------------------------------------

/// A captured asynchronous failure: the cause plus where it was caught.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{context}: {cause}")]
pub struct SnapshotError {
    cause: DynError,
    context: ErrorContext,
}

impl SnapshotError {
    /// Capture a concrete error under the given context.
    pub fn new(context: ErrorContext, cause: impl Error + 'static) -> Self {
        Self {
            cause: Rc::new(cause),
            context,
        }
    }

    /// Capture an already type-erased error under the given context.
    pub fn from_dyn(context: ErrorContext, cause: DynError) -> Self {
        Self { cause, context }
    }

    /// The underlying cause.
    pub fn cause(&self) -> &DynError {
        &self.cause
    }

    /// Which operation captured this failure.
    pub fn context(&self) -> ErrorContext {
        self.context
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct Boom(&'static str);

    #[test]
    fn display_includes_context_and_cause() {
        let err = SnapshotError::new(ErrorContext::Compute, Boom("boom"));
        assert_eq!(err.to_string(), "compute: boom");
    }

    #[test]
    fn context_is_preserved() {
        let err = SnapshotError::new(ErrorContext::Defer, Boom("x"));
        assert_eq!(err.context(), ErrorContext::Defer);
    }

    #[test]
    fn from_dyn_keeps_the_cause() {
        let cause: DynError = Rc::new(Boom("wire"));
        let err = SnapshotError::from_dyn(ErrorContext::Stream, cause);
        assert_eq!(err.to_string(), "stream: wire");
    }

    #[test]
    fn clone_shares_the_cause() {
        let err = SnapshotError::new(ErrorContext::Write, Boom("dup"));
        let copy = err.clone();
        assert!(Rc::ptr_eq(err.cause(), copy.cause()));
    }

    #[test]
    fn context_display_names() {
        assert_eq!(ErrorContext::Compute.to_string(), "compute");
        assert_eq!(ErrorContext::Write.to_string(), "write");
        assert_eq!(ErrorContext::Defer.to_string(), "defer");
        assert_eq!(ErrorContext::Stream.to_string(), "stream");
    }
}
