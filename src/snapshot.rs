//! Immutable snapshots of an asynchronous source.
//!
//! An [`AsyncSnapshot`] captures where an async source is in its lifecycle
//! ([`ConnectionState`]) together with its latest data or error. Snapshots
//! are plain values: every state transition replaces the whole snapshot, so
//! a reader never observes a half-applied transition.

use crate::error::SnapshotError;

// ---------------------------------------------------------------------------
// ConnectionState
// ---------------------------------------------------------------------------

/// Where an asynchronous source is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Not connected to any source yet, or the source ended with nothing.
    Idle,
    /// Connected; waiting for the first (or next) resolution.
    Waiting,
    /// Connected to an active source that has produced at least one event.
    Active,
    /// The source finished, successfully or not.
    Done,
}

// ---------------------------------------------------------------------------
// AsyncSnapshot
// ---------------------------------------------------------------------------

/// An immutable capture of an async source's state.
///
/// `data` and `error` are never both populated by a single transition:
/// [`AsyncSnapshot::with_data`] clears any error and
/// [`AsyncSnapshot::with_error`] clears any data. The one deliberate
/// exception is [`AsyncSnapshot::waiting`] carrying prior data across a
/// refresh, so consumers keep seeing the stale value while a recomputation
/// is pending.
#[derive(Debug, Clone)]
pub struct AsyncSnapshot<T> {
    state: ConnectionState,
    data: Option<T>,
    error: Option<SnapshotError>,
}

impl<T> AsyncSnapshot<T> {
    /// A snapshot with no connection, no data, no error.
    pub fn idle() -> Self {
        Self {
            state: ConnectionState::Idle,
            data: None,
            error: None,
        }
    }

    /// A pending snapshot, optionally carrying over prior data (the refresh
    /// case).
    pub fn waiting(prior_data: Option<T>) -> Self {
        Self {
            state: ConnectionState::Waiting,
            data: prior_data,
            error: None,
        }
    }

    /// A successful snapshot in the given state. Clears any prior error.
    pub fn with_data(state: ConnectionState, value: T) -> Self {
        Self {
            state,
            data: Some(value),
            error: None,
        }
    }

    /// A failed snapshot in the given state. Clears any prior data.
    pub fn with_error(state: ConnectionState, error: SnapshotError) -> Self {
        Self {
            state,
            data: None,
            error: Some(error),
        }
    }

    /// The connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the snapshot holds data.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Whether the snapshot holds an error.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// The data, if any.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// The captured error, if any.
    pub fn error(&self) -> Option<&SnapshotError> {
        self.error.as_ref()
    }

    /// Whether a resolution is pending.
    pub fn is_loading(&self) -> bool {
        self.state == ConnectionState::Waiting
    }

    /// The data, panicking when there is none.
    ///
    /// Reading data that is not there is a programmer error, not a
    /// recoverable condition; check [`AsyncSnapshot::has_data`] or use
    /// [`AsyncSnapshot::data`] when absence is expected.
    pub fn require_data(&self) -> &T {
        match &self.data {
            Some(data) => data,
            None => panic!("snapshot has no data (state: {:?})", self.state),
        }
    }
}

impl<T> Default for AsyncSnapshot<T> {
    fn default() -> Self {
        Self::idle()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorContext;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct Boom(&'static str);

    fn boom(context: ErrorContext) -> SnapshotError {
        SnapshotError::new(context, Boom("boom"))
    }

    #[test]
    fn idle_is_empty() {
        let snap: AsyncSnapshot<i32> = AsyncSnapshot::idle();
        assert_eq!(snap.state(), ConnectionState::Idle);
        assert!(!snap.has_data());
        assert!(!snap.has_error());
        assert!(!snap.is_loading());
    }

    #[test]
    fn default_is_idle() {
        let snap: AsyncSnapshot<i32> = AsyncSnapshot::default();
        assert_eq!(snap.state(), ConnectionState::Idle);
    }

    #[test]
    fn waiting_without_prior_data() {
        let snap: AsyncSnapshot<i32> = AsyncSnapshot::waiting(None);
        assert_eq!(snap.state(), ConnectionState::Waiting);
        assert!(snap.is_loading());
        assert!(!snap.has_data());
    }

    #[test]
    fn waiting_retains_prior_data() {
        // The documented exception: a refresh keeps stale data visible while
        // the new computation is pending.
        let snap = AsyncSnapshot::waiting(Some(1));
        assert!(snap.is_loading());
        assert_eq!(snap.data(), Some(&1));
        assert!(!snap.has_error());
    }

    #[test]
    fn with_data_clears_error() {
        let snap = AsyncSnapshot::with_data(ConnectionState::Done, 42);
        assert_eq!(snap.state(), ConnectionState::Done);
        assert_eq!(snap.data(), Some(&42));
        assert!(!snap.has_error());
    }

    #[test]
    fn with_error_clears_data() {
        let snap: AsyncSnapshot<i32> =
            AsyncSnapshot::with_error(ConnectionState::Active, boom(ErrorContext::Stream));
        assert_eq!(snap.state(), ConnectionState::Active);
        assert!(snap.has_error());
        assert!(!snap.has_data());
        assert_eq!(snap.error().unwrap().context(), ErrorContext::Stream);
    }

    #[test]
    fn require_data_returns_data() {
        let snap = AsyncSnapshot::with_data(ConnectionState::Done, "ok");
        assert_eq!(*snap.require_data(), "ok");
    }

    #[test]
    #[should_panic(expected = "snapshot has no data")]
    fn require_data_panics_without_data() {
        let snap: AsyncSnapshot<i32> = AsyncSnapshot::idle();
        let _ = snap.require_data();
    }

    #[test]
    fn clone_is_independent_value() {
        let snap = AsyncSnapshot::with_data(ConnectionState::Active, vec![1, 2]);
        let copy = snap.clone();
        assert_eq!(copy.data(), Some(&vec![1, 2]));
        assert_eq!(copy.state(), ConnectionState::Active);
    }
}
