//! One-shot async computations mirrored into a snapshot cell.
//!
//! [`SharedFuture`] owns a factory of fallible futures and drives a
//! `Shared<AsyncSnapshot<T>>` through their lifecycle: `Waiting` while a run
//! is pending, then `Done` with data or a captured error. Runs execute as
//! `tokio::task::spawn_local` tasks, so a `SharedFuture` must live inside a
//! [`tokio::task::LocalSet`] on a current-thread runtime.
//!
//! There is no cancellation: overlapping `refresh`/`reload`/`write`/`defer`
//! calls race, and the last completing task overwrites the snapshot.

use std::error::Error;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;

use crate::error::{DynError, ErrorContext, SnapshotError};
use crate::shared::{Listenable, Listener, Shared};
use crate::snapshot::{AsyncSnapshot, ConnectionState};

type Task<T> = Rc<dyn Fn() -> LocalBoxFuture<'static, Result<T, DynError>>>;

// ---------------------------------------------------------------------------
// SharedFuture
// ---------------------------------------------------------------------------

/// A snapshot cell driven by a zero-argument async computation.
///
/// Construction immediately enters `Waiting` and spawns the first run.
/// Cheap `Clone` handle; exactly one owner calls [`SharedFuture::dispose`].
pub struct SharedFuture<T: 'static> {
    cell: Shared<AsyncSnapshot<T>>,
    task: Task<T>,
}

impl<T: 'static> Clone for SharedFuture<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            task: Rc::clone(&self.task),
        }
    }
}

impl<T: Clone + 'static> SharedFuture<T> {
    /// Create the cell and start the first run.
    ///
    /// The factory is re-invoked on every [`SharedFuture::refresh`] and
    /// [`SharedFuture::reload`].
    pub fn new<F, Fut, E>(task: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: std::future::Future<Output = Result<T, E>> + 'static,
        E: Error + 'static,
    {
        let task: Task<T> = Rc::new(move || {
            let fut = task();
            async move { fut.await.map_err(|e| Rc::new(e) as DynError) }.boxed_local()
        });
        let this = Self {
            cell: Shared::new(AsyncSnapshot::waiting(None)),
            task,
        };
        this.spawn_run();
        this
    }

    /// Re-run the computation, keeping stale data visible while pending.
    ///
    /// The `Waiting` transition happens synchronously, before this returns.
    pub fn refresh(&self) {
        if self.cell.is_disposed() {
            return;
        }
        let prior = self.data();
        self.cell.set(AsyncSnapshot::waiting(prior));
        self.spawn_run();
    }

    /// Re-run the computation, clearing data first.
    ///
    /// The snapshot is `Waiting` with no data synchronously, before the new
    /// computation starts.
    pub fn reload(&self) {
        if self.cell.is_disposed() {
            return;
        }
        self.cell.set(AsyncSnapshot::waiting(None));
        self.spawn_run();
    }

    /// Run an alternate computation whose successful result replaces the
    /// value, with no intermediate `Waiting` transition.
    ///
    /// Failure routes to an error snapshot tagged [`ErrorContext::Write`].
    pub fn write<Fut, E>(&self, computation: Fut)
    where
        Fut: std::future::Future<Output = Result<T, E>> + 'static,
        E: Error + 'static,
    {
        if self.cell.is_disposed() {
            return;
        }
        let cell = self.cell.clone();
        tokio::task::spawn_local(async move {
            match computation.await {
                Ok(value) => cell.set(AsyncSnapshot::with_data(ConnectionState::Done, value)),
                Err(cause) => cell.set(AsyncSnapshot::with_error(
                    ConnectionState::Done,
                    SnapshotError::new(ErrorContext::Write, cause),
                )),
            }
        });
    }

    /// Run a side-effecting computation whose result is discarded.
    ///
    /// Failure routes to an error snapshot tagged [`ErrorContext::Defer`].
    /// With `refresh = true`, success triggers [`SharedFuture::refresh`] to
    /// resync derived data.
    pub fn defer<Fut, U, E>(&self, computation: Fut, refresh: bool)
    where
        Fut: std::future::Future<Output = Result<U, E>> + 'static,
        U: 'static,
        E: Error + 'static,
    {
        if self.cell.is_disposed() {
            return;
        }
        let this = self.clone();
        tokio::task::spawn_local(async move {
            match computation.await {
                Ok(_) => {
                    if refresh {
                        this.refresh();
                    }
                }
                Err(cause) => this.cell.set(AsyncSnapshot::with_error(
                    ConnectionState::Done,
                    SnapshotError::new(ErrorContext::Defer, cause),
                )),
            }
        });
    }

    fn spawn_run(&self) {
        let cell = self.cell.clone();
        let fut = (self.task)();
        tokio::task::spawn_local(async move {
            match fut.await {
                Ok(value) => cell.set(AsyncSnapshot::with_data(ConnectionState::Done, value)),
                Err(cause) => cell.set(AsyncSnapshot::with_error(
                    ConnectionState::Done,
                    SnapshotError::from_dyn(ErrorContext::Compute, cause),
                )),
            }
        });
    }

    // -- read surface -------------------------------------------------------

    /// The current snapshot.
    pub fn snapshot(&self) -> AsyncSnapshot<T> {
        self.cell.get()
    }

    /// The current data, if any.
    pub fn data(&self) -> Option<T> {
        self.cell.with(|s| s.data().cloned())
    }

    /// The captured error, if any.
    pub fn error(&self) -> Option<SnapshotError> {
        self.cell.with(|s| s.error().cloned())
    }

    /// Whether the snapshot holds data.
    pub fn has_data(&self) -> bool {
        self.cell.with(|s| s.has_data())
    }

    /// Whether the snapshot holds an error.
    pub fn has_error(&self) -> bool {
        self.cell.with(|s| s.has_error())
    }

    /// The snapshot's connection state.
    pub fn state(&self) -> ConnectionState {
        self.cell.with(|s| s.state())
    }

    /// Whether a run is pending.
    pub fn is_loading(&self) -> bool {
        self.cell.with(|s| s.is_loading())
    }

    // -- lifecycle surface ---------------------------------------------------

    /// Register a listener on the underlying cell.
    pub fn add_listener(&self, listener: Listener) {
        self.cell.add_listener(listener);
    }

    /// Deregister a listener.
    pub fn remove_listener(&self, listener: &Listener) {
        self.cell.remove_listener(listener);
    }

    /// Whether the cell has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.cell.is_disposed()
    }

    /// Dispose the underlying cell. In-flight completions become no-ops.
    pub fn dispose(&self) {
        self.cell.dispose();
    }

    /// This cell as a type-erased notification source.
    pub fn listenable(&self) -> Rc<dyn Listenable> {
        Rc::new(self.clone())
    }
}

impl<T: Clone + 'static> Listenable for SharedFuture<T> {
    fn add_listener(&self, listener: Listener) {
        SharedFuture::add_listener(self, listener);
    }

    fn remove_listener(&self, listener: &Listener) {
        SharedFuture::remove_listener(self, listener);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
