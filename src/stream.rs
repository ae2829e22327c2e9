//! Push-based sources mirrored into a snapshot cell.
//!
//! [`SharedStream`] subscribes to a `futures::Stream` of fallible items and
//! drives a `Shared<AsyncSnapshot<T>>`: each item becomes an `Active` data
//! snapshot, each error event an `Active` error snapshot, and subscription
//! teardown — natural completion or [`SharedStream::unsubscribe`] — folds the
//! last known payload into a `Done` snapshot instead of discarding it.
//!
//! The live subscription is exclusively owned: only the `SharedStream` may
//! pause, resume, or cancel it. The driver runs as a
//! `tokio::task::spawn_local` task, so a `SharedStream` must live inside a
//! [`tokio::task::LocalSet`] on a current-thread runtime.

use std::cell::{Cell, RefCell};
use std::error::Error;
use std::rc::Rc;

use futures::stream::LocalBoxStream;
use futures::{Stream, StreamExt};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::error::{DynError, ErrorContext, SnapshotError};
use crate::shared::{Listenable, Listener, Shared};
use crate::snapshot::{AsyncSnapshot, ConnectionState};

type Source<T> = Rc<dyn Fn() -> LocalBoxStream<'static, Result<T, DynError>>>;

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// The live subscription handle: driver task plus the pause gate.
struct Subscription {
    driver: JoinHandle<()>,
    paused: Rc<Cell<bool>>,
    resume: Rc<Notify>,
}

// ---------------------------------------------------------------------------
// SharedStream
// ---------------------------------------------------------------------------

/// A snapshot cell driven by a subscription to a push-based source.
///
/// The source is a factory so that resubscribing after
/// [`SharedStream::unsubscribe`] gets a fresh stream. Construction
/// subscribes immediately; the initial snapshot is `Idle` until the first
/// emission. Cheap `Clone` handle; exactly one owner calls
/// [`SharedStream::dispose`].
pub struct SharedStream<T: 'static> {
    cell: Shared<AsyncSnapshot<T>>,
    source: Source<T>,
    sub: Rc<RefCell<Option<Subscription>>>,
}

impl<T: 'static> Clone for SharedStream<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            source: Rc::clone(&self.source),
            sub: Rc::clone(&self.sub),
        }
    }
}

impl<T: Clone + 'static> SharedStream<T> {
    /// Create the cell and subscribe to a fresh stream from the factory.
    pub fn new<F, S, E>(source: F) -> Self
    where
        F: Fn() -> S + 'static,
        S: Stream<Item = Result<T, E>> + 'static,
        E: Error + 'static,
    {
        let source: Source<T> = Rc::new(move || {
            source()
                .map(|item| item.map_err(|e| Rc::new(e) as DynError))
                .boxed_local()
        });
        let this = Self {
            cell: Shared::new(AsyncSnapshot::idle()),
            source,
            sub: Rc::new(RefCell::new(None)),
        };
        this.subscribe();
        this
    }

    /// Attach a new subscription. No-op when already subscribed or disposed.
    pub fn subscribe(&self) {
        if self.cell.is_disposed() || self.sub.borrow().is_some() {
            return;
        }

        let paused = Rc::new(Cell::new(false));
        let resume = Rc::new(Notify::new());
        let mut stream = (self.source)();
        let cell = self.cell.clone();
        let slot = Rc::clone(&self.sub);
        let gate = Rc::clone(&paused);
        let wake = Rc::clone(&resume);

        let driver = tokio::task::spawn_local(async move {
            loop {
                // Gate before polling: while paused the source keeps
                // buffering and we never pull from it.
                while gate.get() {
                    wake.notified().await;
                }
                match stream.next().await {
                    Some(event) => {
                        // A pause may have landed while we were waiting on
                        // this event; hold it until resume.
                        while gate.get() {
                            wake.notified().await;
                        }
                        match event {
                            Ok(item) => {
                                cell.set(AsyncSnapshot::with_data(ConnectionState::Active, item));
                            }
                            Err(cause) => {
                                cell.set(AsyncSnapshot::with_error(
                                    ConnectionState::Active,
                                    SnapshotError::from_dyn(ErrorContext::Stream, cause),
                                ));
                            }
                        }
                    }
                    None => break,
                }
            }
            // Natural completion: release the handle, then fold.
            slot.borrow_mut().take();
            fold(&cell);
        });

        self.sub.borrow_mut().replace(Subscription {
            driver,
            paused,
            resume,
        });
    }

    /// Cancel the live subscription and fold immediately. No-op when not
    /// subscribed.
    pub fn unsubscribe(&self) {
        let Some(sub) = self.sub.borrow_mut().take() else {
            return;
        };
        sub.driver.abort();
        fold(&self.cell);
    }

    /// Pause delivery. Forwarded to the live subscription; no-op otherwise.
    pub fn pause(&self) {
        if let Some(sub) = self.sub.borrow().as_ref() {
            sub.paused.set(true);
        }
    }

    /// Resume delivery. Forwarded to the live subscription; no-op otherwise.
    pub fn resume(&self) {
        if let Some(sub) = self.sub.borrow().as_ref() {
            sub.paused.set(false);
            sub.resume.notify_one();
        }
    }

    /// Whether a live subscription exists.
    pub fn is_subscribed(&self) -> bool {
        self.sub.borrow().is_some()
    }

    /// Whether delivery is paused. Always false when not subscribed.
    pub fn is_paused(&self) -> bool {
        self.sub
            .borrow()
            .as_ref()
            .map(|sub| sub.paused.get())
            .unwrap_or(false)
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

    /// Cancel any live subscription and dispose the cell.
    ///
    /// Disposal is a hard stop: unlike [`SharedStream::unsubscribe`], no
    /// terminal fold runs.
    pub fn dispose(&self) {
        if let Some(sub) = self.sub.borrow_mut().take() {
            sub.driver.abort();
        }
        self.cell.dispose();
    }

    /// This cell as a type-erased notification source.
    pub fn listenable(&self) -> Rc<dyn Listenable> {
        Rc::new(self.clone())
    }
}

impl<T: Clone + 'static> Listenable for SharedStream<T> {
    fn add_listener(&self, listener: Listener) {
        SharedStream::add_listener(self, listener);
    }

    fn remove_listener(&self, listener: &Listener) {
        SharedStream::remove_listener(self, listener);
    }
}

/// Terminal fold: preserve the last known payload across teardown.
///
/// Data re-emits tagged `Done`; failing that, an error re-emits tagged
/// `Done`; with neither, the cell returns to `Idle`.
fn fold<T: Clone + 'static>(cell: &Shared<AsyncSnapshot<T>>) {
    let folded = cell.with(|snap| {
        if let Some(data) = snap.data() {
            AsyncSnapshot::with_data(ConnectionState::Done, data.clone())
        } else if let Some(error) = snap.error() {
            AsyncSnapshot::with_error(ConnectionState::Done, error.clone())
        } else {
            AsyncSnapshot::idle()
        }
    });
    cell.set(folded);
}

// ===========================================================================
// Tests
// ===========================================================================
