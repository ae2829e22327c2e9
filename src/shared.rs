//! The base observable cell.
//!
//! [`Shared<T>`] holds a value and a set of registered [`Listener`]s, and
//! notifies every listener synchronously on each [`Shared::set`]. It is the
//! one notification primitive in the crate: the async wrappers drive their
//! snapshots through the same `set` path any external owner would use, and
//! [`crate::computed::SharedComputed`] composes over anything implementing
//! [`Listenable`].
//!
//! Single-threaded by construction (`Rc`/`RefCell`): all mutation and
//! notification happens on one thread, so a listener never observes a
//! half-applied transition. The notification pass iterates a snapshot of the
//! listener list taken at `set` time, which makes listener addition and
//! removal from inside a callback well-defined.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// A zero-argument callback registered against a cell.
///
/// Identity is `Rc` pointer identity: registering the same `Listener` handle
/// twice has the effect of a single registration (set semantics), and
/// removal takes the same handle that was added. Two separate `Rc`s wrapping
/// identical closures are distinct listeners.
pub type Listener = Rc<dyn Fn()>;

/// Wrap a closure as a [`Listener`] handle.
pub fn listener(f: impl Fn() + 'static) -> Listener {
    Rc::new(f)
}

// ---------------------------------------------------------------------------
// Listenable
// ---------------------------------------------------------------------------

/// The uniform change-notification contract of the whole cell family.
///
/// Binding collaborators and [`crate::computed::SharedComputed`] depend on
/// cells only through this trait, so the dependency mechanism is not
/// special-cased per cell kind.
pub trait Listenable {
    /// Register a listener. Idempotent per handle.
    fn add_listener(&self, listener: Listener);
    /// Deregister a previously added handle. No-op for unknown handles.
    fn remove_listener(&self, listener: &Listener);
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// An observable cell: current value, listener set, disposal flag.
///
/// `Shared` is a cheap `Clone` handle; clones alias the same cell. Exactly
/// one owner is responsible for calling [`Shared::dispose`] when the owning
/// scope ends — after disposal no listener ever fires again, even if `set`
/// is called.
pub struct Shared<T> {
    inner: Rc<Inner<T>>,
}

struct Inner<T> {
    value: RefCell<T>,
    listeners: RefCell<Vec<Listener>>,
    disposed: Cell<bool>,
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Default + 'static> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("value", &*self.inner.value.borrow())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

impl<T: 'static> Shared<T> {
    /// Create a cell holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(value),
                listeners: RefCell::new(Vec::new()),
                disposed: Cell::new(false),
            }),
        }
    }

    /// Read the current value by cloning it.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Read by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value and synchronously notify every registered listener.
    ///
    /// Safe to call from inside a listener triggered by this or another
    /// cell. After disposal this is a silent no-op in release builds and a
    /// `tracing` warning in debug builds; the value is never mutated.
    pub fn set(&self, value: T) {
        if self.inner.disposed.get() {
            #[cfg(debug_assertions)]
            tracing::warn!("set on a disposed cell is ignored");
            return;
        }
        *self.inner.value.borrow_mut() = value;
        self.notify();
    }

    /// Mutate the value in place and notify.
    ///
    /// Same disposal semantics as [`Shared::set`].
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        if self.inner.disposed.get() {
            #[cfg(debug_assertions)]
            tracing::warn!("update on a disposed cell is ignored");
            return;
        }
        f(&mut self.inner.value.borrow_mut());
        self.notify();
    }

    /// Register a listener. Adding the same handle twice registers it once.
    pub fn add_listener(&self, listener: Listener) {
        if self.inner.disposed.get() {
            #[cfg(debug_assertions)]
            tracing::warn!("add_listener on a disposed cell is ignored");
            return;
        }
        let mut listeners = self.inner.listeners.borrow_mut();
        if listeners.iter().any(|l| Rc::ptr_eq(l, &listener)) {
            return;
        }
        listeners.push(listener);
    }

    /// Deregister a handle. No-op if it was never added.
    pub fn remove_listener(&self, listener: &Listener) {
        self.inner
            .listeners
            .borrow_mut()
            .retain(|l| !Rc::ptr_eq(l, listener));
    }

    /// The number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Whether the cell has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Clear all listeners and mark the cell disposed. Idempotent.
    ///
    /// The value itself stays readable; only notification stops.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        self.inner.listeners.borrow_mut().clear();
        tracing::trace!("cell disposed");
    }

    /// This cell as a type-erased notification source, for use as a
    /// [`crate::computed::SharedComputed`] dependency.
    pub fn listenable(&self) -> Rc<dyn Listenable> {
        Rc::new(self.clone())
    }

    /// Invoke every listener registered at the start of the pass.
    ///
    /// The list is snapshotted first, so callbacks may add or remove
    /// listeners freely; a listener removed mid-pass still receives the
    /// in-flight notification, and nothing afterward.
    fn notify(&self) {
        let pass: Vec<Listener> = self.inner.listeners.borrow().clone();
        for cb in &pass {
            cb();
        }
    }
}

impl<T: 'static> Listenable for Shared<T> {
    fn add_listener(&self, listener: Listener) {
        Shared::add_listener(self, listener);
    }

    fn remove_listener(&self, listener: &Listener) {
        Shared::remove_listener(self, listener);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
