//! Derived values over the uniform notification contract.
//!
//! [`SharedComputed`] re-evaluates a pure closure whenever any of its
//! dependencies notifies, and writes the result into its own cell — eagerly
//! and synchronously, with no memoization. Dependencies are anything
//! implementing [`Listenable`], so computed cells compose over plain cells,
//! async wrappers, and other computed cells alike.
//!
//! A computed cell owns only its listener registration on each dependency,
//! never the dependencies themselves: [`SharedComputed::dispose`] removes
//! the registrations and leaves the dependencies alive.

use std::rc::Rc;

use crate::shared::{Listenable, Listener, Shared};

// ---------------------------------------------------------------------------
// SharedComputed
// ---------------------------------------------------------------------------

/// A cell whose value is derived from other cells.
///
/// Construction evaluates the compute closure once to seed the value, then
/// registers one recompute listener on every dependency. The dependency
/// list is fixed at construction. Cheap `Clone` handle; exactly one owner
/// calls [`SharedComputed::dispose`].
pub struct SharedComputed<T: 'static> {
    cell: Shared<T>,
    deps: Rc<Vec<Rc<dyn Listenable>>>,
    recompute: Listener,
}

impl<T: 'static> Clone for SharedComputed<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            deps: Rc::clone(&self.deps),
            recompute: Rc::clone(&self.recompute),
        }
    }
}

impl<T: 'static> SharedComputed<T> {
    /// Derive a cell from `deps` through `compute`.
    ///
    /// `compute` must be pure: it reads the dependencies' current values and
    /// returns the derived result. It runs once now, then on every
    /// dependency notification — propagation is depth-first and fully
    /// synchronous, finishing before control returns to whatever triggered
    /// the dependency's change.
    pub fn new(deps: Vec<Rc<dyn Listenable>>, compute: impl Fn() -> T + 'static) -> Self {
        let cell = Shared::new(compute());
        let recompute: Listener = {
            let cell = cell.clone();
            Rc::new(move || cell.set(compute()))
        };
        for dep in &deps {
            dep.add_listener(recompute.clone());
        }
        Self {
            cell,
            deps: Rc::new(deps),
            recompute,
        }
    }

    /// Read the current derived value by cloning it.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.cell.get()
    }

    /// Read by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.cell.with(f)
    }

    /// Register a listener on the derived cell.
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

    /// Remove the recompute registration from every dependency, then
    /// dispose the derived cell. The dependencies themselves stay alive.
    pub fn dispose(&self) {
        if self.cell.is_disposed() {
            return;
        }
        for dep in self.deps.iter() {
            dep.remove_listener(&self.recompute);
        }
        self.cell.dispose();
    }

    /// This cell as a type-erased notification source, so computed cells
    /// can depend on other computed cells.
    pub fn listenable(&self) -> Rc<dyn Listenable> {
        Rc::new(self.clone())
    }
}

impl<T: 'static> Listenable for SharedComputed<T> {
    fn add_listener(&self, listener: Listener) {
        SharedComputed::add_listener(self, listener);
    }

    fn remove_listener(&self, listener: &Listener) {
        SharedComputed::remove_listener(self, listener);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
