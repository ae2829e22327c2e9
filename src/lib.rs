//! # tether
//!
//! Observable cells and async-state wrappers for reactive UI state.
//!
//! tether is the state layer meant to sit under a widget tree: a provider or
//! binding collaborator constructs a cell, registers a listener, reads the
//! current value on demand, and disposes the cell exactly once when the
//! owning scope ends. Every cell kind speaks the same contract
//! ([`shared::Listenable`]), so bindings and derived cells never
//! special-case the kind they observe.
//!
//! ## Core Systems
//!
//! - **[`shared`]** — `Shared<T>`: the base observable cell (value, listener
//!   set, disposal) and the `Listenable` contract
//! - **[`snapshot`]** — `AsyncSnapshot<T>`: immutable captures of an async
//!   source's lifecycle (idle/waiting/active/done, data, error)
//! - **[`future`]** — `SharedFuture<T>`: one-shot async computations with
//!   `refresh`/`reload`/`write`/`defer`
//! - **[`stream`]** — `SharedStream<T>`: push-based subscriptions with
//!   pause/resume and a terminal fold on teardown
//! - **[`computed`]** — `SharedComputed<T>`: eager synchronous derivation
//!   over any set of `Listenable` dependencies
//! - **[`error`]** — failure taxonomy: captured async errors vs. loud
//!   programmer errors
//!
//! ## Execution model
//!
//! Single-threaded and synchronous: cells are `Rc`-backed and notification
//! is delivered in the same turn as the triggering `set`. The async
//! wrappers drive themselves with `tokio::task::spawn_local`, so they must
//! run inside a [`tokio::task::LocalSet`] on a current-thread runtime.

pub mod computed;
pub mod error;
pub mod future;
pub mod shared;
pub mod snapshot;
pub mod stream;

pub use computed::SharedComputed;
pub use error::{DynError, ErrorContext, SnapshotError};
pub use future::SharedFuture;
pub use shared::{listener, Listenable, Listener, Shared};
pub use snapshot::{AsyncSnapshot, ConnectionState};
pub use stream::SharedStream;
