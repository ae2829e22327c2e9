//! Integration tests for tether.
//!
//! These tests exercise the public API from outside the crate, wiring the
//! cell family together the way a provider/binding layer would: listeners
//! registered on mount, values read on demand, everything disposed when the
//! owning scope ends.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use tokio::task::LocalSet;

use tether::{listener, AsyncSnapshot, ConnectionState, Shared, SharedComputed, SharedFuture, SharedStream};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Boom(&'static str);

fn run<F: Future>(fut: F) -> F::Output {
    tokio_test::block_on(LocalSet::new().run_until(fut))
}

async fn drain() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

// ---------------------------------------------------------------------------
// Plain cells wired like a binding widget
// ---------------------------------------------------------------------------

#[test]
fn binding_registers_reads_and_deregisters() {
    let cell = Shared::new(String::from("initial"));

    // "Mount": register and read.
    let rendered = Rc::new(RefCell::new(Vec::new()));
    let cb = {
        let rendered = rendered.clone();
        let cell = cell.clone();
        listener(move || rendered.borrow_mut().push(cell.get()))
    };
    cell.add_listener(cb.clone());

    cell.set(String::from("updated"));
    cell.set(String::from("again"));
    assert_eq!(*rendered.borrow(), vec!["updated", "again"]);

    // "Unmount": deregister, then the owner disposes.
    cell.remove_listener(&cb);
    cell.set(String::from("unseen"));
    assert_eq!(rendered.borrow().len(), 2);

    cell.dispose();
    assert!(cell.is_disposed());
}

#[test]
fn scope_teardown_disposes_every_cell() {
    // A provider scope owning one of each kind.
    let count = Shared::new(0);
    let label = {
        let count = count.clone();
        SharedComputed::new(vec![count.listenable()], move || {
            format!("count: {}", count.get())
        })
    };

    let notifications = Rc::new(Cell::new(0u32));
    let n = notifications.clone();
    label.add_listener(listener(move || n.set(n.get() + 1)));

    count.set(1);
    assert_eq!(label.get(), "count: 1");
    assert_eq!(notifications.get(), 1);

    // Scope ends: dispose dependents before their dependencies.
    label.dispose();
    count.dispose();

    count.set(2);
    assert_eq!(notifications.get(), 1);
    assert_eq!(label.get(), "count: 1");
}

// ---------------------------------------------------------------------------
// Computed over async wrappers
// ---------------------------------------------------------------------------

#[test]
fn computed_derives_a_loading_label_from_a_future_cell() {
    run(async {
        let sf = SharedFuture::new(|| async { Ok::<_, Boom>(42) });
        let label = {
            let sf = sf.clone();
            SharedComputed::new(vec![sf.listenable()], move || {
                if sf.is_loading() {
                    String::from("loading...")
                } else if let Some(err) = sf.error() {
                    format!("error: {err}")
                } else {
                    format!("value: {}", sf.snapshot().require_data())
                }
            })
        };
        assert_eq!(label.get(), "loading...");

        drain().await;
        assert_eq!(label.get(), "value: 42");

        label.dispose();
        sf.dispose();
    });
}

#[test]
fn computed_follows_a_stream_cell() {
    run(async {
        let (tx, rx) = futures::channel::mpsc::unbounded::<Result<i32, Boom>>();
        let slot = Rc::new(RefCell::new(Some(rx)));
        let ss = SharedStream::new(move || {
            slot.borrow_mut().take().expect("subscribed once")
        });

        let latest = {
            let ss = ss.clone();
            SharedComputed::new(vec![ss.listenable()], move || ss.data().unwrap_or(0))
        };
        assert_eq!(latest.get(), 0);

        tx.unbounded_send(Ok(7)).unwrap();
        drain().await;
        assert_eq!(latest.get(), 7);

        // Natural completion folds, which also recomputes.
        drop(tx);
        drain().await;
        assert_eq!(ss.state(), ConnectionState::Done);
        assert_eq!(latest.get(), 7);

        latest.dispose();
        ss.dispose();
    });
}

#[test]
fn disposed_computed_ignores_future_resolution() {
    run(async {
        let sf = SharedFuture::new(|| async { Ok::<_, Boom>(1) });
        let mirrored = {
            let sf = sf.clone();
            SharedComputed::new(vec![sf.listenable()], move || sf.data())
        };
        assert_eq!(mirrored.get(), None);

        mirrored.dispose();
        drain().await;

        // The future resolved, but the disposed computed never recomputed.
        assert_eq!(sf.data(), Some(1));
        assert_eq!(mirrored.get(), None);

        sf.dispose();
    });
}

// ---------------------------------------------------------------------------
// Propagation through a small dependency graph
// ---------------------------------------------------------------------------

#[test]
fn propagation_is_depth_first_and_synchronous() {
    let a = Shared::new(1);
    let b = Shared::new(2);
    let sum = {
        let (a, b) = (a.clone(), b.clone());
        SharedComputed::new(vec![a.listenable(), b.listenable()], move || {
            a.get() + b.get()
        })
    };
    let doubled_sum = {
        let sum = sum.clone();
        SharedComputed::new(vec![sum.listenable()], move || sum.get() * 2)
    };

    // Observe what the leaf sees at notification time: the whole chain must
    // already be recomputed before control returns to the `set` caller.
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_c = seen.clone();
    let leaf = doubled_sum.clone();
    doubled_sum.add_listener(listener(move || seen_c.borrow_mut().push(leaf.get())));

    a.set(3);
    assert_eq!(*seen.borrow(), vec![10]);
    b.set(5);
    assert_eq!(*seen.borrow(), vec![10, 16]);
}

#[test]
fn clone_handles_share_one_identity() {
    let cell = Shared::new(0);
    let alias = cell.clone();

    let count = Rc::new(Cell::new(0u32));
    let count_c = count.clone();
    let cb = listener(move || count_c.set(count_c.get() + 1));

    // Registering the same handle through both aliases is one registration.
    cell.add_listener(cb.clone());
    alias.add_listener(cb.clone());

    alias.set(1);
    assert_eq!(cell.get(), 1);
    assert_eq!(count.get(), 1);

    // Disposing through one alias silences the other.
    alias.dispose();
    cell.set(2);
    assert_eq!(count.get(), 1);
}

// ---------------------------------------------------------------------------
// Snapshot surface as a guard widget would use it
// ---------------------------------------------------------------------------

#[test]
fn guard_can_branch_on_snapshot_state() {
    run(async {
        let sf = SharedFuture::new(|| async { Err::<i32, _>(Boom("offline")) });

        fn render(snapshot: &AsyncSnapshot<i32>) -> String {
            if snapshot.is_loading() {
                String::from("spinner")
            } else if let Some(err) = snapshot.error() {
                format!("banner: {err}")
            } else {
                format!("body: {}", snapshot.require_data())
            }
        }

        assert_eq!(render(&sf.snapshot()), "spinner");
        drain().await;
        assert_eq!(render(&sf.snapshot()), "banner: compute: offline");

        sf.dispose();
    });
}
