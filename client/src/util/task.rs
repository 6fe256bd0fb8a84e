//! Bridging core publishers and futures into the Leptos reactive owner.
//!
//! SYSTEM CONTEXT
//! ==============
//! Core services publish through `StateSubscriber`s and run as plain
//! futures. Components read Leptos signals. `mirror` copies every published
//! value into an `RwSignal`; `spawn_scoped` runs a service future on the
//! local executor and aborts it when the current owner is cleaned up.
//!
//! TRADE-OFFS
//! ==========
//! Server rendering spawns nothing: signals hold the publisher's current
//! value and the page renders its initial (loading) state.

#[cfg(test)]
#[path = "task_test.rs"]
mod task_test;

use std::future::Future;

use leptos::prelude::*;
use portal::channel::StateSubscriber;

/// Signal that follows `subscriber` for the lifetime of the current owner.
pub fn mirror<T>(subscriber: StateSubscriber<T>) -> RwSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    let signal = RwSignal::new(subscriber.current());
    #[cfg(feature = "hydrate")]
    {
        let mut subscriber = subscriber;
        spawn_scoped(async move {
            while let Some(value) = subscriber.changed().await {
                signal.set(value);
            }
        });
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = subscriber;
    }
    signal
}

/// Spawn `task` locally; abort it when the current owner is disposed.
pub fn spawn_scoped<F>(task: F)
where
    F: Future<Output = ()> + 'static,
{
    #[cfg(feature = "hydrate")]
    {
        let (task, handle) = futures::future::abortable(task);
        leptos::task::spawn_local(async move {
            let _ = task.await;
        });
        on_cleanup(move || handle.abort());
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = task;
    }
}
