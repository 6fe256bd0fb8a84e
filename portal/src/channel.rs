//! Observable state channels and subscription guards.
//!
//! DESIGN
//! ======
//! Every piece of shared state (auth, unread counts, locale) is owned by one
//! `StatePublisher` and read through `StateSubscriber`s. Subscribers are
//! plain values: dropping one unsubscribes it, so teardown happens on every
//! exit path without explicit cleanup calls. `Subscription` applies the same
//! rule to external listeners (backend live queries, provider streams).

#[cfg(test)]
#[path = "channel_test.rs"]
mod channel_test;

use std::sync::Arc;

use tokio::sync::watch;

/// Single writer for a piece of observable state.
#[derive(Debug)]
pub struct StatePublisher<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for StatePublisher<T> {
    fn clone(&self) -> Self {
        Self { tx: Arc::clone(&self.tx) }
    }
}

impl<T: Clone> StatePublisher<T> {
    #[must_use]
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the current value and wake every subscriber.
    pub fn publish(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Clone of the current value.
    #[must_use]
    pub fn current(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Open a new subscriber positioned at the current value.
    #[must_use]
    pub fn subscribe(&self) -> StateSubscriber<T> {
        StateSubscriber { rx: self.tx.subscribe() }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone + PartialEq> StatePublisher<T> {
    /// Publish only when `value` differs from the current one.
    /// Returns whether subscribers were notified.
    pub fn publish_if_changed(&self, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }
}

/// Read side of a `StatePublisher`. Dropping it unsubscribes.
#[derive(Debug)]
pub struct StateSubscriber<T> {
    rx: watch::Receiver<T>,
}

impl<T: Clone> StateSubscriber<T> {
    /// Clone of the latest published value.
    #[must_use]
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Wait for the next publication and return it.
    /// Returns `None` once the publisher is gone.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until the published value satisfies `predicate`, checking the
    /// current value first.
    pub async fn wait_for(&mut self, predicate: impl FnMut(&T) -> bool) -> Option<T> {
        self.rx.wait_for(predicate).await.ok().map(|value| T::clone(&value))
    }
}

/// Releases an external listener when dropped.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self { release: Some(Box::new(release)) }
    }

    /// Release now instead of waiting for drop.
    pub fn cancel(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
