//! Per-store event fan-out.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::debug;

/// Sending half of a store's event stream.
///
/// Keeps one unbounded sender per subscriber until the store is deleted,
/// so a slow subscriber never loses events and never slows the store down.
/// Closing drops every sender, which completes each stream once it has
/// drained.
pub(crate) struct EventChannel<E> {
    key: Arc<str>,
    subscribers: Mutex<Option<Vec<mpsc::UnboundedSender<E>>>>,
}

impl<E: Clone> EventChannel<E> {
    pub(crate) fn new(key: &str) -> Self {
        Self {
            key: Arc::from(key),
            subscribers: Mutex::new(Some(Vec::new())),
        }
    }

    /// New receiver that sees events emitted from now on.
    ///
    /// After the channel is closed the returned stream is already complete.
    pub(crate) fn subscribe(&self) -> EventStream<E> {
        let (tx, receiver) = mpsc::unbounded_channel();
        let mut subs = self.subscribers.lock().expect("event channel lock poisoned");
        if let Some(subs) = subs.as_mut() {
            subs.push(tx);
        }
        EventStream {
            key: Arc::clone(&self.key),
            receiver,
        }
    }

    /// Deliver `event` to all current subscribers. Subscribers whose stream
    /// was dropped are pruned.
    pub(crate) fn emit(&self, event: E) {
        let mut subs = self.subscribers.lock().expect("event channel lock poisoned");
        if let Some(subs) = subs.as_mut() {
            let before = subs.len();
            subs.retain(|tx| tx.send(event.clone()).is_ok());
            if subs.len() < before {
                debug!(key = %self.key, pruned = before - subs.len(), "dropped closed subscribers");
            }
        }
    }

    /// Deliver the terminal `event`, then complete every stream.
    pub(crate) fn close_with(&self, event: E) {
        let mut subs = self.subscribers.lock().expect("event channel lock poisoned");
        if let Some(subs) = subs.take() {
            for tx in subs {
                let _ = tx.send(event.clone());
            }
        }
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .expect("event channel lock poisoned")
            .as_ref()
            .map_or(0, |subs| subs.iter().filter(|tx| !tx.is_closed()).count())
    }
}

/// Outcome of a non-blocking poll on an [`EventStream`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TryNext<E> {
    /// The next event.
    Event(E),
    /// Nothing pending right now.
    Empty,
    /// The store was deleted and every event has been consumed.
    Completed,
}

/// Subscription to a store's lifecycle events.
///
/// Events arrive in the order the store applied the mutations, and every
/// event emitted after subscribing is delivered. Undelivered events are
/// buffered without bound until the stream reads them or is dropped.
pub struct EventStream<E> {
    key: Arc<str>,
    receiver: mpsc::UnboundedReceiver<E>,
}

impl<E> EventStream<E> {
    /// Wait for the next event. `None` means the stream completed.
    pub async fn next(&mut self) -> Option<E> {
        self.receiver.recv().await
    }

    /// Blocking variant of [`EventStream::next`] for threads outside an
    /// async runtime.
    ///
    /// # Panics
    ///
    /// Panics when called from within an async execution context.
    pub fn blocking_next(&mut self) -> Option<E> {
        self.receiver.blocking_recv()
    }

    /// Poll without waiting.
    pub fn try_next(&mut self) -> TryNext<E> {
        match self.receiver.try_recv() {
            Ok(event) => TryNext::Event(event),
            Err(TryRecvError::Empty) => TryNext::Empty,
            Err(TryRecvError::Disconnected) => TryNext::Completed,
        }
    }

    /// Key of the store this stream observes.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<E> std::fmt::Debug for EventStream<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("key", &self.key)
            .finish()
    }
}
