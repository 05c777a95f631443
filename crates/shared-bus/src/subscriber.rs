//! # Event Subscriber
//!
//! Defines the subscription side of the notification registry.

use crate::events::{ChainEvent, EventFilter};
use crate::publisher::Registry;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_stream::Stream;
use tracing::debug;
use uuid::Uuid;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The subscription was cancelled or the bus was dropped.
    #[error("Subscription closed")]
    Closed,
}

/// Trait for subscribing to events.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe to events matching a filter.
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}

/// A subscription handle for receiving events.
///
/// Dropping the handle unsubscribes it.
pub struct Subscription {
    id: Uuid,
    receiver: mpsc::Receiver<ChainEvent>,
    filter: EventFilter,
    registry: Weak<Registry>,
    cancelled: bool,
}

impl Subscription {
    pub(crate) fn new(
        id: Uuid,
        receiver: mpsc::Receiver<ChainEvent>,
        filter: EventFilter,
        registry: Weak<Registry>,
    ) -> Self {
        Self {
            id,
            receiver,
            filter,
            registry,
            cancelled: false,
        }
    }

    /// Receive the next event.
    ///
    /// Returns `None` once the subscription is cancelled and drained, or the
    /// bus is gone.
    pub async fn recv(&mut self) -> Option<ChainEvent> {
        self.receiver.recv().await
    }

    /// Try to receive the next event without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))` - An event was available
    /// - `Ok(None)` - No event available (would block)
    /// - `Err(SubscriptionError::Closed)` - The channel was closed
    pub fn try_recv(&mut self) -> Result<Option<ChainEvent>, SubscriptionError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SubscriptionError::Closed),
        }
    }

    /// Remove this subscription from the registry and close its channel.
    ///
    /// Returns `false` if it was already cancelled. Events buffered before
    /// the call can still be drained.
    pub fn unsubscribe(&mut self) -> bool {
        if self.cancelled {
            return false;
        }
        self.cancelled = true;

        if let Some(registry) = self.registry.upgrade() {
            registry.lock().remove(&self.id);
        }
        self.receiver.close();
        debug!(subscription = %self.id, "Subscription closed");
        true
    }

    /// Whether `unsubscribe` has run.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Subscription id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// A stream wrapper for subscriptions.
///
/// Implements `tokio_stream::Stream` for use with stream combinators.
pub struct EventStream {
    subscription: Subscription,
}

impl EventStream {
    /// Create a new event stream from a subscription.
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    /// Get the filter for this stream.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        self.subscription.filter()
    }
}

impl Stream for EventStream {
    type Item = ChainEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.subscription.receiver.poll_recv(cx)
    }
}
