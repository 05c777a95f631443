//! # Event Publisher
//!
//! Defines the publishing side of the notification registry.

use crate::events::{ChainEvent, EventFilter};
use crate::subscriber::{EventStream, EventSubscriber, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use uuid::Uuid;

/// Trait for publishing events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event.
    ///
    /// # Returns
    ///
    /// The number of subscribers the event was delivered to.
    async fn publish(&self, event: ChainEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// One registered subscriber.
pub(crate) struct Registered {
    pub(crate) sender: mpsc::Sender<ChainEvent>,
    pub(crate) filter: EventFilter,
}

/// Subscriber registry shared between the bus and its subscriptions.
pub(crate) type Registry = Mutex<HashMap<Uuid, Registered>>;

/// In-memory notification registry.
///
/// Each subscriber owns a bounded `mpsc` channel. Publishing walks the
/// registry under the lock and uses `try_send`, so a slow subscriber loses
/// events instead of stalling the publisher.
pub struct InMemoryEventBus {
    /// Registered subscribers by id.
    registry: Arc<Registry>,

    /// Total events published.
    events_published: AtomicU64,

    /// Deliveries skipped because a subscriber buffer was full.
    events_dropped: AtomicU64,

    /// Per-subscriber buffer size.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new bus with default per-subscriber capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new bus with the given per-subscriber capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: Arc::new(Mutex::new(HashMap::new())),
            events_published: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let id = Uuid::new_v4();

        self.registry.lock().insert(
            id,
            Registered {
                sender,
                filter: filter.clone(),
            },
        );

        debug!(subscription = %id, topics = ?filter.topics, "New subscription created");

        Subscription::new(id, receiver, filter, Arc::downgrade(&self.registry))
    }

    /// Get a stream of events matching a filter.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Get the number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Get the number of deliveries dropped on full buffers.
    #[must_use]
    pub fn events_dropped(&self) -> u64 {
        self.events_dropped.load(Ordering::Relaxed)
    }

    /// Get the per-subscriber capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        InMemoryEventBus::subscribe(self, filter)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: ChainEvent) -> usize {
        let topic = event.topic();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let mut delivered = 0;
        let mut closed = Vec::new();
        let mut registry = self.registry.lock();

        for (id, subscriber) in registry.iter() {
            if !subscriber.filter.matches(&event) {
                continue;
            }
            match subscriber.sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    self.events_dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(subscription = %id, topic = ?topic, "Subscriber buffer full, event dropped");
                }
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }

        for id in closed {
            registry.remove(&id);
            debug!(subscription = %id, "Pruned closed subscription");
        }

        debug!(topic = ?topic, receivers = delivered, "Event published");
        delivered
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
