//! # Shared Bus - Bounded Notification Registry
//!
//! Chain events (shard block accepted, beacon block processed, committee
//! rotation, punishments, verifier outcomes) are fanned out to observers
//! through a registry of bounded per-subscriber channels.
//!
//! ## Delivery Rules
//!
//! ```text
//!               publish()
//!  producer ───────────────┐
//!                          ▼
//!                ┌───────────────────┐  try_send   ┌──────────────┐
//!                │ Mutex<registry>   │ ──────────► │ Subscription │
//!                │  id -> (tx, filt) │             └──────────────┘
//!                └───────────────────┘
//! ```
//!
//! - Publishing never blocks and never spawns a task per subscriber.
//! - A full subscriber buffer drops the event for that subscriber only.
//! - A subscriber whose receiver is gone is pruned on the next publish.
//! - Unsubscribing (explicitly or on drop) closes the channel exactly once.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{ChainEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events buffered per subscriber before new events are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
