//! The registered pairing of a subscriber and an optional filter.

use crate::error::BusError;
use crate::event::Event;
use crate::filter::EventFilter;

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;

/// External capability consumed by the bus.
///
/// Implementations (loggers, notifiers, metrics collectors, alerting) live
/// outside the bus. A handler may fail or even panic; the delivery path
/// isolates both, so a misbehaving subscriber never aborts delivery to
/// other subscriptions and never propagates back to the publisher.
#[async_trait]
pub trait Subscriber: Send + Sync {
  /// Handles one delivered event.
  async fn handle_event(&self, event: &Event) -> Result<(), BusError>;

  /// Identifier used for logging and diagnostics only; need not be unique.
  fn id(&self) -> String;
}

/// Unique handle for a registered subscription, assigned at subscribe time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
  pub(crate) fn new(raw: u64) -> Self {
    SubscriptionId(raw)
  }

  pub fn as_u64(self) -> u64 {
    self.0
  }
}

impl fmt::Display for SubscriptionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Binds one [`Subscriber`] to one optional [`EventFilter`] and tracks
/// delivery counters.
///
/// Subscriptions are owned by the bus registry as `Arc<Subscription>`;
/// the subscriber itself is shared, never destroyed by the bus. Counters
/// are mutated only by the delivery path.
pub struct Subscription {
  id: SubscriptionId,
  subscriber: Arc<dyn Subscriber>,
  filter: Option<EventFilter>,
  created_at: SystemTime,
  event_count: AtomicU64,
  last_event_time: Mutex<Option<SystemTime>>,
}

impl Subscription {
  pub(crate) fn new(id: SubscriptionId, subscriber: Arc<dyn Subscriber>, filter: Option<EventFilter>) -> Self {
    Self {
      id,
      subscriber,
      filter,
      created_at: SystemTime::now(),
      event_count: AtomicU64::new(0),
      last_event_time: Mutex::new(None),
    }
  }

  pub fn id(&self) -> SubscriptionId {
    self.id
  }

  pub fn subscriber_id(&self) -> String {
    self.subscriber.id()
  }

  pub fn created_at(&self) -> SystemTime {
    self.created_at
  }

  /// Number of events successfully handled by this subscription.
  pub fn event_count(&self) -> u64 {
    self.event_count.load(Ordering::Relaxed)
  }

  /// Time of the most recent successful delivery, if any.
  pub fn last_event_time(&self) -> Option<SystemTime> {
    *self.last_event_time.lock()
  }

  /// Checks whether `event` passes this subscription's filter.
  /// A subscription without a filter accepts all events.
  pub fn matches(&self, event: &Event) -> bool {
    self.filter.as_ref().map_or(true, |f| f.matches(event))
  }

  /// Delivers `event` to the subscriber if it matches the filter.
  ///
  /// Returns `true` only on a successful handler invocation. Handler
  /// errors and panics are logged and swallowed here; the caller keeps
  /// iterating the remaining subscriptions regardless.
  pub(crate) async fn deliver(&self, event: &Event) -> bool {
    if !self.matches(event) {
      return false;
    }

    let outcome = AssertUnwindSafe(self.subscriber.handle_event(event)).catch_unwind().await;
    match outcome {
      Ok(Ok(())) => {
        self.event_count.fetch_add(1, Ordering::Relaxed);
        *self.last_event_time.lock() = Some(SystemTime::now());
        tracing::trace!(
          subscription_id = %self.id,
          subscriber = %self.subscriber.id(),
          event_id = %event.id(),
          "Event delivered"
        );
        true
      }
      Ok(Err(e)) => {
        tracing::warn!(
          subscription_id = %self.id,
          subscriber = %self.subscriber.id(),
          event_id = %event.id(),
          error = %e,
          "Subscriber failed to handle event"
        );
        false
      }
      Err(_) => {
        tracing::error!(
          subscription_id = %self.id,
          subscriber = %self.subscriber.id(),
          event_id = %event.id(),
          "Subscriber panicked while handling event"
        );
        false
      }
    }
  }
}

impl fmt::Debug for Subscription {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Subscription")
      .field("id", &self.id)
      .field("subscriber", &self.subscriber.id())
      .field("filtered", &self.filter.is_some())
      .field("event_count", &self.event_count())
      .finish()
  }
}
