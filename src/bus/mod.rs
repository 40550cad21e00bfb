//! The orchestrator: subscription registry, history ring, dispatch queue
//! and the background worker.

mod queue;
mod worker;

use crate::error::BusError;
use crate::event::Event;
use crate::filter::EventFilter;
use crate::subscription::{Subscriber, Subscription, SubscriptionId};
use queue::DispatchQueue;

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default capacity of the bounded event history ring.
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// Bounded wait for the dispatch worker to exit during shutdown.
const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Construction-time configuration for an [`EventBus`].
#[derive(Debug, Clone)]
pub struct BusConfig {
  /// Name used in logs and diagnostics.
  pub name: String,
  /// When `true`, delivery is deferred to the background dispatch worker
  /// via the priority queue. When `false`, `publish` delivers inline on
  /// the caller's task.
  pub async_processing: bool,
  /// Capacity of the bounded history ring; oldest events are evicted
  /// first.
  pub history_capacity: usize,
}

impl Default for BusConfig {
  fn default() -> Self {
    Self {
      name: "event-bus".to_string(),
      async_processing: true,
      history_capacity: DEFAULT_HISTORY_CAPACITY,
    }
  }
}

/// Point-in-time delivery statistics, read via [`EventBus::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusStats {
  pub events_published: u64,
  pub events_delivered: u64,
  pub subscriber_count: usize,
  pub queue_size: usize,
  pub history_size: usize,
}

/// Shared state behind the `EventBus` handle and the dispatch worker.
pub(crate) struct BusInner {
  pub(crate) name: String,
  async_processing: bool,
  /// Source for the next subscription id, unique per bus.
  next_subscription_id: AtomicU64,
  /// The subscription registry. Mutated under the write lock; delivery
  /// passes iterate a snapshot taken under the read lock so concurrent
  /// subscribe/unsubscribe calls never race an in-flight pass.
  subscriptions: RwLock<HashMap<SubscriptionId, Arc<Subscription>>>,
  /// Bounded ring of recently published events, oldest evicted first.
  history: Mutex<VecDeque<Event>>,
  history_capacity: usize,
  pub(crate) queue: DispatchQueue,
  events_published: AtomicU64,
  events_delivered: AtomicU64,
  /// Set once by the first `shutdown` call; guards the idempotent path.
  shutdown_initiated: AtomicBool,
  pub(crate) shutdown_token: CancellationToken,
}

impl BusInner {
  /// Runs one full-registry delivery pass for `event`. Shared by the
  /// synchronous publish path and the dispatch worker.
  pub(crate) async fn deliver_to_all(&self, event: &Event) {
    // Snapshot the registry; Arc keeps a subscription removed mid-pass
    // alive for this event only.
    let subscriptions: Vec<Arc<Subscription>> = self.subscriptions.read().values().cloned().collect();

    let mut delivered: u64 = 0;
    for subscription in subscriptions {
      if subscription.deliver(event).await {
        delivered += 1;
      }
    }
    self.events_delivered.fetch_add(delivered, Ordering::Relaxed);

    tracing::trace!(
      bus = %self.name,
      event_id = %event.id(),
      delivered,
      "Delivery pass complete"
    );
  }

  fn record_history(&self, event: &Event) {
    let mut history = self.history.lock();
    if history.len() == self.history_capacity {
      history.pop_front();
    }
    history.push_back(event.clone());
  }
}

/// A central broker that accepts published events, matches them against
/// subscriber-supplied filters and delivers them either inline on the
/// publisher's task or via a priority-ordered background worker.
///
/// In asynchronous mode the bus must be created within a Tokio runtime,
/// since construction spawns the dispatch worker task.
pub struct EventBus {
  inner: Arc<BusInner>,
  /// Worker handle, taken exactly once by `shutdown`.
  worker: Mutex<Option<JoinHandle<()>>>,
}

impl EventBus {
  /// Creates a bus in asynchronous mode with default history capacity.
  pub fn new(name: impl Into<String>) -> Self {
    Self::with_config(BusConfig {
      name: name.into(),
      ..Default::default()
    })
  }

  /// Creates a bus that delivers inline on the publisher's task, with no
  /// queue and no worker.
  pub fn synchronous(name: impl Into<String>) -> Self {
    Self::with_config(BusConfig {
      name: name.into(),
      async_processing: false,
      ..Default::default()
    })
  }

  pub fn with_config(config: BusConfig) -> Self {
    let inner = Arc::new(BusInner {
      name: config.name,
      async_processing: config.async_processing,
      next_subscription_id: AtomicU64::new(1), // Start ids from 1.
      subscriptions: RwLock::new(HashMap::new()),
      history: Mutex::new(VecDeque::with_capacity(config.history_capacity.max(1))),
      history_capacity: config.history_capacity.max(1),
      queue: DispatchQueue::new(),
      events_published: AtomicU64::new(0),
      events_delivered: AtomicU64::new(0),
      shutdown_initiated: AtomicBool::new(false),
      shutdown_token: CancellationToken::new(),
    });

    let worker = if config.async_processing {
      Some(tokio::spawn(worker::run(inner.clone())))
    } else {
      None
    };

    tracing::debug!(
      bus = %inner.name,
      async_processing = config.async_processing,
      history_capacity = inner.history_capacity,
      "Created event bus"
    );

    Self {
      inner,
      worker: Mutex::new(worker),
    }
  }

  pub fn name(&self) -> &str {
    &self.inner.name
  }

  /// Registers a new subscription for `subscriber`, scoped by `filter`.
  /// Passing `None` subscribes to all events. Always succeeds.
  pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>, filter: Option<EventFilter>) -> SubscriptionId {
    let id = SubscriptionId::new(self.inner.next_subscription_id.fetch_add(1, Ordering::Relaxed));
    let subscription = Arc::new(Subscription::new(id, subscriber.clone(), filter));

    self.inner.subscriptions.write().insert(id, subscription);
    tracing::debug!(
      bus = %self.inner.name,
      subscription_id = %id,
      subscriber = %subscriber.id(),
      "Subscriber registered"
    );
    id
  }

  /// Removes the subscription if present. Returns `false` (not an error)
  /// for an unknown id.
  pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
    let removed = self.inner.subscriptions.write().remove(&id);
    match removed {
      Some(subscription) => {
        tracing::debug!(
          bus = %self.inner.name,
          subscription_id = %id,
          subscriber = %subscription.subscriber_id(),
          "Subscriber removed"
        );
        true
      }
      None => {
        tracing::debug!(
          bus = %self.inner.name,
          subscription_id = %id,
          "Unsubscribe for unknown subscription id"
        );
        false
      }
    }
  }

  /// Returns a handle to a registered subscription, for reading its
  /// delivery bookkeeping. `None` once the subscription is removed.
  pub fn subscription(&self, id: SubscriptionId) -> Option<Arc<Subscription>> {
    self.inner.subscriptions.read().get(&id).cloned()
  }

  /// Publishes an event onto the bus.
  ///
  /// In asynchronous mode this enqueues and returns immediately (delivery
  /// is eventual); in synchronous mode it awaits the full delivery pass.
  /// After [`EventBus::shutdown`] the call is rejected with
  /// [`BusError::BusStopped`].
  pub async fn publish(&self, event: Event) -> Result<(), BusError> {
    if self.inner.shutdown_initiated.load(Ordering::Acquire) {
      tracing::warn!(
        bus = %self.inner.name,
        event_id = %event.id(),
        event_type = %event.event_type(),
        "Publish rejected: bus is stopped"
      );
      return Err(BusError::BusStopped);
    }

    self.inner.record_history(&event);
    self.inner.events_published.fetch_add(1, Ordering::Relaxed);
    tracing::trace!(
      bus = %self.inner.name,
      event_id = %event.id(),
      event_type = %event.event_type(),
      source = %event.source(),
      priority = %event.priority(),
      "Event published"
    );

    if self.inner.async_processing {
      self.inner.queue.push(event);
    } else {
      self.inner.deliver_to_all(&event).await;
    }
    Ok(())
  }

  /// Returns current delivery statistics.
  pub fn stats(&self) -> BusStats {
    BusStats {
      events_published: self.inner.events_published.load(Ordering::Relaxed),
      events_delivered: self.inner.events_delivered.load(Ordering::Relaxed),
      subscriber_count: self.inner.subscriptions.read().len(),
      queue_size: self.inner.queue.len(),
      history_size: self.inner.history.lock().len(),
    }
  }

  /// Returns the last `count` published events, newest last.
  pub fn recent_events(&self, count: usize) -> Vec<Event> {
    let history = self.inner.history.lock();
    let skip = history.len().saturating_sub(count);
    history.iter().skip(skip).cloned().collect()
  }

  /// Stops the bus: rejects further publishes, cancels the dispatch
  /// worker and waits for it to exit under a bounded timeout.
  ///
  /// Idempotent; a second call changes nothing. Pending queued events are
  /// abandoned and remain observable via [`EventBus::stats`]. Best-effort:
  /// if the worker does not exit within the timeout (e.g. a subscriber
  /// handler is stuck), this logs and returns anyway.
  pub async fn shutdown(&self) -> Result<(), BusError> {
    if self
      .inner
      .shutdown_initiated
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      tracing::debug!(bus = %self.inner.name, "Shutdown already initiated");
      return Ok(());
    }

    tracing::info!(bus = %self.inner.name, "Event bus shutdown initiated");
    self.inner.shutdown_token.cancel();

    let handle = self.worker.lock().take();
    if let Some(handle) = handle {
      match tokio::time::timeout(SHUTDOWN_JOIN_TIMEOUT, handle).await {
        Ok(Ok(())) => {
          tracing::debug!(bus = %self.inner.name, "Dispatch worker joined");
        }
        Ok(Err(join_err)) => {
          tracing::error!(bus = %self.inner.name, error = %join_err, "Dispatch worker task failed");
        }
        Err(_) => {
          tracing::warn!(
            bus = %self.inner.name,
            timeout = ?SHUTDOWN_JOIN_TIMEOUT,
            "Timed out waiting for dispatch worker to stop"
          );
        }
      }
    }
    Ok(())
  }
}

impl fmt::Debug for EventBus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EventBus")
      .field("name", &self.inner.name)
      .field("async_processing", &self.inner.async_processing)
      .finish_non_exhaustive()
  }
}
