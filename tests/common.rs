// tests/common.rs
#![allow(dead_code)] // Not every test file uses every helper.

use evbus::{BusError, Event, Subscriber};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

/// Initializes tracing output for a test run. Safe to call from every
/// test; only the first call wins. Enable with RUST_LOG.
pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .try_init();
}

/// Polls `cond` every few milliseconds until it holds or `deadline`
/// elapses. Returns the final outcome of `cond`.
pub async fn wait_until(deadline: Duration, mut cond: impl FnMut() -> bool) -> bool {
  let start = tokio::time::Instant::now();
  while start.elapsed() < deadline {
    if cond() {
      return true;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  cond()
}

/// Counts successfully handled events.
pub struct CountingSubscriber {
  name: String,
  count: AtomicU64,
}

impl CountingSubscriber {
  pub fn new(name: impl Into<String>) -> Arc<Self> {
    Arc::new(Self {
      name: name.into(),
      count: AtomicU64::new(0),
    })
  }

  pub fn count(&self) -> u64 {
    self.count.load(Ordering::Relaxed)
  }
}

#[async_trait]
impl Subscriber for CountingSubscriber {
  async fn handle_event(&self, _event: &Event) -> Result<(), BusError> {
    self.count.fetch_add(1, Ordering::Relaxed);
    Ok(())
  }

  fn id(&self) -> String {
    self.name.clone()
  }
}

/// Records the type tag of every handled event, in delivery order.
pub struct RecordingSubscriber {
  name: String,
  events: Mutex<Vec<String>>,
}

impl RecordingSubscriber {
  pub fn new(name: impl Into<String>) -> Arc<Self> {
    Arc::new(Self {
      name: name.into(),
      events: Mutex::new(Vec::new()),
    })
  }

  pub fn recorded(&self) -> Vec<String> {
    self.events.lock().clone()
  }
}

#[async_trait]
impl Subscriber for RecordingSubscriber {
  async fn handle_event(&self, event: &Event) -> Result<(), BusError> {
    self.events.lock().push(event.event_type().to_string());
    Ok(())
  }

  fn id(&self) -> String {
    self.name.clone()
  }
}

/// Rejects every event with a handler error.
pub struct FailingSubscriber {
  name: String,
}

impl FailingSubscriber {
  pub fn new(name: impl Into<String>) -> Arc<Self> {
    Arc::new(Self { name: name.into() })
  }
}

#[async_trait]
impl Subscriber for FailingSubscriber {
  async fn handle_event(&self, _event: &Event) -> Result<(), BusError> {
    Err(BusError::HandlerFailed {
      subscriber: self.name.clone(),
      reason: "refusing all events".to_string(),
    })
  }

  fn id(&self) -> String {
    self.name.clone()
  }
}

/// Panics on every event, to exercise panic isolation in the delivery path.
pub struct PanickingSubscriber {
  name: String,
}

impl PanickingSubscriber {
  pub fn new(name: impl Into<String>) -> Arc<Self> {
    Arc::new(Self { name: name.into() })
  }
}

#[async_trait]
impl Subscriber for PanickingSubscriber {
  async fn handle_event(&self, event: &Event) -> Result<(), BusError> {
    panic!("subscriber blew up on event {}", event.id());
  }

  fn id(&self) -> String {
    self.name.clone()
  }
}
