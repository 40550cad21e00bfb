//! The immutable event value flowing through the bus.

mod payload;
mod priority;

pub use payload::Payload;
pub use priority::EventPriority;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source for generating the next unique event identifier.
/// Starts at 1 so that 0 can never be a live id.
static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque unique identifier assigned to an event at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u64);

impl EventId {
  fn next() -> Self {
    EventId(NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed))
  }

  pub fn as_u64(self) -> u64 {
    self.0
  }
}

impl fmt::Display for EventId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// An immutable unit of information flowing through the bus.
///
/// `id`, `timestamp` and `priority` are fixed at construction. Tags are the
/// one exception: they may be extended (never removed) before the event is
/// published. Events are values; clones held by the history ring or the
/// dispatch queue are independent of the producer's copy.
#[derive(Debug, Clone)]
pub struct Event {
  id: EventId,
  event_type: String,
  payload: Payload,
  source: String,
  timestamp: SystemTime,
  priority: EventPriority,
  tags: HashSet<String>,
}

impl Event {
  /// Creates a new event with `Normal` priority.
  pub fn new(event_type: impl Into<String>, payload: Payload, source: impl Into<String>) -> Self {
    Self {
      id: EventId::next(),
      event_type: event_type.into(),
      payload,
      source: source.into(),
      timestamp: SystemTime::now(),
      priority: EventPriority::default(),
      tags: HashSet::new(),
    }
  }

  /// Sets the priority level. Intended for use at construction time.
  pub fn with_priority(mut self, priority: EventPriority) -> Self {
    self.priority = priority;
    self
  }

  /// Adds a free-form label to the event. Tags only grow; there is no
  /// removal API.
  pub fn add_tag(&mut self, tag: impl Into<String>) {
    self.tags.insert(tag.into());
  }

  /// Builder-style counterpart of [`Event::add_tag`].
  pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
    self.tags.insert(tag.into());
    self
  }

  pub fn has_tag(&self, tag: &str) -> bool {
    self.tags.contains(tag)
  }

  pub fn id(&self) -> EventId {
    self.id
  }

  /// The type tag used for routing and filtering.
  pub fn event_type(&self) -> &str {
    &self.event_type
  }

  pub fn payload(&self) -> &Payload {
    &self.payload
  }

  /// Identifies the producer of the event.
  pub fn source(&self) -> &str {
    &self.source
  }

  pub fn timestamp(&self) -> SystemTime {
    self.timestamp
  }

  pub fn priority(&self) -> EventPriority {
    self.priority
  }

  pub fn tags(&self) -> &HashSet<String> {
    &self.tags
  }

  /// Renders every field as strings, for diagnostics and logging sinks.
  pub fn to_map(&self) -> HashMap<&'static str, String> {
    let unix_ms = self
      .timestamp
      .duration_since(UNIX_EPOCH)
      .map(|d| d.as_millis())
      .unwrap_or(0);
    let mut tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
    tags.sort_unstable();

    let mut map = HashMap::new();
    map.insert("id", self.id.to_string());
    map.insert("type", self.event_type.clone());
    map.insert("source", self.source.clone());
    map.insert("timestamp_ms", unix_ms.to_string());
    map.insert("priority", self.priority.to_string());
    map.insert("schema", self.payload.schema().unwrap_or("").to_string());
    map.insert("payload_size", self.payload.size().to_string());
    map.insert("tags", tags.join(","));
    map
  }
}
