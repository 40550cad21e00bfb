//! Reusable, side-effect-free predicates used to scope subscriptions.

use crate::event::{Event, EventPriority};

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

type Predicate = dyn Fn(&Event) -> bool + Send + Sync;

/// A stateless predicate over an [`Event`].
///
/// Filters are cheap to clone (`Arc`-based) and reusable across any number
/// of subscriptions. Evaluation fails closed: a panicking predicate is
/// logged and treated as a non-match, so a broken filter can never take
/// down a delivery pass.
#[derive(Clone)]
pub struct EventFilter {
  predicate: Arc<Predicate>,
}

impl EventFilter {
  /// Wraps an arbitrary predicate.
  pub fn new(predicate: impl Fn(&Event) -> bool + Send + Sync + 'static) -> Self {
    Self {
      predicate: Arc::new(predicate),
    }
  }

  /// Evaluates the wrapped predicate against `event`.
  pub fn matches(&self, event: &Event) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(|| (self.predicate)(event))) {
      Ok(matched) => matched,
      Err(_) => {
        tracing::warn!(event_id = %event.id(), "Filter predicate panicked; treating as non-match");
        false
      }
    }
  }

  /// A filter that matches every event. Used when a subscription supplies
  /// no filter of its own.
  pub fn accept_all() -> Self {
    Self::new(|_| true)
  }

  /// Matches events whose type tag equals `event_type`.
  pub fn by_type(event_type: impl Into<String>) -> Self {
    let event_type = event_type.into();
    Self::new(move |event| event.event_type() == event_type)
  }

  /// Matches events published by `source`.
  pub fn by_source(source: impl Into<String>) -> Self {
    let source = source.into();
    Self::new(move |event| event.source() == source)
  }

  /// Matches events whose priority is at least `min` under the level
  /// ordering `Low < Normal < High < Critical`.
  pub fn by_priority_at_least(min: EventPriority) -> Self {
    Self::new(move |event| event.priority() >= min)
  }

  /// Matches events carrying the given tag.
  pub fn by_tag(tag: impl Into<String>) -> Self {
    let tag = tag.into();
    Self::new(move |event| event.has_tag(&tag))
  }

  /// Builds a filter matching only when all of `filters` match.
  /// Operands are not mutated and remain usable on their own.
  pub fn combine_and(filters: impl IntoIterator<Item = EventFilter>) -> Self {
    let filters: Vec<EventFilter> = filters.into_iter().collect();
    Self::new(move |event| filters.iter().all(|f| f.matches(event)))
  }

  /// Builds a filter matching when any of `filters` matches.
  pub fn combine_or(filters: impl IntoIterator<Item = EventFilter>) -> Self {
    let filters: Vec<EventFilter> = filters.into_iter().collect();
    Self::new(move |event| filters.iter().any(|f| f.matches(event)))
  }
}

impl fmt::Debug for EventFilter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EventFilter").finish_non_exhaustive()
  }
}
