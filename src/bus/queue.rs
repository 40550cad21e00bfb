use crate::event::{Event, EventPriority};

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

/// One pending entry in the dispatch queue.
///
/// The ordering key is `(priority, sequence)` and nothing else: the
/// sequence number is a monotonically increasing tie-breaker, so the key
/// is always total and comparisons never touch the event payload. Within
/// one priority level the lower sequence (earlier publish) wins.
struct QueuedEvent {
  priority: EventPriority,
  seq: u64,
  event: Event,
}

impl PartialEq for QueuedEvent {
  fn eq(&self, other: &Self) -> bool {
    self.priority == other.priority && self.seq == other.seq
  }
}

impl Eq for QueuedEvent {}

impl PartialOrd for QueuedEvent {
  fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
    Some(self.cmp(other))
  }
}

impl Ord for QueuedEvent {
  fn cmp(&self, other: &Self) -> CmpOrdering {
    // BinaryHeap is a max-heap: higher priority first, then FIFO by
    // inverting the sequence comparison.
    self
      .priority
      .cmp(&other.priority)
      .then_with(|| other.seq.cmp(&self.seq))
  }
}

/// Unbounded priority queue between publishers and the dispatch worker.
///
/// Producers never block on `push`; the worker parks on [`Notify`] while
/// the queue is empty. The notify permit semantics are sufficient here
/// because the worker always re-polls the heap before waiting again.
pub(crate) struct DispatchQueue {
  heap: Mutex<BinaryHeap<QueuedEvent>>,
  available: Notify,
  next_seq: AtomicU64,
}

impl DispatchQueue {
  pub fn new() -> Self {
    Self {
      heap: Mutex::new(BinaryHeap::new()),
      available: Notify::new(),
      next_seq: AtomicU64::new(0),
    }
  }

  /// Enqueues an event under its own priority and a fresh sequence number,
  /// then wakes the worker if it is parked.
  pub fn push(&self, event: Event) {
    let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
    let entry = QueuedEvent {
      priority: event.priority(),
      seq,
      event,
    };
    self.heap.lock().push(entry);
    self.available.notify_one();
  }

  /// Pops the highest-priority pending event, if any.
  pub fn try_pop(&self) -> Option<Event> {
    self.heap.lock().pop().map(|entry| entry.event)
  }

  /// Parks until a producer signals a push. May wake spuriously relative
  /// to queue content; callers must re-poll.
  pub async fn wait_for_event(&self) {
    self.available.notified().await;
  }

  pub fn len(&self) -> usize {
    self.heap.lock().len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::event::Payload;

  fn event(name: &str, priority: EventPriority) -> Event {
    Event::new(name, Payload::empty(), "test").with_priority(priority)
  }

  #[test]
  fn pops_by_priority_then_publish_order() {
    let queue = DispatchQueue::new();
    queue.push(event("normal-1", EventPriority::Normal));
    queue.push(event("critical-2", EventPriority::Critical));
    queue.push(event("low-3", EventPriority::Low));
    queue.push(event("critical-4", EventPriority::Critical));

    let drained: Vec<String> = std::iter::from_fn(|| queue.try_pop())
      .map(|e| e.event_type().to_string())
      .collect();
    assert_eq!(drained, vec!["critical-2", "critical-4", "normal-1", "low-3"]);
  }

  #[test]
  fn equal_priority_is_fifo() {
    let queue = DispatchQueue::new();
    for i in 0..10 {
      queue.push(event(&format!("e{}", i), EventPriority::Normal));
    }
    for i in 0..10 {
      let popped = queue.try_pop().unwrap();
      assert_eq!(popped.event_type(), format!("e{}", i));
    }
  }

  #[test]
  fn empty_queue_pops_none() {
    let queue = DispatchQueue::new();
    assert_eq!(queue.len(), 0);
    assert!(queue.try_pop().is_none());
  }

  #[test]
  fn len_tracks_pushes_and_pops() {
    let queue = DispatchQueue::new();
    queue.push(event("a", EventPriority::Low));
    queue.push(event("b", EventPriority::High));
    assert_eq!(queue.len(), 2);
    queue.try_pop();
    assert_eq!(queue.len(), 1);
  }
}
