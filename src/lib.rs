//! evbus - An asynchronous, in-process publish/subscribe event bus with
//! priority dispatch, built on Tokio.
//!
//! A central broker accepts published events, matches them against
//! subscriber-supplied filters, and delivers them either inline on the
//! publisher's task (synchronous mode) or via a single priority-ordered
//! background dispatch worker (asynchronous mode).

// Declare modules that make up the library.

/// The orchestrator: registry, history, dispatch queue and worker.
pub mod bus;
/// Defines custom error types used throughout the library.
pub mod error;
/// The immutable event value type and its payload/priority components.
pub mod event;
/// Reusable predicates used to scope subscriptions.
pub mod filter;
/// The subscriber capability trait and the subscription pairing.
pub mod subscription;

// Re-export core types for user convenience, making them accessible
// directly from the crate root (e.g., `evbus::EventBus`, `evbus::Event`).
pub use bus::{BusConfig, BusStats, EventBus, DEFAULT_HISTORY_CAPACITY};
pub use error::BusError;
pub use event::{Event, EventId, EventPriority, Payload};
pub use filter::EventFilter;
pub use subscription::{Subscriber, Subscription, SubscriptionId};

// --- Top-Level Functions ---

const VERSION_MAJOR: i32 = 0;
const VERSION_MINOR: i32 = 1;
const VERSION_PATCH: i32 = 0;

/// Returns the library version as a tuple (major, minor, patch).
pub fn version() -> (i32, i32, i32) {
  (VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH)
}
