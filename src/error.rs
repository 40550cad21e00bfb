use thiserror::Error;

/// Errors surfaced by the bus or by subscriber implementations.
///
/// Subscriber handler failures are isolated by the delivery path and never
/// propagate back to publishers; the `Handler*` variants exist so that
/// `Subscriber::handle_event` implementations have a typed failure channel.
#[derive(Error, Debug)]
#[non_exhaustive] // Allows adding more variants later without breaking change
pub enum BusError {
  // --- Lifecycle Errors ---
  #[error("Bus is stopped and no longer accepts events")]
  BusStopped,

  // --- Delivery Errors ---
  #[error("Subscriber '{subscriber}' failed to handle event: {reason}")]
  HandlerFailed { subscriber: String, reason: String },

  #[error("Subscriber '{0}' panicked while handling an event")]
  HandlerPanicked(String),

  // --- Timeouts ---
  #[error("Operation timed out")]
  Timeout,

  // --- Internal Errors ---
  #[error("Internal bus error: {0}")]
  Internal(String),
}
