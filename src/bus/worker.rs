use super::BusInner;

use std::sync::Arc;

/// Dispatch worker loop: one task per bus in asynchronous mode.
///
/// Repeatedly pops the highest-priority pending event and runs the full
/// delivery pass for it. When the queue is empty the worker parks on the
/// queue's wakeup signal or the shutdown token, whichever fires first.
/// The token is level-triggered, so a shutdown initiated between the
/// empty-check and the wait is never missed.
///
/// Shutdown is cooperative: an in-flight delivery pass always completes,
/// after which the loop observes the cancelled token and exits without
/// draining further entries.
pub(super) async fn run(inner: Arc<BusInner>) {
  tracing::debug!(bus = %inner.name, "Dispatch worker started");

  loop {
    if inner.shutdown_token.is_cancelled() {
      break;
    }
    match inner.queue.try_pop() {
      Some(event) => {
        inner.deliver_to_all(&event).await;
      }
      None => {
        tokio::select! {
          _ = inner.queue.wait_for_event() => {}
          _ = inner.shutdown_token.cancelled() => break,
        }
      }
    }
  }

  tracing::debug!(
    bus = %inner.name,
    pending = inner.queue.len(),
    "Dispatch worker stopped"
  );
}
