use std::fmt;

/// Priority level attached to every event.
///
/// The derived `Ord` follows declaration order, so
/// `Low < Normal < High < Critical` holds and the dispatch queue can key
/// on the level directly without ever inspecting event payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventPriority {
  Low,
  Normal,
  High,
  Critical,
}

impl EventPriority {
  pub fn as_str(self) -> &'static str {
    match self {
      EventPriority::Low => "low",
      EventPriority::Normal => "normal",
      EventPriority::High => "high",
      EventPriority::Critical => "critical",
    }
  }
}

impl Default for EventPriority {
  fn default() -> Self {
    EventPriority::Normal
  }
}

impl fmt::Display for EventPriority {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
