use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// Opaque event payload, tagged with a schema identifier.
///
/// The bus never interprets payload bytes; the schema tag tells consumers
/// how to decode them without runtime type inspection. A payload either
/// carries bytes together with their schema, or is empty.
#[derive(Clone, Default)]
pub struct Payload {
  // Arc<str> keeps clones cheap; payloads travel into the history ring
  // and the dispatch queue.
  schema: Option<Arc<str>>,
  data: Option<Bytes>,
}

impl Payload {
  /// Creates an empty payload for events that carry no data.
  pub fn empty() -> Self {
    Self::default()
  }

  /// Creates a payload from any byte source, taking ownership.
  ///
  /// The schema identifier is mandatory whenever bytes are present so
  /// consumers can decode safely.
  pub fn new(schema: impl Into<Arc<str>>, data: impl Into<Bytes>) -> Self {
    Self {
      schema: Some(schema.into()),
      data: Some(data.into()),
    }
  }

  /// Creates a payload from a static byte slice (zero-copy).
  pub fn from_static(schema: impl Into<Arc<str>>, data: &'static [u8]) -> Self {
    Self {
      schema: Some(schema.into()),
      data: Some(Bytes::from_static(data)),
    }
  }

  /// Returns the schema identifier, if the payload carries data.
  pub fn schema(&self) -> Option<&str> {
    self.schema.as_deref()
  }

  /// Returns a reference to the payload bytes, if any.
  pub fn data(&self) -> Option<&[u8]> {
    self.data.as_deref()
  }

  /// Returns the internal `Bytes` object if data is present.
  /// Cloning `Bytes` is cheap as it is reference-counted.
  pub fn data_bytes(&self) -> Option<Bytes> {
    self.data.clone()
  }

  /// Returns the size of the payload in bytes.
  pub fn size(&self) -> usize {
    self.data.as_ref().map_or(0, |d| d.len())
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_none()
  }
}

impl fmt::Debug for Payload {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Payload")
      .field("schema", &self.schema)
      .field("size", &self.size()) // Avoid printing payload bytes
      .finish()
  }
}
