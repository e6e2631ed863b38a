//! Inbound transport boundary.
//!
//! The ingestion engine never constructs HTTP responses; it consumes them
//! through this trait. The concrete adapter over the HTTP client lives in
//! `strand-client`, and tests drive the engine with in-memory
//! implementations.

use crate::error::Result;
use async_trait::async_trait;

/// Declared content kind of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// `text/event-stream`: consumed incrementally, line by line.
    EventStream,
    /// Anything else: read once as a whole and decoded once.
    Other,
}

impl ContentKind {
    /// Classifies a `Content-Type` header value.
    pub fn from_content_type(value: &str) -> Self {
        if value.contains("text/event-stream") {
            ContentKind::EventStream
        } else {
            ContentKind::Other
        }
    }
}

/// A response being consumed incrementally.
///
/// Exposes the status indicator, the declared content kind, and the body,
/// either as a lazy sequence of decoded text fragments or as one text blob.
/// Dropping the transport releases the underlying connection, so
/// cancellation is simply ceasing to poll.
#[async_trait]
pub trait StreamingTransport: Send {
    /// HTTP status code of the response.
    fn status(&self) -> u16;

    /// Whether the response carries a success status.
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status())
    }

    /// Declared content kind of the body.
    fn content_kind(&self) -> ContentKind;

    /// Awaits the next decoded text fragment.
    ///
    /// Fragments carry arbitrary split points: a fragment may be empty,
    /// contain several lines, or end mid-line. `None` signals end of
    /// stream.
    async fn next_fragment(&mut self) -> Option<Result<String>>;

    /// Reads the remaining body as one text blob (non-streaming path).
    async fn read_to_string(self: Box<Self>) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_kind_classification() {
        assert_eq!(
            ContentKind::from_content_type("text/event-stream;charset=UTF-8"),
            ContentKind::EventStream
        );
        assert_eq!(
            ContentKind::from_content_type("application/json"),
            ContentKind::Other
        );
        assert_eq!(ContentKind::from_content_type(""), ContentKind::Other);
    }
}
