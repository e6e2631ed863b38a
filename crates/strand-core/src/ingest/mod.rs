//! Streaming chat ingestion engine.
//!
//! Consumes the text fragments of a server-sent-event response body and
//! turns them into chat messages:
//!
//! ```text
//! fragments -> LineSegmenter -> classify_line -> decode_payload -> MessageAccumulator
//! ```
//!
//! Every stage is total: malformed input degrades to plain text or is
//! dropped, never raised. The accumulator is the only stage with side
//! effects, and those go through the injected [`MessageSink`].

pub mod accumulate;
pub mod classify;
pub mod cursor;
pub mod decode;
pub mod segment;

pub use accumulate::{AccumulationPolicy, MessageAccumulator, MessageSink};
pub use classify::{LineClass, classify_line, classify_payload};
pub use cursor::StreamCursor;
pub use decode::{decode_payload, extract_content};
pub use segment::LineSegmenter;
