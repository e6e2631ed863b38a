//! Message accumulation.
//!
//! The accumulator is the last stage of the ingestion pipeline: it maps
//! classified lines and decoded payloads to message mutations on a
//! [`MessageSink`], under one of two policies.
//!
//! - **New-bubble** (advanced-agent contract): every unit becomes its own
//!   message; step narration as step-flagged bubbles, decoded content as
//!   content bubbles.
//! - **Combined** (chat contract): decoded content accumulates into one
//!   growing message; step/lifecycle/control units are dropped.
//!
//! Control events and the `[DONE]` sentinel never produce messages under
//! either policy.

use super::classify::{LineClass, classify_line, classify_payload};
use super::cursor::StreamCursor;
use super::decode::decode_payload;
use crate::error::Result;
use crate::session::message::{MessageFlags, MessageRole};
use async_trait::async_trait;

/// How stream units map to messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulationPolicy {
    /// One new message per stream unit.
    NewBubble,
    /// All decoded content appends to a single running message.
    Combined,
}

/// Message mutation boundary the accumulator drives.
///
/// Implemented by the session store. Both operations persist synchronously
/// before returning. `append_content` must silently no-op when the target
/// message (or its session) no longer exists, and inserts a single
/// separating space when the existing content does not already end in one.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Creates a message and returns its identifier.
    async fn create_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
        flags: MessageFlags,
    ) -> Result<String>;

    /// Appends text to an existing message's content.
    async fn append_content(&self, session_id: &str, message_id: &str, text: &str) -> Result<()>;
}

/// Accumulates one stream's units into chat messages.
pub struct MessageAccumulator<'a> {
    session_id: &'a str,
    policy: AccumulationPolicy,
    sink: &'a dyn MessageSink,
    cursor: StreamCursor,
}

impl<'a> MessageAccumulator<'a> {
    pub fn new(session_id: &'a str, policy: AccumulationPolicy, sink: &'a dyn MessageSink) -> Self {
        Self {
            session_id,
            policy,
            sink,
            cursor: StreamCursor::new(),
        }
    }

    /// Whether the end sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.cursor.is_done()
    }

    /// Ingests one logical line from the segmenter.
    pub async fn ingest_line(&mut self, line: &str) -> Result<()> {
        if self.cursor.is_done() {
            return Ok(());
        }
        match classify_line(line) {
            None => Ok(()),
            Some(class) => self.apply(class).await,
        }
    }

    /// Ingests an already-extracted payload (non-streaming short-circuit
    /// path, or a data payload that needs re-classification).
    pub async fn ingest_payload(&mut self, payload: &str) -> Result<()> {
        if self.cursor.is_done() {
            return Ok(());
        }
        match classify_payload(payload) {
            None => Ok(()),
            Some(class) => self.apply(class).await,
        }
    }

    /// Appends one error-flagged message and terminates accumulation.
    pub async fn fail(&mut self, description: &str) -> Result<()> {
        self.sink
            .create_message(
                self.session_id,
                MessageRole::Assistant,
                &format!("Request failed: {description}"),
                MessageFlags::error(),
            )
            .await?;
        self.cursor.mark_done();
        Ok(())
    }

    async fn apply(&mut self, class: LineClass) -> Result<()> {
        // Plain lines converge onto the data-payload path, and a payload may
        // itself carry control/step/lifecycle markers or the sentinel, so
        // data-bearing classes are re-classified before dispatch.
        let class = match class {
            LineClass::Data(payload) | LineClass::PlainText(payload) => {
                match classify_payload(&payload) {
                    Some(reclassified) => reclassified,
                    None => return Ok(()),
                }
            }
            other => other,
        };

        match class {
            LineClass::ControlEvent(name) => {
                // Control instructions steer rendering, never become content.
                tracing::debug!("[Accumulator] Control event '{}' dropped", name);
                Ok(())
            }
            LineClass::StreamEnd => {
                tracing::debug!("[Accumulator] Stream end sentinel");
                self.cursor.mark_done();
                Ok(())
            }
            LineClass::LifecycleStart(text) | LineClass::StepMarker(text) => {
                self.emit_step(&text).await
            }
            LineClass::Data(payload) => match decode_payload(&payload) {
                Some(content) => self.emit_content(&content).await,
                None => Ok(()),
            },
            // classify_payload never yields PlainText.
            LineClass::PlainText(_) => Ok(()),
        }
    }

    async fn emit_step(&mut self, text: &str) -> Result<()> {
        match self.policy {
            AccumulationPolicy::NewBubble => {
                self.sink
                    .create_message(
                        self.session_id,
                        MessageRole::Assistant,
                        text,
                        MessageFlags::step(),
                    )
                    .await?;
                Ok(())
            }
            // The combined policy renders only answer content; progress
            // narration is dropped.
            AccumulationPolicy::Combined => {
                tracing::debug!("[Accumulator] Step unit dropped under combined policy");
                Ok(())
            }
        }
    }

    async fn emit_content(&mut self, content: &str) -> Result<()> {
        match self.policy {
            AccumulationPolicy::NewBubble => {
                self.sink
                    .create_message(
                        self.session_id,
                        MessageRole::Assistant,
                        content,
                        MessageFlags::default(),
                    )
                    .await?;
                Ok(())
            }
            AccumulationPolicy::Combined => match self.cursor.last_message_id() {
                Some(id) => {
                    let id = id.to_string();
                    self.sink
                        .append_content(self.session_id, &id, content)
                        .await
                }
                None => {
                    let id = self
                        .sink
                        .create_message(
                            self.session_id,
                            MessageRole::Assistant,
                            content,
                            MessageFlags::default(),
                        )
                        .await?;
                    self.cursor.set_last_message_id(id);
                    Ok(())
                }
            },
        }
    }
}
