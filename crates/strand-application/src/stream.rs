//! Stream orchestration.
//!
//! One orchestrator instance serves all sessions. Each `run` drives a single
//! streaming call through `Connecting → Streaming → Closed | Failed`,
//! feeding the transport's fragments through the ingestion pipeline. A
//! per-session registry of cancellation tokens enforces the invariant that
//! at most one stream is live per session: beginning a new run cancels the
//! previous one before any message mutation happens.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use strand_core::Result;
use strand_core::ingest::{AccumulationPolicy, LineSegmenter, MessageAccumulator, MessageSink};
use strand_core::transport::{ContentKind, StreamingTransport};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// How a streaming call ended.
///
/// `Completed` and `Cancelled` are the orchestrator's `Closed` state;
/// `FailedStatus` and `FailedRead` are `Failed`. The split lets the caller
/// decide whether a single-shot fallback makes sense (it does for a
/// rejected request, not for a stream that died halfway).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// End of stream or the `[DONE]` sentinel was reached.
    Completed,
    /// Cancelled locally: a newer stream for the session, or an explicit
    /// close.
    Cancelled,
    /// The response carried a non-success status; one error message was
    /// appended.
    FailedStatus,
    /// The transport errored mid-read; one error message was appended.
    FailedRead,
}

/// Drives streaming calls and owns the per-session cancellation registry.
#[derive(Default)]
pub struct StreamOrchestrator {
    /// Live stream per session: (call id, cancellation token)
    active: Mutex<HashMap<String, (u64, CancellationToken)>>,
    /// Monotonic call counter distinguishing successive runs per session
    next_call: AtomicU64,
}

impl StreamOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the session's live stream, if any.
    ///
    /// Idempotent: cancelling a session without a live stream (or one that
    /// already closed or failed) is a no-op. Returns whether a stream was
    /// actually cancelled.
    pub async fn cancel(&self, session_id: &str) -> bool {
        let mut active = self.active.lock().await;
        if let Some((_, token)) = active.remove(session_id) {
            tracing::info!("[StreamOrchestrator] Cancelling stream for {}", session_id);
            token.cancel();
            true
        } else {
            false
        }
    }

    /// Whether the session currently has a live stream.
    pub async fn is_streaming(&self, session_id: &str) -> bool {
        self.active.lock().await.contains_key(session_id)
    }

    /// Runs one streaming call to completion.
    ///
    /// Any stream already live for the session is cancelled first. Messages
    /// are accumulated onto `sink` under the given policy; a non-streaming
    /// content kind short-circuits to a single decoder pass over the whole
    /// body.
    ///
    /// # Errors
    ///
    /// Returns an error only when the sink itself fails (storage error);
    /// transport failures are absorbed into the outcome.
    pub async fn run(
        &self,
        session_id: &str,
        transport: Box<dyn StreamingTransport>,
        policy: AccumulationPolicy,
        sink: &dyn MessageSink,
    ) -> Result<StreamOutcome> {
        let (call_id, token) = self.begin(session_id).await;
        let outcome = self.drive(session_id, transport, policy, sink, &token).await;
        self.release(session_id, call_id).await;
        if let Ok(outcome) = &outcome {
            tracing::info!(
                "[StreamOrchestrator] Stream for {} ended: {:?}",
                session_id,
                outcome
            );
        }
        outcome
    }

    /// Registers a new call for the session, cancelling the previous one.
    async fn begin(&self, session_id: &str) -> (u64, CancellationToken) {
        let call_id = self.next_call.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let mut active = self.active.lock().await;
        if let Some((prev_id, prev_token)) = active.insert(
            session_id.to_string(),
            (call_id, token.clone()),
        ) {
            tracing::debug!(
                "[StreamOrchestrator] Superseding stream #{} for {}",
                prev_id,
                session_id
            );
            prev_token.cancel();
        }
        (call_id, token)
    }

    /// Removes the registry entry, unless a newer call already replaced it.
    async fn release(&self, session_id: &str, call_id: u64) {
        let mut active = self.active.lock().await;
        if active.get(session_id).is_some_and(|(id, _)| *id == call_id) {
            active.remove(session_id);
        }
    }

    async fn drive(
        &self,
        session_id: &str,
        mut transport: Box<dyn StreamingTransport>,
        policy: AccumulationPolicy,
        sink: &dyn MessageSink,
        token: &CancellationToken,
    ) -> Result<StreamOutcome> {
        let mut accumulator = MessageAccumulator::new(session_id, policy, sink);

        tracing::debug!(
            "[StreamOrchestrator] Connecting: status={} kind={:?}",
            transport.status(),
            transport.content_kind()
        );

        if !transport.is_success() {
            accumulator
                .fail(&format!("HTTP status {}", transport.status()))
                .await?;
            return Ok(StreamOutcome::FailedStatus);
        }

        // Non-streaming responses collapse to one decoder pass.
        if transport.content_kind() != ContentKind::EventStream {
            return match transport.read_to_string().await {
                Ok(body) => {
                    accumulator.ingest_payload(body.trim()).await?;
                    Ok(StreamOutcome::Completed)
                }
                Err(err) => {
                    accumulator.fail(&err.to_string()).await?;
                    Ok(StreamOutcome::FailedRead)
                }
            };
        }

        tracing::debug!("[StreamOrchestrator] Streaming for {}", session_id);
        let mut segmenter = LineSegmenter::new();

        loop {
            let fragment = tokio::select! {
                _ = token.cancelled() => {
                    // Drop the transport without draining it; messages
                    // accumulated so far stay untouched.
                    return Ok(StreamOutcome::Cancelled);
                }
                fragment = transport.next_fragment() => fragment,
            };

            match fragment {
                None => break,
                Some(Ok(text)) => {
                    for line in segmenter.push(&text) {
                        // A cancellation that lands mid-fragment still stops
                        // message production before the next mutation.
                        if token.is_cancelled() {
                            return Ok(StreamOutcome::Cancelled);
                        }
                        accumulator.ingest_line(&line).await?;
                    }
                    if accumulator.is_done() {
                        return Ok(StreamOutcome::Completed);
                    }
                }
                Some(Err(err)) => {
                    accumulator.fail(&err.to_string()).await?;
                    return Ok(StreamOutcome::FailedRead);
                }
            }
        }

        // End of stream: the trailing partial line, if any, is flushed as-is.
        if let Some(rest) = segmenter.finish() {
            accumulator.ingest_line(&rest).await?;
        }
        Ok(StreamOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;
    use strand_core::StrandError;
    use strand_core::session::{MessageFlags, MessageRole};

    /// In-memory transport feeding canned fragments.
    struct MockTransport {
        status: u16,
        kind: ContentKind,
        fragments: VecDeque<Result<String>>,
        /// Park forever once fragments run out instead of ending the stream.
        hang_at_end: bool,
        body: String,
    }

    impl MockTransport {
        fn streaming(fragments: &[&str]) -> Self {
            Self {
                status: 200,
                kind: ContentKind::EventStream,
                fragments: fragments.iter().map(|f| Ok(f.to_string())).collect(),
                hang_at_end: false,
                body: String::new(),
            }
        }

        fn plain(body: &str) -> Self {
            Self {
                status: 200,
                kind: ContentKind::Other,
                fragments: VecDeque::new(),
                hang_at_end: false,
                body: body.to_string(),
            }
        }
    }

    #[async_trait]
    impl StreamingTransport for MockTransport {
        fn status(&self) -> u16 {
            self.status
        }

        fn content_kind(&self) -> ContentKind {
            self.kind
        }

        async fn next_fragment(&mut self) -> Option<Result<String>> {
            match self.fragments.pop_front() {
                Some(fragment) => Some(fragment),
                None if self.hang_at_end => std::future::pending().await,
                None => None,
            }
        }

        async fn read_to_string(self: Box<Self>) -> Result<String> {
            Ok(self.body)
        }
    }

    #[derive(Debug, Clone)]
    struct Recorded {
        content: String,
        flags: MessageFlags,
    }

    #[derive(Default)]
    struct RecordingSink {
        messages: StdMutex<Vec<Recorded>>,
    }

    impl RecordingSink {
        fn contents(&self) -> Vec<String> {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .map(|m| m.content.clone())
                .collect()
        }

        fn error_count(&self) -> usize {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.flags.is_error)
                .count()
        }
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        async fn create_message(
            &self,
            _session_id: &str,
            _role: MessageRole,
            content: &str,
            flags: MessageFlags,
        ) -> Result<String> {
            let mut messages = self.messages.lock().unwrap();
            let id = format!("m{}", messages.len());
            messages.push(Recorded {
                content: content.to_string(),
                flags,
            });
            Ok(id)
        }

        async fn append_content(
            &self,
            _session_id: &str,
            message_id: &str,
            text: &str,
        ) -> Result<()> {
            let index: usize = message_id[1..].parse().unwrap();
            let mut messages = self.messages.lock().unwrap();
            let msg = &mut messages[index];
            if !msg.content.is_empty() && !msg.content.ends_with(' ') {
                msg.content.push(' ');
            }
            msg.content.push_str(text);
            Ok(())
        }
    }

    #[tokio::test]
    async fn streaming_run_accumulates_and_completes() {
        let orchestrator = StreamOrchestrator::new();
        let sink = RecordingSink::default();
        let transport = MockTransport::streaming(&[
            "event: start\ndata: \"A\"\nda",
            "ta: \"B\"\n",
            "data: [DONE]\n",
        ]);

        let outcome = orchestrator
            .run(
                "chat_1",
                Box::new(transport),
                AccumulationPolicy::NewBubble,
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(outcome, StreamOutcome::Completed);
        assert_eq!(sink.contents(), vec!["A", "B"]);
        assert!(!orchestrator.is_streaming("chat_1").await);
    }

    #[tokio::test]
    async fn trailing_partial_line_is_flushed() {
        let orchestrator = StreamOrchestrator::new();
        let sink = RecordingSink::default();
        let transport = MockTransport::streaming(&["data: \"A\"\ndata: \"tail\""]);

        let outcome = orchestrator
            .run(
                "chat_1",
                Box::new(transport),
                AccumulationPolicy::Combined,
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(outcome, StreamOutcome::Completed);
        assert_eq!(sink.contents(), vec!["A tail"]);
    }

    #[tokio::test]
    async fn non_streaming_body_short_circuits_to_one_message() {
        let orchestrator = StreamOrchestrator::new();
        let sink = RecordingSink::default();
        let transport = MockTransport::plain(r#"{"content": "full answer"}"#);

        let outcome = orchestrator
            .run(
                "chat_1",
                Box::new(transport),
                AccumulationPolicy::NewBubble,
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(outcome, StreamOutcome::Completed);
        assert_eq!(sink.contents(), vec!["full answer"]);
    }

    #[tokio::test]
    async fn non_success_status_fails_with_one_error_message() {
        let orchestrator = StreamOrchestrator::new();
        let sink = RecordingSink::default();
        let mut transport = MockTransport::streaming(&["data: \"never seen\"\n"]);
        transport.status = 502;

        let outcome = orchestrator
            .run(
                "chat_1",
                Box::new(transport),
                AccumulationPolicy::Combined,
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(outcome, StreamOutcome::FailedStatus);
        assert_eq!(sink.contents(), vec!["Request failed: HTTP status 502"]);
        assert_eq!(sink.error_count(), 1);
    }

    #[tokio::test]
    async fn mid_read_error_appends_error_after_partial_content() {
        let orchestrator = StreamOrchestrator::new();
        let sink = RecordingSink::default();
        let mut transport = MockTransport::streaming(&["data: \"partial\"\n"]);
        transport
            .fragments
            .push_back(Err(StrandError::transport("connection reset")));

        let outcome = orchestrator
            .run(
                "chat_1",
                Box::new(transport),
                AccumulationPolicy::NewBubble,
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(outcome, StreamOutcome::FailedRead);
        let contents = sink.contents();
        assert_eq!(contents[0], "partial");
        assert!(contents[1].starts_with("Request failed:"));
        assert_eq!(sink.error_count(), 1);
    }

    #[tokio::test]
    async fn cancel_stops_a_live_stream_and_keeps_prior_messages() {
        let orchestrator = Arc::new(StreamOrchestrator::new());
        let sink = Arc::new(RecordingSink::default());

        let mut transport = MockTransport::streaming(&["data: \"kept\"\n"]);
        transport.hang_at_end = true;

        let handle = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            let sink = Arc::clone(&sink);
            async move {
                orchestrator
                    .run(
                        "chat_1",
                        Box::new(transport),
                        AccumulationPolicy::NewBubble,
                        sink.as_ref(),
                    )
                    .await
            }
        });

        // Let the stream consume its fragment, then cancel.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(orchestrator.is_streaming("chat_1").await);
        assert!(orchestrator.cancel("chat_1").await);

        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome, StreamOutcome::Cancelled);
        assert_eq!(sink.contents(), vec!["kept"]);

        // Cancelling again is a harmless no-op.
        assert!(!orchestrator.cancel("chat_1").await);
    }

    #[tokio::test]
    async fn new_run_supersedes_the_previous_stream_for_the_session() {
        let orchestrator = Arc::new(StreamOrchestrator::new());
        let sink = Arc::new(RecordingSink::default());

        let mut hanging = MockTransport::streaming(&[]);
        hanging.hang_at_end = true;

        let first = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            let sink = Arc::clone(&sink);
            async move {
                orchestrator
                    .run(
                        "chat_1",
                        Box::new(hanging),
                        AccumulationPolicy::NewBubble,
                        sink.as_ref(),
                    )
                    .await
            }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;

        let second = orchestrator
            .run(
                "chat_1",
                Box::new(MockTransport::streaming(&["data: \"second\"\ndata: [DONE]\n"])),
                AccumulationPolicy::NewBubble,
                sink.as_ref(),
            )
            .await
            .unwrap();

        assert_eq!(second, StreamOutcome::Completed);
        assert_eq!(first.await.unwrap().unwrap(), StreamOutcome::Cancelled);
        assert_eq!(sink.contents(), vec!["second"]);
    }

    #[tokio::test]
    async fn streams_of_different_sessions_are_independent() {
        let orchestrator = Arc::new(StreamOrchestrator::new());
        let sink = Arc::new(RecordingSink::default());

        let mut hanging = MockTransport::streaming(&["data: \"one\"\n"]);
        hanging.hang_at_end = true;

        let first = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            let sink = Arc::clone(&sink);
            async move {
                orchestrator
                    .run(
                        "chat_1",
                        Box::new(hanging),
                        AccumulationPolicy::Combined,
                        sink.as_ref(),
                    )
                    .await
            }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;

        // A stream for another session leaves chat_1's stream running.
        orchestrator
            .run(
                "chat_2",
                Box::new(MockTransport::streaming(&["data: \"two\"\n"])),
                AccumulationPolicy::Combined,
                sink.as_ref(),
            )
            .await
            .unwrap();

        assert!(orchestrator.is_streaming("chat_1").await);
        orchestrator.cancel("chat_1").await;
        first.await.unwrap().unwrap();
    }
}
