//! HTTP response adapter for the core transport contract.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use strand_core::transport::{ContentKind, StreamingTransport};
use strand_core::{Result, StrandError};

/// Adapts a `reqwest` response to [`StreamingTransport`].
///
/// The chunked body surfaces as decoded text fragments; invalid UTF-8 is
/// replaced rather than rejected, matching the lossy decoding the rest of
/// the pipeline assumes.
pub struct HttpTransport {
    status: u16,
    content_kind: ContentKind,
    chunks: BoxStream<'static, reqwest::Result<bytes::Bytes>>,
}

impl HttpTransport {
    /// Wraps a response, capturing its status and declared content kind.
    pub fn new(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let content_kind = ContentKind::from_content_type(content_type);

        tracing::debug!(
            "[HttpTransport] status={} content_type={:?}",
            status,
            content_type
        );

        Self {
            status,
            content_kind,
            chunks: response.bytes_stream().boxed(),
        }
    }
}

#[async_trait]
impl StreamingTransport for HttpTransport {
    fn status(&self) -> u16 {
        self.status
    }

    fn content_kind(&self) -> ContentKind {
        self.content_kind
    }

    async fn next_fragment(&mut self) -> Option<Result<String>> {
        match self.chunks.next().await {
            Some(Ok(bytes)) => Some(Ok(String::from_utf8_lossy(&bytes).into_owned())),
            Some(Err(err)) => Some(Err(StrandError::transport(format!(
                "Failed to read stream chunk: {err}"
            )))),
            None => None,
        }
    }

    async fn read_to_string(mut self: Box<Self>) -> Result<String> {
        let mut body = String::new();
        while let Some(chunk) = self.chunks.next().await {
            let bytes = chunk
                .map_err(|err| StrandError::transport(format!("Failed to read body: {err}")))?;
            body.push_str(&String::from_utf8_lossy(&bytes));
        }
        Ok(body)
    }
}
