use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::ChatRequest;
use crate::core::error::{summarize_error_body, TransportError};

/// What a streaming attempt reports back. Every attempt that is not cancelled
/// ends with exactly one `End` or one `Error`.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamMessage {
    Chunk(String),
    Error(TransportError),
    End,
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub endpoint: String,
    pub request: ChatRequest,
    pub timeout: Option<Duration>,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let StreamParams {
            client,
            endpoint,
            request,
            timeout,
            cancel_token,
            stream_id,
        } = params;

        let sink = StreamSink {
            tx: self.tx.clone(),
            cancel_token: cancel_token.clone(),
            stream_id,
        };

        tokio::spawn(async move {
            debug!(stream_id, %endpoint, "starting chat stream");
            let attempt = stream_response(&client, &endpoint, &request, &sink);
            let outcome = tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "chat stream aborted");
                    return;
                }
                outcome = with_timeout(attempt, timeout) => outcome,
            };

            match outcome {
                Ok(()) => sink.send(StreamMessage::End),
                Err(error) => {
                    warn!(stream_id, %error, "chat stream failed");
                    sink.send(StreamMessage::Error(error));
                }
            }
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}

/// Tags outgoing messages with the attempt id and goes quiet once the
/// attempt is cancelled.
struct StreamSink {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
    cancel_token: CancellationToken,
    stream_id: u64,
}

impl StreamSink {
    fn send(&self, message: StreamMessage) {
        if self.cancel_token.is_cancelled() {
            return;
        }
        let _ = self.tx.send((message, self.stream_id));
    }
}

async fn with_timeout<F>(attempt: F, limit: Option<Duration>) -> Result<(), TransportError>
where
    F: std::future::Future<Output = Result<(), TransportError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, attempt)
            .await
            .unwrap_or(Err(TransportError::Timeout(limit))),
        None => attempt.await,
    }
}

async fn stream_response(
    client: &reqwest::Client,
    endpoint: &str,
    request: &ChatRequest,
    sink: &StreamSink,
) -> Result<(), TransportError> {
    let response = client
        .post(endpoint)
        .header("Content-Type", "application/json")
        .json(request)
        .send()
        .await
        .map_err(|e| TransportError::Request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let detail = response
            .text()
            .await
            .ok()
            .and_then(|body| summarize_error_body(&body));
        return Err(TransportError::Status {
            status: status.as_u16(),
            detail,
        });
    }

    let mut decoder = Utf8ChunkDecoder::default();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let bytes = chunk.map_err(|e| TransportError::Body(e.to_string()))?;
        let text = decoder.decode(&bytes)?;
        if !text.is_empty() {
            sink.send(StreamMessage::Chunk(text));
        }
    }
    decoder.finish()
}

/// Turns arbitrarily split body bytes into text, holding back an incomplete
/// trailing code point until the rest of it arrives.
#[derive(Debug, Default)]
pub(crate) struct Utf8ChunkDecoder {
    pending: Vec<u8>,
    consumed: usize,
}

impl Utf8ChunkDecoder {
    pub(crate) fn decode(&mut self, bytes: &[u8]) -> Result<String, TransportError> {
        self.pending.extend_from_slice(bytes);

        let valid_up_to = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(err) => {
                return Err(TransportError::Decode(format!(
                    "invalid UTF-8 at byte {}",
                    self.consumed + err.valid_up_to()
                )));
            }
        };

        let complete: Vec<u8> = self.pending.drain(..valid_up_to).collect();
        self.consumed += complete.len();
        String::from_utf8(complete).map_err(|e| TransportError::Decode(e.to_string()))
    }

    pub(crate) fn finish(self) -> Result<(), TransportError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(TransportError::Decode(format!(
                "stream ended inside a multi-byte character at byte {}",
                self.consumed
            )))
        }
    }
}
