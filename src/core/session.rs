use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{ChatRequest, HistoryMode};
use crate::core::error::{SubmitRejection, TransportError};
use crate::core::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChatStatus {
    #[default]
    Idle,
    Submitted,
    Streaming,
    Error,
}

impl ChatStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatStatus::Idle => "idle",
            ChatStatus::Submitted => "submitted",
            ChatStatus::Streaming => "streaming",
            ChatStatus::Error => "error",
        }
    }

    /// True while an attempt is waiting on or receiving a response.
    pub fn is_in_flight(self) -> bool {
        matches!(self, ChatStatus::Submitted | ChatStatus::Streaming)
    }
}

impl fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the transport needs to start the attempt a submit created.
#[derive(Debug, Clone)]
pub struct StreamStart {
    pub stream_id: u64,
    pub cancel_token: CancellationToken,
    pub request: ChatRequest,
}

/// Conversation state for one chat surface.
///
/// The session never touches the network. `submit` hands back a
/// [`StreamStart`] for the caller to run; results come back through
/// `apply_delta`, `complete` and `fail`, each tagged with the stream id so
/// late messages from superseded attempts are dropped.
#[derive(Debug)]
pub struct ChatSession {
    messages: Vec<Message>,
    status: ChatStatus,
    error: Option<TransportError>,
    history: HistoryMode,
    current_stream_id: u64,
    stream_cancel_token: Option<CancellationToken>,
    active_index: Option<usize>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(HistoryMode::default())
    }
}

impl ChatSession {
    pub fn new(history: HistoryMode) -> Self {
        Self {
            messages: Vec::new(),
            status: ChatStatus::Idle,
            error: None,
            history,
            current_stream_id: 0,
            stream_cancel_token: None,
            active_index: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    pub fn error(&self) -> Option<&TransportError> {
        self.error.as_ref()
    }

    pub fn history_mode(&self) -> HistoryMode {
        self.history
    }

    pub fn current_stream_id(&self) -> u64 {
        self.current_stream_id
    }

    /// The assistant message receiving deltas, if an attempt is live.
    pub fn active_message(&self) -> Option<&Message> {
        self.active_index.and_then(|index| self.messages.get(index))
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.stream_cancel_token.is_some() && self.current_stream_id == stream_id
    }

    pub fn submit(&mut self, text: &str) -> Result<StreamStart, SubmitRejection> {
        let text = text.trim();
        if text.is_empty() {
            debug!("rejected submit: empty text");
            return Err(SubmitRejection::Empty);
        }
        if self.status == ChatStatus::Streaming {
            debug!("rejected submit: reply still streaming");
            return Err(SubmitRejection::Busy);
        }

        let (cancel_token, stream_id) = self.start_new_stream();

        let user_message = Message::user(text);
        let request = ChatRequest::from_transcript(&self.messages, &user_message, self.history);
        self.messages.push(user_message);
        self.error = None;
        self.status = ChatStatus::Submitted;

        self.messages.push(Message::assistant_placeholder());
        self.active_index = Some(self.messages.len() - 1);

        debug!(stream_id, messages = self.messages.len(), "submitted message");
        Ok(StreamStart {
            stream_id,
            cancel_token,
            request,
        })
    }

    /// Returns false when the chunk was discarded.
    pub fn apply_delta(&mut self, stream_id: u64, chunk: &str) -> bool {
        if !self.accepts(stream_id) {
            debug!(stream_id, "discarded stale delta");
            return false;
        }
        let Some(message) = self.active_index.and_then(|i| self.messages.get_mut(i)) else {
            return false;
        };
        message.push_text(chunk);
        self.status = ChatStatus::Streaming;
        true
    }

    pub fn complete(&mut self, stream_id: u64) -> bool {
        if !self.accepts(stream_id) {
            debug!(stream_id, "discarded stale completion");
            return false;
        }
        self.finish_stream();
        self.status = ChatStatus::Idle;
        debug!(stream_id, "stream completed");
        true
    }

    /// Records the failure. Any partial assistant text stays in place.
    pub fn fail(&mut self, stream_id: u64, error: TransportError) -> bool {
        if !self.accepts(stream_id) {
            debug!(stream_id, "discarded stale error");
            return false;
        }
        self.finish_stream();
        debug!(stream_id, %error, "stream failed");
        self.error = Some(error);
        self.status = ChatStatus::Error;
        true
    }

    /// Aborts the live attempt, if any. Returns whether one was aborted.
    pub fn cancel(&mut self) -> bool {
        let Some(token) = self.stream_cancel_token.take() else {
            return false;
        };
        token.cancel();
        self.active_index = None;
        if self.status.is_in_flight() {
            self.status = ChatStatus::Idle;
        }
        debug!(stream_id = self.current_stream_id, "stream cancelled");
        true
    }

    fn accepts(&self, stream_id: u64) -> bool {
        self.is_current_stream(stream_id) && self.status.is_in_flight()
    }

    fn start_new_stream(&mut self) -> (CancellationToken, u64) {
        if let Some(token) = self.stream_cancel_token.take() {
            token.cancel();
        }
        self.active_index = None;

        self.current_stream_id += 1;
        let token = CancellationToken::new();
        self.stream_cancel_token = Some(token.clone());
        (token, self.current_stream_id)
    }

    fn finish_stream(&mut self) {
        self.stream_cancel_token = None;
        self.active_index = None;
    }
}
