//! The chat surface a presentation layer talks to.
//!
//! [`ChatClient`] owns a [`ChatSession`], starts a streaming attempt for every
//! accepted submit, and feeds the attempt's messages back into the session.
//! Every state change bumps a revision number on a `watch` channel so a UI
//! can re-render by calling [`ChatClient::transcript`] again.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::api::HistoryMode;
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};
use crate::core::config::ClientSettings;
use crate::core::error::{SubmitRejection, TransportError};
use crate::core::input::InputBuffer;
use crate::core::projection::{project, RenderEntry};
use crate::core::session::{ChatSession, ChatStatus};
use crate::core::suggestions::Suggestions;
use crate::utils::logging::LoggingState;

/// Outcome of applying one stream message.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Delta { stream_id: u64, text: String },
    Completed { stream_id: u64 },
    Failed { stream_id: u64, error: TransportError },
    /// The message belonged to a superseded or finished attempt.
    Discarded { stream_id: u64 },
}

pub struct ChatClient {
    session: ChatSession,
    http: reqwest::Client,
    endpoint: String,
    timeout: Option<Duration>,
    suggestions: Suggestions,
    stream_service: ChatStreamService,
    stream_rx: mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    revision: watch::Sender<u64>,
    transcript_log: LoggingState,
}

impl ChatClient {
    pub fn new(settings: ClientSettings) -> Self {
        let (stream_service, stream_rx) = ChatStreamService::new();
        let (revision, _) = watch::channel(0);
        Self {
            session: ChatSession::new(settings.history),
            http: reqwest::Client::new(),
            endpoint: settings.endpoint,
            timeout: settings.timeout,
            suggestions: Suggestions::new(settings.suggestions),
            stream_service,
            stream_rx,
            revision,
            transcript_log: LoggingState::disabled(),
        }
    }

    pub fn with_transcript_log(mut self, logging: LoggingState) -> Self {
        self.transcript_log = logging;
        self
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn status(&self) -> ChatStatus {
        self.session.status()
    }

    pub fn error(&self) -> Option<&TransportError> {
        self.session.error()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn history_mode(&self) -> HistoryMode {
        self.session.history_mode()
    }

    pub fn transcript(&self) -> Vec<RenderEntry<'_>> {
        project(&self.session)
    }

    /// Suggestions to show right now; empty once the conversation started.
    pub fn visible_suggestions(&self) -> &[String] {
        self.suggestions.visible(self.session.messages().len())
    }

    pub fn transcript_log(&self) -> &LoggingState {
        &self.transcript_log
    }

    pub fn transcript_log_mut(&mut self) -> &mut LoggingState {
        &mut self.transcript_log
    }

    /// Receiver whose value increases on every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Starts a new attempt for `text`. Returns immediately with the attempt's
    /// stream id; the reply arrives through [`ChatClient::next_event`].
    pub fn submit(&mut self, text: &str) -> Result<u64, SubmitRejection> {
        let start = self.session.submit(text)?;
        let stream_id = start.stream_id;

        if let Some(user_message) = self.session.messages().iter().rev().find(|m| m.is_user()) {
            if let Err(e) = self.transcript_log.log_transcript_message(user_message) {
                warn!("Failed to log message: {e}");
            }
        }

        info!(stream_id, endpoint = %self.endpoint, "sending prompt");
        self.stream_service.spawn_stream(StreamParams {
            client: self.http.clone(),
            endpoint: self.endpoint.clone(),
            request: start.request,
            timeout: self.timeout,
            cancel_token: start.cancel_token,
            stream_id,
        });
        self.notify();
        Ok(stream_id)
    }

    /// Submits the buffer's text if it may be sent. On rejection the buffer
    /// keeps its text.
    pub fn submit_input(&mut self, input: &mut InputBuffer) -> Result<u64, SubmitRejection> {
        if !input.can_submit(self.status()) {
            return Err(if input.text().trim().is_empty() {
                SubmitRejection::Empty
            } else {
                SubmitRejection::Busy
            });
        }
        let text = input.consume();
        self.submit(&text)
    }

    /// Sends a visible suggestion. Hidden suggestions count as nothing to send.
    pub fn submit_suggestion(&mut self, index: usize) -> Result<u64, SubmitRejection> {
        let Some(text) = self.visible_suggestions().get(index).cloned() else {
            return Err(SubmitRejection::Empty);
        };
        self.submit(&text)
    }

    pub fn cancel(&mut self) -> bool {
        let cancelled = self.session.cancel();
        if cancelled {
            self.notify();
        }
        cancelled
    }

    pub fn handle_stream_message(&mut self, message: StreamMessage, stream_id: u64) -> SessionEvent {
        let applied = match message {
            StreamMessage::Chunk(text) => {
                if self.session.apply_delta(stream_id, &text) {
                    Some(SessionEvent::Delta { stream_id, text })
                } else {
                    None
                }
            }
            StreamMessage::End => {
                if self.session.complete(stream_id) {
                    self.log_last_reply();
                    Some(SessionEvent::Completed { stream_id })
                } else {
                    None
                }
            }
            StreamMessage::Error(error) => {
                if self.session.fail(stream_id, error.clone()) {
                    Some(SessionEvent::Failed { stream_id, error })
                } else {
                    None
                }
            }
        };

        match applied {
            Some(event) => {
                self.notify();
                event
            }
            None => {
                debug!(stream_id, "ignored message from inactive stream");
                SessionEvent::Discarded { stream_id }
            }
        }
    }

    /// Waits for the next stream message and applies it.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let (message, stream_id) = self.stream_rx.recv().await?;
        Some(self.handle_stream_message(message, stream_id))
    }

    /// Drives events until no attempt is in flight.
    pub async fn wait_until_settled(&mut self) {
        while self.status().is_in_flight() {
            if self.next_event().await.is_none() {
                break;
            }
        }
    }

    fn log_last_reply(&self) {
        if let Some(reply) = self.session.messages().last().filter(|m| m.is_assistant()) {
            if let Err(e) = self.transcript_log.log_transcript_message(reply) {
                warn!("Failed to log response: {e}");
            }
        }
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    #[cfg(test)]
    pub(crate) fn stream_service(&self) -> &ChatStreamService {
        &self.stream_service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use tempfile::TempDir;

    // Port 9 (discard) refuses connections; tests drive the session through
    // handle_stream_message and never read what the spawned tasks report.
    fn offline_client() -> ChatClient {
        ChatClient::new(ClientSettings {
            endpoint: "http://127.0.0.1:9/api/chat".to_string(),
            ..Default::default()
        })
    }

    fn last_text(client: &ChatClient) -> String {
        client
            .transcript()
            .last()
            .map(|entry| entry.text_parts().collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn scenario_submit_stream_complete() {
        let mut client = offline_client();
        let id = client.submit("tokyo hidden gems").expect("submit");

        let entries = client.transcript();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, Role::User);
        assert_eq!(entries[0].text_parts().collect::<String>(), "tokyo hidden gems");
        assert_eq!(entries[1].text_parts().collect::<String>(), "");
        assert_eq!(client.status(), ChatStatus::Submitted);

        for chunk in ["To", "kyo", " is"] {
            let event = client.handle_stream_message(StreamMessage::Chunk(chunk.into()), id);
            assert!(matches!(event, SessionEvent::Delta { .. }));
        }
        assert_eq!(last_text(&client), "Tokyo is");
        assert_eq!(client.status(), ChatStatus::Streaming);
        assert!(client.transcript()[1].is_actively_streaming);

        let event = client.handle_stream_message(StreamMessage::End, id);
        assert_eq!(event, SessionEvent::Completed { stream_id: id });
        assert_eq!(client.status(), ChatStatus::Idle);

        let late = client.handle_stream_message(StreamMessage::Chunk("!".into()), id);
        assert_eq!(late, SessionEvent::Discarded { stream_id: id });
        assert_eq!(last_text(&client), "Tokyo is");
    }

    #[tokio::test]
    async fn scenario_server_error_mid_stream() {
        let mut client = offline_client();
        let id = client.submit("best street food").unwrap();
        client.handle_stream_message(StreamMessage::Chunk("Hi".into()), id);

        let error = TransportError::Status {
            status: 500,
            detail: None,
        };
        client.handle_stream_message(StreamMessage::Error(error.clone()), id);

        assert_eq!(client.status(), ChatStatus::Error);
        assert_eq!(client.error(), Some(&error));
        assert_eq!(last_text(&client), "Hi");
    }

    #[tokio::test]
    async fn stale_messages_after_resubmit_have_no_effect() {
        let mut client = offline_client();
        let first = client.submit("first").unwrap();
        let second = client.submit("second").unwrap();
        assert_ne!(first, second);

        // Out-of-order delivery: the superseded attempt reports late.
        for message in [
            StreamMessage::Chunk("stale".into()),
            StreamMessage::Error(TransportError::Body("reset".into())),
            StreamMessage::End,
        ] {
            assert_eq!(
                client.handle_stream_message(message, first),
                SessionEvent::Discarded { stream_id: first }
            );
        }
        assert_eq!(client.status(), ChatStatus::Submitted);
        assert!(client.error().is_none());

        client.handle_stream_message(StreamMessage::Chunk("fresh".into()), second);
        assert_eq!(last_text(&client), "fresh");
    }

    #[tokio::test]
    async fn queued_stale_message_is_discarded_by_next_event() {
        let mut client = offline_client();
        let first = client.submit("first").unwrap();
        let second = client.submit("second").unwrap();
        client
            .stream_service()
            .send_for_test(StreamMessage::Chunk("late".into()), first);

        // The refused connection for `second` may report before or after the
        // injected chunk; the stale chunk must be discarded either way.
        let mut saw_discard = false;
        while !saw_discard {
            match client.next_event().await.expect("event") {
                SessionEvent::Discarded { stream_id } if stream_id == first => saw_discard = true,
                SessionEvent::Failed { stream_id, .. } => assert_eq!(stream_id, second),
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert_eq!(client.session().messages()[1].text(), "");
    }

    #[tokio::test]
    async fn input_buffer_gating() {
        let mut client = offline_client();
        let mut input = InputBuffer::new();

        input.set_text("   ");
        assert_eq!(client.submit_input(&mut input), Err(SubmitRejection::Empty));
        assert!(client.transcript().is_empty());

        input.set_text("underrated beaches");
        let id = client.submit_input(&mut input).expect("accepted");
        assert_eq!(input.text(), "");
        client.handle_stream_message(StreamMessage::Chunk("Okay".into()), id);

        input.set_text("another one");
        assert_eq!(client.submit_input(&mut input), Err(SubmitRejection::Busy));
        assert_eq!(input.text(), "another one");
        assert_eq!(client.transcript().len(), 2);
        assert_eq!(client.session().current_stream_id(), id);
    }

    #[tokio::test]
    async fn suggestions_submit_and_then_hide() {
        let mut client = offline_client();
        assert_eq!(client.visible_suggestions().len(), 3);

        client.submit_suggestion(1).expect("submit");
        assert_eq!(
            client.transcript()[0].text_parts().collect::<String>(),
            "underrated beaches"
        );
        assert!(client.visible_suggestions().is_empty());
        assert_eq!(client.submit_suggestion(7), Err(SubmitRejection::Empty));
    }

    #[tokio::test]
    async fn hidden_suggestions_cannot_be_sent() {
        let mut client = offline_client();
        let id = client.submit("3 days in tokyo").unwrap();
        client.handle_stream_message(StreamMessage::End, id);

        assert_eq!(client.submit_suggestion(0), Err(SubmitRejection::Empty));
        assert_eq!(client.transcript().len(), 2);
        assert_eq!(client.session().current_stream_id(), id);
    }

    #[tokio::test]
    async fn revisions_advance_on_changes_only() {
        let mut client = offline_client();
        let mut changes = client.subscribe();
        let start = *changes.borrow_and_update();

        let id = client.submit("hi").unwrap();
        assert!(changes.has_changed().unwrap());
        let after_submit = *changes.borrow_and_update();
        assert!(after_submit > start);

        client.handle_stream_message(StreamMessage::Chunk("x".into()), id + 1);
        assert!(!changes.has_changed().unwrap());

        client.cancel();
        assert!(changes.has_changed().unwrap());
        assert_eq!(client.status(), ChatStatus::Idle);
    }

    #[tokio::test]
    async fn completed_turns_reach_transcript_log() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("lowkey.log");
        let logging = LoggingState::new(Some(path.to_string_lossy().into_owned())).unwrap();
        let mut client = offline_client().with_transcript_log(logging);

        let id = client.submit("tokyo hidden gems").unwrap();
        client.handle_stream_message(StreamMessage::Chunk("Yanaka Ginza".into()), id);
        client.handle_stream_message(StreamMessage::End, id);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "You: tokyo hidden gems\n\nLowkey: Yanaka Ginza\n\n");
    }
}
