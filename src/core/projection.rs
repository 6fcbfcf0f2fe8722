//! Render-ready view of a session's transcript.
//!
//! [`project`] is a pure function of session state: calling it after every
//! mutation always yields the same entries for the same state, so a
//! presentation layer can simply re-render from scratch.

use chrono::{DateTime, Local, Utc};

use crate::core::message::{Message, MessageId, MessagePart, Role};
use crate::core::session::{ChatSession, ChatStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPart<'a> {
    Text(&'a str),
    /// A part kind the presentation layer does not draw.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderEntry<'a> {
    pub id: &'a MessageId,
    pub role: Role,
    pub parts: Vec<RenderPart<'a>>,
    pub created_at: DateTime<Utc>,
    pub is_actively_streaming: bool,
}

impl<'a> RenderEntry<'a> {
    /// Text parts only, in order.
    pub fn text_parts(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.parts.iter().filter_map(|part| match part {
            RenderPart::Text(text) => Some(*text),
            RenderPart::Ignored => None,
        })
    }

    /// Relative time label for the message, measured against `now`.
    pub fn timestamp_label(&self, now: DateTime<Utc>) -> String {
        let age = now.signed_duration_since(self.created_at);
        match age.num_minutes() {
            ..=0 => "just now".to_string(),
            minutes @ 1..=59 => format!("{minutes}m ago"),
            _ => self
                .created_at
                .with_timezone(&Local)
                .format("%H:%M")
                .to_string(),
        }
    }
}

pub fn project(session: &ChatSession) -> Vec<RenderEntry<'_>> {
    let messages = session.messages();
    let streaming = session.status() == ChatStatus::Streaming;
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| {
            let is_last = index + 1 == messages.len();
            render_entry(message, streaming && is_last && message.is_assistant())
        })
        .collect()
}

fn render_entry(message: &Message, is_actively_streaming: bool) -> RenderEntry<'_> {
    RenderEntry {
        id: &message.id,
        role: message.role,
        created_at: message.created_at,
        parts: message
            .parts
            .iter()
            .map(|part| match part {
                MessagePart::Text(text) => RenderPart::Text(text),
                MessagePart::Unsupported { .. } => RenderPart::Ignored,
            })
            .collect(),
        is_actively_streaming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::TransportError;

    #[test]
    fn empty_session_projects_nothing() {
        assert!(project(&ChatSession::default()).is_empty());
    }

    #[test]
    fn only_trailing_assistant_streams() {
        let mut session = ChatSession::default();
        let id = session.submit("tokyo hidden gems").unwrap().stream_id;

        let submitted = project(&session);
        assert_eq!(submitted.len(), 2);
        assert!(submitted.iter().all(|entry| !entry.is_actively_streaming));

        session.apply_delta(id, "Tokyo");
        let streaming = project(&session);
        assert!(!streaming[0].is_actively_streaming);
        assert!(streaming[1].is_actively_streaming);
        assert_eq!(streaming[1].role, Role::Assistant);
        assert_eq!(streaming[1].text_parts().collect::<Vec<_>>(), vec!["Tokyo"]);

        session.complete(id);
        assert!(project(&session).iter().all(|e| !e.is_actively_streaming));
    }

    #[test]
    fn errored_stream_is_not_marked_active() {
        let mut session = ChatSession::default();
        let id = session.submit("hi").unwrap().stream_id;
        session.apply_delta(id, "Hi");
        session.fail(id, TransportError::Body("reset".into()));

        let entries = project(&session);
        assert!(!entries[1].is_actively_streaming);
        assert_eq!(entries[1].text_parts().collect::<String>(), "Hi");
    }

    #[test]
    fn projection_is_repeatable() {
        let mut session = ChatSession::default();
        let id = session.submit("best street food").unwrap().stream_id;
        session.apply_delta(id, "tacos");
        assert_eq!(project(&session), project(&session));
    }

    #[test]
    fn unsupported_parts_project_as_ignored() {
        let message = Message::new(
            Role::Assistant,
            vec![
                MessagePart::text("see "),
                MessagePart::Unsupported {
                    kind: "source-url".into(),
                },
                MessagePart::text("map"),
            ],
        );
        let entry = render_entry(&message, false);
        assert_eq!(
            entry.parts,
            vec![
                RenderPart::Text("see "),
                RenderPart::Ignored,
                RenderPart::Text("map")
            ]
        );
        assert_eq!(entry.text_parts().collect::<String>(), "see map");
    }

    #[test]
    fn entries_carry_creation_time() {
        let mut message = Message::user("tokyo hidden gems");
        let created = message.created_at;
        let entry = render_entry(&message, false);
        assert_eq!(entry.created_at, created);
        assert_eq!(entry.timestamp_label(created), "just now");
        assert_eq!(
            entry.timestamp_label(created + chrono::Duration::seconds(59)),
            "just now"
        );
        assert_eq!(
            entry.timestamp_label(created + chrono::Duration::minutes(5)),
            "5m ago"
        );

        message.created_at = created - chrono::Duration::hours(3);
        let old = render_entry(&message, false);
        let expected = message
            .created_at
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string();
        assert_eq!(old.timestamp_label(created), expected);
    }
}
