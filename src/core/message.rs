use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Label shown next to a message bubble.
    pub fn display_label(self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Lowkey",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_assistant(self) -> bool {
        self == Role::Assistant
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// Opaque message identifier, unique within the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

static NEXT_MESSAGE_SEQ: AtomicU64 = AtomicU64::new(1);

impl MessageId {
    pub fn generate() -> Self {
        let seq = NEXT_MESSAGE_SEQ.fetch_add(1, Ordering::Relaxed);
        let mut salt = [0u8; 4];
        if getrandom::fill(&mut salt).is_err() {
            salt = (Utc::now().timestamp_subsec_nanos()).to_le_bytes();
        }
        let salt = salt
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>();
        Self(format!("msg-{salt}-{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One piece of message content. Only text is rendered; anything else the
/// transport hands us is kept in order but skipped by the projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePart {
    Text(String),
    Unsupported { kind: String },
}

impl MessagePart {
    pub fn text(value: impl Into<String>) -> Self {
        MessagePart::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessagePart::Text(value) => Some(value),
            MessagePart::Unsupported { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub parts: Vec<MessagePart>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, parts: Vec<MessagePart>) -> Self {
        Self {
            id: MessageId::generate(),
            role,
            parts,
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![MessagePart::text(text)])
    }

    /// Empty assistant bubble that receives streamed deltas.
    pub fn assistant_placeholder() -> Self {
        Self::new(Role::Assistant, vec![MessagePart::text(String::new())])
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn is_assistant(&self) -> bool {
        self.role.is_assistant()
    }

    /// Concatenation of all text parts in order.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(MessagePart::as_text).collect()
    }

    /// Appends to the trailing text part, or starts a new one when the last
    /// part is not text.
    pub(crate) fn push_text(&mut self, chunk: &str) {
        match self.parts.last_mut() {
            Some(MessagePart::Text(value)) => value.push_str(chunk),
            _ => self.parts.push(MessagePart::text(chunk)),
        }
    }
}
