use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::message::{Message, MessageId, MessagePart, Role};

/// How much of the transcript goes out with each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    /// Every prior turn plus the new prompt.
    #[default]
    Full,
    /// Only the new prompt.
    Latest,
}

impl HistoryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryMode::Full => "full",
            HistoryMode::Latest => "latest",
        }
    }
}

impl fmt::Display for HistoryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(HistoryMode::Full),
            "latest" => Ok(HistoryMode::Latest),
            other => Err(format!("invalid history mode: {other} (expected full or latest)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UiPart {
    Text { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiMessage {
    pub id: MessageId,
    pub role: Role,
    pub parts: Vec<UiPart>,
}

impl UiMessage {
    pub fn from_message(message: &Message) -> Self {
        let parts = message
            .parts
            .iter()
            .filter_map(|part| match part {
                MessagePart::Text(text) => Some(UiPart::Text { text: text.clone() }),
                MessagePart::Unsupported { .. } => None,
            })
            .collect();
        Self {
            id: message.id.clone(),
            role: message.role,
            parts,
        }
    }

    /// First text part, if any.
    pub fn text(&self) -> Option<&str> {
        self.parts.iter().map(|UiPart::Text { text }| text.as_str()).next()
    }
}

/// Body posted to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<UiMessage>,
}

impl ChatRequest {
    /// Builds the payload for `new_user`, drawing earlier turns from `prior`
    /// when the mode asks for them. Assistant turns with no text (a cancelled
    /// or empty reply) are left out.
    pub fn from_transcript(prior: &[Message], new_user: &Message, mode: HistoryMode) -> Self {
        let mut messages = Vec::new();
        if mode == HistoryMode::Full {
            messages.extend(
                prior
                    .iter()
                    .filter(|message| !message.is_assistant() || !message.text().trim().is_empty())
                    .map(UiMessage::from_message),
            );
        }
        messages.push(UiMessage::from_message(new_user));
        Self { messages }
    }
}
