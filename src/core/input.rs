//! Pending user text and the rules for when it may be sent.

use crate::core::session::ChatStatus;

const PLACEHOLDER_STREAMING: &str = "lowkey is typing...";
const PLACEHOLDER_READY: &str = "ask for the vibe...";

#[derive(Debug, Default, Clone)]
pub struct InputBuffer {
    text: String,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&mut self, value: impl Into<String>) {
        self.text = value.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn can_submit(&self, status: ChatStatus) -> bool {
        !self.text.trim().is_empty() && status != ChatStatus::Streaming
    }

    /// Returns the trimmed text and clears the buffer. Call only after
    /// [`InputBuffer::can_submit`] said yes.
    pub fn consume(&mut self) -> String {
        let taken = std::mem::take(&mut self.text);
        taken.trim().to_string()
    }

    pub fn placeholder(status: ChatStatus) -> &'static str {
        if status == ChatStatus::Streaming {
            PLACEHOLDER_STREAMING
        } else {
            PLACEHOLDER_READY
        }
    }
}
