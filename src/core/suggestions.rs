/// Prompts offered before the first message is sent.
pub const DEFAULT_SUGGESTIONS: [&str; 3] = [
    "tokyo hidden gems",
    "underrated beaches",
    "best street food",
];

pub const GREETING: &str = "hey! where are we exploring today?";
pub const GREETING_DETAIL: &str =
    "ask me anything about travel - hidden gems, local spots, underrated destinations";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestions {
    items: Vec<String>,
}

impl Default for Suggestions {
    fn default() -> Self {
        Self::new(DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect())
    }
}

impl Suggestions {
    pub fn new(items: Vec<String>) -> Self {
        Self { items }
    }

    /// Suggestions only show on an empty transcript.
    pub fn visible(&self, transcript_len: usize) -> &[String] {
        if transcript_len == 0 {
            &self.items
        } else {
            &[]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_order() {
        let suggestions = Suggestions::default();
        let visible = suggestions.visible(0);
        assert_eq!(visible.len(), 3);
        assert_eq!(visible[0], "tokyo hidden gems");
        assert_eq!(visible[2], "best street food");
    }

    #[test]
    fn hidden_once_conversation_starts() {
        let suggestions = Suggestions::default();
        assert_eq!(suggestions.visible(0).len(), 3);
        assert!(suggestions.visible(2).is_empty());
    }
}
