use crate::core::config::data::{ClientSettings, Config};

impl Config {
    /// Lines describing the stored configuration, with defaults noted.
    pub fn describe(&self) -> Vec<String> {
        let defaults = ClientSettings::default();
        let mut lines = vec!["Current configuration:".to_string()];
        match &self.endpoint {
            Some(endpoint) => lines.push(format!("  endpoint: {endpoint}")),
            None => lines.push(format!("  endpoint: {} (default)", defaults.endpoint)),
        }
        match self.history {
            Some(mode) => lines.push(format!("  history: {mode}")),
            None => lines.push(format!("  history: {} (default)", defaults.history)),
        }
        match self.timeout_secs {
            Some(secs) => lines.push(format!("  timeout: {secs}s")),
            None => lines.push("  timeout: (none)".to_string()),
        }
        match &self.suggestions {
            Some(list) if !list.is_empty() => {
                lines.push("  suggestions:".to_string());
                lines.extend(list.iter().map(|s| format!("    {s}")));
            }
            Some(_) => lines.push("  suggestions: (none)".to_string()),
            None => lines.push("  suggestions: (built-in)".to_string()),
        }
        lines
    }

    pub fn print_all(&self) {
        for line in self.describe() {
            println!("{line}");
        }
    }
}

impl ClientSettings {
    /// Lines describing the settings a chat would actually use.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec![
            "Effective settings:".to_string(),
            format!("  endpoint: {}", self.endpoint),
            format!("  history: {}", self.history),
        ];
        match self.timeout {
            Some(limit) => lines.push(format!("  timeout: {limit:?}")),
            None => lines.push("  timeout: (none)".to_string()),
        }
        if self.suggestions.is_empty() {
            lines.push("  suggestions: (none)".to_string());
        } else {
            lines.push("  suggestions:".to_string());
            lines.extend(self.suggestions.iter().map(|s| format!("    {s}")));
        }
        lines
    }
}
