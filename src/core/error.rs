use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

/// Failure of a single streaming attempt. Each attempt reports at most one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be sent or the connection failed before a
    /// response arrived.
    Request(String),

    /// The endpoint answered with a non-success status.
    Status {
        /// HTTP status code.
        status: u16,
        /// Short summary of the response body, if one could be read.
        detail: Option<String>,
    },

    /// Reading the response body failed part-way through.
    Body(String),

    /// The response body was not valid UTF-8.
    Decode(String),

    /// The attempt exceeded the configured timeout.
    Timeout(Duration),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Request(reason) => write!(f, "Request failed: {reason}"),
            TransportError::Status { status, detail } => match detail {
                Some(detail) => write!(f, "Server returned {status}: {detail}"),
                None => write!(f, "Server returned {status}"),
            },
            TransportError::Body(reason) => write!(f, "Response stream failed: {reason}"),
            TransportError::Decode(reason) => {
                write!(f, "Response could not be decoded as text: {reason}")
            }
            TransportError::Timeout(limit) => {
                write!(f, "No complete response within {limit:?}")
            }
        }
    }
}

impl StdError for TransportError {}

/// Why a submit never reached the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejection {
    /// Text was empty after trimming.
    Empty,
    /// A response is already streaming.
    Busy,
}

impl fmt::Display for SubmitRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitRejection::Empty => f.write_str("nothing to send"),
            SubmitRejection::Busy => f.write_str("a reply is still streaming"),
        }
    }
}

impl StdError for SubmitRejection {}

/// Pull a readable message out of an error response body.
pub(crate) fn summarize_error_body(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let summary = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .or_else(|| value.get("error").and_then(|v| v.as_str()))
            .or_else(|| value.get("detail").and_then(|v| v.as_str()))
            .or_else(|| value.get("message").and_then(|v| v.as_str()));
        if let Some(text) = summary {
            let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !collapsed.is_empty() {
                return Some(collapsed);
            }
        }
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    const MAX_DETAIL_CHARS: usize = 200;
    if collapsed.chars().count() > MAX_DETAIL_CHARS {
        let cut: String = collapsed.chars().take(MAX_DETAIL_CHARS).collect();
        Some(format!("{cut}…"))
    } else {
        Some(collapsed)
    }
}
