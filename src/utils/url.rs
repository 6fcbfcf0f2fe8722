//! URL utilities for the chat endpoint
//!
//! Endpoints come from config files and command-line flags, so they are
//! normalized and checked once before any request is built.

/// Normalize an endpoint URL by removing surrounding whitespace and trailing slashes
///
/// # Examples
///
/// ```
/// use lowkey::utils::url::normalize_endpoint;
///
/// assert_eq!(normalize_endpoint("http://localhost:8000/api/chat"), "http://localhost:8000/api/chat");
/// assert_eq!(normalize_endpoint(" http://localhost:8000/api/chat/// "), "http://localhost:8000/api/chat");
/// ```
pub fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim().trim_end_matches('/').to_string()
}

/// Normalize an endpoint and require an absolute `http` or `https` URL with a host
pub fn validate_endpoint(endpoint: &str) -> Result<String, String> {
    let normalized = normalize_endpoint(endpoint);
    if normalized.is_empty() {
        return Err("endpoint is empty".to_string());
    }

    let parsed = reqwest::Url::parse(&normalized)
        .map_err(|e| format!("{normalized} is not a valid URL: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(format!(
                "{normalized} uses unsupported scheme '{other}' (expected http or https)"
            ))
        }
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(format!("{normalized} has no host"));
    }

    Ok(normalized)
}
