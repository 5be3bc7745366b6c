use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Network unreachable: {0}")]
    Unreachable(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Maximum length for response bodies quoted in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl NetworkError {
    /// Map a reqwest failure onto the variant callers care about
    pub fn classify(err: reqwest::Error) -> Self {
        let target = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown url".to_string());

        if err.is_timeout() {
            NetworkError::Timeout(target)
        } else if err.is_connect() {
            NetworkError::Unreachable(target)
        } else if err.is_builder() {
            NetworkError::InvalidRequest(err.to_string())
        } else {
            NetworkError::Transport(err)
        }
    }
}

/// Truncate a response body to avoid logging excessive data
pub fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        body.to_string()
    } else {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }
}
