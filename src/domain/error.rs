//! Domain-level error types for teams-chat-export.
//!
//! All errors are typed with `thiserror`. The two collection failures
//! (`ContainerNotFound`, `NoMessages`) carry the exact text reported back
//! through the host action channel.

use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// No scrollable message list could be located in the current view.
    #[error("Could not find scroll container")]
    ContainerNotFound,

    /// Export attempted with an empty record set.
    #[error("No messages found")]
    NoMessages,

    /// A marker selector string could not be parsed.
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// Input data (fixture, snapshot) is structurally wrong.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create a JSON parse error.
    pub fn json_parse(err: serde_json::Error) -> Self {
        Self::JsonParse {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Create a selector error.
    pub fn invalid_selector(selector: &str, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reported_messages() {
        assert_eq!(
            AppError::ContainerNotFound.to_string(),
            "Could not find scroll container"
        );
        assert_eq!(AppError::NoMessages.to_string(), "No messages found");
    }
}
