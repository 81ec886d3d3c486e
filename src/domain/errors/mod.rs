// Domain errors - Error types for the domain layer

use thiserror::Error;

/// Domain-specific error types
#[derive(Error, Debug)]
pub enum DomainError {
    /// External tool could not be spawned or failed its version check
    #[error("Tool unavailable: {tool}")]
    ToolUnavailable { tool: String },

    /// Media probe failed or returned unusable data
    #[error("Failed to probe media file: {message}")]
    Probe { message: String },

    /// Job parameters out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Transcoding tool exited with a failure status
    #[error("Segmentation failed: {message}")]
    JobFailed {
        exit_code: Option<i32>,
        message: String,
    },

    /// Job was cancelled before the tool finished
    #[error("Segmentation cancelled")]
    Cancelled,

    /// Local I/O error
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Settings file could not be read or parsed
    #[error("Invalid settings: {0}")]
    Settings(String),
}

impl DomainError {
    /// Create a tool unavailable error
    pub fn tool_unavailable(tool: impl Into<String>) -> Self {
        Self::ToolUnavailable { tool: tool.into() }
    }

    /// Create a probe error
    pub fn probe(message: impl Into<String>) -> Self {
        Self::Probe {
            message: message.into(),
        }
    }

    /// Create an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether this error ended a job the caller cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
