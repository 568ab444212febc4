//! Error types for the authentication driver.
//!
//! Every failure carries enough context for offline diagnosis: the
//! accumulated diagnostic text is bundled into the error even though it
//! was already streamed live, so nothing is lost if nobody was watching.

use thiserror::Error;

/// Errors that can occur while driving an `aws-vault` invocation.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The child executable could not be started.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        source: anyhow::Error,
    },

    /// The child exited with a non-zero status.
    #[error("`{command}` exited with status {code}; output:\n{diagnostics}{remainder}")]
    AbnormalExit {
        command: String,
        code: u32,
        /// Everything streamed to the diagnostic sink, in arrival order.
        diagnostics: String,
        /// Unterminated bytes left in the buffer at exit.
        remainder: String,
    },

    /// The child exited cleanly but its trailing output was not the
    /// expected credential payload. Signals a protocol mismatch with the
    /// child tool, distinct from an abnormal exit.
    #[error("credential payload is not valid JSON ({source}); trailing output was: {remainder:?}")]
    PayloadParse {
        diagnostics: String,
        remainder: String,
        #[source]
        source: serde_json::Error,
    },

    /// The caller asked for an output shape this crate does not know.
    /// Rejected before any process is spawned.
    #[error("unknown output format {0:?}")]
    UnknownFormat(String),

    /// A downstream shape requires a field the credential record lacks.
    #[error("credential record is missing {field}")]
    MissingField { field: &'static str },

    /// A responder or the child's input handle failed mid-run. The
    /// diagnostics captured up to that point travel with the error.
    #[error("interactive response failed: {source}; output so far:\n{diagnostics}")]
    Interrupted {
        diagnostics: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure outside the poll loop (working directory, reaping).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abnormal_exit_message_carries_diagnostics() {
        let err = AuthError::AbnormalExit {
            command: "aws-vault".to_string(),
            code: 1,
            diagnostics: "permission denied\n".to_string(),
            remainder: String::new(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("status 1"));
        assert!(rendered.contains("permission denied"));
    }

    #[test]
    fn payload_parse_message_carries_remainder() {
        let source = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = AuthError::PayloadParse {
            diagnostics: String::new(),
            remainder: "not json".to_string(),
            source,
        };
        assert!(err.to_string().contains("not json"));
    }
}
