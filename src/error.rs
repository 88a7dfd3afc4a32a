//! Error types for driving a program through a pseudo-terminal.
//!
//! Every blocking session operation reports failure through [`PtyError`].
//! Timeouts carry the output observed so far so a failed step can be
//! diagnosed from the error message alone.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// Boxed error from the PTY backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while launching or driving a session.
#[derive(Debug, Error)]
pub enum PtyError {
    /// The pseudo-terminal pair could not be allocated.
    #[error("failed to allocate PTY: {0}")]
    OpenPty(#[source] BoxError),

    /// The program could not be started on the terminal.
    #[error("failed to start '{program}' with PTY: {source}")]
    Launch {
        program: String,
        #[source]
        source: BoxError,
    },

    /// Writing input to the terminal failed.
    #[error("failed to send input: {0}")]
    Write(#[source] io::Error),

    /// The expected text did not appear before the deadline.
    #[error("timeout waiting for {expected:?} after {timeout:?}, got: {collected}")]
    PromptTimeout {
        expected: String,
        timeout: Duration,
        collected: String,
    },

    /// A read on the terminal failed before the expected text appeared.
    #[error("output failed while waiting for {expected:?}, got: {collected}")]
    StreamEnded { expected: String, collected: String },

    /// The child did not exit before the deadline. It is still running.
    #[error("command timed out after {timeout:?}")]
    WaitTimeout { timeout: Duration },

    /// Waiting on the child process failed.
    #[error("failed to wait for child: {0}")]
    Wait(#[source] io::Error),

    /// Changing the terminal geometry failed.
    #[error("failed to resize PTY: {0}")]
    Resize(#[source] BoxError),

    /// The session has already been closed.
    #[error("session is closed")]
    Closed,

    /// The session configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PtyError {
    /// Output collected before the failure, for timeout and end-of-stream errors.
    pub fn collected(&self) -> Option<&str> {
        match self {
            PtyError::PromptTimeout { collected, .. } | PtyError::StreamEnded { collected, .. } => {
                Some(collected)
            }
            _ => None,
        }
    }

    /// Whether the caller may retry or inspect the session after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PtyError::PromptTimeout { .. } | PtyError::WaitTimeout { .. } | PtyError::Resize(_)
        )
    }
}
