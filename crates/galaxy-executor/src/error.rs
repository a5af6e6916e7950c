//! Executor error types.

use std::time::Duration;

use thiserror::Error;

use galaxy_core::error::{AppError, ErrorKind};

use crate::policy::PolicyRejection;

/// Errors from validating or running an external command.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The request was rejected by the policy. Nothing was spawned.
    #[error("Command not allowed: {reason}")]
    CommandNotAllowed {
        /// Why the policy rejected the request.
        reason: PolicyRejection,
    },

    /// The command line was empty after parsing.
    #[error("Empty command")]
    EmptyCommand,

    /// The process outlived its timeout and was killed.
    #[error("Command timed out after {}ms", timeout.as_millis())]
    Timeout {
        /// The timeout that was enforced.
        timeout: Duration,
    },

    /// Combined stdout and stderr grew past the ceiling; the process was killed.
    #[error("Output size limit of {limit} bytes exceeded")]
    OutputLimitExceeded {
        /// The enforced ceiling in bytes.
        limit: usize,
    },

    /// The process exited with a non-zero code.
    #[error("Process exited with code {code}: {stderr}")]
    ProcessExit {
        /// Exit code.
        code: i32,
        /// Captured standard error.
        stderr: String,
    },

    /// The process was terminated by a signal.
    #[error("Process killed by signal {}", signal.map_or_else(|| "unknown".to_string(), |s| s.to_string()))]
    ProcessSignaled {
        /// Signal number, where the platform reports one.
        signal: Option<i32>,
    },

    /// The program could not be started.
    #[error("Failed to start '{command}': {source}")]
    Spawn {
        /// Policy command name.
        command: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Reading the child's output failed.
    #[error("IO error while running command: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PolicyRejection> for ExecError {
    fn from(reason: PolicyRejection) -> Self {
        Self::CommandNotAllowed { reason }
    }
}

impl From<ExecError> for AppError {
    fn from(err: ExecError) -> Self {
        let kind = match &err {
            ExecError::CommandNotAllowed { .. } | ExecError::EmptyCommand => ErrorKind::Validation,
            _ => ErrorKind::Execution,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}
