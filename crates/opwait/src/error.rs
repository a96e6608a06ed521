//! Error types for probes, waits and poll configuration

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a probe while fetching the current status
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The remote object no longer exists (HTTP 404 and friends)
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProbeError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn request(message: impl Into<String>) -> Self {
        Self::Request(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Errors raised while building or loading a poll configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required consecutive successes must be at least 1")]
    ZeroStabilization,

    #[error("Poll timeout must be greater than zero")]
    ZeroTimeout,

    #[error("Status {status:?} is listed as both {first} and {second}")]
    OverlappingStatus {
        status: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("Poll profile not found: {0}")]
    UnknownProfile(String),

    #[error("Config file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Outcome of a wait that did not reach success
///
/// `R` is the probe's response type. Variants that observed at least one
/// response carry it so callers can build a descriptive message.
#[derive(Error, Debug)]
pub enum WaitError<R> {
    #[error("Probe failed: {0}")]
    Probe(#[source] ProbeError),

    #[error("Operation failed with status {status}")]
    OperationFailed { status: String, last: R },

    #[error("Timed out waiting for completion after {timeout:?} ({attempts} checks)")]
    Timeout {
        timeout: Duration,
        attempts: u32,
        last: Option<R>,
    },

    #[error("Wait cancelled")]
    Cancelled { last: Option<R> },

    #[error("Invalid poll configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl<R> WaitError<R> {
    /// The remote side gave up on the operation
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::OperationFailed { .. })
    }

    /// We gave up waiting before the remote side decided
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn failure_status(&self) -> Option<&str> {
        match self {
            Self::OperationFailed { status, .. } => Some(status),
            _ => None,
        }
    }

    /// Last response observed before the wait ended, if any
    pub fn last_response(&self) -> Option<&R> {
        match self {
            Self::OperationFailed { last, .. } => Some(last),
            Self::Timeout { last, .. } | Self::Cancelled { last } => last.as_ref(),
            Self::Probe(_) | Self::InvalidConfig(_) => None,
        }
    }

    pub fn into_last_response(self) -> Option<R> {
        match self {
            Self::OperationFailed { last, .. } => Some(last),
            Self::Timeout { last, .. } | Self::Cancelled { last } => last,
            Self::Probe(_) | Self::InvalidConfig(_) => None,
        }
    }
}
