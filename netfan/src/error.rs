//! Error types for netfan.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for netfan operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Credential preflight failed; the run was aborted before dispatch.
    #[error("Preflight failed: {0}")]
    Preflight(#[from] PreflightError),

    /// Dispatcher misuse or invalid run configuration.
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Device session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Platform/vendor errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Inventory loading errors
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),
}

/// Reasons the credential preflight can reject a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreflightError {
    /// The probe target rejected the credentials.
    #[error("Username or password rejected for user '{user}'")]
    Auth { user: String },

    /// The probe target did not answer within the bound.
    #[error("Probe target timed out after {0:?}")]
    Timeout(Duration),

    /// Any other transport failure while probing.
    #[error("Probe failed: {0}")]
    Transport(String),
}

/// Failure of a single work item. Recorded, never escalated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// Free-form failure reported by the operation.
    #[error("{0}")]
    Failed(String),

    /// The operation exceeded its time bound.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The device rejected the credentials.
    #[error("Authentication failed for user '{user}'")]
    Auth { user: String },

    /// Could not reach or talk to the device.
    #[error("Connection to {host} failed: {message}")]
    Connection { host: String, message: String },

    /// A command was rejected by the device.
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    /// The operation panicked; the worker survived.
    #[error("Operation panicked: {0}")]
    Panicked(String),

    /// The run was cancelled before this item started.
    #[error("Cancelled before start")]
    Cancelled,
}

impl OperationError {
    /// Shorthand for [`OperationError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Classify a device-layer error for a given host.
    pub fn from_device(host: &str, err: Error) -> Self {
        match err {
            Error::Transport(TransportError::AuthenticationFailed { user }) => Self::Auth { user },
            Error::Transport(TransportError::Timeout(d)) => Self::Timeout(d),
            Error::Channel(ChannelError::PatternTimeout(d)) => Self::Timeout(d),
            Error::Transport(e) => Self::Connection {
                host: host.to_string(),
                message: e.to_string(),
            },
            Error::Session(SessionError::CommandFailed { command, message }) => {
                Self::CommandFailed { command, message }
            }
            other => Self::Failed(other.to_string()),
        }
    }
}

/// Queue, pool and configuration misuse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Enqueue attempted after the queue was closed.
    #[error("Task queue is closed")]
    QueueClosed,

    /// Invalid run configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key differs from the known_hosts entry.
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Host not present in known_hosts under strict checking.
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written.
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (prompt matching, shell I/O).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Device session errors (command execution).
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session not open
    #[error("Session not open - call open() first")]
    NotOpen,

    /// Session already open
    #[error("Session already open")]
    AlreadyOpen,

    /// The device answered with a failure marker.
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },
}

/// Platform/vendor definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Invalid platform definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },

    /// No platform registered under this name.
    #[error("Unknown platform '{name}'")]
    UnknownPlatform { name: String },
}

/// Inventory file errors.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Could not open or read the file.
    #[error("Failed to read inventory: {0}")]
    Io(#[from] io::Error),

    /// Malformed CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed YAML.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A row without a hostname.
    #[error("Missing hostname at record {line}")]
    MissingHost { line: usize },

    /// An unparsable expected-network column.
    #[error("Invalid network '{value}' for host {host}")]
    InvalidNetwork { host: String, value: String },

    /// File extension is neither CSV nor YAML.
    #[error("Unsupported inventory format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias using netfan's Error.
pub type Result<T> = std::result::Result<T, Error>;
