//! Error types for switchshell.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for switchshell operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Shell channel errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Record export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

impl Error {
    /// Whether this error ends the interactive session.
    ///
    /// Transport and channel failures leave the device in an unknown state,
    /// so the session must not be reused after one of them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Channel(_))
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host is not present in known_hosts and verification is strict
    #[error("Host key for {host}:{port} is not known")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key does not match the known_hosts entry
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

}

/// Shell channel errors (PTY setup, stream state).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Failed to open PTY channel
    #[error("Failed to open PTY channel")]
    PtyOpenFailed,

    /// Failed to request shell
    #[error("Failed to request shell")]
    ShellRequestFailed,

    /// Stream closed while a transaction was using it
    #[error("Channel closed")]
    Closed,

    /// Write did not reach the remote side
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (session setup, command validation).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Invalid configuration in the session builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Port action name not recognised
    #[error("Unknown port action '{input}'")]
    UnknownAction { input: String },

    /// The switch asked for an enable password but none was configured
    #[error("Enable password requested but no enable secret was configured")]
    EnableSecretRequired,

    /// The switch did not accept the enable secret
    #[error("Enable secret rejected by the switch")]
    EnableRejected,

    /// Port identifier was empty or contained a line break
    #[error("Invalid port identifier '{port}'")]
    InvalidPort { port: String },
}

/// Errors writing parsed records out.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Failed to create the output file
    #[error("Failed to create '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed while writing rows
    #[error("Write failed: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias using switchshell's Error.
pub type Result<T> = std::result::Result<T, Error>;
