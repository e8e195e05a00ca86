//! SSH transport layer wrapping russh.
//!
//! Connects, authenticates and opens an interactive PTY shell, then exposes
//! that shell as a [`ShellStream`](crate::channel::ShellStream).

pub mod config;
mod shell;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use shell::SshShell;
pub use ssh::SshTransport;
