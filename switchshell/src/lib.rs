//! # switchshell
//!
//! Async SSH shell driver and status-table parser for switch CLI automation.
//!
//! A switch CLI is an unframed terminal stream: commands are echoed, output
//! has no length or end marker, and the prompt is the only hint that the
//! device is done. switchshell turns that stream into a request/response
//! primitive by collecting output over a bounded time window, and parses the
//! `show interfaces status` table into typed records.
//!
//! ## Features
//!
//! - Windowed transactions over any [`ShellStream`](channel::ShellStream)
//! - russh-based SSH transport with PTY shell
//! - ANSI escape stripping on collected output
//! - `show interfaces status` parser and CSV export
//! - Typed command catalogue and bulk port actions
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use switchshell::{PortAction, SessionBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), switchshell::Error> {
//!     let mut session = SessionBuilder::new("192.168.1.10")
//!         .username("admin")
//!         .password("secret")
//!         .enable_secret("secret")
//!         .connect()
//!         .await?;
//!
//!     session.prepare().await?;
//!
//!     let ports = session.interface_status().await?;
//!     switchshell::export::export_csv("interfaces.csv", &ports)?;
//!
//!     session.apply(&["Gi1/0/5"], &PortAction::Disable).await?;
//!     session.save().await?;
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod export;
pub mod parser;
pub mod transport;

// Re-export main types for convenience
pub use channel::ShellStream;
pub use driver::{
    Collected, ConfigGuard, PortAction, SessionBuilder, SwitchCommand, SwitchSession, Timing,
    Transaction, transact,
};
pub use error::Error;
pub use parser::{InterfaceStatus, parse_interface_status};
pub use transport::{AuthMethod, HostKeyVerification, SshConfig, SshShell};
