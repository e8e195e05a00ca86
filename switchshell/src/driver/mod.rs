//! Driver layer: windowed transactions and the switch session.
//!
//! [`transact`] is the single request/response primitive. [`SwitchSession`]
//! builds the switch command catalogue on top of it, and
//! [`SessionBuilder`] connects one over SSH.

mod builder;
mod command;
mod session;
mod transaction;

pub use builder::SessionBuilder;
pub use command::{PortAction, SwitchCommand, validate_port};
pub use session::{ConfigGuard, SwitchSession};
pub use transaction::{Collected, Timing, Transaction, transact};
