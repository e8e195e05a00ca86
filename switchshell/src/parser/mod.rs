//! Parsers for switch CLI output.
//!
//! Only the `show interfaces status` table is parsed; other show commands
//! are returned to the caller as text.

mod status;

pub use status::{InterfaceStatus, MIN_FIELDS, parse_interface_status};
