//! Channel layer: the shell stream contract and output cleaning.
//!
//! This module holds what the transaction driver needs from a stream,
//! plus the buffer and patterns used to make sense of raw terminal output.

mod buffer;
pub mod patterns;
mod stream;

pub use buffer::OutputBuffer;
pub use patterns::{
    cisco_prompt, compile_prompt_pattern, contains_password_prompt, detect_cli_error,
};
pub use stream::ShellStream;

#[cfg(test)]
pub(crate) use stream::mock;
