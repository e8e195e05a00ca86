//! Prompt and response patterns for switch CLIs.

use std::sync::LazyLock;

use regex::bytes::Regex;

use crate::error::{ChannelError, Result};

/// Cisco-style exec, privileged and configuration prompts.
///
/// ```text
/// Switch>
/// Switch#
/// Switch(config)#
/// Switch(config-if)#
/// ```
pub const CISCO_PROMPT: &str = r"(?m)^[\w.\-@/: ]{1,63}(?:\(config[\w.\-@/:+]{0,63}\))?[>#]\s?$";

static CISCO_PROMPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CISCO_PROMPT).expect("CISCO_PROMPT is a valid regex"));

/// The compiled [`CISCO_PROMPT`] pattern.
pub fn cisco_prompt() -> &'static Regex {
    &CISCO_PROMPT_RE
}

/// Compile a prompt pattern string into a regex.
///
/// Anchors to the end of the text if the pattern has no anchor of its own,
/// so a prompt echoed mid-output does not end a transaction early.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex> {
    let pattern = if pattern.ends_with('$') {
        pattern.to_string()
    } else {
        format!("{}\\s*$", pattern)
    };

    Ok(Regex::new(&pattern).map_err(ChannelError::InvalidPattern)?)
}

/// Markers the switch prints when it rejects a command.
pub const CLI_ERROR_MARKERS: &[&str] = &[
    "% Invalid input",
    "% Incomplete command",
    "% Ambiguous command",
    "% Unknown command",
    "% Error",
    "% Bad secrets",
    "% Access denied",
];

/// Return the first CLI error marker found in `text`.
///
/// Output is data, not an error: the marker is informational and the caller
/// decides what a rejected line means.
pub fn detect_cli_error(text: &str) -> Option<&'static str> {
    CLI_ERROR_MARKERS
        .iter()
        .copied()
        .find(|marker| text.contains(marker))
}

/// Whether collected text looks like it ends in a password prompt.
///
/// Case-insensitive substring match on `password`. Localised or customised
/// prompts are not recognised, and any output mentioning the word matches.
pub fn contains_password_prompt(text: &str) -> bool {
    text.to_ascii_lowercase().contains("password")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_cisco_prompt_levels() {
        let prompt = cisco_prompt();
        assert!(prompt.is_match(b"Switch>"));
        assert!(prompt.is_match(b"Switch#"));
        assert!(prompt.is_match(b"Switch# "));
        assert!(prompt.is_match(b"Switch(config)#"));
        assert!(prompt.is_match(b"Switch(config-if)#"));
        assert!(prompt.is_match(b"show clock\r\n*10:02:11.123 UTC Mon\r\nSW-CORE-01#"));
    }

    #[test]
    fn test_cisco_prompt_rejects_output_lines() {
        let prompt = cisco_prompt();
        assert!(!prompt.is_match(b"Gi1/0/1   uplink   connected   1"));
        assert!(!prompt.is_match(b"Switch#show interfaces status"));
    }

    #[test]
    fn test_compile_prompt_pattern() {
        let pattern = compile_prompt_pattern(r"Switch#").unwrap();
        assert!(pattern.is_match(b"Switch# "));
        assert!(!pattern.is_match(b"Switch#show vlan"));

        let pattern = compile_prompt_pattern(r"Switch#$").unwrap();
        assert!(pattern.is_match(b"Switch#"));

        let err = compile_prompt_pattern(r"Switch(#").unwrap_err();
        assert!(matches!(err, Error::Channel(ChannelError::InvalidPattern(_))));
    }

    #[test]
    fn test_detect_cli_error() {
        let output = "interface Gi9/9/9\r\n                 ^\r\n% Invalid input detected at '^' marker.\r\n";
        assert_eq!(detect_cli_error(output), Some("% Invalid input"));
        assert_eq!(detect_cli_error("sh\r\n% Ambiguous command:  \"sh\""), Some("% Ambiguous command"));
        assert_eq!(detect_cli_error("Switch(config-if)#"), None);
    }

    #[test]
    fn test_password_prompt_detection() {
        assert!(contains_password_prompt("enable\r\nPassword: "));
        assert!(contains_password_prompt("PASSWORD:"));
        assert!(!contains_password_prompt("enable\r\nSwitch#"));
        assert!(!contains_password_prompt("Passwort:"));
    }
}
