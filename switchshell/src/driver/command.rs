//! The catalogue of switch CLI commands and port actions.
//!
//! Everything sent to the device is built from these closed enums, so an
//! unrecognised action is rejected while parsing user input rather than
//! falling through at dispatch time.

use std::fmt;
use std::str::FromStr;

use crate::error::{DriverError, Error, Result};

/// A single CLI line understood by the switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchCommand {
    /// `enable`
    Enable,
    /// `terminal length 0`
    TerminalLength0,
    /// `show interfaces status`
    ShowInterfacesStatus,
    /// `show vlan brief`
    ShowVlanBrief,
    /// `show power inline`
    ShowPowerInline,
    /// `show ip interface brief`
    ShowIpInterfaceBrief,
    /// `conf t`
    ConfigureTerminal,
    /// `interface <id>`
    Interface(String),
    /// `no shutdown`
    NoShutdown,
    /// `shutdown`
    Shutdown,
    /// `description <text>`
    Description(String),
    /// `power inline auto`
    PowerInlineAuto,
    /// `power inline never`
    PowerInlineNever,
    /// `end`
    End,
    /// `write memory`
    WriteMemory,
}

impl fmt::Display for SwitchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchCommand::Enable => f.write_str("enable"),
            SwitchCommand::TerminalLength0 => f.write_str("terminal length 0"),
            SwitchCommand::ShowInterfacesStatus => f.write_str("show interfaces status"),
            SwitchCommand::ShowVlanBrief => f.write_str("show vlan brief"),
            SwitchCommand::ShowPowerInline => f.write_str("show power inline"),
            SwitchCommand::ShowIpInterfaceBrief => f.write_str("show ip interface brief"),
            SwitchCommand::ConfigureTerminal => f.write_str("conf t"),
            SwitchCommand::Interface(id) => write!(f, "interface {}", id),
            SwitchCommand::NoShutdown => f.write_str("no shutdown"),
            SwitchCommand::Shutdown => f.write_str("shutdown"),
            SwitchCommand::Description(text) => write!(f, "description {}", text),
            SwitchCommand::PowerInlineAuto => f.write_str("power inline auto"),
            SwitchCommand::PowerInlineNever => f.write_str("power inline never"),
            SwitchCommand::End => f.write_str("end"),
            SwitchCommand::WriteMemory => f.write_str("write memory"),
        }
    }
}

/// A configuration change applied to one or more ports.
///
/// Parses from user input:
///
/// ```rust
/// use switchshell::driver::PortAction;
///
/// let action: PortAction = "poe-off".parse().unwrap();
/// assert_eq!(action, PortAction::PoeOff);
///
/// let action: PortAction = "describe AP lobby".parse().unwrap();
/// assert_eq!(action, PortAction::Describe("AP lobby".into()));
///
/// assert!("reboot".parse::<PortAction>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortAction {
    /// Bring the port up (`no shutdown`).
    Enable,
    /// Administratively shut the port (`shutdown`).
    Disable,
    /// Let the port supply PoE (`power inline auto`).
    PoeOn,
    /// Cut PoE on the port (`power inline never`).
    PoeOff,
    /// Set the port description.
    Describe(String),
}

impl PortAction {
    /// Interface-mode commands that carry out this action.
    pub fn commands(&self) -> Vec<SwitchCommand> {
        match self {
            PortAction::Enable => vec![SwitchCommand::NoShutdown],
            PortAction::Disable => vec![SwitchCommand::Shutdown],
            PortAction::PoeOn => vec![SwitchCommand::PowerInlineAuto],
            PortAction::PoeOff => vec![SwitchCommand::PowerInlineNever],
            PortAction::Describe(text) => vec![SwitchCommand::Description(text.clone())],
        }
    }
}

impl FromStr for PortAction {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (keyword, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (trimmed, ""),
        };

        let action = match keyword.to_ascii_lowercase().as_str() {
            "enable" | "up" | "no-shutdown" => PortAction::Enable,
            "disable" | "down" | "shutdown" => PortAction::Disable,
            "poe-on" | "poe-auto" => PortAction::PoeOn,
            "poe-off" | "poe-never" => PortAction::PoeOff,
            "describe" | "description" => {
                if rest.is_empty() {
                    return Err(DriverError::InvalidConfig {
                        message: "description text is required".to_string(),
                    }
                    .into());
                }
                check_single_line(rest)?;
                return Ok(PortAction::Describe(rest.to_string()));
            }
            _ => {
                return Err(DriverError::UnknownAction {
                    input: input.to_string(),
                }
                .into());
            }
        };

        if !rest.is_empty() {
            return Err(DriverError::UnknownAction {
                input: input.to_string(),
            }
            .into());
        }
        Ok(action)
    }
}

/// Validate a port identifier before it is put on the wire.
pub fn validate_port(port: &str) -> Result<&str> {
    let port = port.trim();
    if port.is_empty() || port.contains(['\r', '\n']) {
        return Err(DriverError::InvalidPort {
            port: port.to_string(),
        }
        .into());
    }
    Ok(port)
}

fn check_single_line(text: &str) -> Result<()> {
    if text.contains(['\r', '\n']) {
        return Err(DriverError::InvalidConfig {
            message: "text must fit on one line".to_string(),
        }
        .into());
    }
    Ok(())
}
