//! Switch session: the command catalogue on top of windowed transactions.
//!
//! A [`SwitchSession`] owns one shell stream for the lifetime of an
//! interactive session and is passed explicitly to whatever drives it. Every
//! method takes `&mut self`, so transactions on one session can never
//! interleave.

use log::{debug, warn};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};

use super::command::{PortAction, SwitchCommand, validate_port};
use super::transaction::{Collected, Timing, Transaction, transact};
use crate::channel::{ShellStream, contains_password_prompt, detect_cli_error};
use crate::error::{DriverError, Result};
use crate::parser::{InterfaceStatus, parse_interface_status};

/// An interactive CLI session with one switch.
pub struct SwitchSession<S: ShellStream> {
    stream: S,

    /// Timing for short commands (mode changes, configuration lines).
    timing: Timing,

    /// Timing for show commands that return tables.
    show_timing: Timing,

    enable_secret: Option<SecretString>,

    /// Optional prompt that ends a transaction before its window runs out.
    prompt: Option<Regex>,
}

impl<S: ShellStream> SwitchSession<S> {
    /// Wrap an open shell stream with default timing.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            timing: Timing::default(),
            show_timing: Timing {
                window: std::time::Duration::from_secs(3),
                ..Timing::default()
            },
            enable_secret: None,
            prompt: None,
        }
    }

    /// Set timing for short commands.
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Set timing for show commands.
    pub fn with_show_timing(mut self, timing: Timing) -> Self {
        self.show_timing = timing;
        self
    }

    /// Set the secret answered to the enable password prompt.
    pub fn with_enable_secret(mut self, secret: SecretString) -> Self {
        self.enable_secret = Some(secret);
        self
    }

    /// End transactions early when `prompt` shows up at the output tail.
    ///
    /// Without a prompt every transaction runs for its whole window.
    pub fn with_prompt(mut self, prompt: Regex) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Timing used for short commands.
    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Timing used for show commands.
    pub fn show_timing(&self) -> Timing {
        self.show_timing
    }

    /// Mutable access to the underlying stream.
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Give the stream back without closing it.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Run one transaction as given.
    pub async fn transact(&mut self, tx: &Transaction) -> Result<Collected> {
        transact(&mut self.stream, tx).await
    }

    fn transaction(&self, command: String, timing: Timing) -> Transaction {
        let tx = Transaction::new(command).with_timing(timing);
        match &self.prompt {
            Some(prompt) => tx.until(prompt.clone()),
            None => tx,
        }
    }

    /// Send a catalogue command with the short-command timing.
    pub async fn send(&mut self, command: &SwitchCommand) -> Result<Collected> {
        if let SwitchCommand::Interface(port) = command {
            validate_port(port)?;
        }
        let tx = self.transaction(command.to_string(), self.timing);
        transact(&mut self.stream, &tx).await
    }

    /// Send a catalogue command with the show timing.
    pub async fn show(&mut self, command: &SwitchCommand) -> Result<Collected> {
        let tx = self.transaction(command.to_string(), self.show_timing);
        transact(&mut self.stream, &tx).await
    }

    /// Collect whatever the switch has sent without writing anything.
    ///
    /// Used to consume the login banner and first prompt.
    pub async fn read_pending(&mut self) -> Result<Collected> {
        let tx = self.transaction(String::new(), self.timing);
        transact(&mut self.stream, &tx).await
    }

    /// Enter privileged EXEC mode.
    ///
    /// Sends `enable`; if the reply mentions `password` (any case) the
    /// configured secret is sent next. The returned output is from the last
    /// transaction. A switch that asks again or answers with `% Bad secrets`
    /// after the secret fails with [`DriverError::EnableRejected`], so no
    /// later command is taken as a password attempt.
    pub async fn enable(&mut self) -> Result<Collected> {
        let reply = self.send(&SwitchCommand::Enable).await?;
        if !contains_password_prompt(&reply.text) {
            return Ok(reply);
        }

        let secret = self
            .enable_secret
            .as_ref()
            .ok_or(DriverError::EnableSecretRequired)?;
        debug!("enable password requested");

        let tx = Transaction::hidden(secret.expose_secret()).with_timing(self.timing);
        let tx = match &self.prompt {
            Some(prompt) => tx.until(prompt.clone()),
            None => tx,
        };
        let reply = transact(&mut self.stream, &tx).await?;

        if contains_password_prompt(&reply.text) || detect_cli_error(&reply.text).is_some() {
            warn!("enable secret rejected");
            return Err(DriverError::EnableRejected.into());
        }
        Ok(reply)
    }

    /// Turn off `--More--` paging for the rest of the session.
    pub async fn disable_paging(&mut self) -> Result<Collected> {
        self.send(&SwitchCommand::TerminalLength0).await
    }

    /// Consume the banner, escalate to privileged mode and disable paging.
    pub async fn prepare(&mut self) -> Result<()> {
        let banner = self.read_pending().await?;
        debug!("banner: {} bytes", banner.raw_bytes);
        self.enable().await?;
        self.disable_paging().await?;
        Ok(())
    }

    /// Query and parse `show interfaces status`.
    pub async fn interface_status(&mut self) -> Result<Vec<InterfaceStatus>> {
        let output = self.show(&SwitchCommand::ShowInterfacesStatus).await?;
        let records = parse_interface_status(&output.text);
        debug!("parsed {} interfaces", records.len());
        Ok(records)
    }

    /// Raw `show vlan brief` output.
    pub async fn vlan_brief(&mut self) -> Result<Collected> {
        self.show(&SwitchCommand::ShowVlanBrief).await
    }

    /// Raw `show power inline` output.
    pub async fn power_inline(&mut self) -> Result<Collected> {
        self.show(&SwitchCommand::ShowPowerInline).await
    }

    /// Raw `show ip interface brief` output.
    pub async fn ip_interface_brief(&mut self) -> Result<Collected> {
        self.show(&SwitchCommand::ShowIpInterfaceBrief).await
    }

    /// Enter global configuration mode.
    ///
    /// The guard borrows the session; call [`ConfigGuard::end`] to leave.
    pub async fn configure(&mut self) -> Result<ConfigGuard<'_, S>> {
        let output = self.send(&SwitchCommand::ConfigureTerminal).await?;
        Ok(ConfigGuard {
            session: self,
            outputs: vec![output],
            ended: false,
        })
    }

    /// Apply one action to each port inside a single configuration block.
    ///
    /// All port identifiers are validated before anything is sent. Returns
    /// the output of every command in the order sent, from `conf t` to
    /// `end`. Lines the switch rejects are logged and left in the output.
    pub async fn apply(&mut self, ports: &[&str], action: &PortAction) -> Result<Vec<Collected>> {
        if ports.is_empty() {
            return Err(DriverError::InvalidConfig {
                message: "at least one port is required".to_string(),
            }
            .into());
        }
        let ports = ports
            .iter()
            .map(|port| validate_port(port))
            .collect::<Result<Vec<_>>>()?;

        let mut config = self.configure().await?;
        for port in ports {
            config.interface(port).await?;
            for command in action.commands() {
                config.send(&command).await?;
            }
        }
        config.end().await
    }

    /// Save the running configuration (`write memory`).
    pub async fn save(&mut self) -> Result<Collected> {
        self.show(&SwitchCommand::WriteMemory).await
    }

    /// Close the stream and end the session.
    pub async fn close(mut self) -> Result<()> {
        self.stream.close().await
    }
}

/// Global configuration mode, entered with `conf t`.
///
/// Holds `&mut SwitchSession`, so nothing else can use the session until
/// [`end`](Self::end) consumes the guard.
pub struct ConfigGuard<'a, S: ShellStream> {
    session: &'a mut SwitchSession<S>,
    outputs: Vec<Collected>,
    ended: bool,
}

impl<S: ShellStream> ConfigGuard<'_, S> {
    /// Send one configuration line.
    pub async fn send(&mut self, command: &SwitchCommand) -> Result<Collected> {
        let output = self.session.send(command).await?;
        if let Some(marker) = detect_cli_error(&output.text) {
            warn!("switch rejected {:?}: {}", command.to_string(), marker);
        }
        self.outputs.push(output.clone());
        Ok(output)
    }

    /// Enter interface configuration for `port`.
    pub async fn interface(&mut self, port: &str) -> Result<Collected> {
        let port = validate_port(port)?;
        self.send(&SwitchCommand::Interface(port.to_string())).await
    }

    /// Leave configuration mode and return every output collected inside it.
    pub async fn end(mut self) -> Result<Vec<Collected>> {
        let output = self.session.send(&SwitchCommand::End).await?;
        self.outputs.push(output);
        self.ended = true;
        Ok(std::mem::take(&mut self.outputs))
    }
}

impl<S: ShellStream> Drop for ConfigGuard<'_, S> {
    fn drop(&mut self) {
        if !self.ended {
            warn!("ConfigGuard dropped without end(); switch left in configuration mode");
        }
    }
}
