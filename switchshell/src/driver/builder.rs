//! Builder for connecting a switch session over SSH.

use std::path::PathBuf;
use std::time::Duration;

use regex::bytes::Regex;
use secrecy::SecretString;

use super::session::SwitchSession;
use super::transaction::Timing;
use crate::error::{DriverError, Result};
use crate::transport::config::{AuthMethod, HostKeyVerification, SshConfig};
use crate::transport::{SshShell, SshTransport};

/// Builder for an SSH-backed [`SwitchSession`].
///
/// # Example
///
/// ```rust,no_run
/// use switchshell::SessionBuilder;
///
/// # async fn example() -> Result<(), switchshell::Error> {
/// let mut session = SessionBuilder::new("192.168.1.10")
///     .username("netops")
///     .password("secret")
///     .enable_secret("enable-secret")
///     .connect()
///     .await?;
///
/// session.prepare().await?;
/// for port in session.interface_status().await? {
///     println!("{} {}", port.port, port.status);
/// }
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: Option<AuthMethod>,
    enable_secret: Option<SecretString>,
    connect_timeout: Duration,
    terminal_width: u32,
    terminal_height: u32,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    timing: Timing,
    show_timing: Option<Timing>,
    prompt: Option<Regex>,
}

impl SessionBuilder {
    /// Create a new builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: None,
            enable_secret: None,
            connect_timeout: Duration::from_secs(30),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            timing: Timing::default(),
            show_timing: None,
            prompt: None,
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = Some(AuthMethod::Password(SecretString::from(password.into())));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = Some(AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        });
        self
    }

    /// Set private key authentication with passphrase.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = Some(AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: Some(SecretString::from(passphrase.into())),
        });
        self
    }

    /// Set the secret for the `enable` password prompt.
    pub fn enable_secret(mut self, secret: impl Into<String>) -> Self {
        self.enable_secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Set the connect timeout (default: 30s).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set the host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a specific known_hosts file.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Timing for short commands.
    pub fn timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Timing for show commands (default: short timing with a 3s window).
    pub fn show_timing(mut self, timing: Timing) -> Self {
        self.show_timing = Some(timing);
        self
    }

    /// End transactions early when `prompt` appears at the end of the output.
    pub fn prompt(mut self, prompt: Regex) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Validate the settings and produce the SSH configuration.
    pub fn ssh_config(&self) -> Result<SshConfig> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(invalid("host is required"));
        }

        let username = self
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| invalid("username is required"))?;

        let auth = self
            .auth
            .clone()
            .ok_or_else(|| invalid("password or private key is required"))?;

        Ok(SshConfig {
            host: host.to_string(),
            port: self.port,
            username: username.to_string(),
            auth,
            connect_timeout: self.connect_timeout,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path.clone(),
        })
    }

    /// Wrap an already-open stream in a session with this builder's
    /// timing, secret and prompt settings.
    pub fn session<S: crate::channel::ShellStream>(&self, stream: S) -> SwitchSession<S> {
        let mut session = SwitchSession::new(stream).with_timing(self.timing);
        session = match self.show_timing {
            Some(timing) => session.with_show_timing(timing),
            None => {
                let window = session.show_timing().window;
                session.with_show_timing(Timing {
                    window,
                    ..self.timing
                })
            }
        };
        if let Some(secret) = &self.enable_secret {
            session = session.with_enable_secret(secret.clone());
        }
        if let Some(prompt) = &self.prompt {
            session = session.with_prompt(prompt.clone());
        }
        session
    }

    /// Connect, authenticate, open a shell and return the session.
    ///
    /// The session is not prepared; call
    /// [`SwitchSession::prepare`] to consume the banner and escalate.
    pub async fn connect(self) -> Result<SwitchSession<SshShell>> {
        let config = self.ssh_config()?;
        let transport = SshTransport::connect(config).await?;
        let shell = transport.open_shell().await?;
        Ok(self.session(shell))
    }
}

fn invalid(message: &str) -> crate::error::Error {
    DriverError::InvalidConfig {
        message: message.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::mock::ScriptedStream;
    use crate::error::Error;

    #[test]
    fn test_ssh_config_defaults() {
        let config = SessionBuilder::new("sw1.lab")
            .username("netops")
            .password("pw")
            .ssh_config()
            .unwrap();

        assert_eq!(config.socket_addr(), "sw1.lab:22");
        assert_eq!(config.username, "netops");
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert!(matches!(config.auth, AuthMethod::Password(_)));
    }

    #[test]
    fn test_missing_username_rejected() {
        let err = SessionBuilder::new("sw1").password("pw").ssh_config().unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::InvalidConfig { .. })));

        let err = SessionBuilder::new("sw1")
            .username("  ")
            .password("pw")
            .ssh_config()
            .unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::InvalidConfig { .. })));
    }

    #[test]
    fn test_missing_host_or_auth_rejected() {
        assert!(SessionBuilder::new(" ").username("a").password("b").ssh_config().is_err());
        assert!(SessionBuilder::new("sw1").username("a").ssh_config().is_err());
    }

    #[test]
    fn test_private_key_auth() {
        let config = SessionBuilder::new("sw1")
            .port(2222)
            .username("netops")
            .private_key_with_passphrase("/home/netops/.ssh/id_ed25519", "phrase")
            .ssh_config()
            .unwrap();

        assert_eq!(config.port, 2222);
        match config.auth {
            AuthMethod::PrivateKey { path, passphrase } => {
                assert_eq!(path, PathBuf::from("/home/netops/.ssh/id_ed25519"));
                assert!(passphrase.is_some());
            }
            other => panic!("unexpected auth {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_session_inherits_timing() {
        let timing = Timing::new(Duration::from_millis(100), Duration::from_millis(400));
        let session = SessionBuilder::new("sw1").timing(timing).session(ScriptedStream::new());

        assert_eq!(session.timing(), timing);
        assert_eq!(session.show_timing().settle_delay, Duration::from_millis(100));
        assert_eq!(session.show_timing().window, Duration::from_secs(3));
    }
}
