//! Switch login over SSH: TCP connect, host key policy, user authentication
//! and the PTY shell request that the CLI needs before it prints a prompt.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, warn};
use russh::client::{self, Handle};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use secrecy::ExposeSecret;

use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use super::shell::SshShell;
use crate::error::{ChannelError, Result, TransportError};

/// Keepalive period while a session sits idle between transactions.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Terminal type requested for the switch CLI.
const TERM: &str = "xterm";

/// Authenticated SSH connection to a switch, not yet running a shell.
pub struct SshTransport {
    session: Handle<HostKeyCheck>,
    config: SshConfig,
}

impl SshTransport {
    /// Reach the switch within `connect_timeout` and log in.
    ///
    /// Host key rejections are reported with their specific cause
    /// (unknown host, changed key, unreadable known_hosts) rather than the
    /// generic handshake failure russh returns.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let client_config = Arc::new(client::Config {
            inactivity_timeout: None,
            keepalive_interval: Some(KEEPALIVE_INTERVAL),
            ..Default::default()
        });

        let rejection = Arc::new(Mutex::new(None));
        let check = HostKeyCheck {
            host: config.host.clone(),
            port: config.port,
            policy: config.host_key_verification,
            known_hosts: config.known_hosts_path.clone(),
            rejection: rejection.clone(),
        };

        debug!("connecting to {}", config.socket_addr());

        let mut session = tokio::time::timeout(
            config.connect_timeout,
            client::connect(client_config, (config.host.as_str(), config.port), check),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.connect_timeout))?
        .map_err(|e| {
            let rejected = rejection.lock().ok().and_then(|mut slot| slot.take());
            match (rejected, e) {
                (Some(cause), _) => cause,
                (None, russh::Error::IO(source)) => TransportError::ConnectionFailed {
                    host: config.host.clone(),
                    port: config.port,
                    source,
                },
                (None, e) => TransportError::Ssh(e),
            }
        })?;

        login(&mut session, &config).await?;
        debug!("logged in to {} as '{}'", config.host, config.username);

        Ok(Self { session, config })
    }

    /// Request a PTY and an interactive shell, then hand both the channel
    /// and this connection to an [`SshShell`].
    ///
    /// The shell disconnects the transport when it is closed.
    pub async fn open_shell(self) -> Result<SshShell> {
        let channel = self.session.channel_open_session().await.map_err(|e| {
            debug!("session channel refused: {}", e);
            ChannelError::PtyOpenFailed
        })?;

        let (cols, rows) = (self.config.terminal_width, self.config.terminal_height);
        channel
            .request_pty(true, TERM, cols, rows, 0, 0, &[])
            .await
            .map_err(|e| {
                debug!("pty {}x{} refused: {}", cols, rows, e);
                ChannelError::PtyOpenFailed
            })?;

        channel.request_shell(true).await.map_err(|e| {
            debug!("shell refused: {}", e);
            ChannelError::ShellRequestFailed
        })?;

        Ok(SshShell::spawn(channel, self))
    }

    /// Send an SSH disconnect to the switch.
    pub async fn disconnect(self) -> Result<()> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        debug!("disconnected from {}", self.config.host);
        Ok(())
    }
}

/// Password or public key login. A refusal is `AuthenticationFailed`.
async fn login(session: &mut Handle<HostKeyCheck>, config: &SshConfig) -> Result<()> {
    let accepted = match &config.auth {
        AuthMethod::Password(password) => session
            .authenticate_password(&config.username, password.expose_secret())
            .await
            .map_err(TransportError::Ssh)?
            .success(),
        AuthMethod::PrivateKey { path, passphrase } => {
            let key = load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
                .map_err(|e| TransportError::Key(format!("{}: {}", path.display(), e)))?;

            // None selects plain ssh-rsa (SHA-1)
            let rsa_hash = session
                .best_supported_rsa_hash()
                .await
                .map_err(TransportError::Ssh)?
                .flatten();

            session
                .authenticate_publickey(
                    &config.username,
                    PrivateKeyWithHashAlg::new(Arc::new(key), rsa_hash),
                )
                .await
                .map_err(TransportError::Ssh)?
                .success()
        }
    };

    if accepted {
        Ok(())
    } else {
        Err(TransportError::AuthenticationFailed {
            user: config.username.clone(),
        }
        .into())
    }
}

/// Applies a [`HostKeyVerification`] policy during the handshake.
///
/// russh only lets the handler accept or refuse, so the reason for a refusal
/// is parked in `rejection` for `connect` to report.
struct HostKeyCheck {
    host: String,
    port: u16,
    policy: HostKeyVerification,
    known_hosts: Option<PathBuf>,
    rejection: Arc<Mutex<Option<TransportError>>>,
}

impl HostKeyCheck {
    /// `Ok(false)` when the switch is not listed yet.
    fn is_known(&self, key: &PublicKey) -> std::result::Result<bool, TransportError> {
        let listed = match &self.known_hosts {
            Some(path) => russh::keys::check_known_hosts_path(&self.host, self.port, key, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, key),
        };

        listed.map_err(|e| match e {
            russh::keys::Error::KeyChanged { line } => TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            },
            e => TransportError::KnownHosts(e.to_string()),
        })
    }

    fn remember(&self, key: &PublicKey) {
        let saved = match &self.known_hosts {
            Some(path) => {
                russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, key, path)
            }
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, key),
        };

        match saved {
            Ok(()) => debug!("recorded host key for {}:{}", self.host, self.port),
            Err(e) => warn!("could not record host key for {}: {}", self.host, e),
        }
    }

    fn refuse(&self, cause: TransportError) -> bool {
        if let Ok(mut slot) = self.rejection.lock() {
            *slot = Some(cause);
        }
        false
    }
}

impl client::Handler for HostKeyCheck {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        if self.policy == HostKeyVerification::Disabled {
            return Ok(true);
        }

        let accepted = match self.is_known(server_public_key) {
            Ok(true) => true,
            Ok(false) if self.policy == HostKeyVerification::AcceptNew => {
                self.remember(server_public_key);
                true
            }
            Ok(false) => self.refuse(TransportError::HostKeyUnknown {
                host: self.host.clone(),
                port: self.port,
            }),
            Err(cause) => self.refuse(cause),
        };

        Ok(accepted)
    }
}
