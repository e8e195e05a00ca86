//! Interactive PTY shell exposed as a [`ShellStream`].
//!
//! russh delivers channel data through an async `wait()` call, while the
//! transaction driver needs non-blocking "is anything there" checks. A
//! background task owns the channel: it forwards incoming data into an
//! unbounded queue and performs writes handed to it, acknowledging each one.
//! When the remote side closes the channel the queue is dropped, so the shell
//! reports an error instead of an endless "no data".

use bytes::BytesMut;
use log::{debug, trace, warn};
use russh::ChannelMsg;
use russh::client::Msg;
use tokio::sync::{mpsc, oneshot};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;

use super::ssh::SshTransport;
use crate::channel::ShellStream;
use crate::error::{ChannelError, Result, TransportError};

/// Requests handed to the channel task.
enum Outgoing {
    Data(Vec<u8>, oneshot::Sender<std::result::Result<(), russh::Error>>),
    Close,
}

/// A live shell on a switch.
pub struct SshShell {
    outgoing: mpsc::Sender<Outgoing>,
    incoming: mpsc::UnboundedReceiver<Vec<u8>>,
    pending: BytesMut,
    remote_closed: bool,
    task: Option<JoinHandle<()>>,
    transport: Option<SshTransport>,
}

impl SshShell {
    /// Start the channel task for an already-opened shell channel.
    pub(crate) fn spawn(channel: russh::Channel<Msg>, transport: SshTransport) -> Self {
        let (outgoing, writes) = mpsc::channel(16);
        let (reads, incoming) = mpsc::unbounded_channel();
        let task = tokio::spawn(pump(channel, writes, reads));

        Self {
            outgoing,
            incoming,
            pending: BytesMut::new(),
            remote_closed: false,
            task: Some(task),
            transport: Some(transport),
        }
    }

    /// Move everything the task has queued into `pending`.
    fn drain_queue(&mut self) {
        loop {
            match self.incoming.try_recv() {
                Ok(chunk) => self.pending.extend_from_slice(&chunk),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    if !self.remote_closed {
                        debug!("shell channel closed by remote");
                    }
                    self.remote_closed = true;
                    return;
                }
            }
        }
    }
}

impl ShellStream for SshShell {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let (ack, acked) = oneshot::channel();
        self.outgoing
            .send(Outgoing::Data(data.to_vec(), ack))
            .await
            .map_err(|_| ChannelError::Closed)?;

        match acked.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TransportError::Ssh(e).into()),
            Err(_) => Err(ChannelError::Closed.into()),
        }
    }

    async fn flush(&mut self) -> Result<()> {
        // Writes are acknowledged by the channel task, nothing is buffered here
        if self.outgoing.is_closed() {
            return Err(ChannelError::Closed.into());
        }
        Ok(())
    }

    fn has_data_available(&mut self) -> Result<bool> {
        self.drain_queue();
        if !self.pending.is_empty() {
            return Ok(true);
        }
        if self.remote_closed {
            return Err(TransportError::Disconnected.into());
        }
        Ok(false)
    }

    fn read_available(&mut self) -> Result<Vec<u8>> {
        self.drain_queue();
        if self.pending.is_empty() && self.remote_closed {
            return Err(TransportError::Disconnected.into());
        }
        Ok(self.pending.split().to_vec())
    }

    async fn close(&mut self) -> Result<()> {
        let _ = self.outgoing.send(Outgoing::Close).await;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.remote_closed = true;

        if let Some(transport) = self.transport.take() {
            transport.disconnect().await?;
        }
        Ok(())
    }
}

impl Drop for SshShell {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            warn!("SshShell dropped without close(); aborting channel task");
            task.abort();
        }
    }
}

/// Channel task: forward incoming data, perform writes, stop on close.
async fn pump(
    mut channel: russh::Channel<Msg>,
    mut writes: mpsc::Receiver<Outgoing>,
    reads: mpsc::UnboundedSender<Vec<u8>>,
) {
    loop {
        tokio::select! {
            msg = channel.wait() => match msg {
                Some(ChannelMsg::Data { data }) => {
                    trace!("channel data: {} bytes", data.len());
                    if reads.send(data.to_vec()).is_err() {
                        break;
                    }
                }
                Some(ChannelMsg::ExtendedData { data, .. }) => {
                    if reads.send(data.to_vec()).is_err() {
                        break;
                    }
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => break,
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    debug!("remote shell exited with status {}", exit_status);
                }
                Some(_) => {}
            },
            request = writes.recv() => match request {
                Some(Outgoing::Data(bytes, ack)) => {
                    let result = channel.data(&bytes[..]).await;
                    let _ = ack.send(result);
                }
                Some(Outgoing::Close) | None => {
                    if let Err(e) = channel.close().await {
                        debug!("channel close: {}", e);
                    }
                    break;
                }
            },
        }
    }
}
