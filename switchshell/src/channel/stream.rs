//! The byte-stream contract the transaction driver runs over.

use std::future::Future;

use crate::error::Result;

/// A bidirectional, unframed shell byte stream.
///
/// Implementations carry raw terminal bytes to and from a remote CLI. There is
/// no message framing: the only things a caller can learn are whether bytes
/// are waiting and what they are.
///
/// Availability checks and reads never block. Once the underlying channel is
/// broken, every method returns an error instead of reporting "no data".
///
/// A stream is half-duplex from the driver's point of view: one transaction at
/// a time, enforced by `&mut` access.
pub trait ShellStream: Send {
    /// Queue bytes for the remote side.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Push any queued bytes to the remote side.
    fn flush(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Whether bytes are ready to be read right now.
    fn has_data_available(&mut self) -> Result<bool>;

    /// Drain every byte that is ready right now (possibly none).
    fn read_available(&mut self) -> Result<Vec<u8>>;

    /// Close the stream. Further calls fail.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

impl<S: ShellStream> ShellStream for &mut S {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data).await
    }

    async fn flush(&mut self) -> Result<()> {
        (**self).flush().await
    }

    fn has_data_available(&mut self) -> Result<bool> {
        (**self).has_data_available()
    }

    fn read_available(&mut self) -> Result<Vec<u8>> {
        (**self).read_available()
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted in-memory stream for driver tests.

    use std::collections::VecDeque;
    use std::time::Duration;

    use tokio::time::Instant;

    use super::ShellStream;
    use crate::error::{ChannelError, Result};

    /// One entry in the observable call log.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Write(Vec<u8>),
        Flush,
        Poll,
        Read,
    }

    /// Stream that releases scripted chunks at fixed offsets from creation,
    /// measured on the tokio clock. Writes matching a reply trigger add
    /// that reply as immediately available.
    #[derive(Debug)]
    pub struct ScriptedStream {
        start: Instant,
        scheduled: VecDeque<(Duration, Vec<u8>)>,
        ready: Vec<u8>,
        replies: Vec<(String, Vec<u8>)>,
        pub calls: Vec<Call>,
        pub written: Vec<u8>,
        pub fail_writes: bool,
        pub broken: bool,
    }

    impl ScriptedStream {
        pub fn new() -> Self {
            Self {
                start: Instant::now(),
                scheduled: VecDeque::new(),
                ready: Vec::new(),
                replies: Vec::new(),
                calls: Vec::new(),
                written: Vec::new(),
                fail_writes: false,
                broken: false,
            }
        }

        /// Make `data` available `after` the stream was created.
        pub fn schedule(mut self, after: Duration, data: &[u8]) -> Self {
            self.scheduled.push_back((after, data.to_vec()));
            self
        }

        /// Answer the first write containing `line` with `output`.
        pub fn reply(mut self, line: &str, output: &str) -> Self {
            self.replies.push((line.to_string(), output.as_bytes().to_vec()));
            self
        }

        pub fn written_str(&self) -> String {
            String::from_utf8_lossy(&self.written).into_owned()
        }

        fn release_due(&mut self) {
            let now = self.start.elapsed();
            while let Some((at, _)) = self.scheduled.front() {
                if *at > now {
                    break;
                }
                if let Some((_, data)) = self.scheduled.pop_front() {
                    self.ready.extend_from_slice(&data);
                }
            }
        }
    }

    impl ShellStream for ScriptedStream {
        async fn write(&mut self, data: &[u8]) -> Result<()> {
            if self.fail_writes || self.broken {
                return Err(ChannelError::WriteFailed("socket closed".into()).into());
            }
            self.calls.push(Call::Write(data.to_vec()));
            self.written.extend_from_slice(data);

            let line = String::from_utf8_lossy(data);
            if let Some(idx) = self
                .replies
                .iter()
                .position(|(trigger, _)| line.trim_end() == trigger.as_str())
            {
                let (_, output) = self.replies.remove(idx);
                self.ready.extend_from_slice(&output);
            }
            Ok(())
        }

        async fn flush(&mut self) -> Result<()> {
            if self.broken {
                return Err(ChannelError::Closed.into());
            }
            self.calls.push(Call::Flush);
            Ok(())
        }

        fn has_data_available(&mut self) -> Result<bool> {
            if self.broken {
                return Err(ChannelError::Closed.into());
            }
            self.calls.push(Call::Poll);
            self.release_due();
            Ok(!self.ready.is_empty())
        }

        fn read_available(&mut self) -> Result<Vec<u8>> {
            if self.broken {
                return Err(ChannelError::Closed.into());
            }
            self.calls.push(Call::Read);
            self.release_due();
            Ok(std::mem::take(&mut self.ready))
        }

        async fn close(&mut self) -> Result<()> {
            self.broken = true;
            Ok(())
        }
    }
}
