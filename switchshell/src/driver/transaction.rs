//! Windowed request/response over an unframed shell stream.
//!
//! A switch shell gives no length prefix and no end-of-response marker. The
//! only synchronisation available is the wall clock: write the command, let
//! the device start answering, then drain whatever shows up until a fixed
//! window runs out. Every transaction therefore costs its settle delay plus
//! its full window unless an optional prompt pattern ends it early.

use std::fmt;
use std::time::Duration;

use log::{debug, trace};
use regex::bytes::Regex;
use tokio::time::{Instant, sleep};

use crate::channel::{OutputBuffer, ShellStream};
use crate::error::{DriverError, Result};

/// Shortest sleep between availability checks.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Bytes from the end of the output searched for an early-exit prompt.
const PROMPT_SEARCH_DEPTH: usize = 1000;

/// Stand-in deadline for windows too large to add to the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Timing parameters for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Wait after writing, before the first read.
    pub settle_delay: Duration,

    /// How long to keep draining after the settle delay.
    pub window: Duration,

    /// Sleep between availability checks while the stream is quiet.
    pub poll_interval: Duration,
}

impl Timing {
    /// Timing with the given settle delay and window, default poll interval.
    pub fn new(settle_delay: Duration, window: Duration) -> Self {
        Self {
            settle_delay,
            window,
            ..Self::default()
        }
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Minimum wall time a transaction without early exit takes.
    pub fn total(&self) -> Duration {
        self.settle_delay.saturating_add(self.window)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(500),
            window: Duration::from_secs(1),
            poll_interval: Duration::from_millis(20),
        }
    }
}

/// One request: an optional command line plus how long to collect output.
///
/// An empty command sends nothing and only collects what is pending, which
/// is how banners and prompts are consumed.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use switchshell::driver::Transaction;
///
/// let tx = Transaction::new("show interfaces status")
///     .with_window(Duration::from_secs(3));
/// assert_eq!(tx.timing.window, Duration::from_secs(3));
///
/// let flush = Transaction::read();
/// assert!(flush.command.is_empty());
/// ```
#[derive(Clone)]
pub struct Transaction {
    /// Command line to send, without terminator.
    pub command: String,

    /// Settle delay, window and poll interval.
    pub timing: Timing,

    /// Prompt that ends collection early when it appears at the output tail.
    pub until: Option<Regex>,

    /// Whether the command must be masked in logs (secrets).
    pub hidden: bool,
}

impl Transaction {
    /// Create a transaction for `command` with default timing.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timing: Timing::default(),
            until: None,
            hidden: false,
        }
    }

    /// Create a transaction that sends nothing and only collects.
    pub fn read() -> Self {
        Self::new("")
    }

    /// Create a transaction whose command is never logged.
    pub fn hidden(command: impl Into<String>) -> Self {
        Self {
            hidden: true,
            ..Self::new(command)
        }
    }

    /// Replace all timing parameters.
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Set the settle delay.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.timing.settle_delay = settle_delay;
        self
    }

    /// Set the collection window.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.timing.window = window;
        self
    }

    /// End collection as soon as `prompt` matches the output tail.
    pub fn until(mut self, prompt: Regex) -> Self {
        self.until = Some(prompt);
        self
    }

    /// The command as it may appear in logs.
    fn loggable(&self) -> &str {
        if self.hidden { "********" } else { &self.command }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("command", &self.loggable())
            .field("timing", &self.timing)
            .field("until", &self.until.as_ref().map(Regex::as_str))
            .field("hidden", &self.hidden)
            .finish()
    }
}

/// Output collected during one transaction.
///
/// There is no success flag. A command with no output and a device that
/// did not answer in time both produce empty text; callers decide by content.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    /// Output with terminal escapes removed (lossy UTF-8).
    pub text: String,

    /// Bytes read from the stream before escape stripping.
    pub raw_bytes: usize,

    /// Wall time from first write to return.
    pub elapsed: Duration,

    /// Whether the early-exit prompt ended collection.
    pub prompt_matched: bool,
}

impl Collected {
    /// Whether nothing at all was collected.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Iterate over the output lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// Check if the output contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.text.contains(pattern)
    }
}

impl fmt::Display for Collected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Send a command and collect the response within the transaction's window.
///
/// 1. A non-empty command is written with a single `\n` and flushed. A
///    command containing a line break is refused before anything is written.
///    A write or flush failure is returned before anything is read.
/// 2. The settle delay always elapses before the first read.
/// 3. The stream is drained whenever it has data until the window is over.
///    While quiet, the task sleeps for the poll interval; one final check is
///    made when the window closes so late bytes are kept.
///
/// Running out of window is the normal way to finish and is not an error.
/// A stream that fails while being polled ends the transaction with that
/// error.
pub async fn transact<S: ShellStream>(stream: &mut S, tx: &Transaction) -> Result<Collected> {
    let start = Instant::now();

    if tx.command.contains(['\r', '\n']) {
        return Err(DriverError::InvalidConfig {
            message: format!("command {:?} spans more than one line", tx.loggable()),
        }
        .into());
    }

    if !tx.command.is_empty() {
        let mut line = Vec::with_capacity(tx.command.len() + 1);
        line.extend_from_slice(tx.command.as_bytes());
        line.push(b'\n');

        stream.write(&line).await?;
        stream.flush().await?;
        debug!("sent {:?}", tx.loggable());
    }

    if !tx.timing.settle_delay.is_zero() {
        sleep(tx.timing.settle_delay).await;
    }

    let poll_interval = tx.timing.poll_interval.max(MIN_POLL_INTERVAL);
    let now = Instant::now();
    let deadline = now
        .checked_add(tx.timing.window)
        .unwrap_or_else(|| now + FAR_FUTURE);
    let mut buffer = OutputBuffer::new(PROMPT_SEARCH_DEPTH);
    let mut prompt_matched = false;

    loop {
        if stream.has_data_available()? {
            let chunk = stream.read_available()?;
            trace!("read {} bytes for {:?}", chunk.len(), tx.loggable());
            buffer.extend(&chunk);

            if let Some(prompt) = &tx.until {
                if buffer.tail_contains(prompt) {
                    prompt_matched = true;
                    break;
                }
            }
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        sleep(poll_interval.min(deadline - now)).await;
    }

    let raw_bytes = buffer.raw_len();
    let lines = buffer.line_count();
    let text = String::from_utf8_lossy(&buffer.take()).into_owned();
    let elapsed = start.elapsed();

    debug!(
        "{:?}: {} bytes, {} lines in {:?}{}",
        tx.loggable(),
        raw_bytes,
        lines,
        elapsed,
        if prompt_matched { " (prompt)" } else { "" }
    );

    Ok(Collected {
        text,
        raw_bytes,
        elapsed,
        prompt_matched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::cisco_prompt;
    use crate::channel::mock::{Call, ScriptedStream};
    use crate::error::{ChannelError, Error};

    fn timing(settle_ms: u64, window_ms: u64) -> Timing {
        Timing::new(
            Duration::from_millis(settle_ms),
            Duration::from_millis(window_ms),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_written_with_single_newline_before_reads() {
        let mut stream = ScriptedStream::new();
        let tx = Transaction::new("show vlan brief").with_timing(timing(10, 50));

        transact(&mut stream, &tx).await.unwrap();

        assert_eq!(stream.written, b"show vlan brief\n");
        assert_eq!(stream.calls[0], Call::Write(b"show vlan brief\n".to_vec()));
        assert_eq!(stream.calls[1], Call::Flush);
        assert!(stream.calls[2..].iter().all(|c| matches!(c, Call::Poll | Call::Read)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_command_writes_nothing() {
        let mut stream = ScriptedStream::new().schedule(Duration::ZERO, b"Switch>");
        let tx = Transaction::read().with_timing(timing(0, 30));

        let collected = transact(&mut stream, &tx).await.unwrap();

        assert!(stream.written.is_empty());
        assert!(!stream.calls.iter().any(|c| matches!(c, Call::Write(_) | Call::Flush)));
        assert_eq!(collected.text, "Switch>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_stream_waits_settle_plus_window() {
        let mut stream = ScriptedStream::new();
        let tx = Transaction::new("enable").with_timing(timing(200, 300));

        let start = Instant::now();
        let collected = transact(&mut stream, &tx).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(500));
        assert!(collected.is_empty());
        assert!(!collected.prompt_matched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_data_at_window_edge_is_captured() {
        let mut stream = ScriptedStream::new().schedule(Duration::from_millis(99), b"!");
        let tx = Transaction::read().with_timing(timing(0, 100));

        let collected = transact(&mut stream, &tx).await.unwrap();

        assert_eq!(collected.text, "!");
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_arrival_inside_window() {
        let payload = [b'a'; 40];
        let mut stream = ScriptedStream::new().schedule(Duration::from_millis(50), &payload);
        let tx = Transaction::read().with_timing(timing(0, 100));

        let collected = transact(&mut stream, &tx).await.unwrap();

        assert_eq!(collected.raw_bytes, 40);
        assert_eq!(collected.text.as_bytes(), &payload[..]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunks_accumulate_in_order() {
        let mut stream = ScriptedStream::new()
            .schedule(Duration::from_millis(10), b"Port  Name\r\n")
            .schedule(Duration::from_millis(40), b"Gi1/0/1\r\n")
            .schedule(Duration::from_millis(70), b"Switch#");
        let tx = Transaction::read().with_timing(timing(0, 100));

        let collected = transact(&mut stream, &tx).await.unwrap();

        assert_eq!(collected.text, "Port  Name\r\nGi1/0/1\r\nSwitch#");
    }

    #[tokio::test(start_paused = true)]
    async fn test_data_after_window_is_left_pending() {
        let mut stream = ScriptedStream::new().schedule(Duration::from_millis(150), b"late");
        let tx = Transaction::read().with_timing(timing(0, 100));

        let collected = transact(&mut stream, &tx).await.unwrap();
        assert!(collected.is_empty());

        tokio::time::advance(Duration::from_millis(100)).await;
        let next = transact(&mut stream, &tx).await.unwrap();
        assert_eq!(next.text, "late");
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failure_propagates_without_reading() {
        let mut stream = ScriptedStream::new();
        stream.fail_writes = true;
        let tx = Transaction::new("write memory").with_timing(timing(0, 100));

        let err = transact(&mut stream, &tx).await.unwrap_err();

        assert!(matches!(err, Error::Channel(ChannelError::WriteFailed(_))));
        assert!(err.is_terminal());
        assert!(stream.calls.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_broken_stream_fails_instead_of_spinning() {
        let mut stream = ScriptedStream::new();
        stream.broken = true;
        let tx = Transaction::read().with_timing(timing(0, 10_000));

        let start = Instant::now();
        let result = transact(&mut stream, &tx).await;

        tokio_test::assert_err!(result);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_ends_window_early() {
        let mut stream = ScriptedStream::new()
            .schedule(Duration::from_millis(30), b"show clock\r\n*10:02:11 UTC\r\nSwitch#");
        let tx = Transaction::read()
            .with_timing(timing(0, 5_000))
            .until(cisco_prompt().clone());

        let start = Instant::now();
        let collected = transact(&mut stream, &tx).await.unwrap();

        assert!(collected.prompt_matched);
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(collected.text.ends_with("Switch#"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_escape_codes_removed_from_text() {
        let mut stream = ScriptedStream::new()
            .schedule(Duration::ZERO, b"\x1b[1mGi1/0/1\x1b[0m connected");
        let tx = Transaction::read().with_timing(timing(0, 20));

        let collected = transact(&mut stream, &tx).await.unwrap();

        assert_eq!(collected.text, "Gi1/0/1 connected");
        assert_eq!(collected.raw_bytes, 25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_multiline_command_refused_before_write() {
        let mut stream = ScriptedStream::new();
        let tx = Transaction::new("description lobby\nreload").with_timing(timing(0, 50));

        let err = transact(&mut stream, &tx).await.unwrap_err();

        assert!(matches!(err, Error::Driver(DriverError::InvalidConfig { .. })));
        assert!(!err.is_terminal());
        assert!(stream.written.is_empty());
        assert!(stream.calls.is_empty());

        let tx = Transaction::new("end\r").with_timing(timing(0, 50));
        tokio_test::assert_err!(transact(&mut stream, &tx).await);
        assert!(stream.written.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_window_ends_on_prompt() {
        let mut stream = ScriptedStream::new()
            .schedule(Duration::from_millis(30), b"show version\r\nSwitch#");
        let tx = Transaction::read()
            .with_timing(Timing::new(Duration::ZERO, Duration::MAX))
            .until(cisco_prompt().clone());

        let start = Instant::now();
        let collected = transact(&mut stream, &tx).await.unwrap();

        assert!(collected.prompt_matched);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_total_saturates() {
        let timing = Timing::new(Duration::from_secs(1), Duration::MAX);
        assert_eq!(timing.total(), Duration::MAX);
    }

    #[test]
    fn test_hidden_transaction_masks_command() {
        let tx = Transaction::hidden("s3cret");
        assert_eq!(tx.loggable(), "********");
        assert_eq!(tx.command, "s3cret");
        assert_eq!(Transaction::new("end").loggable(), "end");

        let debug = format!("{:?}", tx);
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("********"));
    }

    #[test]
    fn test_timing_defaults() {
        let timing = Timing::default();
        assert_eq!(timing.settle_delay, Duration::from_millis(500));
        assert_eq!(timing.window, Duration::from_secs(1));
        assert_eq!(timing.total(), Duration::from_millis(1500));
    }
}
