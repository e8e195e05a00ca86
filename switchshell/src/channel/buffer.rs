//! Output buffer that strips terminal escapes as bytes arrive.
//!
//! Switch CLIs emit colour codes, cursor movement and bell characters in the
//! middle of otherwise plain tables. The buffer feeds every chunk through a
//! `vte` parser and keeps only printable text plus line structure, so the
//! accumulated output can be matched and parsed as plain text.
//!
//! The parser state persists across chunks, so an escape sequence split over
//! two reads is still removed.

use std::fmt;

use bytes::BytesMut;
use regex::bytes::Regex;

/// Accumulates cleaned shell output and searches its tail for prompts.
pub struct OutputBuffer {
    /// Cleaned output.
    buffer: BytesMut,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,

    /// Escape-sequence parser, carried between chunks.
    parser: vte::Parser,

    /// Bytes received before cleaning.
    raw_len: usize,
}

/// `vte` performer that keeps printable characters and line control bytes.
struct Printable<'a> {
    out: &'a mut BytesMut,
}

impl vte::Perform for Printable<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out
            .extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.extend_from_slice(&[byte]);
        }
    }
}

impl OutputBuffer {
    /// Create a buffer that searches the last `search_depth` bytes for patterns.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
            parser: vte::Parser::new(),
            raw_len: 0,
        }
    }

    /// Append raw bytes from the stream, dropping escape sequences.
    pub fn extend(&mut self, data: &[u8]) {
        self.raw_len += data.len();
        let mut printable = Printable {
            out: &mut self.buffer,
        };
        self.parser.advance(&mut printable, data);
    }

    /// Search only the last `search_depth` bytes for the pattern.
    pub fn search_tail(&self, pattern: &Regex) -> Option<regex::bytes::Match<'_>> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern.find(&self.buffer[start..])
    }

    /// Check if the tail contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// Number of complete lines seen so far.
    pub fn line_count(&self) -> usize {
        memchr::memchr_iter(b'\n', &self.buffer).count()
    }

    /// Take the cleaned contents and reset.
    pub fn take(&mut self) -> BytesMut {
        self.raw_len = 0;
        self.buffer.split()
    }

    /// Bytes received before escape stripping.
    pub fn raw_len(&self) -> usize {
        self.raw_len
    }
}

impl fmt::Debug for OutputBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputBuffer")
            .field("len", &self.buffer.len())
            .field("raw_len", &self.raw_len)
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = OutputBuffer::new(100);
        buffer.extend(b"Switch#show clock\r\n");
        assert_eq!(buffer.raw_len(), 19);
        assert_eq!(&buffer.take()[..], b"Switch#show clock\r\n");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = OutputBuffer::new(100);
        buffer.extend(b"\x1b[32mconnected\x1b[0m");
        assert_eq!(buffer.raw_len(), 18);
        assert_eq!(&buffer.take()[..], b"connected");
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let mut buffer = OutputBuffer::new(100);
        buffer.extend(b"Gi1/0/1\x1b[3");
        buffer.extend(b"1mdown\x1b[0m");
        assert_eq!(&buffer.take()[..], b"Gi1/0/1down");
    }

    #[test]
    fn test_bell_dropped_newlines_kept() {
        let mut buffer = OutputBuffer::new(100);
        buffer.extend(b"line one\x07\r\nline two\n");
        assert_eq!(buffer.line_count(), 2);
        assert_eq!(&buffer.take()[..], b"line one\r\nline two\n");
    }

    #[test]
    fn test_tail_search() {
        let mut buffer = OutputBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nSwitch#");

        let pattern = Regex::new(r"Switch#").unwrap();
        assert!(buffer.tail_contains(&pattern));
    }

    #[test]
    fn test_tail_search_not_in_tail() {
        let mut buffer = OutputBuffer::new(10);
        buffer.extend(b"Switch#");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"Switch#").unwrap();
        assert!(!buffer.tail_contains(&pattern));
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = OutputBuffer::new(100);
        buffer.extend(b"test data");
        assert_eq!(&buffer.take()[..], b"test data");
        assert!(buffer.take().is_empty());
        assert_eq!(buffer.raw_len(), 0);
    }
}
