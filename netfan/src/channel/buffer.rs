//! Output buffer with tail-only prompt search.
//!
//! Only the last `search_depth` bytes are searched for prompt patterns, so
//! large outputs (full user tables, running configs) do not make every read
//! rescan everything received so far.
//!
//! Terminal escapes are removed by a `vte` parser that lives as long as the
//! buffer, so a sequence split across two reads is still recognised.

use std::fmt;

use bytes::BytesMut;
use regex::bytes::Regex;
use vte::{Parser, Perform};

/// Accumulates shell output and finds prompts near its end.
pub struct PatternBuffer {
    buffer: BytesMut,

    /// Escape parser state carried between reads.
    parser: Parser,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,
}

/// Keeps printable text and line control, drops every escape sequence.
struct Printable<'a>(&'a mut BytesMut);

impl Perform for Printable<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.0.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.0.extend_from_slice(&[byte]);
        }
    }
}

impl PatternBuffer {
    /// Create a buffer that searches the last `search_depth` bytes.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            parser: Parser::new(),
            search_depth,
        }
    }

    /// Append data with terminal escape sequences removed.
    pub fn extend(&mut self, data: &[u8]) {
        self.parser.advance(&mut Printable(&mut self.buffer), data);
    }

    /// Absolute end offset of the first match inside the tail window.
    pub fn find_in_tail(&self, pattern: &Regex) -> Option<usize> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern.find(&self.buffer[start..]).map(|m| start + m.end())
    }

    /// Remove and return the first `at` bytes, keeping the rest.
    pub fn split_to(&mut self, at: usize) -> Vec<u8> {
        self.buffer.split_to(at.min(self.buffer.len())).to_vec()
    }

    /// Take everything and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.buffer.split().to_vec()
    }

    /// Current contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.buffer.len())
            .field("search_depth", &self.search_depth)
            .finish_non_exhaustive()
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mGreen text\x1b[0m");
        assert_eq!(buffer.as_slice(), b"Green text");
    }

    #[test]
    fn test_tail_search_returns_absolute_offset() {
        let mut buffer = PatternBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\n(md1) #");

        let pattern = Regex::new(r"\(md1\) #").unwrap();
        assert_eq!(buffer.find_in_tail(&pattern), Some(buffer.len()));
    }

    #[test]
    fn test_match_outside_tail_is_ignored() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(b"router#");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"router#").unwrap();
        assert!(buffer.find_in_tail(&pattern).is_none());
    }

    #[test]
    fn test_escape_split_across_reads() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\r\n(aruba-md1) \x1b[0");
        buffer.extend(b"m#");
        assert_eq!(buffer.as_slice(), b"\r\n(aruba-md1) #");

        let prompt = crate::platform::vendors::aruba_os::platform().prompt;
        assert!(buffer.find_in_tail(&prompt).is_some());
    }

    #[test]
    fn test_plain_esc_sequences_stripped() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b=\x1b7(aruba-md1) #\x1b]0;title\x07");
        assert_eq!(buffer.as_slice(), b"(aruba-md1) #");
    }

    #[test]
    fn test_multibyte_text_kept() {
        let mut buffer = PatternBuffer::new(100);
        let text = "caf\u{e9}\n".as_bytes();
        buffer.extend(&text[..4]);
        buffer.extend(&text[4..]);
        assert_eq!(buffer.as_slice(), text);
    }

    #[test]
    fn test_split_keeps_remainder() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"out\nhost# trailing");
        let pattern = Regex::new(r"host#").unwrap();
        let end = buffer.find_in_tail(&pattern).unwrap();
        assert_eq!(buffer.split_to(end), b"out\nhost#");
        assert_eq!(buffer.as_slice(), b" trailing");
        assert_eq!(buffer.take(), b" trailing");
        assert!(buffer.is_empty());
    }
}
