//! Interactive shell channel with prompt-driven reads.

use std::future::Future;
use std::time::Duration;

use log::trace;
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use crate::error::{ChannelError, Result};

/// Line-oriented, prompt-driven shell I/O.
///
/// [`DeviceSession`](crate::session::DeviceSession) only talks to its shell
/// through this trait.
pub trait Shell: Send {
    /// Write `line` followed by a newline.
    fn send_line(&mut self, line: &str) -> impl Future<Output = Result<()>> + Send;

    /// Read until `pattern` matches near the end of the output, or fail
    /// with [`ChannelError::PatternTimeout`] once `timeout` passes.
    fn read_until(
        &mut self,
        pattern: &Regex,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Close the shell.
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}

/// A PTY shell on which lines are written and output is read up to a prompt.
pub struct ShellChannel {
    channel: Channel<Msg>,
    buffer: PatternBuffer,
}

impl ShellChannel {
    /// Wrap an open shell channel.
    pub fn new(channel: Channel<Msg>, search_depth: usize) -> Self {
        Self {
            channel,
            buffer: PatternBuffer::new(search_depth),
        }
    }
}

impl Shell for ShellChannel {
    async fn send_line(&mut self, line: &str) -> Result<()> {
        let data = format!("{line}\n");
        self.channel
            .data(data.as_bytes())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    /// Returns everything up to and including the match; bytes after it stay
    /// buffered for the next read.
    async fn read_until(&mut self, pattern: &Regex, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(end) = self.buffer.find_in_tail(pattern) {
                return Ok(self.buffer.split_to(end));
            }

            let msg = tokio::time::timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| ChannelError::PatternTimeout(timeout))?;

            match msg {
                Some(ChannelMsg::Data { data }) => {
                    trace!("read {} bytes", data.len());
                    self.buffer.extend(&data);
                }
                Some(ChannelMsg::ExtendedData { data, .. }) => self.buffer.extend(&data),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    return Err(ChannelError::Closed.into());
                }
                Some(_) => {}
            }
        }
    }

    /// Sends EOF first.
    async fn close(self) -> Result<()> {
        self.channel.eof().await.map_err(ChannelError::Ssh)?;
        self.channel.close().await.map_err(ChannelError::Ssh)?;
        Ok(())
    }
}
