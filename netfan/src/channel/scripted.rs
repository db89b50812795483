//! Canned shell for session tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use regex::bytes::Regex;

use super::Shell;
use crate::error::{ChannelError, Result};

/// Answers each line from a script and records what was sent.
///
/// Every line is echoed. A scripted reply follows the echo; lines without
/// one get just the prompt back.
#[derive(Debug)]
pub(crate) struct ScriptedShell {
    prompt: String,
    replies: HashMap<String, String>,
    pending: Vec<u8>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl ScriptedShell {
    /// A shell past login, sitting at `prompt`.
    pub(crate) fn new(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            replies: HashMap::new(),
            pending: Vec::new(),
            sent: Arc::default(),
        }
    }

    /// Answer `line` with `output` followed by the prompt.
    pub(crate) fn reply(mut self, line: &str, output: &str) -> Self {
        let full = format!("{output}\r\n{}", self.prompt);
        self.replies.insert(line.to_string(), full);
        self
    }

    /// Answer `line` with `output` and no prompt.
    pub(crate) fn reply_raw(mut self, line: &str, output: &str) -> Self {
        self.replies.insert(line.to_string(), output.to_string());
        self
    }

    /// Lines sent so far; stays readable after the shell is consumed.
    pub(crate) fn sent(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.sent)
    }
}

impl Shell for ScriptedShell {
    async fn send_line(&mut self, line: &str) -> Result<()> {
        self.sent.lock().unwrap().push(line.to_string());
        let reply = match self.replies.get(line) {
            Some(reply) => reply.clone(),
            None => self.prompt.clone(),
        };
        self.pending.extend_from_slice(format!("{line}\r\n{reply}").as_bytes());
        Ok(())
    }

    async fn read_until(&mut self, pattern: &Regex, timeout: Duration) -> Result<Vec<u8>> {
        match pattern.find(&self.pending) {
            Some(m) => {
                let end = m.end();
                Ok(self.pending.drain(..end).collect())
            }
            None => Err(ChannelError::PatternTimeout(timeout).into()),
        }
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }
}
