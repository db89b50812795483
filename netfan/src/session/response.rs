//! Response type for command execution results.

use std::time::Duration;

use crate::error::{Result, SessionError};

/// Output of one command sent to a device.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was sent.
    pub command: String,

    /// Output with the command echo and trailing prompt removed.
    pub result: String,

    /// The prompt that ended the output.
    pub prompt: String,

    /// Time from send to prompt.
    pub elapsed: Duration,

    /// The failure marker that matched, if the device rejected the command.
    pub failure_message: Option<String>,
}

impl Response {
    /// Create a successful response.
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            prompt: prompt.into(),
            elapsed,
            failure_message: None,
        }
    }

    /// Create a failed response.
    pub fn failed(
        command: impl Into<String>,
        result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
        failure_message: impl Into<String>,
    ) -> Self {
        Self {
            failure_message: Some(failure_message.into()),
            ..Self::new(command, result, prompt, elapsed)
        }
    }

    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Turn a failed response into [`SessionError::CommandFailed`].
    ///
    /// The error message is the offending output line when one contains the
    /// marker, otherwise the marker itself.
    pub fn into_result(self) -> Result<Response> {
        match self.failure_message {
            None => Ok(self),
            Some(ref marker) => {
                let message = self
                    .result
                    .lines()
                    .find(|line| line.contains(marker.as_str()))
                    .unwrap_or(marker)
                    .trim()
                    .to_string();
                Err(SessionError::CommandFailed {
                    command: self.command,
                    message,
                }
                .into())
            }
        }
    }

    /// Get the result lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}
