//! Commands that stop and ask for input.
//!
//! `reload` on ArubaOS asks "Do you really want to restart the
//! system(y/n):" before doing anything. An interactive sequence sends each
//! input and waits for the pattern that should follow it.

use std::time::Duration;

use regex::bytes::Regex;

use crate::error::{ChannelError, Result};

/// One input plus the pattern expected after it.
#[derive(Debug, Clone)]
pub struct InteractiveEvent {
    /// The text to send.
    pub input: String,

    /// Pattern to wait for after sending input.
    pub pattern: Regex,

    /// Keep the input out of logs (passwords).
    pub hidden: bool,

    /// Per-event timeout override.
    pub timeout: Option<Duration>,
}

impl InteractiveEvent {
    /// Create an event, failing on an invalid pattern.
    pub fn new(input: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(Self {
            input: input.into(),
            pattern: Regex::new(pattern).map_err(ChannelError::InvalidPattern)?,
            hidden: false,
            timeout: None,
        })
    }

    /// Set a custom timeout for this event.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Mark the input as hidden.
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Input as it may appear in logs.
    pub fn loggable_input(&self) -> &str {
        if self.hidden { "********" } else { &self.input }
    }
}

/// Output gathered for one event.
#[derive(Debug, Clone)]
pub struct InteractiveStep {
    /// The input that was sent (masked if hidden).
    pub input: String,

    /// Output received up to the expected pattern.
    pub output: String,

    /// Time taken for this step.
    pub elapsed: Duration,
}

/// Result of an interactive sequence.
#[derive(Debug, Clone, Default)]
pub struct InteractiveResult {
    /// One entry per event, in order.
    pub steps: Vec<InteractiveStep>,

    /// Total time for the entire sequence.
    pub elapsed: Duration,
}

impl InteractiveResult {
    /// Output of the last step.
    pub fn final_output(&self) -> Option<&str> {
        self.steps.last().map(|s| s.output.as_str())
    }

    /// All outputs concatenated.
    pub fn full_output(&self) -> String {
        self.steps.iter().map(|s| s.output.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern() {
        assert!(InteractiveEvent::new("reload", r"(y/n").is_err());
    }

    #[test]
    fn test_hidden_input_is_masked() {
        let event = InteractiveEvent::new("secret123", r"#").unwrap().with_hidden(true);
        assert_eq!(event.loggable_input(), "********");
        assert_eq!(event.input, "secret123");
    }

    #[test]
    fn test_result_outputs() {
        let result = InteractiveResult {
            steps: vec![
                InteractiveStep {
                    input: "reload".into(),
                    output: "Do you really want to restart the system(y/n):".into(),
                    elapsed: Duration::from_millis(100),
                },
                InteractiveStep {
                    input: "y".into(),
                    output: "System will now restart!".into(),
                    elapsed: Duration::from_millis(50),
                },
            ],
            elapsed: Duration::from_millis(150),
        };
        assert_eq!(result.final_output(), Some("System will now restart!"));
        assert!(result.full_output().starts_with("Do you really"));
    }
}
