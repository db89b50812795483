//! Platform definition for vendor-specific CLI behavior.

use regex::bytes::Regex;

use crate::error::{PlatformError, Result};

/// Prompt shape, mode commands and failure markers for one device family.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "aruba_os", "cisco_ios", "linux").
    pub name: String,

    /// Matches any prompt the device can show (exec or config mode).
    pub prompt: Regex,

    /// Command that enters configuration mode.
    pub config_enter: Option<String>,

    /// Command that leaves configuration mode.
    pub config_exit: Option<String>,

    /// Command that persists the running configuration.
    pub save_command: Option<String>,

    /// Substrings that mark a command as failed.
    pub failed_when_contains: Vec<String>,

    /// Commands to run when the session opens (paging off, etc.).
    pub on_open_commands: Vec<String>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl PlatformDefinition {
    /// Create a platform with the given prompt regex.
    pub fn new(name: impl Into<String>, prompt: &str) -> Result<Self> {
        let name = name.into();
        let prompt = Regex::new(prompt).map_err(|e| PlatformError::InvalidDefinition {
            message: format!("{name}: bad prompt pattern: {e}"),
        })?;
        Ok(Self {
            name,
            prompt,
            config_enter: None,
            config_exit: None,
            save_command: None,
            failed_when_contains: vec![],
            on_open_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
        })
    }

    /// Set the configuration mode enter/exit commands.
    pub fn with_config_mode(mut self, enter: impl Into<String>, exit: impl Into<String>) -> Self {
        self.config_enter = Some(enter.into());
        self.config_exit = Some(exit.into());
        self
    }

    /// Set the save command.
    pub fn with_save_command(mut self, command: impl Into<String>) -> Self {
        self.save_command = Some(command.into());
        self
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// First failure marker found in `output`, if any.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|p| output.contains(p.as_str()))
            .map(String::as_str)
    }

    /// Strip the echoed command and the trailing prompt line.
    pub fn normalize_output(&self, raw: &str, command: &str) -> String {
        let raw = raw.replace('\r', "");
        let trimmed = raw.trim_start_matches('\n');
        let output = trimmed
            .strip_prefix(command)
            .unwrap_or(trimmed)
            .trim_start_matches('\n');

        match output.rfind('\n') {
            Some(pos) => output[..pos].to_string(),
            None if self.prompt.is_match(output.as_bytes()) => String::new(),
            None => output.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PlatformDefinition {
        PlatformDefinition::new("test", r"(?m)^host[>#]\s?$")
            .unwrap()
            .with_failure_pattern("% Invalid")
    }

    #[test]
    fn test_bad_prompt_rejected() {
        assert!(PlatformDefinition::new("broken", r"(unclosed").is_err());
    }

    #[test]
    fn test_detect_failure() {
        let platform = sample();
        assert_eq!(
            platform.detect_failure("% Invalid input detected"),
            Some("% Invalid")
        );
        assert_eq!(platform.detect_failure("all good"), None);
    }

    #[test]
    fn test_normalize_strips_echo_and_prompt() {
        let platform = sample();
        let raw = "show clock\r\n10:00:00 UTC\r\nhost#";
        assert_eq!(platform.normalize_output(raw, "show clock"), "10:00:00 UTC");
    }

    #[test]
    fn test_normalize_prompt_only() {
        let platform = sample();
        assert_eq!(platform.normalize_output("write mem\nhost#", "write mem"), "");
        assert_eq!(platform.normalize_output("host#", "x"), "");
    }
}
