//! ArubaOS mobility controller platform definition.
//!
//! # Prompt Examples
//!
//! ```text
//! (aruba-md1) >                      # user mode
//! (aruba-md1) #                      # enable mode
//! (aruba-md1) (config) #             # configuration mode
//! (aruba-md1) [mynode] (config) #    # AOS 8 managed node path
//! ```
//!
//! The enable-mode prompt is what the bulk scripts expect after login; the
//! controller puts admin users straight into it.

use crate::platform::PlatformDefinition;

/// Any ArubaOS prompt: hostname in parens, optional node path, optional
/// config context, then `>` or `#`.
const PROMPT: &str =
    r"(?m)^\([\w.\-@/: ]{1,63}\)\s?(?:\[[\w.\-/]{1,63}\]\s?)?(?:\([\w.\-@/: ]{1,63}\)\s?)?[>#]\s?$";

/// Create the ArubaOS platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new("aruba_os", PROMPT)
        .expect("static ArubaOS prompt")
        .with_config_mode("configure terminal", "end")
        .with_save_command("write memory")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Parse error")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("Error:")
        .with_on_open_command("no paging")
        .with_terminal_size(511, 24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aruba_platform() {
        let platform = platform();
        assert_eq!(platform.name, "aruba_os");
        assert_eq!(platform.config_enter.as_deref(), Some("configure terminal"));
        assert_eq!(platform.save_command.as_deref(), Some("write memory"));
        assert_eq!(platform.on_open_commands, vec!["no paging".to_string()]);
    }

    #[test]
    fn test_prompt_matches_all_modes() {
        let prompt = platform().prompt;
        assert!(prompt.is_match(b"(aruba-md1) >"));
        assert!(prompt.is_match(b"(aruba-md1) #"));
        assert!(prompt.is_match(b"(aruba-md1) (config) #"));
        assert!(prompt.is_match(b"(aruba-md1) [mynode] (config) #"));
        assert!(prompt.is_match(b"show ap database\n(aruba-md1) #"));
    }

    #[test]
    fn test_prompt_ignores_output_lines() {
        let prompt = platform().prompt;
        assert!(!prompt.is_match(b"Do you really want to restart the system(y/n):"));
        assert!(!prompt.is_match(b"switch#"));
    }

    #[test]
    fn test_failure_patterns() {
        let platform = platform();
        assert_eq!(
            platform.detect_failure("% Parse error while parsing 'vlan abc'"),
            Some("% Parse error")
        );
    }
}
