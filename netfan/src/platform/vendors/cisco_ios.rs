//! Cisco IOS / IOS-XE platform definition.
//!
//! ```text
//! router>                     # user EXEC
//! router#                     # privileged EXEC
//! router(config)#             # configuration
//! router(config-if)#          # configuration sub-mode
//! ```

use crate::platform::PlatformDefinition;

const PROMPT: &str = r"(?m)^[\w.\-@/:]{1,63}(?:\(config[\w.\-@/:+]{0,32}\))?[>#]\s?$";

/// Create the Cisco IOS platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new("cisco_ios", PROMPT)
        .expect("static IOS prompt")
        .with_config_mode("configure terminal", "end")
        .with_save_command("write memory")
        .with_failure_pattern("% Invalid input detected")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Unknown command")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
}
