//! Linux platform definition.
//!
//! Used for the credential probe against the local control host, and for
//! plain Unix targets with `$` (user) and `#` (root) prompts.

use crate::platform::PlatformDefinition;

/// Create the Linux platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new("linux", r"[$#]\s*$")
        .expect("static linux prompt")
        .with_failure_pattern("command not found")
        .with_failure_pattern("No such file or directory")
        .with_failure_pattern("Permission denied")
        .with_failure_pattern("Operation not permitted")
}
