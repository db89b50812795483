//! Name-to-platform lookup.

use std::collections::HashMap;

use super::definition::PlatformDefinition;
use super::vendors;
use crate::error::{PlatformError, Result};

/// Registry of platform definitions, keyed by name.
#[derive(Debug, Default)]
pub struct PlatformRegistry {
    platforms: HashMap<String, PlatformDefinition>,
}

impl PlatformRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in vendor.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for platform in [
            vendors::aruba_os::platform(),
            vendors::cisco_ios::platform(),
            vendors::linux::platform(),
        ] {
            registry.platforms.insert(platform.name.clone(), platform);
        }
        registry
    }

    /// Register a platform definition.
    pub fn register(&mut self, platform: PlatformDefinition) -> Result<()> {
        if self.platforms.contains_key(&platform.name) {
            return Err(PlatformError::InvalidDefinition {
                message: format!("platform '{}' already registered", platform.name),
            }
            .into());
        }
        self.platforms.insert(platform.name.clone(), platform);
        Ok(())
    }

    /// Get a platform by name.
    pub fn get(&self, name: &str) -> Result<&PlatformDefinition> {
        self.platforms.get(name).ok_or_else(|| {
            PlatformError::UnknownPlatform {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// List all registered platform names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.platforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins() {
        let registry = PlatformRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["aruba_os", "cisco_ios", "linux"]);
        assert_eq!(registry.get("aruba_os").unwrap().name, "aruba_os");
    }

    #[test]
    fn test_unknown_platform() {
        let registry = PlatformRegistry::with_builtins();
        let err = registry.get("junos").unwrap_err();
        assert_eq!(err.to_string(), "Platform error: Unknown platform 'junos'");
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = PlatformRegistry::with_builtins();
        assert!(registry.register(vendors::linux::platform()).is_err());
    }
}
