//! Per-host session construction from one shared template.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::DeviceSession;
use crate::config::Credentials;
use crate::platform::PlatformDefinition;
use crate::transport::{HostKeyVerification, SshConfig};

/// Everything a session needs except the host.
///
/// Cloned into each operation; every worker builds its own
/// [`DeviceSession`] from it, so no connection is ever shared.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    credentials: Arc<Credentials>,
    platform: PlatformDefinition,
    port: u16,
    timeout: Duration,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl SessionFactory {
    /// Template with port 22 and a 30 second timeout.
    pub fn new(credentials: Arc<Credentials>, platform: PlatformDefinition) -> Self {
        Self {
            credentials,
            platform,
            port: 22,
            timeout: Duration::from_secs(30),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// SSH port for every device.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Connect and per-command timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Host key checking mode.
    pub fn with_host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a specific known_hosts file.
    pub fn with_known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Platform the sessions will speak.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// SSH settings for `host`.
    pub fn ssh_config(&self, host: &str) -> SshConfig {
        let mut config = SshConfig::new(host, Arc::clone(&self.credentials));
        config.port = self.port;
        config.timeout = self.timeout;
        config.host_key_verification = self.host_key_verification.clone();
        config.known_hosts_path = self.known_hosts_path.clone();
        config
    }

    /// A closed session for `host`.
    pub fn session(&self, host: &str) -> DeviceSession {
        DeviceSession::new(self.ssh_config(host), self.platform.clone())
    }
}
