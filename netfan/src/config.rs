//! Run configuration and credentials.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::{DispatchError, Result};
use crate::transport::AuthMethod;

/// Worker count used by most bulk scripts.
pub const DEFAULT_POOL_SIZE: usize = 100;

/// Worker count for operations that do heavier per-device work.
pub const HEAVY_POOL_SIZE: usize = 30;

/// Principal plus secret, shared read-only by preflight and every worker.
#[derive(Debug)]
pub struct Credentials {
    username: String,
    auth: AuthMethod,
}

impl Credentials {
    /// Password credentials.
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            auth: AuthMethod::Password(SecretString::from(password.into())),
        }
    }

    /// Private key credentials, with an optional passphrase.
    pub fn private_key(
        username: impl Into<String>,
        path: impl Into<PathBuf>,
        passphrase: Option<String>,
    ) -> Self {
        Self {
            username: username.into(),
            auth: AuthMethod::PrivateKey {
                path: path.into(),
                passphrase: passphrase.map(SecretString::from),
            },
        }
    }

    /// Login name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// How to authenticate.
    pub fn auth(&self) -> &AuthMethod {
        &self.auth
    }
}

/// Known-reachable endpoint used only for the credential preflight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    /// Hostname or address.
    pub host: String,
    /// SSH port.
    pub port: u16,
}

impl ProbeTarget {
    /// Probe target on port 22.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
        }
    }

    /// Override the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl Default for ProbeTarget {
    fn default() -> Self {
        Self::new("localhost")
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Settings for one dispatcher run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Number of concurrent workers.
    pub pool_size: usize,

    /// Upper bound on a single item's operation.
    pub operation_timeout: Duration,

    /// Upper bound on the credential preflight.
    pub preflight_timeout: Duration,

    /// Where the preflight connects.
    pub probe: ProbeTarget,

    /// Dispatch without checking credentials first.
    pub skip_preflight: bool,
}

impl RunConfig {
    /// Start building a configuration from defaults.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::new()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            operation_timeout: Duration::from_secs(60),
            preflight_timeout: Duration::from_secs(10),
            probe: ProbeTarget::default(),
            skip_preflight: false,
        }
    }
}

/// Builder for [`RunConfig`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use netfan::config::{ProbeTarget, RunConfig};
///
/// let config = RunConfig::builder()
///     .pool_size(30)
///     .operation_timeout(Duration::from_secs(90))
///     .probe(ProbeTarget::new("127.0.0.1"))
///     .build()
///     .unwrap();
/// assert_eq!(config.pool_size, 30);
/// ```
#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    /// Create a builder holding the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count.
    pub fn pool_size(mut self, size: usize) -> Self {
        self.config.pool_size = size;
        self
    }

    /// Set the per-item operation timeout.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.config.operation_timeout = timeout;
        self
    }

    /// Set the preflight timeout.
    pub fn preflight_timeout(mut self, timeout: Duration) -> Self {
        self.config.preflight_timeout = timeout;
        self
    }

    /// Set the preflight probe target.
    pub fn probe(mut self, probe: ProbeTarget) -> Self {
        self.config.probe = probe;
        self
    }

    /// Skip the credential preflight.
    pub fn skip_preflight(mut self, skip: bool) -> Self {
        self.config.skip_preflight = skip;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<RunConfig> {
        let config = self.config;
        if config.pool_size == 0 {
            return Err(invalid("pool size must be at least 1"));
        }
        if config.operation_timeout.is_zero() {
            return Err(invalid("operation timeout must be non-zero"));
        }
        if config.preflight_timeout.is_zero() {
            return Err(invalid("preflight timeout must be non-zero"));
        }
        Ok(config)
    }
}

fn invalid(message: &str) -> crate::error::Error {
    DispatchError::InvalidConfig {
        message: message.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::builder().build().unwrap();
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(config.probe.to_string(), "localhost:22");
        assert!(!config.skip_preflight);
    }

    #[test]
    fn test_zero_pool_rejected() {
        let err = RunConfig::builder().pool_size(0).build().unwrap_err();
        assert!(err.to_string().contains("pool size"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(
            RunConfig::builder()
                .operation_timeout(Duration::ZERO)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_credentials_hide_password() {
        let creds = Credentials::password("admin", "hunter2");
        assert_eq!(creds.username(), "admin");
        assert!(!format!("{creds:?}").contains("hunter2"));
        match creds.auth() {
            AuthMethod::Password(p) => assert_eq!(p.expose_secret(), "hunter2"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
