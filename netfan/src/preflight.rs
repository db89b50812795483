//! Credential preflight.
//!
//! Before any device is touched the credentials are tried once against a
//! host known to be reachable. A bad password then costs one failed login
//! instead of one per device in the inventory.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::config::{Credentials, ProbeTarget};
use crate::error::{Error, PreflightError, TransportError};
use crate::transport::{HostKeyVerification, SshConfig, SshTransport};

/// Gate that must pass before a run dispatches anything.
pub trait Preflight: Send + Sync {
    /// Check `credentials` against `probe`. Must not mutate shared state.
    fn validate(
        &self,
        credentials: &Arc<Credentials>,
        probe: &ProbeTarget,
    ) -> impl Future<Output = Result<(), PreflightError>> + Send;
}

/// Log in over SSH and disconnect straight away.
///
/// Host keys are checked strictly by default: the probe never writes to
/// known_hosts.
#[derive(Debug, Clone)]
pub struct SshProbe {
    timeout: Duration,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl SshProbe {
    /// Probe with a 10 second connect bound.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            host_key_verification: HostKeyVerification::Strict,
            known_hosts_path: None,
        }
    }

    /// Connect and authentication bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Host key checking for the probe host.
    pub fn with_host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a specific known_hosts file.
    pub fn with_known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }
}

impl Default for SshProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Preflight for SshProbe {
    async fn validate(
        &self,
        credentials: &Arc<Credentials>,
        probe: &ProbeTarget,
    ) -> Result<(), PreflightError> {
        let mut config = SshConfig::new(probe.host.clone(), Arc::clone(credentials));
        config.port = probe.port;
        config.timeout = self.timeout;
        config.host_key_verification = self.host_key_verification.clone();
        config.known_hosts_path = self.known_hosts_path.clone();

        debug!("preflight: logging in to {} as {}", probe, credentials.username());
        let transport = SshTransport::connect(&config).await.map_err(classify)?;

        if let Err(e) = transport.close().await {
            debug!("preflight: disconnect from {}: {}", probe, e);
        }
        info!("preflight: credentials accepted by {}", probe);
        Ok(())
    }
}

fn classify(err: Error) -> PreflightError {
    match err {
        Error::Transport(TransportError::AuthenticationFailed { user }) => {
            PreflightError::Auth { user }
        }
        Error::Transport(TransportError::Timeout(d)) => PreflightError::Timeout(d),
        other => PreflightError::Transport(other.to_string()),
    }
}

/// Accepts any credentials. For runs whose operations do their own login
/// checks, or when the operator asked to skip the probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPreflight;

impl Preflight for NoPreflight {
    async fn validate(
        &self,
        _credentials: &Arc<Credentials>,
        _probe: &ProbeTarget,
    ) -> Result<(), PreflightError> {
        Ok(())
    }
}
