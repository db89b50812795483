//! Device sessions: one SSH shell per device, driven by prompts.
//!
//! A [`DeviceSession`] connects, waits for the first prompt, runs the
//! platform's on-open commands (paging off) and then sends commands one at a
//! time, reading each response up to the next prompt.

mod factory;
mod interactive;
mod response;

use std::time::{Duration, Instant};

use log::{debug, trace, warn};

pub use factory::SessionFactory;
pub use interactive::{InteractiveEvent, InteractiveResult, InteractiveStep};
pub use response::Response;

use crate::channel::{Shell, ShellChannel};
use crate::error::{PlatformError, Result, SessionError};
use crate::platform::PlatformDefinition;
use crate::transport::{SshConfig, SshTransport};

/// Default bytes from the end of the output searched for a prompt.
pub const DEFAULT_SEARCH_DEPTH: usize = 1000;

/// An interactive CLI session with one device.
///
/// Generic over the [`Shell`] it drives; real sessions use the SSH
/// [`ShellChannel`].
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use netfan::config::Credentials;
/// use netfan::platform::vendors::aruba_os;
/// use netfan::session::DeviceSession;
/// use netfan::transport::SshConfig;
///
/// # async fn example() -> netfan::Result<()> {
/// let creds = Arc::new(Credentials::password("admin", "secret"));
/// let mut session = DeviceSession::new(SshConfig::new("aruba-md1", creds), aruba_os::platform());
/// session.open().await?;
/// let response = session.send_command("show switches").await?;
/// println!("{}", response.result);
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct DeviceSession<S = ShellChannel> {
    ssh_config: SshConfig,
    platform: PlatformDefinition,
    transport: Option<SshTransport>,
    channel: Option<S>,
    command_timeout: Duration,
    search_depth: usize,
}

impl DeviceSession {
    /// Create a closed session. Terminal size comes from the platform.
    pub fn new(mut ssh_config: SshConfig, platform: PlatformDefinition) -> Self {
        ssh_config.terminal_width = platform.terminal_width;
        ssh_config.terminal_height = platform.terminal_height;
        let command_timeout = ssh_config.timeout;
        Self {
            ssh_config,
            platform,
            transport: None,
            channel: None,
            command_timeout,
            search_depth: DEFAULT_SEARCH_DEPTH,
        }
    }

    /// Override the prompt search depth.
    pub fn with_search_depth(mut self, depth: usize) -> Self {
        self.search_depth = depth;
        self
    }

    /// Connect, authenticate, wait for the first prompt and run on-open commands.
    pub async fn open(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Err(SessionError::AlreadyOpen.into());
        }

        let transport = SshTransport::connect(&self.ssh_config).await?;
        let mut channel = ShellChannel::new(transport.open_shell().await?, self.search_depth);

        let banner = channel
            .read_until(&self.platform.prompt, self.command_timeout)
            .await?;
        trace!("{}: banner {} bytes", self.host(), banner.len());

        self.transport = Some(transport);
        self.channel = Some(channel);

        for command in self.platform.on_open_commands.clone() {
            self.send_command(&command).await?;
        }

        debug!("{}: session open ({})", self.host(), self.platform.name);
        Ok(())
    }
}

impl<S: Shell> DeviceSession<S> {
    /// A session already sitting at a prompt on `shell`.
    #[cfg(test)]
    pub(crate) fn with_shell(ssh_config: SshConfig, platform: PlatformDefinition, shell: S) -> Self {
        let command_timeout = ssh_config.timeout;
        Self {
            ssh_config,
            platform,
            transport: None,
            channel: Some(shell),
            command_timeout,
            search_depth: DEFAULT_SEARCH_DEPTH,
        }
    }

    /// Override how long a command may take to return a prompt.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Target host.
    pub fn host(&self) -> &str {
        &self.ssh_config.host
    }

    /// Platform this session speaks.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Whether the session has a live shell.
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Send one command and read its output up to the next prompt.
    ///
    /// A response containing one of the platform's failure markers comes
    /// back as a failed [`Response`], not an error. Use
    /// [`Response::into_result`] to turn it into one.
    pub async fn send_command(&mut self, command: &str) -> Result<Response> {
        let channel = self.channel.as_mut().ok_or(SessionError::NotOpen)?;
        let start = Instant::now();

        channel.send_line(command).await?;
        let data = channel
            .read_until(&self.platform.prompt, self.command_timeout)
            .await?;

        let elapsed = start.elapsed();
        let raw = String::from_utf8_lossy(&data);
        let prompt = raw.rsplit('\n').next().unwrap_or_default().trim().to_string();
        let result = self.platform.normalize_output(&raw, command);

        trace!("{}: '{}' took {:?}", self.ssh_config.host, command, elapsed);

        match self.platform.detect_failure(&result) {
            Some(marker) => {
                let marker = marker.to_string();
                Ok(Response::failed(command, result, prompt, elapsed, marker))
            }
            None => Ok(Response::new(command, result, prompt, elapsed)),
        }
    }

    /// Enter configuration mode, apply `lines`, and leave again.
    ///
    /// Stops at the first rejected line and returns
    /// [`SessionError::CommandFailed`] for it. Configuration mode is left
    /// either way.
    pub async fn send_config_set<L: AsRef<str>>(&mut self, lines: &[L]) -> Result<Vec<Response>> {
        if let Some(enter) = self.platform.config_enter.clone() {
            self.send_command(&enter).await?.into_result()?;
        }

        let mut responses = Vec::with_capacity(lines.len());
        let mut rejected = None;
        for line in lines {
            let response = self.send_command(line.as_ref()).await?;
            if !response.is_success() {
                rejected = Some(response);
                break;
            }
            responses.push(response);
        }

        if let Some(exit) = self.platform.config_exit.clone() {
            self.send_command(&exit).await?;
        }

        match rejected {
            Some(response) => {
                warn!("{}: '{}' rejected", self.ssh_config.host, response.command);
                response.into_result().map(|_| responses)
            }
            None => Ok(responses),
        }
    }

    /// Persist the running configuration with the platform's save command.
    pub async fn save_config(&mut self) -> Result<Response> {
        let command = self.platform.save_command.clone().ok_or_else(|| {
            PlatformError::InvalidDefinition {
                message: format!("{} has no save command", self.platform.name),
            }
        })?;
        self.send_command(&command).await?.into_result()
    }

    /// Walk an interactive sequence, waiting for each event's pattern.
    pub async fn send_interactive(&mut self, events: &[InteractiveEvent]) -> Result<InteractiveResult> {
        let channel = self.channel.as_mut().ok_or(SessionError::NotOpen)?;
        let start = Instant::now();
        let mut result = InteractiveResult::default();

        for event in events {
            let step_start = Instant::now();
            debug!("{}: interactive input '{}'", self.ssh_config.host, event.loggable_input());

            channel.send_line(&event.input).await?;
            let data = channel
                .read_until(&event.pattern, event.timeout.unwrap_or(self.command_timeout))
                .await?;

            result.steps.push(InteractiveStep {
                input: event.loggable_input().to_string(),
                output: String::from_utf8_lossy(&data).into_owned(),
                elapsed: step_start.elapsed(),
            });
        }

        result.elapsed = start.elapsed();
        Ok(result)
    }

    /// Write a line without waiting for any answer.
    ///
    /// For inputs after which the device goes away, such as confirming a
    /// reload.
    pub async fn send_and_forget(&mut self, line: &str) -> Result<()> {
        let channel = self.channel.as_mut().ok_or(SessionError::NotOpen)?;
        channel.send_line(line).await
    }

    /// Close the shell and disconnect. Closing a closed session is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(channel) = self.channel.take() {
            if let Err(e) = channel.close().await {
                debug!("{}: channel close: {}", self.ssh_config.host, e);
            }
        }
        if let Some(transport) = self.transport.take() {
            transport.close().await?;
        }
        Ok(())
    }
}
