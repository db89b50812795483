//! Turn parsed arguments into a coordinator run.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use log::warn;
use netfan::config::{Credentials, ProbeTarget, RunConfig};
use netfan::inventory::{self, CsvLayout, DeviceJob};
use netfan::ops::{AuditLedger, ConfigPush, Reload, RunCommands, SubnetAudit};
use netfan::platform::PlatformRegistry;
use netfan::preflight::SshProbe;
use netfan::session::SessionFactory;
use netfan::transport::HostKeyVerification;
use netfan::{Operation, RunCoordinator, RunReport};
use tokio_util::sync::CancellationToken;

use crate::cmd::{Cli, Command};

impl Cli {
    /// Run the selected subcommand and print the report.
    ///
    /// Exits non-zero when any device failed.
    pub async fn run(self) -> Result<ExitCode> {
        let credentials = Arc::new(self.credentials()?);
        let platform = PlatformRegistry::with_builtins().get(&self.platform)?.clone();
        let timeout = Duration::from_secs(self.timeout);
        let command_timeout = Duration::from_secs(self.command_timeout);
        if command_timeout >= timeout {
            warn!(
                "--command-timeout {}s is not below --timeout {}s; a slow login can use up the device's budget",
                self.command_timeout, self.timeout
            );
        }

        // Devices may add their key to known_hosts. The probe only checks.
        let (device_keys, probe_keys) = if self.insecure {
            (HostKeyVerification::Disabled, HostKeyVerification::Disabled)
        } else {
            (HostKeyVerification::AcceptNew, HostKeyVerification::Strict)
        };

        let factory = SessionFactory::new(credentials.clone(), platform)
            .with_port(self.port)
            .with_timeout(command_timeout)
            .with_host_key_verification(device_keys);
        let config = RunConfig::builder()
            .pool_size(self.pool_size())
            .operation_timeout(timeout)
            .probe(ProbeTarget::new(self.probe.clone()).with_port(self.probe_port))
            .skip_preflight(self.skip_preflight)
            .build()?;
        let run = Run {
            config,
            credentials,
            probe: SshProbe::new()
                .with_timeout(command_timeout)
                .with_host_key_verification(probe_keys),
            shutdown: ctrl_c_token(),
        };

        let layout = match self.command {
            Command::Push { grouped: true, .. } => CsvLayout::Grouped,
            _ => CsvLayout::Inline,
        };
        let path = self.command.inventory();
        let jobs = inventory::load_path(path, layout)
            .with_context(|| format!("loading inventory {}", path.display()))?;
        let total = jobs.len();

        let report = match self.command {
            Command::Push { no_save, .. } => {
                run.dispatch(ConfigPush::new(factory).with_save(!no_save), jobs)
                    .await?
            }
            Command::Exec { commands, .. } => run.dispatch(RunCommands::new(factory, commands), jobs).await?,
            Command::WriteMem { .. } => run.dispatch(RunCommands::save(factory), jobs).await?,
            Command::Reload { no_save, .. } => {
                run.dispatch(Reload::new(factory).with_save(!no_save), jobs).await?
            }
            Command::SubnetAudit {
                essid,
                filter,
                prefix,
                ..
            } => {
                let ledger = AuditLedger::new();
                let audit = SubnetAudit::new(factory, essid, ledger.clone())
                    .with_filter(filter)
                    .with_prefix(prefix);
                let report = run.dispatch(audit, jobs).await?;
                println!("{}", ledger.summary(total));
                report
            }
        };

        println!("{report}");
        Ok(if report.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }

    fn credentials(&self) -> Result<Credentials> {
        let user = match &self.user {
            Some(user) => user.clone(),
            None => Input::<String>::new().with_prompt("Username").interact_text()?,
        };
        let password = match &self.password_env {
            Some(var) => std::env::var(var).with_context(|| format!("{var} is not set"))?,
            None => Password::new().with_prompt("Password").interact()?,
        };
        Ok(Credentials::password(user, password))
    }
}

struct Run {
    config: RunConfig,
    credentials: Arc<Credentials>,
    probe: SshProbe,
    shutdown: CancellationToken,
}

impl Run {
    async fn dispatch<O: Operation<DeviceJob>>(self, operation: O, jobs: Vec<DeviceJob>) -> Result<RunReport> {
        let mut coordinator = RunCoordinator::new(self.config, self.credentials, self.probe, operation)
            .with_shutdown(self.shutdown);
        Ok(coordinator.run(jobs).await?)
    }
}

/// Token cancelled on the first Ctrl-C.
fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, finishing in-flight devices");
            trigger.cancel();
        }
    });
    token
}
