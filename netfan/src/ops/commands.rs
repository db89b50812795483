//! Run exec-mode commands on every device.

use log::{debug, info};

use super::{connect, finish};
use crate::channel::Shell;
use crate::dispatch::Operation;
use crate::error::{OperationError, Result};
use crate::inventory::DeviceJob;
use crate::session::{DeviceSession, SessionFactory};

/// Send a fixed list of commands, then the job's own commands.
///
/// Covers the one-liners run fleet-wide, such as `write memory` or
/// `stm purge-blacklist-clients`. The first rejected command fails the job.
#[derive(Debug, Clone)]
pub struct RunCommands {
    factory: SessionFactory,
    commands: Vec<String>,
}

impl RunCommands {
    /// Run `commands` on every device.
    pub fn new<S: Into<String>>(factory: SessionFactory, commands: impl IntoIterator<Item = S>) -> Self {
        Self {
            factory,
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    /// Save the configuration on every device.
    ///
    /// Devices whose platform has no save command run nothing.
    pub fn save(factory: SessionFactory) -> Self {
        let commands: Vec<String> = factory.platform().save_command.iter().cloned().collect();
        Self { factory, commands }
    }

    /// Commands sent before each job's own.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }
}

impl Operation<DeviceJob> for RunCommands {
    async fn execute(&self, job: DeviceJob) -> std::result::Result<(), OperationError> {
        let mut session = connect(&self.factory, &job.host).await?;
        let result = run_in_order(&mut session, &self.commands, &job.commands).await;

        let result = finish(session, result).await;
        if result.is_ok() {
            info!("{}: done", job.host);
        }
        result
    }
}

/// Send `fixed` then `own`, stopping at the first rejected command.
async fn run_in_order<S: Shell>(
    session: &mut DeviceSession<S>,
    fixed: &[String],
    own: &[String],
) -> Result<()> {
    for command in fixed.iter().chain(own) {
        let response = session.send_command(command).await?.into_result()?;
        debug!("{}: {}\n{}", session.host(), command, response);
    }
    Ok(())
}
