//! Push configuration lines, then optionally save.

use log::info;

use super::{connect, finish};
use crate::channel::Shell;
use crate::dispatch::Operation;
use crate::error::{OperationError, Result};
use crate::inventory::DeviceJob;
use crate::session::{DeviceSession, SessionFactory};

/// Apply each job's commands in configuration mode.
///
/// A line the device rejects fails the job; lines after it are not sent.
#[derive(Debug, Clone)]
pub struct ConfigPush {
    factory: SessionFactory,
    save: bool,
}

impl ConfigPush {
    /// Push and save.
    pub fn new(factory: SessionFactory) -> Self {
        Self {
            factory,
            save: true,
        }
    }

    /// Whether to save the configuration after a successful push.
    pub fn with_save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }
}

impl Operation<DeviceJob> for ConfigPush {
    async fn execute(&self, job: DeviceJob) -> std::result::Result<(), OperationError> {
        let mut session = connect(&self.factory, &job.host).await?;
        let result = push(&mut session, &job.commands, self.save).await;

        let result = finish(session, result).await;
        if result.is_ok() {
            info!("{}: pushed {} lines", job.host, job.commands.len());
        }
        result
    }
}

/// Apply `lines`, then save if asked. A rejected line skips the save.
async fn push<S: Shell>(session: &mut DeviceSession<S>, lines: &[String], save: bool) -> Result<()> {
    if !lines.is_empty() {
        session.send_config_set(lines).await?;
    }
    if save {
        session.save_config().await?;
    }
    Ok(())
}
