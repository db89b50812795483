//! Ready-made per-device operations.
//!
//! Each operation opens its own [`DeviceSession`] for the job's host,
//! does its work and closes the session again, whatever the outcome.
//! Device-layer errors are classified into [`OperationError`] so the
//! report says whether a host refused the login, timed out or rejected a
//! command.

mod audit;
mod commands;
mod push;
mod reload;

use log::debug;

pub use audit::{AuditLedger, AuditSummary, AuditVerdict, SubnetAudit};
pub use commands::RunCommands;
pub use push::ConfigPush;
pub use reload::Reload;

use crate::error::{OperationError, Result};
use crate::session::{DeviceSession, SessionFactory};

/// Open a session to `host`.
async fn connect(factory: &SessionFactory, host: &str) -> std::result::Result<DeviceSession, OperationError> {
    let mut session = factory.session(host);
    session
        .open()
        .await
        .map_err(|e| OperationError::from_device(host, e))?;
    Ok(session)
}

/// Close `session` and classify the work's result.
///
/// Close errors are only logged; the device may already have hung up.
async fn finish<T>(mut session: DeviceSession, result: Result<T>) -> std::result::Result<T, OperationError> {
    if let Err(e) = session.close().await {
        debug!("{}: close: {}", session.host(), e);
    }
    result.map_err(|e| OperationError::from_device(session.host(), e))
}
