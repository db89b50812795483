//! Save and restart a controller.

use std::sync::LazyLock;

use log::{debug, info, warn};
use regex::Regex;

use super::{connect, finish};
use crate::channel::Shell;
use crate::dispatch::Operation;
use crate::error::{OperationError, Result};
use crate::inventory::DeviceJob;
use crate::session::{DeviceSession, InteractiveEvent, Response, SessionFactory};

/// Matches "Do you really want to restart the system(y/n):".
const CONFIRM_PROMPT: &str = r"\(y/n\)";

static CONFIRM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CONFIRM_PROMPT).expect("static confirm pattern"));

/// Save the configuration, send `reload` and confirm it.
///
/// The confirmation is sent without waiting for output: the device drops
/// the session as it restarts. A device that answers `reload` with its
/// normal prompt is not asked anything; an error message there fails the
/// job, anything else counts as done.
#[derive(Debug, Clone)]
pub struct Reload {
    factory: SessionFactory,
    save_first: bool,
}

impl Reload {
    /// Save, then reload.
    pub fn new(factory: SessionFactory) -> Self {
        Self {
            factory,
            save_first: true,
        }
    }

    /// Whether to save before reloading.
    pub fn with_save(mut self, save: bool) -> Self {
        self.save_first = save;
        self
    }
}

impl Operation<DeviceJob> for Reload {
    async fn execute(&self, job: DeviceJob) -> std::result::Result<(), OperationError> {
        let mut session = connect(&self.factory, &job.host).await?;
        let result = restart(&mut session, self.save_first).await;

        let result = finish(session, result).await;
        match result {
            Ok(true) => info!("{}: reload confirmed", job.host),
            Ok(false) => warn!("{}: reload returned to the prompt unconfirmed", job.host),
            Err(_) => {}
        }
        result.map(|_| ())
    }
}

/// Send `reload` and answer the confirmation if one is asked.
///
/// Returns whether `y` was sent.
async fn restart<S: Shell>(session: &mut DeviceSession<S>, save_first: bool) -> Result<bool> {
    if save_first {
        session.save_config().await?;
    }

    let pattern = format!("{CONFIRM_PROMPT}|(?:{})", session.platform().prompt.as_str());
    let reload = InteractiveEvent::new("reload", &pattern)?;
    let answer = session.send_interactive(&[reload]).await?;
    let output = answer.full_output();
    debug!("{}: {}", session.host(), output.trim());

    if CONFIRM.is_match(&output) {
        session.send_and_forget("y").await?;
        return Ok(true);
    }

    match session.platform().detect_failure(&output) {
        Some(marker) => Response::failed("reload", output.as_str(), "", answer.elapsed, marker)
            .into_result()
            .map(|_| false),
        None => Ok(false),
    }
}
