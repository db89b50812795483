//! The per-item seam between the dispatcher and device protocols.

use std::future::Future;

use crate::error::OperationError;

/// One unit of remote work.
///
/// The dispatcher never inspects an item beyond its [`target`](Self::target),
/// which identifies it in logs and in the failure report.
pub trait WorkItem: Send + 'static {
    /// Identity of the remote target (hostname or address).
    fn target(&self) -> &str;
}

impl WorkItem for String {
    fn target(&self) -> &str {
        self
    }
}

impl WorkItem for &'static str {
    fn target(&self) -> &str {
        self
    }
}

/// A remote action applied to each work item.
///
/// Implementations talk to the device (SSH session, API call, probe) and
/// report success or a typed [`OperationError`]. Errors are recorded by the
/// worker and never stop the run.
///
/// Any `Fn(T) -> impl Future<Output = Result<(), OperationError>>` closure is
/// an operation:
///
/// ```rust
/// use netfan::dispatch::Operation;
/// use netfan::error::OperationError;
///
/// fn assert_operation<O: Operation<String>>(_: O) {}
///
/// assert_operation(|host: String| async move {
///     if host == "b" {
///         Err(OperationError::failed("config rejected"))
///     } else {
///         Ok(())
///     }
/// });
/// ```
pub trait Operation<T>: Send + Sync + 'static {
    /// Perform the action for one item.
    fn execute(&self, item: T) -> impl Future<Output = Result<(), OperationError>> + Send;
}

impl<T, F, Fut> Operation<T> for F
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), OperationError>> + Send,
{
    fn execute(&self, item: T) -> impl Future<Output = Result<(), OperationError>> + Send {
        self(item)
    }
}
