//! # netfan
//!
//! Bounded-concurrency task dispatcher for bulk network device work.
//!
//! netfan takes a list of devices, checks the credentials once against a
//! probe host, then fans an operation out over a fixed pool of async
//! workers. Per-device failures are collected, never fatal; the run ends
//! with a report listing every failed device and why.
//!
//! ## Features
//!
//! - Closable task queue with in-flight tracking, so "drained" really means done
//! - Per-item timeout and panic isolation
//! - Credential preflight that aborts before touching the fleet
//! - Cooperative cancellation with a report of never-started items
//! - Async SSH sessions via russh with prompt-driven reads
//! - Built-in ArubaOS, Cisco IOS and Linux platforms
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use netfan::config::{Credentials, RunConfig};
//! use netfan::inventory::{self, CsvLayout};
//! use netfan::ops::ConfigPush;
//! use netfan::platform::PlatformRegistry;
//! use netfan::preflight::SshProbe;
//! use netfan::session::SessionFactory;
//! use netfan::RunCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netfan::Error> {
//!     let creds = Arc::new(Credentials::password("admin", "secret"));
//!     let platform = PlatformRegistry::with_builtins().get("aruba_os")?.clone();
//!     let push = ConfigPush::new(SessionFactory::new(creds.clone(), platform));
//!
//!     let jobs = inventory::load_path("conf.csv", CsvLayout::Inline)?;
//!     let mut coordinator = RunCoordinator::new(RunConfig::default(), creds, SshProbe::new(), push);
//!     let report = coordinator.run(jobs).await?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod inventory;
pub mod ops;
pub mod platform;
pub mod preflight;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use config::{Credentials, ProbeTarget, RunConfig};
pub use coordinator::{FailureRecord, RunCoordinator, RunReport, RunState};
pub use dispatch::{Operation, WorkItem};
pub use error::{Error, OperationError, PreflightError, Result};
pub use inventory::DeviceJob;
pub use platform::PlatformDefinition;
pub use session::{DeviceSession, Response, SessionFactory};
