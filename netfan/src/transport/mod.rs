//! SSH transport layer wrapping russh.
//!
//! Connection setup, authentication and shell channel creation. Everything
//! above this layer deals in prompts and commands, not SSH messages.

pub mod config;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::SshTransport;
