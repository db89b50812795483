//! Channel layer: shell I/O and prompt detection.

mod buffer;
#[cfg(test)]
pub(crate) mod scripted;
mod shell;

pub use buffer::PatternBuffer;
pub use shell::{Shell, ShellChannel};
