//! Platform definitions for multi-vendor support.
//!
//! A platform describes what a device's CLI looks like: its prompts, how to
//! enter and leave configuration mode, how to save, and which output
//! strings mean a command was rejected.

mod definition;
mod registry;
pub mod vendors;

pub use definition::PlatformDefinition;
pub use registry::PlatformRegistry;
