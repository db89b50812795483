//! Built-in vendor platforms.

pub mod aruba_os;
pub mod cisco_ios;
pub mod linux;
