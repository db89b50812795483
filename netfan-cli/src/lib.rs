//! netfan CLI: load an inventory, check credentials, run one operation
//! across every device and print the report.

pub use cmd::{Cli, Command, InventoryArgs};

pub mod cmd;
mod run;
