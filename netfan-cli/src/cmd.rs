//! CLI argument parsing.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use netfan::config::{DEFAULT_POOL_SIZE, HEAVY_POOL_SIZE};

/// Bulk SSH changes across network devices.
#[derive(Parser, Debug)]
#[command(name = "netfan", about = "Bulk SSH changes across network devices")]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Login name; prompted for when absent.
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Read the password from this environment variable instead of prompting.
    #[arg(long, global = true, value_name = "VAR")]
    pub password_env: Option<String>,

    /// Concurrent workers [default: 100, 30 for subnet-audit].
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    /// Per-device time limit in seconds, login included.
    #[arg(long, global = true, default_value_t = 60)]
    pub timeout: u64,

    /// Seconds allowed for the SSH login and for each command's prompt.
    #[arg(long, global = true, default_value_t = 20)]
    pub command_timeout: u64,

    /// Host used to check the credentials before the run.
    #[arg(long, global = true, default_value = "localhost")]
    pub probe: String,

    /// SSH port of the probe host.
    #[arg(long, global = true, default_value_t = 22)]
    pub probe_port: u16,

    /// Do not check the credentials first.
    #[arg(long, global = true)]
    pub skip_preflight: bool,

    /// Device platform.
    #[arg(long, global = true, default_value = "aruba_os")]
    pub platform: String,

    /// SSH port of the devices.
    #[arg(long, global = true, default_value_t = 22)]
    pub port: u16,

    /// Accept any host key.
    #[arg(long, global = true)]
    pub insecure: bool,
}

impl Cli {
    /// Worker count: `--workers`, else the subcommand's default.
    pub fn pool_size(&self) -> usize {
        self.workers.unwrap_or_else(|| self.command.default_pool_size())
    }
}

/// Inventory file shared by every subcommand.
#[derive(Args, Debug)]
pub struct InventoryArgs {
    /// CSV or YAML file listing the devices.
    #[arg(long)]
    pub inventory: PathBuf,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply each device's `conf` lines in configuration mode.
    Push {
        #[command(flatten)]
        inventory: InventoryArgs,
        /// One command per CSV row, grouped by hostname.
        #[arg(long)]
        grouped: bool,
        /// Do not save after pushing.
        #[arg(long)]
        no_save: bool,
    },
    /// Run exec-mode commands on every device.
    Exec {
        #[command(flatten)]
        inventory: InventoryArgs,
        /// Command to run; repeat for several.
        #[arg(long = "command", required = true)]
        commands: Vec<String>,
    },
    /// Save the running configuration on every device.
    WriteMem {
        #[command(flatten)]
        inventory: InventoryArgs,
    },
    /// Save and restart every device.
    Reload {
        #[command(flatten)]
        inventory: InventoryArgs,
        /// Do not save before reloading.
        #[arg(long)]
        no_save: bool,
    },
    /// Check that each controller has clients in its expected subnet.
    SubnetAudit {
        #[command(flatten)]
        inventory: InventoryArgs,
        /// ESSID whose users are listed.
        #[arg(long)]
        essid: String,
        /// Only consider user lines containing this text.
        #[arg(long, default_value = "10.")]
        filter: String,
        /// Prefix length for inventory networks given as a bare address.
        #[arg(long, default_value_t = 23)]
        prefix: u8,
    },
}

impl Command {
    /// Inventory file for this subcommand.
    pub fn inventory(&self) -> &Path {
        match self {
            Command::Push { inventory, .. }
            | Command::Exec { inventory, .. }
            | Command::WriteMem { inventory }
            | Command::Reload { inventory, .. }
            | Command::SubnetAudit { inventory, .. } => &inventory.inventory,
        }
    }

    /// Workers used when `--workers` is not given.
    pub fn default_pool_size(&self) -> usize {
        match self {
            Command::SubnetAudit { .. } => HEAVY_POOL_SIZE,
            _ => DEFAULT_POOL_SIZE,
        }
    }
}
