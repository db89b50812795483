//! Save the configuration on a list of ArubaOS controllers.
//!
//! # Usage
//!
//! ```bash
//! NETFAN_PASSWORD=secret cargo run --example write_mem -- admin md1 md2 md3
//! ```
//!
//! Credentials are checked against localhost first; set `NETFAN_PROBE` to
//! use another host.

use std::env;
use std::sync::Arc;

use netfan::config::{Credentials, ProbeTarget, RunConfig};
use netfan::inventory::DeviceJob;
use netfan::ops::RunCommands;
use netfan::platform::vendors::aruba_os;
use netfan::preflight::SshProbe;
use netfan::session::SessionFactory;
use netfan::RunCoordinator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1);
    let user = args.next().ok_or("usage: write_mem <user> <host>...")?;
    let hosts: Vec<DeviceJob> = args.map(DeviceJob::new).collect();
    let password = env::var("NETFAN_PASSWORD")?;
    let probe = env::var("NETFAN_PROBE").unwrap_or_else(|_| "localhost".to_string());

    let creds = Arc::new(Credentials::password(user, password));
    let save = RunCommands::save(SessionFactory::new(creds.clone(), aruba_os::platform()));
    let config = RunConfig::builder().probe(ProbeTarget::new(probe)).build()?;

    let mut coordinator = RunCoordinator::new(config, creds, SshProbe::new(), save);
    let report = coordinator.run(hosts).await?;
    println!("{report}");

    Ok(())
}
