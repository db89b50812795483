//! Inventory loading: turn CSV or YAML files into [`DeviceJob`]s.
//!
//! CSV files are header based. `hostname` is required, `conf` and
//! `network` are optional:
//!
//! ```text
//! hostname,conf
//! aruba-md1,ip dhcp pool guest=no ip dhcp pool guest
//! aruba-md2,aaa authentication-server radius rad1
//! ```
//!
//! YAML files are a list of jobs:
//!
//! ```yaml
//! - host: aruba-md1
//!   commands: ["ip name-server 10.0.0.53"]
//!   network: 10.20.0.0/23
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use ipnetwork::Ipv4Network;
use log::debug;
use serde::Deserialize;

use crate::dispatch::WorkItem;
use crate::error::{InventoryError, Result};

/// One device and what to do on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceJob {
    /// Hostname or address.
    pub host: String,
    /// Commands for this device, in order.
    pub commands: Vec<String>,
    /// Network the device's clients are expected in, for audits.
    pub network: Option<Ipv4Network>,
}

impl DeviceJob {
    /// A job with no commands.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            commands: Vec::new(),
            network: None,
        }
    }

    /// Append commands.
    pub fn with_commands<S: Into<String>>(mut self, commands: impl IntoIterator<Item = S>) -> Self {
        self.commands.extend(commands.into_iter().map(Into::into));
        self
    }
}

impl WorkItem for DeviceJob {
    fn target(&self) -> &str {
        &self.host
    }
}

/// How the `conf` column of a CSV file is laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CsvLayout {
    /// One row per host; `conf` holds every command separated by `=`.
    #[default]
    Inline,
    /// One row per command; rows for a host are grouped in first-seen order.
    Grouped,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default, alias = "host")]
    hostname: Option<String>,
    #[serde(default)]
    conf: Option<String>,
    #[serde(default)]
    network: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YamlJob {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    commands: Vec<String>,
    #[serde(default)]
    network: Option<String>,
}

/// Parse a CSV inventory.
pub fn load_csv<R: Read>(reader: R, layout: CsvLayout) -> Result<Vec<DeviceJob>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut inline = Vec::new();
    let mut grouped: IndexMap<String, DeviceJob> = IndexMap::new();

    for (index, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(InventoryError::from)?;
        // Line 1 is the header.
        let line = index + 2;
        let host = required_host(row.hostname, line)?;
        let network = parse_network(&host, row.network.as_deref())?;

        match layout {
            CsvLayout::Inline => inline.push(DeviceJob {
                commands: row.conf.as_deref().map(split_inline).unwrap_or_default(),
                host,
                network,
            }),
            CsvLayout::Grouped => {
                let job = grouped
                    .entry(host.clone())
                    .or_insert_with(|| DeviceJob::new(host));
                job.commands.extend(row.conf);
                job.network = job.network.or(network);
            }
        }
    }

    let jobs = match layout {
        CsvLayout::Inline => inline,
        CsvLayout::Grouped => grouped.into_values().collect(),
    };
    debug!("loaded {} jobs from CSV ({:?})", jobs.len(), layout);
    Ok(jobs)
}

/// Parse a YAML inventory.
pub fn load_yaml<R: Read>(reader: R) -> Result<Vec<DeviceJob>> {
    let entries: Vec<YamlJob> = serde_yaml::from_reader(reader).map_err(InventoryError::from)?;

    let jobs = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let host = required_host(entry.host, index + 1)?;
            let network = parse_network(&host, entry.network.as_deref())?;
            Ok(DeviceJob {
                host,
                commands: entry.commands,
                network,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("loaded {} jobs from YAML", jobs.len());
    Ok(jobs)
}

/// Load a file, picking the parser from its extension.
pub fn load_path(path: impl AsRef<Path>, layout: CsvLayout) -> Result<Vec<DeviceJob>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => load_csv(open(path)?, layout),
        "yaml" | "yml" => load_yaml(open(path)?),
        _ => Err(InventoryError::UnsupportedFormat(path.display().to_string()).into()),
    }
}

fn open(path: &Path) -> Result<File> {
    Ok(File::open(path).map_err(InventoryError::from)?)
}

fn required_host(host: Option<String>, line: usize) -> Result<String> {
    match host {
        Some(h) if !h.trim().is_empty() => Ok(h.trim().to_string()),
        _ => Err(InventoryError::MissingHost { line }.into()),
    }
}

fn parse_network(host: &str, value: Option<&str>) -> Result<Option<Ipv4Network>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|_| {
            InventoryError::InvalidNetwork {
                host: host.to_string(),
                value: v.to_string(),
            }
            .into()
        }),
    }
}

fn split_inline(conf: &str) -> Vec<String> {
    conf.split('=')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
