//! User subnet audit.
//!
//! After a VLAN/subnet change, each controller is asked which clients on an
//! ESSID it currently serves. A controller with at least one client address
//! inside the expected network is validated; the rest are listed for a
//! retry.

use std::fmt;
use std::net::Ipv4Addr;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use ipnetwork::Ipv4Network;
use log::{debug, info};
use regex::Regex;

use super::{connect, finish};
use crate::channel::Shell;
use crate::dispatch::Operation;
use crate::error::OperationError;
use crate::inventory::DeviceJob;
use crate::session::{DeviceSession, SessionFactory};

static DOTTED_QUAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]{1,3}(?:\.[0-9]{1,3}){3}\b").expect("static address pattern"));

/// Prefix applied when the inventory gives a bare address.
pub const DEFAULT_AUDIT_PREFIX: u8 = 23;

/// Result of auditing one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditVerdict {
    /// At least one client is in the expected network.
    Validated,
    /// No client is in the expected network yet.
    NeedsRetry {
        /// The network that was checked.
        expected: Ipv4Network,
    },
}

impl AuditVerdict {
    /// Classify `show user` output against `expected`.
    ///
    /// Only the first address on each line is considered; that column is the
    /// client IP.
    pub fn classify(output: &str, expected: Ipv4Network) -> Self {
        let hit = output
            .lines()
            .filter_map(|line| DOTTED_QUAD.find(line))
            .filter_map(|m| m.as_str().parse::<Ipv4Addr>().ok())
            .any(|addr| expected.contains(addr));

        if hit {
            Self::Validated
        } else {
            Self::NeedsRetry { expected }
        }
    }
}

/// Verdicts shared by all audit workers.
///
/// Clones share the same ledger.
#[derive(Debug, Clone, Default)]
pub struct AuditLedger {
    inner: Arc<Mutex<IndexMap<String, AuditVerdict>>>,
}

impl AuditLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<String, AuditVerdict>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store the verdict for `host`, replacing any earlier one.
    pub fn record(&self, host: impl Into<String>, verdict: AuditVerdict) {
        self.lock().insert(host.into(), verdict);
    }

    /// Verdict for `host`, if audited.
    pub fn verdict(&self, host: &str) -> Option<AuditVerdict> {
        self.lock().get(host).copied()
    }

    /// Number of audited hosts.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been audited.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Partition into validated and retry lists, sorted by host.
    ///
    /// `total` is the number of devices in the run, including those whose
    /// audit failed outright, so the percentages need not add up to 100.
    pub fn summary(&self, total: usize) -> AuditSummary {
        let mut validated = Vec::new();
        let mut retry = Vec::new();
        for (host, verdict) in self.lock().iter() {
            match verdict {
                AuditVerdict::Validated => validated.push(host.clone()),
                AuditVerdict::NeedsRetry { expected } => retry.push((host.clone(), *expected)),
            }
        }
        validated.sort_unstable();
        retry.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        AuditSummary {
            validated,
            retry,
            total,
        }
    }
}

/// Validated vs retry partition of an audit run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSummary {
    /// Hosts with a client in the expected network.
    pub validated: Vec<String>,
    /// Hosts without one, with the network that was checked.
    pub retry: Vec<(String, Ipv4Network)>,
    /// Devices in the run.
    pub total: usize,
}

impl AuditSummary {
    /// Share of devices validated, in percent.
    pub fn validated_pct(&self) -> f64 {
        percent(self.validated.len(), self.total)
    }

    /// Share of devices needing a retry, in percent.
    pub fn retry_pct(&self) -> f64 {
        percent(self.retry.len(), self.total)
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

impl fmt::Display for AuditSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "*** Sites with at least 1 device in subnet ***")?;
        for host in &self.validated {
            writeln!(f, "  {host}, Vlan active")?;
        }
        writeln!(f, "*** Sites to retry ***")?;
        for (host, network) in &self.retry {
            writeln!(f, "  {host}, {network}")?;
        }
        writeln!(
            f,
            "*** Valid locations {}/{} = {:.2}% ***",
            self.validated.len(),
            self.total,
            self.validated_pct()
        )?;
        write!(
            f,
            "*** Invalid locations {}/{} = {:.2}% ***",
            self.retry.len(),
            self.total,
            self.retry_pct()
        )
    }
}

/// Check each controller for clients in the job's expected network.
#[derive(Debug, Clone)]
pub struct SubnetAudit {
    factory: SessionFactory,
    essid: String,
    filter: String,
    prefix: u8,
    ledger: AuditLedger,
}

impl SubnetAudit {
    /// Audit clients of `essid`, recording verdicts in `ledger`.
    pub fn new(factory: SessionFactory, essid: impl Into<String>, ledger: AuditLedger) -> Self {
        Self {
            factory,
            essid: essid.into(),
            filter: "10.".to_string(),
            prefix: DEFAULT_AUDIT_PREFIX,
            ledger,
        }
    }

    /// Only consider `show user` lines containing `filter`.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Prefix length for inventory entries given as a bare address.
    pub fn with_prefix(mut self, prefix: u8) -> Self {
        self.prefix = prefix;
        self
    }

    /// The command sent to each controller.
    pub fn command(&self) -> String {
        format!("show user essid {} | include {}", self.essid, self.filter)
    }

    /// Network to check for `job`. A /32 entry is widened to the audit prefix.
    pub fn expected_network(&self, job: &DeviceJob) -> Result<Ipv4Network, OperationError> {
        let network = job
            .network
            .ok_or_else(|| OperationError::failed(format!("no expected network for {}", job.host)))?;
        if network.prefix() != 32 {
            return Ok(network);
        }
        Ipv4Network::new(network.ip(), self.prefix)
            .map_err(|e| OperationError::failed(format!("bad audit prefix /{}: {}", self.prefix, e)))
    }
}

impl Operation<DeviceJob> for SubnetAudit {
    async fn execute(&self, job: DeviceJob) -> Result<(), OperationError> {
        let expected = self.expected_network(&job)?;
        let command = self.command();
        let mut session = connect(&self.factory, &job.host).await?;
        let result = audit_one(&mut session, &command, expected).await;
        let verdict = finish(session, result).await?;

        debug!("{}: {:?}", job.host, verdict);
        if verdict == AuditVerdict::Validated {
            info!("{}: client found in {}", job.host, expected);
        }
        self.ledger.record(job.host, verdict);
        Ok(())
    }
}

/// Ask one controller for its users and classify the answer.
async fn audit_one<S: Shell>(
    session: &mut DeviceSession<S>,
    command: &str,
    expected: Ipv4Network,
) -> crate::Result<AuditVerdict> {
    let response = session.send_command(command).await?.into_result()?;
    Ok(AuditVerdict::classify(&response.result, expected))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::testing::{aruba, PROMPT};
    use super::*;
    use crate::channel::scripted::ScriptedShell;
    use crate::config::Credentials;
    use crate::platform::vendors::aruba_os;

    const SHOW_USER: &str = "\
10.20.0.15      aa:bb:cc:dd:ee:01  jdoe     guest   00:00:10  802.1x  ap-101  Wireless  corp/a/HT
10.20.1.200     aa:bb:cc:dd:ee:02  asmith   guest   00:12:44  802.1x  ap-102  Wireless  corp/a/HT";

    fn audit() -> SubnetAudit {
        let factory = SessionFactory::new(
            Arc::new(Credentials::password("admin", "pw")),
            aruba_os::platform(),
        );
        SubnetAudit::new(factory, "corp", AuditLedger::new())
    }

    fn job(network: Option<&str>) -> DeviceJob {
        DeviceJob {
            host: "md1".into(),
            commands: vec![],
            network: network.map(|n| n.parse().unwrap()),
        }
    }

    #[test]
    fn test_classify_validated() {
        let net: Ipv4Network = "10.20.0.0/23".parse().unwrap();
        assert_eq!(AuditVerdict::classify(SHOW_USER, net), AuditVerdict::Validated);
    }

    #[test]
    fn test_classify_needs_retry() {
        let net: Ipv4Network = "10.30.0.0/23".parse().unwrap();
        assert_eq!(
            AuditVerdict::classify(SHOW_USER, net),
            AuditVerdict::NeedsRetry { expected: net }
        );
        assert_eq!(
            AuditVerdict::classify("", net),
            AuditVerdict::NeedsRetry { expected: net }
        );
    }

    #[test]
    fn test_bare_address_widened() {
        let audit = audit();
        let net = audit.expected_network(&job(Some("10.20.1.1"))).unwrap();
        assert_eq!(net.prefix(), 23);
        assert!(net.contains("10.20.0.15".parse().unwrap()));

        let explicit = audit.expected_network(&job(Some("10.20.0.0/24"))).unwrap();
        assert_eq!(explicit.prefix(), 24);
    }

    #[test]
    fn test_missing_network_fails() {
        let err = audit().expected_network(&job(None)).unwrap_err();
        assert_eq!(err.to_string(), "no expected network for md1");
    }

    #[test]
    fn test_command() {
        assert_eq!(
            audit().with_filter("172.").command(),
            "show user essid corp | include 172."
        );
    }

    #[test]
    fn test_summary_partitions() {
        let ledger = AuditLedger::new();
        let net: Ipv4Network = "10.0.0.2/23".parse().unwrap();
        ledger.record("md2", AuditVerdict::NeedsRetry { expected: net });
        ledger.record("md1", AuditVerdict::Validated);
        ledger.record("md3", AuditVerdict::Validated);

        let summary = ledger.summary(4);
        assert_eq!(summary.validated, vec!["md1", "md3"]);
        assert_eq!(summary.retry, vec![("md2".to_string(), net)]);
        assert_eq!(summary.validated_pct(), 50.0);
        assert_eq!(summary.retry_pct(), 25.0);

        let text = summary.to_string();
        assert!(text.contains("md2, 10.0.0.2/23"));
        assert!(text.contains("Valid locations 2/4 = 50.00%"));
    }

    #[test]
    fn test_empty_summary() {
        let summary = AuditLedger::new().summary(0);
        assert_eq!(summary.validated_pct(), 0.0);
    }

    #[tokio::test]
    async fn test_audit_one_records_verdict() {
        let command = "show user essid corp | include 10.";
        let users = "10.20.1.17  00:11:22:33:44:55  jdoe  employee  00:05:12  802.1x  ap-12  Wireless  corp";
        let shell = ScriptedShell::new(PROMPT).reply(command, users);
        let mut session = aruba(shell);
        let expected: Ipv4Network = "10.20.0.0/23".parse().unwrap();

        let ledger = AuditLedger::new();
        let verdict = audit_one(&mut session, command, expected).await.unwrap();
        ledger.record("md1", verdict);
        assert_eq!(ledger.verdict("md1"), Some(AuditVerdict::Validated));

        ledger.record("md1", AuditVerdict::NeedsRetry { expected });
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.verdict("md1"), Some(AuditVerdict::NeedsRetry { expected }));
        assert_eq!(ledger.verdict("md9"), None);
    }

    #[tokio::test]
    async fn test_audit_one_rejected_command() {
        let command = "show user essid corp | include 10.";
        let shell = ScriptedShell::new(PROMPT).reply(command, "% Parse error");
        let mut session = aruba(shell);
        let expected: Ipv4Network = "10.20.0.0/23".parse().unwrap();

        assert!(audit_one(&mut session, command, expected).await.is_err());
    }
}
