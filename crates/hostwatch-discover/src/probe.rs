//! Probe adapter: host-discovery primitives behind one trait.
//!
//! The reconciliation engine only ever talks to a [`ProbeAdapter`], so
//! the nmap/NetBIOS/ARP plumbing stays platform-specific here and the
//! engine itself can be exercised with a fake adapter in tests.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::config::{DiscoverConfig, ScanPhase};
use crate::error::Result;
use crate::scanner::NmapScanner;

/// One responsive address from the liveness sweep.
#[derive(Debug, Clone)]
pub struct LiveHost {
    pub ip: IpAddr,
    /// MAC as reported by the sweep (nmap only sees it on the local segment).
    pub mac: Option<String>,
}

/// Enrichment data from the detail probe for one host.
#[derive(Debug, Clone, Default)]
pub struct HostDetail {
    pub hostnames: Vec<String>,
    /// OS fingerprint candidates, best first.
    pub os_matches: Vec<String>,
    pub vendor: Option<String>,
}

/// Host-discovery primitives. All operations are best-effort and
/// time-bounded; per-host failure means absence, never an error.
pub trait ProbeAdapter {
    /// Fast, broad scan: every responsive address, in sweep order.
    /// Hard scanner failure is an error; an empty set is success.
    fn sweep_liveness(
        &self,
        target: &str,
    ) -> impl std::future::Future<Output = Result<Vec<LiveHost>>> + Send;

    /// Slow fingerprint scan over already-known-live hosts. Total
    /// failure degrades to an empty mapping.
    fn probe_details(
        &self,
        ips: &[IpAddr],
    ) -> impl std::future::Future<Output = HashMap<IpAddr, HostDetail>> + Send;

    /// ARP-cache MAC lookup, used when the sweep yielded no MAC.
    fn resolve_mac(&self, ip: IpAddr) -> impl std::future::Future<Output = Option<String>> + Send;

    /// NetBIOS name query, bounded by a short timeout.
    fn netbios_name(&self, ip: IpAddr)
        -> impl std::future::Future<Output = Option<String>> + Send;
}

/// Production adapter: nmap for the scans, `ip neigh` for the ARP
/// cache, `nmblookup` for NetBIOS names.
pub struct NmapProbe {
    scanner: NmapScanner,
    probe_timeout: Duration,
    netbios_enabled: bool,
}

impl NmapProbe {
    pub fn new(config: &DiscoverConfig) -> Self {
        Self {
            scanner: NmapScanner::new(&config.nmap_path),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
            netbios_enabled: config.netbios_enabled,
        }
    }

    /// Verify the nmap binary is runnable; returns its version banner.
    pub async fn verify(&self) -> Result<String> {
        self.scanner.verify_installation().await
    }

    /// Run an external command, bounded by the probe timeout.
    async fn run_bounded(&self, program: &str, args: &[String]) -> Option<String> {
        let output = timeout(self.probe_timeout, Command::new(program).args(args).output())
            .await
            .ok()?
            .ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl ProbeAdapter for NmapProbe {
    async fn sweep_liveness(&self, target: &str) -> Result<Vec<LiveHost>> {
        let run = self
            .scanner
            .scan(&[target.to_string()], &ScanPhase::Sweep)
            .await?;

        Ok(run
            .nmap_run
            .hosts
            .iter()
            .filter(|h| h.is_up())
            .filter_map(|h| {
                let ip = h.ipv4()?.parse().ok()?;
                Some(LiveHost {
                    ip,
                    mac: h.mac().map(|m| m.to_uppercase()),
                })
            })
            .collect())
    }

    async fn probe_details(&self, ips: &[IpAddr]) -> HashMap<IpAddr, HostDetail> {
        if ips.is_empty() {
            return HashMap::new();
        }

        let targets: Vec<String> = ips.iter().map(|ip| ip.to_string()).collect();
        let run = match self.scanner.scan(&targets, &ScanPhase::Detail).await {
            Ok(run) => run,
            Err(e) => {
                // The cycle continues on phase-1 data alone.
                tracing::warn!(error = %e, "Detail probe failed, continuing without enrichment");
                return HashMap::new();
            }
        };

        run.nmap_run
            .hosts
            .iter()
            .filter(|h| h.is_up())
            .filter_map(|h| {
                let ip: IpAddr = h.ipv4()?.parse().ok()?;
                Some((
                    ip,
                    HostDetail {
                        hostnames: h.hostnames().iter().map(|s| s.to_string()).collect(),
                        os_matches: h.os_matches().iter().map(|s| s.to_string()).collect(),
                        vendor: h.mac_vendor().map(String::from),
                    },
                ))
            })
            .collect()
    }

    async fn resolve_mac(&self, ip: IpAddr) -> Option<String> {
        let output = self
            .run_bounded("ip", &["neigh".to_string(), "show".to_string(), ip.to_string()])
            .await?;
        parse_neigh_output(&output)
    }

    async fn netbios_name(&self, ip: IpAddr) -> Option<String> {
        if !self.netbios_enabled {
            return None;
        }
        let output = self
            .run_bounded("nmblookup", &["-A".to_string(), ip.to_string()])
            .await?;
        parse_nmblookup_output(&output)
    }
}

/// Extract the `lladdr` MAC from `ip neigh show <ip>` output.
fn parse_neigh_output(output: &str) -> Option<String> {
    let mut tokens = output.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "lladdr" {
            return tokens.next().map(|mac| mac.to_uppercase());
        }
    }
    None
}

/// Extract the unique `<20>` workstation record from `nmblookup -A` output.
fn parse_nmblookup_output(output: &str) -> Option<String> {
    for line in output.lines() {
        if line.contains("<20>") && !line.contains("<GROUP>") {
            if let Some(name) = line.split_whitespace().next() {
                if !name.is_empty() {
                    return Some(name.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_neigh_output() {
        let output = "192.168.1.10 dev eth0 lladdr aa:bb:cc:dd:ee:ff REACHABLE\n";
        assert_eq!(
            parse_neigh_output(output),
            Some("AA:BB:CC:DD:EE:FF".to_string())
        );
    }

    #[test]
    fn test_parse_neigh_output_no_entry() {
        assert_eq!(parse_neigh_output(""), None);
        assert_eq!(parse_neigh_output("192.168.1.10 dev eth0 FAILED\n"), None);
    }

    #[test]
    fn test_parse_nmblookup_output() {
        let output = "Looking up status of 192.168.1.10\n\
                      \tDESK-07         <00> -         B <ACTIVE>\n\
                      \tDESK-07         <20> -         B <ACTIVE>\n\
                      \tWORKGROUP       <00> - <GROUP> B <ACTIVE>\n";
        assert_eq!(parse_nmblookup_output(output), Some("DESK-07".to_string()));
    }

    #[test]
    fn test_parse_nmblookup_skips_group_records() {
        let output = "\tWORKGROUP       <20> - <GROUP> B <ACTIVE>\n";
        assert_eq!(parse_nmblookup_output(output), None);
    }

    #[test]
    fn test_parse_nmblookup_no_records() {
        assert_eq!(parse_nmblookup_output("No reply from 192.168.1.10\n"), None);
    }
}
