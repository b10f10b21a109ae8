//! Configuration for the hostwatch-discover daemon.

use ipnet::IpNet;
use serde::Deserialize;

use crate::error::{DiscoverError, Result};

/// Top-level discover configuration.
///
/// Loaded from `hostwatch.toml` `[discover]` section or
/// `HOSTWATCH_DISCOVER__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverConfig {
    /// Path to the nmap binary (default: "nmap").
    #[serde(default = "default_nmap_path")]
    pub nmap_path: String,

    /// Target network in CIDR notation.
    #[serde(default = "default_network")]
    pub network: String,

    /// Path to the SQLite inventory database.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Per-host timeout for best-effort probes (NetBIOS, ARP lookup).
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Interval between lightweight status-only cycles.
    #[serde(default = "default_status_interval")]
    pub status_interval_secs: u64,

    /// Interval between full discovery cycles.
    #[serde(default = "default_full_interval")]
    pub full_interval_secs: u64,

    /// Whether to attempt NetBIOS name lookups during full cycles.
    #[serde(default = "default_true")]
    pub netbios_enabled: bool,
}

/// The two nmap invocations of a discovery cycle.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanPhase {
    /// Ping sweep only: `-sn -T4`
    #[default]
    Sweep,
    /// Service version + OS fingerprint on known-live hosts: `-sV -O -T4`
    Detail,
}

impl ScanPhase {
    /// Return the nmap flags for this phase.
    pub fn nmap_flags(&self) -> Vec<&'static str> {
        match self {
            Self::Sweep => vec!["-sn", "-T4"],
            Self::Detail => vec!["-sV", "-O", "-T4"],
        }
    }
}

impl DiscoverConfig {
    /// Reject configurations whose target network is not a valid CIDR.
    pub fn validate(&self) -> Result<()> {
        self.network
            .parse::<IpNet>()
            .map_err(|e| DiscoverError::Config(format!("invalid network '{}': {e}", self.network)))?;
        Ok(())
    }
}

fn default_nmap_path() -> String {
    "nmap".to_string()
}

fn default_network() -> String {
    "192.168.1.0/24".to_string()
}

fn default_db_path() -> String {
    "hostwatch.db".to_string()
}

fn default_probe_timeout() -> u64 {
    1
}

fn default_status_interval() -> u64 {
    30
}

fn default_full_interval() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            nmap_path: default_nmap_path(),
            network: default_network(),
            db_path: default_db_path(),
            probe_timeout_secs: default_probe_timeout(),
            status_interval_secs: default_status_interval(),
            full_interval_secs: default_full_interval(),
            netbios_enabled: default_true(),
        }
    }
}
