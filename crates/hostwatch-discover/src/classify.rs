//! Device classification: raw probe signals to display name and
//! coarse device category.
//!
//! Pure and deterministic, no I/O. Probe failures arrive here as
//! `None`/empty inputs and resolve to sentinels, never to errors.

use std::net::IpAddr;

use hostwatch_core::types::{AssetType, OS_UNKNOWN};

use crate::probe::HostDetail;

// Keyword tables, checked in fixed priority order: the first bucket
// with a match wins.
const COMPUTER_KEYWORDS: &[&str] = &["windows", "linux", "unix", "macos", "mac os"];
const ROUTER_KEYWORDS: &[&str] = &["router", "openwrt", "cisco", "mikrotik", "firewall", "fortinet"];
const PRINTER_KEYWORDS: &[&str] = &["printer", "jetdirect", "canon", "epson", "brother", "lexmark"];
const SERVER_KEYWORDS: &[&str] = &["server", "esxi", "hyper-v", "proxmox"];
const SWITCH_KEYWORDS: &[&str] = &["switch", "network"];
const SMARTPHONE_KEYWORDS: &[&str] = &["android", "iphone", "ios", "smartphone"];
const NOTEBOOK_KEYWORDS: &[&str] = &["notebook", "laptop"];

/// Raw text signals feeding classification.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifySignals<'a> {
    pub os_guess: &'a str,
    pub vendor: Option<&'a str>,
    pub hostname: Option<&'a str>,
}

/// Best display name: NetBIOS > scan-reported hostname (excluding the
/// literal "localhost") > synthesized `Device-<last octet>`.
pub fn best_name(ip: IpAddr, netbios: Option<&str>, detail: Option<&HostDetail>) -> String {
    if let Some(name) = netbios.filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    if let Some(detail) = detail {
        for name in &detail.hostnames {
            if !name.is_empty() && name != "localhost" {
                return name.clone();
            }
        }
    }

    format!("Device-{}", last_octet(ip))
}

/// First OS fingerprint candidate, else the `"OS Unknown"` sentinel.
pub fn os_guess(detail: Option<&HostDetail>) -> String {
    detail
        .and_then(|d| d.os_matches.first())
        .cloned()
        .unwrap_or_else(|| OS_UNKNOWN.to_string())
}

/// Keyword-based category over the combined os/vendor/hostname text.
pub fn asset_type(signals: &ClassifySignals<'_>) -> AssetType {
    let mut text = signals.os_guess.to_lowercase();
    if let Some(vendor) = signals.vendor {
        text.push(' ');
        text.push_str(&vendor.to_lowercase());
    }
    if let Some(hostname) = signals.hostname {
        text.push(' ');
        text.push_str(&hostname.to_lowercase());
    }

    let buckets: &[(&[&str], AssetType)] = &[
        (COMPUTER_KEYWORDS, AssetType::Computer),
        (ROUTER_KEYWORDS, AssetType::RouterFirewall),
        (PRINTER_KEYWORDS, AssetType::Printer),
        (SERVER_KEYWORDS, AssetType::Server),
        (SWITCH_KEYWORDS, AssetType::Switch),
        (SMARTPHONE_KEYWORDS, AssetType::Smartphone),
        (NOTEBOOK_KEYWORDS, AssetType::Notebook),
    ];

    for (keywords, ty) in buckets {
        if keywords.iter().any(|kw| text.contains(kw)) {
            return *ty;
        }
    }

    AssetType::Other
}

/// Stored display name: base name annotated with the OS guess.
pub fn display_name(base: &str, os_guess: &str) -> String {
    format!("{base} ({os_guess})")
}

fn last_octet(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => v4.octets()[3].to_string(),
        IpAddr::V6(v6) => format!("{:x}", v6.segments()[7]),
    }
}
