//! Core domain types for the hostwatch asset inventory.
//!
//! These types mirror the rows of the SQLite inventory and are shared
//! between the discovery engine and the (out-of-process) API layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder stored when a host's MAC address could not be resolved.
///
/// The sentinel is excluded from identity matching: two assets may both
/// carry `"N/A"` without colliding onto the same record.
pub const SENTINEL_MAC: &str = "N/A";

/// Sentinel OS string when fingerprinting produced no match.
pub const OS_UNKNOWN: &str = "OS Unknown";

// ── Asset ─────────────────────────────────────────────────────────

/// A tracked network device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Row id, assigned at first insert and stable for the record's lifetime.
    pub id: i64,
    /// Display name, derived by the classifier and annotated with the OS guess.
    pub name: String,
    /// Current network address. Mutable: an asset may change IP.
    pub ip_address: String,
    /// Physical address, [`SENTINEL_MAC`] when unknown. Secondary identity key.
    pub mac_address: String,
    pub asset_type: AssetType,
    pub status: AssetStatus,
    /// Administrative free-text field. Never touched by discovery.
    pub condition: String,
    /// Set on first insert, never updated.
    pub first_seen: DateTime<Utc>,
    /// Refreshed on every full-cycle match.
    pub last_seen: DateTime<Utc>,
}

impl Asset {
    /// Whether this asset carries a usable (non-sentinel) MAC address.
    pub fn has_mac(&self) -> bool {
        self.mac_address != SENTINEL_MAC
    }
}

/// Online/offline state, flipped by the reconciliation engine every cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AssetStatus {
    Online,
    Offline,
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "Online",
            Self::Offline => "Offline",
        }
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Online" => Ok(Self::Online),
            "Offline" => Ok(Self::Offline),
            other => Err(format!("unknown asset status: {other}")),
        }
    }
}

/// Coarse device category, fixed enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AssetType {
    Computer,
    RouterFirewall,
    Printer,
    Server,
    Switch,
    Smartphone,
    Notebook,
    Network,
    Other,
}

impl AssetType {
    /// The stored/displayed form, matching what the dashboard renders.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Computer => "Computer",
            Self::RouterFirewall => "Router/Firewall",
            Self::Printer => "Printer",
            Self::Server => "Server",
            Self::Switch => "Switch",
            Self::Smartphone => "Smartphone",
            Self::Notebook => "Notebook",
            Self::Network => "Network",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Computer" => Ok(Self::Computer),
            "Router/Firewall" => Ok(Self::RouterFirewall),
            "Printer" => Ok(Self::Printer),
            "Server" => Ok(Self::Server),
            "Switch" => Ok(Self::Switch),
            "Smartphone" => Ok(Self::Smartphone),
            "Notebook" => Ok(Self::Notebook),
            "Network" => Ok(Self::Network),
            "Other" => Ok(Self::Other),
            other => Err(format!("unknown asset type: {other}")),
        }
    }
}

// ── Alerts ────────────────────────────────────────────────────────

/// An append-only lifecycle event record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub category: AlertCategory,
    pub message: String,
}

/// Alert categories written by the engine and the external CRUD surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AlertCategory {
    /// A known asset came back online (status cycle transition).
    Appeared,
    /// An online asset was absent from the latest liveness sweep.
    Disappeared,
    /// A brand-new asset was inserted by discovery.
    Added,
    /// An asset was deleted by the external CRUD layer.
    Removed,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Appeared => "Appeared",
            Self::Disappeared => "Disappeared",
            Self::Added => "Added",
            Self::Removed => "Removed",
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Appeared" => Ok(Self::Appeared),
            "Disappeared" => Ok(Self::Disappeared),
            "Added" => Ok(Self::Added),
            "Removed" => Ok(Self::Removed),
            other => Err(format!("unknown alert category: {other}")),
        }
    }
}

// ── Cycle summaries ───────────────────────────────────────────────

/// Outcome of one full discovery cycle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FullCycleSummary {
    /// Live hosts returned by the liveness sweep.
    pub found: u32,
    /// New asset records inserted.
    pub added: u32,
    /// Existing records refreshed.
    pub updated: u32,
    /// Online records flipped to offline by the bulk sweep.
    pub offline: u32,
}

/// Outcome of one lightweight status-only cycle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCycleSummary {
    /// Stored assets online after the cycle.
    pub online: u32,
    /// Stored assets offline after the cycle.
    pub offline: u32,
}
