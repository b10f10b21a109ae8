//! The reconciliation engine: two-phase scan, host-identity
//! resolution, and online/offline state transitions.
//!
//! A full cycle runs sweep → detail → classify → upsert → offline
//! sweep. A status cycle runs the sweep alone and only flips status
//! flags. Both buffer every decision and commit through one store
//! transaction, so a crashed or failed cycle never leaves a
//! half-updated inventory.

use std::collections::HashSet;
use std::net::IpAddr;

use chrono::Utc;
use hostwatch_core::types::{AssetType, FullCycleSummary, StatusCycleSummary, SENTINEL_MAC};
use hostwatch_store::StoreClient;

use crate::classify::{self, ClassifySignals};
use crate::error::Result;
use crate::persist;
use crate::probe::ProbeAdapter;

/// The engine's resolved view of one live host, ready to persist.
#[derive(Debug, Clone)]
pub struct HostObservation {
    pub ip: IpAddr,
    /// Resolved MAC, [`SENTINEL_MAC`] when every source came up empty.
    pub mac: String,
    /// Display name, already annotated with the OS guess.
    pub name: String,
    pub asset_type: AssetType,
}

/// Run one full discovery cycle against `target`.
///
/// A sweep that finds no hosts is a successful empty cycle, not an
/// error. Detail-probe failure degrades to phase-1 data. Store failure
/// aborts and rolls back the whole cycle.
pub async fn run_full_cycle<P: ProbeAdapter>(
    probe: &P,
    store: &StoreClient,
    target: &str,
) -> Result<FullCycleSummary> {
    let live = probe.sweep_liveness(target).await?;
    if live.is_empty() {
        tracing::info!(target, "No live hosts found, nothing to reconcile");
        return Ok(FullCycleSummary::default());
    }

    let ips: Vec<IpAddr> = live.iter().map(|h| h.ip).collect();
    let details = probe.probe_details(&ips).await;

    let now = Utc::now();
    let mut observations = Vec::with_capacity(live.len());

    // Process in sweep order so ids come out stable across runs.
    for host in &live {
        let mac = match &host.mac {
            Some(mac) => mac.clone(),
            None => probe
                .resolve_mac(host.ip)
                .await
                .unwrap_or_else(|| SENTINEL_MAC.to_string()),
        };
        let netbios = probe.netbios_name(host.ip).await;
        let detail = details.get(&host.ip);

        let os = classify::os_guess(detail);
        let base = classify::best_name(host.ip, netbios.as_deref(), detail);
        let asset_type = classify::asset_type(&ClassifySignals {
            os_guess: &os,
            vendor: detail.and_then(|d| d.vendor.as_deref()),
            hostname: detail.and_then(|d| d.hostnames.first().map(String::as_str)),
        });

        observations.push(HostObservation {
            ip: host.ip,
            mac,
            name: classify::display_name(&base, &os),
            asset_type,
        });
    }

    let summary = persist::apply_full_cycle(store, &observations, now)?;

    tracing::info!(
        target,
        found = summary.found,
        added = summary.added,
        updated = summary.updated,
        offline = summary.offline,
        "Full discovery cycle complete"
    );

    Ok(summary)
}

/// Run one lightweight status-only cycle against `target`.
///
/// Liveness sweep only: stored assets whose IP responded go Online,
/// the rest Offline. No classification, no inserts.
pub async fn run_status_cycle<P: ProbeAdapter>(
    probe: &P,
    store: &StoreClient,
    target: &str,
) -> Result<StatusCycleSummary> {
    let live = probe.sweep_liveness(target).await?;
    let live_ips: HashSet<String> = live.iter().map(|h| h.ip.to_string()).collect();

    let summary = persist::apply_status_cycle(store, &live_ips)?;

    tracing::info!(
        target,
        online = summary.online,
        offline = summary.offline,
        "Status cycle complete"
    );

    Ok(summary)
}
