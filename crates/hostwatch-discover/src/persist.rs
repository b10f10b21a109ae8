//! Store persistence: apply a cycle's buffered decisions in one
//! transaction.
//!
//! The engine resolves all probe data before calling in here, so the
//! store lock is only held for the write phase and either every
//! mutation of a cycle lands or none do.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use hostwatch_core::types::{
    AlertCategory, AssetStatus, FullCycleSummary, StatusCycleSummary,
};
use hostwatch_store::{AssetPatch, NewAsset, StoreClient};

use crate::error::Result;
use crate::reconcile::HostObservation;

/// Upsert every observed live host, run the offline sweep, and record
/// lifecycle alerts, atomically.
pub fn apply_full_cycle(
    store: &StoreClient,
    observations: &[HostObservation],
    now: DateTime<Utc>,
) -> Result<FullCycleSummary> {
    let live_ips: HashSet<String> = observations.iter().map(|o| o.ip.to_string()).collect();

    let summary = store.with_cycle(|cycle| {
        let mut added = 0u32;
        let mut updated = 0u32;

        for obs in observations {
            let ip = obs.ip.to_string();
            match cycle.find_by_ip_or_mac(&ip, &obs.mac)? {
                None => {
                    let id = cycle.insert_asset(&NewAsset {
                        name: obs.name.clone(),
                        ip_address: ip.clone(),
                        mac_address: obs.mac.clone(),
                        asset_type: obs.asset_type,
                        status: AssetStatus::Online,
                        seen_at: now,
                    })?;
                    cycle.insert_alert(
                        AlertCategory::Added,
                        &format!("New asset: {} ({ip})", obs.name),
                    )?;
                    tracing::debug!(id, ip = %ip, name = %obs.name, "Inserted new asset");
                    added += 1;
                }
                Some(existing) => {
                    // The id and first_seen stay untouched; the IP moves
                    // with the asset when the match came through the MAC.
                    cycle.update_asset_fields(
                        existing.id,
                        &AssetPatch {
                            name: Some(obs.name.clone()),
                            asset_type: Some(obs.asset_type),
                            ip_address: Some(ip.clone()),
                            status: Some(AssetStatus::Online),
                            last_seen: Some(now),
                        },
                    )?;
                    tracing::debug!(id = existing.id, ip = %ip, "Refreshed existing asset");
                    updated += 1;
                }
            }
        }

        let flipped = cycle.bulk_set_offline(&live_ips)?;
        for asset in &flipped {
            cycle.insert_alert(
                AlertCategory::Disappeared,
                &format!("Asset offline: {} ({})", asset.name, asset.ip_address),
            )?;
        }

        Ok(FullCycleSummary {
            found: observations.len() as u32,
            added,
            updated,
            offline: flipped.len() as u32,
        })
    })?;

    Ok(summary)
}

/// Flip statuses against the live set and record transition alerts,
/// atomically. No inserts, no classification.
pub fn apply_status_cycle(
    store: &StoreClient,
    live_ips: &HashSet<String>,
) -> Result<StatusCycleSummary> {
    let summary = store.with_cycle(|cycle| {
        for asset in cycle.list_assets()? {
            let is_live = live_ips.contains(&asset.ip_address);
            match (asset.status, is_live) {
                (AssetStatus::Offline, true) => {
                    cycle.set_status(asset.id, AssetStatus::Online)?;
                    cycle.insert_alert(
                        AlertCategory::Appeared,
                        &format!("Asset back online: {} ({})", asset.name, asset.ip_address),
                    )?;
                }
                (AssetStatus::Online, false) => {
                    cycle.set_status(asset.id, AssetStatus::Offline)?;
                    cycle.insert_alert(
                        AlertCategory::Disappeared,
                        &format!("Asset offline: {} ({})", asset.name, asset.ip_address),
                    )?;
                }
                _ => {}
            }
        }
        cycle.count_by_status()
    })?;

    Ok(summary)
}
