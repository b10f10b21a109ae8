//! Write paths: inserts, field updates, the bulk offline sweep, alerts.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use hostwatch_core::types::{Alert, AlertCategory, Asset, AssetStatus, AssetType};
use rusqlite::params;

use crate::client::{CycleTxn, StoreClient, StoreError};

/// Default administrative condition for discovery-created records.
const DEFAULT_CONDITION: &str = "Monitored";

/// A record to insert, before an id exists.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub name: String,
    pub ip_address: String,
    pub mac_address: String,
    pub asset_type: AssetType,
    pub status: AssetStatus,
    /// Becomes both `first_seen` and `last_seen`.
    pub seen_at: DateTime<Utc>,
}

/// Partial update: `None` fields keep their stored value.
///
/// `first_seen`, `condition`, and the id itself are deliberately not
/// expressible here; discovery never touches them after insert.
#[derive(Debug, Clone, Default)]
pub struct AssetPatch {
    pub name: Option<String>,
    pub asset_type: Option<AssetType>,
    pub ip_address: Option<String>,
    pub status: Option<AssetStatus>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl CycleTxn<'_> {
    /// Insert a new asset and return its assigned id.
    pub fn insert_asset(&self, new: &NewAsset) -> Result<i64, StoreError> {
        self.conn().execute(
            "INSERT INTO assets \
                 (name, ip_address, mac_address, asset_type, status, condition, first_seen, last_seen) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                new.name,
                new.ip_address,
                new.mac_address,
                new.asset_type.as_str(),
                new.status.as_str(),
                DEFAULT_CONDITION,
                new.seen_at,
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Apply a partial update to one record.
    pub fn update_asset_fields(&self, id: i64, patch: &AssetPatch) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE assets SET \
                 name = COALESCE(?2, name), \
                 asset_type = COALESCE(?3, asset_type), \
                 ip_address = COALESCE(?4, ip_address), \
                 status = COALESCE(?5, status), \
                 last_seen = COALESCE(?6, last_seen) \
             WHERE id = ?1",
            params![
                id,
                patch.name,
                patch.asset_type.map(|t| t.as_str()),
                patch.ip_address,
                patch.status.map(|s| s.as_str()),
                patch.last_seen,
            ],
        )?;
        Ok(())
    }

    /// Flip a single record's status.
    pub fn set_status(&self, id: i64, status: AssetStatus) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE assets SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Ok(())
    }

    /// The offline sweep: every Online asset whose IP is not in
    /// `live_ips` goes Offline. Returns the flipped records so the
    /// caller can emit one alert per disappearance.
    pub fn bulk_set_offline(
        &self,
        live_ips: &HashSet<String>,
    ) -> Result<Vec<Asset>, StoreError> {
        let mut flipped = Vec::new();
        for asset in self.list_assets()? {
            if asset.status == AssetStatus::Online && !live_ips.contains(&asset.ip_address) {
                self.set_status(asset.id, AssetStatus::Offline)?;
                flipped.push(Asset {
                    status: AssetStatus::Offline,
                    ..asset
                });
            }
        }
        Ok(flipped)
    }

    /// Append an alert row.
    pub fn insert_alert(
        &self,
        category: AlertCategory,
        message: &str,
    ) -> Result<i64, StoreError> {
        self.conn().execute(
            "INSERT INTO alerts (created_at, category, message) VALUES (?1, ?2, ?3)",
            params![Utc::now(), category.as_str(), message],
        )?;
        Ok(self.conn().last_insert_rowid())
    }
}

impl StoreClient {
    /// Fire-and-forget alert emission for callers outside a cycle.
    ///
    /// Failures are logged, never propagated: a broken alert sink must
    /// not take down the caller.
    pub fn emit_alert(&self, category: AlertCategory, message: &str) {
        let result = self.with_cycle(|cycle| cycle.insert_alert(category, message));
        if let Err(e) = result {
            tracing::warn!(category = %category, error = %e, "Failed to record alert");
        }
    }

    /// Most recent alert for tests and spot checks.
    pub fn last_alert(&self) -> Result<Option<Alert>, StoreError> {
        Ok(self.recent_alerts(1)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostwatch_core::types::SENTINEL_MAC;

    fn new_asset(ip: &str) -> NewAsset {
        NewAsset {
            name: format!("host-{ip}"),
            ip_address: ip.to_string(),
            mac_address: SENTINEL_MAC.to_string(),
            asset_type: AssetType::Other,
            status: AssetStatus::Online,
            seen_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let store = StoreClient::open_in_memory().unwrap();
        let (a, b) = store
            .with_cycle(|cycle| {
                let a = cycle.insert_asset(&new_asset("10.0.0.1"))?;
                let b = cycle.insert_asset(&new_asset("10.0.0.2"))?;
                Ok((a, b))
            })
            .unwrap();
        assert_eq!(b, a + 1);
    }

    #[test]
    fn test_insert_sets_condition_and_first_seen() {
        let store = StoreClient::open_in_memory().unwrap();
        let seen = Utc::now();
        store
            .with_cycle(|cycle| {
                cycle.insert_asset(&NewAsset {
                    seen_at: seen,
                    ..new_asset("10.0.0.1")
                })
            })
            .unwrap();

        let asset = store.list_assets().unwrap().remove(0);
        assert_eq!(asset.condition, "Monitored");
        assert_eq!(asset.first_seen, seen);
        assert_eq!(asset.last_seen, seen);
    }

    #[test]
    fn test_patch_keeps_unset_fields() {
        let store = StoreClient::open_in_memory().unwrap();
        let id = store
            .with_cycle(|cycle| cycle.insert_asset(&new_asset("10.0.0.1")))
            .unwrap();

        store
            .with_cycle(|cycle| {
                cycle.update_asset_fields(
                    id,
                    &AssetPatch {
                        status: Some(AssetStatus::Offline),
                        ..AssetPatch::default()
                    },
                )
            })
            .unwrap();

        let asset = store.list_assets().unwrap().remove(0);
        assert_eq!(asset.status, AssetStatus::Offline);
        assert_eq!(asset.name, "host-10.0.0.1");
        assert_eq!(asset.ip_address, "10.0.0.1");
    }

    #[test]
    fn test_patch_does_not_touch_first_seen() {
        let store = StoreClient::open_in_memory().unwrap();
        let seen = Utc::now();
        let id = store
            .with_cycle(|cycle| {
                cycle.insert_asset(&NewAsset {
                    seen_at: seen,
                    ..new_asset("10.0.0.1")
                })
            })
            .unwrap();

        let later = seen + chrono::TimeDelta::seconds(90);
        store
            .with_cycle(|cycle| {
                cycle.update_asset_fields(
                    id,
                    &AssetPatch {
                        last_seen: Some(later),
                        ..AssetPatch::default()
                    },
                )
            })
            .unwrap();

        let asset = store.list_assets().unwrap().remove(0);
        assert_eq!(asset.first_seen, seen);
        assert_eq!(asset.last_seen, later);
    }

    #[test]
    fn test_bulk_set_offline_excludes_live() {
        let store = StoreClient::open_in_memory().unwrap();
        store
            .with_cycle(|cycle| {
                cycle.insert_asset(&new_asset("10.0.0.1"))?;
                cycle.insert_asset(&new_asset("10.0.0.2"))?;
                cycle.insert_asset(&new_asset("10.0.0.3"))
            })
            .unwrap();

        let live: HashSet<String> = ["10.0.0.2".to_string()].into_iter().collect();
        let flipped = store
            .with_cycle(|cycle| cycle.bulk_set_offline(&live))
            .unwrap();

        let ips: Vec<_> = flipped.iter().map(|a| a.ip_address.as_str()).collect();
        assert_eq!(ips, vec!["10.0.0.1", "10.0.0.3"]);

        let summary = store.count_by_status().unwrap();
        assert_eq!(summary.online, 1);
        assert_eq!(summary.offline, 2);
    }

    #[test]
    fn test_bulk_set_offline_skips_already_offline() {
        let store = StoreClient::open_in_memory().unwrap();
        let id = store
            .with_cycle(|cycle| cycle.insert_asset(&new_asset("10.0.0.1")))
            .unwrap();
        store
            .with_cycle(|cycle| cycle.set_status(id, AssetStatus::Offline))
            .unwrap();

        let flipped = store
            .with_cycle(|cycle| cycle.bulk_set_offline(&HashSet::new()))
            .unwrap();
        assert!(flipped.is_empty());
    }

    #[test]
    fn test_emit_alert_round_trip() {
        let store = StoreClient::open_in_memory().unwrap();
        store.emit_alert(AlertCategory::Added, "New asset: 10.0.0.1");

        let alert = store.last_alert().unwrap().unwrap();
        assert_eq!(alert.category, AlertCategory::Added);
        assert_eq!(alert.message, "New asset: 10.0.0.1");
    }
}
