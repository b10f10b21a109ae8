//! Read paths: identity lookups, inventory listings, alert history.

use chrono::{DateTime, Utc};
use hostwatch_core::types::{Alert, Asset, StatusCycleSummary};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::client::{CycleTxn, StoreClient, StoreError};

const ASSET_COLUMNS: &str =
    "id, name, ip_address, mac_address, asset_type, status, condition, first_seen, last_seen";

/// Row image before enum parsing.
struct RawAsset {
    id: i64,
    name: String,
    ip_address: String,
    mac_address: String,
    asset_type: String,
    status: String,
    condition: String,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

fn raw_asset(row: &Row<'_>) -> rusqlite::Result<RawAsset> {
    Ok(RawAsset {
        id: row.get(0)?,
        name: row.get(1)?,
        ip_address: row.get(2)?,
        mac_address: row.get(3)?,
        asset_type: row.get(4)?,
        status: row.get(5)?,
        condition: row.get(6)?,
        first_seen: row.get(7)?,
        last_seen: row.get(8)?,
    })
}

impl TryFrom<RawAsset> for Asset {
    type Error = StoreError;

    fn try_from(raw: RawAsset) -> Result<Self, StoreError> {
        Ok(Asset {
            id: raw.id,
            name: raw.name,
            ip_address: raw.ip_address,
            mac_address: raw.mac_address,
            asset_type: raw.asset_type.parse().map_err(StoreError::Decode)?,
            status: raw.status.parse().map_err(StoreError::Decode)?,
            condition: raw.condition,
            first_seen: raw.first_seen,
            last_seen: raw.last_seen,
        })
    }
}

fn list_assets_on(conn: &Connection) -> Result<Vec<Asset>, StoreError> {
    let mut stmt = conn.prepare(&format!("SELECT {ASSET_COLUMNS} FROM assets ORDER BY id"))?;
    let rows = stmt.query_map([], raw_asset)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()?
        .into_iter()
        .map(Asset::try_from)
        .collect()
}

fn count_by_status_on(conn: &Connection) -> Result<StatusCycleSummary, StoreError> {
    let (online, offline) = conn.query_row(
        "SELECT \
             COALESCE(SUM(CASE WHEN status = 'Online' THEN 1 ELSE 0 END), 0), \
             COALESCE(SUM(CASE WHEN status = 'Offline' THEN 1 ELSE 0 END), 0) \
         FROM assets",
        [],
        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
    )?;
    Ok(StatusCycleSummary {
        online: online as u32,
        offline: offline as u32,
    })
}

impl CycleTxn<'_> {
    /// Identity lookup: current IP, or non-sentinel MAC.
    ///
    /// A sentinel MAC never matches (the `!= 'N/A'` guard self-excludes).
    /// If stale duplicates exist, the lowest id wins; duplicates are not
    /// auto-merged.
    pub fn find_by_ip_or_mac(&self, ip: &str, mac: &str) -> Result<Option<Asset>, StoreError> {
        let raw = self
            .conn()
            .query_row(
                &format!(
                    "SELECT {ASSET_COLUMNS} FROM assets \
                     WHERE ip_address = ?1 OR (mac_address = ?2 AND mac_address != 'N/A') \
                     ORDER BY id LIMIT 1"
                ),
                params![ip, mac],
                raw_asset,
            )
            .optional()?;
        raw.map(Asset::try_from).transpose()
    }

    /// All assets, ordered by id.
    pub fn list_assets(&self) -> Result<Vec<Asset>, StoreError> {
        list_assets_on(self.conn())
    }

    /// Inventory totals per status, as seen by this transaction.
    pub fn count_by_status(&self) -> Result<StatusCycleSummary, StoreError> {
        count_by_status_on(self.conn())
    }
}

impl StoreClient {
    /// All assets, ordered by id.
    pub fn list_assets(&self) -> Result<Vec<Asset>, StoreError> {
        self.read(list_assets_on)
    }

    /// Inventory totals per status.
    pub fn count_by_status(&self) -> Result<StatusCycleSummary, StoreError> {
        self.read(count_by_status_on)
    }

    /// Most recent alerts, newest first.
    pub fn recent_alerts(&self, limit: u32) -> Result<Vec<Alert>, StoreError> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, created_at, category, message FROM alerts \
                 ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, DateTime<Utc>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
                .into_iter()
                .map(|(id, created_at, category, message)| {
                    Ok(Alert {
                        id,
                        created_at,
                        category: category.parse().map_err(StoreError::Decode)?,
                        message,
                    })
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use hostwatch_core::types::{AssetStatus, AssetType, SENTINEL_MAC};

    use crate::mutations::NewAsset;
    use crate::StoreClient;

    fn seed(store: &StoreClient, ip: &str, mac: &str) -> i64 {
        store
            .with_cycle(|cycle| {
                cycle.insert_asset(&NewAsset {
                    name: format!("host-{ip}"),
                    ip_address: ip.to_string(),
                    mac_address: mac.to_string(),
                    asset_type: AssetType::Other,
                    status: AssetStatus::Online,
                    seen_at: Utc::now(),
                })
            })
            .unwrap()
    }

    #[test]
    fn test_find_by_ip() {
        let store = StoreClient::open_in_memory().unwrap();
        let id = seed(&store, "10.0.0.5", "AA:BB:CC:DD:EE:FF");

        let found = store
            .with_cycle(|cycle| cycle.find_by_ip_or_mac("10.0.0.5", SENTINEL_MAC))
            .unwrap()
            .unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.status, AssetStatus::Online);
    }

    #[test]
    fn test_find_by_mac_after_ip_change() {
        let store = StoreClient::open_in_memory().unwrap();
        let id = seed(&store, "10.0.0.5", "AA:BB:CC:DD:EE:FF");

        let found = store
            .with_cycle(|cycle| cycle.find_by_ip_or_mac("10.0.0.9", "AA:BB:CC:DD:EE:FF"))
            .unwrap();
        assert_eq!(found.unwrap().id, id);
    }

    #[test]
    fn test_sentinel_mac_never_matches() {
        let store = StoreClient::open_in_memory().unwrap();
        seed(&store, "10.0.0.5", SENTINEL_MAC);

        // A different IP with a sentinel MAC must not collide onto the
        // stored sentinel-MAC record.
        let found = store
            .with_cycle(|cycle| cycle.find_by_ip_or_mac("10.0.0.6", SENTINEL_MAC))
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_first_match_wins_on_duplicates() {
        let store = StoreClient::open_in_memory().unwrap();
        let first = seed(&store, "10.0.0.5", "AA:BB:CC:DD:EE:FF");
        let _second = seed(&store, "10.0.0.6", "AA:BB:CC:DD:EE:FF");

        let found = store
            .with_cycle(|cycle| cycle.find_by_ip_or_mac("10.0.0.7", "AA:BB:CC:DD:EE:FF"))
            .unwrap();
        assert_eq!(found.unwrap().id, first);
    }

    #[test]
    fn test_count_by_status() {
        let store = StoreClient::open_in_memory().unwrap();
        seed(&store, "10.0.0.5", SENTINEL_MAC);
        seed(&store, "10.0.0.6", SENTINEL_MAC);

        let summary = store.count_by_status().unwrap();
        assert_eq!(summary.online, 2);
        assert_eq!(summary.offline, 0);
    }
}
