// Table cache: one explicit entry (table + load time) behind a lock.
use crate::loader;
use crate::model::Transaction;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

struct CacheEntry {
    table: Arc<Vec<Transaction>>,
    loaded_at: DateTime<Utc>,
}

/// Owns the canonical in-memory transaction table. The staleness check and
/// any reload happen under one lock acquisition, so callers either get a
/// consistent snapshot or None.
pub struct TableCache {
    source: PathBuf,
    ttl_seconds: i64,
    entry: Mutex<Option<CacheEntry>>,
}

impl TableCache {
    pub fn new(source: impl Into<PathBuf>, ttl_seconds: i64) -> Self {
        Self {
            source: source.into(),
            ttl_seconds,
            entry: Mutex::new(None),
        }
    }

    /// Returns the cached table while fresh; reloads when stale or absent.
    /// A failed reload returns None and leaves the last successful entry in
    /// place, so a transiently broken extract does not wipe known-good data.
    /// The load timestamp advances only on a successful reload.
    pub async fn get_table(&self) -> Option<Arc<Vec<Transaction>>> {
        let mut guard = self.entry.lock().await;

        if let Some(entry) = guard.as_ref() {
            let age = (Utc::now() - entry.loaded_at).num_seconds();
            if age < self.ttl_seconds {
                return Some(Arc::clone(&entry.table));
            }
        }

        match loader::load_extract(&self.source) {
            Ok(records) => {
                info!("Refreshed table cache from {}", self.source.display());
                let table = Arc::new(records);
                *guard = Some(CacheEntry {
                    table: Arc::clone(&table),
                    loaded_at: Utc::now(),
                });
                Some(table)
            }
            Err(e) => {
                error!("Error loading data: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const HEADER: &str =
        "month,town,flat_type,flat_model,floor_area_sqm,storey_range,lease_commence_date,resale_price";

    static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

    fn temp_extract(rows: &[&str]) -> PathBuf {
        let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "bto-scout-cache-{}-{}.csv",
            std::process::id(),
            id
        ));
        let mut content = HEADER.to_string();
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        fs::write(&path, content).unwrap();
        path
    }

    const ROW_A: &str = "2023-01,WOODLANDS,4 ROOM,Model A,93.0,04 TO 06,1998,420000";
    const ROW_B: &str = "2022-05,BEDOK,3 ROOM,Model A,67.0,01 TO 03,1980,335000";

    #[tokio::test]
    async fn fresh_entry_is_served_without_reload() {
        let path = temp_extract(&[ROW_A]);
        let cache = TableCache::new(&path, 3600);

        let first = cache.get_table().await.unwrap();
        assert_eq!(first.len(), 1);

        // The extract changes on disk, but the entry is still fresh.
        fs::write(&path, format!("{HEADER}\n{ROW_A}\n{ROW_B}")).unwrap();
        let second = cache.get_table().await.unwrap();
        assert_eq!(second.len(), 1);

        fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn stale_entry_triggers_reload() {
        let path = temp_extract(&[ROW_A]);
        let cache = TableCache::new(&path, 0);

        assert_eq!(cache.get_table().await.unwrap().len(), 1);
        fs::write(&path, format!("{HEADER}\n{ROW_A}\n{ROW_B}")).unwrap();
        assert_eq!(cache.get_table().await.unwrap().len(), 2);

        fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn failed_reload_returns_none_and_keeps_last_known_good() {
        let path = temp_extract(&[ROW_A, ROW_B]);
        let cache = TableCache::new(&path, 0);
        assert_eq!(cache.get_table().await.unwrap().len(), 2);

        // Break the schema: reload must fail without clearing the entry.
        fs::write(&path, "month,town\n2023-01,WOODLANDS").unwrap();
        assert!(cache.get_table().await.is_none());

        let guard = cache.entry.lock().await;
        let entry = guard.as_ref().expect("last-known-good entry preserved");
        assert_eq!(entry.table.len(), 2);
        drop(guard);

        fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn unreadable_source_yields_none() {
        let cache = TableCache::new("/nonexistent/bto-scout.csv", 3600);
        assert!(cache.get_table().await.is_none());
    }
}
