// Representative pricing with a recency-preferring fallback.
use crate::analyzer::median;
use crate::config::AppConfig;
use crate::model::Transaction;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Representative resale price for one (town, flat type) pair.
///
/// Prefers the median over recent transactions when there are enough of
/// them for a reliable figure, otherwise falls back to the all-time median.
/// None means no matching records at all, never a substituted default.
pub fn estimate_price(
    table: &[Transaction],
    town: &str,
    flat_type: &str,
    cfg: &AppConfig,
) -> Option<f64> {
    let recent: Vec<f64> = table
        .iter()
        .filter(|t| t.town == town && t.flat_type == flat_type && t.tx_year >= cfg.recency_threshold)
        .map(|t| t.resale_price)
        .collect();
    if recent.len() >= cfg.reliable_minimum {
        return median(recent);
    }

    let all_time: Vec<f64> = table
        .iter()
        .filter(|t| t.town == town && t.flat_type == flat_type)
        .map(|t| t.resale_price)
        .collect();
    median(all_time)
}

/// Discounted BTO target price, rounded to the nearest dollar.
pub fn target_price(estimate: f64, cfg: &AppConfig) -> u64 {
    (estimate * (1.0 - cfg.discount_rate)).round() as u64
}

/// "4 ROOM" -> "4_room", the key format used in pricing maps.
pub fn normalize_flat_type(flat_type: &str) -> String {
    flat_type.to_lowercase().replace(' ', "_")
}

/// Prices every configured flat type for one town. Pairs are independent
/// and run on a bounded pool; a pair that times out or panics is logged
/// and omitted from the map, never retried within the call.
pub async fn price_flat_types(
    table: Arc<Vec<Transaction>>,
    town: &str,
    cfg: &AppConfig,
) -> BTreeMap<String, u64> {
    let deadline = Duration::from_secs(cfg.pricing_timeout_secs);

    let tasks = cfg.flat_types.iter().cloned().map(|flat_type| {
        let table = Arc::clone(&table);
        let town = town.to_string();
        let cfg = cfg.clone();
        async move {
            let task_town = town.clone();
            let task_type = flat_type.clone();
            let handle = tokio::task::spawn_blocking(move || {
                estimate_price(&table, &task_town, &task_type, &cfg)
            });
            let estimate = match timeout(deadline, handle).await {
                Ok(Ok(estimate)) => estimate,
                Ok(Err(e)) => {
                    warn!("Pricing calculation failed for {} {}: {}", town, flat_type, e);
                    None
                }
                Err(_) => {
                    warn!("Pricing calculation timed out for {} {}", town, flat_type);
                    None
                }
            };
            (flat_type, estimate)
        }
    });

    let results: Vec<(String, Option<f64>)> = stream::iter(tasks)
        .buffered(cfg.pricing_workers)
        .collect()
        .await;

    let mut pricing = BTreeMap::new();
    for (flat_type, estimate) in results {
        if let Some(estimate) = estimate {
            pricing.insert(normalize_flat_type(&flat_type), target_price(estimate, cfg));
        }
    }
    pricing
}
