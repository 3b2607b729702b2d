// BTO gap analysis: how long since each town last saw a major launch.
use crate::analyzer::round2;
use crate::config::AppConfig;
use crate::model::{TownGapSummary, Transaction};
use std::collections::HashMap;

struct TownAgg {
    max_lease_year: i32,
    total: usize,
    recent: usize,
    price_sum: f64,
}

/// Aggregates the table per town and returns the qualifying candidates,
/// longest launch gap first. Towns with equal gap are ordered by recent
/// activity; full ties keep the order towns first appear in the table.
pub fn find_candidate_towns(table: &[Transaction], cfg: &AppConfig) -> Vec<TownGapSummary> {
    let mut order: Vec<&str> = Vec::new();
    let mut aggs: HashMap<&str, TownAgg> = HashMap::new();

    for tx in table {
        let agg = aggs.entry(tx.town.as_str()).or_insert_with(|| {
            order.push(tx.town.as_str());
            TownAgg {
                max_lease_year: tx.lease_commence_year,
                total: 0,
                recent: 0,
                price_sum: 0.0,
            }
        });
        agg.total += 1;
        if tx.tx_year >= cfg.recency_threshold {
            agg.recent += 1;
        }
        if tx.lease_commence_year > agg.max_lease_year {
            agg.max_lease_year = tx.lease_commence_year;
        }
        agg.price_sum += tx.resale_price;
    }

    let mut summaries: Vec<TownGapSummary> = order
        .iter()
        .map(|town| {
            let agg = &aggs[town];
            TownGapSummary {
                town: town.to_string(),
                max_lease_year: agg.max_lease_year,
                total_transactions: agg.total,
                recent_transactions: agg.recent,
                avg_price: round2(agg.price_sum / agg.total as f64),
                years_since_launch: cfg.reference_year - agg.max_lease_year,
            }
        })
        .filter(|s| {
            s.total_transactions > cfg.activity_floor
                && s.years_since_launch >= cfg.minimum_gap_years
        })
        .collect();

    // Stable sort keeps encounter order for full ties.
    summaries.sort_by(|a, b| {
        b.years_since_launch
            .cmp(&a.years_since_launch)
            .then(b.recent_transactions.cmp(&a.recent_transactions))
    });
    summaries.truncate(cfg.top_k);
    summaries
}
