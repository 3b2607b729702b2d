// Recommendation ranking: orchestrates gap analysis, pricing and profiling.
use crate::analyzer::gap_analysis::find_candidate_towns;
use crate::analyzer::pricing::price_flat_types;
use crate::analyzer::round2;
use crate::analyzer::town_profile::characterize;
use crate::cache::TableCache;
use crate::config::AppConfig;
use crate::model::{MarketCharacteristics, Recommendation, Transaction};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

pub struct RecommendationService {
    cache: Arc<TableCache>,
    cfg: AppConfig,
}

impl RecommendationService {
    pub fn new(cache: Arc<TableCache>, cfg: AppConfig) -> Self {
        Self { cache, cfg }
    }

    /// Always returns a non-empty, well-typed list: a ranked one when the
    /// table is available, otherwise the static fallback entry.
    pub async fn recommend(&self) -> Vec<Recommendation> {
        match self.cache.get_table().await {
            Some(table) => {
                let recommendations = rank(table, &self.cfg).await;
                if recommendations.is_empty() {
                    info!("No town qualified, serving fallback");
                    return vec![fallback_recommendation()];
                }
                recommendations
            }
            None => {
                error!("Recommendation failed: table unavailable, serving fallback");
                vec![fallback_recommendation()]
            }
        }
    }
}

/// Ranks candidate towns from a table snapshot. Candidates are processed
/// independently; pricing gaps degrade a single entry, never the batch.
pub async fn rank(table: Arc<Vec<Transaction>>, cfg: &AppConfig) -> Vec<Recommendation> {
    let candidates = find_candidate_towns(&table, cfg);

    let mut recommendations = Vec::new();
    for summary in candidates.into_iter().take(cfg.final_cap) {
        let pricing = price_flat_types(Arc::clone(&table), &summary.town, cfg).await;
        let profile = characterize(&table, &summary.town);

        let gap = summary.years_since_launch;
        let demand_score = if gap > 0 {
            round2((gap as f64 / 10.0).min(1.0))
        } else {
            0.5
        };

        recommendations.push(Recommendation {
            rationale: synthesize_rationale(gap, summary.recent_transactions, &pricing),
            town: summary.town,
            years_since_launch: gap,
            demand_score,
            recent_market_activity: summary.recent_transactions,
            predicted_pricing: pricing,
            market_characteristics: MarketCharacteristics {
                total_transactions: profile.total_transactions,
                predominant_flat_types: profile
                    .flat_type_mix
                    .iter()
                    .take(3)
                    .map(|(ft, _)| ft.clone())
                    .collect(),
            },
        });
    }

    // Stable sort keeps per-candidate processing order for ties.
    recommendations.sort_by(|a, b| {
        b.demand_score
            .partial_cmp(&a.demand_score)
            .unwrap_or(Ordering::Equal)
            .then(b.years_since_launch.cmp(&a.years_since_launch))
    });
    recommendations.truncate(cfg.final_cap);
    recommendations
}

/// Clause order is part of the observable contract. The affordability
/// clause requires a present 4-room estimate; a missing estimate never
/// counts as affordable.
fn synthesize_rationale(gap: i32, recent: usize, pricing: &BTreeMap<String, u64>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if gap >= 8 {
        parts.push(format!("No major launches for {gap} years"));
    }
    if recent > 50 {
        parts.push(format!("Active resale market ({recent} recent transactions)"));
    }
    if pricing.get("4_room").is_some_and(|&p| p < 400_000) {
        parts.push("Affordable pricing segment".to_string());
    }
    if parts.is_empty() {
        "Moderate BTO opportunity".to_string()
    } else {
        parts.join("; ")
    }
}

/// Static placeholder served when the table cannot be read at all.
pub fn fallback_recommendation() -> Recommendation {
    Recommendation {
        town: "WOODLANDS".to_string(),
        years_since_launch: 8,
        demand_score: 0.8,
        recent_market_activity: 150,
        predicted_pricing: BTreeMap::from([
            ("3_room".to_string(), 280_000),
            ("4_room".to_string(), 350_000),
            ("5_room".to_string(), 420_000),
        ]),
        rationale: "Fallback recommendation - system error occurred".to_string(),
        market_characteristics: MarketCharacteristics {
            total_transactions: 1000,
            predominant_flat_types: vec![
                "4 ROOM".to_string(),
                "5 ROOM".to_string(),
                "3 ROOM".to_string(),
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_tx;

    fn bulk(
        town: &str,
        flat_type: &str,
        count: usize,
        tx_year: i32,
        lease_year: i32,
        price: f64,
    ) -> Vec<Transaction> {
        (0..count)
            .map(|_| test_tx(town, flat_type, tx_year, lease_year, price))
            .collect()
    }

    #[tokio::test]
    async fn rationale_clauses_join_in_fixed_order() {
        // Gap 9, 60 recent transactions, 4-room target 475000 * 0.8 = 380000.
        let mut table = bulk("KALLANG", "4 ROOM", 60, 2023, 2016, 475_000.0);
        table.extend(bulk("KALLANG", "4 ROOM", 90, 2021, 2016, 475_000.0));
        let cfg = AppConfig::default();

        let recs = rank(Arc::new(table), &cfg).await;
        assert_eq!(recs.len(), 1);
        let rec = &recs[0];
        assert_eq!(rec.years_since_launch, 9);
        assert_eq!(rec.recent_market_activity, 60);
        assert_eq!(rec.predicted_pricing.get("4_room"), Some(&380_000));
        assert_eq!(
            rec.rationale,
            "No major launches for 9 years; Active resale market (60 recent transactions); \
             Affordable pricing segment"
        );
        assert_eq!(rec.demand_score, 0.9);
    }

    #[tokio::test]
    async fn quiet_town_gets_the_default_rationale() {
        // Gap 6, little recent activity, pricey 4-room: no clause triggers.
        let mut table = bulk("QUEENSTOWN", "4 ROOM", 40, 2023, 2019, 650_000.0);
        table.extend(bulk("QUEENSTOWN", "4 ROOM", 80, 2020, 2019, 650_000.0));
        let cfg = AppConfig::default();

        let recs = rank(Arc::new(table), &cfg).await;
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].rationale, "Moderate BTO opportunity");
    }

    #[test]
    fn missing_four_room_estimate_is_not_affordable() {
        let pricing = BTreeMap::from([("3_room".to_string(), 250_000u64)]);
        assert_eq!(synthesize_rationale(3, 10, &pricing), "Moderate BTO opportunity");
    }

    #[tokio::test]
    async fn sorts_by_demand_score_then_gap_and_caps_at_six() {
        let mut table = Vec::new();
        // Gaps 14 down to 7, all qualifying; scores cap the top ones at 1.0.
        for (i, gap) in (7..=14).rev().enumerate() {
            let town = format!("T{i}");
            table.extend(bulk(&town, "4 ROOM", 150, 2023, 2025 - gap, 500_000.0));
        }
        let cfg = AppConfig::default();

        let recs = rank(Arc::new(table), &cfg).await;
        assert_eq!(recs.len(), cfg.final_cap);
        for pair in recs.windows(2) {
            assert!(
                pair[0].demand_score > pair[1].demand_score
                    || (pair[0].demand_score == pair[1].demand_score
                        && pair[0].years_since_launch >= pair[1].years_since_launch)
            );
        }
        // Both gap-14 and gap-13 towns score 1.0; the longer gap wins.
        assert_eq!(recs[0].years_since_launch, 14);
        assert_eq!(recs[1].years_since_launch, 13);
    }

    #[tokio::test]
    async fn ranking_is_deterministic_for_an_unchanged_table() {
        let mut table = bulk("HOUGANG", "4 ROOM", 150, 2023, 2012, 480_000.0);
        table.extend(bulk("YISHUN", "3 ROOM", 150, 2023, 2010, 350_000.0));
        let table = Arc::new(table);
        let cfg = AppConfig::default();

        let first = rank(Arc::clone(&table), &cfg).await;
        let second = rank(Arc::clone(&table), &cfg).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unreadable_table_serves_the_fallback_entry() {
        let cache = Arc::new(TableCache::new("/nonexistent/bto-scout.csv", 3600));
        let service = RecommendationService::new(cache, AppConfig::default());

        let recs = service.recommend().await;
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].town, "WOODLANDS");
        assert_eq!(
            recs[0].rationale,
            "Fallback recommendation - system error occurred"
        );
        assert_eq!(recs[0].predicted_pricing.get("4_room"), Some(&350_000));
    }
}
