// Core structs: Transaction, TownGapSummary, Recommendation
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// One resale transaction from the cleaned extract.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub month: String,
    pub town: String,
    pub flat_type: String,
    pub tx_year: i32,
    pub tx_month: u32,
    pub floor_area_sqm: f64,
    pub lease_commence_year: i32,
    pub resale_price: f64,
}

/// Per-town aggregate produced by the gap analyzer. The only source of
/// candidate-town fields downstream.
#[derive(Debug, Clone, Serialize)]
pub struct TownGapSummary {
    pub town: String,
    pub max_lease_year: i32,
    pub total_transactions: usize,
    pub recent_transactions: usize,
    pub avg_price: f64,
    pub years_since_launch: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketCharacteristics {
    pub total_transactions: usize,
    pub predominant_flat_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub town: String,
    pub years_since_launch: i32,
    pub demand_score: f64,
    pub recent_market_activity: usize,
    /// Flat type (normalized, e.g. "4_room") -> discounted BTO target price.
    /// Types with no usable estimate are omitted.
    pub predicted_pricing: BTreeMap<String, u64>,
    pub rationale: String,
    pub market_characteristics: MarketCharacteristics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSpread {
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

/// Descriptive statistics for one town.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TownProfile {
    /// Fraction of transactions per flat type, most frequent first.
    pub flat_type_mix: Vec<(String, f64)>,
    /// Median floor area (sqm) per flat type.
    pub typical_sizes: BTreeMap<String, f64>,
    pub price_ranges: BTreeMap<String, PriceSpread>,
    pub total_transactions: usize,
}

impl TownProfile {
    /// True when the town had no records at all, as opposed to a town
    /// that exists but trades a single flat type.
    pub fn is_empty(&self) -> bool {
        self.total_transactions == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketReport {
    pub town: String,
    pub data_period: String,
    pub total_transactions: usize,
    pub flat_types: BTreeMap<String, usize>,
    pub overall_median_price: i64,
    pub recent_median_price: Option<i64>,
    pub size_distribution: BTreeMap<String, f64>,
    pub oldest_lease_year: i32,
    pub newest_lease_year: i32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read extract: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing required columns: {}", missing.join(", "))]
    SchemaInvalid { missing: Vec<String> },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("no data found for {0}")]
    TownNotFound(String),
}

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("API key not configured")]
    MissingKey,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned status {0}: {1}")]
    Api(u16, String),
    #[error("unexpected response format")]
    InvalidResponse,
}

#[cfg(test)]
pub(crate) fn test_tx(
    town: &str,
    flat_type: &str,
    tx_year: i32,
    lease_year: i32,
    price: f64,
) -> Transaction {
    Transaction {
        month: format!("{tx_year}-06"),
        town: town.to_string(),
        flat_type: flat_type.to_string(),
        tx_year,
        tx_month: 6,
        floor_area_sqm: 90.0,
        lease_commence_year: lease_year,
        resale_price: price,
    }
}
