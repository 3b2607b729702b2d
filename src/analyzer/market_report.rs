// Full descriptive report for one named town.
use crate::analyzer::median;
use crate::config::AppConfig;
use crate::model::{MarketReport, ReportError, Transaction};
use std::collections::BTreeMap;

/// Detailed market analysis for a town, matched case-insensitively.
/// A town with zero records is a NotFound error, not an empty report.
pub fn town_market_analysis(
    table: &[Transaction],
    town_name: &str,
    cfg: &AppConfig,
) -> Result<MarketReport, ReportError> {
    let needle = town_name.trim().to_uppercase();
    let rows: Vec<&Transaction> = table
        .iter()
        .filter(|t| t.town.to_uppercase() == needle)
        .collect();
    if rows.is_empty() {
        return Err(ReportError::TownNotFound(town_name.to_string()));
    }

    let min_month = rows.iter().map(|t| t.month.as_str()).min().unwrap_or("");
    let max_month = rows.iter().map(|t| t.month.as_str()).max().unwrap_or("");

    let mut flat_types: BTreeMap<String, usize> = BTreeMap::new();
    let mut sizes: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for tx in &rows {
        *flat_types.entry(tx.flat_type.clone()).or_default() += 1;
        sizes
            .entry(tx.flat_type.clone())
            .or_default()
            .push(tx.floor_area_sqm);
    }

    let overall_median_price = median(rows.iter().map(|t| t.resale_price).collect())
        .map(|m| m as i64)
        .unwrap_or(0);
    let recent_median_price = median(
        rows.iter()
            .filter(|t| t.tx_year >= cfg.report_recency_threshold)
            .map(|t| t.resale_price)
            .collect(),
    )
    .map(|m| m as i64);

    let size_distribution = sizes
        .into_iter()
        .filter_map(|(ft, values)| median(values).map(|m| (ft, m)))
        .collect();

    let oldest_lease_year = rows.iter().map(|t| t.lease_commence_year).min().unwrap_or(0);
    let newest_lease_year = rows.iter().map(|t| t.lease_commence_year).max().unwrap_or(0);

    Ok(MarketReport {
        town: needle,
        data_period: format!("{min_month} to {max_month}"),
        total_transactions: rows.len(),
        flat_types,
        overall_median_price,
        recent_median_price,
        size_distribution,
        oldest_lease_year,
        newest_lease_year,
    })
}
