// Descriptive statistics for a single town.
use crate::analyzer::median;
use crate::model::{PriceSpread, TownProfile, Transaction};
use std::collections::HashMap;

/// Computes the flat-type mix, typical sizes and price spread for a town.
/// An unknown town yields the empty profile rather than an error.
pub fn characterize(table: &[Transaction], town: &str) -> TownProfile {
    let rows: Vec<&Transaction> = table.iter().filter(|t| t.town == town).collect();
    if rows.is_empty() {
        return TownProfile::default();
    }

    let total = rows.len();
    let mut type_order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut areas: HashMap<&str, Vec<f64>> = HashMap::new();
    let mut prices: HashMap<&str, Vec<f64>> = HashMap::new();

    for tx in &rows {
        let flat_type = tx.flat_type.as_str();
        let count = counts.entry(flat_type).or_insert_with(|| {
            type_order.push(flat_type);
            0
        });
        *count += 1;
        areas.entry(flat_type).or_default().push(tx.floor_area_sqm);
        prices.entry(flat_type).or_default().push(tx.resale_price);
    }

    // Most frequent first; ties keep encounter order (stable sort).
    let mut mix_order = type_order.clone();
    mix_order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    let flat_type_mix = mix_order
        .iter()
        .map(|ft| (ft.to_string(), counts[ft] as f64 / total as f64))
        .collect();

    let typical_sizes = areas
        .into_iter()
        .filter_map(|(ft, values)| median(values).map(|m| (ft.to_string(), m)))
        .collect();

    let price_ranges = prices
        .into_iter()
        .filter_map(|(ft, values)| {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            median(values).map(|m| {
                (
                    ft.to_string(),
                    PriceSpread {
                        min,
                        max,
                        median: m,
                    },
                )
            })
        })
        .collect();

    TownProfile {
        flat_type_mix,
        typical_sizes,
        price_ranges,
        total_transactions: total,
    }
}
