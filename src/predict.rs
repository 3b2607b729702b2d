// Seam to the offline-trained price model. The model itself lives outside
// this crate; callers hand it an aligned feature vector.
use crate::config::AppConfig;
use std::collections::HashMap;

/// Pure price predictor: deterministic for identical input, no side effects.
pub trait PricePredictor {
    fn predict(&self, features: &HashMap<String, f64>) -> f64;
}

/// Orders `provided` by the model's expected feature names. Names the
/// caller did not set are implicitly zero; unknown extras are ignored.
pub fn align_features(expected: &[String], provided: &HashMap<String, f64>) -> Vec<f64> {
    expected
        .iter()
        .map(|name| provided.get(name).copied().unwrap_or(0.0))
        .collect()
}

/// Feature vector for one hypothetical flat, with one-hot town and
/// flat-type markers. Transaction time is anchored at the reference year.
pub fn build_features(
    town: &str,
    flat_type: &str,
    floor_area_sqm: f64,
    storey: i32,
    lease_commence_year: i32,
    cfg: &AppConfig,
) -> HashMap<String, f64> {
    let mut features = HashMap::new();
    features.insert("floor_area_sqm".to_string(), floor_area_sqm);
    features.insert("storey_low".to_string(), storey as f64);
    features.insert("storey_high".to_string(), storey as f64);
    features.insert("lease_commence_year".to_string(), lease_commence_year as f64);
    features.insert("tx_year".to_string(), cfg.reference_year as f64);
    features.insert("tx_month".to_string(), 6.0);
    features.insert(format!("town_{town}"), 1.0);
    features.insert(format!("flat_type_{flat_type}"), 1.0);
    features
}
