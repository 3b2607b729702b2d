use serde::Deserialize;
use std::fs;

/// Analysis constants. The year anchors (reference_year, recency_threshold)
/// are fixed analysis anchors, not derived from the calendar.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_path: String,
    pub cache_ttl_seconds: i64,
    pub reference_year: i32,
    pub recency_threshold: i32,
    pub report_recency_threshold: i32,
    pub activity_floor: usize,
    pub minimum_gap_years: i32,
    pub top_k: usize,
    pub final_cap: usize,
    pub reliable_minimum: usize,
    pub discount_rate: f64,
    pub pricing_timeout_secs: u64,
    pub pricing_workers: usize,
    pub flat_types: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: "resale_data.csv".to_string(),
            cache_ttl_seconds: 3600,
            reference_year: 2025,
            recency_threshold: 2022,
            report_recency_threshold: 2023,
            activity_floor: 100,
            minimum_gap_years: 5,
            top_k: 8,
            final_cap: 6,
            reliable_minimum: 10,
            discount_rate: 0.2,
            pricing_timeout_secs: 5,
            pricing_workers: 4,
            flat_types: vec![
                "3 ROOM".to_string(),
                "4 ROOM".to_string(),
                "5 ROOM".to_string(),
            ],
        }
    }
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
