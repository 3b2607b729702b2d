// Extract loading: schema validation and row-level cleaning.
use crate::model::{LoadError, Transaction};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const REQUIRED_COLUMNS: [&str; 6] = [
    "month",
    "town",
    "flat_type",
    "resale_price",
    "lease_commence_date",
    "floor_area_sqm",
];

struct ColumnIndex {
    month: usize,
    town: usize,
    flat_type: usize,
    resale_price: usize,
    lease_commence_date: usize,
    floor_area_sqm: usize,
}

pub fn load_extract(path: &Path) -> Result<Vec<Transaction>, LoadError> {
    let content = fs::read_to_string(path)?;
    parse_extract(&content)
}

/// Parses the comma-delimited resale extract. A missing required column
/// fails the whole load; malformed rows are dropped individually.
pub fn parse_extract(content: &str) -> Result<Vec<Transaction>, LoadError> {
    let mut lines = content.lines();
    let header = lines.next().unwrap_or("");
    let positions: HashMap<&str, usize> = header
        .split(',')
        .map(|c| c.trim())
        .enumerate()
        .map(|(i, c)| (c, i))
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !positions.contains_key(*c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::SchemaInvalid { missing });
    }

    let idx = ColumnIndex {
        month: positions["month"],
        town: positions["town"],
        flat_type: positions["flat_type"],
        resale_price: positions["resale_price"],
        lease_commence_date: positions["lease_commence_date"],
        floor_area_sqm: positions["floor_area_sqm"],
    };

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        match parse_row(&fields, &idx) {
            Some(tx) => records.push(tx),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("Dropped {} invalid rows during load", dropped);
    }
    info!("Loaded {} records successfully", records.len());
    Ok(records)
}

fn parse_row(fields: &[&str], idx: &ColumnIndex) -> Option<Transaction> {
    let month = fields.get(idx.month)?.trim();
    let (tx_year, tx_month) = parse_month(month)?;

    let resale_price: f64 = fields.get(idx.resale_price)?.trim().parse().ok()?;
    if resale_price <= 0.0 {
        return None;
    }
    let lease_commence_year: i32 = fields.get(idx.lease_commence_date)?.trim().parse().ok()?;
    let floor_area_sqm: f64 = fields.get(idx.floor_area_sqm)?.trim().parse().ok()?;

    let town = fields.get(idx.town)?.trim();
    let flat_type = fields.get(idx.flat_type)?.trim();
    if town.is_empty() || flat_type.is_empty() {
        return None;
    }

    Some(Transaction {
        month: month.to_string(),
        town: town.to_string(),
        flat_type: flat_type.to_string(),
        tx_year,
        tx_month,
        floor_area_sqm,
        lease_commence_year,
        resale_price,
    })
}

/// Splits a `YYYY-MM` period string into transaction year and month.
fn parse_month(s: &str) -> Option<(i32, u32)> {
    let (year, month) = s.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month))
}
