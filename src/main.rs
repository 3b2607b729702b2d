mod analyzer;
mod cache;
mod config;
mod loader;
mod model;
mod narrative;
mod predict;
mod recommender;

use analyzer::market_report::town_market_analysis;
use cache::TableCache;
use config::{AppConfig, load_config};
use narrative::{OpenAiGenerator, RECOMMENDATION_QUESTION, build_digest};
use recommender::RecommendationService;
use std::sync::Arc;
use tracing::{error, warn};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cfg = match load_config("config.json") {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config load error ({}), using defaults", e);
            AppConfig::default()
        }
    };

    let cache = Arc::new(TableCache::new(&cfg.data_path, cfg.cache_ttl_seconds));

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("--town") => {
            let Some(town) = args.next() else {
                error!("--town requires a town name");
                std::process::exit(2);
            };
            run_town_report(&cache, &town, &cfg).await;
        }
        Some(other) => {
            error!("Unknown argument: {} (expected --town NAME)", other);
            std::process::exit(2);
        }
        None => run_recommendations(cache, cfg).await,
    }
}

async fn run_town_report(cache: &TableCache, town: &str, cfg: &AppConfig) {
    let Some(table) = cache.get_table().await else {
        error!("Data not available");
        std::process::exit(1);
    };
    match town_market_analysis(&table, town, cfg) {
        Ok(report) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).unwrap_or_default()
            );
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

async fn run_recommendations(cache: Arc<TableCache>, cfg: AppConfig) {
    let service = RecommendationService::new(cache, cfg);
    let recommendations = service.recommend().await;
    println!(
        "{}",
        serde_json::to_string_pretty(&recommendations).unwrap_or_default()
    );

    let digest = build_digest(&recommendations);
    let generator = OpenAiGenerator::from_env();
    let analysis = narrative::analyze(&generator, RECOMMENDATION_QUESTION, &digest).await;
    println!("\n{analysis}");
}
