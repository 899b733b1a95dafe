pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;
pub mod web;

#[cfg(test)]
pub(crate) mod testkit;

pub use api::*;
pub use config::Config;
pub use error::OddsError;
pub use models::*;
pub use utils::*;

use anyhow::{Context, Result};
use api::odds_api::{OddsApiClient, OddsQuery};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use utils::data::{load_from_cache, save_to_cache};
use utils::markets::H2H_MARKET;

/// Number of soccer leagues loaded for the default dashboard
const DEFAULT_VIEW_LEAGUES: usize = 3;

/// Everything the dashboard needs before filtering and sorting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardData {
    pub categories: Vec<SportCategory>,
    pub games: Vec<Game>,
}

/// Sport keys loaded for the default view: the first few Brazilian,
/// English and Spanish soccer leagues
pub fn default_view_sport_keys(categories: &[SportCategory]) -> Vec<String> {
    categories
        .iter()
        .filter(|category| {
            category.id.contains("soccer")
                && ["brazil", "england", "spain"]
                    .iter()
                    .any(|country| category.id.contains(country))
        })
        .take(DEFAULT_VIEW_LEAGUES)
        .map(|category| category.id.clone())
        .collect()
}

/// Fetch the sport list and the default view's games from the provider
pub async fn fetch_dashboard_data(
    client: &OddsApiClient,
    regions: &str,
) -> std::result::Result<DashboardData, OddsError> {
    let categories = client.fetch_sports().await?;
    let sport_keys = default_view_sport_keys(&categories);

    let games = client
        .fetch_games_batch(&sport_keys, &OddsQuery::new(regions, H2H_MARKET))
        .await;

    info!(
        categories = categories.len(),
        leagues = sport_keys.len(),
        games = games.len(),
        "loaded dashboard data"
    );

    Ok(DashboardData { categories, games })
}

/// Fetch dashboard data from the API or from the local snapshot
pub async fn fetch_all_dashboard_data(config: &Config) -> Result<DashboardData> {
    let cache_file = config.cache_file("dashboard_cache.json");

    if config.use_cache && Path::new(&cache_file).exists() {
        info!(file = %cache_file, "loading dashboard data from cache");
        return load_from_cache(&cache_file);
    }

    let client = OddsApiClient::from_config(config)?;
    let data = fetch_dashboard_data(&client, &config.regions)
        .await
        .context("Failed to fetch dashboard data")?;
    save_to_cache(&data, &cache_file)?;

    Ok(data)
}
