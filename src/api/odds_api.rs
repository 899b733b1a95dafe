use crate::config::Config;
use crate::error::{OddsError, Result};
use crate::models::{DetailedGame, Game, Outcome, SportCategory};
use crate::utils::cache::ResponseCache;
use crate::utils::markets::{build_detailed_game, build_game, H2H_MARKET};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const ODDS_API_BASE_URL: &str = "https://api.the-odds-api.com/v4";

/// Sports covered by the games index
pub const POPULAR_SPORT_KEYS: [&str; 4] = [
    "soccer_epl",
    "soccer_brazil_campeonato",
    "basketball_nba",
    "americanfootball_nfl",
];

/// Sports searched, in order, when looking up a single game
pub const DETAIL_SPORT_KEYS: [&str; 6] = [
    "soccer_epl",
    "soccer_spain_la_liga",
    "soccer_brazil_campeonato",
    "basketball_nba",
    "americanfootball_nfl",
    "tennis_atp",
];

/// Markets shown on the game detail view; the first one is used to locate the game
pub const DETAIL_MARKETS: [&str; 3] = [H2H_MARKET, "spreads", "totals"];

// Revalidation windows
const SPORTS_TTL: Duration = Duration::from_secs(3600);
const ODDS_TTL: Duration = Duration::from_secs(600);
const BATCH_TTL: Duration = Duration::from_secs(300);

/// Sport list entry from The Odds API
#[derive(Debug, Deserialize)]
struct OddsApiSport {
    key: String,
    title: String,
    active: bool,
}

/// Response from The Odds API for a single event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsApiEvent {
    pub id: String,
    #[serde(default)]
    pub sport_key: String,
    pub sport_title: String,
    pub commence_time: DateTime<Utc>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    #[serde(default)]
    pub bookmakers: Vec<OddsApiBookmaker>,
}

/// Bookmaker data from The Odds API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsApiBookmaker {
    pub key: String,
    pub title: String,
    pub last_update: DateTime<Utc>,
    #[serde(default)]
    pub markets: Vec<OddsApiMarket>,
}

/// Market data (e.g., h2h, spreads) from The Odds API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsApiMarket {
    pub key: String,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub outcomes: Vec<OddsApiOutcome>,
}

/// A single priced selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsApiOutcome {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub point: Option<f64>,
}

impl From<OddsApiOutcome> for Outcome {
    fn from(outcome: OddsApiOutcome) -> Self {
        Outcome {
            name: outcome.name,
            price: outcome.price,
            point: outcome.point,
        }
    }
}

impl OddsApiEvent {
    /// "home vs away", or the sport title for events without teams (outrights)
    pub fn display_name(&self) -> String {
        match (&self.home_team, &self.away_team) {
            (Some(home), Some(away)) => format!("{} vs {}", home, away),
            _ => self.sport_title.clone(),
        }
    }

    /// Fold another response for the same event into this one, matching
    /// bookmakers by key. Markets already present are kept as they are.
    pub fn merge_markets(&mut self, other: OddsApiEvent) {
        for bookmaker in other.bookmakers {
            match self.bookmakers.iter_mut().find(|b| b.key == bookmaker.key) {
                Some(existing) => {
                    for market in bookmaker.markets {
                        if !existing.markets.iter().any(|m| m.key == market.key) {
                            existing.markets.push(market);
                        }
                    }
                }
                None => self.bookmakers.push(bookmaker),
            }
        }
    }
}

/// Query parameters of an odds request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OddsQuery {
    pub regions: String,
    pub markets: String,
    pub date_format: String,
    pub odds_format: String,
}

impl Default for OddsQuery {
    fn default() -> Self {
        Self {
            regions: "us".to_string(),
            markets: H2H_MARKET.to_string(),
            date_format: "iso".to_string(),
            odds_format: "decimal".to_string(),
        }
    }
}

impl OddsQuery {
    pub fn new(regions: &str, markets: &str) -> Self {
        Self {
            regions: regions.to_string(),
            markets: markets.to_string(),
            ..Self::default()
        }
    }
}

/// Request quota reported by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApiUsage {
    pub remaining: Option<u32>,
    pub used: Option<u32>,
}

pub struct OddsApiClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    cache: ResponseCache,
}

impl OddsApiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, ODDS_API_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            cache: ResponseCache::default(),
        }
    }

    /// Build a client from configuration; fails when no API key is set
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key()?;
        Ok(Self::with_base_url(api_key.to_string(), &config.odds_api_base_url))
    }

    /// Fetch all active sports offered by the provider
    pub async fn fetch_sports(&self) -> Result<Vec<SportCategory>> {
        let body = self.get_cached("/sports", &[], SPORTS_TTL).await?;
        let sports: Vec<OddsApiSport> = serde_json::from_str(&body)?;

        Ok(sports
            .into_iter()
            .filter(|sport| sport.active)
            .map(|sport| SportCategory {
                id: sport.key,
                name: sport.title,
                icon: None,
            })
            .collect())
    }

    /// Fetch raw events for one sport. Events that don't match the expected
    /// shape are logged and dropped; the rest of the list is kept.
    pub async fn fetch_events(
        &self,
        sport_key: &str,
        query: &OddsQuery,
        ttl: Duration,
    ) -> Result<Vec<OddsApiEvent>> {
        validate_sport_key(sport_key)?;

        let path = format!("/sports/{}/odds", sport_key);
        let params = [
            ("regions", query.regions.as_str()),
            ("markets", query.markets.as_str()),
            ("dateFormat", query.date_format.as_str()),
            ("oddsFormat", query.odds_format.as_str()),
        ];
        let body = self.get_cached(&path, &params, ttl).await?;
        let raw_events: Vec<serde_json::Value> = serde_json::from_str(&body)?;

        let mut events = Vec::with_capacity(raw_events.len());
        for raw in raw_events {
            match serde_json::from_value::<OddsApiEvent>(raw) {
                Ok(mut event) => {
                    if event.sport_key.is_empty() {
                        event.sport_key = sport_key.to_string();
                    }
                    events.push(event);
                }
                Err(e) => warn!(sport = sport_key, error = %e, "dropping malformed event"),
            }
        }

        Ok(events)
    }

    /// Fetch the games of a single sport
    pub async fn fetch_games(&self, sport_key: &str, query: &OddsQuery) -> Result<Vec<Game>> {
        let events = self.fetch_events(sport_key, query, ODDS_TTL).await?;
        Ok(events.iter().map(build_game).collect())
    }

    /// Fetch several sports concurrently. A sport that fails is logged and
    /// contributes no games; the batch itself never fails.
    pub async fn fetch_games_batch<S: AsRef<str>>(
        &self,
        sport_keys: &[S],
        query: &OddsQuery,
    ) -> Vec<Game> {
        let results = join_all(
            sport_keys
                .iter()
                .map(|key| self.fetch_events(key.as_ref(), query, BATCH_TTL)),
        )
        .await;

        let mut games = Vec::new();
        for (key, result) in sport_keys.iter().zip(results) {
            match result {
                Ok(events) => games.extend(events.iter().map(build_game)),
                Err(e) => warn!(sport = key.as_ref(), error = %e, "failed to fetch odds, skipping sport"),
            }
        }

        info!(sports = sport_keys.len(), games = games.len(), "fetched odds batch");
        games
    }

    /// Index of the popular sports' games by event id
    pub async fn build_games_index(&self) -> BTreeMap<String, Game> {
        let games = self
            .fetch_games_batch(&POPULAR_SPORT_KEYS, &OddsQuery::default())
            .await;

        games.into_iter().map(|game| (game.id.clone(), game)).collect()
    }

    /// Look up one game across the detail sports and return every market
    /// the provider has for it
    pub async fn fetch_game(&self, game_id: &str, regions: &str) -> Result<DetailedGame> {
        let mut found = None;

        for sport in DETAIL_SPORT_KEYS {
            let query = OddsQuery::new(regions, DETAIL_MARKETS[0]);
            match self.fetch_events(sport, &query, BATCH_TTL).await {
                Ok(events) => {
                    if let Some(event) = events.into_iter().find(|e| e.id == game_id) {
                        found = Some((sport, event));
                        break;
                    }
                }
                Err(e) => warn!(sport, error = %e, "failed to search sport for game"),
            }
        }

        let Some((sport, mut event)) = found else {
            return Err(OddsError::NotFound {
                game_id: game_id.to_string(),
            });
        };

        let extra_markets = &DETAIL_MARKETS[1..];
        let results = join_all(extra_markets.iter().map(|market| {
            let query = OddsQuery::new(regions, market);
            async move { self.fetch_events(sport, &query, BATCH_TTL).await }
        }))
        .await;

        for (market, result) in extra_markets.iter().zip(results) {
            match result {
                Ok(events) => {
                    if let Some(other) = events.into_iter().find(|e| e.id == game_id) {
                        event.merge_markets(other);
                    }
                }
                Err(e) => warn!(sport, market = *market, error = %e, "failed to fetch detail market"),
            }
        }

        debug!(game_id, sport, bookmakers = event.bookmakers.len(), "resolved game detail");
        Ok(build_detailed_game(&event))
    }

    /// Check how many API requests you have remaining
    pub async fn check_usage(&self) -> Result<ApiUsage> {
        let response = self
            .client
            .get(format!("{}/sports", self.base_url))
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u32>().ok())
        };
        let usage = ApiUsage {
            remaining: header("x-requests-remaining"),
            used: header("x-requests-used"),
        };

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }

        Ok(usage)
    }

    async fn get_cached(
        &self,
        path: &str,
        params: &[(&str, &str)],
        ttl: Duration,
    ) -> Result<Arc<str>> {
        let cache_key = cache_key(path, params);
        if let Some(body) = self.cache.get(&cache_key, ttl) {
            debug!(key = %cache_key, "odds cache hit");
            return Ok(body);
        }

        let mut query = vec![("apiKey", self.api_key.as_str())];
        query.extend_from_slice(params);

        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }

        let body: Arc<str> = Arc::from(response.text().await?);
        self.cache.insert(cache_key, Arc::clone(&body), ttl);
        Ok(body)
    }
}

/// Provider sport keys are lowercase identifiers like `soccer_epl`
fn validate_sport_key(sport_key: &str) -> Result<()> {
    let valid = !sport_key.is_empty()
        && sport_key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(OddsError::InvalidSportKey(sport_key.to_string()))
    }
}

fn cache_key(path: &str, params: &[(&str, &str)]) -> String {
    let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{}?{}", path, query.join("&"))
}

async fn upstream_error(response: reqwest::Response) -> OddsError {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    OddsError::Upstream {
        status: status.as_u16(),
        message,
    }
}
