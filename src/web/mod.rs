//! HTTP surface: JSON API routes and server-rendered pages.

pub mod pages;

use crate::api::odds_api::{OddsApiClient, OddsQuery};
use crate::config::Config;
use crate::error::OddsError;
use crate::models::{DetailedGame, Favorites, Game, SportCategory};
use crate::utils::view::{build_view, DashboardQuery, DashboardView, SortDirection, SortOption};
use crate::fetch_dashboard_data;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{de, Deserialize, Deserializer};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::error;

/// State shared by every handler
pub struct AppState {
    pub config: Config,
    client: Option<OddsApiClient>,
}

impl AppState {
    /// The server starts without an API key; requests that need the
    /// provider then fail with `MissingApiKey`.
    pub fn new(config: Config) -> Self {
        let client = OddsApiClient::from_config(&config).ok();
        Self { config, client }
    }

    pub fn client(&self) -> Result<&OddsApiClient, OddsError> {
        self.client.as_ref().ok_or(OddsError::MissingApiKey)
    }
}

pub type SharedState = Arc<AppState>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .nest_service("/static", ServeDir::new("static"))
        .route("/", get(pages::dashboard))
        .route("/odds/:game_id", get(pages::game_detail))
        .route("/api/sports", get(sports))
        .route("/api/sports/:sport_key/odds", get(sport_odds))
        .route("/api/games-index", get(games_index))
        .route("/api/games/:game_id", get(game))
        .route("/api/dashboard", get(dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON error response
pub struct ApiError(pub OddsError);

impl From<OddsError> for ApiError {
    fn from(err: OddsError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsParams {
    pub regions: Option<String>,
    pub markets: Option<String>,
    pub date_format: Option<String>,
    pub odds_format: Option<String>,
}

impl OddsParams {
    fn into_query(self) -> OddsQuery {
        let defaults = OddsQuery::default();
        OddsQuery {
            regions: self.regions.unwrap_or(defaults.regions),
            markets: self.markets.unwrap_or(defaults.markets),
            date_format: self.date_format.unwrap_or(defaults.date_format),
            odds_format: self.odds_format.unwrap_or(defaults.odds_format),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RegionParams {
    pub regions: Option<String>,
}

/// Dashboard query string: comma separated category and favorite ids
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardParams {
    pub categories: Option<String>,
    pub favorites: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub favorites_only: Option<bool>,
    pub sort: Option<SortOption>,
    pub direction: Option<SortDirection>,
}

impl DashboardParams {
    pub fn favorites(&self) -> Favorites {
        split_ids(self.favorites.as_deref()).into_iter().collect()
    }

    pub fn query(&self) -> DashboardQuery {
        DashboardQuery {
            selected_categories: split_ids(self.categories.as_deref()),
            favorites_only: self.favorites_only.unwrap_or(false),
            sort: self.sort.unwrap_or_default(),
            direction: self.direction.unwrap_or_default(),
        }
    }
}

/// Query flags accept `true`/`false` as well as `1`/`0`; an empty value is unset
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(de::Error::invalid_value(
            de::Unexpected::Str(other),
            &"true, false, 1 or 0",
        )),
    }
}

fn split_ids(list: Option<&str>) -> Vec<String> {
    list.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

async fn sports(State(state): State<SharedState>) -> Result<Json<Vec<SportCategory>>, ApiError> {
    let categories = state.client()?.fetch_sports().await?;
    Ok(Json(categories))
}

async fn sport_odds(
    State(state): State<SharedState>,
    Path(sport_key): Path<String>,
    Query(params): Query<OddsParams>,
) -> Result<Json<Vec<Game>>, ApiError> {
    let client = state.client()?;
    let games = client.fetch_games(&sport_key, &params.into_query()).await?;
    Ok(Json(games))
}

async fn games_index(
    State(state): State<SharedState>,
) -> Result<Json<BTreeMap<String, Game>>, ApiError> {
    let index = state.client()?.build_games_index().await;
    Ok(Json(index))
}

async fn game(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    Query(params): Query<RegionParams>,
) -> Result<Json<DetailedGame>, ApiError> {
    let regions = params.regions.unwrap_or_else(|| state.config.regions.clone());
    let detailed = state.client()?.fetch_game(&game_id, &regions).await?;
    Ok(Json(detailed))
}

async fn dashboard(
    State(state): State<SharedState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardView>, ApiError> {
    let data = fetch_dashboard_data(state.client()?, &state.config.regions).await?;
    let view = build_view(&data.games, &data.categories, &params.favorites(), &params.query());
    Ok(Json(view))
}
