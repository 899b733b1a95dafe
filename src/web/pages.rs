use super::{DashboardParams, SharedState};
use crate::error::OddsError;
use crate::models::{DetailedGame, DisplayOdd, Favorites, Game};
use crate::utils::view::{build_view, DashboardQuery, DashboardView, SortDirection, SortOption};
use crate::{fetch_dashboard_data, DashboardData};
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use reqwest::Url;
use tracing::warn;

// Only the query string of this is used for links
const LINK_BASE: &str = "http://dashboard.local/";

// Custom filters for formatting
mod filters {
    pub fn format_odds(odds: &f64) -> ::askama::Result<String> {
        Ok(format!("{:.2}", odds))
    }
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M UTC").to_string()
}

struct CategoryCard {
    id: String,
    name: String,
    favorite: bool,
    selected: bool,
    /// Dashboard link toggling this category in the selection
    toggle_href: String,
    /// Dashboard link toggling this category in the favorites
    favorite_href: String,
}

struct GameCard {
    id: String,
    name: String,
    category: String,
    start_time: String,
    best_odds: Vec<DisplayOdd>,
}

impl From<&Game> for GameCard {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id.clone(),
            name: game.name.clone(),
            category: game.category.clone(),
            start_time: format_time(&game.start_time),
            best_odds: game.best_odds.clone(),
        }
    }
}

struct SortLink {
    label: String,
    href: String,
    active: bool,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    active_page: String,
    categories: Vec<CategoryCard>,
    games: Vec<GameCard>,
    sort_links: Vec<SortLink>,
    view: DashboardView,
    favorites_only_href: String,
    clear_filters_href: String,
}

struct OutcomeCell {
    label: String,
    price: f64,
}

struct QuoteRow {
    bookmaker: String,
    last_update: String,
    outcomes: Vec<OutcomeCell>,
}

struct MarketSection {
    name: String,
    description: String,
    rows: Vec<QuoteRow>,
}

#[derive(Template)]
#[template(path = "game.html")]
struct GameTemplate {
    active_page: String,
    name: String,
    category: String,
    start_time: String,
    best_odds: Vec<DisplayOdd>,
    markets: Vec<MarketSection>,
}

#[derive(Template)]
#[template(path = "not_found.html")]
struct NotFoundTemplate {
    active_page: String,
    game_id: String,
}

struct HtmlTemplate<T>(T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

/// Rebuilds dashboard links so each one changes a single piece of state
#[derive(Clone)]
struct LinkState {
    selected: Vec<String>,
    favorites: Vec<String>,
    favorites_only: bool,
    sort: SortOption,
    direction: SortDirection,
}

impl LinkState {
    fn new(query: &DashboardQuery, favorites: &Favorites) -> Self {
        Self {
            selected: query.selected_categories.clone(),
            favorites: favorites.ids().to_vec(),
            favorites_only: query.favorites_only,
            sort: query.sort,
            direction: query.direction,
        }
    }

    /// Dashboard link for this state, with every value percent-encoded
    fn href(&self) -> String {
        let Ok(mut url) = Url::parse(LINK_BASE) else {
            return "/".to_string();
        };
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("sort", self.sort.as_str());
            pairs.append_pair("direction", self.direction.as_str());
            if !self.selected.is_empty() {
                pairs.append_pair("categories", &self.selected.join(","));
            }
            if !self.favorites.is_empty() {
                pairs.append_pair("favorites", &self.favorites.join(","));
            }
            if self.favorites_only {
                pairs.append_pair("favoritesOnly", "true");
            }
        }
        format!("/?{}", url.query().unwrap_or_default())
    }

    fn toggle_selected(&self, id: &str) -> String {
        let mut next = self.clone();
        match next.selected.iter().position(|s| s == id) {
            Some(pos) => {
                next.selected.remove(pos);
            }
            None => next.selected.push(id.to_string()),
        }
        next.href()
    }

    fn toggle_favorite(&self, id: &str) -> String {
        let mut next = self.clone();
        let mut favorites = Favorites::new(next.favorites);
        favorites.toggle(id);
        next.favorites = favorites.ids().to_vec();
        next.href()
    }

    fn sorted_by(&self, sort: SortOption) -> String {
        let mut next = self.clone();
        // Clicking the active sort flips its direction
        next.direction = if sort == self.sort {
            self.direction.reversed()
        } else {
            SortDirection::Asc
        };
        next.sort = sort;
        next.href()
    }
}

fn dashboard_page(data: &DashboardData, favorites: &Favorites, query: &DashboardQuery) -> DashboardTemplate {
    let view = build_view(&data.games, &data.categories, favorites, query);
    let links = LinkState::new(query, favorites);

    let categories = view
        .categories
        .iter()
        .map(|category| CategoryCard {
            id: category.id.clone(),
            name: category.name.clone(),
            favorite: favorites.contains(&category.id),
            selected: query.selected_categories.contains(&category.id),
            toggle_href: links.toggle_selected(&category.id),
            favorite_href: links.toggle_favorite(&category.id),
        })
        .collect();

    let sort_links = SortOption::ALL
        .iter()
        .map(|sort| SortLink {
            label: sort.as_str().to_string(),
            href: links.sorted_by(*sort),
            active: *sort == query.sort,
        })
        .collect();

    let mut only_favorites = links.clone();
    only_favorites.favorites_only = !query.favorites_only;
    let mut cleared = links.clone();
    cleared.selected.clear();
    cleared.favorites_only = false;

    DashboardTemplate {
        active_page: "dashboard".to_string(),
        categories,
        games: view.games.iter().map(GameCard::from).collect(),
        sort_links,
        favorites_only_href: only_favorites.href(),
        clear_filters_href: cleared.href(),
        view,
    }
}

fn game_page(detailed: &DetailedGame) -> GameTemplate {
    let markets = detailed
        .all_markets
        .iter()
        .map(|market| MarketSection {
            name: market.display_name.clone(),
            description: market.description.clone(),
            rows: market
                .quotes
                .iter()
                .map(|quote| QuoteRow {
                    bookmaker: quote.bookmaker_name.clone(),
                    last_update: format_time(&quote.last_update),
                    outcomes: quote
                        .outcomes
                        .iter()
                        .map(|outcome| OutcomeCell {
                            label: match outcome.point {
                                Some(point) => format!("{} ({:+})", outcome.name, point),
                                None => outcome.name.clone(),
                            },
                            price: outcome.price,
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    GameTemplate {
        active_page: "game".to_string(),
        name: detailed.game.name.clone(),
        category: detailed.game.category.clone(),
        start_time: format_time(&detailed.game.start_time),
        best_odds: detailed.game.best_odds.clone(),
        markets,
    }
}

pub(super) async fn dashboard(
    State(state): State<SharedState>,
    Query(params): Query<DashboardParams>,
) -> Response {
    let client = match state.client() {
        Ok(client) => client,
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };

    // A provider outage shows an empty dashboard rather than an error page
    let data = match fetch_dashboard_data(client, &state.config.regions).await {
        Ok(data) => data,
        Err(e) => {
            warn!(error = %e, "failed to load dashboard data");
            DashboardData::default()
        }
    };

    HtmlTemplate(dashboard_page(&data, &params.favorites(), &params.query())).into_response()
}

pub(super) async fn game_detail(State(state): State<SharedState>, Path(game_id): Path<String>) -> Response {
    let result = match state.client() {
        Ok(client) => client.fetch_game(&game_id, &state.config.regions).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(detailed) => HtmlTemplate(game_page(&detailed)).into_response(),
        Err(OddsError::NotFound { game_id }) => (
            StatusCode::NOT_FOUND,
            HtmlTemplate(NotFoundTemplate {
                active_page: "game".to_string(),
                game_id,
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            e.to_string(),
        )
            .into_response(),
    }
}
