use crate::models::{Favorites, Game, GameStats, SportCategory};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    #[default]
    Date,
    Name,
    Category,
    Odds,
    Favorites,
}

impl SortOption {
    pub const ALL: [SortOption; 5] = [
        SortOption::Date,
        SortOption::Name,
        SortOption::Category,
        SortOption::Odds,
        SortOption::Favorites,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::Date => "date",
            SortOption::Name => "name",
            SortOption::Category => "category",
            SortOption::Odds => "odds",
            SortOption::Favorites => "favorites",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// What the user asked the dashboard to show
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardQuery {
    pub selected_categories: Vec<String>,
    pub favorites_only: bool,
    pub sort: SortOption,
    pub direction: SortDirection,
}

impl DashboardQuery {
    pub fn has_active_filters(&self) -> bool {
        !self.selected_categories.is_empty() || self.favorites_only
    }
}

/// Games sharing the same category text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameGroup {
    pub category: String,
    pub games: Vec<Game>,
}

/// Display-ready dashboard state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub games: Vec<Game>,
    pub groups: Vec<GameGroup>,
    pub categories: Vec<SportCategory>,
    pub stats: GameStats,
    pub filters_active: bool,
}

/// A game belongs to a category when its category text contains the
/// category name, ignoring case
fn category_matches(game: &Game, category: &SportCategory) -> bool {
    game.category
        .to_lowercase()
        .contains(&category.name.to_lowercase())
}

fn matches_any(game: &Game, categories: &[SportCategory], ids: &[String]) -> bool {
    ids.iter().any(|id| {
        categories
            .iter()
            .find(|category| &category.id == id)
            .is_some_and(|category| category_matches(game, category))
    })
}

/// Keep games matching at least one of the given category ids.
/// An empty id list keeps everything.
pub fn filter_by_categories(
    games: &[Game],
    categories: &[SportCategory],
    category_ids: &[String],
) -> Vec<Game> {
    if category_ids.is_empty() {
        return games.to_vec();
    }
    games
        .iter()
        .filter(|game| matches_any(game, categories, category_ids))
        .cloned()
        .collect()
}

/// Apply the category selection and, when requested, the favorites filter
pub fn filter_games(
    games: &[Game],
    categories: &[SportCategory],
    favorites: &Favorites,
    query: &DashboardQuery,
) -> Vec<Game> {
    let mut filtered = filter_by_categories(games, categories, &query.selected_categories);
    if query.favorites_only {
        filtered.retain(|game| matches_any(game, categories, favorites.ids()));
    }
    filtered
}

/// Stable sort of games.
///
/// `Odds` compares the lowest displayed price with the direction inverted,
/// so an ascending request lists the highest minimum price first. Games
/// without odds count as an infinite price. `Favorites` ignores the
/// direction and moves favorite-category games to the front.
pub fn sort_games(
    mut games: Vec<Game>,
    categories: &[SportCategory],
    favorites: &Favorites,
    sort: SortOption,
    direction: SortDirection,
) -> Vec<Game> {
    match sort {
        SortOption::Date => {
            games.sort_by(|a, b| direction.apply(a.start_time.cmp(&b.start_time)))
        }
        SortOption::Name => games.sort_by(|a, b| direction.apply(a.name.cmp(&b.name))),
        SortOption::Category => {
            games.sort_by(|a, b| direction.apply(a.category.cmp(&b.category)))
        }
        SortOption::Odds => {
            let min_price = |game: &Game| game.min_odds().unwrap_or(f64::INFINITY);
            games.sort_by(|a, b| {
                direction
                    .reversed()
                    .apply(min_price(a).total_cmp(&min_price(b)))
            })
        }
        SortOption::Favorites => {
            games.sort_by_key(|game| Reverse(matches_any(game, categories, favorites.ids())))
        }
    }
    games
}

/// Group games by category text, in order of first appearance
pub fn group_by_category(games: &[Game]) -> Vec<GameGroup> {
    let mut groups: Vec<GameGroup> = Vec::new();
    for game in games {
        match groups.iter_mut().find(|g| g.category == game.category) {
            Some(group) => group.games.push(game.clone()),
            None => groups.push(GameGroup {
                category: game.category.clone(),
                games: vec![game.clone()],
            }),
        }
    }
    groups
}

/// Favorite categories first, then alphabetical by name
pub fn sort_categories(categories: &[SportCategory], favorites: &Favorites) -> Vec<SportCategory> {
    let mut sorted = categories.to_vec();
    sorted.sort_by(|a, b| {
        favorites
            .contains(&b.id)
            .cmp(&favorites.contains(&a.id))
            .then_with(|| a.name.cmp(&b.name))
    });
    sorted
}

pub fn compute_stats(games: &[Game], categories: &[SportCategory], favorites: &Favorites) -> GameStats {
    let game_categories: HashSet<String> =
        games.iter().map(|g| g.category.to_lowercase()).collect();
    let categories_with_games = categories
        .iter()
        .map(|c| c.name.to_lowercase())
        .filter(|name| game_categories.contains(name))
        .collect::<HashSet<_>>()
        .len();

    // Average of per-game averages; games without odds don't count
    let per_game: Vec<f64> = games.iter().filter_map(Game::average_odds).collect();
    let average_odds = if per_game.is_empty() {
        0.0
    } else {
        per_game.iter().sum::<f64>() / per_game.len() as f64
    };

    GameStats {
        total_games: games.len(),
        categories_with_games,
        average_odds,
        favorite_categories: favorites.len(),
    }
}

/// Filter, sort, group and summarize games for display.
/// Stats describe the filtered list.
pub fn build_view(
    games: &[Game],
    categories: &[SportCategory],
    favorites: &Favorites,
    query: &DashboardQuery,
) -> DashboardView {
    let filtered = filter_games(games, categories, favorites, query);
    let sorted = sort_games(filtered, categories, favorites, query.sort, query.direction);

    DashboardView {
        groups: group_by_category(&sorted),
        categories: sort_categories(categories, favorites),
        stats: compute_stats(&sorted, categories, favorites),
        filters_active: query.has_active_filters(),
        games: sorted,
    }
}
