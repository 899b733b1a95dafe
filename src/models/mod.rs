use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sport/league the provider publishes odds for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportCategory {
    pub id: String, // provider sport key, e.g. "soccer_epl"
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// One selectable result within a market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub name: String,
    pub price: f64, // decimal odds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<f64>, // handicap or total line
}

/// One bookmaker's outcomes for one market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmakerQuote {
    pub bookmaker_name: String,
    pub outcomes: Vec<Outcome>,
    pub last_update: DateTime<Utc>,
}

/// Every bookmaker quote for a single market type of one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAggregate {
    pub key: String,
    pub display_name: String,
    pub description: String,
    pub quotes: Vec<BookmakerQuote>,
}

/// An outcome shown on list views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayOdd {
    pub id: String,
    pub name: String,
    pub value: f64,
    pub provider: String,
}

/// A game as shown in the dashboard list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub name: String, // "home vs away"
    pub start_time: DateTime<Utc>,
    pub category: String,
    pub league: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport_key: Option<String>,
    pub best_odds: Vec<DisplayOdd>,
}

impl Game {
    /// Lowest price among the displayed odds, `None` when there are none
    pub fn min_odds(&self) -> Option<f64> {
        self.best_odds.iter().map(|odd| odd.value).reduce(f64::min)
    }

    /// Mean of the displayed odds, `None` when there are none
    pub fn average_odds(&self) -> Option<f64> {
        if self.best_odds.is_empty() {
            return None;
        }
        let sum: f64 = self.best_odds.iter().map(|odd| odd.value).sum();
        Some(sum / self.best_odds.len() as f64)
    }
}

/// A game with the full per-market bookmaker comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedGame {
    #[serde(flatten)]
    pub game: Game,
    pub all_markets: Vec<MarketAggregate>,
}

/// Summary numbers for the current game list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub total_games: usize,
    pub categories_with_games: usize,
    pub average_odds: f64,
    pub favorite_categories: usize,
}

/// Ordered list of favorited category ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites(Vec<String>);

impl Favorites {
    pub fn new(ids: Vec<String>) -> Self {
        Self(ids)
    }

    /// Remove the id if present, otherwise append it
    pub fn toggle(&mut self, category_id: &str) {
        if let Some(pos) = self.0.iter().position(|id| id == category_id) {
            self.0.remove(pos);
        } else {
            self.0.push(category_id.to_string());
        }
    }

    pub fn contains(&self, category_id: &str) -> bool {
        self.0.iter().any(|id| id == category_id)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }
}

impl FromIterator<String> for Favorites {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn odd(value: f64) -> DisplayOdd {
        DisplayOdd {
            id: format!("g-{}", value),
            name: "Home".to_string(),
            value,
            provider: "Book".to_string(),
        }
    }

    fn game(best_odds: Vec<DisplayOdd>) -> Game {
        Game {
            id: "g".to_string(),
            name: "A vs B".to_string(),
            start_time: Utc::now(),
            category: "EPL".to_string(),
            league: "EPL".to_string(),
            home_team: Some("A".to_string()),
            away_team: Some("B".to_string()),
            sport_key: Some("soccer_epl".to_string()),
            best_odds,
        }
    }

    #[test]
    fn test_toggle_twice_restores_order() {
        let mut favorites = Favorites::new(vec!["soccer_epl".to_string(), "basketball_nba".to_string()]);
        let original = favorites.clone();

        favorites.toggle("tennis_atp");
        assert!(favorites.contains("tennis_atp"));
        assert_eq!(favorites.ids().last().map(String::as_str), Some("tennis_atp"));

        favorites.toggle("tennis_atp");
        assert_eq!(favorites, original);
    }

    #[test]
    fn test_clear_favorites() {
        let mut favorites: Favorites = vec!["soccer_epl".to_string()].into_iter().collect();
        assert!(!favorites.is_empty());
        favorites.clear();
        assert!(favorites.is_empty());
        assert_eq!(favorites.len(), 0);
    }

    #[test]
    fn test_game_odds_helpers() {
        let g = game(vec![odd(2.0), odd(3.5), odd(1.5)]);
        assert_eq!(g.min_odds(), Some(1.5));
        let avg = g.average_odds().unwrap();
        assert!((avg - 7.0 / 3.0).abs() < 1e-9);

        let empty = game(vec![]);
        assert_eq!(empty.min_odds(), None);
        assert_eq!(empty.average_odds(), None);
    }

    #[test]
    fn test_detailed_game_serializes_flat_camel_case() {
        let detailed = DetailedGame {
            game: game(vec![odd(2.0)]),
            all_markets: vec![],
        };
        let json = serde_json::to_value(&detailed).unwrap();
        assert_eq!(json["id"], "g");
        assert_eq!(json["sportKey"], "soccer_epl");
        assert!(json["bestOdds"].is_array());
        assert!(json["allMarkets"].is_array());
        assert!(json.get("game").is_none());
    }
}
