use crate::models::{Favorites, Game};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

/// Save any serializable data to a JSON cache file, creating its directory
pub fn save_to_cache<T: Serialize + ?Sized>(data: &T, cache_file: &str) -> Result<()> {
    if let Some(parent) = Path::new(cache_file).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
        }
    }
    let json = serde_json::to_string_pretty(data).context("Failed to serialize cache data")?;
    std::fs::write(cache_file, json).context("Failed to write cache file")?;
    Ok(())
}

/// Load data from a JSON cache file
pub fn load_from_cache<T: DeserializeOwned>(cache_file: &str) -> Result<T> {
    let json = std::fs::read_to_string(cache_file).context("Failed to read cache file")?;
    let data = serde_json::from_str(&json).context("Failed to deserialize cache data")?;
    Ok(data)
}

/// Load the favorite category ids. A missing file means no favorites; a
/// file that isn't a list of ids is logged and treated the same way.
pub fn load_favorites(favorites_file: &str) -> Result<Favorites> {
    if !Path::new(favorites_file).exists() {
        return Ok(Favorites::default());
    }
    let json = std::fs::read_to_string(favorites_file).context("Failed to read favorites file")?;
    match serde_json::from_str::<Favorites>(&json) {
        Ok(favorites) => Ok(favorites),
        Err(e) => {
            warn!(file = favorites_file, error = %e, "ignoring unreadable favorites");
            Ok(Favorites::default())
        }
    }
}

pub fn save_favorites(favorites: &Favorites, favorites_file: &str) -> Result<()> {
    save_to_cache(favorites, favorites_file)
}

#[derive(Debug, Serialize)]
struct GameRecord<'a> {
    #[serde(rename = "Game")]
    name: &'a str,
    #[serde(rename = "Category")]
    category: &'a str,
    #[serde(rename = "Start Time")]
    start_time: String,
    #[serde(rename = "Best Odds")]
    best_odds: String,
    #[serde(rename = "Bookmaker")]
    provider: &'a str,
    #[serde(rename = "Game ID")]
    id: &'a str,
}

/// Save games to CSV
pub fn save_games_to_csv(games: &[Game], filename: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(filename).context("Failed to create CSV file")?;

    for game in games {
        let best_odds = game
            .best_odds
            .iter()
            .map(|odd| format!("{} {:.2}", odd.name, odd.value))
            .collect::<Vec<_>>()
            .join(" | ");

        writer.serialize(GameRecord {
            name: &game.name,
            category: &game.category,
            start_time: game.start_time.to_rfc3339(),
            best_odds,
            provider: game.best_odds.first().map(|o| o.provider.as_str()).unwrap_or("N/A"),
            id: &game.id,
        })?;
    }

    writer.flush().context("Failed to flush CSV file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DisplayOdd, SportCategory};
    use chrono::{TimeZone, Utc};

    fn sample_game() -> Game {
        Game {
            id: "evt1".to_string(),
            name: "Arsenal vs Chelsea".to_string(),
            start_time: Utc.with_ymd_and_hms(2030, 8, 2, 15, 0, 0).unwrap(),
            category: "EPL".to_string(),
            league: "EPL".to_string(),
            home_team: Some("Arsenal".to_string()),
            away_team: Some("Chelsea".to_string()),
            sport_key: Some("soccer_epl".to_string()),
            best_odds: vec![
                DisplayOdd {
                    id: "evt1-Arsenal".to_string(),
                    name: "Arsenal".to_string(),
                    value: 2.1,
                    provider: "Book A".to_string(),
                },
                DisplayOdd {
                    id: "evt1-Draw".to_string(),
                    name: "Draw".to_string(),
                    value: 3.2,
                    provider: "Book A".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_cache_round_trip_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested/sports.json");
        let file = file.to_str().unwrap();

        let categories = vec![SportCategory {
            id: "soccer_epl".to_string(),
            name: "EPL".to_string(),
            icon: None,
        }];
        save_to_cache(&categories, file).unwrap();
        let loaded: Vec<SportCategory> = load_from_cache(file).unwrap();
        assert_eq!(loaded, categories);
    }

    #[test]
    fn test_missing_or_invalid_favorites_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("favorites.json");
        let file = file.to_str().unwrap();

        assert!(load_favorites(file).unwrap().is_empty());

        std::fs::write(file, r#"{"not": "a list"}"#).unwrap();
        assert!(load_favorites(file).unwrap().is_empty());
    }

    #[test]
    fn test_favorites_persist_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("favorites.json");
        let file = file.to_str().unwrap();

        let favorites = Favorites::new(vec!["tennis_atp".to_string(), "soccer_epl".to_string()]);
        save_favorites(&favorites, file).unwrap();
        assert_eq!(load_favorites(file).unwrap(), favorites);

        let raw = std::fs::read_to_string(file).unwrap();
        let ids: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(ids, vec!["tennis_atp", "soccer_epl"]);
    }

    #[test]
    fn test_save_games_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("games.csv");
        let file = file.to_str().unwrap();

        save_games_to_csv(&[sample_game()], file).unwrap();
        let contents = std::fs::read_to_string(file).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("Game,Category,Start Time,Best Odds,Bookmaker,Game ID")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Arsenal vs Chelsea,EPL,2030-08-02T15:00:00+00:00,"));
        assert!(row.contains("Arsenal 2.10 | Draw 3.20"));
        assert!(row.ends_with("Book A,evt1"));
    }
}
