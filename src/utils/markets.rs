use crate::api::odds_api::OddsApiEvent;
use crate::models::{BookmakerQuote, DetailedGame, DisplayOdd, Game, MarketAggregate, Outcome};

/// Market key for head-to-head (moneyline / 1X2) odds
pub const H2H_MARKET: &str = "h2h";

/// Number of outcomes shown as a game's best odds
pub const MAX_BEST_ODDS: usize = 3;

const GENERIC_MARKET_DESCRIPTION: &str = "Bookmaker specific betting market.";

/// Human-readable name for a market key; unknown keys are shown as-is
pub fn market_display_name(market_key: &str) -> String {
    match market_key {
        "h2h" => "Match Result (1X2)".to_string(),
        "spreads" => "Handicap".to_string(),
        "totals" => "Total Goals/Points".to_string(),
        "outrights" => "Tournament Winner".to_string(),
        other => other.to_string(),
    }
}

pub fn market_description(market_key: &str) -> &'static str {
    match market_key {
        "h2h" => "Bet on the final result: home win, draw or away win.",
        "spreads" => "Bet with a points/goals handicap applied to one of the teams.",
        "totals" => "Bet on whether total goals/points land over or under a line.",
        "outrights" => "Bet on the overall winner of the league or tournament.",
        _ => GENERIC_MARKET_DESCRIPTION,
    }
}

/// Merge every bookmaker's market entries into one aggregate per market key.
///
/// Aggregates appear in the order their key is first seen, and the quotes
/// inside an aggregate keep bookmaker order from the payload.
pub fn normalize_markets(event: &OddsApiEvent) -> Vec<MarketAggregate> {
    let mut markets: Vec<MarketAggregate> = Vec::new();

    for bookmaker in &event.bookmakers {
        for market in &bookmaker.markets {
            let quote = BookmakerQuote {
                bookmaker_name: bookmaker.title.clone(),
                outcomes: market.outcomes.iter().cloned().map(Outcome::from).collect(),
                last_update: market.last_update.unwrap_or(bookmaker.last_update),
            };

            // At most a handful of markets per game, a linear scan is fine
            match markets.iter_mut().find(|m| m.key == market.key) {
                Some(existing) => existing.quotes.push(quote),
                None => markets.push(MarketAggregate {
                    key: market.key.clone(),
                    display_name: market_display_name(&market.key),
                    description: market_description(&market.key).to_string(),
                    quotes: vec![quote],
                }),
            }
        }
    }

    markets
}

/// Pick the outcomes shown on list views.
///
/// This is the first bookmaker's head-to-head quote (not the best price
/// across bookmakers), capped at `MAX_BEST_ODDS` outcomes.
pub fn select_best_odds(game_id: &str, markets: &[MarketAggregate]) -> Vec<DisplayOdd> {
    let Some(first_quote) = markets
        .iter()
        .find(|m| m.key == H2H_MARKET)
        .and_then(|m| m.quotes.first())
    else {
        return Vec::new();
    };

    first_quote
        .outcomes
        .iter()
        .take(MAX_BEST_ODDS)
        .map(|outcome| DisplayOdd {
            id: odd_id(game_id, &outcome.name),
            name: outcome.name.clone(),
            value: outcome.price,
            provider: first_quote.bookmaker_name.clone(),
        })
        .collect()
}

fn odd_id(game_id: &str, outcome_name: &str) -> String {
    let sanitized: String = outcome_name.split_whitespace().collect();
    format!("{}-{}", game_id, sanitized)
}

/// Build the full per-market view of an event
pub fn build_detailed_game(event: &OddsApiEvent) -> DetailedGame {
    let all_markets = normalize_markets(event);
    let best_odds = select_best_odds(&event.id, &all_markets);

    DetailedGame {
        game: Game {
            id: event.id.clone(),
            name: event.display_name(),
            start_time: event.commence_time,
            category: event.sport_title.clone(),
            league: event.sport_title.clone(),
            home_team: event.home_team.clone(),
            away_team: event.away_team.clone(),
            sport_key: Some(event.sport_key.clone()).filter(|key| !key.is_empty()),
            best_odds,
        },
        all_markets,
    }
}

/// Build the list-view game of an event
pub fn build_game(event: &OddsApiEvent) -> Game {
    build_detailed_game(event).game
}
