use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use odds_dashboard::data::{load_favorites, save_favorites, save_games_to_csv};
use odds_dashboard::odds_api::OddsApiClient;
use odds_dashboard::view::{build_view, DashboardQuery, SortDirection, SortOption};
use odds_dashboard::{fetch_all_dashboard_data, Config, Game};
use tracing_subscriber::EnvFilter;

const FAVORITES_FILE: &str = "favorites.json";

#[derive(Parser)]
#[command(name = "cli", about = "Sports odds dashboard from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the active sports
    Sports,
    /// Show the dashboard's games
    Games {
        /// Only show games in these category ids (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Only show games in favorite categories
        #[arg(long)]
        favorites_only: bool,
        #[arg(long, value_enum, default_value_t = SortOption::Date)]
        sort: SortOption,
        #[arg(long, value_enum, default_value_t = SortDirection::Asc)]
        direction: SortDirection,
        /// Also write the listed games to this CSV file
        #[arg(long)]
        csv: Option<String>,
    },
    /// Show every market for one game
    Game {
        game_id: String,
        #[arg(long)]
        regions: Option<String>,
    },
    /// List the popular sports' games by id
    Index,
    /// Add a category to the favorites, or remove it if already there
    Favorite { category_id: String },
    /// List the favorite categories
    Favorites {
        #[arg(long)]
        clear: bool,
    },
    /// Show the remaining API quota
    Usage,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let favorites_file = config.cache_file(FAVORITES_FILE);

    match cli.command {
        Command::Sports => {
            let client = OddsApiClient::from_config(&config)?;
            let categories = client.fetch_sports().await.context("Failed to fetch sports")?;
            println!("{} active sports:\n", categories.len());
            for category in categories {
                println!("  {:<40} {}", category.id, category.name);
            }
        }
        Command::Games {
            categories,
            favorites_only,
            sort,
            direction,
            csv,
        } => {
            let data = fetch_all_dashboard_data(&config).await?;
            let favorites = load_favorites(&favorites_file)?;
            let query = DashboardQuery {
                selected_categories: categories,
                favorites_only,
                sort,
                direction,
            };
            let view = build_view(&data.games, &data.categories, &favorites, &query);

            println!(
                "Games: {}  Categories with games: {}  Average odds: {:.2}  Favorites: {}\n",
                view.stats.total_games,
                view.stats.categories_with_games,
                view.stats.average_odds,
                view.stats.favorite_categories
            );

            if view.games.is_empty() {
                if view.filters_active {
                    println!("No games found. Try adjusting the filters.");
                } else {
                    println!("No games available right now.");
                }
            } else {
                for (i, game) in view.games.iter().enumerate() {
                    println!("{}. {}", i + 1, format_game(game));
                }
            }

            if let Some(path) = csv {
                save_games_to_csv(&view.games, &path)?;
                println!("\nSaved {} games to {}", view.games.len(), path);
            }
        }
        Command::Game { game_id, regions } => {
            let client = OddsApiClient::from_config(&config)?;
            let regions = regions.unwrap_or_else(|| config.regions.clone());
            let detailed = client.fetch_game(&game_id, &regions).await?;

            println!("{}", format_game(&detailed.game));
            for market in &detailed.all_markets {
                println!("\n{} ({})", market.display_name, market.description);
                for quote in &market.quotes {
                    let outcomes = quote
                        .outcomes
                        .iter()
                        .map(|outcome| match outcome.point {
                            Some(point) => format!("{} ({:+}) {:.2}", outcome.name, point, outcome.price),
                            None => format!("{} {:.2}", outcome.name, outcome.price),
                        })
                        .collect::<Vec<_>>()
                        .join(" | ");
                    println!("  {:<20} {}", quote.bookmaker_name, outcomes);
                }
            }
        }
        Command::Index => {
            let client = OddsApiClient::from_config(&config)?;
            let index = client.build_games_index().await;
            println!("{} games indexed:\n", index.len());
            for (id, game) in &index {
                println!("  {:<36} {} ({})", id, game.name, game.category);
            }
        }
        Command::Favorite { category_id } => {
            let mut favorites = load_favorites(&favorites_file)?;
            favorites.toggle(&category_id);
            save_favorites(&favorites, &favorites_file)?;
            if favorites.contains(&category_id) {
                println!("Added {} to favorites", category_id);
            } else {
                println!("Removed {} from favorites", category_id);
            }
        }
        Command::Favorites { clear } => {
            let mut favorites = load_favorites(&favorites_file)?;
            if clear {
                favorites.clear();
                save_favorites(&favorites, &favorites_file)?;
                println!("Cleared favorites");
            } else if favorites.is_empty() {
                println!("No favorite categories.");
            } else {
                for id in favorites.ids() {
                    println!("  {}", id);
                }
            }
        }
        Command::Usage => {
            let client = OddsApiClient::from_config(&config)?;
            let usage = client.check_usage().await?;
            let show = |value: Option<u32>| value.map_or_else(|| "unknown".to_string(), |v| v.to_string());
            println!("API Requests Remaining: {}", show(usage.remaining));
            println!("API Requests Used: {}", show(usage.used));
        }
    }

    Ok(())
}

fn format_game(game: &Game) -> String {
    let odds = if game.best_odds.is_empty() {
        "no odds".to_string()
    } else {
        game.best_odds
            .iter()
            .map(|odd| format!("{} {:.2}", odd.name, odd.value))
            .collect::<Vec<_>>()
            .join(" | ")
    };
    format!(
        "{} [{}] {} - {}",
        game.name,
        game.category,
        game.start_time.format("%Y-%m-%d %H:%M UTC"),
        odds
    )
}
