//! Local stand-in for The Odds API, used by async tests.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub(crate) const TEST_API_KEY: &str = "test-key";

pub(crate) struct MockUpstream {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl MockUpstream {
    /// Number of requests the mock has served
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub(crate) async fn spawn_mock_upstream() -> MockUpstream {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/v4/sports", get(sports))
        .route("/v4/sports/:sport_key/odds", get(odds))
        .with_state(Arc::clone(&hits));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream {
        base_url: format!("http://{}/v4", addr),
        hits,
    }
}

fn authorized(params: &HashMap<String, String>) -> Result<(), Response> {
    if params.get("apiKey").map(String::as_str) == Some(TEST_API_KEY) {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "API key is not valid" })),
        )
            .into_response())
    }
}

async fn sports(
    State(hits): State<Arc<AtomicUsize>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    if let Err(response) = authorized(&params) {
        return response;
    }

    let mut headers = HeaderMap::new();
    headers.insert("x-requests-remaining", HeaderValue::from_static("480"));
    headers.insert("x-requests-used", HeaderValue::from_static("20"));

    (headers, Json(sports_fixture())).into_response()
}

async fn odds(
    State(hits): State<Arc<AtomicUsize>>,
    Path(sport_key): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    if let Err(response) = authorized(&params) {
        return response;
    }

    let market = params.get("markets").map(String::as_str).unwrap_or("h2h");
    match sport_key.as_str() {
        "basketball_nba" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "upstream exploded" })),
        )
            .into_response(),
        "soccer_epl" => Json(epl_fixture(market)).into_response(),
        "soccer_brazil_campeonato" if market == "h2h" => Json(brazil_fixture()).into_response(),
        "tennis_atp" if market == "totals" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "totals unavailable" })),
        )
            .into_response(),
        "tennis_atp" => Json(atp_fixture(market)).into_response(),
        _ => Json(json!([])).into_response(),
    }
}

pub(crate) fn sports_fixture() -> Value {
    json!([
        {"key": "soccer_epl", "group": "Soccer", "title": "EPL", "description": "English Premier League", "active": true, "has_outrights": false},
        {"key": "soccer_brazil_campeonato", "group": "Soccer", "title": "Brazil Série A", "description": "Brasileirão", "active": true, "has_outrights": false},
        {"key": "soccer_spain_la_liga", "group": "Soccer", "title": "La Liga - Spain", "description": "Spanish La Liga", "active": true, "has_outrights": false},
        {"key": "basketball_nba", "group": "Basketball", "title": "NBA", "description": "US Basketball", "active": true, "has_outrights": false},
        {"key": "soccer_england_efl_cup", "group": "Soccer", "title": "EFL Cup", "description": "League Cup", "active": false, "has_outrights": false}
    ])
}

fn outcome(name: &str, price: f64) -> Value {
    json!({ "name": name, "price": price })
}

fn bookmaker(key: &str, title: &str, markets: Vec<Value>) -> Value {
    json!({ "key": key, "title": title, "last_update": "2030-08-01T12:00:00Z", "markets": markets })
}

fn event(id: &str, sport: (&str, &str), teams: (&str, &str), commence: &str, bookmakers: Vec<Value>) -> Value {
    json!({
        "id": id,
        "sport_key": sport.0,
        "sport_title": sport.1,
        "commence_time": commence,
        "home_team": teams.0,
        "away_team": teams.1,
        "bookmakers": bookmakers
    })
}

fn epl_fixture(market: &str) -> Value {
    let epl = ("soccer_epl", "EPL");
    match market {
        "spreads" => json!([event(
            "evt_epl_1",
            epl,
            ("Arsenal", "Chelsea"),
            "2030-08-02T15:00:00Z",
            vec![
                bookmaker("book_a", "Book A", vec![json!({"key": "spreads", "outcomes": [
                    {"name": "Arsenal", "price": 1.95, "point": -0.5},
                    {"name": "Chelsea", "price": 1.85, "point": 0.5}
                ]})]),
                bookmaker("book_c", "Book C", vec![json!({"key": "spreads", "outcomes": [
                    {"name": "Arsenal", "price": 2.0, "point": -0.5},
                    {"name": "Chelsea", "price": 1.8, "point": 0.5}
                ]})]),
            ],
        )]),
        "totals" => json!([event(
            "evt_epl_1",
            epl,
            ("Arsenal", "Chelsea"),
            "2030-08-02T15:00:00Z",
            vec![bookmaker("book_b", "Book B", vec![json!({"key": "totals", "outcomes": [
                {"name": "Over", "price": 1.9, "point": 2.5},
                {"name": "Under", "price": 1.9, "point": 2.5}
            ]})])],
        )]),
        _ => json!([
            event(
                "evt_epl_1",
                epl,
                ("Arsenal", "Chelsea"),
                "2030-08-02T15:00:00Z",
                vec![
                    bookmaker("book_a", "Book A", vec![json!({"key": "h2h", "outcomes": [
                        outcome("Arsenal", 2.1), outcome("Draw", 3.2), outcome("Chelsea", 3.5)
                    ]})]),
                    bookmaker("book_b", "Book B", vec![json!({"key": "h2h", "outcomes": [
                        outcome("Arsenal", 1.9), outcome("Draw", 3.4), outcome("Chelsea", 4.0)
                    ]})]),
                ],
            ),
            event(
                "evt_epl_2",
                epl,
                ("Liverpool", "Everton"),
                "2030-08-01T15:00:00Z",
                vec![bookmaker("book_a", "Book A", vec![json!({"key": "h2h", "outcomes": [
                    outcome("Liverpool", 1.5), outcome("Draw", 4.2), outcome("Everton", 6.0)
                ]})])],
            ),
        ]),
    }
}

fn brazil_fixture() -> Value {
    json!([
        { "id": "broken", "sport_title": "Brazil Série A" },
        {
            "id": "evt_bra_1",
            "sport_title": "Brazil Série A",
            "commence_time": "2030-08-03T20:00:00Z",
            "home_team": "Flamengo",
            "away_team": "Palmeiras",
            "bookmakers": [bookmaker("book_a", "Book A", vec![json!({"key": "h2h", "outcomes": [
                outcome("Flamengo", 2.4), outcome("Draw", 3.1), outcome("Palmeiras", 2.9)
            ]})])]
        }
    ])
}

/// One match whose `totals` request fails upstream
fn atp_fixture(market: &str) -> Value {
    let outcomes = match market {
        "spreads" => json!([
            {"name": "Alcaraz", "price": 1.8, "point": -3.5},
            {"name": "Sinner", "price": 2.0, "point": 3.5}
        ]),
        _ => json!([outcome("Alcaraz", 1.7), outcome("Sinner", 2.2)]),
    };
    json!([event(
        "evt_atp_1",
        ("tennis_atp", "ATP"),
        ("Alcaraz", "Sinner"),
        "2030-08-04T12:00:00Z",
        vec![bookmaker("book_a", "Book A", vec![json!({"key": market, "outcomes": outcomes})])],
    )])
}
