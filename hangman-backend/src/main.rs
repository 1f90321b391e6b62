use std::path::Path;
use std::sync::Arc;

use anatomy_utils::{Card, Category, Difficulty, Language};
use axum::{
    Router,
    extract::{Json, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use hangman_engine::{
    AttemptLog, AttemptRecord, CardRepository, DeckStep, EngineError, SessionEngine,
};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

mod store;

use store::{SeedCard, SqliteStore};

struct AppState {
    engine: SessionEngine,
    store: SqliteStore,
}

#[derive(Debug, Deserialize)]
struct StartGameRequest {
    category: Category,
}

#[derive(Debug, Serialize)]
struct StartGameResponse {
    game_id: Uuid,
    total: usize,
    card: Card,
    finished: bool,
    message: String,
}

#[derive(Debug, Deserialize)]
struct GameIdRequest {
    game_id: Uuid,
}

#[derive(Debug, Serialize)]
struct NextCardResponse {
    card: Option<Card>,
    finished: bool,
    remaining: usize,
    message: String,
}

#[derive(Debug, Deserialize)]
struct LogAttemptRequest {
    user_id: i64,
    card_id: i64,
    is_won: bool,
    category: Category,
    language: Language,
    difficulty: Difficulty,
    wrong_count: u32,
    max_wrong: u32,
}

#[derive(Debug, Deserialize)]
struct RandomCardQuery {
    category: Category,
}

fn engine_status(err: EngineError) -> StatusCode {
    match err {
        EngineError::EmptyDeck(_) | EngineError::UnknownSession(_) => {
            log::warn!("{err}");
            StatusCode::NOT_FOUND
        }
        EngineError::Repository(_) => {
            log::error!("{err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn start_game(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartGameRequest>,
) -> Result<Json<StartGameResponse>, StatusCode> {
    let started = state
        .engine
        .create_session(request.category, &state.store)
        .map_err(engine_status)?;

    Ok(Json(StartGameResponse {
        game_id: started.session_id,
        total: started.total,
        card: started.card,
        finished: false,
        message: "Game started.".to_string(),
    }))
}

async fn next_card(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GameIdRequest>,
) -> Result<Json<NextCardResponse>, StatusCode> {
    match state.engine.advance(request.game_id).map_err(engine_status)? {
        DeckStep::Card(current) => Ok(Json(NextCardResponse {
            card: Some(current.card),
            finished: false,
            remaining: current.remaining,
            message: "New card.".to_string(),
        })),
        DeckStep::Finished => Ok(Json(NextCardResponse {
            card: None,
            finished: true,
            remaining: 0,
            message: "You reached the end. Restart from the beginning?".to_string(),
        })),
    }
}

async fn reset_game(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GameIdRequest>,
) -> Result<Json<NextCardResponse>, StatusCode> {
    let current = state.engine.restart(request.game_id).map_err(engine_status)?;

    Ok(Json(NextCardResponse {
        card: Some(current.card),
        finished: false,
        remaining: current.remaining,
        message: "Starting over from the top.".to_string(),
    }))
}

async fn end_game(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GameIdRequest>,
) -> StatusCode {
    state.engine.end(request.game_id);
    StatusCode::NO_CONTENT
}

async fn log_attempt(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LogAttemptRequest>,
) -> Result<StatusCode, StatusCode> {
    let record = AttemptRecord {
        user_id: request.user_id,
        card_id: request.card_id,
        won: request.is_won,
        category: request.category,
        language: request.language,
        difficulty: request.difficulty,
        wrong_count: request.wrong_count,
        max_wrong: request.max_wrong,
    };

    state.store.record(&record).map_err(|err| {
        log::error!("{err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(StatusCode::NO_CONTENT)
}

async fn random_card(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RandomCardQuery>,
) -> Result<Json<Card>, StatusCode> {
    match state.store.random_card(query.category) {
        Ok(Some(card)) => Ok(Json(card)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(err) => {
            log::error!("random card draw failed: {err}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn seed_if_empty(store: &SqliteStore, seed_path: &str) {
    match store.card_count() {
        Ok(0) => {}
        Ok(count) => {
            log::info!("card store already holds {count} cards, skipping seed");
            return;
        }
        Err(err) => {
            log::error!("could not inspect card store: {err}");
            return;
        }
    }

    let seeded = std::fs::read_to_string(seed_path)
        .map_err(|err| err.to_string())
        .and_then(|raw| {
            serde_json::from_str::<Vec<SeedCard>>(&raw).map_err(|err| err.to_string())
        })
        .and_then(|cards| store.seed_cards(&cards).map_err(|err| err.to_string()));

    match seeded {
        Ok(count) => log::info!("seeded {count} cards from {seed_path}"),
        Err(err) => log::error!("seeding from {seed_path} failed: {err}"),
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let db_path = std::env::var("HANGMAN_DB").unwrap_or_else(|_| "hangman.db".to_string());
    let store = SqliteStore::open(Path::new(&db_path)).expect("failed to open the card database");

    if let Ok(seed_path) = std::env::var("HANGMAN_SEED") {
        seed_if_empty(&store, &seed_path);
    }

    let state = Arc::new(AppState {
        engine: SessionEngine::new(),
        store,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(|| async { "hangman backend is up" }))
        .route("/game/start", post(start_game))
        .route("/game/next", post(next_card))
        .route("/game/reset", post(reset_game))
        .route("/game/end", post(end_game))
        .route("/game/attempt", post(log_attempt))
        .route("/game/random-card", get(random_card))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state);

    let addr = std::env::var("HANGMAN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    log::info!("listening on {addr}");
    axum::serve(listener, app).await.unwrap();
}
