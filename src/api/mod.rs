use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::snapshot::SnapshotStore;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub snapshots: Arc<SnapshotStore>,
}

/// Build the Axum router for the read API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/api/games", get(games_handler))
        .route("/api/games/:id", get(game_handler))
        .route("/api/teams", get(teams_handler))
        .route("/api/teams/:id", get(team_handler))
        .route("/api/players", get(players_handler))
        .route("/api/players/:id", get(player_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn health_handler() -> impl IntoResponse {
    "ok"
}

#[derive(Debug, Deserialize)]
struct GamesQuery {
    date: Option<String>,
}

/// GET /api/games?date=YYYY-MM-DD — the current slate, or a stored snapshot
/// when an explicit date is asked for.
async fn games_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GamesQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match query.date {
        None => Ok(Json(state.store.list_games())),
        Some(date) => state
            .snapshots
            .read_snapshot(&date)
            .map(|snap| Json(snap.games))
            .map_err(|e| (StatusCode::NOT_FOUND, e.to_string())),
    }
}

/// GET /api/games/{id}
async fn game_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .store
        .game(&id)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("no game with id {id}")))
}

/// GET /api/teams
async fn teams_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.list_teams())
}

/// GET /api/teams/{id}
async fn team_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .store
        .team(&id)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("no team with id {id}")))
}

/// GET /api/players
async fn players_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.list_players())
}

/// GET /api/players/{id}
async fn player_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .store
        .player(&id)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("no player with id {id}")))
}
