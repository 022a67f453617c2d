use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod controllers;
pub mod db;
pub mod error;
pub mod extract;
pub mod library;
pub mod models;
pub mod policy;
pub mod routers;
pub mod secrets;

pub use error::{Error, Result};

use controllers::SongController;
use db::Database;
use library::UserRepository;
use routers::{health_check_route, song_routes};

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub songs: Arc<SongController>,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    pub fn from_database(database: Database) -> Self {
        let database = Arc::new(database);
        AppState {
            songs: Arc::new(SongController::new(
                database.clone(),
                database.clone(),
                database.clone(),
                database.clone(),
                database.clone(),
            )),
            users: database,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check_route))
        .merge(song_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
