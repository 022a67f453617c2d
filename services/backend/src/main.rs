use anyhow::Context;
use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use song_api::controllers::LyricsClient;
use song_api::db::Database;
use song_api::secrets::{Mode, SECRET_MANAGER};
use song_api::{AppState, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_target(false)
        .init();

    let database_url = SECRET_MANAGER.get("DATABASE_URL");
    if database_url.is_empty() {
        anyhow::bail!("DATABASE_URL must be set in production mode");
    }
    let max_connections = SECRET_MANAGER.get_parsed("DB_MAX_CONNECTIONS").unwrap_or(5);
    let lyrics = LyricsClient::new(&SECRET_MANAGER.get("LYRICS_BASE_URL"))?;

    let database = Database::new(&database_url, max_connections, lyrics)
        .await
        .context("Failed to connect to database")?;
    info!("📊 Connected to PostgreSQL database");

    sqlx::migrate!("./migrations")
        .run(database.pool())
        .await
        .context("Database migrations failed")?;
    info!("📊 Database migrations completed");

    let cors = match SECRET_MANAGER.mode() {
        Mode::Dev => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        Mode::Prod => CorsLayer::new()
            .allow_origin(SECRET_MANAGER.get("FRONTEND_URL").parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = create_router(AppState::from_database(database)).layer(cors);

    let port = SECRET_MANAGER.get("PORT");
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    info!("🎵 Song API listening on {}", SECRET_MANAGER.get("BACKEND_URL"));
    info!("🎵 Song endpoints: /api/songs, /api/songs/{{id}}, /api/songs/lyrics");

    axum::serve(listener, app).await?;
    Ok(())
}
