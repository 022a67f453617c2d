use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use uuid::Uuid;

use crate::AppState;
use crate::controllers::song::{
    SongIdsRequest, SongListRequest, SongUpdateRequest, SongUpdateResponse,
};
use crate::error::Result;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::{Principal, SongView};

pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/songs",
            get(song_list_route)
                .put(song_update_route)
                .delete(song_destroy_route),
        )
        .route("/api/songs/lyrics", post(song_lyrics_route))
        .route("/api/songs/{id}", get(song_show_route))
}

pub async fn song_list_route(
    State(state): State<AppState>,
    principal: Principal,
    ApiQuery(request): ApiQuery<SongListRequest>,
) -> Result<Json<Vec<SongView>>> {
    state.songs.index(request, &principal).await
}

pub async fn song_show_route(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<SongView>> {
    state.songs.show(id, &principal).await
}

pub async fn song_update_route(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(request): ApiJson<SongUpdateRequest>,
) -> Result<Json<SongUpdateResponse>> {
    state.songs.update(request, &principal).await
}

pub async fn song_lyrics_route(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(request): ApiJson<SongIdsRequest>,
) -> Result<Response> {
    state.songs.fetch_lyrics(request, &principal).await
}

pub async fn song_destroy_route(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(request): ApiJson<SongIdsRequest>,
) -> Result<StatusCode> {
    state.songs.destroy(request, &principal).await
}
