//! Collaborators the song controller dispatches onto.
//!
//! `db::Database` implements all of them against PostgreSQL; tests plug in
//! in-memory versions.

use async_trait::async_trait;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Album, Artist, Principal, Song, SongUpdateData, SongView, SortColumn, SortDirection, User,
};

/// Status and body produced by a lyrics fetch, forwarded to the client as is.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricsResponse {
    pub status: StatusCode,
    pub payload: serde_json::Value,
}

#[async_trait]
pub trait SongRepository: Send + Sync {
    /// Songs visible to `principal`, ordered by `sort_columns` in `sort_direction`.
    async fn get_for_listing(
        &self,
        sort_columns: &[SortColumn],
        sort_direction: SortDirection,
        own_songs_only: bool,
        principal: &Principal,
    ) -> Result<Vec<SongView>>;

    /// One song with the principal's play count and like status.
    async fn get_one(&self, id: Uuid, principal: &Principal) -> Result<Option<SongView>>;

    async fn find_one(&self, id: Uuid) -> Result<Option<Song>>;

    /// Unscoped lookup; ids that do not exist are skipped.
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Song>>;
}

#[async_trait]
pub trait SongService: Send + Sync {
    async fn update_songs(&self, ids: &[Uuid], data: &SongUpdateData) -> Result<Vec<Song>>;

    async fn fetch_lyrics(&self, song: &Song) -> Result<LyricsResponse>;

    async fn delete_songs(&self, ids: &[Uuid]) -> Result<()>;
}

#[async_trait]
pub trait AlbumRepository: Send + Sync {
    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Album>>;
}

#[async_trait]
pub trait ArtistRepository: Send + Sync {
    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Artist>>;
}

#[async_trait]
pub trait LibraryManager: Send + Sync {
    /// Removes albums and artists no song refers to any more and returns how many went.
    async fn prune(&self) -> Result<u64>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_token(&self, token: &str) -> Result<Option<User>>;
}
