use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::library::{
    AlbumRepository, ArtistRepository, LibraryManager, SongRepository, SongService,
};
use crate::models::{
    Album, Artist, Principal, Song, SongUpdateData, SongView, SortColumn, SortDirection,
};
use crate::policy::{Action, SongPolicy};

/// Query string of `GET /api/songs`.
#[derive(Debug, Default, Deserialize)]
pub struct SongListRequest {
    pub sort: Option<String>,
    pub order: Option<String>,
    pub own_songs_only: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SongUpdateRequest {
    #[serde(default)]
    pub songs: Vec<Uuid>,
    #[serde(default)]
    pub data: SongUpdateData,
}

/// Body of the lyrics and delete requests.
#[derive(Debug, Deserialize)]
pub struct SongIdsRequest {
    #[serde(default)]
    pub songs: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SongUpdateResponse {
    pub songs: Vec<Song>,
    pub albums: Vec<Album>,
    pub artists: Vec<Artist>,
    pub removed: u64,
}

/// Truthy values accepted for boolean query flags.
fn flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_lowercase()).as_deref(),
        Some("1" | "true" | "on" | "yes")
    )
}

fn require_ids(ids: &[Uuid]) -> Result<()> {
    if ids.is_empty() {
        return Err(Error::Validation("The songs field is required.".into()));
    }
    Ok(())
}

/// Distinct album ids referenced by `songs`.
fn album_ids(songs: &[Song]) -> Vec<i64> {
    songs
        .iter()
        .map(|s| s.album_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct artist ids referenced by `songs`, counting album artists too.
fn artist_ids(songs: &[Song]) -> Vec<i64> {
    songs
        .iter()
        .flat_map(|s| [s.artist_id, s.album_artist_id])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub struct SongController {
    song_repository: Arc<dyn SongRepository>,
    song_service: Arc<dyn SongService>,
    album_repository: Arc<dyn AlbumRepository>,
    artist_repository: Arc<dyn ArtistRepository>,
    library_manager: Arc<dyn LibraryManager>,
}

impl SongController {
    pub fn new(
        song_repository: Arc<dyn SongRepository>,
        song_service: Arc<dyn SongService>,
        album_repository: Arc<dyn AlbumRepository>,
        artist_repository: Arc<dyn ArtistRepository>,
        library_manager: Arc<dyn LibraryManager>,
    ) -> Self {
        SongController {
            song_repository,
            song_service,
            album_repository,
            artist_repository,
            library_manager,
        }
    }

    pub async fn index(
        &self,
        request: SongListRequest,
        principal: &Principal,
    ) -> Result<Json<Vec<SongView>>> {
        let sort_columns = SortColumn::parse_list(request.sort.as_deref())?;
        let sort_direction: SortDirection =
            request.order.as_deref().unwrap_or_default().parse()?;
        let own_songs_only = flag(request.own_songs_only.as_deref());

        // Nobody owns anything when nobody is asking.
        if own_songs_only && principal.is_anonymous() {
            return Ok(Json(Vec::new()));
        }

        let songs = self
            .song_repository
            .get_for_listing(&sort_columns, sort_direction, own_songs_only, principal)
            .await?;
        debug!("Listing {} song(s)", songs.len());

        Ok(Json(songs))
    }

    pub async fn show(&self, id: Uuid, principal: &Principal) -> Result<Json<SongView>> {
        let song = self
            .song_repository
            .find_one(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Song {}", id)))?;

        SongPolicy::authorize(Action::Access, &song, principal)?;

        let view = self
            .song_repository
            .get_one(id, principal)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Song {}", id)))?;

        Ok(Json(view))
    }

    pub async fn update(
        &self,
        request: SongUpdateRequest,
        principal: &Principal,
    ) -> Result<Json<SongUpdateResponse>> {
        request.data.validate()?;
        self.authorize_batch(Action::Edit, &request.songs, principal)
            .await?;

        let updated = self
            .song_service
            .update_songs(&request.songs, &request.data)
            .await?;

        let albums = self.album_repository.get_many(&album_ids(&updated)).await?;
        let artists = self
            .artist_repository
            .get_many(&artist_ids(&updated))
            .await?;
        let removed = self.library_manager.prune().await?;

        Ok(Json(SongUpdateResponse {
            songs: updated,
            albums,
            artists,
            removed,
        }))
    }

    /// Only the first requested song is handled; the rest of the list is ignored.
    ///
    /// Fetched lyrics are stored on the song, so the principal needs edit rights.
    pub async fn fetch_lyrics(
        &self,
        request: SongIdsRequest,
        principal: &Principal,
    ) -> Result<Response> {
        let Some(&id) = request.songs.first() else {
            return Err(Error::Validation("The songs field is required.".into()));
        };

        let Some(song) = self.song_repository.find_one(id).await? else {
            return Ok(StatusCode::NOT_FOUND.into_response());
        };

        SongPolicy::authorize(Action::Edit, &song, principal)?;

        let lyrics = self.song_service.fetch_lyrics(&song).await?;
        if lyrics.status.is_client_error() || lyrics.status.is_server_error() {
            warn!("Lyrics fetch for song {} returned {}", song.id, lyrics.status);
        }

        Ok((lyrics.status, Json(lyrics.payload)).into_response())
    }

    pub async fn destroy(&self, request: SongIdsRequest, principal: &Principal) -> Result<StatusCode> {
        self.authorize_batch(Action::Delete, &request.songs, principal)
            .await?;

        self.song_service.delete_songs(&request.songs).await?;
        info!("Deleted songs {:?}", request.songs);

        Ok(StatusCode::NO_CONTENT)
    }

    /// Checks every song of a batch before anything is mutated.
    ///
    /// Lookups are unscoped so a song the principal cannot see still fails
    /// authorization rather than being silently dropped.
    async fn authorize_batch(
        &self,
        action: Action,
        ids: &[Uuid],
        principal: &Principal,
    ) -> Result<()> {
        require_ids(ids)?;

        let songs = self.song_repository.find_many(ids).await?;
        let found: HashSet<Uuid> = songs.iter().map(|s| s.id).collect();
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains(id))
            .map(Uuid::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(Error::Validation(format!(
                "The selected songs are invalid: {}",
                missing.join(", ")
            )));
        }

        let violations = SongPolicy::violations(action, &songs, principal);
        if !violations.is_empty() {
            warn!(
                "Denied {:?} on {} song(s) for user {:?}",
                action,
                violations.len(),
                principal.user_id()
            );
            return Err(Error::Forbidden);
        }

        Ok(())
    }
}
