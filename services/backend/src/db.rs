use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction, postgres::PgPoolOptions};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::controllers::parser::LyricsClient;
use crate::error::Result;
use crate::library::{
    AlbumRepository, ArtistRepository, LibraryManager, LyricsResponse, SongRepository,
    SongService, UserRepository,
};
use crate::models::{
    Album, Artist, Principal, Song, SongUpdateData, SongView, SortColumn, SortDirection, User,
};

const SONG_COLUMNS: &str = "songs.id, songs.owner_id, songs.album_id, songs.artist_id, \
    albums.artist_id AS album_artist_id, songs.title, artists.name AS artist_name, \
    albums.name AS album_name, album_artists.name AS album_artist_name, songs.track, songs.disc, \
    songs.year, songs.genre, songs.length, songs.lyrics, songs.is_public, songs.created_at";

const SONG_JOINS: &str = "FROM songs \
    JOIN albums ON albums.id = songs.album_id \
    JOIN artists ON artists.id = songs.artist_id \
    JOIN artists AS album_artists ON album_artists.id = albums.artist_id";

// $1 is the principal's user id (NULL when anonymous)
const INTERACTION_COLUMNS: &str = "COALESCE(interactions.play_count, 0) AS play_count, \
    COALESCE(interactions.liked, FALSE) AS liked";

const INTERACTION_JOIN: &str = "LEFT JOIN interactions \
    ON interactions.song_id = songs.id AND interactions.user_id = $1";

fn song_view_select() -> String {
    format!(
        "SELECT {}, {} {} {}",
        SONG_COLUMNS, INTERACTION_COLUMNS, SONG_JOINS, INTERACTION_JOIN
    )
}

/// ORDER BY for a listing; song id breaks ties so the order is stable.
pub(crate) fn order_by_clause(columns: &[SortColumn], direction: SortDirection) -> String {
    let mut parts: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", c.sql(), direction.sql()))
        .collect();
    parts.push("songs.id ASC".to_string());
    format!("ORDER BY {}", parts.join(", "))
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    lyrics: LyricsClient,
}

impl Database {
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        lyrics: LyricsClient,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::from_pool(pool, lyrics))
    }

    pub fn from_pool(pool: PgPool, lyrics: LyricsClient) -> Self {
        Self { pool, lyrics }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn find_or_create_artist(
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
    ) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO artists (name) VALUES ($1)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING id",
        )
        .bind(name.trim())
        .fetch_one(&mut **tx)
        .await?;

        Ok(id)
    }

    async fn find_or_create_album(
        tx: &mut Transaction<'_, Postgres>,
        artist_id: i64,
        name: &str,
    ) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO albums (artist_id, name) VALUES ($1, $2)
             ON CONFLICT (artist_id, name) DO UPDATE SET name = EXCLUDED.name
             RETURNING id",
        )
        .bind(artist_id)
        .bind(name.trim())
        .fetch_one(&mut **tx)
        .await?;

        Ok(id)
    }

    async fn update_song(
        tx: &mut Transaction<'_, Postgres>,
        song: &Song,
        data: &SongUpdateData,
    ) -> Result<()> {
        let artist_id = match &data.artist_name {
            Some(name) => Self::find_or_create_artist(tx, name).await?,
            None => song.artist_id,
        };

        let album_id = if data.album_name.is_some() || data.album_artist_name.is_some() {
            let album_artist_id = match &data.album_artist_name {
                Some(name) => Self::find_or_create_artist(tx, name).await?,
                None => song.album_artist_id,
            };
            let album_name = data.album_name.as_deref().unwrap_or(&song.album_name);
            Self::find_or_create_album(tx, album_artist_id, album_name).await?
        } else {
            song.album_id
        };

        sqlx::query(
            "UPDATE songs SET title = $1, artist_id = $2, album_id = $3, track = $4, disc = $5,
                year = $6, genre = $7, lyrics = $8, updated_at = NOW()
             WHERE id = $9",
        )
        .bind(data.title.as_deref().map(str::trim).unwrap_or(&song.title))
        .bind(artist_id)
        .bind(album_id)
        .bind(data.track.or(song.track))
        .bind(data.disc.unwrap_or(song.disc))
        .bind(data.year.or(song.year))
        .bind(data.genre.as_deref().unwrap_or(&song.genre))
        .bind(data.lyrics.as_deref().unwrap_or(&song.lyrics))
        .bind(song.id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SongRepository for Database {
    async fn get_for_listing(
        &self,
        sort_columns: &[SortColumn],
        sort_direction: SortDirection,
        own_songs_only: bool,
        principal: &Principal,
    ) -> Result<Vec<SongView>> {
        let sql = format!(
            "{} WHERE ($2 OR songs.is_public OR songs.owner_id = $1)
               AND (NOT $3 OR songs.owner_id = $1) {}",
            song_view_select(),
            order_by_clause(sort_columns, sort_direction)
        );
        debug!("listing songs: {}", sql);

        let songs = sqlx::query_as::<_, SongView>(&sql)
            .bind(principal.user_id())
            .bind(principal.is_admin())
            .bind(own_songs_only)
            .fetch_all(&self.pool)
            .await?;

        Ok(songs)
    }

    async fn get_one(&self, id: Uuid, principal: &Principal) -> Result<Option<SongView>> {
        let sql = format!("{} WHERE songs.id = $2", song_view_select());
        let song = sqlx::query_as::<_, SongView>(&sql)
            .bind(principal.user_id())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(song)
    }

    async fn find_one(&self, id: Uuid) -> Result<Option<Song>> {
        let sql = format!("SELECT {} {} WHERE songs.id = $1", SONG_COLUMNS, SONG_JOINS);
        let song = sqlx::query_as::<_, Song>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(song)
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Song>> {
        let sql = format!(
            "SELECT {} {} WHERE songs.id = ANY($1) ORDER BY songs.title, songs.id",
            SONG_COLUMNS, SONG_JOINS
        );
        let songs = sqlx::query_as::<_, Song>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(songs)
    }
}

#[async_trait]
impl SongService for Database {
    async fn update_songs(&self, ids: &[Uuid], data: &SongUpdateData) -> Result<Vec<Song>> {
        let songs = self.find_many(ids).await?;

        let mut tx = self.pool.begin().await?;
        for song in &songs {
            Self::update_song(&mut tx, song, data).await?;
        }
        tx.commit().await?;

        info!("Updated {} song(s)", songs.len());
        self.find_many(ids).await
    }

    async fn fetch_lyrics(&self, song: &Song) -> Result<LyricsResponse> {
        let lyrics = match self.lyrics.fetch(&song.artist_name, &song.title).await {
            Ok(lyrics) => lyrics,
            Err(e) => {
                warn!("Failed fetching lyrics for song {}: {}", song.id, e);
                return Ok(LyricsResponse {
                    status: StatusCode::BAD_GATEWAY,
                    payload: json!({ "error": format!("Failed fetching {}'s lyrics", song.title) }),
                });
            }
        };

        if lyrics.is_empty() {
            return Ok(LyricsResponse {
                status: StatusCode::NOT_FOUND,
                payload: json!({ "error": format!("No lyrics found for {}", song.title) }),
            });
        }

        sqlx::query("UPDATE songs SET lyrics = $1, updated_at = NOW() WHERE id = $2")
            .bind(&lyrics)
            .bind(song.id)
            .execute(&self.pool)
            .await?;

        info!("Updated lyrics for song {}", song.id);
        Ok(LyricsResponse {
            status: StatusCode::OK,
            payload: json!({ "lyrics": lyrics }),
        })
    }

    async fn delete_songs(&self, ids: &[Uuid]) -> Result<()> {
        // interactions go with the songs (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM songs WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;

        info!("Deleted {} song(s)", result.rows_affected());
        Ok(())
    }
}

#[async_trait]
impl AlbumRepository for Database {
    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Album>> {
        let albums = sqlx::query_as::<_, Album>(
            "SELECT albums.id, albums.name, albums.artist_id, artists.name AS artist_name, albums.year
             FROM albums JOIN artists ON artists.id = albums.artist_id
             WHERE albums.id = ANY($1)
             ORDER BY albums.id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(albums)
    }
}

#[async_trait]
impl ArtistRepository for Database {
    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Artist>> {
        let artists = sqlx::query_as::<_, Artist>(
            "SELECT id, name FROM artists WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(artists)
    }
}

#[async_trait]
impl LibraryManager for Database {
    async fn prune(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let albums = sqlx::query(
            "DELETE FROM albums
             WHERE NOT EXISTS (SELECT 1 FROM songs WHERE songs.album_id = albums.id)",
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let artists = sqlx::query(
            "DELETE FROM artists
             WHERE NOT EXISTS (SELECT 1 FROM songs WHERE songs.artist_id = artists.id)
               AND NOT EXISTS (SELECT 1 FROM albums WHERE albums.artist_id = artists.id)",
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        if albums + artists > 0 {
            info!("Pruned {} album(s) and {} artist(s)", albums, artists);
        }
        Ok(albums + artists)
    }
}

#[async_trait]
impl UserRepository for Database {
    async fn find_by_token(&self, token: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, is_admin FROM users WHERE api_token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
