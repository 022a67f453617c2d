//! In-memory collaborators and request helpers for the song API tests.

#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use song_api::controllers::SongController;
use song_api::library::{
    AlbumRepository, ArtistRepository, LibraryManager, LyricsResponse, SongRepository,
    SongService, UserRepository,
};
use song_api::models::{
    Album, Artist, Principal, Song, SongUpdateData, SongView, SortColumn, SortDirection, User,
};
use song_api::policy::{Action, SongPolicy};
use song_api::{AppState, Result, create_router};

pub const ADMIN: i64 = 1;
pub const ALICE: i64 = 2;
pub const BOB: i64 = 3;

pub const ARTIST_1: i64 = 10;
pub const ARTIST_2: i64 = 11;
pub const VARIOUS: i64 = 12;

pub const ALBUM_1: i64 = 100;
pub const ALBUM_2: i64 = 101;
pub const COMPILATION: i64 = 102;

pub fn song_id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

/// Alice's private song on album 1 by artist 1.
pub fn alice_private() -> Uuid {
    song_id(1)
}

/// Alice's public song on album 2 by artist 2.
pub fn alice_public() -> Uuid {
    song_id(2)
}

/// Bob's private song on the compilation, performed by artist 1.
pub fn bob_private() -> Uuid {
    song_id(3)
}

/// Bob's public song on album 2 by artist 2.
pub fn bob_public() -> Uuid {
    song_id(4)
}

/// A collaborator call, recorded in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetForListing {
        sort_columns: Vec<SortColumn>,
        sort_direction: SortDirection,
        own_songs_only: bool,
        user_id: Option<i64>,
    },
    GetOne(Uuid),
    FindOne(Uuid),
    FindMany(Vec<Uuid>),
    UpdateSongs(Vec<Uuid>),
    FetchLyrics(Uuid),
    DeleteSongs(Vec<Uuid>),
    GetAlbums(Vec<i64>),
    GetArtists(Vec<i64>),
    Prune,
}

struct LibraryState {
    songs: Vec<Song>,
    albums: Vec<Album>,
    artists: Vec<Artist>,
    users: HashMap<String, User>,
    interactions: HashMap<(i64, Uuid), (i32, bool)>,
    lyrics: LyricsResponse,
    prune_result: u64,
    calls: Vec<Call>,
}

/// Implements every collaborator over a fixed fixture library.
pub struct InMemoryLibrary {
    state: Mutex<LibraryState>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        let users = [
            ("admin-token", User { id: ADMIN, name: "Admin".into(), is_admin: true }),
            ("alice-token", User { id: ALICE, name: "Alice".into(), is_admin: false }),
            ("bob-token", User { id: BOB, name: "Bob".into(), is_admin: false }),
        ]
        .into_iter()
        .map(|(token, user)| (token.to_string(), user))
        .collect();

        let artists = vec![
            Artist { id: ARTIST_1, name: "Artist One".into() },
            Artist { id: ARTIST_2, name: "Artist Two".into() },
            Artist { id: VARIOUS, name: "Various Artists".into() },
        ];
        let albums = vec![
            album(ALBUM_1, "Album One", ARTIST_1, "Artist One"),
            album(ALBUM_2, "Album Two", ARTIST_2, "Artist Two"),
            album(COMPILATION, "Hits", VARIOUS, "Various Artists"),
        ];

        let songs = vec![
            song(alice_private(), ALICE, "Bravo", (ALBUM_1, "Album One"), (ARTIST_1, "Artist One"), (ARTIST_1, "Artist One"), false, 2001),
            song(alice_public(), ALICE, "Alpha", (ALBUM_2, "Album Two"), (ARTIST_2, "Artist Two"), (ARTIST_2, "Artist Two"), true, 1999),
            song(bob_private(), BOB, "Charlie", (COMPILATION, "Hits"), (ARTIST_1, "Artist One"), (VARIOUS, "Various Artists"), false, 2010),
            song(bob_public(), BOB, "Delta", (ALBUM_2, "Album Two"), (ARTIST_2, "Artist Two"), (ARTIST_2, "Artist Two"), true, 1999),
        ];

        let mut interactions = HashMap::new();
        interactions.insert((ALICE, alice_private()), (7, true));

        InMemoryLibrary {
            state: Mutex::new(LibraryState {
                songs,
                albums,
                artists,
                users,
                interactions,
                lyrics: LyricsResponse {
                    status: StatusCode::OK,
                    payload: serde_json::json!({ "lyrics": "la la la" }),
                },
                prune_result: 0,
                calls: Vec::new(),
            }),
        }
    }

    pub fn with_lyrics(self, status: StatusCode, payload: Value) -> Self {
        self.state.lock().unwrap().lyrics = LyricsResponse { status, payload };
        self
    }

    pub fn with_prune_result(self, removed: u64) -> Self {
        self.state.lock().unwrap().prune_result = removed;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn song(&self, id: Uuid) -> Option<Song> {
        self.state.lock().unwrap().songs.iter().find(|s| s.id == id).cloned()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn view(state: &LibraryState, song: &Song, principal: &Principal) -> SongView {
        let (play_count, liked) = principal
            .user_id()
            .and_then(|uid| state.interactions.get(&(uid, song.id)).copied())
            .unwrap_or((0, false));
        SongView {
            song: song.clone(),
            play_count,
            liked,
        }
    }
}

fn album(id: i64, name: &str, artist_id: i64, artist_name: &str) -> Album {
    Album {
        id,
        name: name.into(),
        artist_id,
        artist_name: artist_name.into(),
        year: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn song(
    id: Uuid,
    owner_id: i64,
    title: &str,
    (album_id, album_name): (i64, &str),
    (artist_id, artist_name): (i64, &str),
    (album_artist_id, album_artist_name): (i64, &str),
    is_public: bool,
    year: i32,
) -> Song {
    Song {
        id,
        owner_id,
        album_id,
        artist_id,
        album_artist_id,
        title: title.into(),
        artist_name: artist_name.into(),
        album_name: album_name.into(),
        album_artist_name: album_artist_name.into(),
        track: None,
        disc: 1,
        year: Some(year),
        genre: String::new(),
        length: 180.0,
        lyrics: String::new(),
        is_public,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn compare(a: &Song, b: &Song, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Title => a.title.cmp(&b.title),
        SortColumn::Track => a.track.cmp(&b.track),
        SortColumn::Disc => a.disc.cmp(&b.disc),
        SortColumn::Year => a.year.cmp(&b.year),
        SortColumn::Genre => a.genre.cmp(&b.genre),
        SortColumn::Length => a.length.total_cmp(&b.length),
        SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
        SortColumn::ArtistName => a.artist_name.cmp(&b.artist_name),
        SortColumn::AlbumName => a.album_name.cmp(&b.album_name),
    }
}

#[async_trait]
impl SongRepository for InMemoryLibrary {
    async fn get_for_listing(
        &self,
        sort_columns: &[SortColumn],
        sort_direction: SortDirection,
        own_songs_only: bool,
        principal: &Principal,
    ) -> Result<Vec<SongView>> {
        self.record(Call::GetForListing {
            sort_columns: sort_columns.to_vec(),
            sort_direction,
            own_songs_only,
            user_id: principal.user_id(),
        });

        let state = self.state.lock().unwrap();
        let mut songs: Vec<&Song> = state
            .songs
            .iter()
            .filter(|s| SongPolicy::allows(Action::Access, s, principal))
            .filter(|s| !own_songs_only || Some(s.owner_id) == principal.user_id())
            .collect();

        songs.sort_by(|a, b| {
            let ordering = sort_columns
                .iter()
                .map(|c| compare(a, b, *c))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal);
            let ordering = match sort_direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            ordering.then(a.id.cmp(&b.id))
        });

        Ok(songs
            .into_iter()
            .map(|s| Self::view(&state, s, principal))
            .collect())
    }

    async fn get_one(&self, id: Uuid, principal: &Principal) -> Result<Option<SongView>> {
        self.record(Call::GetOne(id));
        let state = self.state.lock().unwrap();
        Ok(state
            .songs
            .iter()
            .find(|s| s.id == id)
            .map(|s| Self::view(&state, s, principal)))
    }

    async fn find_one(&self, id: Uuid) -> Result<Option<Song>> {
        self.record(Call::FindOne(id));
        Ok(self.song(id))
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Song>> {
        self.record(Call::FindMany(ids.to_vec()));
        let state = self.state.lock().unwrap();
        Ok(state
            .songs
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SongService for InMemoryLibrary {
    async fn update_songs(&self, ids: &[Uuid], data: &SongUpdateData) -> Result<Vec<Song>> {
        self.record(Call::UpdateSongs(ids.to_vec()));
        let mut state = self.state.lock().unwrap();

        let artist = match &data.artist_name {
            Some(name) => match state.artists.iter().find(|a| &a.name == name).cloned() {
                Some(artist) => Some(artist),
                None => {
                    let artist = Artist {
                        id: state.artists.iter().map(|a| a.id).max().unwrap_or(0) + 1,
                        name: name.clone(),
                    };
                    state.artists.push(artist.clone());
                    Some(artist)
                }
            },
            None => None,
        };

        let mut updated = Vec::new();
        for song in state.songs.iter_mut().filter(|s| ids.contains(&s.id)) {
            if let Some(title) = &data.title {
                song.title = title.clone();
            }
            if let Some(lyrics) = &data.lyrics {
                song.lyrics = lyrics.clone();
            }
            if let Some(artist) = &artist {
                song.artist_id = artist.id;
                song.artist_name = artist.name.clone();
            }
            updated.push(song.clone());
        }

        Ok(updated)
    }

    async fn fetch_lyrics(&self, song: &Song) -> Result<LyricsResponse> {
        self.record(Call::FetchLyrics(song.id));
        Ok(self.state.lock().unwrap().lyrics.clone())
    }

    async fn delete_songs(&self, ids: &[Uuid]) -> Result<()> {
        self.record(Call::DeleteSongs(ids.to_vec()));
        self.state
            .lock()
            .unwrap()
            .songs
            .retain(|s| !ids.contains(&s.id));
        Ok(())
    }
}

#[async_trait]
impl AlbumRepository for InMemoryLibrary {
    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Album>> {
        self.record(Call::GetAlbums(ids.to_vec()));
        let state = self.state.lock().unwrap();
        Ok(state
            .albums
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ArtistRepository for InMemoryLibrary {
    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Artist>> {
        self.record(Call::GetArtists(ids.to_vec()));
        let state = self.state.lock().unwrap();
        Ok(state
            .artists
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LibraryManager for InMemoryLibrary {
    async fn prune(&self) -> Result<u64> {
        self.record(Call::Prune);
        Ok(self.state.lock().unwrap().prune_result)
    }
}

#[async_trait]
impl UserRepository for InMemoryLibrary {
    async fn find_by_token(&self, token: &str) -> Result<Option<User>> {
        Ok(self.state.lock().unwrap().users.get(token).cloned())
    }
}

/// Builds the router over `library`.
pub fn setup_test_server(library: Arc<InMemoryLibrary>) -> axum::Router {
    let state = AppState {
        songs: Arc::new(SongController::new(
            library.clone(),
            library.clone(),
            library.clone(),
            library.clone(),
            library.clone(),
        )),
        users: library,
    };
    create_router(state)
}

/// Sends one request and returns the status with the JSON body, if any.
pub async fn make_request(
    app: &axum::Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<Value>) {
    let mut request = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(json_body) => request
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json_body = if body.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&body).unwrap())
    };

    (status, json_body)
}

/// Ids of the songs in a JSON array response.
pub fn ids_of(songs: &Value) -> Vec<String> {
    songs
        .as_array()
        .expect("expected an array of songs")
        .iter()
        .map(|s| s["id"].as_str().unwrap().to_string())
        .collect()
}
