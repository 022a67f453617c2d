use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Error;

/// A song row joined with the names of its artist, album and album artist.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, FromRow)]
pub struct Song {
    pub id: Uuid,
    pub owner_id: i64,
    pub album_id: i64,
    pub artist_id: i64,
    pub album_artist_id: i64,
    pub title: String,
    pub artist_name: String,
    pub album_name: String,
    pub album_artist_name: String,
    pub track: Option<i32>,
    pub disc: i32,
    pub year: Option<i32>,
    pub genre: String,
    pub length: f64,
    pub lyrics: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// A song as seen by one principal.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, FromRow)]
pub struct SongView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub song: Song,
    pub play_count: i32,
    pub liked: bool,
}

/// Changes applied to every song of an update batch. `None` keeps the stored value.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct SongUpdateData {
    pub title: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub album_artist_name: Option<String>,
    pub track: Option<i32>,
    pub disc: Option<i32>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub lyrics: Option<String>,
}

impl SongUpdateData {
    pub fn validate(&self) -> Result<(), Error> {
        let names = [
            ("title", &self.title),
            ("artist_name", &self.artist_name),
            ("album_name", &self.album_name),
            ("album_artist_name", &self.album_artist_name),
        ];
        for (field, value) in names {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(Error::Validation(format!("The {} field must not be blank.", field)));
            }
        }

        if self.track.is_some_and(|t| t < 0) {
            return Err(Error::Validation("The track field must be at least 0.".into()));
        }
        if self.disc.is_some_and(|d| d < 1) {
            return Err(Error::Validation("The disc field must be at least 1.".into()));
        }
        if self.year.is_some_and(|y| !(0..=9999).contains(&y)) {
            return Err(Error::Validation("The year field must be between 0 and 9999.".into()));
        }

        Ok(())
    }
}

/// Columns a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Title,
    Track,
    Disc,
    Year,
    Genre,
    Length,
    CreatedAt,
    ArtistName,
    AlbumName,
}

impl SortColumn {
    /// Column expression used in ORDER BY.
    pub fn sql(self) -> &'static str {
        match self {
            SortColumn::Title => "songs.title",
            SortColumn::Track => "songs.track",
            SortColumn::Disc => "songs.disc",
            SortColumn::Year => "songs.year",
            SortColumn::Genre => "songs.genre",
            SortColumn::Length => "songs.length",
            SortColumn::CreatedAt => "songs.created_at",
            SortColumn::ArtistName => "artists.name",
            SortColumn::AlbumName => "albums.name",
        }
    }

    /// Parses a comma separated column list. Blank input falls back to title.
    pub fn parse_list(list: Option<&str>) -> Result<Vec<SortColumn>, Error> {
        let list = list.map(str::trim).unwrap_or_default();
        if list.is_empty() {
            return Ok(vec![SortColumn::Title]);
        }
        list.split(',').map(|c| c.trim().parse()).collect()
    }
}

impl FromStr for SortColumn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let column = s.strip_prefix("songs.").unwrap_or(s);
        match column {
            "title" => Ok(SortColumn::Title),
            "track" => Ok(SortColumn::Track),
            "disc" => Ok(SortColumn::Disc),
            "year" => Ok(SortColumn::Year),
            "genre" => Ok(SortColumn::Genre),
            "length" => Ok(SortColumn::Length),
            "created_at" => Ok(SortColumn::CreatedAt),
            "artist_name" | "artists.name" => Ok(SortColumn::ArtistName),
            "album_name" | "albums.name" => Ok(SortColumn::AlbumName),
            other => Err(Error::Validation(format!("Invalid sort column: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(Error::Validation(format!("Invalid sort order: {}", other))),
        }
    }
}
