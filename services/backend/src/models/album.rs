use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, FromRow)]
pub struct Album {
    pub id: i64,
    pub name: String,
    pub artist_id: i64,
    pub artist_name: String,
    pub year: Option<i32>,
}
