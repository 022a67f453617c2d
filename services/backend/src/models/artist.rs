use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, FromRow)]
pub struct Artist {
    pub id: i64,
    pub name: String,
}
