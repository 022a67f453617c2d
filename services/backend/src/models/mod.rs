pub mod album;
pub mod artist;
pub mod song;
pub mod user;

pub use album::Album;
pub use artist::Artist;
pub use song::{Song, SongUpdateData, SongView, SortColumn, SortDirection};
pub use user::{Principal, User};
