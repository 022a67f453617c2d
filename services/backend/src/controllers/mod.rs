pub mod parser;
pub mod root;
pub mod song;
pub use parser::LyricsClient;
pub use root::RootController;
pub use song::SongController;
