//! Database table operations

mod artist_table;
mod genre_table;
mod playlist_table;
mod song_table;
mod user_table;

pub use artist_table::{ArtistTable, NameEntry};
pub use genre_table::{GenreTable, GenreUsage};
pub use playlist_table::PlaylistTable;
pub use song_table::SongTable;
pub use user_table::UserTable;
