//! Song model

use serde::{Deserialize, Serialize};

/// Publication status of a song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongStatus {
    Draft,
    Published,
    Archived,
}

impl SongStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SongStatus::Draft => "draft",
            SongStatus::Published => "published",
            SongStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(SongStatus::Draft),
            "published" => Some(SongStatus::Published),
            "archived" => Some(SongStatus::Archived),
            _ => None,
        }
    }
}

impl Default for SongStatus {
    fn default() -> Self {
        SongStatus::Draft
    }
}

/// A song, owned by exactly one artist
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    /// Owning artist. The column has existed under both `artistId` and
    /// `artist_id` spellings; both are treated as this one attribute.
    pub artist_id: i64,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub status: SongStatus,
    /// Duration in whole seconds; 0 when the source value was missing
    #[serde(default)]
    pub duration_seconds: i64,
    /// Genre names. Stored as a JSON array; the legacy delimited-string
    /// form is accepted on import only.
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub created_at: i64,
}

impl Song {
    pub fn new(title: String, artist_id: i64) -> Self {
        Self {
            id: 0,
            title,
            artist_id,
            featured: false,
            status: SongStatus::Draft,
            duration_seconds: 0,
            genres: Vec::new(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Whether this song references the given genre name (case-insensitive)
    pub fn has_genre(&self, name: &str) -> bool {
        let key = name.trim().to_lowercase();
        self.genres.iter().any(|g| g.trim().to_lowercase() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in [SongStatus::Draft, SongStatus::Published, SongStatus::Archived] {
            assert_eq!(SongStatus::from_str(s.as_str()), Some(s));
        }
        assert_eq!(SongStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_has_genre_is_case_insensitive() {
        let mut song = Song::new("T".into(), 1);
        song.genres = vec!["Indie Rock".to_string()];
        assert!(song.has_genre("indie rock"));
        assert!(!song.has_genre("jazz"));
    }
}
