//! Playlist model

use serde::{Deserialize, Serialize};

/// A playlist owned by a user
///
/// Song membership is an ordered sequence; position is the index into
/// `song_ids`. An optional artist link marks curated artist showcases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    /// Owning user account
    pub owner_user_id: i64,
    /// Showcase link to an artist, when this is an artist playlist
    #[serde(default)]
    pub artist_id: Option<i64>,
    #[serde(default)]
    pub featured: bool,
    /// Ordered song references
    #[serde(default)]
    pub song_ids: Vec<i64>,
    #[serde(default)]
    pub created_at: i64,
}

impl Playlist {
    pub fn new(name: String, owner_user_id: i64) -> Self {
        Self {
            id: 0,
            name,
            owner_user_id,
            artist_id: None,
            featured: false,
            song_ids: Vec::new(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn contains_song(&self, song_id: i64) -> bool {
        self.song_ids.contains(&song_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_membership() {
        let mut p = Playlist::new("Mix".into(), 1);
        p.song_ids = vec![3, 1, 2];
        assert!(p.contains_song(1));
        assert!(!p.contains_song(9));
        // order is positional, not sorted
        assert_eq!(p.song_ids, vec![3, 1, 2]);
    }
}
