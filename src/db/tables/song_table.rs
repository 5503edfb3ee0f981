//! Song table operations

use sqlx::{FromRow, SqlitePool};

use crate::errors::AppError;
use crate::models::{Page, Song, SongStatus};

/// Database row for song table
#[derive(Debug, FromRow)]
struct SongRow {
    id: i64,
    title: String,
    artist_id: i64,
    featured: i64,
    status: String,
    duration_seconds: i64,
    genres: String,
    created_at: i64,
}

impl SongRow {
    fn into_song(self) -> Song {
        let genres: Vec<String> = serde_json::from_str(&self.genres).unwrap_or_default();
        Song {
            id: self.id,
            title: self.title,
            artist_id: self.artist_id,
            featured: self.featured != 0,
            status: SongStatus::from_str(&self.status).unwrap_or_default(),
            duration_seconds: self.duration_seconds,
            genres,
            created_at: self.created_at,
        }
    }
}

/// Song table operations
pub struct SongTable;

impl SongTable {
    /// Get a page of songs
    pub async fn list(pool: &SqlitePool, page: i64, page_size: i64) -> Result<Page<Song>, AppError> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM song")
            .fetch_one(pool)
            .await?;

        let rows: Vec<SongRow> = sqlx::query_as("SELECT * FROM song ORDER BY id LIMIT ? OFFSET ?")
            .bind(page_size)
            .bind(page.saturating_sub(1).max(0).saturating_mul(page_size))
            .fetch_all(pool)
            .await?;

        Ok(Page {
            items: rows.into_iter().map(|r| r.into_song()).collect(),
            total: total.0,
        })
    }

    /// Get song by ID
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Song>, AppError> {
        let row: Option<SongRow> = sqlx::query_as("SELECT * FROM song WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| r.into_song()))
    }

    /// Get all songs (used by the genre-usage audit)
    pub async fn all(pool: &SqlitePool) -> Result<Vec<Song>, AppError> {
        let rows: Vec<SongRow> = sqlx::query_as("SELECT * FROM song").fetch_all(pool).await?;
        Ok(rows.into_iter().map(|r| r.into_song()).collect())
    }

    /// Get all featured songs
    pub async fn featured(pool: &SqlitePool) -> Result<Vec<Song>, AppError> {
        let rows: Vec<SongRow> =
            sqlx::query_as("SELECT * FROM song WHERE featured = 1 ORDER BY title COLLATE NOCASE")
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(|r| r.into_song()).collect())
    }

    /// Insert a song. The owning artist must exist.
    pub async fn insert(pool: &SqlitePool, song: &Song) -> Result<i64, AppError> {
        Self::require_artist(pool, song.artist_id).await?;

        let genres = serde_json::to_string(&song.genres).map_err(anyhow::Error::from)?;

        let result = sqlx::query(
            "INSERT INTO song (title, artist_id, featured, status, duration_seconds, genres, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(song.title.trim())
        .bind(song.artist_id)
        .bind(song.featured as i64)
        .bind(song.status.as_str())
        .bind(song.duration_seconds)
        .bind(&genres)
        .bind(song.created_at)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Update a song. The owning artist must exist.
    pub async fn update(pool: &SqlitePool, song: &Song) -> Result<(), AppError> {
        Self::require_artist(pool, song.artist_id).await?;

        let genres = serde_json::to_string(&song.genres).map_err(anyhow::Error::from)?;

        let result = sqlx::query(
            "UPDATE song SET title = ?, artist_id = ?, featured = ?, status = ?, \
             duration_seconds = ?, genres = ? WHERE id = ?",
        )
        .bind(song.title.trim())
        .bind(song.artist_id)
        .bind(song.featured as i64)
        .bind(song.status.as_str())
        .bind(song.duration_seconds)
        .bind(&genres)
        .bind(song.id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Song {} not found", song.id)));
        }

        Ok(())
    }

    /// Write the featured flag
    pub async fn set_featured(pool: &SqlitePool, id: i64, featured: bool) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE song SET featured = ? WHERE id = ?")
            .bind(featured as i64)
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Song {} not found", id)));
        }

        Ok(())
    }

    /// Delete a song. Blocked while any playlist still lists it.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
        let playlists = Self::playlists_containing(pool, id).await?;
        if !playlists.is_empty() {
            return Err(AppError::conflict(format!(
                "Song {} appears in {} playlist(s) (e.g. playlist {})",
                id,
                playlists.len(),
                playlists[0]
            )));
        }

        let result = sqlx::query("DELETE FROM song WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Song {} not found", id)));
        }

        Ok(())
    }

    async fn require_artist(pool: &SqlitePool, artist_id: i64) -> Result<(), AppError> {
        let artist: Option<(i64,)> = sqlx::query_as("SELECT id FROM artist WHERE id = ?")
            .bind(artist_id)
            .fetch_optional(pool)
            .await?;
        if artist.is_none() {
            return Err(AppError::not_found(format!("Artist {} not found", artist_id)));
        }
        Ok(())
    }

    /// IDs of playlists whose membership includes `song_id`
    async fn playlists_containing(pool: &SqlitePool, song_id: i64) -> Result<Vec<i64>, AppError> {
        let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, song_ids FROM playlist")
            .fetch_all(pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter(|(_, ids)| {
                serde_json::from_str::<Vec<i64>>(ids)
                    .map(|ids| ids.contains(&song_id))
                    .unwrap_or(false)
            })
            .map(|(id, _)| id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::Artist;

    async fn seed_artist(pool: &SqlitePool) -> i64 {
        crate::db::ArtistTable::insert(pool, &Artist::new("A".into()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_requires_existing_artist() {
        let pool = test_pool().await;
        let err = SongTable::insert(&pool, &Song::new("S".into(), 42))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_requires_existing_artist() {
        let pool = test_pool().await;
        let artist = seed_artist(&pool).await;
        let id = SongTable::insert(&pool, &Song::new("S".into(), artist))
            .await
            .unwrap();

        let mut song = SongTable::get_by_id(&pool, id).await.unwrap().unwrap();
        song.artist_id = 42;
        let err = SongTable::update(&pool, &song).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_tolerates_extreme_page_numbers() {
        let pool = test_pool().await;
        let artist = seed_artist(&pool).await;
        SongTable::insert(&pool, &Song::new("S".into(), artist))
            .await
            .unwrap();

        let page = SongTable::list(&pool, i64::MAX, 200).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_genres_round_trip() {
        let pool = test_pool().await;
        let artist = seed_artist(&pool).await;

        let mut song = Song::new("S".into(), artist);
        song.genres = vec!["Cumbia".into(), "Indie".into()];
        let id = SongTable::insert(&pool, &song).await.unwrap();

        let loaded = SongTable::get_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(loaded.genres, vec!["Cumbia", "Indie"]);
    }

    #[tokio::test]
    async fn test_delete_blocked_by_playlist_membership() {
        let pool = test_pool().await;
        let artist = seed_artist(&pool).await;
        let song_id = SongTable::insert(&pool, &Song::new("S".into(), artist))
            .await
            .unwrap();

        sqlx::query("INSERT INTO user (email, password) VALUES ('a@x.com', 'h')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO playlist (name, owner_user_id, song_ids) VALUES ('P', 1, ?)")
            .bind(serde_json::to_string(&vec![song_id]).unwrap())
            .execute(&pool)
            .await
            .unwrap();

        let err = SongTable::delete(&pool, song_id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(SongTable::get_by_id(&pool, song_id).await.unwrap().is_some());
    }
}
