//! Playlist table operations

use sqlx::{FromRow, SqlitePool};

use crate::errors::AppError;
use crate::models::{Page, Playlist};

/// Database row for playlist table
#[derive(Debug, FromRow)]
struct PlaylistRow {
    id: i64,
    name: String,
    owner_user_id: i64,
    artist_id: Option<i64>,
    featured: i64,
    song_ids: String,
    created_at: i64,
}

impl PlaylistRow {
    fn into_playlist(self) -> Playlist {
        let song_ids: Vec<i64> = serde_json::from_str(&self.song_ids).unwrap_or_default();
        Playlist {
            id: self.id,
            name: self.name,
            owner_user_id: self.owner_user_id,
            artist_id: self.artist_id,
            featured: self.featured != 0,
            song_ids,
            created_at: self.created_at,
        }
    }
}

/// Playlist table operations
pub struct PlaylistTable;

impl PlaylistTable {
    /// Get a page of playlists
    pub async fn list(
        pool: &SqlitePool,
        page: i64,
        page_size: i64,
    ) -> Result<Page<Playlist>, AppError> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM playlist")
            .fetch_one(pool)
            .await?;

        let rows: Vec<PlaylistRow> =
            sqlx::query_as("SELECT * FROM playlist ORDER BY id LIMIT ? OFFSET ?")
                .bind(page_size)
                .bind(page.saturating_sub(1).max(0).saturating_mul(page_size))
                .fetch_all(pool)
                .await?;

        Ok(Page {
            items: rows.into_iter().map(|r| r.into_playlist()).collect(),
            total: total.0,
        })
    }

    /// Get playlist by ID
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Playlist>, AppError> {
        let row: Option<PlaylistRow> = sqlx::query_as("SELECT * FROM playlist WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| r.into_playlist()))
    }

    /// Get all featured playlists
    pub async fn featured(pool: &SqlitePool) -> Result<Vec<Playlist>, AppError> {
        let rows: Vec<PlaylistRow> =
            sqlx::query_as("SELECT * FROM playlist WHERE featured = 1 ORDER BY name COLLATE NOCASE")
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(|r| r.into_playlist()).collect())
    }

    /// Insert a playlist. Owner, artist link and every song reference must
    /// exist.
    pub async fn insert(pool: &SqlitePool, playlist: &Playlist) -> Result<i64, AppError> {
        let owner: Option<(i64,)> = sqlx::query_as("SELECT id FROM user WHERE id = ?")
            .bind(playlist.owner_user_id)
            .fetch_optional(pool)
            .await?;
        if owner.is_none() {
            return Err(AppError::not_found(format!(
                "User {} not found",
                playlist.owner_user_id
            )));
        }

        Self::verify_artist_link(pool, playlist.artist_id).await?;
        Self::verify_song_ids(pool, &playlist.song_ids).await?;

        let song_ids = serde_json::to_string(&playlist.song_ids).map_err(anyhow::Error::from)?;

        let result = sqlx::query(
            "INSERT INTO playlist (name, owner_user_id, artist_id, featured, song_ids, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(playlist.name.trim())
        .bind(playlist.owner_user_id)
        .bind(playlist.artist_id)
        .bind(playlist.featured as i64)
        .bind(&song_ids)
        .bind(playlist.created_at)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Update name/owner/artist-link of a playlist
    pub async fn update(pool: &SqlitePool, playlist: &Playlist) -> Result<(), AppError> {
        Self::verify_artist_link(pool, playlist.artist_id).await?;

        let result = sqlx::query(
            "UPDATE playlist SET name = ?, owner_user_id = ?, artist_id = ?, featured = ? \
             WHERE id = ?",
        )
        .bind(playlist.name.trim())
        .bind(playlist.owner_user_id)
        .bind(playlist.artist_id)
        .bind(playlist.featured as i64)
        .bind(playlist.id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Playlist {} not found",
                playlist.id
            )));
        }

        Ok(())
    }

    /// Replace the ordered song membership
    pub async fn update_songs(
        pool: &SqlitePool,
        id: i64,
        song_ids: &[i64],
    ) -> Result<(), AppError> {
        Self::verify_song_ids(pool, song_ids).await?;

        let encoded = serde_json::to_string(song_ids).map_err(anyhow::Error::from)?;

        let result = sqlx::query("UPDATE playlist SET song_ids = ? WHERE id = ?")
            .bind(&encoded)
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Playlist {} not found", id)));
        }

        Ok(())
    }

    /// Write the featured flag
    pub async fn set_featured(pool: &SqlitePool, id: i64, featured: bool) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE playlist SET featured = ? WHERE id = ?")
            .bind(featured as i64)
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Playlist {} not found", id)));
        }

        Ok(())
    }

    /// Delete a playlist. Playlists are leaves; nothing depends on them.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM playlist WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Playlist {} not found", id)));
        }

        Ok(())
    }

    async fn verify_artist_link(
        pool: &SqlitePool,
        artist_id: Option<i64>,
    ) -> Result<(), AppError> {
        if let Some(artist_id) = artist_id {
            let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM artist WHERE id = ?")
                .bind(artist_id)
                .fetch_optional(pool)
                .await?;
            if found.is_none() {
                return Err(AppError::not_found(format!("Artist {} not found", artist_id)));
            }
        }
        Ok(())
    }

    async fn verify_song_ids(pool: &SqlitePool, song_ids: &[i64]) -> Result<(), AppError> {
        for song_id in song_ids {
            let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM song WHERE id = ?")
                .bind(song_id)
                .fetch_optional(pool)
                .await?;
            if found.is_none() {
                return Err(AppError::not_found(format!("Song {} not found", song_id)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::db::{ArtistTable, SongTable, UserTable};
    use crate::models::{Artist, Song, User};

    async fn seed(pool: &SqlitePool) -> (i64, i64) {
        let uid = UserTable::insert(pool, &User::new("a@x.com".into(), "h".into()))
            .await
            .unwrap();
        let aid = ArtistTable::insert(pool, &Artist::new("A".into()))
            .await
            .unwrap();
        (uid, aid)
    }

    #[tokio::test]
    async fn test_song_order_is_preserved() {
        let pool = test_pool().await;
        let (uid, aid) = seed(&pool).await;

        let mut ids = Vec::new();
        for title in ["x", "y", "z"] {
            ids.push(
                SongTable::insert(&pool, &Song::new(title.into(), aid))
                    .await
                    .unwrap(),
            );
        }

        let mut playlist = Playlist::new("P".into(), uid);
        playlist.song_ids = vec![ids[2], ids[0], ids[1]];
        let pid = PlaylistTable::insert(&pool, &playlist).await.unwrap();

        let loaded = PlaylistTable::get_by_id(&pool, pid).await.unwrap().unwrap();
        assert_eq!(loaded.song_ids, vec![ids[2], ids[0], ids[1]]);
    }

    #[tokio::test]
    async fn test_artist_link_must_exist() {
        let pool = test_pool().await;
        let (uid, aid) = seed(&pool).await;

        let mut playlist = Playlist::new("P".into(), uid);
        playlist.artist_id = Some(999);
        let err = PlaylistTable::insert(&pool, &playlist).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        playlist.artist_id = Some(aid);
        let pid = PlaylistTable::insert(&pool, &playlist).await.unwrap();

        let mut loaded = PlaylistTable::get_by_id(&pool, pid).await.unwrap().unwrap();
        loaded.artist_id = Some(999);
        let err = PlaylistTable::update(&pool, &loaded).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_songs_rejects_unknown_song() {
        let pool = test_pool().await;
        let (uid, _) = seed(&pool).await;

        let pid = PlaylistTable::insert(&pool, &Playlist::new("P".into(), uid))
            .await
            .unwrap();

        let err = PlaylistTable::update_songs(&pool, pid, &[999])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // membership untouched
        let loaded = PlaylistTable::get_by_id(&pool, pid).await.unwrap().unwrap();
        assert!(loaded.song_ids.is_empty());
    }
}
