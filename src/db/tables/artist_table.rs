//! Artist table operations

use sqlx::{FromRow, SqlitePool};

use crate::errors::AppError;
use crate::models::{Artist, Page};

/// Database row for artist table
#[derive(Debug, FromRow)]
struct ArtistRow {
    id: i64,
    stage_name: String,
    owner_user_id: Option<i64>,
    featured: i64,
    created_at: i64,
}

impl ArtistRow {
    fn into_artist(self) -> Artist {
        Artist {
            id: self.id,
            stage_name: self.stage_name,
            owner_user_id: self.owner_user_id,
            featured: self.featured != 0,
            created_at: self.created_at,
        }
    }
}

/// An (id, name) pair from the existing-name set
#[derive(Debug, Clone, FromRow)]
pub struct NameEntry {
    pub id: i64,
    pub stage_name: String,
}

/// Artist table operations
pub struct ArtistTable;

impl ArtistTable {
    /// Get a page of artists
    pub async fn list(
        pool: &SqlitePool,
        page: i64,
        page_size: i64,
    ) -> Result<Page<Artist>, AppError> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM artist")
            .fetch_one(pool)
            .await?;

        let rows: Vec<ArtistRow> =
            sqlx::query_as("SELECT * FROM artist ORDER BY stage_name COLLATE NOCASE LIMIT ? OFFSET ?")
                .bind(page_size)
                .bind(page.saturating_sub(1).max(0).saturating_mul(page_size))
                .fetch_all(pool)
                .await?;

        Ok(Page {
            items: rows.into_iter().map(|r| r.into_artist()).collect(),
            total: total.0,
        })
    }

    /// Get artist by ID
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Artist>, AppError> {
        let row: Option<ArtistRow> = sqlx::query_as("SELECT * FROM artist WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| r.into_artist()))
    }

    /// Get all (id, name) pairs. This is the existing-name set the identity
    /// resolver compares a candidate against.
    pub async fn all_names(pool: &SqlitePool) -> Result<Vec<NameEntry>, AppError> {
        let rows: Vec<NameEntry> = sqlx::query_as("SELECT id, stage_name FROM artist")
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    /// Get all artists featured on the curation screens
    pub async fn featured(pool: &SqlitePool) -> Result<Vec<Artist>, AppError> {
        let rows: Vec<ArtistRow> = sqlx::query_as(
            "SELECT * FROM artist WHERE featured = 1 ORDER BY stage_name COLLATE NOCASE",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.into_artist()).collect())
    }

    /// Insert an artist
    pub async fn insert(pool: &SqlitePool, artist: &Artist) -> Result<i64, AppError> {
        let result = sqlx::query(
            "INSERT INTO artist (stage_name, owner_user_id, featured, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(artist.stage_name.trim())
        .bind(artist.owner_user_id)
        .bind(artist.featured as i64)
        .bind(artist.created_at)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Update an artist, re-validating name uniqueness
    pub async fn update(pool: &SqlitePool, artist: &Artist) -> Result<(), AppError> {
        let clash: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM artist WHERE stage_name = ? COLLATE NOCASE AND id != ? LIMIT 1",
        )
        .bind(artist.stage_name.trim())
        .bind(artist.id)
        .fetch_optional(pool)
        .await?;

        if let Some((other,)) = clash {
            return Err(AppError::conflict(format!(
                "Artist name '{}' is already used by artist {}",
                artist.stage_name, other
            )));
        }

        let result = sqlx::query(
            "UPDATE artist SET stage_name = ?, owner_user_id = ?, featured = ? WHERE id = ?",
        )
        .bind(artist.stage_name.trim())
        .bind(artist.owner_user_id)
        .bind(artist.featured as i64)
        .bind(artist.id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Artist {} not found",
                artist.id
            )));
        }

        Ok(())
    }

    /// Write the featured flag
    pub async fn set_featured(pool: &SqlitePool, id: i64, featured: bool) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE artist SET featured = ? WHERE id = ?")
            .bind(featured as i64)
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Artist {} not found", id)));
        }

        Ok(())
    }

    /// Count of songs referencing an artist
    pub async fn song_count(pool: &SqlitePool, id: i64) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM song WHERE artist_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Delete an artist. Fails closed while any dependent record references
    /// it; only the reconciler's merge transaction may re-point and delete.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
        for (table, what) in [
            ("song", "song(s)"),
            ("album", "album(s)"),
            ("follower", "follower(s)"),
            ("playlist", "playlist link(s)"),
        ] {
            let count: (i64,) =
                sqlx::query_as(&format!("SELECT COUNT(*) FROM {} WHERE artist_id = ?", table))
                    .bind(id)
                    .fetch_one(pool)
                    .await?;
            if count.0 > 0 {
                return Err(AppError::conflict(format!(
                    "Artist {} is referenced by {} {}",
                    id, count.0, what
                )));
            }
        }

        let result = sqlx::query("DELETE FROM artist WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Artist {} not found", id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_delete_blocked_by_songs() {
        let pool = test_pool().await;

        let id = ArtistTable::insert(&pool, &Artist::new("A".into()))
            .await
            .unwrap();
        sqlx::query("INSERT INTO song (title, artist_id) VALUES ('S', ?)")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();

        let err = ArtistTable::delete(&pool, id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(ArtistTable::get_by_id(&pool, id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_rejects_name_clash() {
        let pool = test_pool().await;

        ArtistTable::insert(&pool, &Artist::new("Los Vintage".into()))
            .await
            .unwrap();
        let other = ArtistTable::insert(&pool, &Artist::new("Other".into()))
            .await
            .unwrap();

        let mut artist = ArtistTable::get_by_id(&pool, other).await.unwrap().unwrap();
        artist.stage_name = "los vintage".into();
        let err = ArtistTable::update(&pool, &artist).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_set_featured_missing_is_not_found() {
        let pool = test_pool().await;
        let err = ArtistTable::set_featured(&pool, 404, true).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
