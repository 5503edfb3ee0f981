//! Genre table operations

use sqlx::{FromRow, SqlitePool};

use crate::errors::AppError;
use crate::models::{Genre, Page};

/// Database row for genre table
#[derive(Debug, FromRow)]
struct GenreRow {
    id: i64,
    name: String,
    color_hex: String,
    description: String,
}

impl GenreRow {
    fn into_genre(self) -> Genre {
        Genre {
            id: self.id,
            name: self.name,
            color_hex: self.color_hex,
            description: self.description,
        }
    }
}

/// Per-genre usage from the audit endpoint
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreUsage {
    pub genre: Genre,
    pub song_count: i64,
}

/// Genre table operations
pub struct GenreTable;

impl GenreTable {
    /// Get a page of genres
    pub async fn list(
        pool: &SqlitePool,
        page: i64,
        page_size: i64,
    ) -> Result<Page<Genre>, AppError> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM genre")
            .fetch_one(pool)
            .await?;

        let rows: Vec<GenreRow> =
            sqlx::query_as("SELECT * FROM genre ORDER BY name COLLATE NOCASE LIMIT ? OFFSET ?")
                .bind(page_size)
                .bind(page.saturating_sub(1).max(0).saturating_mul(page_size))
                .fetch_all(pool)
                .await?;

        Ok(Page {
            items: rows.into_iter().map(|r| r.into_genre()).collect(),
            total: total.0,
        })
    }

    /// Get genre by ID
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Genre>, AppError> {
        let row: Option<GenreRow> = sqlx::query_as("SELECT * FROM genre WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| r.into_genre()))
    }

    /// Get genre by name (case-insensitive)
    pub async fn get_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Genre>, AppError> {
        let row: Option<GenreRow> =
            sqlx::query_as("SELECT * FROM genre WHERE name = ? COLLATE NOCASE")
                .bind(name.trim())
                .fetch_optional(pool)
                .await?;

        Ok(row.map(|r| r.into_genre()))
    }

    /// Insert a genre, enforcing case-insensitive name uniqueness
    pub async fn insert(pool: &SqlitePool, genre: &Genre) -> Result<i64, AppError> {
        if !genre.has_valid_color() {
            return Err(AppError::Validation(format!(
                "'{}' is not a #rrggbb color",
                genre.color_hex
            )));
        }

        if Self::get_by_name(pool, &genre.name).await?.is_some() {
            return Err(AppError::conflict(format!(
                "A genre named '{}' already exists",
                genre.name
            )));
        }

        let result =
            sqlx::query("INSERT INTO genre (name, color_hex, description) VALUES (?, ?, ?)")
                .bind(genre.name.trim())
                .bind(&genre.color_hex)
                .bind(&genre.description)
                .execute(pool)
                .await?;

        Ok(result.last_insert_rowid())
    }

    /// Update a genre, re-validating name uniqueness
    pub async fn update(pool: &SqlitePool, genre: &Genre) -> Result<(), AppError> {
        if !genre.has_valid_color() {
            return Err(AppError::Validation(format!(
                "'{}' is not a #rrggbb color",
                genre.color_hex
            )));
        }

        if let Some(existing) = Self::get_by_name(pool, &genre.name).await? {
            if existing.id != genre.id {
                return Err(AppError::conflict(format!(
                    "A genre named '{}' already exists",
                    genre.name
                )));
            }
        }

        let result =
            sqlx::query("UPDATE genre SET name = ?, color_hex = ?, description = ? WHERE id = ?")
                .bind(genre.name.trim())
                .bind(&genre.color_hex)
                .bind(&genre.description)
                .bind(genre.id)
                .execute(pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Genre {} not found", genre.id)));
        }

        Ok(())
    }

    /// Delete a genre. Fails closed while any song still references the
    /// genre's name in its genre set.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
        let genre = Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Genre {} not found", id)))?;

        let count = Self::usage_count(pool, &genre.name).await?;
        if count > 0 {
            return Err(AppError::conflict(format!(
                "Genre '{}' is referenced by {} song(s)",
                genre.name, count
            )));
        }

        sqlx::query("DELETE FROM genre WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// How many songs reference `name` in their genre set
    pub async fn usage_count(pool: &SqlitePool, name: &str) -> Result<i64, AppError> {
        let songs = crate::db::SongTable::all(pool).await?;
        Ok(songs.iter().filter(|s| s.has_genre(name)).count() as i64)
    }

    /// Per-genre song counts for the maintenance audit
    pub async fn usage(pool: &SqlitePool) -> Result<Vec<GenreUsage>, AppError> {
        let genres = Self::list(pool, 1, i64::MAX).await?.items;
        let songs = crate::db::SongTable::all(pool).await?;

        Ok(genres
            .into_iter()
            .map(|genre| {
                let song_count = songs.iter().filter(|s| s.has_genre(&genre.name)).count() as i64;
                GenreUsage { genre, song_count }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::db::{ArtistTable, SongTable};
    use crate::models::{Artist, Song};

    #[tokio::test]
    async fn test_deletion_guard_leaves_both_sides_untouched() {
        let pool = test_pool().await;

        let gid = GenreTable::insert(&pool, &Genre::new("Cumbia".into()))
            .await
            .unwrap();
        let aid = ArtistTable::insert(&pool, &Artist::new("A".into()))
            .await
            .unwrap();
        let mut song = Song::new("S".into(), aid);
        song.genres = vec!["cumbia".into()];
        let sid = SongTable::insert(&pool, &song).await.unwrap();

        let err = GenreTable::delete(&pool, gid).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // genre and the song's reference are both untouched
        assert!(GenreTable::get_by_id(&pool, gid).await.unwrap().is_some());
        let song = SongTable::get_by_id(&pool, sid).await.unwrap().unwrap();
        assert_eq!(song.genres, vec!["cumbia"]);
    }

    #[tokio::test]
    async fn test_delete_unreferenced_genre() {
        let pool = test_pool().await;

        let gid = GenreTable::insert(&pool, &Genre::new("Ambient".into()))
            .await
            .unwrap();
        GenreTable::delete(&pool, gid).await.unwrap();
        assert!(GenreTable::get_by_id(&pool, gid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_name_uniqueness_is_case_insensitive() {
        let pool = test_pool().await;

        GenreTable::insert(&pool, &Genre::new("Jazz".into()))
            .await
            .unwrap();
        let err = GenreTable::insert(&pool, &Genre::new("JAZZ".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
