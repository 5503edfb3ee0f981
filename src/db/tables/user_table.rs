//! User table operations

use sqlx::{FromRow, SqlitePool};

use crate::errors::AppError;
use crate::models::{Page, User, UserRole};

/// Database row for user table
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password: String,
    role: String,
    is_active: i64,
    is_verified: i64,
    created_at: i64,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            password: self.password,
            role: UserRole::from_str(&self.role).unwrap_or_default(),
            is_active: self.is_active != 0,
            is_verified: self.is_verified != 0,
            created_at: self.created_at,
        }
    }
}

/// User table operations
pub struct UserTable;

impl UserTable {
    /// Get a page of users
    pub async fn list(pool: &SqlitePool, page: i64, page_size: i64) -> Result<Page<User>, AppError> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user")
            .fetch_one(pool)
            .await?;

        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT * FROM user ORDER BY id LIMIT ? OFFSET ?")
                .bind(page_size)
                .bind(page.saturating_sub(1).max(0).saturating_mul(page_size))
                .fetch_all(pool)
                .await?;

        Ok(Page {
            items: rows.into_iter().map(|r| r.into_user()).collect(),
            total: total.0,
        })
    }

    /// Get user by ID
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM user WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| r.into_user()))
    }

    /// Get user by email (case-insensitive)
    pub async fn get_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT * FROM user WHERE email = ? COLLATE NOCASE")
                .bind(email.trim())
                .fetch_optional(pool)
                .await?;

        Ok(row.map(|r| r.into_user()))
    }

    /// Insert a user. Email uniqueness is re-validated here so the caller
    /// gets a Conflict instead of a bare constraint error.
    pub async fn insert(pool: &SqlitePool, user: &User) -> Result<i64, AppError> {
        if Self::get_by_email(pool, &user.email).await?.is_some() {
            return Err(AppError::conflict(format!(
                "A user with email '{}' already exists",
                user.email
            )));
        }

        let result = sqlx::query(
            "INSERT INTO user (email, password, role, is_active, is_verified, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user.email.trim())
        .bind(&user.password)
        .bind(user.role.as_str())
        .bind(user.is_active as i64)
        .bind(user.is_verified as i64)
        .bind(user.created_at)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Update a user, re-validating email uniqueness
    pub async fn update(pool: &SqlitePool, user: &User) -> Result<(), AppError> {
        if let Some(existing) = Self::get_by_email(pool, &user.email).await? {
            if existing.id != user.id {
                return Err(AppError::conflict(format!(
                    "A user with email '{}' already exists",
                    user.email
                )));
            }
        }

        let result = sqlx::query(
            "UPDATE user SET email = ?, password = ?, role = ?, is_active = ?, is_verified = ? \
             WHERE id = ?",
        )
        .bind(user.email.trim())
        .bind(&user.password)
        .bind(user.role.as_str())
        .bind(user.is_active as i64)
        .bind(user.is_verified as i64)
        .bind(user.id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {} not found", user.id)));
        }

        Ok(())
    }

    /// Delete a user. Fails closed when a dependent record still points at
    /// the account; deletion never cascades silently.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
        let artist: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM artist WHERE owner_user_id = ? LIMIT 1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        if let Some((artist_id,)) = artist {
            return Err(AppError::conflict(format!(
                "User {} owns artist {}; unlink the artist profile first",
                id, artist_id
            )));
        }

        let playlists: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM playlist WHERE owner_user_id = ?")
                .bind(id)
                .fetch_one(pool)
                .await?;
        if playlists.0 > 0 {
            return Err(AppError::conflict(format!(
                "User {} owns {} playlist(s); delete or reassign them first",
                id, playlists.0
            )));
        }

        let result = sqlx::query("DELETE FROM user WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {} not found", id)));
        }

        Ok(())
    }

    /// Check if any users exist
    pub async fn has_users(pool: &SqlitePool) -> Result<bool, AppError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user")
            .fetch_one(pool)
            .await?;
        Ok(row.0 > 0)
    }
}
