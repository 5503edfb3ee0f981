//! Database engine and connection management

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;

use crate::config::Paths;

static DB_ENGINE: OnceCell<Arc<DbEngine>> = OnceCell::new();

/// Database engine wrapper
pub struct DbEngine {
    pool: SqlitePool,
}

impl DbEngine {
    /// Get the global database engine instance
    pub fn get() -> Result<Arc<DbEngine>> {
        DB_ENGINE
            .get()
            .map(Arc::clone)
            .context("Database not initialized")
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Setup the SQLite database
pub async fn setup_sqlite() -> Result<()> {
    let paths = Paths::get()?;
    let db_path = paths.app_db_path();

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30))
        .pragma("cache_size", "10000")
        .pragma("foreign_keys", "ON");

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    create_tables(&pool).await?;

    let engine = DbEngine { pool };

    DB_ENGINE
        .set(Arc::new(engine))
        .map_err(|_| anyhow::anyhow!("Database already initialized"))?;

    Ok(())
}

/// Create all database tables
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    // User table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL,
            password TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user',
            is_active INTEGER NOT NULL DEFAULT 1,
            is_verified INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL DEFAULT (strftime('%s','now'))
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_user_email ON user(email COLLATE NOCASE);
        "#,
    )
    .execute(pool)
    .await?;

    // Artist table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artist (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            stage_name TEXT NOT NULL,
            owner_user_id INTEGER,
            featured INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL DEFAULT (strftime('%s','now')),
            FOREIGN KEY (owner_user_id) REFERENCES user(id)
        );
        CREATE INDEX IF NOT EXISTS idx_artist_stage_name ON artist(stage_name COLLATE NOCASE);
        CREATE INDEX IF NOT EXISTS idx_artist_featured ON artist(featured);
        "#,
    )
    .execute(pool)
    .await?;

    // Song table. Genres are a JSON array of names; the legacy
    // delimiter-separated form is folded in at the import boundary.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS song (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            artist_id INTEGER NOT NULL,
            featured INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'draft',
            duration_seconds INTEGER NOT NULL DEFAULT 0,
            genres TEXT NOT NULL DEFAULT '[]',
            created_at INTEGER NOT NULL DEFAULT (strftime('%s','now')),
            FOREIGN KEY (artist_id) REFERENCES artist(id)
        );
        CREATE INDEX IF NOT EXISTS idx_song_artist_id ON song(artist_id);
        CREATE INDEX IF NOT EXISTS idx_song_featured ON song(featured);
        CREATE INDEX IF NOT EXISTS idx_song_status ON song(status);
        "#,
    )
    .execute(pool)
    .await?;

    // Album table. No admin CRUD surface yet; carried because the
    // reconciler must re-point album references during artist merges.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS album (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            artist_id INTEGER NOT NULL,
            created_at INTEGER NOT NULL DEFAULT (strftime('%s','now')),
            FOREIGN KEY (artist_id) REFERENCES artist(id)
        );
        CREATE INDEX IF NOT EXISTS idx_album_artist_id ON album(artist_id);
        "#,
    )
    .execute(pool)
    .await?;

    // Follower table (user follows artist)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS follower (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            artist_id INTEGER NOT NULL,
            created_at INTEGER NOT NULL DEFAULT (strftime('%s','now')),
            FOREIGN KEY (user_id) REFERENCES user(id),
            FOREIGN KEY (artist_id) REFERENCES artist(id)
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_follower_pair ON follower(user_id, artist_id);
        CREATE INDEX IF NOT EXISTS idx_follower_artist_id ON follower(artist_id);
        "#,
    )
    .execute(pool)
    .await?;

    // Playlist table. song_ids is an ordered JSON array; position = index.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlist (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            owner_user_id INTEGER NOT NULL,
            artist_id INTEGER,
            featured INTEGER NOT NULL DEFAULT 0,
            song_ids TEXT NOT NULL DEFAULT '[]',
            created_at INTEGER NOT NULL DEFAULT (strftime('%s','now')),
            FOREIGN KEY (owner_user_id) REFERENCES user(id),
            FOREIGN KEY (artist_id) REFERENCES artist(id)
        );
        CREATE INDEX IF NOT EXISTS idx_playlist_owner ON playlist(owner_user_id);
        CREATE INDEX IF NOT EXISTS idx_playlist_featured ON playlist(featured);
        "#,
    )
    .execute(pool)
    .await?;

    // Genre table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS genre (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            color_hex TEXT NOT NULL DEFAULT '#808080',
            description TEXT NOT NULL DEFAULT ''
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_genre_name ON genre(name COLLATE NOCASE);
        "#,
    )
    .execute(pool)
    .await?;

    // Migration table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dbmigration (
            id INTEGER PRIMARY KEY,
            version INTEGER NOT NULL DEFAULT 0
        );
        INSERT OR IGNORE INTO dbmigration (id, version) VALUES (1, 0);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Open an in-memory database with the full schema, for tests
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .pragma("foreign_keys", "ON");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    create_tables(&pool).await.unwrap();
    pool
}
