//! Featured-flag coordinator
//!
//! Toggles the `featured` boolean on a song, artist or playlist and keeps
//! list and detail views consistent with the database. The protocol:
//!
//! 1. apply the desired value optimistically to the cached detail view;
//! 2. issue the authoritative update;
//! 3. on failure revert the cached view and surface the error; on success
//!    invalidate every cached view that could hold a stale copy.
//!
//! The flag is a plain boolean column. There is no cap on how many items
//! are featured and no ordering among them. Concurrent toggles on the same
//! id are last-write-wins: the operation is idempotent per desired value
//! and administrator-driven, so a lock buys nothing.

use sqlx::SqlitePool;
use tracing::debug;

use crate::db::{ArtistTable, PlaylistTable, SongTable};
use crate::errors::AppError;
use crate::stores::{CachedKind, ViewCache};

/// Entity kinds that carry a featured flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeaturedKind {
    Song,
    Artist,
    Playlist,
}

impl FeaturedKind {
    fn cached_kind(&self) -> CachedKind {
        match self {
            FeaturedKind::Song => CachedKind::Song,
            FeaturedKind::Artist => CachedKind::Artist,
            FeaturedKind::Playlist => CachedKind::Playlist,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeaturedKind::Song => "song",
            FeaturedKind::Artist => "artist",
            FeaturedKind::Playlist => "playlist",
        }
    }
}

/// Set the featured flag on an entity.
///
/// Never retried on failure: a mutation retry could double a side effect
/// the caller has already observed. Idempotent per desired value, so the
/// caller may simply issue it again.
pub async fn set_featured(
    pool: &SqlitePool,
    cache: &ViewCache,
    kind: FeaturedKind,
    id: i64,
    desired: bool,
) -> Result<(), AppError> {
    let cached_kind = kind.cached_kind();

    // remember the prior cached view so a failed update can be reverted
    let prior = cache.get_detail(cached_kind, id);

    // optimistic local apply
    if let Some(mut view) = prior.clone() {
        if let Some(obj) = view.as_object_mut() {
            obj.insert("featured".to_string(), serde_json::Value::Bool(desired));
        }
        cache.put_detail(cached_kind, id, view);
    }

    // authoritative update
    let result = match kind {
        FeaturedKind::Song => SongTable::set_featured(pool, id, desired).await,
        FeaturedKind::Artist => ArtistTable::set_featured(pool, id, desired).await,
        FeaturedKind::Playlist => PlaylistTable::set_featured(pool, id, desired).await,
    };

    match result {
        Ok(()) => {
            debug!("{} {} featured={}", kind.as_str(), id, desired);
            cache.invalidate_entity(cached_kind, id);
            Ok(())
        }
        Err(err) => {
            // roll the local view back to the pre-toggle value
            match prior {
                Some(view) => cache.put_detail(cached_kind, id, view),
                None => cache.invalidate_entity(cached_kind, id),
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::db::{ArtistTable, SongTable};
    use crate::models::{Artist, Song};
    use serde_json::json;

    async fn seed_song(pool: &SqlitePool) -> i64 {
        let artist = ArtistTable::insert(pool, &Artist::new("A".into()))
            .await
            .unwrap();
        SongTable::insert(pool, &Song::new("S".into(), artist))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_toggle_is_idempotent() {
        let pool = test_pool().await;
        let cache = ViewCache::new();
        let id = seed_song(&pool).await;

        set_featured(&pool, &cache, FeaturedKind::Song, id, true)
            .await
            .unwrap();
        set_featured(&pool, &cache, FeaturedKind::Song, id, true)
            .await
            .unwrap();

        let song = SongTable::get_by_id(&pool, id).await.unwrap().unwrap();
        assert!(song.featured);
    }

    #[tokio::test]
    async fn test_success_invalidates_stale_views() {
        let pool = test_pool().await;
        let cache = ViewCache::new();
        let id = seed_song(&pool).await;

        cache.put_detail(CachedKind::Song, id, json!({"id": id, "featured": false}));
        cache.put_list(CachedKind::Song, 0, 50, json!([{"id": id}]));
        cache.put_featured(CachedKind::Song, json!([]));

        set_featured(&pool, &cache, FeaturedKind::Song, id, true)
            .await
            .unwrap();

        assert!(cache.get_detail(CachedKind::Song, id).is_none());
        assert!(cache.get_list(CachedKind::Song, 0, 50).is_none());
        assert!(cache.get_featured(CachedKind::Song).is_none());
    }

    #[tokio::test]
    async fn test_failure_reverts_to_pre_toggle_state() {
        let pool = test_pool().await;
        let cache = ViewCache::new();
        let id = seed_song(&pool).await;

        cache.put_detail(CachedKind::Song, id, json!({"id": id, "featured": false}));

        // break the authoritative write
        sqlx::query("DROP TABLE song").execute(&pool).await.unwrap();

        let err = set_featured(&pool, &cache, FeaturedKind::Song, id, true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        // the caller-visible view equals the pre-toggle value
        let view = cache.get_detail(CachedKind::Song, id).unwrap();
        assert_eq!(view["featured"], json!(false));
    }

    #[tokio::test]
    async fn test_missing_id_is_not_found() {
        let pool = test_pool().await;
        let cache = ViewCache::new();

        let err = set_featured(&pool, &cache, FeaturedKind::Playlist, 404, true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
