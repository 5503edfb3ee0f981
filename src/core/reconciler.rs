//! Duplicate-artist reconciler
//!
//! Historical imports created multiple artist rows for the same real-world
//! identity. This module replaces the one-off repair scripts with a standing
//! maintenance operation: scan the catalog for artists sharing a
//! case-insensitive name, pick a canonical record per group, re-point every
//! dependent reference at it and delete the duplicates.
//!
//! A group moves through `Detected → Classified → Merged | Rejected`:
//!
//! - Detected: more than one artist shares a name key.
//! - Classified: one member is canonical. Tie-break is deterministic:
//!   most dependent songs, then earliest created, then lowest id.
//! - Merged: references re-pointed and duplicates deleted inside a single
//!   transaction. Re-running on a merged group is a no-op.
//! - Rejected: a table this module does not know how to re-point holds a
//!   reference to the artist table; the merge aborts with zero mutations.
//!
//! Reconciliation is operator-triggered only. It must never run as a side
//! effect of normal read/write traffic.

use sqlx::SqlitePool;
use tracing::info;

use crate::errors::AppError;
use crate::models::BulkOutcome;

/// Relations this module knows how to re-point during a merge. A foreign
/// key into `artist` from any table outside this set rejects the merge.
const CATALOGUED_RELATIONS: &[&str] = &["song", "album", "follower", "playlist"];

/// One artist inside a duplicate group
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub id: i64,
    pub stage_name: String,
    pub song_count: i64,
    pub created_at: i64,
}

/// A classified duplicate group
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    /// Shared lowercase name key
    pub name_key: String,
    pub canonical_id: i64,
    pub duplicate_ids: Vec<i64>,
}

/// What a merge changed
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    pub canonical_id: i64,
    pub removed_ids: Vec<i64>,
    pub repointed_songs: u64,
    pub repointed_albums: u64,
    pub repointed_followers: u64,
    pub repointed_playlists: u64,
}

impl MergeOutcome {
    /// True when the run changed nothing (already-merged group)
    pub fn is_noop(&self) -> bool {
        self.removed_ids.is_empty()
    }
}

/// Report for a multi-group merge pass
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub outcomes: Vec<MergeOutcome>,
    pub summary: BulkOutcome,
}

/// Pick the canonical member of a group.
///
/// Prefer the record with more dependent songs; when tied (including tied
/// at zero) prefer the earliest-created; a final id tie-break keeps the
/// choice deterministic.
pub fn classify(mut members: Vec<GroupMember>) -> Option<DuplicateGroup> {
    if members.len() < 2 {
        return None;
    }

    members.sort_by(|a, b| {
        b.song_count
            .cmp(&a.song_count)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    let name_key = members[0].stage_name.trim().to_lowercase();
    let canonical_id = members[0].id;
    let duplicate_ids = members[1..].iter().map(|m| m.id).collect();

    Some(DuplicateGroup {
        name_key,
        canonical_id,
        duplicate_ids,
    })
}

/// Scan the catalog for duplicate groups. Read-only.
pub async fn scan(pool: &SqlitePool) -> Result<Vec<DuplicateGroup>, AppError> {
    let rows: Vec<(i64, String, i64)> =
        sqlx::query_as("SELECT id, stage_name, created_at FROM artist")
            .fetch_all(pool)
            .await?;

    let mut by_key: std::collections::HashMap<String, Vec<(i64, String, i64)>> =
        std::collections::HashMap::new();
    for row in rows {
        by_key
            .entry(row.1.trim().to_lowercase())
            .or_default()
            .push(row);
    }

    let mut groups = Vec::new();
    for (_, rows) in by_key {
        if rows.len() < 2 {
            continue;
        }

        let mut members = Vec::with_capacity(rows.len());
        for (id, stage_name, created_at) in rows {
            let song_count = crate::db::ArtistTable::song_count(pool, id).await?;
            members.push(GroupMember {
                id,
                stage_name,
                song_count,
                created_at,
            });
        }

        if let Some(group) = classify(members) {
            groups.push(group);
        }
    }

    groups.sort_by(|a, b| a.name_key.cmp(&b.name_key));
    Ok(groups)
}

/// Tables outside the catalogued set that hold a foreign key into `artist`
async fn uncatalogued_relations(pool: &SqlitePool) -> Result<Vec<String>, AppError> {
    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )
    .fetch_all(pool)
    .await?;

    let mut unknown = Vec::new();
    for (table,) in tables {
        if table == "artist" || CATALOGUED_RELATIONS.contains(&table.as_str()) {
            continue;
        }

        let fks: Vec<(String,)> = sqlx::query_as(&format!(
            "SELECT \"table\" FROM pragma_foreign_key_list('{}')",
            table
        ))
        .fetch_all(pool)
        .await?;

        if fks.iter().any(|(target,)| target == "artist") {
            unknown.push(table);
        }
    }

    Ok(unknown)
}

/// Merge one duplicate group.
///
/// Re-pointing and deletion happen inside a single transaction: either the
/// whole group merges or nothing changes. Duplicates that no longer exist
/// are skipped, which is what makes a re-run on a merged group a no-op.
pub async fn merge_group(
    pool: &SqlitePool,
    group: &DuplicateGroup,
) -> Result<MergeOutcome, AppError> {
    // Reject before touching anything if the schema has grown a relation
    // this module does not know how to re-point.
    let unknown = uncatalogued_relations(pool).await?;
    if !unknown.is_empty() {
        return Err(AppError::conflict(format!(
            "Cannot merge '{}': table(s) [{}] reference artist and are not handled by the reconciler",
            group.name_key,
            unknown.join(", ")
        )));
    }

    let canonical: Option<(i64, String, Option<i64>)> =
        sqlx::query_as("SELECT id, stage_name, owner_user_id FROM artist WHERE id = ?")
            .bind(group.canonical_id)
            .fetch_optional(pool)
            .await?;
    let (canonical_id, canonical_name, canonical_owner) = canonical.ok_or_else(|| {
        AppError::not_found(format!(
            "Canonical artist {} not found",
            group.canonical_id
        ))
    })?;
    let canonical_key = canonical_name.trim().to_lowercase();

    let mut outcome = MergeOutcome {
        canonical_id,
        ..Default::default()
    };

    let mut tx = pool.begin().await?;

    for &dup_id in &group.duplicate_ids {
        let dup: Option<(i64, String, Option<i64>)> =
            sqlx::query_as("SELECT id, stage_name, owner_user_id FROM artist WHERE id = ?")
                .bind(dup_id)
                .fetch_optional(&mut *tx)
                .await?;

        // already merged by an earlier run
        let (dup_id, dup_name, dup_owner) = match dup {
            Some(d) => d,
            None => continue,
        };

        // Groups arrive over the wire and may be fabricated or stale (an
        // artist renamed between scan and merge). Re-check the duplicate
        // precondition before destroying anything; the rollback on error
        // keeps the whole group untouched.
        if dup_name.trim().to_lowercase() != canonical_key {
            return Err(AppError::conflict(format!(
                "Artist {} ('{}') is not a duplicate of canonical {} ('{}')",
                dup_id, dup_name, canonical_id, canonical_name
            )));
        }

        let songs = sqlx::query("UPDATE song SET artist_id = ? WHERE artist_id = ?")
            .bind(canonical_id)
            .bind(dup_id)
            .execute(&mut *tx)
            .await?;
        outcome.repointed_songs += songs.rows_affected();

        let albums = sqlx::query("UPDATE album SET artist_id = ? WHERE artist_id = ?")
            .bind(canonical_id)
            .bind(dup_id)
            .execute(&mut *tx)
            .await?;
        outcome.repointed_albums += albums.rows_affected();

        // a user may already follow both records; drop the would-be dup first
        sqlx::query(
            "DELETE FROM follower WHERE artist_id = ? AND user_id IN \
             (SELECT user_id FROM follower WHERE artist_id = ?)",
        )
        .bind(dup_id)
        .bind(canonical_id)
        .execute(&mut *tx)
        .await?;

        let followers = sqlx::query("UPDATE follower SET artist_id = ? WHERE artist_id = ?")
            .bind(canonical_id)
            .bind(dup_id)
            .execute(&mut *tx)
            .await?;
        outcome.repointed_followers += followers.rows_affected();

        let playlists = sqlx::query("UPDATE playlist SET artist_id = ? WHERE artist_id = ?")
            .bind(canonical_id)
            .bind(dup_id)
            .execute(&mut *tx)
            .await?;
        outcome.repointed_playlists += playlists.rows_affected();

        // carry a linked account over when the canonical record has none
        if canonical_owner.is_none() {
            if let Some(owner) = dup_owner {
                sqlx::query(
                    "UPDATE artist SET owner_user_id = ? WHERE id = ? AND owner_user_id IS NULL",
                )
                .bind(owner)
                .bind(canonical_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        sqlx::query("DELETE FROM artist WHERE id = ?")
            .bind(dup_id)
            .execute(&mut *tx)
            .await?;
        outcome.removed_ids.push(dup_id);
    }

    tx.commit().await?;

    if !outcome.is_noop() {
        info!(
            "merged {} duplicate(s) of '{}' into artist {}",
            outcome.removed_ids.len(),
            group.name_key,
            canonical_id
        );
    }

    Ok(outcome)
}

/// Merge many groups, reporting per-group outcomes. One group failing to
/// merge never aborts the rest; each group's own merge stays atomic.
pub async fn merge_all(pool: &SqlitePool, groups: &[DuplicateGroup]) -> MergeReport {
    let mut outcomes = Vec::new();
    let mut summary = BulkOutcome::default();

    for group in groups {
        match merge_group(pool, group).await {
            Ok(outcome) => {
                summary.record_success();
                outcomes.push(outcome);
            }
            Err(err) => {
                summary.record_failure(group.canonical_id, err.to_string());
            }
        }
    }

    MergeReport { outcomes, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn insert_artist(
        pool: &SqlitePool,
        name: &str,
        created_at: i64,
        owner: Option<i64>,
    ) -> i64 {
        sqlx::query("INSERT INTO artist (stage_name, owner_user_id, created_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(owner)
            .bind(created_at)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    async fn insert_song(pool: &SqlitePool, artist_id: i64) -> i64 {
        sqlx::query("INSERT INTO song (title, artist_id) VALUES ('S', ?)")
            .bind(artist_id)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    fn member(id: i64, song_count: i64, created_at: i64) -> GroupMember {
        GroupMember {
            id,
            stage_name: "X".into(),
            song_count,
            created_at,
        }
    }

    #[test]
    fn test_classify_prefers_more_songs() {
        let group = classify(vec![member(1, 0, 10), member(2, 3, 99)]).unwrap();
        assert_eq!(group.canonical_id, 2);
        assert_eq!(group.duplicate_ids, vec![1]);
    }

    #[test]
    fn test_classify_tie_prefers_earliest_created() {
        let group = classify(vec![member(1, 0, 50), member(2, 0, 10)]).unwrap();
        assert_eq!(group.canonical_id, 2);
    }

    #[test]
    fn test_classify_full_tie_is_deterministic() {
        let a = classify(vec![member(2, 1, 10), member(1, 1, 10)]).unwrap();
        let b = classify(vec![member(1, 1, 10), member(2, 1, 10)]).unwrap();
        assert_eq!(a.canonical_id, b.canonical_id);
        assert_eq!(a.canonical_id, 1);
    }

    #[test]
    fn test_classify_needs_two_members() {
        assert!(classify(vec![member(1, 0, 0)]).is_none());
    }

    #[tokio::test]
    async fn test_scan_groups_case_insensitively() {
        let pool = test_pool().await;
        insert_artist(&pool, "Los Vintage", 10, None).await;
        insert_artist(&pool, "los vintage", 20, None).await;
        insert_artist(&pool, "Unrelated", 30, None).await;

        let groups = scan(&pool).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name_key, "los vintage");
    }

    #[tokio::test]
    async fn test_merge_repoints_songs_and_removes_duplicate() {
        let pool = test_pool().await;
        let a = insert_artist(&pool, "Los Vintage", 10, None).await;
        let b = insert_artist(&pool, "los vintage", 20, None).await;
        for _ in 0..3 {
            insert_song(&pool, a).await;
        }

        let groups = scan(&pool).await.unwrap();
        let outcome = merge_group(&pool, &groups[0]).await.unwrap();

        assert_eq!(outcome.canonical_id, a);
        assert_eq!(outcome.removed_ids, vec![b]);

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM song WHERE artist_id = ?")
            .bind(a)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 3);

        let gone: Option<(i64,)> = sqlx::query_as("SELECT id FROM artist WHERE id = ?")
            .bind(b)
            .fetch_optional(&pool)
            .await
            .unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let pool = test_pool().await;
        let a = insert_artist(&pool, "X", 10, None).await;
        insert_artist(&pool, "x", 20, None).await;
        insert_song(&pool, a).await;

        let groups = scan(&pool).await.unwrap();
        let first = merge_group(&pool, &groups[0]).await.unwrap();
        assert!(!first.is_noop());

        // running the same group again is a no-op, not an error
        let second = merge_group(&pool, &groups[0]).await.unwrap();
        assert!(second.is_noop());
        assert_eq!(second.repointed_songs, 0);

        // and a fresh scan finds nothing left to do
        assert!(scan(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_uncatalogued_relation_rejects_with_zero_mutations() {
        let pool = test_pool().await;
        let a = insert_artist(&pool, "X", 10, None).await;
        let b = insert_artist(&pool, "x", 20, None).await;
        insert_song(&pool, b).await;

        // a relation the reconciler does not know how to re-point
        sqlx::query(
            "CREATE TABLE royalty (id INTEGER PRIMARY KEY, artist_id INTEGER NOT NULL, \
             FOREIGN KEY (artist_id) REFERENCES artist(id))",
        )
        .execute(&pool)
        .await
        .unwrap();

        let groups = scan(&pool).await.unwrap();
        let err = merge_group(&pool, &groups[0]).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // zero mutations: both artists and the song reference survive
        let artists: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM artist")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(artists.0, 2);
        let song_owner: (i64,) = sqlx::query_as("SELECT artist_id FROM song LIMIT 1")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(song_owner.0, b);
        let _ = a;
    }

    #[tokio::test]
    async fn test_merge_rejects_group_whose_members_are_not_duplicates() {
        let pool = test_pool().await;
        let alpha = insert_artist(&pool, "Alpha", 10, None).await;
        let beta = insert_artist(&pool, "Beta", 20, None).await;
        insert_song(&pool, beta).await;

        // a hand-built group never produced by a scan
        let group = DuplicateGroup {
            name_key: "alpha".into(),
            canonical_id: alpha,
            duplicate_ids: vec![beta],
        };

        let err = merge_group(&pool, &group).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // the non-duplicate survives with its song untouched
        let survivor: Option<(i64,)> = sqlx::query_as("SELECT id FROM artist WHERE id = ?")
            .bind(beta)
            .fetch_optional(&pool)
            .await
            .unwrap();
        assert!(survivor.is_some());
        let song_owner: (i64,) = sqlx::query_as("SELECT artist_id FROM song LIMIT 1")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(song_owner.0, beta);
    }

    #[tokio::test]
    async fn test_merge_rejects_stale_group_after_rename() {
        let pool = test_pool().await;
        let a = insert_artist(&pool, "X", 10, None).await;
        let b = insert_artist(&pool, "x", 20, None).await;
        insert_song(&pool, a).await;

        let groups = scan(&pool).await.unwrap();

        // the duplicate gets renamed between scan and merge
        sqlx::query("UPDATE artist SET stage_name = 'Y' WHERE id = ?")
            .bind(b)
            .execute(&pool)
            .await
            .unwrap();

        let err = merge_group(&pool, &groups[0]).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let artists: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM artist")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(artists.0, 2);
    }

    #[tokio::test]
    async fn test_merge_carries_linked_account() {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO user (email, password) VALUES ('a@x.com', 'h')")
            .execute(&pool)
            .await
            .unwrap();

        let a = insert_artist(&pool, "X", 10, None).await;
        insert_song(&pool, a).await;
        insert_artist(&pool, "x", 20, Some(1)).await;

        let groups = scan(&pool).await.unwrap();
        merge_group(&pool, &groups[0]).await.unwrap();

        let owner: (Option<i64>,) = sqlx::query_as("SELECT owner_user_id FROM artist WHERE id = ?")
            .bind(a)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(owner.0, Some(1));
    }

    #[tokio::test]
    async fn test_merge_all_reports_per_group() {
        let pool = test_pool().await;
        let a = insert_artist(&pool, "X", 10, None).await;
        insert_artist(&pool, "x", 20, None).await;
        insert_song(&pool, a).await;

        let mut groups = scan(&pool).await.unwrap();
        // a second group whose canonical id does not exist
        groups.push(DuplicateGroup {
            name_key: "ghost".into(),
            canonical_id: 999,
            duplicate_ids: vec![998],
        });

        let report = merge_all(&pool, &groups).await;
        assert_eq!(report.summary.succeeded, 1);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.failures[0].id, 999);
    }
}
