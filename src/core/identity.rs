//! Identity resolver
//!
//! Checks a human-entered name against the existing-name set before a new
//! artist or user record is created, so duplicate identities are caught at
//! the door instead of repaired later by the reconciler.

use sqlx::SqlitePool;
use tracing::warn;

use crate::db::ArtistTable;

/// Outcome of a duplicate check
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_id: Option<i64>,
}

impl DuplicateCheck {
    fn no_match() -> Self {
        Self {
            is_duplicate: false,
            matched_id: None,
        }
    }
}

/// Compare a candidate name against the existing set.
///
/// The comparison is a trimmed, case-insensitive exact match, not fuzzy.
/// The first match wins; callers decide whether to link or abort creation.
pub fn resolve_or_flag_duplicate(candidate: &str, existing: &[(i64, String)]) -> DuplicateCheck {
    let key = candidate.trim().to_lowercase();
    if key.is_empty() {
        return DuplicateCheck::no_match();
    }

    for (id, name) in existing {
        if name.trim().to_lowercase() == key {
            return DuplicateCheck {
                is_duplicate: true,
                matched_id: Some(*id),
            };
        }
    }

    DuplicateCheck::no_match()
}

/// Resolve a candidate artist name against the database.
///
/// Read failures are treated as "no match found" so creation is never
/// blocked by a flaky read. That trades strict dedup for availability; the
/// reconciler exists to mop up anything that slips through. Transient
/// failures get one retry before falling open.
pub async fn resolve_artist_name(pool: &SqlitePool, candidate: &str) -> DuplicateCheck {
    let names = match ArtistTable::all_names(pool).await {
        Ok(names) => names,
        Err(first) if first.is_transient() => match ArtistTable::all_names(pool).await {
            Ok(names) => names,
            Err(second) => {
                warn!(
                    "artist-name fetch failed twice, resolving open: {}",
                    second
                );
                return DuplicateCheck::no_match();
            }
        },
        Err(err) => {
            warn!("artist-name fetch failed, resolving open: {}", err);
            return DuplicateCheck::no_match();
        }
    };

    let existing: Vec<(i64, String)> = names.into_iter().map(|n| (n.id, n.stage_name)).collect();
    resolve_or_flag_duplicate(candidate, &existing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::db::ArtistTable;
    use crate::models::Artist;

    #[test]
    fn test_case_insensitive_exact_match() {
        let existing = vec![(1, "los vintage".to_string())];

        let hit = resolve_or_flag_duplicate("Los Vintage", &existing);
        assert!(hit.is_duplicate);
        assert_eq!(hit.matched_id, Some(1));

        let miss = resolve_or_flag_duplicate("Los Vintage2", &existing);
        assert!(!miss.is_duplicate);
        assert_eq!(miss.matched_id, None);
    }

    #[test]
    fn test_trims_before_comparing() {
        let existing = vec![(3, "Aterciopelados".to_string())];
        let hit = resolve_or_flag_duplicate("  aterciopelados  ", &existing);
        assert_eq!(hit.matched_id, Some(3));
    }

    #[test]
    fn test_not_fuzzy() {
        let existing = vec![(1, "Soda Stereo".to_string())];
        assert!(!resolve_or_flag_duplicate("Soda Stere", &existing).is_duplicate);
        assert!(!resolve_or_flag_duplicate("Soda  Stereo", &existing).is_duplicate);
    }

    #[test]
    fn test_empty_candidate_never_matches() {
        let existing = vec![(1, "".to_string())];
        assert!(!resolve_or_flag_duplicate("   ", &existing).is_duplicate);
    }

    #[tokio::test]
    async fn test_resolve_against_database() {
        let pool = test_pool().await;
        let id = ArtistTable::insert(&pool, &Artist::new("Los Vintage".into()))
            .await
            .unwrap();

        let hit = resolve_artist_name(&pool, "LOS VINTAGE").await;
        assert!(hit.is_duplicate);
        assert_eq!(hit.matched_id, Some(id));
    }

    #[tokio::test]
    async fn test_read_failure_resolves_open() {
        let pool = test_pool().await;
        sqlx::query("DROP TABLE artist").execute(&pool).await.unwrap();

        // fail-open: a broken read reports "no duplicate" instead of erroring
        let check = resolve_artist_name(&pool, "Anyone").await;
        assert!(!check.is_duplicate);
    }
}
