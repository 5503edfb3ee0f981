//! Data models for Greenroom
//!
//! Persisted columns are snake_case; the API contract is camelCase. Models
//! serialize camelCase so handlers never hand-map field names.

mod artist;
mod genre;
mod playlist;
mod song;
mod user;

pub use artist::Artist;
pub use genre::Genre;
pub use playlist::Playlist;
pub use song::{Song, SongStatus};
pub use user::{PublicUser, User, UserRole};

/// List envelope returned by every paginated endpoint
#[derive(Debug, Clone, serde::Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// Per-item outcomes of a bulk operation. Bulk work never fails the whole
/// batch on the first error; callers get an aggregate count instead.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<BulkFailure>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkFailure {
    pub id: i64,
    pub msg: String,
}

impl BulkOutcome {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, id: i64, msg: impl Into<String>) {
        self.failed += 1;
        self.failures.push(BulkFailure {
            id,
            msg: msg.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_outcome_accounting() {
        let mut outcome = BulkOutcome::default();
        outcome.record_success();
        outcome.record_success();
        outcome.record_failure(7, "blocked");

        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.failures[0].id, 7);
    }
}
