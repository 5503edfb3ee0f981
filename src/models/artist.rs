//! Artist model

use serde::{Deserialize, Serialize};

/// An artist identity record
///
/// At most one artist should exist per real-world identity (case-insensitive
/// name match). Creation goes through the identity resolver; drifted data is
/// repaired by the duplicate reconciler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    /// Database ID
    #[serde(default)]
    pub id: i64,
    /// Stage name. Historically also persisted as `stageName` and `name`;
    /// the normalization adapter folds those onto this field.
    pub stage_name: String,
    /// Linked account, if the artist has one
    #[serde(default)]
    pub owner_user_id: Option<i64>,
    /// Featured on the curation screens
    #[serde(default)]
    pub featured: bool,
    /// Creation time (unix seconds)
    #[serde(default)]
    pub created_at: i64,
}

impl Artist {
    pub fn new(stage_name: String) -> Self {
        Self {
            id: 0,
            stage_name,
            owner_user_id: None,
            featured: false,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Name key used for case-insensitive identity comparison
    pub fn name_key(&self) -> String {
        self.stage_name.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_key_folds_case_and_whitespace() {
        let a = Artist::new("  Los Vintage ".to_string());
        assert_eq!(a.name_key(), "los vintage");
    }

    #[test]
    fn test_serializes_camel_case() {
        let a = Artist::new("X".to_string());
        let json = serde_json::to_value(&a).unwrap();
        assert!(json.get("stageName").is_some());
        assert!(json.get("stage_name").is_none());
    }
}
