//! Response cache for list and detail views

use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde_json::Value;

static VIEW_CACHE: Lazy<ViewCache> = Lazy::new(ViewCache::new);

/// Get the process-wide view cache
pub fn global_cache() -> &'static ViewCache {
    &VIEW_CACHE
}

/// Entity kinds with cached views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachedKind {
    Song,
    Artist,
    Playlist,
    Genre,
    User,
}

impl CachedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CachedKind::Song => "song",
            CachedKind::Artist => "artist",
            CachedKind::Playlist => "playlist",
            CachedKind::Genre => "genre",
            CachedKind::User => "user",
        }
    }
}

/// Keyed JSON view cache
///
/// Keys are `{kind}:detail:{id}`, `{kind}:list:{page}:{page_size}` and
/// `{kind}:featured`. Invalidation for an entity drops its detail view and
/// every list/featured view of its kind, since any of them could hold a
/// stale copy.
pub struct ViewCache {
    entries: DashMap<String, Value>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    fn detail_key(kind: CachedKind, id: i64) -> String {
        format!("{}:detail:{}", kind.as_str(), id)
    }

    fn list_prefix(kind: CachedKind) -> String {
        format!("{}:list:", kind.as_str())
    }

    fn featured_key(kind: CachedKind) -> String {
        format!("{}:featured", kind.as_str())
    }

    pub fn get_detail(&self, kind: CachedKind, id: i64) -> Option<Value> {
        self.entries
            .get(&Self::detail_key(kind, id))
            .map(|v| v.clone())
    }

    pub fn put_detail(&self, kind: CachedKind, id: i64, value: Value) {
        self.entries.insert(Self::detail_key(kind, id), value);
    }

    pub fn get_list(&self, kind: CachedKind, page: i64, page_size: i64) -> Option<Value> {
        self.entries
            .get(&format!("{}{}:{}", Self::list_prefix(kind), page, page_size))
            .map(|v| v.clone())
    }

    pub fn put_list(&self, kind: CachedKind, page: i64, page_size: i64, value: Value) {
        self.entries.insert(
            format!("{}{}:{}", Self::list_prefix(kind), page, page_size),
            value,
        );
    }

    pub fn get_featured(&self, kind: CachedKind) -> Option<Value> {
        self.entries
            .get(&Self::featured_key(kind))
            .map(|v| v.clone())
    }

    pub fn put_featured(&self, kind: CachedKind, value: Value) {
        self.entries.insert(Self::featured_key(kind), value);
    }

    /// Drop every view that could contain a stale copy of this entity:
    /// its detail view, all list pages of its kind, and the featured view.
    pub fn invalidate_entity(&self, kind: CachedKind, id: i64) {
        self.entries.remove(&Self::detail_key(kind, id));
        self.entries.remove(&Self::featured_key(kind));

        let prefix = Self::list_prefix(kind);
        self.entries.retain(|key, _| !key.starts_with(&prefix));
    }

    /// Drop every view of a kind (bulk operations)
    pub fn invalidate_kind(&self, kind: CachedKind) {
        let detail_prefix = format!("{}:", kind.as_str());
        self.entries.retain(|key, _| !key.starts_with(&detail_prefix));
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invalidate_entity_drops_all_stale_views() {
        let cache = ViewCache::new();
        cache.put_detail(CachedKind::Song, 1, json!({"id": 1}));
        cache.put_detail(CachedKind::Song, 2, json!({"id": 2}));
        cache.put_list(CachedKind::Song, 0, 50, json!([1, 2]));
        cache.put_featured(CachedKind::Song, json!([1]));
        cache.put_detail(CachedKind::Artist, 1, json!({"id": 1}));

        cache.invalidate_entity(CachedKind::Song, 1);

        assert!(cache.get_detail(CachedKind::Song, 1).is_none());
        assert!(cache.get_list(CachedKind::Song, 0, 50).is_none());
        assert!(cache.get_featured(CachedKind::Song).is_none());
        // unrelated views survive
        assert!(cache.get_detail(CachedKind::Song, 2).is_some());
        assert!(cache.get_detail(CachedKind::Artist, 1).is_some());
    }

    #[test]
    fn test_invalidate_kind() {
        let cache = ViewCache::new();
        cache.put_detail(CachedKind::User, 1, json!({}));
        cache.put_list(CachedKind::User, 0, 50, json!([]));
        cache.put_detail(CachedKind::Genre, 1, json!({}));

        cache.invalidate_kind(CachedKind::User);

        assert!(cache.get_detail(CachedKind::User, 1).is_none());
        assert!(cache.get_list(CachedKind::User, 0, 50).is_none());
        assert!(cache.get_detail(CachedKind::Genre, 1).is_some());
    }
}
