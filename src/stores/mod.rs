//! In-memory view caches
//!
//! The console's list and detail views are served from this cache between
//! mutations. The cache is never authoritative: every mutation round-trips
//! through the database and then invalidates whatever could be stale.

mod view_cache;

pub use view_cache::{global_cache, CachedKind, ViewCache};
