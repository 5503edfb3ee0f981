//! Domain logic shared by the HTTP handlers

pub mod featured;
pub mod identity;
pub mod normalize;
pub mod reconciler;

pub use featured::{set_featured, FeaturedKind};
pub use identity::{resolve_artist_name, resolve_or_flag_duplicate, DuplicateCheck};
pub use reconciler::{merge_all, merge_group, scan, DuplicateGroup, MergeOutcome, MergeReport};
