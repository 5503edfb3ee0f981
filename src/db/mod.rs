//! Database module for Greenroom
//!
//! All persistence goes through SQLx on SQLite. Table structs take the pool
//! explicitly; handlers fetch it from the global engine.

mod engine;
mod migrations;
pub mod tables;

pub use engine::{create_tables, setup_sqlite, DbEngine};
pub use migrations::run_migrations;
pub use tables::*;

#[cfg(test)]
pub use engine::test_pool;
