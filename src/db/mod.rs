//! Database module: models, schema and queries for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and their public views
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: `KomikStorage` pool wrapper and `system_config` access
//! - `users.rs`, `catalog.rs`, `chapters.rs`: queries per aggregate

pub mod catalog;
pub mod chapters;
pub mod models;
pub mod schema;
pub mod sqlite;
pub mod users;

pub use catalog::{AuthorLink, MangaFilter, MangaPayload, TaxonomyKind};
pub use chapters::ChapterPayload;
pub use schema::SQLITE_INIT;
pub use sqlite::{KomikStorage, SqlitePool};
pub use users::NewUser;
