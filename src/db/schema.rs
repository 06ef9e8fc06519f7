//! SQL DDL for initializing the catalog database.
//! SQLite-first design; ids are UUID text, timestamps RFC3339 text.

/// SQLite schema with:
/// - `users`: unique `email` and `username`, `role` and `security_stamp`
/// - `manga`: unique `slug`, view counters
/// - `chapters`: unique (`manga_id`, `number`), `images` as a JSON array
/// - `genres` / `tags` / `authors` with many-to-many joins to `manga`
/// - `system_config`: key/value flags written by the installer
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    email TEXT NOT NULL UNIQUE,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'MEMBER',
    security_stamp TEXT NOT NULL,
    avatar_url TEXT NULL,
    is_email_verified INTEGER NOT NULL DEFAULT 0,
    last_login_at TEXT NULL,
    registered_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);

CREATE TABLE IF NOT EXISTS manga (
    id TEXT PRIMARY KEY NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    title_en TEXT NOT NULL,
    title_jp TEXT NULL,
    title_id TEXT NULL,
    status TEXT NOT NULL DEFAULT 'ONGOING',
    type TEXT NOT NULL DEFAULT 'MANGA',
    is_adult INTEGER NOT NULL DEFAULT 0,
    description TEXT NULL,
    cover_url TEXT NULL,
    banner_url TEXT NULL,
    rating REAL NOT NULL DEFAULT 0,
    views_total INTEGER NOT NULL DEFAULT 0,
    views_weekly INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_manga_updated_at ON manga(updated_at);

CREATE TABLE IF NOT EXISTS chapters (
    id TEXT PRIMARY KEY NOT NULL,
    manga_id TEXT NOT NULL REFERENCES manga(id) ON DELETE CASCADE,
    number REAL NOT NULL,
    title TEXT NULL,
    volume INTEGER NULL,
    images TEXT NOT NULL DEFAULT '[]', -- JSON array of {url, width, height}
    source_origin TEXT NULL,
    source_external_id TEXT NULL,
    is_locked INTEGER NOT NULL DEFAULT 0,
    views INTEGER NOT NULL DEFAULT 0,
    release_date TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (manga_id, number)
);

CREATE INDEX IF NOT EXISTS idx_chapters_release_date ON chapters(release_date);

CREATE TABLE IF NOT EXISTS genres (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS tags (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS authors (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS manga_genres (
    manga_id TEXT NOT NULL REFERENCES manga(id) ON DELETE CASCADE,
    genre_id TEXT NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
    PRIMARY KEY (manga_id, genre_id)
);

CREATE TABLE IF NOT EXISTS manga_tags (
    manga_id TEXT NOT NULL REFERENCES manga(id) ON DELETE CASCADE,
    tag_id TEXT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (manga_id, tag_id)
);

CREATE TABLE IF NOT EXISTS manga_authors (
    manga_id TEXT NOT NULL REFERENCES manga(id) ON DELETE CASCADE,
    author_id TEXT NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
    role TEXT NULL, -- e.g. story, art
    PRIMARY KEY (manga_id, author_id)
);

CREATE TABLE IF NOT EXISTS system_config (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    is_encrypted INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);
"#;
