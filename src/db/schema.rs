//! Database schema and migrations for mediabox.
//!
//! Migrations are applied sequentially when the database is first opened or
//! upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL,
    email       TEXT NOT NULL,           -- stored lowercase
    password    TEXT NOT NULL,           -- Argon2 hash
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE UNIQUE INDEX idx_users_username_nocase ON users(username COLLATE NOCASE);
CREATE UNIQUE INDEX idx_users_email ON users(email);
"#,
    // v2: media assets
    r#"
CREATE TABLE media (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    original_name   TEXT NOT NULL,
    stored_name     TEXT NOT NULL,
    remote_id       TEXT NOT NULL UNIQUE,
    remote_url      TEXT NOT NULL,
    content_type    TEXT NOT NULL,
    media_type      TEXT NOT NULL CHECK (media_type IN ('image', 'video')),
    size_bytes      INTEGER NOT NULL,
    created_at      TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_media_owner_id ON media(owner_id);
CREATE INDEX idx_media_owner_type ON media(owner_id, media_type);
"#,
];
