use rusqlite::Connection;

use crate::error::StorageError;

pub const SCHEMA_VERSION: i32 = 1;

pub fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
    ",
    )?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);
INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, unixepoch());

CREATE TABLE IF NOT EXISTS screens (
    site_id BLOB NOT NULL CHECK (length(site_id) = 16),
    screen TEXT NOT NULL,
    entities BLOB NOT NULL,
    revision INTEGER NOT NULL,
    updated_at INTEGER NOT NULL DEFAULT (CAST(unixepoch('now','subsec') * 1000 AS INTEGER)),
    PRIMARY KEY (site_id, screen)
);

CREATE TABLE IF NOT EXISTS blobs (
    content_hash BLOB PRIMARY KEY CHECK (length(content_hash) = 32),
    bytes BLOB NOT NULL,
    size INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS media (
    site_id BLOB NOT NULL CHECK (length(site_id) = 16),
    screen TEXT NOT NULL,
    slot TEXT NOT NULL,
    image_id BLOB NOT NULL UNIQUE CHECK (length(image_id) = 16),
    filename TEXT NOT NULL,
    content_hash BLOB NOT NULL REFERENCES blobs (content_hash),
    uploaded_at INTEGER NOT NULL DEFAULT (CAST(unixepoch('now','subsec') * 1000 AS INTEGER)),
    PRIMARY KEY (site_id, screen, slot)
);
CREATE INDEX IF NOT EXISTS idx_media_screen ON media (site_id, screen);
";
