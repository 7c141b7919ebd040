//! SQL schema for the AlertNet SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! layout so a later migration can be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per document. Every write replaces `body` and bumps `version`.
-- Rows are never deleted.
CREATE TABLE IF NOT EXISTS documents (
    collection  TEXT    NOT NULL,   -- 'users' | 'alerts' | 'reports' | 'credentials'
    doc_id      TEXT    NOT NULL,
    version     INTEGER NOT NULL,   -- starts at 1
    body        TEXT    NOT NULL,   -- JSON object of top-level fields
    created_at  TEXT    NOT NULL,   -- RFC 3339 UTC, microseconds; server-assigned
    updated_at  TEXT    NOT NULL,
    PRIMARY KEY (collection, doc_id)
);

CREATE INDEX IF NOT EXISTS documents_updated_idx ON documents(updated_at);

PRAGMA user_version = 1;
";
