//! SQL schema for the Missive SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// The `ON DELETE CASCADE` links carry part of the cleanup contract: deleting
/// a message takes its replies, notifications, and history snapshots with it
/// inside the same transaction.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    username    TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    message_id  TEXT PRIMARY KEY,
    sender_id   TEXT NOT NULL REFERENCES users(user_id),
    receiver_id TEXT NOT NULL REFERENCES users(user_id),
    content     TEXT NOT NULL,
    created_at  TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    is_read     INTEGER NOT NULL DEFAULT 0,
    edited      INTEGER NOT NULL DEFAULT 0,
    parent_id   TEXT REFERENCES messages(message_id) ON DELETE CASCADE
);

-- One row per message, created by the notification fan-out hook.
CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL REFERENCES users(user_id),
    message_id      TEXT NOT NULL REFERENCES messages(message_id) ON DELETE CASCADE,
    created_at      TEXT NOT NULL,
    is_read         INTEGER NOT NULL DEFAULT 0
);

-- Append-only content snapshots, one per content-changing edit.
CREATE TABLE IF NOT EXISTS message_history (
    history_id  TEXT PRIMARY KEY,
    message_id  TEXT NOT NULL REFERENCES messages(message_id) ON DELETE CASCADE,
    old_content TEXT NOT NULL,
    edited_at   TEXT NOT NULL,
    editor_id   TEXT NOT NULL REFERENCES users(user_id)
);

CREATE INDEX IF NOT EXISTS messages_unread_idx  ON messages(receiver_id, is_read);
CREATE INDEX IF NOT EXISTS messages_parent_idx  ON messages(parent_id);
CREATE INDEX IF NOT EXISTS messages_sender_idx  ON messages(sender_id);
CREATE INDEX IF NOT EXISTS notifications_user_idx ON notifications(user_id);
CREATE INDEX IF NOT EXISTS history_message_idx  ON message_history(message_id);
CREATE INDEX IF NOT EXISTS history_editor_idx   ON message_history(editor_id);

PRAGMA user_version = 1;
";
