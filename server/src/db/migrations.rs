use rusqlite_migration::{Migrations, M};

/// Define all schema migrations.
/// Uses SQLite user_version pragma for tracking, no migration table needed.
pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        M::up(
            "-- Migration 1: Vendors and chat log

CREATE TABLE vendors (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    primary_language TEXT NOT NULL DEFAULT 'en',
    is_online INTEGER NOT NULL DEFAULT 0,
    last_seen TEXT,
    created_at TEXT NOT NULL
);

-- vendor_id is deliberately not a foreign key: messages from vendors
-- without a profile are still logged.
CREATE TABLE chat_messages (
    id TEXT PRIMARY KEY,
    vendor_id TEXT NOT NULL,
    message TEXT NOT NULL,
    original_language TEXT NOT NULL,
    translations TEXT NOT NULL,
    timestamp TEXT NOT NULL
);

CREATE INDEX idx_chat_messages_timestamp ON chat_messages(timestamp);
",
        ),
    ])
}
