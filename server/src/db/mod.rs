pub mod migrations;
pub mod models;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::store::{MessageStore, PresenceStore, StoreError, VendorDirectory};
use models::{ChatRecord, NewChatMessage, StoredMessage, VendorProfile};

/// Type alias for the shared database connection.
/// rusqlite is synchronous, so it is wrapped in Arc<Mutex> for thread safety
/// with tokio::task::spawn_blocking for DB operations.
pub type DbPool = Arc<Mutex<Connection>>;

/// Initialize the SQLite database: create data directory if needed,
/// open (or create) the database file, enable WAL mode, and run migrations.
pub fn init_db(data_dir: &str) -> Result<DbPool, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(data_dir)?;

    let db_path = Path::new(data_dir).join("relay.db");
    let mut conn = Connection::open(&db_path)?;

    // Enable WAL mode for better concurrent read performance
    conn.pragma_update(None, "journal_mode", "WAL")?;

    migrations::migrations().to_latest(&mut conn)?;

    tracing::info!("Database initialized at {}", db_path.display());

    Ok(Arc::new(Mutex::new(conn)))
}

/// Timestamps are stored in one fixed RFC 3339 shape so that string
/// comparison in SQL orders them correctly.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// SQLite-backed implementation of every store trait.
#[derive(Clone)]
pub struct SqliteStore {
    db: DbPool,
}

impl SqliteStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Open (and migrate) the database under `data_dir`.
    pub fn open(data_dir: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(init_db(data_dir)?))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.db
            .lock()
            .map_err(|_| StoreError::Unavailable("database lock poisoned".to_string()))
    }

    /// Insert or update a vendor profile. Presence columns are untouched
    /// on update.
    pub fn upsert_vendor(&self, profile: &VendorProfile) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO vendors (id, name, primary_language, created_at)
             VALUES (?1, ?2, COALESCE(?3, 'en'), ?4)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                primary_language = excluded.primary_language",
            rusqlite::params![
                profile.vendor_id,
                profile.name,
                profile.preferred_language,
                format_timestamp(&Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// Stored presence flag, `None` for unknown vendors.
    pub fn is_online(&self, vendor_id: &str) -> Result<Option<bool>, StoreError> {
        let conn = self.conn()?;
        let online = conn
            .query_row(
                "SELECT is_online FROM vendors WHERE id = ?1",
                rusqlite::params![vendor_id],
                |row| row.get::<_, bool>(0),
            )
            .optional()?;
        Ok(online)
    }
}

impl VendorDirectory for SqliteStore {
    fn lookup_vendor(&self, vendor_id: &str) -> Result<Option<VendorProfile>, StoreError> {
        let conn = self.conn()?;
        let profile = conn
            .query_row(
                "SELECT id, name, primary_language FROM vendors WHERE id = ?1",
                rusqlite::params![vendor_id],
                |row| {
                    Ok(VendorProfile {
                        vendor_id: row.get(0)?,
                        name: row.get(1)?,
                        preferred_language: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    fn save_vendor(&self, profile: &VendorProfile) -> Result<(), StoreError> {
        self.upsert_vendor(profile)
    }
}

impl PresenceStore for SqliteStore {
    fn set_presence(
        &self,
        vendor_id: &str,
        online: bool,
        last_seen: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let seen = format_timestamp(&last_seen);

        let updated = conn.execute(
            "UPDATE vendors SET is_online = ?2, last_seen = ?3
             WHERE id = ?1 AND (last_seen IS NULL OR last_seen <= ?3)",
            rusqlite::params![vendor_id, online, seen],
        )?;

        if updated == 0 {
            // Either the vendor is unknown or a newer update already landed
            let exists: bool = conn.query_row(
                "SELECT COUNT(*) FROM vendors WHERE id = ?1",
                rusqlite::params![vendor_id],
                |row| row.get::<_, i64>(0).map(|c| c > 0),
            )?;
            if !exists {
                return Err(StoreError::UnknownVendor(vendor_id.to_string()));
            }
        }
        Ok(())
    }
}

impl MessageStore for SqliteStore {
    fn persist_chat_message(&self, message: &NewChatMessage) -> Result<StoredMessage, StoreError> {
        let stored = StoredMessage {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
        };
        let translations = serde_json::to_string(&message.variants)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO chat_messages (id, vendor_id, message, original_language, translations, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                stored.id,
                message.vendor_id,
                message.text,
                message.detected_language,
                translations,
                format_timestamp(&stored.timestamp),
            ],
        )?;

        Ok(stored)
    }

    fn recent_messages(&self, limit: usize) -> Result<Vec<ChatRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, vendor_id, message, original_language, translations, timestamp
             FROM chat_messages
             ORDER BY timestamp DESC, rowid DESC
             LIMIT ?1",
        )?;

        let mut records = stmt
            .query_map(rusqlite::params![limit as i64], |row| {
                let translations: String = row.get(4)?;
                let variants: BTreeMap<String, String> = serde_json::from_str(&translations)
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            4,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                let timestamp: String = row.get(5)?;

                Ok(ChatRecord {
                    id: row.get(0)?,
                    vendor_id: row.get(1)?,
                    text: row.get(2)?,
                    detected_language: row.get(3)?,
                    variants,
                    timestamp: parse_timestamp(5, &timestamp)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        records.reverse();
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn open_temp() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().to_str().unwrap()).unwrap();
        (store, dir)
    }

    fn profile(id: &str, lang: Option<&str>) -> VendorProfile {
        VendorProfile {
            vendor_id: id.to_string(),
            name: format!("Stall {}", id),
            preferred_language: lang.map(str::to_string),
        }
    }

    #[test]
    fn test_upsert_and_lookup_vendor() {
        let (store, _dir) = open_temp();
        store.upsert_vendor(&profile("VM0001", Some("es"))).unwrap();
        store.upsert_vendor(&profile("VM0002", None)).unwrap();

        let a = store.lookup_vendor("VM0001").unwrap().unwrap();
        assert_eq!(a.name, "Stall VM0001");
        assert_eq!(a.preferred_language.as_deref(), Some("es"));

        let b = store.lookup_vendor("VM0002").unwrap().unwrap();
        assert_eq!(b.preferred_language.as_deref(), Some("en"));

        assert!(store.lookup_vendor("VM0003").unwrap().is_none());
    }

    #[test]
    fn test_presence_updates_and_ordering() {
        let (store, _dir) = open_temp();
        store.upsert_vendor(&profile("VM0001", Some("en"))).unwrap();
        assert_eq!(store.is_online("VM0001").unwrap(), Some(false));

        let now = Utc::now();
        store.set_presence("VM0001", true, now).unwrap();
        assert_eq!(store.is_online("VM0001").unwrap(), Some(true));

        store.set_presence("VM0001", false, now + Duration::seconds(1)).unwrap();
        // A late "online" from before the disconnect must not win
        store.set_presence("VM0001", true, now).unwrap();
        assert_eq!(store.is_online("VM0001").unwrap(), Some(false));
    }

    #[test]
    fn test_presence_for_unknown_vendor() {
        let (store, _dir) = open_temp();
        let err = store.set_presence("VM7777", true, Utc::now()).unwrap_err();
        assert!(matches!(err, StoreError::UnknownVendor(_)));
    }

    #[test]
    fn test_persist_and_read_back_messages() {
        let (store, _dir) = open_temp();
        let mut ids = Vec::new();
        for text in ["first", "second", "third"] {
            let message = NewChatMessage {
                vendor_id: "VM0001".to_string(),
                text: text.to_string(),
                detected_language: "en".to_string(),
                variants: BTreeMap::from([
                    ("en".to_string(), text.to_string()),
                    ("fr".to_string(), format!("[Translated to FR] {}", text)),
                ]),
            };
            ids.push(store.persist_chat_message(&message).unwrap().id);
        }

        let recent = store.recent_messages(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, ids[1]);
        assert_eq!(recent[1].id, ids[2]);
        assert_eq!(recent[1].variants["fr"], "[Translated to FR] third");
    }
}
