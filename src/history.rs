use rusqlite::{Connection, params};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::PersistenceError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS translations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_language TEXT NOT NULL,
    target_language TEXT NOT NULL,
    source_text TEXT,
    result TEXT NOT NULL,
    model TEXT NOT NULL,
    latency_ms INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationRecord {
    pub source_language: String,
    pub target_language: String,
    pub source_text: String,
    pub result: String,
    pub model: String,
    pub latency_ms: u64,
    pub created_at: String,
}

impl TranslationRecord {
    /// Builds a record with both texts cut to `excerpt_chars` characters.
    pub fn summary(
        source_language: &str,
        target_language: &str,
        source_text: &str,
        result: &str,
        model: &str,
        latency_ms: u64,
        excerpt_chars: usize,
    ) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            source_text: excerpt(source_text, excerpt_chars),
            result: excerpt(result, excerpt_chars),
            model: model.to_string(),
            latency_ms,
            created_at: now_rfc3339(),
        }
    }
}

pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string())
}

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
    Disabled,
}

struct LogInner {
    location: Location,
    connection: OnceCell<Arc<Mutex<Connection>>>,
}

/// Append-only translation log. The SQLite connection is opened on the first
/// write and reused for the lifetime of the handle.
#[derive(Clone)]
pub struct TranslationLog {
    inner: Arc<LogInner>,
}

impl TranslationLog {
    fn with_location(location: Location) -> Self {
        Self {
            inner: Arc::new(LogInner {
                location,
                connection: OnceCell::new(),
            }),
        }
    }

    pub fn lazy(path: impl Into<PathBuf>) -> Self {
        Self::with_location(Location::File(path.into()))
    }

    pub fn in_memory() -> Self {
        Self::with_location(Location::Memory)
    }

    pub fn disabled() -> Self {
        Self::with_location(Location::Disabled)
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.inner.location, Location::Disabled)
    }

    async fn connection(&self) -> Result<Arc<Mutex<Connection>>, PersistenceError> {
        let location = self.inner.location.clone();
        let conn = self
            .inner
            .connection
            .get_or_try_init(|| async move {
                tokio::task::spawn_blocking(move || open(location))
                    .await
                    .map_err(|err| PersistenceError(format!("open task failed: {}", err)))?
                    .map(|conn| Arc::new(Mutex::new(conn)))
            })
            .await?;
        Ok(conn.clone())
    }

    pub async fn append(&self, record: TranslationRecord) -> Result<(), PersistenceError> {
        if !self.is_enabled() {
            return Ok(());
        }
        let conn = self.connection().await?;
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|err| PersistenceError(format!("log lock poisoned: {}", err)))?;
            conn.execute(
                r#"
                INSERT INTO translations (
                    source_language, target_language, source_text, result,
                    model, latency_ms, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    record.source_language,
                    record.target_language,
                    record.source_text,
                    record.result,
                    record.model,
                    record.latency_ms as i64,
                    record.created_at,
                ],
            )
            .map_err(|err| PersistenceError(err.to_string()))?;
            debug!("history: recorded translation by {}", record.model);
            Ok(())
        })
        .await
        .map_err(|err| PersistenceError(format!("write task failed: {}", err)))?
    }

    /// Most recent records first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<TranslationRecord>, PersistenceError> {
        if !self.is_enabled() {
            return Ok(Vec::new());
        }
        let conn = self.connection().await?;
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|err| PersistenceError(format!("log lock poisoned: {}", err)))?;
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT source_language, target_language, source_text, result,
                           model, latency_ms, created_at
                    FROM translations ORDER BY id DESC LIMIT ?1
                    "#,
                )
                .map_err(|err| PersistenceError(err.to_string()))?;
            let rows = stmt
                .query_map(params![limit as i64], |row| {
                    Ok(TranslationRecord {
                        source_language: row.get(0)?,
                        target_language: row.get(1)?,
                        source_text: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        result: row.get(3)?,
                        model: row.get(4)?,
                        latency_ms: row.get::<_, i64>(5)?.max(0) as u64,
                        created_at: row.get(6)?,
                    })
                })
                .map_err(|err| PersistenceError(err.to_string()))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|err| PersistenceError(err.to_string()))
        })
        .await
        .map_err(|err| PersistenceError(format!("read task failed: {}", err)))?
    }
}

fn open(location: Location) -> Result<Connection, PersistenceError> {
    let conn = match &location {
        Location::File(path) => {
            info!("history: opening translation log at {}", path.display());
            Connection::open(path)
        }
        Location::Memory | Location::Disabled => Connection::open_in_memory(),
    }
    .map_err(|err| PersistenceError(err.to_string()))?;
    conn.execute_batch(SCHEMA)
        .map_err(|err| PersistenceError(err.to_string()))?;
    Ok(conn)
}
