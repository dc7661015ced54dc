use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::games::GameKind;
use crate::session::SessionSummary;

/// One finished session as stored in the history database
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub game: String,
    pub score: u64,
    pub level: u32,
    pub correct_count: u32,
    pub total_count: u32,
    pub accuracy: u32,
    pub duration_secs: u64,
    pub finished_at: DateTime<Local>,
}

impl SessionRecord {
    pub fn new(game: GameKind, summary: &SessionSummary, duration_secs: u64) -> Self {
        Self {
            game: game.to_string(),
            score: summary.score,
            level: summary.level,
            correct_count: summary.correct_count,
            total_count: summary.total_count,
            accuracy: summary.accuracy,
            duration_secs,
            finished_at: Local::now(),
        }
    }
}

/// Score history backed by SQLite
#[derive(Debug)]
pub struct ScoreHistory {
    conn: Connection,
}

impl ScoreHistory {
    /// Opens the database under `$HOME/.local/state/brainboost`
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("brainboost_history.db"));
        Self::open(&db_path)
    }

    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }
        Self::with_connection(Connection::open(db_path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                game TEXT NOT NULL,
                score INTEGER NOT NULL,
                level INTEGER NOT NULL,
                correct_count INTEGER NOT NULL,
                total_count INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                duration_secs INTEGER NOT NULL,
                finished_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_game ON sessions(game)",
            [],
        )?;

        Ok(ScoreHistory { conn })
    }

    pub fn record(&self, record: &SessionRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO sessions
            (game, score, level, correct_count, total_count, accuracy, duration_secs, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.game,
                record.score as i64,
                record.level,
                record.correct_count,
                record.total_count,
                record.accuracy,
                record.duration_secs as i64,
                record.finished_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recent sessions first, optionally for one game only
    pub fn recent(&self, game: Option<GameKind>, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT game, score, level, correct_count, total_count, accuracy, duration_secs, finished_at
            FROM sessions
            WHERE ?1 IS NULL OR game = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )?;

        let game = game.map(|g| g.to_string());
        let rows = stmt.query_map(params![game, limit as i64], |row| {
            let finished_at: String = row.get(7)?;
            let finished_at = DateTime::parse_from_rfc3339(&finished_at)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        7,
                        "finished_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(SessionRecord {
                game: row.get(0)?,
                score: row.get::<_, i64>(1)?.max(0) as u64,
                level: row.get(2)?,
                correct_count: row.get(3)?,
                total_count: row.get(4)?,
                accuracy: row.get(5)?,
                duration_secs: row.get::<_, i64>(6)?.max(0) as u64,
                finished_at,
            })
        })?;

        let records = rows.collect::<Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn best_score(&self, game: GameKind) -> Result<Option<u64>> {
        let best: Option<i64> = self
            .conn
            .query_row(
                "SELECT MAX(score) FROM sessions WHERE game = ?1",
                [game.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        Ok(best.map(|b| b.max(0) as u64))
    }

    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM sessions", [])?;
        Ok(())
    }
}
