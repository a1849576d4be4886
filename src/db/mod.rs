use anyhow::{anyhow, Result};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

pub mod models;
pub use models::*;

/// Thread-safe SQLite connection (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    /// Private in-memory database, used by tests and ephemeral runs
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection mutex poisoned"))
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    // ── Predictions ───────────────────────────────────────────────────────────

    /// Append a prediction to the history log
    pub fn insert_prediction(&self, rec: &PredictionRecord) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO predictions (
                player_name, is_home, opponent_strength, rest_days,
                season_clutch_fg_pct, minutes_per_game, category, confidence,
                p_underperform, p_expected, p_overperform, source, summary,
                predicted_at
             ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14)",
            params![
                rec.player_name,
                rec.is_home,
                rec.opponent_strength,
                rec.rest_days,
                rec.season_clutch_fg_pct,
                rec.minutes_per_game,
                rec.category,
                rec.confidence,
                rec.p_underperform,
                rec.p_expected,
                rec.p_overperform,
                rec.source,
                rec.summary,
                rec.predicted_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent predictions, newest first
    pub fn list_recent_predictions(&self, limit: i64) -> Result<Vec<PredictionRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, player_name, is_home, opponent_strength, rest_days,
                    season_clutch_fg_pct, minutes_per_game, category, confidence,
                    p_underperform, p_expected, p_overperform, source, summary,
                    predicted_at
             FROM predictions ORDER BY predicted_at DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], map_prediction)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Predictions for one player, newest first
    pub fn list_player_predictions(
        &self,
        player_name: &str,
        limit: i64,
    ) -> Result<Vec<PredictionRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, player_name, is_home, opponent_strength, rest_days,
                    season_clutch_fg_pct, minutes_per_game, category, confidence,
                    p_underperform, p_expected, p_overperform, source, summary,
                    predicted_at
             FROM predictions WHERE player_name = ?1
             ORDER BY predicted_at DESC, id DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![player_name, limit], map_prediction)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ── Stats ─────────────────────────────────────────────────────────────────

    /// Aggregate counts over the whole history
    pub fn get_stats(&self) -> Result<PredictionStats> {
        let conn = self.lock()?;
        let stats = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(category = 'overperform'), 0),
                    COALESCE(SUM(category = 'expected'), 0),
                    COALESCE(SUM(category = 'underperform'), 0),
                    COALESCE(SUM(source = 'model'), 0),
                    COALESCE(SUM(source = 'rule_based'), 0),
                    COALESCE(AVG(confidence), 0.0)
             FROM predictions",
            [],
            |r| {
                Ok(PredictionStats {
                    total_predictions: r.get(0)?,
                    overperform: r.get(1)?,
                    expected: r.get(2)?,
                    underperform: r.get(3)?,
                    model_predictions: r.get(4)?,
                    rule_based_predictions: r.get(5)?,
                    avg_confidence: r.get(6)?,
                })
            },
        )?;
        Ok(stats)
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

fn map_prediction(row: &rusqlite::Row) -> rusqlite::Result<PredictionRecord> {
    Ok(PredictionRecord {
        id: row.get(0)?,
        player_name: row.get(1)?,
        is_home: row.get(2)?,
        opponent_strength: row.get(3)?,
        rest_days: row.get(4)?,
        season_clutch_fg_pct: row.get(5)?,
        minutes_per_game: row.get(6)?,
        category: row.get(7)?,
        confidence: row.get(8)?,
        p_underperform: row.get(9)?,
        p_expected: row.get(10)?,
        p_overperform: row.get(11)?,
        source: row.get(12)?,
        summary: row.get(13)?,
        predicted_at: row.get(14)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS predictions (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    player_name          TEXT    NOT NULL,
    is_home              INTEGER NOT NULL,
    opponent_strength    REAL    NOT NULL,
    rest_days            INTEGER NOT NULL,
    season_clutch_fg_pct REAL    NOT NULL,
    minutes_per_game     REAL    NOT NULL,
    category             TEXT    NOT NULL,
    confidence           REAL    NOT NULL,
    p_underperform       REAL    NOT NULL,
    p_expected           REAL    NOT NULL,
    p_overperform        REAL    NOT NULL,
    source               TEXT    NOT NULL,
    summary              TEXT    NOT NULL,
    predicted_at         TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_predictions_player ON predictions(player_name);
CREATE INDEX IF NOT EXISTS idx_predictions_time ON predictions(predicted_at);
"#;
