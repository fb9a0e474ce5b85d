use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, params};

use crate::predictions::{PredictionRecord, PredictionStatus};

const STORE_DIR: &str = "xg_edge";
const STORE_FILE: &str = "predictions.sqlite";

pub const DEFAULT_READ_LIMIT: usize = 20;

pub fn default_db_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("XG_EDGE_DB")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path.trim()));
    }
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(STORE_DIR).join(STORE_FILE));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(STORE_DIR).join(STORE_FILE))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS predictions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            league TEXT NOT NULL,
            home TEXT NOT NULL,
            away TEXT NOT NULL,
            prediction TEXT NOT NULL,
            odds REAL NOT NULL,
            probability REAL NOT NULL,
            edge REAL NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_predictions_created_at ON predictions(created_at);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Appends in one transaction. The store assigns ids; the records' own ids
/// are ignored.
pub fn append_predictions(conn: &mut Connection, records: &[PredictionRecord]) -> Result<usize> {
    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
    let tx = conn.transaction().context("begin insert")?;
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO predictions \
                 (date, league, home, away, prediction, odds, probability, edge, status, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )
            .context("prepare insert")?;
        for r in records {
            stmt.execute(params![
                r.date,
                r.league,
                r.home,
                r.away,
                r.prediction,
                r.odds,
                r.probability,
                r.edge,
                r.status.as_str(),
                created_at,
            ])
            .with_context(|| format!("insert {} vs {}", r.home, r.away))?;
        }
    }
    tx.commit().context("commit insert")?;
    Ok(records.len())
}

/// Newest first.
pub fn load_latest(conn: &Connection, limit: usize) -> Result<Vec<PredictionRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, date, league, home, away, prediction, odds, probability, edge, status \
             FROM predictions ORDER BY created_at DESC, id DESC LIMIT ?1",
        )
        .context("prepare select")?;
    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, f64>(7)?,
                row.get::<_, f64>(8)?,
                row.get::<_, String>(9)?,
            ))
        })
        .context("query predictions")?;

    let mut out = Vec::new();
    for row in rows {
        let (id, date, league, home, away, prediction, odds, probability, edge, status) =
            row.context("read prediction row")?;
        let status = PredictionStatus::parse(&status)
            .ok_or_else(|| anyhow!("unknown status {status:?} on prediction {id}"))?;
        out.push(PredictionRecord {
            id: u64::try_from(id).with_context(|| format!("prediction id {id} out of range"))?,
            date,
            league,
            home,
            away,
            prediction,
            odds,
            probability,
            edge,
            status,
        });
    }
    Ok(out)
}
