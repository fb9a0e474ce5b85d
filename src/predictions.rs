use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const HOME_WIN_LABEL: &str = "HOME WIN";
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PredictionStatus {
    Pending,
    Won,
    Lost,
}

impl PredictionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PredictionStatus::Pending => "PENDING",
            PredictionStatus::Won => "WON",
            PredictionStatus::Lost => "LOST",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(PredictionStatus::Pending),
            "WON" => Some(PredictionStatus::Won),
            "LOST" => Some(PredictionStatus::Lost),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: u64,
    pub date: String,
    pub league: String,
    pub home: String,
    pub away: String,
    pub prediction: String,
    pub odds: f64,
    /// Model probability in percent, one decimal.
    pub probability: f64,
    /// Edge in percent, one decimal.
    pub edge: f64,
    pub status: PredictionStatus,
}

impl PredictionRecord {
    pub fn settle(&mut self, won: bool) {
        if self.status == PredictionStatus::Pending {
            self.status = if won {
                PredictionStatus::Won
            } else {
                PredictionStatus::Lost
            };
        }
    }
}

/// Highest edge first. Equal edges keep their generation order.
pub fn rank_top_k(mut records: Vec<PredictionRecord>, top_k: usize) -> Vec<PredictionRecord> {
    records.sort_by(|a, b| b.edge.total_cmp(&a.edge));
    records.truncate(top_k);
    records
}

pub fn write_json(path: &Path, records: &[PredictionRecord]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(records).context("serialize predictions")?;
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}
