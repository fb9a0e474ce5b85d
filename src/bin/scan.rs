use anyhow::{Context, Result};
use chrono::Local;
use serde_json::json;
use tracing::error;

use xg_edge::cli::Args;
use xg_edge::config::EngineConfig;
use xg_edge::logging::init_logging;
use xg_edge::simulation;
use xg_edge::store;

const LIVE_TOP_K: usize = 10;

// Scheduled entry point: price a fresh batch and append the best to the store.
fn main() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = Args::from_env();
    init_logging(args.has_flag("--verbose"));

    let msg = match run(&args) {
        Ok(added) => json!({ "status": "success", "added": added }),
        Err(err) => {
            error!("scan failed: {err:#}");
            json!({ "status": "error", "details": format!("{err:#}") })
        }
    };
    println!("{msg}");
}

fn run(args: &Args) -> Result<usize> {
    let mut cfg = EngineConfig::from_env().context("read XG_* environment")?;
    if std::env::var("XG_TOP_K").is_err() {
        cfg.top_k = LIVE_TOP_K;
    }
    args.apply(&mut cfg).context("parse command line")?;

    let report = simulation::run_scan_seeded(&cfg, Local::now().naive_local())?;

    let db_path = args
        .path("--db")
        .or_else(store::default_db_path)
        .context("unable to resolve sqlite path")?;
    let mut conn = store::open_db(&db_path)?;
    store::append_predictions(&mut conn, &report.predictions)
}
