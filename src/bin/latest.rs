use anyhow::{Context, Result};
use serde_json::json;

use xg_edge::cli::Args;
use xg_edge::logging::init_logging;
use xg_edge::predictions::PredictionRecord;
use xg_edge::store;

fn main() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = Args::from_env();
    init_logging(args.has_flag("--verbose"));

    match run(&args) {
        Ok(rows) => match serde_json::to_string(&rows) {
            Ok(body) => println!("{body}"),
            Err(err) => println!("{}", error_body(&err.to_string())),
        },
        Err(err) => println!("{}", error_body(&format!("{err:#}"))),
    }
}

fn run(args: &Args) -> Result<Vec<PredictionRecord>> {
    let limit = args
        .value::<usize>("--limit")?
        .unwrap_or(store::DEFAULT_READ_LIMIT);
    let db_path = args
        .path("--db")
        .or_else(store::default_db_path)
        .context("unable to resolve sqlite path")?;
    let conn = store::open_db(&db_path)?;
    store::load_latest(&conn, limit)
}

fn error_body(err: &str) -> serde_json::Value {
    json!({
        "error": err,
        "message": "Database not connected or query failed.",
    })
}
