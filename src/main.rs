use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;

use xg_edge::cli::Args;
use xg_edge::config::EngineConfig;
use xg_edge::logging::init_logging;
use xg_edge::predictions;
use xg_edge::simulation::{self, BacktestReport};

const DEFAULT_OUT: &str = "predictions.json";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = Args::from_env();
    init_logging(args.has_flag("--verbose"));

    let mut cfg = EngineConfig::from_env().context("read XG_* environment")?;
    args.apply(&mut cfg).context("parse command line")?;
    let out = args
        .path("--out")
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT));

    println!("--- Starting Strategy Simulation (Poisson Model) ---");
    println!("Bankroll: ${:.2}", cfg.initial_bankroll);
    println!("Min Edge Required: {}%", cfg.min_edge_percent);
    println!();
    println!("--- Analyzing Matches ---");

    let report = simulation::run_backtest_seeded(&cfg, Local::now().naive_local())?;
    print_bets(&report);
    print_summary(&report);

    if args.has_flag("--json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    predictions::write_json(&out, &report.predictions)?;
    println!(
        "Saved {} high-value predictions to {}",
        report.predictions.len(),
        out.display()
    );
    Ok(())
}

fn print_bets(report: &BacktestReport) {
    for bet in &report.settled {
        let r = &bet.record;
        let won = bet.home_goals > bet.away_goals;
        let (tag, result) = if won {
            ("[BET HEADLINE]", "WIN")
        } else {
            ("[bet]         ", "LOSS")
        };
        println!(
            "{tag} {} vs {} | Odds: {:.2} | Edge: {:.1}% | Result: {}-{} ({result})",
            r.home, r.away, r.odds, r.edge, bet.home_goals, bet.away_goals
        );
    }
}

fn print_summary(report: &BacktestReport) {
    println!();
    println!("--- Simulation Results ---");
    println!("Trials: {} (skipped {})", report.trials, report.skipped);
    println!("Total Bets Found: {}", report.bets);
    println!("Win Rate: {:.2}%", report.win_rate * 100.0);
    println!("Final Bankroll: ${:.2}", report.final_bankroll);
    println!("ROI: {:.2}%", report.roi * 100.0);
    println!(
        "Peak: ${:.2} | Max drawdown: ${:.2}",
        report.peak_bankroll, report.max_drawdown
    );
    if report.bets > 0 {
        println!(
            "Avg odds: {:.2} | Avg edge: {:.1}%",
            report.avg_odds, report.avg_edge_percent
        );
        let c = &report.calibration;
        println!(
            "Model on placed bets: P(home) {:.1}% vs hit {:.1}% | brier={:.4} logloss={:.4} 1x2 brier={:.4}",
            c.mean_home_prob * 100.0,
            c.home_hit_rate * 100.0,
            c.home_brier,
            c.home_log_loss,
            c.brier_1x2
        );
        for bin in &c.reliability {
            println!(
                "  {:>3.0}-{:<3.0}% | bets {:>4} | model {:.1}% | hit {:.1}%",
                bin.lower * 100.0,
                bin.upper * 100.0,
                bin.bets,
                bin.mean_prob * 100.0,
                bin.hit_rate * 100.0
            );
        }
    }
}
