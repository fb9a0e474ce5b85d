use chrono::{NaiveDate, NaiveDateTime};
use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;

use xg_edge::config::EngineConfig;
use xg_edge::error::ConfigError;
use xg_edge::fixtures::{Fixture, FixtureSource};
use xg_edge::market::round_to;
use xg_edge::outcome_model::outcome_probabilities;
use xg_edge::predictions::PredictionStatus;
use xg_edge::simulation::{run_backtest, run_backtest_seeded, run_scan, run_scan_seeded};

fn anchor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 5, 2)
        .and_then(|d| d.and_hms_opt(21, 0, 0))
        .unwrap()
}

/// Same fixture every trial. A zero rate on every `bad_every`-th call makes
/// that trial unpriceable.
struct FixedFixtures {
    lambda_home: f64,
    lambda_away: f64,
    bad_every: Option<usize>,
    calls: usize,
}

impl FixedFixtures {
    fn new(lambda_home: f64, lambda_away: f64) -> Self {
        Self {
            lambda_home,
            lambda_away,
            bad_every: None,
            calls: 0,
        }
    }
}

impl FixtureSource for FixedFixtures {
    fn next_fixture(&mut self, _rng: &mut dyn RngCore) -> Fixture {
        self.calls += 1;
        let bad = self.bad_every.is_some_and(|n| self.calls % n == 0);
        Fixture {
            home: "PSG".to_string(),
            away: "Lyon".to_string(),
            league: "Ligue 1".to_string(),
            kickoff: anchor(),
            lambda_home: if bad { 0.0 } else { self.lambda_home },
            lambda_away: self.lambda_away,
        }
    }
}

/// Replays one uniform forever. `gen_range(0.0..1.0)` returns it exactly.
struct Constant {
    word: u64,
    draws: usize,
}

impl Constant {
    fn new(uniform: f64) -> Self {
        Self {
            word: ((uniform * (1u64 << 52) as f64) as u64) << 12,
            draws: 0,
        }
    }
}

impl RngCore for Constant {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.draws += 1;
        self.word
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fn noiseless(min_edge_percent: f64) -> EngineConfig {
    EngineConfig {
        simulation_count: 25,
        min_edge_percent,
        noise_range: (1.0, 1.0),
        margin: 0.05,
        rng_seed: Some(1),
        ..EngineConfig::default()
    }
}

#[test]
fn seeded_runs_are_identical() {
    let cfg = EngineConfig {
        simulation_count: 500,
        rng_seed: Some(2026),
        ..EngineConfig::default()
    };
    let a = run_backtest_seeded(&cfg, anchor()).unwrap();
    let b = run_backtest_seeded(&cfg, anchor()).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a.predictions).unwrap(),
        serde_json::to_string(&b.predictions).unwrap()
    );

    let other = run_backtest_seeded(
        &EngineConfig {
            rng_seed: Some(2027),
            ..cfg.clone()
        },
        anchor(),
    )
    .unwrap();
    assert_ne!(a.settled, other.settled);
}

#[test]
fn seeded_scans_are_identical() {
    let cfg = EngineConfig {
        simulation_count: 300,
        top_k: 10,
        rng_seed: Some(5),
        ..EngineConfig::default()
    };
    let a = run_scan_seeded(&cfg, anchor()).unwrap();
    let b = run_scan_seeded(&cfg, anchor()).unwrap();
    assert_eq!(a, b);
    assert!(a.predictions.len() <= 10);
    assert!(
        a.predictions
            .iter()
            .all(|r| r.status == PredictionStatus::Pending)
    );
}

#[test]
fn backtest_books_balance() {
    let cfg = EngineConfig {
        simulation_count: 400,
        rng_seed: Some(77),
        ..EngineConfig::default()
    };
    let report = run_backtest_seeded(&cfg, anchor()).unwrap();

    assert_eq!(report.trials, 400);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.bets, report.wins + report.losses);
    assert_eq!(report.bets, report.settled.len());
    assert!(report.bets > 0);
    assert!((report.total_staked - 20.0 * report.bets as f64).abs() < 1e-9);

    let mut bankroll = cfg.initial_bankroll;
    for bet in &report.settled {
        let won = bet.home_goals > bet.away_goals;
        assert_eq!(
            bet.record.status,
            if won {
                PredictionStatus::Won
            } else {
                PredictionStatus::Lost
            }
        );
        assert!(bet.record.edge >= cfg.min_edge_percent);
        if won {
            bankroll += 20.0 * (bet.record.odds - 1.0);
        } else {
            bankroll -= 20.0;
        }
    }
    assert!((report.final_bankroll - bankroll).abs() < 1e-6);
    assert!((report.profit - (bankroll - cfg.initial_bankroll)).abs() < 1e-6);
    assert!((report.roi - report.profit / report.total_staked).abs() < 1e-12);
    assert!((report.win_rate - report.wins as f64 / report.bets as f64).abs() < 1e-12);
    assert!(report.peak_bankroll >= cfg.initial_bankroll);
    assert!(report.max_drawdown >= 0.0);
    assert_eq!(report.calibration.bets, report.bets);
    let binned: usize = report.calibration.reliability.iter().map(|b| b.bets).sum();
    assert_eq!(binned, report.bets);
    assert!((report.calibration.home_hit_rate - report.win_rate).abs() < 1e-12);

    assert!(report.predictions.len() <= cfg.top_k);
    for pair in report.predictions.windows(2) {
        assert!(pair[0].edge >= pair[1].edge);
    }
}

#[test]
fn zero_simulations_is_not_an_error() {
    let cfg = EngineConfig {
        simulation_count: 0,
        rng_seed: Some(3),
        ..EngineConfig::default()
    };
    let report = run_backtest_seeded(&cfg, anchor()).unwrap();
    assert_eq!(report.bets, 0);
    assert_eq!(report.win_rate, 0.0);
    assert_eq!(report.roi, 0.0);
    assert_eq!(report.final_bankroll, cfg.initial_bankroll);
    assert!(report.predictions.is_empty());
    assert!(report.settled.is_empty());
}

#[test]
fn noiseless_market_prices_home_win_by_formula() {
    let p = outcome_probabilities(2.2, 1.0, 10).unwrap();
    let expected_odds = round_to((1.0 / (p.home / p.total())) / 1.05, 2);
    assert!((expected_odds - round_to((1.0 / p.home) / 1.05, 2)).abs() <= 0.01);
    let selected = p.home * expected_odds - 1.0 > 0.05;

    let cfg = noiseless(5.0);
    let mut source = FixedFixtures::new(2.2, 1.0);
    let mut rng = StdRng::seed_from_u64(1);
    let scan = run_scan(&cfg, &mut source, &mut rng).unwrap();
    assert_eq!(scan.selected > 0, selected);
    // A noiseless quote hands the whole margin to the bookmaker.
    assert!(!selected);
    assert!(scan.predictions.is_empty());

    // Drop the threshold so every trial bets, and check the record itself.
    let cfg = noiseless(-100.0);
    let mut source = FixedFixtures::new(2.2, 1.0);
    let report = run_backtest(&cfg, &mut source, &mut rng).unwrap();
    assert_eq!(report.bets, 25);
    let first = &report.settled[0].record;
    assert_eq!(first.odds, expected_odds);
    assert_eq!(first.probability, round_to(p.home * 100.0, 1));
    assert_eq!(first.edge, round_to((p.home * expected_odds - 1.0) * 100.0, 1));
    assert_eq!(first.date, "2026-05-02 21:00");
    assert_eq!(first.id, 1);
    assert_eq!(report.predictions.len(), cfg.top_k);
}

#[test]
fn bad_fixtures_are_skipped_not_fatal() {
    let cfg = EngineConfig {
        simulation_count: 10,
        ..noiseless(-100.0)
    };
    let mut source = FixedFixtures::new(1.8, 1.2);
    source.bad_every = Some(2);
    let mut rng = StdRng::seed_from_u64(8);
    let report = run_backtest(&cfg, &mut source, &mut rng).unwrap();
    assert_eq!(report.skipped, 5);
    assert_eq!(report.bets, 5);
    let ids: Vec<u64> = report.settled.iter().map(|b| b.record.id).collect();
    assert_eq!(ids, vec![1, 3, 5, 7, 9]);
}

#[test]
fn config_errors_stop_before_any_trial() {
    let cfg = EngineConfig {
        stake_percent: 0.0,
        ..noiseless(5.0)
    };
    let mut source = FixedFixtures::new(1.8, 1.2);
    let mut rng = StdRng::seed_from_u64(8);
    let err = run_backtest(&cfg, &mut source, &mut rng).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            field: "stake_percent",
            ..
        }
    ));
    assert_eq!(source.calls, 0);

    let cfg = EngineConfig {
        margin: -1.0,
        ..noiseless(5.0)
    };
    assert!(run_scan(&cfg, &mut source, &mut rng).is_err());
    assert_eq!(source.calls, 0);
}

#[test]
fn top_k_zero_keeps_accounting() {
    let cfg = EngineConfig {
        top_k: 0,
        ..noiseless(-100.0)
    };
    let mut source = FixedFixtures::new(1.5, 1.5);
    let mut rng = StdRng::seed_from_u64(4);
    let report = run_backtest(&cfg, &mut source, &mut rng).unwrap();
    assert!(report.predictions.is_empty());
    assert_eq!(report.bets, 25);
}

#[test]
fn scripted_draws_settle_every_bet_the_same_way() {
    let p = outcome_probabilities(2.2, 1.0, 10).unwrap();
    let odds = round_to((1.0 / (p.home / p.total())) / 1.05, 2);

    // With uniforms of 0.5 the home side (e^-2.2) crosses on the fourth
    // draw and the away side (e^-1) on the second: every bet ends 3-1.
    let cfg = noiseless(-100.0);
    let mut source = FixedFixtures::new(2.2, 1.0);
    let mut rng = Constant::new(0.5);
    let report = run_backtest(&cfg, &mut source, &mut rng).unwrap();

    assert_eq!(report.bets, 25);
    assert_eq!(report.wins, 25);
    for bet in &report.settled {
        assert_eq!((bet.home_goals, bet.away_goals), (3, 1));
        assert_eq!(bet.record.odds, odds);
        assert_eq!(bet.record.status, PredictionStatus::Won);
    }
    // Three noise draws, four home draws and two away draws per trial.
    assert_eq!(rng.draws, 25 * 9);
    let expected = cfg.initial_bankroll + 25.0 * 20.0 * (odds - 1.0);
    assert!((report.final_bankroll - expected).abs() < 1e-9);
    assert_eq!(report.max_drawdown, 0.0);
    assert_eq!(report.calibration.home_hit_rate, 1.0);

    // Same draws, real threshold: selected iff p * odds - 1 > 5%.
    let cfg = noiseless(5.0);
    let mut source = FixedFixtures::new(2.2, 1.0);
    let mut rng = Constant::new(0.5);
    let scan = run_scan(&cfg, &mut source, &mut rng).unwrap();
    assert_eq!(scan.selected > 0, p.home * odds - 1.0 > 0.05);
}

#[test]
fn capped_draws_score_nil_nil_and_lose() {
    // 0.99^10 stays above both e^-5 and e^-1, so both sides fall back to 0.
    let cfg = noiseless(-100.0);
    let mut source = FixedFixtures::new(5.0, 1.0);
    let mut rng = Constant::new(0.99);
    let report = run_backtest(&cfg, &mut source, &mut rng).unwrap();

    assert_eq!(report.bets, 25);
    assert_eq!(report.losses, 25);
    assert!(
        report
            .settled
            .iter()
            .all(|b| b.home_goals == 0 && b.away_goals == 0)
    );
    assert_eq!(rng.draws, 25 * (3 + 10 + 10));
    assert!((report.final_bankroll - 500.0).abs() < 1e-9);
    assert!((report.max_drawdown - 500.0).abs() < 1e-9);
    assert_eq!(report.roi, -1.0);
}
