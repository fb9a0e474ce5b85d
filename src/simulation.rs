use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::calibration::{Calibration, calibrate};
use crate::config::EngineConfig;
use crate::edge::{edge, is_selected};
use crate::error::{ConfigError, ModelError};
use crate::fixtures::{Fixture, FixtureSource, MatchGenerator};
use crate::market::{MarketQuote, round_to, synthetic_quote};
use crate::outcome_model::{Prob3, outcome_probabilities, sample_goals};
use crate::predictions::{
    DATE_FORMAT, HOME_WIN_LABEL, PredictionRecord, PredictionStatus, rank_top_k,
};

/// A fixture carried through the model, market and edge stages.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedFixture {
    pub fixture: Fixture,
    pub model: Prob3,
    pub quote: MarketQuote,
    pub edge: f64,
}

impl PricedFixture {
    pub fn to_record(&self, id: u64) -> PredictionRecord {
        PredictionRecord {
            id,
            date: self.fixture.kickoff.format(DATE_FORMAT).to_string(),
            league: self.fixture.league.clone(),
            home: self.fixture.home.clone(),
            away: self.fixture.away.clone(),
            prediction: HOME_WIN_LABEL.to_string(),
            odds: self.quote.home,
            probability: round_to(self.model.home * 100.0, 1),
            edge: round_to(self.edge * 100.0, 1),
            status: PredictionStatus::Pending,
        }
    }
}

pub fn price_fixture<R: Rng + ?Sized>(
    fixture: Fixture,
    cfg: &EngineConfig,
    rng: &mut R,
) -> Result<PricedFixture, ModelError> {
    let model = outcome_probabilities(fixture.lambda_home, fixture.lambda_away, cfg.max_goals)?;
    let quote = synthetic_quote(model, cfg.noise_range, cfg.margin, rng)?;
    let edge = edge(model.home, quote.home)?;
    Ok(PricedFixture {
        fixture,
        model,
        quote,
        edge,
    })
}

/// Running bankroll for one backtest. Lives only for the run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestState {
    pub bankroll: f64,
    pub staked: f64,
    pub wins: usize,
    pub losses: usize,
    pub peak: f64,
    pub max_drawdown: f64,
}

impl BacktestState {
    pub fn new(initial_bankroll: f64) -> Self {
        Self {
            bankroll: initial_bankroll,
            staked: 0.0,
            wins: 0,
            losses: 0,
            peak: initial_bankroll,
            max_drawdown: 0.0,
        }
    }

    pub fn record_win(&mut self, stake: f64, odds: f64) {
        self.staked += stake;
        self.bankroll += stake * (odds - 1.0);
        self.wins += 1;
        self.track_drawdown();
    }

    pub fn record_loss(&mut self, stake: f64) {
        self.staked += stake;
        self.bankroll -= stake;
        self.losses += 1;
        self.track_drawdown();
    }

    pub fn bets(&self) -> usize {
        self.wins + self.losses
    }

    fn track_drawdown(&mut self) {
        self.peak = self.peak.max(self.bankroll);
        self.max_drawdown = self.max_drawdown.max(self.peak - self.bankroll);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettledBet {
    pub record: PredictionRecord,
    /// Unrounded model distribution the bet was priced from.
    pub model: Prob3,
    pub home_goals: u32,
    pub away_goals: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub trials: usize,
    pub skipped: usize,
    pub bets: usize,
    pub wins: usize,
    pub losses: usize,
    pub initial_bankroll: f64,
    pub final_bankroll: f64,
    pub total_staked: f64,
    pub profit: f64,
    /// wins / bets, 0 when nothing was placed.
    pub win_rate: f64,
    /// profit / staked, 0 when nothing was staked.
    pub roi: f64,
    pub peak_bankroll: f64,
    pub max_drawdown: f64,
    pub avg_odds: f64,
    pub avg_edge_percent: f64,
    pub calibration: Calibration,
    /// Every placed bet, in trial order.
    pub settled: Vec<SettledBet>,
    /// Top-K by edge.
    pub predictions: Vec<PredictionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub trials: usize,
    pub skipped: usize,
    pub selected: usize,
    pub predictions: Vec<PredictionRecord>,
}

/// Backtest with a fresh generator from `cfg.rng_seed` (entropy when unset)
/// and random fixtures from the configured roster.
pub fn run_backtest_seeded(
    cfg: &EngineConfig,
    anchor: NaiveDateTime,
) -> Result<BacktestReport, ConfigError> {
    let mut rng = rng_for(cfg);
    let mut source = MatchGenerator::new(cfg.roster.clone(), cfg.strength, anchor)?;
    run_backtest(cfg, &mut source, &mut rng)
}

pub fn run_scan_seeded(
    cfg: &EngineConfig,
    anchor: NaiveDateTime,
) -> Result<ScanReport, ConfigError> {
    let mut rng = rng_for(cfg);
    let mut source = MatchGenerator::new(cfg.roster.clone(), cfg.strength, anchor)?;
    run_scan(cfg, &mut source, &mut rng)
}

pub fn rng_for(cfg: &EngineConfig) -> StdRng {
    match cfg.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Prices `cfg.simulation_count` fixtures, bets a flat stake on every home
/// side whose edge clears the threshold, and settles each bet with goals
/// drawn from the same expected-goals rates used for pricing.
pub fn run_backtest<S, R>(
    cfg: &EngineConfig,
    source: &mut S,
    rng: &mut R,
) -> Result<BacktestReport, ConfigError>
where
    S: FixtureSource + ?Sized,
    R: Rng,
{
    cfg.validate()?;

    let stake = cfg.stake();
    let mut state = BacktestState::new(cfg.initial_bankroll);
    let mut skipped = 0usize;
    let mut settled = Vec::new();

    // Record ids are the 1-based trial number.
    for (trial, id) in (0..cfg.simulation_count).zip(1u64..) {
        let fixture = source.next_fixture(rng);
        let priced = match price_fixture(fixture, cfg, rng) {
            Ok(p) => p,
            Err(err) => {
                warn!(trial, %err, "skipping unpriceable fixture");
                skipped += 1;
                continue;
            }
        };
        if !is_selected(priced.edge, cfg.min_edge_percent) {
            continue;
        }

        let scoreline = simulate_scoreline(&priced.fixture, cfg.max_goals, rng);
        let (home_goals, away_goals) = match scoreline {
            Ok(g) => g,
            Err(err) => {
                warn!(trial, %err, "skipping unsettleable fixture");
                skipped += 1;
                continue;
            }
        };

        let won = home_goals > away_goals;
        if won {
            state.record_win(stake, priced.quote.home);
        } else {
            state.record_loss(stake);
        }

        let mut record = priced.to_record(id);
        record.settle(won);
        let market_home = priced.quote.no_vig().map(|fair| fair.home);
        debug!(
            id = record.id,
            home = %record.home,
            away = %record.away,
            odds = record.odds,
            model_home = priced.model.home,
            market_home = ?market_home,
            edge = record.edge,
            home_goals,
            away_goals,
            won,
            "bet settled"
        );

        settled.push(SettledBet {
            record,
            model: priced.model,
            home_goals,
            away_goals,
        });
    }

    let bets = state.bets();
    let (win_rate, avg_odds, avg_edge_percent) = if bets > 0 {
        let n = bets as f64;
        (
            state.wins as f64 / n,
            settled.iter().map(|b| b.record.odds).sum::<f64>() / n,
            settled.iter().map(|b| b.record.edge).sum::<f64>() / n,
        )
    } else {
        (0.0, 0.0, 0.0)
    };
    let profit = state.bankroll - cfg.initial_bankroll;
    let roi = if state.staked > 0.0 {
        profit / state.staked
    } else {
        0.0
    };

    let records = settled.iter().map(|b| b.record.clone()).collect();
    let predictions = rank_top_k(records, cfg.top_k);

    info!(
        trials = cfg.simulation_count,
        skipped,
        bets,
        wins = state.wins,
        bankroll = state.bankroll,
        roi,
        "backtest finished"
    );

    Ok(BacktestReport {
        trials: cfg.simulation_count,
        skipped,
        bets,
        wins: state.wins,
        losses: state.losses,
        initial_bankroll: cfg.initial_bankroll,
        final_bankroll: state.bankroll,
        total_staked: state.staked,
        profit,
        win_rate,
        roi,
        peak_bankroll: state.peak,
        max_drawdown: state.max_drawdown,
        avg_odds,
        avg_edge_percent,
        calibration: calibrate(&settled),
        settled,
        predictions,
    })
}

fn simulate_scoreline<R: Rng + ?Sized>(
    fixture: &Fixture,
    max_goals: u32,
    rng: &mut R,
) -> Result<(u32, u32), ModelError> {
    let home = sample_goals(fixture.lambda_home, max_goals, rng)?;
    let away = sample_goals(fixture.lambda_away, max_goals, rng)?;
    Ok((home, away))
}

/// Live variant: same pricing and selection, no settlement. Every record
/// is left pending for the store.
pub fn run_scan<S, R>(
    cfg: &EngineConfig,
    source: &mut S,
    rng: &mut R,
) -> Result<ScanReport, ConfigError>
where
    S: FixtureSource + ?Sized,
    R: Rng,
{
    cfg.validate()?;

    let mut skipped = 0usize;
    let mut candidates = Vec::new();

    for (trial, id) in (0..cfg.simulation_count).zip(1u64..) {
        let fixture = source.next_fixture(rng);
        match price_fixture(fixture, cfg, rng) {
            Ok(priced) if is_selected(priced.edge, cfg.min_edge_percent) => {
                candidates.push(priced.to_record(id));
            }
            Ok(_) => {}
            Err(err) => {
                warn!(trial, %err, "skipping unpriceable fixture");
                skipped += 1;
            }
        }
    }

    let selected = candidates.len();
    let predictions = rank_top_k(candidates, cfg.top_k);
    info!(
        trials = cfg.simulation_count,
        skipped,
        selected,
        kept = predictions.len(),
        "scan finished"
    );

    Ok(ScanReport {
        trials: cfg.simulation_count,
        skipped,
        selected,
        predictions,
    })
}
