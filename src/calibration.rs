use serde::{Deserialize, Serialize};

use crate::outcome_model::Prob3;
use crate::simulation::SettledBet;

const RELIABILITY_BINS: usize = 10;
const LOG_FLOOR: f64 = 1e-12;

/// How the model's home-win probability held up on the bets it placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub bets: usize,
    pub mean_home_prob: f64,
    pub home_hit_rate: f64,
    /// Binary Brier score of the backed home-win event.
    pub home_brier: f64,
    pub home_log_loss: f64,
    /// Brier score of the full 1X2 distribution against the final score.
    pub brier_1x2: f64,
    /// Placed bets grouped by model probability, empty bins left out.
    pub reliability: Vec<ReliabilityBin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityBin {
    pub lower: f64,
    pub upper: f64,
    pub bets: usize,
    pub mean_prob: f64,
    pub hit_rate: f64,
}

impl Calibration {
    pub fn empty() -> Self {
        Self {
            bets: 0,
            mean_home_prob: 0.0,
            home_hit_rate: 0.0,
            home_brier: 0.0,
            home_log_loss: 0.0,
            brier_1x2: 0.0,
            reliability: Vec::new(),
        }
    }

    /// Mean predicted minus realised. Positive means the model was too keen
    /// on the home sides it backed.
    pub fn overconfidence(&self) -> f64 {
        self.mean_home_prob - self.home_hit_rate
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Bin {
    bets: usize,
    prob_sum: f64,
    hits: usize,
}

pub fn calibrate(settled: &[SettledBet]) -> Calibration {
    if settled.is_empty() {
        return Calibration::empty();
    }

    let mut bins = [Bin::default(); RELIABILITY_BINS];
    let mut prob_sum = 0.0_f64;
    let mut hits = 0usize;
    let mut brier_sum = 0.0_f64;
    let mut log_loss_sum = 0.0_f64;
    let mut brier_1x2_sum = 0.0_f64;

    for bet in settled {
        let p = bet.model.home.clamp(0.0, 1.0);
        let won = bet.home_goals > bet.away_goals;

        prob_sum += p;
        if won {
            hits += 1;
            brier_sum += (1.0 - p).powi(2);
            log_loss_sum -= p.max(LOG_FLOOR).ln();
        } else {
            brier_sum += p.powi(2);
            log_loss_sum -= (1.0 - p).max(LOG_FLOOR).ln();
        }
        brier_1x2_sum += scoreline_brier(bet.model, bet.home_goals, bet.away_goals);

        let idx = ((p * RELIABILITY_BINS as f64) as usize).min(RELIABILITY_BINS - 1);
        let bin = &mut bins[idx];
        bin.bets += 1;
        bin.prob_sum += p;
        if won {
            bin.hits += 1;
        }
    }

    let n = settled.len() as f64;
    let width = 1.0 / RELIABILITY_BINS as f64;
    let reliability = bins
        .iter()
        .enumerate()
        .filter(|(_, b)| b.bets > 0)
        .map(|(i, b)| ReliabilityBin {
            lower: i as f64 * width,
            upper: (i + 1) as f64 * width,
            bets: b.bets,
            mean_prob: b.prob_sum / b.bets as f64,
            hit_rate: b.hits as f64 / b.bets as f64,
        })
        .collect();

    Calibration {
        bets: settled.len(),
        mean_home_prob: prob_sum / n,
        home_hit_rate: hits as f64 / n,
        home_brier: brier_sum / n,
        home_log_loss: log_loss_sum / n,
        brier_1x2: brier_1x2_sum / n,
        reliability,
    }
}

/// Squared distance between the 1X2 distribution and the indicator of the
/// result the scoreline produced.
fn scoreline_brier(model: Prob3, home_goals: u32, away_goals: u32) -> f64 {
    let (home, draw, away) = match home_goals.cmp(&away_goals) {
        std::cmp::Ordering::Greater => (1.0, 0.0, 0.0),
        std::cmp::Ordering::Equal => (0.0, 1.0, 0.0),
        std::cmp::Ordering::Less => (0.0, 0.0, 1.0),
    };
    (model.home - home).powi(2) + (model.draw - draw).powi(2) + (model.away - away).powi(2)
}
