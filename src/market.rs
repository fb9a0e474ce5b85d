use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::outcome_model::Prob3;

/// Decimal 1X2 prices from the simulated bookmaker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl MarketQuote {
    /// 1/odds per outcome. Sums above 1 by the bookmaker's margin.
    pub fn implied(&self) -> Prob3 {
        Prob3 {
            home: 1.0 / self.home,
            draw: 1.0 / self.draw,
            away: 1.0 / self.away,
        }
    }

    pub fn overround(&self) -> f64 {
        self.implied().total() - 1.0
    }

    /// Implied probabilities with the margin stripped out.
    pub fn no_vig(&self) -> Option<Prob3> {
        let implied = self.implied();
        let sum = implied.total();
        if !sum.is_finite() || sum <= 0.0 {
            return None;
        }
        Some(Prob3 {
            home: implied.home / sum,
            draw: implied.draw / sum,
            away: implied.away / sum,
        })
    }
}

/// Prices a fixture the way an imperfect bookmaker might: each true
/// probability is scaled by an independent factor from `noise_range`, the
/// triple is renormalised, and the margin is loaded onto every price.
pub fn synthetic_quote<R: Rng + ?Sized>(
    probs: Prob3,
    noise_range: (f64, f64),
    margin: f64,
    rng: &mut R,
) -> Result<MarketQuote, ModelError> {
    for p in [probs.home, probs.draw, probs.away] {
        if !(0.0..=1.0).contains(&p) {
            return Err(ModelError::ProbabilityOutOfRange(p));
        }
    }

    let (lo, hi) = noise_range;
    let perturbed_h = probs.home * rng.gen_range(lo..=hi);
    let perturbed_d = probs.draw * rng.gen_range(lo..=hi);
    let perturbed_a = probs.away * rng.gen_range(lo..=hi);

    let total = perturbed_h + perturbed_d + perturbed_a;
    if !total.is_finite() || total <= 0.0 {
        return Err(ModelError::DivisionByZero(total));
    }

    Ok(MarketQuote {
        home: margin_loaded_odds(perturbed_h / total, margin)?,
        draw: margin_loaded_odds(perturbed_d / total, margin)?,
        away: margin_loaded_odds(perturbed_a / total, margin)?,
    })
}

/// `(1/p) / (1 + margin)`, rounded to cents.
pub fn margin_loaded_odds(prob: f64, margin: f64) -> Result<f64, ModelError> {
    if !prob.is_finite() || prob <= 0.0 {
        return Err(ModelError::DivisionByZero(prob));
    }
    let odds = (1.0 / prob) / (1.0 + margin);
    Ok(round_to(odds, 2))
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10.0_f64.powi(decimals);
    (value * scale).round() / scale
}
