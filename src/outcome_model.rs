use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

pub const DEFAULT_MAX_GOALS: u32 = 10;

/// 1X2 probabilities. From the outcome model they sum to at most 1; mass
/// beyond the goal cap is dropped rather than redistributed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prob3 {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl Prob3 {
    pub fn total(&self) -> f64 {
        self.home + self.draw + self.away
    }
}

/// Win/draw/loss probabilities for two independent Poisson scorelines,
/// each truncated to `0..max_goals`.
pub fn outcome_probabilities(
    lambda_home: f64,
    lambda_away: f64,
    max_goals: u32,
) -> Result<Prob3, ModelError> {
    let pmf_h = poisson_pmf(lambda_home, max_goals)?;
    let pmf_a = poisson_pmf(lambda_away, max_goals)?;

    let mut p_home = 0.0_f64;
    let mut p_draw = 0.0_f64;
    let mut p_away = 0.0_f64;

    // Mirrored cells are accumulated in lockstep so equal lambdas give
    // bit-identical home and away sums.
    for h in 0..pmf_h.len() {
        for a in 0..h {
            p_home += pmf_h[h] * pmf_a[a];
            p_away += pmf_h[a] * pmf_a[h];
        }
        p_draw += pmf_h[h] * pmf_a[h];
    }

    Ok(Prob3 {
        home: p_home,
        draw: p_draw,
        away: p_away,
    })
}

/// P(k; lambda) for k in `0..max_goals`, by the recurrence
/// P(k) = P(k-1) * lambda / k so no factorial is ever materialised.
pub fn poisson_pmf(lambda: f64, max_goals: u32) -> Result<Vec<f64>, ModelError> {
    validate_lambda(lambda)?;
    if max_goals == 0 {
        return Err(ModelError::EmptySupport);
    }

    let n = max_goals as usize;
    let mut out = Vec::with_capacity(n);
    out.push((-lambda).exp());
    for k in 1..n {
        let prev = out[k - 1];
        out.push(prev * lambda / k as f64);
    }
    Ok(out)
}

/// Draws a goal count by Knuth's multiplication method: multiply uniforms
/// until the product drops below e^-lambda. A side that never crosses the
/// threshold within the cap scores 0.
pub fn sample_goals<R: Rng + ?Sized>(
    lambda: f64,
    max_goals: u32,
    rng: &mut R,
) -> Result<u32, ModelError> {
    validate_lambda(lambda)?;
    let threshold = (-lambda).exp();
    let mut product = 1.0_f64;
    for k in 0..max_goals {
        product *= rng.gen_range(0.0..1.0);
        if product < threshold {
            return Ok(k);
        }
    }
    Ok(0)
}

fn validate_lambda(lambda: f64) -> Result<(), ModelError> {
    if lambda.is_finite() && lambda > 0.0 {
        Ok(())
    } else {
        Err(ModelError::InvalidLambda(lambda))
    }
}
