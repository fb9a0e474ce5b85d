use crate::error::ModelError;

/// Expected profit per unit staked: `p * odds - 1`.
pub fn edge(p_model: f64, odds_market: f64) -> Result<f64, ModelError> {
    if !(0.0..=1.0).contains(&p_model) {
        return Err(ModelError::ProbabilityOutOfRange(p_model));
    }
    if !odds_market.is_finite() || odds_market < 0.0 {
        return Err(ModelError::InvalidOdds(odds_market));
    }
    Ok(p_model * odds_market - 1.0)
}

/// Strictly greater: an edge sitting exactly on the threshold is not a bet.
pub fn is_selected(edge_fraction: f64, min_edge_percent: f64) -> bool {
    edge_fraction * 100.0 > min_edge_percent
}
