use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fixtures::{Roster, StrengthModel};
use crate::outcome_model::DEFAULT_MAX_GOALS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub simulation_count: usize,
    pub min_edge_percent: f64,
    pub initial_bankroll: f64,
    /// Flat stake as a percentage of the initial bankroll.
    pub stake_percent: f64,
    pub margin: f64,
    pub noise_range: (f64, f64),
    pub max_goals: u32,
    pub top_k: usize,
    pub rng_seed: Option<u64>,
    #[serde(default)]
    pub roster: Roster,
    #[serde(default)]
    pub strength: StrengthModel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            simulation_count: 100,
            min_edge_percent: 5.0,
            initial_bankroll: 1000.0,
            stake_percent: 2.0,
            margin: 0.05,
            noise_range: (0.85, 1.15),
            max_goals: DEFAULT_MAX_GOALS,
            top_k: 12,
            rng_seed: None,
            roster: Roster::default(),
            strength: StrengthModel::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `XG_*` variables. A variable that is set but
    /// does not parse is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(v) = env_parse("XG_SIMULATION_COUNT")? {
            cfg.simulation_count = v;
        }
        if let Some(v) = env_parse("XG_MIN_EDGE_PERCENT")? {
            cfg.min_edge_percent = v;
        }
        if let Some(v) = env_parse("XG_INITIAL_BANKROLL")? {
            cfg.initial_bankroll = v;
        }
        if let Some(v) = env_parse("XG_STAKE_PERCENT")? {
            cfg.stake_percent = v;
        }
        if let Some(v) = env_parse("XG_MARGIN")? {
            cfg.margin = v;
        }
        if let Some(v) = env_parse("XG_NOISE_LOW")? {
            cfg.noise_range.0 = v;
        }
        if let Some(v) = env_parse("XG_NOISE_HIGH")? {
            cfg.noise_range.1 = v;
        }
        if let Some(v) = env_parse("XG_MAX_GOALS")? {
            cfg.max_goals = v;
        }
        if let Some(v) = env_parse("XG_TOP_K")? {
            cfg.top_k = v;
        }
        if let Some(v) = env_parse("XG_SEED")? {
            cfg.rng_seed = Some(v);
        }
        Ok(cfg)
    }

    pub fn stake(&self) -> f64 {
        self.initial_bankroll * (self.stake_percent / 100.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_edge_percent.is_finite() {
            return Err(invalid("min_edge_percent", "must be finite"));
        }
        if !self.initial_bankroll.is_finite() || self.initial_bankroll <= 0.0 {
            return Err(invalid(
                "initial_bankroll",
                format!("must be positive, got {}", self.initial_bankroll),
            ));
        }
        if !(self.stake_percent > 0.0 && self.stake_percent <= 100.0) {
            return Err(invalid(
                "stake_percent",
                format!("must be in (0, 100], got {}", self.stake_percent),
            ));
        }
        if !self.margin.is_finite() || self.margin <= -1.0 {
            return Err(invalid(
                "margin",
                format!("must be greater than -1, got {}", self.margin),
            ));
        }
        let (lo, hi) = self.noise_range;
        if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && lo <= hi) {
            return Err(invalid(
                "noise_range",
                format!("need 0 < low <= high, got ({lo}, {hi})"),
            ));
        }
        if self.max_goals == 0 {
            return Err(invalid("max_goals", "must be at least 1"));
        }
        self.strength.validate()?;
        self.roster.validate()
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::Unparseable {
            var: key.to_string(),
            value: raw.clone(),
        })
}
