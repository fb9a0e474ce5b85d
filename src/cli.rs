use std::path::PathBuf;
use std::str::FromStr;

use crate::config::EngineConfig;
use crate::error::ConfigError;

/// `--name value` / `--name=value` lookups over the process arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    raw: Vec<String>,
}

impl Args {
    pub fn from_env() -> Self {
        Self::new(std::env::args().skip(1))
    }

    pub fn new(raw: impl IntoIterator<Item = String>) -> Self {
        Self {
            raw: raw.into_iter().collect(),
        }
    }

    pub fn raw_value(&self, name: &str) -> Option<&str> {
        let prefix = format!("{name}=");
        for (idx, arg) in self.raw.iter().enumerate() {
            if let Some(value) = arg.strip_prefix(&prefix) {
                return Some(value.trim());
            }
            if arg == name
                && let Some(next) = self.raw.get(idx + 1)
            {
                return Some(next.trim());
            }
        }
        None
    }

    pub fn value<T: FromStr>(&self, name: &str) -> Result<Option<T>, ConfigError> {
        let Some(raw) = self.raw_value(name) else {
            return Ok(None);
        };
        raw.parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Unparseable {
                var: name.to_string(),
                value: raw.to_string(),
            })
    }

    pub fn path(&self, name: &str) -> Option<PathBuf> {
        self.raw_value(name)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.raw.iter().any(|arg| arg == name)
    }

    /// Layers command-line overrides on top of `cfg`.
    pub fn apply(&self, cfg: &mut EngineConfig) -> Result<(), ConfigError> {
        if let Some(v) = self.value("--simulations")? {
            cfg.simulation_count = v;
        }
        if let Some(v) = self.value("--min-edge")? {
            cfg.min_edge_percent = v;
        }
        if let Some(v) = self.value("--bankroll")? {
            cfg.initial_bankroll = v;
        }
        if let Some(v) = self.value("--stake-pct")? {
            cfg.stake_percent = v;
        }
        if let Some(v) = self.value("--margin")? {
            cfg.margin = v;
        }
        if let Some(v) = self.value("--noise-low")? {
            cfg.noise_range.0 = v;
        }
        if let Some(v) = self.value("--noise-high")? {
            cfg.noise_range.1 = v;
        }
        if let Some(v) = self.value("--max-goals")? {
            cfg.max_goals = v;
        }
        if let Some(v) = self.value("--top-k")? {
            cfg.top_k = v;
        }
        if let Some(v) = self.value("--seed")? {
            cfg.rng_seed = Some(v);
        }
        Ok(())
    }
}
