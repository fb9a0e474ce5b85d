use std::collections::HashSet;

use chrono::{Duration as ChronoDuration, NaiveDateTime};
use rand::Rng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DOMESTIC_LEAGUE: &str = "Ligue 1";
pub const CUP_LEAGUE: &str = "Champions League";

const DEFAULT_TEAMS: &[&str] = &[
    "PSG",
    "Marseille",
    "Lyon",
    "Monaco",
    "Lille",
    "Lens",
    "Rennes",
    "Nice",
    "Real Madrid",
    "Barcelona",
    "Atletico",
    "Sevilla",
    "Man City",
    "Arsenal",
    "Liverpool",
    "Man Utd",
];

const DEFAULT_DOMESTIC: &[&str] = &["PSG", "Marseille", "Lens"];

const KICKOFF_WINDOW_DAYS: i64 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub teams: Vec<String>,
    /// Home clubs whose fixtures are labelled as the domestic league.
    pub domestic: Vec<String>,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            teams: DEFAULT_TEAMS.iter().map(|t| t.to_string()).collect(),
            domestic: DEFAULT_DOMESTIC.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Roster {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.teams.len() < 2 {
            return Err(ConfigError::InvalidValue {
                field: "roster",
                reason: format!("need at least two teams, got {}", self.teams.len()),
            });
        }
        let mut seen = HashSet::with_capacity(self.teams.len());
        for team in &self.teams {
            if team.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "roster",
                    reason: "team names must not be blank".to_string(),
                });
            }
            if !seen.insert(team.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "roster",
                    reason: format!("team {team:?} is listed twice"),
                });
            }
        }
        if let Some(stray) = self.domestic.iter().find(|t| !seen.contains(t.as_str())) {
            return Err(ConfigError::InvalidValue {
                field: "roster",
                reason: format!("domestic club {stray:?} is not in the team list"),
            });
        }
        Ok(())
    }

    pub fn league_for(&self, home: &str) -> &'static str {
        if self.domestic.iter().any(|t| t == home) {
            DOMESTIC_LEAGUE
        } else {
            CUP_LEAGUE
        }
    }
}

/// How sampled team strengths turn into expected goals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthModel {
    pub home_strength: (f64, f64),
    pub away_strength: (f64, f64),
    pub home_advantage: f64,
}

impl StrengthModel {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive_range("strength.home_strength", self.home_strength)?;
        positive_range("strength.away_strength", self.away_strength)?;
        if !self.home_advantage.is_finite() || self.home_advantage <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "strength.home_advantage",
                reason: format!("must be positive, got {}", self.home_advantage),
            });
        }
        Ok(())
    }
}

fn positive_range(field: &'static str, (lo, hi): (f64, f64)) -> Result<(), ConfigError> {
    if lo.is_finite() && hi.is_finite() && lo > 0.0 && lo <= hi {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("need 0 < low <= high, got ({lo}, {hi})"),
        })
    }
}

impl Default for StrengthModel {
    fn default() -> Self {
        Self {
            home_strength: (1.1, 2.5),
            away_strength: (0.8, 2.0),
            home_advantage: 1.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub home: String,
    pub away: String,
    pub league: String,
    pub kickoff: NaiveDateTime,
    pub lambda_home: f64,
    pub lambda_away: f64,
}

/// Where the loop gets its fixtures. Swap in a real xG feed here; the loop
/// only reads the fields of [`Fixture`].
pub trait FixtureSource {
    fn next_fixture(&mut self, rng: &mut dyn RngCore) -> Fixture;
}

/// Random fixtures drawn from a roster, for backtests and the demo scan.
/// Only built from a valid roster and strength model, so sampling never
/// pairs a club with itself.
#[derive(Debug, Clone)]
pub struct MatchGenerator {
    roster: Roster,
    strength: StrengthModel,
    anchor: NaiveDateTime,
}

impl MatchGenerator {
    pub fn new(
        roster: Roster,
        strength: StrengthModel,
        anchor: NaiveDateTime,
    ) -> Result<Self, ConfigError> {
        roster.validate()?;
        strength.validate()?;
        Ok(Self {
            roster,
            strength,
            anchor,
        })
    }

    pub fn sample_fixture<R: Rng + ?Sized>(&self, rng: &mut R) -> Fixture {
        let teams = &self.roster.teams;
        let home_idx = rng.gen_range(0..teams.len());
        let mut away_idx = rng.gen_range(0..teams.len() - 1);
        if away_idx >= home_idx {
            away_idx += 1;
        }
        let home = teams[home_idx].clone();
        let away = teams[away_idx].clone();

        let (h_lo, h_hi) = self.strength.home_strength;
        let (a_lo, a_hi) = self.strength.away_strength;
        let home_strength = rng.gen_range(h_lo..=h_hi);
        let away_strength = rng.gen_range(a_lo..=a_hi);

        let days = rng.gen_range(0..=KICKOFF_WINDOW_DAYS);
        let kickoff = self.anchor + ChronoDuration::days(days);

        Fixture {
            league: self.roster.league_for(&home).to_string(),
            home,
            away,
            kickoff,
            lambda_home: home_strength * self.strength.home_advantage,
            lambda_away: away_strength,
        }
    }
}

impl FixtureSource for MatchGenerator {
    fn next_fixture(&mut self, rng: &mut dyn RngCore) -> Fixture {
        self.sample_fixture(rng)
    }
}
