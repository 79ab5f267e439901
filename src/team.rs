use serde::{Deserialize, Serialize};

use crate::constants::ELO_BASELINE;

/// Outcome token in a team's recent-form window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormResult {
    #[serde(rename = "W", alias = "Win")]
    Win,
    #[serde(rename = "L", alias = "Loss")]
    Loss,
}

/// A team's season aggregate as supplied by the data-sync layer.
///
/// `recent_form` is ordered most-recent-last. Optional skill proxies are
/// resolved to their defaults once, through [`ResolvedStats`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    pub name: String,
    pub played: u32,
    pub won: u32,
    pub lost: u32,

    /// Net run rate, signed
    pub nrr: f64,

    pub points: u32,

    /// Elo-style rating centered near 1500
    pub elo: i32,

    #[serde(default)]
    pub recent_form: Vec<FormResult>,

    /// Powerplay performance (0-1)
    pub powerplay_performance: f64,

    /// Death-overs bowling strength (0-1)
    pub death_bowling_strength: f64,

    #[serde(default)]
    pub home_advantage: Option<f64>,

    #[serde(default)]
    pub clutch_factor: Option<f64>,
}

impl TeamStats {
    /// Create a team with neutral skill proxies and an empty form window.
    pub fn new(name: impl Into<String>, elo: i32) -> Self {
        TeamStats {
            name: name.into(),
            played: 0,
            won: 0,
            lost: 0,
            nrr: 0.0,
            points: 0,
            elo,
            recent_form: Vec::new(),
            powerplay_performance: 0.5,
            death_bowling_strength: 0.5,
            home_advantage: None,
            clutch_factor: None,
        }
    }

    /// Fraction of wins in the recent-form window; 0 when the window is empty.
    pub fn form_fraction(&self) -> f64 {
        if self.recent_form.is_empty() {
            return 0.0;
        }
        let wins = self
            .recent_form
            .iter()
            .filter(|r| **r == FormResult::Win)
            .count();
        wins as f64 / self.recent_form.len() as f64
    }

    /// Overwrite the table columns the sync layer reports.
    pub fn apply_update(&mut self, update: &StandingsUpdate) {
        if let Some(points) = update.points {
            self.points = points;
        }
        if let Some(nrr) = update.nrr {
            self.nrr = nrr;
        }
        if let Some(played) = update.played {
            self.played = played;
        }
        if let Some(won) = update.won {
            self.won = won;
        }
        if let Some(lost) = update.lost {
            self.lost = lost;
        }
    }
}

/// Defaults applied to optional team fields before feature extraction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatDefaults {
    pub clutch_factor: f64,
    pub home_advantage: f64,
}

impl Default for StatDefaults {
    fn default() -> Self {
        StatDefaults {
            clutch_factor: 0.75,
            home_advantage: 0.0,
        }
    }
}

/// Every numeric feature of a team with optional fields filled in.
///
/// Built once per prediction so that each feature sees the same defaulted
/// value. Non-finite inputs collapse to the neutral value for that field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedStats {
    pub elo: f64,
    pub nrr: f64,
    pub form: f64,
    pub powerplay: f64,
    pub death_bowling: f64,
    pub clutch: f64,
    pub home_advantage: f64,
}

impl ResolvedStats {
    pub fn resolve(team: &TeamStats, defaults: &StatDefaults) -> Self {
        ResolvedStats {
            elo: team.elo as f64,
            nrr: finite_or(team.nrr, 0.0),
            form: team.form_fraction(),
            powerplay: finite_or(team.powerplay_performance, 0.5),
            death_bowling: finite_or(team.death_bowling_strength, 0.5),
            clutch: finite_or(
                team.clutch_factor.unwrap_or(defaults.clutch_factor),
                defaults.clutch_factor,
            ),
            home_advantage: finite_or(
                team.home_advantage.unwrap_or(defaults.home_advantage),
                defaults.home_advantage,
            ),
        }
    }

    /// Elo offset from the baseline rating
    pub fn elo_offset(&self) -> f64 {
        self.elo - ELO_BASELINE
    }
}

pub(crate) fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Partial standings row reported by the live data source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StandingsUpdate {
    pub name: String,
    pub points: Option<u32>,
    pub nrr: Option<f64>,
    pub played: Option<u32>,
    pub won: Option<u32>,
    pub lost: Option<u32>,
}

/// Merge synced standings rows into the current table.
///
/// Rows are matched by case-insensitive containment in either direction, so
/// "RCB Women" style variants still land on the right team. Teams with no
/// matching row are returned unchanged.
pub fn merge_standings(current: &[TeamStats], updates: &[StandingsUpdate]) -> Vec<TeamStats> {
    current
        .iter()
        .map(|team| {
            let mut merged = team.clone();
            let own = team.name.to_lowercase();
            let found = updates.iter().find(|u| {
                let other = u.name.to_lowercase();
                !own.is_empty() && !other.is_empty() && (other.contains(&own) || own.contains(&other))
            });
            if let Some(update) = found {
                merged.apply_update(update);
            }
            merged
        })
        .collect()
}
