use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{OracleError, Result};
use crate::player::PlayerStats;
use crate::prediction::Prediction;

/// Tournament stage, in order of increasing stakes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    League,
    #[serde(alias = "Qualifier 1", alias = "Qualifier 2")]
    Qualifier,
    Eliminator,
    Final,
}

impl Stage {
    pub fn is_playoff(self) -> bool {
        self != Stage::League
    }
}

impl FromStr for Stage {
    type Err = OracleError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "league" => Ok(Stage::League),
            "eliminator" => Ok(Stage::Eliminator),
            "final" => Ok(Stage::Final),
            _ if lower.starts_with("qualifier") => Ok(Stage::Qualifier),
            _ => Err(OracleError::UnknownStage(s.to_string())),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Match lifecycle. Moves forward only; `Completed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    #[serde(alias = "upcoming")]
    Upcoming,
    #[serde(alias = "live")]
    Live,
    #[serde(alias = "completed")]
    Completed,
}

impl MatchStatus {
    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        matches!(
            (self, next),
            (MatchStatus::Upcoming, MatchStatus::Live)
                | (MatchStatus::Upcoming, MatchStatus::Completed)
                | (MatchStatus::Live, MatchStatus::Completed)
        )
    }
}

/// In-progress telemetry for a live chase.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveMetrics {
    pub runs_needed: u32,
    pub balls_left: u32,
    pub wickets_lost: u32,
    pub current_rr: f64,
    pub required_rr: f64,
    pub target: u32,
    pub is_night_match: bool,

    /// Relative humidity (0-100)
    #[serde(default)]
    pub humidity: f64,

    /// Dew likelihood (0-1); falls back to the venue, then the model default
    #[serde(default)]
    pub dew_likelihood: Option<f64>,
}

/// Starting lineups for both sides, when announced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Lineups {
    #[serde(default)]
    pub team1: Vec<PlayerStats>,
    #[serde(default)]
    pub team2: Vec<PlayerStats>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub stage: Stage,
    pub team1: String,
    pub team2: String,
    pub status: MatchStatus,

    #[serde(default)]
    pub venue: Option<String>,

    #[serde(default)]
    pub live: Option<LiveMetrics>,

    #[serde(default)]
    pub lineups: Option<Lineups>,

    #[serde(default)]
    pub winner: Option<String>,

    #[serde(default)]
    pub player_of_the_match: Option<String>,

    #[serde(default)]
    pub prediction: Option<Prediction>,
}

impl Match {
    pub fn new(id: impl Into<String>, stage: Stage, team1: impl Into<String>, team2: impl Into<String>) -> Self {
        Match {
            id: id.into(),
            stage,
            team1: team1.into(),
            team2: team2.into(),
            status: MatchStatus::Upcoming,
            venue: None,
            live: None,
            lineups: None,
            winner: None,
            player_of_the_match: None,
            prediction: None,
        }
    }

    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    pub fn with_live(mut self, live: LiveMetrics) -> Self {
        self.live = Some(live);
        self
    }

    pub fn with_lineups(mut self, lineups: Lineups) -> Self {
        self.lineups = Some(lineups);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    pub fn team1_lineup(&self) -> Option<&[PlayerStats]> {
        self.lineups.as_ref().map(|l| l.team1.as_slice())
    }

    pub fn team2_lineup(&self) -> Option<&[PlayerStats]> {
        self.lineups.as_ref().map(|l| l.team2.as_slice())
    }

    /// Move the match forward in its lifecycle.
    pub fn set_status(&mut self, next: MatchStatus) -> Result<()> {
        if self.status == next {
            return Ok(());
        }
        if !self.status.can_transition_to(next) {
            return Err(OracleError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Resolve the match with a manually chosen winner.
    ///
    /// Any prediction already attached is kept so accuracy can be scored
    /// against it later.
    pub fn record_result(&mut self, winner: &str) -> Result<()> {
        if winner != self.team1 && winner != self.team2 {
            return Err(OracleError::MissingTeam(winner.to_string()));
        }
        self.set_status(MatchStatus::Completed)?;
        self.winner = Some(winner.to_string());
        Ok(())
    }
}
