use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OracleError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Batter,
    Bowler,
    #[serde(rename = "All-rounder", alias = "AllRounder")]
    AllRounder,
    #[serde(alias = "WK")]
    Wicketkeeper,
}

impl Role {
    /// Roles whose scoring contribution comes mainly from the bat.
    pub fn bats(self) -> bool {
        matches!(self, Role::Batter | Role::AllRounder | Role::Wicketkeeper)
    }

    pub fn bowls(self) -> bool {
        matches!(self, Role::Bowler | Role::AllRounder)
    }
}

impl FromStr for Role {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batter" | "batsman" => Ok(Role::Batter),
            "bowler" => Ok(Role::Bowler),
            "all-rounder" | "allrounder" | "all rounder" => Ok(Role::AllRounder),
            "wk" | "wicketkeeper" | "wicket-keeper" => Ok(Role::Wicketkeeper),
            _ => Err(OracleError::UnknownRole(s.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Batter => "Batter",
            Role::Bowler => "Bowler",
            Role::AllRounder => "All-rounder",
            Role::Wicketkeeper => "Wicketkeeper",
        };
        f.write_str(label)
    }
}

/// One entrant of a starting lineup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub name: String,
    pub role: Role,

    /// Recent-form index (0-1)
    pub recent_form_index: f64,

    /// Impact score (0-100)
    #[serde(default)]
    pub impact_score: Option<f64>,

    #[serde(default)]
    pub strike_rate: Option<f64>,

    #[serde(default)]
    pub economy: Option<f64>,
}

impl PlayerStats {
    pub fn new(name: impl Into<String>, role: Role, recent_form_index: f64) -> Self {
        PlayerStats {
            name: name.into(),
            role,
            recent_form_index,
            impact_score: None,
            strike_rate: None,
            economy: None,
        }
    }

    pub fn with_impact(mut self, impact: f64) -> Self {
        self.impact_score = Some(impact);
        self
    }

    pub fn with_strike_rate(mut self, strike_rate: f64) -> Self {
        self.strike_rate = Some(strike_rate);
        self
    }

    pub fn with_economy(mut self, economy: f64) -> Self {
        self.economy = Some(economy);
        self
    }
}
