use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ConfidenceConfig;

/// Qualitative confidence, ordered from weakest to strongest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    #[serde(rename = "Toss-up")]
    TossUp,
    Lean,
    Medium,
    High,
}

impl Confidence {
    /// Step function of the distance between `p` and even odds.
    ///
    /// Working on `|p - 0.5|` keeps the bands symmetric and monotonic.
    pub fn from_probability(p: f64, cfg: &ConfidenceConfig) -> Self {
        if !p.is_finite() {
            return Confidence::TossUp;
        }
        let edge = (p - 0.5).abs();
        if edge > cfg.high - 0.5 {
            Confidence::High
        } else if edge > cfg.medium - 0.5 {
            Confidence::Medium
        } else if edge > cfg.lean - 0.5 {
            Confidence::Lean
        } else {
            Confidence::TossUp
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::TossUp => "Toss-up",
            Confidence::Lean => "Lean",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct XiStrength {
    pub team1: f64,
    pub team2: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnsembleMetrics {
    /// Team 1's recent-form win fraction
    pub momentum_score: f64,

    /// Stage pressure coefficient applied to death bowling
    pub pressure_index: f64,

    pub logistic_prob: f64,
    pub elo_prob: f64,

    /// Absent when the active model gives the multi-signal blend no weight
    #[serde(default)]
    pub gradient_boost_score: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerOfMatchPick {
    pub name: String,
    pub team: String,
    pub probability: f64,
    pub reasoning: Vec<String>,
}

/// Derived, per-refresh estimate for one fixture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub team1_win_prob: f64,
    pub team2_win_prob: f64,
    pub confidence: Confidence,
    pub factors: Vec<String>,
    pub xi_strength: XiStrength,

    /// Shift in calibrated team-1 probability caused by dew, in percentage points
    pub dew_impact: f64,

    pub ensemble_metrics: EnsembleMetrics,

    #[serde(default)]
    pub predicted_potm: Option<PlayerOfMatchPick>,
}

impl Prediction {
    pub fn favours_team1(&self) -> bool {
        self.team1_win_prob > 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_bands() {
        let cfg = ConfidenceConfig::default();
        assert_eq!(Confidence::from_probability(0.5, &cfg), Confidence::TossUp);
        assert_eq!(Confidence::from_probability(0.55, &cfg), Confidence::Lean);
        assert_eq!(Confidence::from_probability(0.35, &cfg), Confidence::Medium);
        assert_eq!(Confidence::from_probability(0.80, &cfg), Confidence::High);
        assert_eq!(Confidence::from_probability(0.20, &cfg), Confidence::High);
    }

    #[test]
    fn test_confidence_symmetric() {
        let cfg = ConfidenceConfig::default();
        // Half-percent offsets keep the grid off the band edges.
        for i in 0..100 {
            let p = (i as f64 + 0.5) / 100.0;
            assert_eq!(
                Confidence::from_probability(p, &cfg),
                Confidence::from_probability(1.0 - p, &cfg),
                "asymmetric at {}",
                p
            );
        }
    }

    #[test]
    fn test_confidence_nan_is_toss_up() {
        let cfg = ConfidenceConfig::default();
        assert_eq!(Confidence::from_probability(f64::NAN, &cfg), Confidence::TossUp);
    }

    #[test]
    fn test_confidence_display() {
        assert_eq!(Confidence::TossUp.to_string(), "Toss-up");
        assert!(Confidence::High > Confidence::Medium);
    }
}
