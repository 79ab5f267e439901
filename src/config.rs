//! Model configuration.
//!
//! Every weight, logistic parameter and threshold the scoring pipeline uses
//! lives here, so model versions differ only in data. A TOML file may name
//! any subset of fields; the rest keep the v2 defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{OracleError, Result};
use crate::fixture::Stage;
use crate::player::Role;
use crate::team::StatDefaults;

/// Named model presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelVersion {
    /// Calibrated logistic output only
    V1LogisticOnly,
    /// Logistic, Elo and multi-signal blend
    V2GradientBoostEnsemble,
}

impl ModelVersion {
    pub fn label(self) -> &'static str {
        match self {
            ModelVersion::V1LogisticOnly => "v1-logistic-only",
            ModelVersion::V2GradientBoostEnsemble => "v2-gradient-boost-ensemble",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub version: String,
    pub defaults: StatDefaults,
    pub lineup: LineupConfig,
    pub logit: LogitConfig,
    pub platt: PlattConfig,
    pub ensemble: EnsembleConfig,
    pub boost: BoostConfig,
    pub confidence: ConfidenceConfig,
    pub potm: PotmConfig,
    pub volatility: VolatilityConfig,
    pub venues: Vec<VenueProfile>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::preset(ModelVersion::V2GradientBoostEnsemble)
    }
}

impl ModelConfig {
    pub fn preset(version: ModelVersion) -> Self {
        let ensemble = match version {
            ModelVersion::V1LogisticOnly => EnsembleConfig {
                logistic_weight: 1.0,
                elo_weight: 0.0,
                boost_weight: 0.0,
                ..EnsembleConfig::default()
            },
            ModelVersion::V2GradientBoostEnsemble => EnsembleConfig::default(),
        };

        ModelConfig {
            version: version.label().to_string(),
            defaults: StatDefaults::default(),
            lineup: LineupConfig::default(),
            logit: LogitConfig::default(),
            platt: PlattConfig::default(),
            ensemble,
            boost: BoostConfig::default(),
            confidence: ConfidenceConfig::default(),
            potm: PotmConfig::default(),
            volatility: VolatilityConfig::default(),
            venues: default_venues(),
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ModelConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| OracleError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        info!(path = %path.display(), version = %config.version, "loaded model config");
        Ok(config)
    }

    /// Check the structural constraints the scoring code relies on.
    pub fn validate(&self) -> Result<()> {
        let e = &self.ensemble;
        check_weights(
            "ensemble",
            &[e.logistic_weight, e.elo_weight, e.boost_weight],
        )?;
        check_bounds("ensemble probability", e.prob_floor, e.prob_ceiling, 0.0, 1.0)?;

        let b = &self.boost;
        check_weights(
            "boost",
            &[b.elo_weight, b.form_weight, b.nrr_weight, b.clutch_weight, b.death_weight],
        )?;
        if !(b.elo_divisor.is_finite() && b.elo_divisor > 0.0) {
            return Err(invalid("boost.elo_divisor must be positive"));
        }

        let l = &self.lineup;
        check_bounds("lineup strength", l.floor, l.ceiling, 0.0, 1.0)?;
        if !(l.elo_divisor.is_finite() && l.elo_divisor > 0.0) {
            return Err(invalid("lineup.elo_divisor must be positive"));
        }

        let c = &self.confidence;
        if !(0.5 < c.lean && c.lean < c.medium && c.medium < c.high && c.high < 1.0) {
            return Err(invalid("confidence thresholds must satisfy 0.5 < lean < medium < high < 1"));
        }

        let v = &self.volatility;
        if !(v.floor.is_finite() && v.ceiling.is_finite() && v.floor < v.ceiling) {
            return Err(invalid("volatility floor must be below ceiling"));
        }
        if !(v.spread_scale.is_finite() && v.spread_scale >= 0.0) {
            return Err(invalid("volatility.spread_scale must be non-negative"));
        }

        if !(self.potm.probability_cap > 0.0 && self.potm.probability_cap <= 1.0) {
            return Err(invalid("potm.probability_cap must be in (0, 1]"));
        }

        Ok(())
    }

    /// Venue profile whose key appears in the venue name, ignoring case.
    pub fn find_venue(&self, venue: &str) -> Option<&VenueProfile> {
        let needle = normalize_venue(venue);
        self.venues
            .iter()
            .find(|v| needle.contains(&normalize_venue(&v.key)))
    }
}

fn normalize_venue(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

fn invalid(msg: &str) -> OracleError {
    OracleError::InvalidConfig(msg.to_string())
}

fn check_weights(section: &str, weights: &[f64]) -> Result<()> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(OracleError::InvalidConfig(format!(
            "{} weights must be finite and non-negative",
            section
        )));
    }
    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > 1e-6 {
        return Err(OracleError::InvalidConfig(format!(
            "{} weights sum to {}, expected 1",
            section, total
        )));
    }
    Ok(())
}

fn check_bounds(what: &str, lo: f64, hi: f64, min: f64, max: f64) -> Result<()> {
    if !(lo.is_finite() && hi.is_finite() && min < lo && lo < hi && hi < max) {
        return Err(OracleError::InvalidConfig(format!(
            "{} bounds [{}, {}] must be ordered inside ({}, {})",
            what, lo, hi, min, max
        )));
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleWeights {
    pub batter: f64,
    pub bowler: f64,
    pub all_rounder: f64,
    pub wicketkeeper: f64,
}

impl Default for RoleWeights {
    fn default() -> Self {
        RoleWeights {
            batter: 1.2,
            bowler: 1.1,
            all_rounder: 1.4,
            wicketkeeper: 1.0,
        }
    }
}

impl RoleWeights {
    pub fn weight(&self, role: Role) -> f64 {
        match role {
            Role::Batter => self.batter,
            Role::Bowler => self.bowler,
            Role::AllRounder => self.all_rounder,
            Role::Wicketkeeper => self.wicketkeeper,
        }
    }
}

/// XI strength estimator parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineupConfig {
    /// Strength used when neither roster nor team stats are known
    pub unknown_team_base: f64,
    pub base: f64,
    pub elo_divisor: f64,
    pub form_gain: f64,
    /// Gain on the clutch factor's offset from its default
    pub clutch_gain: f64,
    /// Cap on the aggregate-only estimate
    pub fallback_cap: f64,
    pub roster_weight: f64,
    pub team_weight: f64,
    pub full_xi_bonus: f64,
    pub balance_bonus: f64,
    /// Gain on the mean impact score, as a fraction of 100
    pub impact_gain: f64,
    pub default_player_form: f64,
    pub floor: f64,
    pub ceiling: f64,
    pub role_weights: RoleWeights,
}

impl Default for LineupConfig {
    fn default() -> Self {
        LineupConfig {
            unknown_team_base: 0.75,
            base: 0.60,
            elo_divisor: 1000.0,
            form_gain: 0.15,
            clutch_gain: 0.10,
            fallback_cap: 0.92,
            roster_weight: 0.6,
            team_weight: 0.4,
            full_xi_bonus: 0.05,
            balance_bonus: 0.03,
            impact_gain: 0.05,
            default_player_form: 0.7,
            floor: 0.35,
            ceiling: 0.98,
            role_weights: RoleWeights::default(),
        }
    }
}

/// Death-bowling pressure coefficient per stage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureMap {
    pub league: f64,
    pub qualifier: f64,
    pub eliminator: f64,
    #[serde(rename = "final")]
    pub final_stage: f64,
}

impl Default for PressureMap {
    fn default() -> Self {
        PressureMap {
            league: 0.4,
            qualifier: 0.8,
            eliminator: 0.8,
            final_stage: 1.0,
        }
    }
}

impl PressureMap {
    pub fn for_stage(&self, stage: Stage) -> f64 {
        match stage {
            Stage::League => self.league,
            Stage::Qualifier => self.qualifier,
            Stage::Eliminator => self.eliminator,
            Stage::Final => self.final_stage,
        }
    }
}

/// Logit feature weights and in-match adjustments.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogitConfig {
    pub xi_weight: f64,
    pub momentum_weight: f64,
    pub pressure_weight: f64,
    pub clutch_weight: f64,
    pub powerplay_weight: f64,
    pub home_weight: f64,
    pub venue_weight: f64,
    pub dew_penalty: f64,
    pub dew_damping: f64,
    pub default_dew_likelihood: f64,
    pub chase_coefficient: f64,
    pub wicket_penalty: f64,
    pub pressure: PressureMap,
}

impl Default for LogitConfig {
    fn default() -> Self {
        LogitConfig {
            xi_weight: 4.2,
            momentum_weight: 2.5,
            pressure_weight: 3.0,
            clutch_weight: 2.0,
            powerplay_weight: 1.8,
            home_weight: 1.0,
            venue_weight: 0.15,
            dew_penalty: 0.45,
            dew_damping: 0.8,
            default_dew_likelihood: 0.7,
            chase_coefficient: 0.6,
            wicket_penalty: 0.45,
            pressure: PressureMap::default(),
        }
    }
}

/// Platt scaling: `p = 1 / (1 + exp(a * logit + b))`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlattConfig {
    pub a: f64,
    pub b: f64,
}

impl Default for PlattConfig {
    fn default() -> Self {
        PlattConfig { a: -1.15, b: 0.02 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    pub logistic_weight: f64,
    pub elo_weight: f64,
    pub boost_weight: f64,
    pub prob_floor: f64,
    pub prob_ceiling: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        EnsembleConfig {
            logistic_weight: 0.40,
            elo_weight: 0.25,
            boost_weight: 0.35,
            prob_floor: 0.02,
            prob_ceiling: 0.98,
        }
    }
}

/// Multi-signal blend: five `0.5 + gain * diff` sub-probabilities.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    pub elo_divisor: f64,
    pub form_gain: f64,
    pub nrr_gain: f64,
    pub clutch_gain: f64,
    pub death_gain: f64,
    pub elo_weight: f64,
    pub form_weight: f64,
    pub nrr_weight: f64,
    pub clutch_weight: f64,
    pub death_weight: f64,
    /// Residual per unit clutch differential in a Final
    pub final_residual: f64,
    /// Residual per unit clutch differential in an Eliminator
    pub eliminator_residual: f64,
}

impl Default for BoostConfig {
    fn default() -> Self {
        BoostConfig {
            elo_divisor: 800.0,
            form_gain: 0.5,
            nrr_gain: 0.25,
            clutch_gain: 0.8,
            death_gain: 0.6,
            elo_weight: 0.25,
            form_weight: 0.25,
            nrr_weight: 0.15,
            clutch_weight: 0.20,
            death_weight: 0.15,
            final_residual: 0.08,
            eliminator_residual: 0.05,
        }
    }
}

impl BoostConfig {
    pub fn residual_for(&self, stage: Stage) -> f64 {
        match stage {
            Stage::Final => self.final_residual,
            Stage::Eliminator => self.eliminator_residual,
            Stage::League | Stage::Qualifier => 0.0,
        }
    }
}

/// Upper-tail cutoffs; the lower tail mirrors them around 0.5.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub high: f64,
    pub medium: f64,
    pub lean: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        ConfidenceConfig {
            high: 0.72,
            medium: 0.62,
            lean: 0.52,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PotmConfig {
    pub form_points: f64,
    pub impact_gain: f64,
    pub default_impact: f64,
    pub all_rounder_bonus: f64,
    pub strike_rate_high: f64,
    pub strike_rate_good: f64,
    pub economy_low: f64,
    pub economy_good: f64,
    pub performance_bonus_high: f64,
    pub performance_bonus_good: f64,
    pub winning_side_bonus: f64,
    pub clutch_points: f64,
    pub probability_cap: f64,
}

impl Default for PotmConfig {
    fn default() -> Self {
        PotmConfig {
            form_points: 40.0,
            impact_gain: 0.35,
            default_impact: 50.0,
            all_rounder_bonus: 8.0,
            strike_rate_high: 150.0,
            strike_rate_good: 130.0,
            economy_low: 7.0,
            economy_good: 8.0,
            performance_bonus_high: 6.0,
            performance_bonus_good: 3.0,
            winning_side_bonus: 5.0,
            clutch_points: 5.0,
            probability_cap: 0.45,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityConfig {
    /// Points-equivalent of one unit of NRR gap
    pub nrr_scale: f64,
    /// Volatility lost per unit of spread
    pub spread_scale: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        VolatilityConfig {
            nrr_scale: 10.0,
            spread_scale: 2.5,
            floor: 10.0,
            ceiling: 100.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VenueProfile {
    /// Substring matched against the fixture's venue name
    pub key: String,
    /// Intrinsic spin advantage (0-1)
    #[serde(default)]
    pub spin_advantage: f64,
    /// Dew likelihood for evening games here (0-1)
    #[serde(default)]
    pub dew_factor: f64,
}

fn default_venues() -> Vec<VenueProfile> {
    [
        ("DY Patil", 0.45, 0.70),
        ("Arun Jaitley", 0.60, 0.50),
        ("Chinnaswamy", 0.35, 0.40),
        ("Brabourne", 0.50, 0.60),
        ("Wankhede", 0.40, 0.65),
    ]
    .into_iter()
    .map(|(key, spin_advantage, dew_factor)| VenueProfile {
        key: key.to_string(),
        spin_advantage,
        dew_factor,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        ModelConfig::default().validate().unwrap();
        ModelConfig::preset(ModelVersion::V1LogisticOnly).validate().unwrap();
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = ModelConfig::from_toml_str(
            r#"
            version = "custom"

            [platt]
            a = -1.2

            [logit.pressure]
            final = 1.1
            "#,
        )
        .unwrap();

        assert_eq!(cfg.version, "custom");
        assert_eq!(cfg.platt.a, -1.2);
        assert_eq!(cfg.platt.b, 0.02);
        assert_eq!(cfg.logit.pressure.final_stage, 1.1);
        assert_eq!(cfg.logit.pressure.league, 0.4);
        assert_eq!(cfg.venues.len(), 5);
    }

    #[test]
    fn test_bad_weights_rejected() {
        let err = ModelConfig::from_toml_str(
            r#"
            [ensemble]
            logistic_weight = 0.9
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, OracleError::InvalidConfig(_)));
    }

    #[test]
    fn test_unordered_confidence_rejected() {
        let mut cfg = ModelConfig::default();
        cfg.confidence.medium = 0.80;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let err = ModelConfig::from_toml_str("[platt\na = 1").unwrap_err();
        assert!(matches!(err, OracleError::ConfigParse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ModelConfig::load("/nonexistent/oracle/model.toml").unwrap_err();
        assert!(matches!(err, OracleError::ConfigRead { .. }));
    }

    #[test]
    fn test_shipped_config_parses() {
        let cfg = ModelConfig::from_toml_str(include_str!("../config/model.toml")).unwrap();
        assert_eq!(cfg, ModelConfig::default());
    }

    #[test]
    fn test_find_venue() {
        let cfg = ModelConfig::default();
        let venue = cfg.find_venue("M. Chinnaswamy Stadium, Bangalore").unwrap();
        assert_eq!(venue.key, "Chinnaswamy");
        assert!(cfg.find_venue("Eden Gardens").is_none());
    }

    #[test]
    fn test_pressure_increases_with_stakes() {
        let p = PressureMap::default();
        assert!(p.for_stage(Stage::League) < p.for_stage(Stage::Eliminator));
        assert!(p.for_stage(Stage::Qualifier) < p.for_stage(Stage::Final));
    }
}
