use statrs::function::logistic::logistic;
use tracing::debug;

use crate::config::{ModelConfig, PlattConfig};
use crate::constants::ELO_SCALE;
use crate::fixture::{Match, Stage};
use crate::lineup::estimate_lineup_strength;
use crate::logit::{logit_breakdown, LogitBreakdown, MatchContext};
use crate::potm::predict_player_of_match;
use crate::prediction::{Confidence, EnsembleMetrics, Prediction, XiStrength};
use crate::team::{ResolvedStats, TeamStats};

/// Platt-scaled probability: `1 / (1 + exp(a * logit + b))`.
///
/// Returns 0.5 if the transform yields NaN.
pub fn platt_scale(logit: f64, platt: &PlattConfig) -> f64 {
    let p = logistic(-(platt.a * logit + platt.b));
    if p.is_nan() {
        0.5
    } else {
        p
    }
}

/// Standard Elo expectation that the first rating beats the second.
pub fn elo_win_prob(elo1: f64, elo2: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((elo2 - elo1) / ELO_SCALE))
}

/// Sub-signals of the multi-signal ("gradient-boost-style") estimate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoostScore {
    pub elo: f64,
    pub form: f64,
    pub nrr: f64,
    pub clutch: f64,
    pub death: f64,
    pub residual: f64,
    pub score: f64,
}

/// Blend five `0.5 + gain * diff` sub-probabilities with a stage residual.
///
/// Sub-probabilities are left unclamped; the ensemble clamp bounds the
/// final value.
pub fn boost_score(r1: &ResolvedStats, r2: &ResolvedStats, stage: Stage, cfg: &ModelConfig) -> BoostScore {
    let b = &cfg.boost;
    let elo = 0.5 + (r1.elo - r2.elo) / b.elo_divisor;
    let form = 0.5 + (r1.form - r2.form) * b.form_gain;
    let nrr = 0.5 + (r1.nrr - r2.nrr).tanh() * b.nrr_gain;
    let clutch_diff = r1.clutch - r2.clutch;
    let clutch = 0.5 + clutch_diff * b.clutch_gain;
    let death = 0.5 + (r1.death_bowling - r2.death_bowling) * b.death_gain;
    let residual = b.residual_for(stage) * clutch_diff;

    let score = elo * b.elo_weight
        + form * b.form_weight
        + nrr * b.nrr_weight
        + clutch * b.clutch_weight
        + death * b.death_weight
        + residual;

    BoostScore {
        elo,
        form,
        nrr,
        clutch,
        death,
        residual,
        score,
    }
}

/// The three component estimates and their clamped blend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnsembleEstimate {
    pub logistic: f64,
    pub elo: f64,
    pub boost: Option<f64>,
    pub probability: f64,
}

pub fn ensemble_probability(
    r1: &ResolvedStats,
    r2: &ResolvedStats,
    stage: Stage,
    logit: f64,
    cfg: &ModelConfig,
) -> EnsembleEstimate {
    let e = &cfg.ensemble;
    let logistic = platt_scale(logit, &cfg.platt);
    let elo = elo_win_prob(r1.elo, r2.elo);
    let boost = (e.boost_weight > 0.0).then(|| boost_score(r1, r2, stage, cfg).score);

    let blended = logistic * e.logistic_weight + elo * e.elo_weight + boost.unwrap_or(0.0) * e.boost_weight;
    let probability = if blended.is_nan() {
        0.5
    } else {
        blended.clamp(e.prob_floor, e.prob_ceiling)
    };

    EnsembleEstimate {
        logistic,
        elo,
        boost,
        probability,
    }
}

/// Everything scored for a pairing before it is packaged as a prediction.
struct Scored {
    xi: XiStrength,
    r1: ResolvedStats,
    breakdown: LogitBreakdown,
    estimate: EnsembleEstimate,
    pressure_index: f64,
}

fn score(t1: &TeamStats, t2: &TeamStats, ctx: &MatchContext<'_>, xi: XiStrength, cfg: &ModelConfig) -> Scored {
    let r1 = ResolvedStats::resolve(t1, &cfg.defaults);
    let r2 = ResolvedStats::resolve(t2, &cfg.defaults);
    let breakdown = logit_breakdown(&r1, &r2, ctx, xi, cfg);
    let estimate = ensemble_probability(&r1, &r2, ctx.stage, breakdown.total, cfg);
    Scored {
        xi,
        r1,
        breakdown,
        estimate,
        pressure_index: cfg.logit.pressure.for_stage(ctx.stage),
    }
}

/// Team-1 win probability for a pre-match pairing with no lineups, venue or
/// telemetry. Used for projected fixtures that have no schedule entry yet.
pub fn matchup_probability(t1: &TeamStats, t2: &TeamStats, stage: Stage, cfg: &ModelConfig) -> f64 {
    let xi = XiStrength {
        team1: estimate_lineup_strength(None, Some(t1), cfg),
        team2: estimate_lineup_strength(None, Some(t2), cfg),
    };
    score(t1, t2, &MatchContext::neutral(stage), xi, cfg)
        .estimate
        .probability
}

/// Predict a fixture between two teams.
///
/// # Arguments
/// * `t1` - Stats for `m.team1`
/// * `t2` - Stats for `m.team2`
/// * `m` - The fixture, with optional venue, lineups and live telemetry
/// * `cfg` - Model configuration
pub fn predict_match(t1: &TeamStats, t2: &TeamStats, m: &Match, cfg: &ModelConfig) -> Prediction {
    let xi = XiStrength {
        team1: estimate_lineup_strength(m.team1_lineup(), Some(t1), cfg),
        team2: estimate_lineup_strength(m.team2_lineup(), Some(t2), cfg),
    };
    let ctx = MatchContext::of(m);
    let s = score(t1, t2, &ctx, xi, cfg);
    let p = s.estimate.probability;

    let dew_impact = if s.breakdown.dew != 0.0 {
        let without_dew = s.breakdown.total - s.breakdown.dew;
        (platt_scale(s.breakdown.total, &cfg.platt) - platt_scale(without_dew, &cfg.platt)) * 100.0
    } else {
        0.0
    };

    let confidence = Confidence::from_probability(p, &cfg.confidence);
    let factors = explain(t1, t2, m, &s, dew_impact);
    let predicted_potm = predict_player_of_match(m, t1, t2, p, cfg);

    debug!(
        match_id = %m.id,
        team1 = %m.team1,
        team2 = %m.team2,
        p,
        logit = s.breakdown.total,
        %confidence,
        "predicted match"
    );

    Prediction {
        team1_win_prob: p,
        team2_win_prob: 1.0 - p,
        confidence,
        factors,
        xi_strength: s.xi,
        dew_impact,
        ensemble_metrics: EnsembleMetrics {
            momentum_score: s.r1.form,
            pressure_index: s.pressure_index,
            logistic_prob: s.estimate.logistic,
            elo_prob: s.estimate.elo,
            gradient_boost_score: s.estimate.boost,
        },
        predicted_potm,
    }
}

fn explain(t1: &TeamStats, t2: &TeamStats, m: &Match, s: &Scored, dew_impact: f64) -> Vec<String> {
    let b = &s.breakdown;
    let mut factors = vec![
        format!("XI Power: {:.0} vs {:.0}", s.xi.team1 * 100.0, s.xi.team2 * 100.0),
        format!("Pressure Calibration: {} ({:.1}x)", m.stage, s.pressure_index),
        format!(
            "Momentum: {:.0}% vs {:.0}% recent wins",
            t1.form_fraction() * 100.0,
            t2.form_fraction() * 100.0
        ),
        format!("Elo Edge: {:+}", i64::from(t1.elo) - i64::from(t2.elo)),
    ];
    if b.venue != 0.0 {
        factors.push(format!("Venue Spin Bias: {:+.2}", b.venue));
    }
    if b.dew != 0.0 {
        factors.push(format!("Dew Impact: {:+.1} pts", dew_impact));
    }
    if b.live != 0.0 {
        factors.push(format!("Live Chase Pressure: {:+.2}", b.live));
    }
    factors
}
