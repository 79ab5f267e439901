use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::ModelConfig;
use crate::constants::INNINGS_BALLS;
use crate::fixture::{LiveMetrics, Match, Stage};
use crate::prediction::XiStrength;
use crate::team::{ResolvedStats, TeamStats};

/// Fixture context the feature model reads.
#[derive(Clone, Copy, Debug)]
pub struct MatchContext<'a> {
    pub stage: Stage,
    pub venue: Option<&'a str>,
    pub live: Option<&'a LiveMetrics>,
}

impl<'a> MatchContext<'a> {
    pub fn of(m: &'a Match) -> Self {
        MatchContext {
            stage: m.stage,
            venue: m.venue.as_deref(),
            live: m.live.as_ref(),
        }
    }

    /// Pre-match context with no venue or telemetry.
    pub fn neutral(stage: Stage) -> Self {
        MatchContext {
            stage,
            venue: None,
            live: None,
        }
    }
}

/// Weighted contribution of every feature to the team-1 logit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogitBreakdown {
    pub xi: f64,
    pub momentum: f64,
    pub pressure: f64,
    pub clutch: f64,
    pub powerplay: f64,
    pub home: f64,
    pub venue: f64,
    /// Night-match dew adjustment (zero or negative)
    pub dew: f64,
    /// Chase pressure plus wickets lost (zero or negative when behind)
    pub live: f64,
    pub total: f64,
}

/// Real-valued team-1 logit; positive favours team 1.
///
/// A degenerate input that makes the sum NaN yields 0 (even odds).
pub fn compute_logit(
    t1: &TeamStats,
    t2: &TeamStats,
    ctx: &MatchContext<'_>,
    xi: XiStrength,
    cfg: &ModelConfig,
) -> f64 {
    let r1 = ResolvedStats::resolve(t1, &cfg.defaults);
    let r2 = ResolvedStats::resolve(t2, &cfg.defaults);
    logit_breakdown(&r1, &r2, ctx, xi, cfg).total
}

pub fn logit_breakdown(
    r1: &ResolvedStats,
    r2: &ResolvedStats,
    ctx: &MatchContext<'_>,
    xi: XiStrength,
    cfg: &ModelConfig,
) -> LogitBreakdown {
    let w = &cfg.logit;
    let pressure_index = w.pressure.for_stage(ctx.stage);

    let mut b = LogitBreakdown {
        xi: (xi.team1 - xi.team2) * w.xi_weight,
        momentum: (r1.form - r2.form) * w.momentum_weight,
        pressure: pressure_index * (r1.death_bowling - r2.death_bowling) * w.pressure_weight,
        clutch: (r1.clutch - r2.clutch) * w.clutch_weight,
        powerplay: (r1.powerplay - r2.powerplay) * w.powerplay_weight,
        home: (r1.home_advantage - r2.home_advantage) * w.home_weight,
        ..LogitBreakdown::default()
    };

    let venue = ctx.venue.and_then(|v| cfg.find_venue(v));
    if let Some(profile) = venue {
        b.venue = profile.spin_advantage * w.venue_weight * form_edge(r1.form - r2.form);
    }

    if let Some(live) = ctx.live {
        if live.is_night_match {
            let dew = live
                .dew_likelihood
                .filter(|d| d.is_finite())
                .or(venue.map(|v| v.dew_factor))
                .unwrap_or(w.default_dew_likelihood)
                .clamp(0.0, 1.0);
            // Applied to team 1 regardless of who bats second.
            b.dew = -(w.dew_penalty * dew * w.dew_damping);
        }

        if live.balls_left > 0 {
            let chase_pressure = (live.required_rr - live.current_rr)
                * (INNINGS_BALLS / live.balls_left as f64)
                * w.chase_coefficient;
            let wickets = live.wickets_lost as f64 * w.wicket_penalty;
            b.live = -(chase_pressure + wickets);
        }
    }

    let total = b.xi + b.momentum + b.pressure + b.clutch + b.powerplay + b.home + b.venue + b.dew + b.live;
    b.total = if total.is_nan() { 0.0 } else { total };

    trace!(?b, stage = %ctx.stage, "logit breakdown");
    b
}

fn form_edge(diff: f64) -> f64 {
    if diff > 0.0 {
        1.0
    } else if diff < 0.0 {
        -1.0
    } else {
        0.0
    }
}
