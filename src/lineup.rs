use std::collections::HashSet;

use crate::config::ModelConfig;
use crate::constants::{BALANCED_ROLES, FULL_XI};
use crate::player::PlayerStats;
use crate::team::{ResolvedStats, TeamStats};

/// Estimate the strength of a side's current lineup.
///
/// Blends a role-weighted roster form average with the team's aggregate
/// strength. Without a roster the aggregate estimate is used alone, capped
/// at `fallback_cap`. The result always lies in `[floor, ceiling]`.
///
/// # Arguments
/// * `players` - Announced starting lineup, if any
/// * `team` - Season aggregate for the side, if known
/// * `cfg` - Model configuration
pub fn estimate_lineup_strength(
    players: Option<&[PlayerStats]>,
    team: Option<&TeamStats>,
    cfg: &ModelConfig,
) -> f64 {
    let l = &cfg.lineup;
    let base = base_strength(team, cfg);

    let players = match players {
        Some(p) if !p.is_empty() => p,
        _ => return clamp_strength(base.min(l.fallback_cap), cfg),
    };

    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for p in players {
        let w = l.role_weights.weight(p.role);
        weighted += w * player_form(p, cfg);
        total_weight += w;
    }
    let roster_form = if total_weight > 0.0 {
        weighted / total_weight
    } else {
        l.default_player_form
    };

    let impacts: Vec<f64> = players
        .iter()
        .filter_map(|p| p.impact_score)
        .filter(|i| i.is_finite())
        .map(|i| i.clamp(0.0, 100.0))
        .collect();
    let impact_bonus = if impacts.is_empty() {
        0.0
    } else {
        (impacts.iter().sum::<f64>() / impacts.len() as f64) / 100.0 * l.impact_gain
    };

    let mut value = (roster_form + impact_bonus) * l.roster_weight + base * l.team_weight;

    if players.len() >= FULL_XI {
        value += l.full_xi_bonus;
    }
    let roles: HashSet<_> = players.iter().map(|p| p.role).collect();
    if roles.len() >= BALANCED_ROLES {
        value += l.balance_bonus;
    }

    clamp_strength(value, cfg)
}

/// Strength implied by season aggregates alone.
fn base_strength(team: Option<&TeamStats>, cfg: &ModelConfig) -> f64 {
    let l = &cfg.lineup;
    let team = match team {
        Some(t) => t,
        None => return l.unknown_team_base,
    };
    let r = ResolvedStats::resolve(team, &cfg.defaults);
    l.base
        + r.elo_offset() / l.elo_divisor
        + r.form * l.form_gain
        + (r.clutch - cfg.defaults.clutch_factor) * l.clutch_gain
}

fn player_form(player: &PlayerStats, cfg: &ModelConfig) -> f64 {
    if player.recent_form_index.is_finite() {
        player.recent_form_index.clamp(0.0, 1.0)
    } else {
        cfg.lineup.default_player_form
    }
}

fn clamp_strength(value: f64, cfg: &ModelConfig) -> f64 {
    let l = &cfg.lineup;
    if value.is_finite() {
        value.clamp(l.floor, l.ceiling)
    } else {
        l.floor
    }
}
