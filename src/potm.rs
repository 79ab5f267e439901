use crate::config::ModelConfig;
use crate::fixture::Match;
use crate::player::{PlayerStats, Role};
use crate::prediction::PlayerOfMatchPick;
use crate::team::{ResolvedStats, TeamStats};

struct Candidate<'a> {
    player: &'a PlayerStats,
    team: &'a str,
    score: f64,
    reasons: Vec<String>,
}

/// Pick the likeliest player of the match from both announced lineups.
///
/// Returns `None` when no lineup is attached or no player scores above zero.
pub fn predict_player_of_match(
    m: &Match,
    t1: &TeamStats,
    t2: &TeamStats,
    team1_win_prob: f64,
    cfg: &ModelConfig,
) -> Option<PlayerOfMatchPick> {
    let lineups = m.lineups.as_ref()?;

    let c1 = ResolvedStats::resolve(t1, &cfg.defaults).clutch;
    let c2 = ResolvedStats::resolve(t2, &cfg.defaults).clutch;

    let mut candidates: Vec<Candidate<'_>> = Vec::new();
    for p in &lineups.team1 {
        candidates.push(score_player(p, &m.team1, team1_win_prob, c1, cfg));
    }
    for p in &lineups.team2 {
        candidates.push(score_player(p, &m.team2, 1.0 - team1_win_prob, c2, cfg));
    }

    let pool: f64 = candidates.iter().map(|c| c.score).sum();
    if !(pool > 0.0) {
        return None;
    }

    // First maximum wins ties so lineup order breaks them.
    let mut best = candidates.first()?;
    for c in &candidates[1..] {
        if c.score > best.score {
            best = c;
        }
    }

    Some(PlayerOfMatchPick {
        name: best.player.name.clone(),
        team: best.team.to_string(),
        probability: (best.score / pool).min(cfg.potm.probability_cap),
        reasoning: best.reasons.clone(),
    })
}

fn score_player<'a>(
    player: &'a PlayerStats,
    team: &'a str,
    side_win_prob: f64,
    team_clutch: f64,
    cfg: &ModelConfig,
) -> Candidate<'a> {
    let c = &cfg.potm;
    let mut reasons = Vec::new();

    let form = if player.recent_form_index.is_finite() {
        player.recent_form_index.clamp(0.0, 1.0)
    } else {
        cfg.lineup.default_player_form
    };
    let impact = player
        .impact_score
        .filter(|i| i.is_finite())
        .unwrap_or(c.default_impact)
        .clamp(0.0, 100.0);

    let mut score = form * c.form_points + impact * c.impact_gain;
    if form >= 0.8 {
        reasons.push(format!("Hot form ({:.0}/100)", form * 100.0));
    }
    if impact >= 75.0 {
        reasons.push(format!("High impact rating ({:.0})", impact));
    }

    if player.role == Role::AllRounder {
        score += c.all_rounder_bonus;
        reasons.push("Contributes with bat and ball".to_string());
    }

    if let Some((bonus, reason)) = performance_bonus(player, cfg) {
        score += bonus;
        reasons.push(reason);
    }

    if side_win_prob > 0.5 {
        score += c.winning_side_bonus;
        reasons.push(format!("Side favoured at {:.0}%", side_win_prob * 100.0));
    }

    score += team_clutch * c.clutch_points;

    if reasons.is_empty() {
        reasons.push("Consistent lineup contributor".to_string());
    }

    Candidate {
        player,
        team,
        score: if score.is_finite() { score } else { 0.0 },
        reasons,
    }
}

/// Larger of the batting and bowling bonuses the player qualifies for,
/// with the reason for that bonus. Batting wins a tie.
fn performance_bonus(player: &PlayerStats, cfg: &ModelConfig) -> Option<(f64, String)> {
    let c = &cfg.potm;
    let batting = match player.strike_rate {
        Some(sr) if player.role.bats() && sr >= c.strike_rate_high => Some((c.performance_bonus_high, sr)),
        Some(sr) if player.role.bats() && sr >= c.strike_rate_good => Some((c.performance_bonus_good, sr)),
        _ => None,
    }
    .map(|(bonus, sr)| (bonus, format!("Strike rate {:.0}", sr)));
    let bowling = match player.economy {
        Some(econ) if player.role.bowls() && econ <= c.economy_low => Some((c.performance_bonus_high, econ)),
        Some(econ) if player.role.bowls() && econ <= c.economy_good => Some((c.performance_bonus_good, econ)),
        _ => None,
    }
    .map(|(bonus, econ)| (bonus, format!("Economy {:.1}", econ)));

    match (batting, bowling) {
        (Some(bat), Some(bowl)) if bowl.0 > bat.0 => Some(bowl),
        (Some(bat), _) => Some(bat),
        (None, bowl) => bowl,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{Lineups, Stage};

    fn fixture(team1: Vec<PlayerStats>, team2: Vec<PlayerStats>) -> Match {
        Match::new("m1", Stage::League, "A", "B").with_lineups(Lineups { team1, team2 })
    }

    #[test]
    fn test_no_lineups() {
        let cfg = ModelConfig::default();
        let m = Match::new("m1", Stage::League, "A", "B");
        let pick = predict_player_of_match(&m, &TeamStats::new("A", 1500), &TeamStats::new("B", 1500), 0.5, &cfg);
        assert!(pick.is_none());
    }

    #[test]
    fn test_picks_standout_all_rounder() {
        let cfg = ModelConfig::default();
        let m = fixture(
            vec![
                PlayerStats::new("Steady", Role::Batter, 0.6),
                PlayerStats::new("Star", Role::AllRounder, 0.95)
                    .with_impact(90.0)
                    .with_strike_rate(160.0),
            ],
            vec![PlayerStats::new("Opp", Role::Bowler, 0.7).with_economy(7.5)],
        );
        let pick = predict_player_of_match(&m, &TeamStats::new("A", 1500), &TeamStats::new("B", 1500), 0.6, &cfg)
            .unwrap();

        assert_eq!(pick.name, "Star");
        assert_eq!(pick.team, "A");
        assert!(pick.reasoning.iter().any(|r| r.contains("bat and ball")));
        assert!(pick.reasoning.iter().any(|r| r.starts_with("Strike rate")));
    }

    #[test]
    fn test_probability_capped() {
        let cfg = ModelConfig::default();
        let m = fixture(
            vec![PlayerStats::new("Solo", Role::AllRounder, 1.0).with_impact(100.0)],
            vec![PlayerStats::new("Zero", Role::Bowler, 0.0).with_impact(0.0)],
        );
        let pick = predict_player_of_match(&m, &TeamStats::new("A", 1500), &TeamStats::new("B", 1500), 0.9, &cfg)
            .unwrap();
        assert_eq!(pick.name, "Solo");
        assert_eq!(pick.probability, cfg.potm.probability_cap);
    }

    #[test]
    fn test_winning_side_bonus_breaks_tie() {
        let cfg = ModelConfig::default();
        let m = fixture(
            vec![PlayerStats::new("Home", Role::Batter, 0.7)],
            vec![PlayerStats::new("Away", Role::Batter, 0.7)],
        );
        let a = TeamStats::new("A", 1500);
        let b = TeamStats::new("B", 1500);

        let pick = predict_player_of_match(&m, &a, &b, 0.4, &cfg).unwrap();
        assert_eq!(pick.name, "Away");
        assert!(pick.probability < 0.6);
    }

    #[test]
    fn test_economy_bonus_for_bowlers_only() {
        let cfg = ModelConfig::default();
        let bowler = PlayerStats::new("B", Role::Bowler, 0.5).with_economy(6.5);
        let batter = PlayerStats::new("T", Role::Batter, 0.5).with_economy(6.5);
        let (bonus, reason) = performance_bonus(&bowler, &cfg).unwrap();
        assert_eq!(bonus, cfg.potm.performance_bonus_high);
        assert_eq!(reason, "Economy 6.5");
        assert!(performance_bonus(&batter, &cfg).is_none());
    }

    #[test]
    fn test_all_rounder_reason_names_the_bonus_that_counted() {
        let cfg = ModelConfig::default();
        // Economy 6.5 earns the high bonus; strike rate 135 only the good one.
        let ar = PlayerStats::new("AR", Role::AllRounder, 0.5)
            .with_strike_rate(135.0)
            .with_economy(6.5);
        let (bonus, reason) = performance_bonus(&ar, &cfg).unwrap();
        assert_eq!(bonus, cfg.potm.performance_bonus_high);
        assert_eq!(reason, "Economy 6.5");

        let pick = predict_player_of_match(
            &fixture(vec![ar], Vec::new()),
            &TeamStats::new("A", 1500),
            &TeamStats::new("B", 1500),
            0.5,
            &cfg,
        )
        .unwrap();
        assert!(pick.reasoning.iter().any(|r| r == "Economy 6.5"));
        assert!(!pick.reasoning.iter().any(|r| r.starts_with("Strike rate")));
    }
}
