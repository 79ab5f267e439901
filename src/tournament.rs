use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::accuracy::{evaluate_accuracy, AccuracyMetrics};
use crate::bracket::PlayoffBracket;
use crate::config::ModelConfig;
use crate::error::{OracleError, Result};
use crate::fixture::{Match, Stage};
use crate::overrides::ResultOverrides;
use crate::team::{finite_or, TeamStats};
use crate::win_prob::predict_match;

/// Attach a fresh prediction to every match that is not yet completed.
///
/// Completed matches pass through untouched, keeping whatever prediction
/// they already carry. A match naming a team absent from `teams` also passes
/// through unchanged.
pub fn simulate_tournament(teams: &[TeamStats], matches: &[Match], cfg: &ModelConfig) -> Vec<Match> {
    let lookup: HashMap<&str, &TeamStats> = teams.iter().map(|t| (t.name.as_str(), t)).collect();

    matches
        .par_iter()
        .map(|m| {
            let mut next = m.clone();
            if next.is_completed() {
                return next;
            }
            match (lookup.get(m.team1.as_str()), lookup.get(m.team2.as_str())) {
                (Some(t1), Some(t2)) => {
                    next.prediction = Some(predict_match(t1, t2, m, cfg));
                }
                _ => {
                    warn!(match_id = %m.id, team1 = %m.team1, team2 = %m.team2, "team missing from standings, skipping prediction");
                }
            }
            next
        })
        .collect()
}

/// Standings order: points, then net run rate, both descending.
pub fn rank_standings(teams: &[TeamStats]) -> Vec<&TeamStats> {
    let mut ranked: Vec<&TeamStats> = teams.iter().collect();
    ranked.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| finite_or(b.nrr, 0.0).partial_cmp(&finite_or(a.nrr, 0.0)).unwrap_or(Ordering::Equal))
    });
    ranked
}

/// How undecided the standings race is.
///
/// Sums adjacent point gaps plus scaled NRR gaps down the ranked table and
/// maps that spread inversely onto `[floor, ceiling]`. A single team or an
/// empty table has no spread and reports the ceiling.
pub fn calculate_volatility(teams: &[TeamStats], cfg: &ModelConfig) -> f64 {
    let v = &cfg.volatility;
    let ranked = rank_standings(teams);

    let spread: f64 = ranked
        .windows(2)
        .map(|pair| {
            let points_gap = (pair[0].points as f64 - pair[1].points as f64).abs();
            let nrr_gap = (finite_or(pair[0].nrr, 0.0) - finite_or(pair[1].nrr, 0.0)).abs();
            points_gap + nrr_gap * v.nrr_scale
        })
        .sum();

    (v.ceiling - spread * v.spread_scale).clamp(v.floor, v.ceiling)
}

/// Projected champion and the probability behind the call.
///
/// Read from the Final-stage match: a completed Final reports its winner
/// with certainty, otherwise the side with `team1_win_prob > 0.5` (team 2 on
/// an exact tie).
pub fn predicted_champion(matches: &[Match]) -> Option<(String, f64)> {
    let fin = matches.iter().rev().find(|m| m.stage == Stage::Final)?;
    if fin.is_completed() {
        return fin.winner.clone().map(|w| (w, 1.0));
    }
    let p = fin.prediction.as_ref()?;
    if p.team1_win_prob > 0.5 {
        Some((fin.team1.clone(), p.team1_win_prob))
    } else {
        Some((fin.team2.clone(), p.team2_win_prob))
    }
}

/// Aggregate view rebuilt on every sync.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentState {
    pub standings: Vec<TeamStats>,
    pub matches: Vec<Match>,
    pub predicted_champion: Option<String>,
    /// Champion-side probability as a rounded percentage
    pub confidence_score: u32,
    pub volatility_index: f64,
    pub accuracy: AccuracyMetrics,
}

impl TournamentState {
    /// Recompute predictions and every derived field from fresh inputs.
    pub fn refresh(standings: Vec<TeamStats>, matches: &[Match], cfg: &ModelConfig) -> Self {
        let matches = simulate_tournament(&standings, matches, cfg);
        let volatility_index = calculate_volatility(&standings, cfg);
        let champion = predicted_champion(&matches);
        let accuracy = evaluate_accuracy(&matches, &cfg.version);

        let (predicted_champion, confidence_score) = match champion {
            Some((team, p)) => (Some(team), (p * 100.0).round() as u32),
            None => (None, 0),
        };

        info!(
            teams = standings.len(),
            matches = matches.len(),
            volatility = volatility_index,
            champion = predicted_champion.as_deref().unwrap_or("-"),
            "tournament state refreshed"
        );

        TournamentState {
            standings,
            matches,
            predicted_champion,
            confidence_score,
            volatility_index,
            accuracy,
        }
    }

    /// Create a refreshed copy with a match resolved by hand.
    pub fn with_manual_winner(&self, match_id: &str, winner: &str, cfg: &ModelConfig) -> Result<Self> {
        let mut matches = self.matches.clone();
        let m = matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .ok_or_else(|| OracleError::UnknownMatch(match_id.to_string()))?;
        m.record_result(winner)?;
        Ok(Self::refresh(self.standings.clone(), &matches, cfg))
    }

    pub fn get_match(&self, match_id: &str) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    /// Playoff projection from the current table, with decided playoff
    /// games pinned.
    pub fn playoff_bracket(&self, cfg: &ModelConfig) -> Result<PlayoffBracket> {
        let bracket = PlayoffBracket::from_standings(&self.standings, cfg)?;
        Ok(bracket.with_overrides(ResultOverrides::from_completed(&self.matches)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::MatchStatus;
    use crate::team::FormResult;

    fn team(name: &str, points: u32, nrr: f64, elo: i32) -> TeamStats {
        use FormResult::*;
        let mut t = TeamStats::new(name, elo);
        t.points = points;
        t.nrr = nrr;
        t.recent_form = vec![Win, Loss, Win, Loss, Win];
        t
    }

    fn make_standings() -> Vec<TeamStats> {
        vec![
            team("RCB", 20, 1.247, 1745),
            team("GG", 16, 0.612, 1640),
            team("MI", 14, 0.245, 1595),
            team("DC", 10, 0.142, 1533),
        ]
    }

    #[test]
    fn test_completed_matches_pass_through() {
        let standings = make_standings();
        let mut done = Match::new("m1", Stage::League, "RCB", "GG");
        done.record_result("GG").unwrap();
        let matches = vec![done.clone(), Match::new("m2", Stage::League, "MI", "DC")];

        let out = simulate_tournament(&standings, &matches, &ModelConfig::default());
        assert_eq!(out[0], done);
        assert!(out[0].prediction.is_none());
        assert!(out[1].prediction.is_some());
    }

    #[test]
    fn test_missing_team_skipped() {
        let standings = make_standings();
        let matches = vec![Match::new("q2", Stage::Qualifier, "TBD", "DC")];
        let out = simulate_tournament(&standings, &matches, &ModelConfig::default());
        assert!(out[0].prediction.is_none());
    }

    #[test]
    fn test_order_preserved() {
        let standings = make_standings();
        let ids = ["a", "b", "c", "d", "e", "f"];
        let matches: Vec<Match> = ids
            .iter()
            .map(|id| Match::new(*id, Stage::League, "RCB", "DC"))
            .collect();
        let out = simulate_tournament(&standings, &matches, &ModelConfig::default());
        let got: Vec<&str> = out.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(got, ids);
    }

    #[test]
    fn test_volatility_tight_vs_runaway() {
        let cfg = ModelConfig::default();
        let tight = vec![team("A", 12, 0.1, 1500), team("B", 12, 0.05, 1500), team("C", 10, 0.0, 1500)];
        let runaway = vec![team("A", 20, 1.5, 1500), team("B", 8, -0.5, 1500), team("C", 4, -1.0, 1500)];
        assert!(calculate_volatility(&tight, &cfg) > calculate_volatility(&runaway, &cfg));
        assert_eq!(calculate_volatility(&runaway, &cfg), cfg.volatility.floor);
    }

    #[test]
    fn test_volatility_ignores_input_order() {
        let cfg = ModelConfig::default();
        let mut standings = make_standings();
        let forward = calculate_volatility(&standings, &cfg);
        standings.reverse();
        assert_eq!(forward, calculate_volatility(&standings, &cfg));
    }

    #[test]
    fn test_volatility_degenerate_tables() {
        let cfg = ModelConfig::default();
        assert_eq!(calculate_volatility(&[], &cfg), cfg.volatility.ceiling);
        let mut nan = make_standings();
        nan[1].nrr = f64::NAN;
        assert!(calculate_volatility(&nan, &cfg).is_finite());
    }

    #[test]
    fn test_champion_from_final() {
        let cfg = ModelConfig::default();
        let standings = make_standings();
        let matches = vec![
            Match::new("q1", Stage::Qualifier, "RCB", "GG"),
            Match::new("final", Stage::Final, "DC", "RCB"),
        ];
        let state = TournamentState::refresh(standings, &matches, &cfg);

        assert_eq!(state.predicted_champion.as_deref(), Some("RCB"));
        assert!(state.confidence_score > 50);
        assert!(state.volatility_index >= cfg.volatility.floor);
    }

    #[test]
    fn test_completed_final_reports_winner() {
        let mut fin = Match::new("final", Stage::Final, "DC", "RCB");
        fin.record_result("DC").unwrap();
        assert_eq!(predicted_champion(&[fin]), Some(("DC".to_string(), 1.0)));
    }

    #[test]
    fn test_no_final_no_champion() {
        let cfg = ModelConfig::default();
        let state = TournamentState::refresh(make_standings(), &[Match::new("m1", Stage::League, "GG", "MI")], &cfg);
        assert!(state.predicted_champion.is_none());
        assert_eq!(state.confidence_score, 0);
    }

    #[test]
    fn test_manual_winner_keeps_prediction_for_accuracy() {
        let cfg = ModelConfig::default();
        let matches = vec![Match::new("m1", Stage::League, "RCB", "DC")];
        let state = TournamentState::refresh(make_standings(), &matches, &cfg);
        assert!(state.get_match("m1").unwrap().prediction.is_some());

        let resolved = state.with_manual_winner("m1", "RCB", &cfg).unwrap();
        let m = resolved.get_match("m1").unwrap();
        assert_eq!(m.status, MatchStatus::Completed);
        assert!(m.prediction.is_some());
        assert_eq!(resolved.accuracy.total_predictions, 1);
        assert_eq!(resolved.accuracy.correct_predictions, 1);

        // The original state is untouched.
        assert_eq!(state.get_match("m1").unwrap().status, MatchStatus::Upcoming);
    }

    #[test]
    fn test_playoff_bracket_pins_decided_games() {
        let cfg = ModelConfig::default();
        let matches = vec![Match::new("q1", Stage::Qualifier, "RCB", "GG")];
        let state = TournamentState::refresh(make_standings(), &matches, &cfg);
        let open = state.playoff_bracket(&cfg).unwrap();
        assert!(open.overrides.is_empty());

        let decided = state.with_manual_winner("q1", "GG", &cfg).unwrap();
        let bracket = decided.playoff_bracket(&cfg).unwrap();
        assert_eq!(bracket.win_prob("RCB", "GG", Stage::Qualifier), 0.0);
        assert!(bracket.champion_odds_prob()["GG"] > open.champion_odds_prob()["GG"]);
    }

    #[test]
    fn test_decided_qualifier_keeps_final_rematch_open() {
        let cfg = ModelConfig::default();
        let matches = vec![Match::new("q1", Stage::Qualifier, "RCB", "GG")];
        let state = TournamentState::refresh(make_standings(), &matches, &cfg);
        let decided = state.with_manual_winner("q1", "RCB", &cfg).unwrap();
        let bracket = decided.playoff_bracket(&cfg).unwrap();

        assert_eq!(bracket.win_prob("GG", "RCB", Stage::Qualifier), 0.0);
        let final_p = bracket.win_prob("GG", "RCB", Stage::Final);
        assert!(final_p > 0.0 && final_p < 1.0);

        let odds = bracket.champion_odds_prob();
        assert!(odds.get("GG").copied().unwrap_or(0.0) > 0.0);
    }

    #[test]
    fn test_manual_winner_unknown_match() {
        let cfg = ModelConfig::default();
        let state = TournamentState::refresh(make_standings(), &[], &cfg);
        assert!(matches!(
            state.with_manual_winner("nope", "RCB", &cfg),
            Err(OracleError::UnknownMatch(_))
        ));
    }
}
