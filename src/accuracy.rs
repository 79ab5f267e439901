use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::fixture::Match;

/// How well retained predictions matched completed results.
///
/// Accuracies are percentages; a category with no samples reports 0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub model_version: String,
    pub total_predictions: usize,
    pub correct_predictions: usize,
    pub match_winner_accuracy: f64,
    pub playoff_accuracy: f64,
    pub potm_accuracy: f64,
    /// Mean squared error of the team-1 probability against the result
    pub brier_score: f64,
}

/// Score every completed match that has both a winner and a prediction.
pub fn evaluate_accuracy(matches: &[Match], model_version: &str) -> AccuracyMetrics {
    let mut squared_errors = Vec::new();
    let mut correct = 0usize;
    let mut playoff_total = 0usize;
    let mut playoff_correct = 0usize;
    let mut potm_total = 0usize;
    let mut potm_correct = 0usize;

    for m in matches.iter().filter(|m| m.is_completed()) {
        let (winner, prediction) = match (&m.winner, &m.prediction) {
            (Some(w), Some(p)) => (w, p),
            _ => continue,
        };
        let team1_won = if *winner == m.team1 {
            true
        } else if *winner == m.team2 {
            false
        } else {
            continue;
        };

        let p = prediction.team1_win_prob;
        let y = if team1_won { 1.0 } else { 0.0 };
        squared_errors.push((p - y).powi(2));

        let hit = (team1_won && p > 0.5) || (!team1_won && p < 0.5);
        if hit {
            correct += 1;
        }
        if m.stage.is_playoff() {
            playoff_total += 1;
            if hit {
                playoff_correct += 1;
            }
        }

        if let (Some(actual), Some(pick)) = (&m.player_of_the_match, &prediction.predicted_potm) {
            potm_total += 1;
            if actual.eq_ignore_ascii_case(&pick.name) {
                potm_correct += 1;
            }
        }
    }

    let total = squared_errors.len();
    let brier_score = if total == 0 {
        0.0
    } else {
        squared_errors.iter().mean()
    };

    AccuracyMetrics {
        model_version: model_version.to_string(),
        total_predictions: total,
        correct_predictions: correct,
        match_winner_accuracy: percent(correct, total),
        playoff_accuracy: percent(playoff_correct, playoff_total),
        potm_accuracy: percent(potm_correct, potm_total),
        brier_score,
    }
}

fn percent(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64 * 100.0
    }
}
