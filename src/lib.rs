//! Oracle Core - win-probability scoring for a T20 cricket tournament.
//!
//! Turns team statistics and match context into per-match predictions, a
//! projected champion and a standings volatility index. Every scoring
//! function is pure; tunable parameters live in [`ModelConfig`].
//! Python bindings are available behind the `python` feature.

pub mod accuracy;
pub mod bracket;
pub mod config;
pub mod constants;
pub mod error;
pub mod fixture;
pub mod lineup;
pub mod logit;
pub mod overrides;
pub mod player;
pub mod potm;
pub mod prediction;
pub mod team;
pub mod tournament;
pub mod win_prob;

#[cfg(feature = "python")]
mod python;

pub use accuracy::{evaluate_accuracy, AccuracyMetrics};
pub use bracket::PlayoffBracket;
pub use config::{ModelConfig, ModelVersion};
pub use error::{OracleError, Result};
pub use fixture::{LiveMetrics, Lineups, Match, MatchStatus, Stage};
pub use lineup::estimate_lineup_strength;
pub use logit::{compute_logit, LogitBreakdown, MatchContext};
pub use overrides::ResultOverrides;
pub use player::{PlayerStats, Role};
pub use potm::predict_player_of_match;
pub use prediction::{Confidence, EnsembleMetrics, PlayerOfMatchPick, Prediction, XiStrength};
pub use team::{merge_standings, FormResult, ResolvedStats, StandingsUpdate, TeamStats};
pub use tournament::{calculate_volatility, predicted_champion, simulate_tournament, TournamentState};
pub use win_prob::{elo_win_prob, matchup_probability, platt_scale, predict_match};
