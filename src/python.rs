//! Python bindings.
//!
//! Structured inputs cross the boundary as JSON so the Python side can pass
//! the same payloads the data-sync layer produces.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::ModelConfig;
use crate::fixture::Match;
use crate::team::TeamStats;
use crate::tournament::TournamentState;

fn parse<T: serde::de::DeserializeOwned>(what: &str, json: &str) -> PyResult<T> {
    serde_json::from_str(json).map_err(|e| PyValueError::new_err(format!("invalid {}: {}", what, e)))
}

fn config(toml: Option<&str>) -> PyResult<ModelConfig> {
    match toml {
        Some(text) => ModelConfig::from_toml_str(text).map_err(|e| PyValueError::new_err(e.to_string())),
        None => Ok(ModelConfig::default()),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Predict one fixture. Returns the prediction as JSON.
#[pyfunction]
#[pyo3(signature = (team1, team2, fixture, config_toml = None))]
fn predict_match(team1: &str, team2: &str, fixture: &str, config_toml: Option<&str>) -> PyResult<String> {
    let cfg = config(config_toml)?;
    let t1: TeamStats = parse("team1", team1)?;
    let t2: TeamStats = parse("team2", team2)?;
    let m: Match = parse("fixture", fixture)?;
    to_json(&crate::win_prob::predict_match(&t1, &t2, &m, &cfg))
}

/// Rebuild the tournament state. Returns it as JSON.
#[pyfunction]
#[pyo3(signature = (standings, matches, config_toml = None))]
fn refresh_tournament(standings: &str, matches: &str, config_toml: Option<&str>) -> PyResult<String> {
    let cfg = config(config_toml)?;
    let standings: Vec<TeamStats> = parse("standings", standings)?;
    let matches: Vec<Match> = parse("matches", matches)?;
    to_json(&TournamentState::refresh(standings, &matches, &cfg))
}

#[pyfunction]
#[pyo3(signature = (standings, config_toml = None))]
fn calculate_volatility(standings: &str, config_toml: Option<&str>) -> PyResult<f64> {
    let cfg = config(config_toml)?;
    let standings: Vec<TeamStats> = parse("standings", standings)?;
    Ok(crate::tournament::calculate_volatility(&standings, &cfg))
}

#[pyfunction]
fn elo_win_prob(elo1: f64, elo2: f64) -> f64 {
    crate::win_prob::elo_win_prob(elo1, elo2)
}

#[pymodule]
fn oracle_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(predict_match, m)?)?;
    m.add_function(wrap_pyfunction!(refresh_tournament, m)?)?;
    m.add_function(wrap_pyfunction!(calculate_volatility, m)?)?;
    m.add_function(wrap_pyfunction!(elo_win_prob, m)?)?;

    m.add("MODEL_VERSION", ModelConfig::default().version)?;

    Ok(())
}
