use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{OracleError, Result};
use crate::fixture::{Match, Stage};

/// Team pair in lexicographic order, optionally scoped to one stage.
type PairKey = (Option<Stage>, String, String);

/// Pinned head-to-head outcomes.
///
/// Entries are stored with team names in lexicographic order. When reading
/// an entry, the probability is flipped if the teams are given in reverse
/// order. A pin scoped to a stage only applies to games at that stage and
/// takes precedence over an unscoped pin for the same pair.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultOverrides {
    overrides: HashMap<PairKey, f64>,
}

fn ordered_key(stage: Option<Stage>, name1: &str, name2: &str) -> (PairKey, bool) {
    if name1 < name2 {
        ((stage, name1.to_string(), name2.to_string()), false)
    } else {
        ((stage, name2.to_string(), name1.to_string()), true)
    }
}

impl ResultOverrides {
    pub fn new() -> Self {
        ResultOverrides {
            overrides: HashMap::new(),
        }
    }

    /// Pin every decided playoff result at the stage it was played.
    ///
    /// A rematch at a later stage is left to the model.
    pub fn from_completed(matches: &[Match]) -> Self {
        let mut overrides = ResultOverrides::new();
        for m in matches.iter().filter(|m| m.is_completed() && m.stage.is_playoff()) {
            match m.winner.as_deref() {
                Some(w) if w == m.team1 => overrides.add_stage_override(m.stage, &m.team1, &m.team2, 1.0),
                Some(w) if w == m.team2 => overrides.add_stage_override(m.stage, &m.team1, &m.team2, 0.0),
                _ => {}
            }
        }
        overrides
    }

    /// Read overrides from CSV text.
    /// Format: team1,team2,probability[,stage] (blank lines and `#` comments
    /// skipped; without a stage the pin applies to every stage)
    pub fn read_from_str(contents: &str) -> Result<Self> {
        Self::read_lines(contents.as_bytes())
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::read_lines(file)
    }

    fn read_lines<R: Read>(source: R) -> Result<Self> {
        let mut overrides = ResultOverrides::new();
        for (idx, line) in BufReader::new(source).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            if parts.len() != 3 && parts.len() != 4 {
                return Err(OracleError::Overrides {
                    line: idx + 1,
                    reason: format!("expected 3 or 4 fields, found {}", parts.len()),
                });
            }

            let prob: f64 = parts[2].parse().map_err(|e| OracleError::Overrides {
                line: idx + 1,
                reason: format!("invalid probability: {}", e),
            })?;
            if !(0.0..=1.0).contains(&prob) {
                return Err(OracleError::Overrides {
                    line: idx + 1,
                    reason: format!("probability {} outside [0, 1]", prob),
                });
            }

            match parts.get(3) {
                Some(stage) => {
                    let stage: Stage = stage.parse().map_err(|e: OracleError| OracleError::Overrides {
                        line: idx + 1,
                        reason: e.to_string(),
                    })?;
                    overrides.add_stage_override(stage, parts[0], parts[1], prob);
                }
                None => overrides.add_override(parts[0], parts[1], prob),
            }
        }
        Ok(overrides)
    }

    /// Add or update the probability that `name1` beats `name2` at any stage.
    pub fn add_override(&mut self, name1: &str, name2: &str, prob: f64) {
        self.insert(None, name1, name2, prob);
    }

    /// Add or update the probability that `name1` beats `name2` at `stage`.
    pub fn add_stage_override(&mut self, stage: Stage, name1: &str, name2: &str, prob: f64) {
        self.insert(Some(stage), name1, name2, prob);
    }

    fn insert(&mut self, stage: Option<Stage>, name1: &str, name2: &str, prob: f64) {
        let (key, flip) = ordered_key(stage, name1, name2);
        self.overrides.insert(key, if flip { 1.0 - prob } else { prob });
    }

    /// Drop the unscoped pin for a pair.
    pub fn remove_override(&mut self, name1: &str, name2: &str) {
        self.overrides.remove(&ordered_key(None, name1, name2).0);
    }

    pub fn remove_stage_override(&mut self, stage: Stage, name1: &str, name2: &str) {
        self.overrides.remove(&ordered_key(Some(stage), name1, name2).0);
    }

    /// Probability of `name1` beating `name2`, if pinned for every stage.
    pub fn get(&self, name1: &str, name2: &str) -> Option<f64> {
        self.lookup(None, name1, name2)
    }

    /// Probability of `name1` beating `name2` at `stage`, if pinned.
    pub fn get_at(&self, stage: Stage, name1: &str, name2: &str) -> Option<f64> {
        self.lookup(Some(stage), name1, name2)
            .or_else(|| self.lookup(None, name1, name2))
    }

    fn lookup(&self, stage: Option<Stage>, name1: &str, name2: &str) -> Option<f64> {
        let (key, flip) = ordered_key(stage, name1, name2);
        self.overrides.get(&key).map(|&p| if flip { 1.0 - p } else { p })
    }

    pub fn has_override(&self, name1: &str, name2: &str) -> bool {
        self.overrides.contains_key(&ordered_key(None, name1, name2).0)
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}
