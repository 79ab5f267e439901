use thiserror::Error;

use crate::fixture::MatchStatus;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid model config: {0}")]
    InvalidConfig(String),

    #[error("unknown match stage: {0:?}")]
    UnknownStage(String),

    #[error("unknown player role: {0:?}")]
    UnknownRole(String),

    #[error("match cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: MatchStatus, to: MatchStatus },

    #[error("bracket needs {needed} teams, standings have {found}")]
    InsufficientTeams { needed: usize, found: usize },

    #[error("team not found in standings: {0}")]
    MissingTeam(String),

    #[error("no match with id {0}")]
    UnknownMatch(String),

    #[error("malformed override at line {line}: {reason}")]
    Overrides { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OracleError>;
