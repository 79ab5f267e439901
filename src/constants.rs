/// Rating every team starts from; Elo terms are centered here
pub const ELO_BASELINE: f64 = 1500.0;

/// Rating gap that multiplies the odds by ten
pub const ELO_SCALE: f64 = 400.0;

/// Balls in a full T20 innings
pub const INNINGS_BALLS: f64 = 120.0;

/// Players in a starting lineup
pub const FULL_XI: usize = 11;

/// Distinct roles needed for the lineup balance bonus
pub const BALANCED_ROLES: usize = 3;

/// Seeds that qualify for the playoffs
pub const PLAYOFF_SEEDS: usize = 4;
