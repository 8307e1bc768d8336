// Error taxonomy for a single selection run.

use thiserror::Error;

use crate::constraints::ConstraintSnapshot;

// ---------------------------------------------------------------------------
// Pool schema problems
// ---------------------------------------------------------------------------

/// A reason a player pool fails schema validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoolIssue {
    #[error("row {row} has an empty player name")]
    EmptyName { row: usize },

    #[error("player `{player}` has unknown role `{role}`")]
    UnknownRole { player: String, role: String },

    #[error("player `{player}` has unknown bowling style `{style}`")]
    UnknownBowlingStyle { player: String, style: String },

    #[error("duplicate player `{0}`")]
    DuplicatePlayer(String),

    #[error("expected exactly two teams, found {}: {teams:?}", .teams.len())]
    TeamCount { teams: Vec<String> },

    #[error("player `{player}` has invalid {field}: {value}")]
    InvalidNumber {
        player: String,
        field: &'static str,
        value: f64,
    },

    #[error("home team `{0}` is not one of the pool's teams")]
    UnknownHomeTeam(String),
}

// ---------------------------------------------------------------------------
// Pre-check shortfalls
// ---------------------------------------------------------------------------

/// One minimum that the pool cannot structurally meet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    /// Human readable requirement, e.g. `all-rounders` or `team MI`.
    pub requirement: String,
    pub required: usize,
    pub available: usize,
}

impl std::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: need at least {}, pool has {}",
            self.requirement, self.required, self.available
        )
    }
}

fn join_shortfalls(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// Selection errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("invalid player pool: {0}")]
    InvalidPool(PoolIssue),

    #[error("player pool cannot field a legal side: {}", join_shortfalls(.shortfalls))]
    InfeasiblePool { shortfalls: Vec<Shortfall> },

    #[error("optimizer failed ({status}); constraints: {snapshot}")]
    OptimizationFailed {
        status: String,
        snapshot: Box<ConstraintSnapshot>,
    },

    #[error("evolutionary search produced no usable side: {detail}")]
    DegenerateResult { detail: String },

    #[error("invalid configuration for `{field}`: {message}")]
    InvalidConfig { field: String, message: String },
}

impl From<PoolIssue> for SelectionError {
    fn from(issue: PoolIssue) -> Self {
        SelectionError::InvalidPool(issue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasible_pool_message_lists_every_shortfall() {
        let err = SelectionError::InfeasiblePool {
            shortfalls: vec![
                Shortfall {
                    requirement: "all-rounders".into(),
                    required: 1,
                    available: 0,
                },
                Shortfall {
                    requirement: "team KKR".into(),
                    required: 5,
                    available: 4,
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("all-rounders: need at least 1, pool has 0"));
        assert!(msg.contains("team KKR: need at least 5, pool has 4"));
    }

    #[test]
    fn team_count_issue_reports_found_teams() {
        let issue = PoolIssue::TeamCount {
            teams: vec!["MI".into(), "CSK".into(), "RR".into()],
        };
        assert!(issue.to_string().contains("found 3"));
    }
}
