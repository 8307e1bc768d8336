// Optimizer entry point: validation, pre-check, scoring, solver dispatch,
// result verification, and captaincy.
//
// Both strategies sit behind `SelectionSolver`, so callers (and tests) can
// swap in any solver that produces a selection over pool indices.

pub mod evolve;
pub mod exact;

use std::collections::HashSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::captaincy::{assign_captaincy, Captaincy};
use crate::config::SelectionConfig;
use crate::constraints::ConstraintSet;
use crate::error::SelectionError;
use crate::player::PlayerPool;
use crate::roster::TeamSheet;
use crate::scoring::{score_pool, ScoredPlayer, OBJECTIVE_COUNT};

pub use evolve::EvolutionarySolver;
pub use exact::ExactSolver;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which optimizer a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Single-objective integer program.
    #[default]
    Exact,
    /// NSGA-II search over batting, bowling, and fielding totals.
    Evolutionary,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Exact => write!(f, "exact"),
            Strategy::Evolutionary => write!(f, "evolutionary"),
        }
    }
}

/// How the returned side was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionOrigin {
    Exact,
    Evolutionary { front_size: usize },
    /// The evolutionary front was unusable; the side is a verified greedy
    /// top-by-score pick.
    Fallback { reason: String },
}

impl SelectionOrigin {
    pub fn is_fallback(&self) -> bool {
        matches!(self, SelectionOrigin::Fallback { .. })
    }
}

/// One non-dominated side from the evolutionary front.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParetoPoint {
    pub players: Vec<String>,
    pub captain: Option<String>,
    pub vice_captain: Option<String>,
    /// Batting, bowling, and fielding totals with captaincy multipliers.
    pub objectives: [f64; OBJECTIVE_COUNT],
    /// Captain/vice-captain weighted sum of computed scores.
    pub adjusted_score: f64,
}

/// Everything a solver needs for one run. All borrowed and read-only.
#[derive(Debug, Clone, Copy)]
pub struct SelectionProblem<'a> {
    pub pool: &'a PlayerPool,
    pub scored: &'a [ScoredPlayer],
    pub constraints: &'a ConstraintSet,
    pub config: &'a SelectionConfig,
}

/// A solver's answer, before verification.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Pool indices of the selected players.
    pub players: Vec<usize>,
    /// Set when the solver modeled captaincy itself.
    pub captaincy: Option<Captaincy>,
    pub origin: SelectionOrigin,
    pub front: Vec<ParetoPoint>,
}

/// A strategy that turns a scored, pre-checked pool into a selection.
pub trait SelectionSolver {
    fn name(&self) -> &'static str;

    fn solve(&self, problem: &SelectionProblem<'_>) -> Result<Selection, SelectionError>;
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Select a side from `pool` with one of the built-in strategies.
pub fn select_team(
    pool: &PlayerPool,
    config: &SelectionConfig,
    strategy: Strategy,
) -> Result<TeamSheet, SelectionError> {
    match strategy {
        Strategy::Exact => select_team_with(&ExactSolver, pool, config),
        Strategy::Evolutionary => select_team_with(&EvolutionarySolver, pool, config),
    }
}

/// Select a side with a caller-supplied solver.
///
/// The config is validated and the pool pre-checked before the solver runs.
/// Whatever the solver returns is re-verified against the full constraint
/// set; a side that breaks any rule is reported as `OptimizationFailed`
/// rather than returned.
pub fn select_team_with<S: SelectionSolver + ?Sized>(
    solver: &S,
    pool: &PlayerPool,
    config: &SelectionConfig,
) -> Result<TeamSheet, SelectionError> {
    config.validate()?;
    let constraints = ConstraintSet::from_config(config);
    constraints.precheck(pool)?;

    let scored = score_pool(pool, &config.scoring);
    info!(
        "selecting {} from {} players ({} vs {}) with the {} solver",
        config.squad_size,
        pool.len(),
        pool.teams()[0],
        pool.teams()[1],
        solver.name()
    );

    let problem = SelectionProblem {
        pool,
        scored: &scored,
        constraints: &constraints,
        config,
    };
    let started = Instant::now();
    let selection = solver.solve(&problem)?;
    debug!(
        "{} solver finished in {:.1?}",
        solver.name(),
        started.elapsed()
    );

    verify_selection(&problem, &selection)?;

    let captaincy = match selection.captaincy {
        Some(c) => c,
        None => assign_captaincy(pool, &scored, &selection.players, &config.captaincy),
    };

    if let SelectionOrigin::Fallback { reason } = &selection.origin {
        warn!("returning fallback side: {reason}");
    }

    let sheet = TeamSheet::build(
        pool,
        &scored,
        &selection.players,
        captaincy,
        &config.captaincy,
        selection.origin,
        selection.front,
    );
    info!(
        "selected side: score {:.2}, projected {:.2}, credits {:.1}/{:.1}",
        sheet.total_score, sheet.projected_points, sheet.total_credits, config.budget
    );
    Ok(sheet)
}

/// Reject duplicate or out-of-range indices, broken constraints, and
/// captaincy that is not two distinct selected players.
fn verify_selection(
    problem: &SelectionProblem<'_>,
    selection: &Selection,
) -> Result<(), SelectionError> {
    let fail = |status: String| SelectionError::OptimizationFailed {
        status,
        snapshot: Box::new(problem.constraints.snapshot(problem.pool)),
    };

    let unique: HashSet<usize> = selection.players.iter().copied().collect();
    if unique.len() != selection.players.len() {
        return Err(fail("solver returned duplicate players".into()));
    }
    if let Some(&bad) = selection.players.iter().find(|&&i| i >= problem.pool.len()) {
        return Err(fail(format!("solver returned unknown player index {bad}")));
    }

    let violations = problem
        .constraints
        .violations(problem.pool, &selection.players);
    if !violations.is_empty() {
        let listed: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
        return Err(fail(format!(
            "solver returned an illegal side: {}",
            listed.join("; ")
        )));
    }

    if let Some(c) = &selection.captaincy {
        let valid = match (c.captain, c.vice_captain) {
            (Some(cap), Some(vice)) => {
                cap != vice && unique.contains(&cap) && unique.contains(&vice)
            }
            _ => false,
        };
        if !valid {
            return Err(fail(format!(
                "solver returned invalid captaincy (captain {:?}, vice-captain {:?})",
                c.captain, c.vice_captain
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PerformanceMetrics, Player, Role};

    fn pool() -> PlayerPool {
        let layout = [
            Role::Wicketkeeper,
            Role::Batter,
            Role::Batter,
            Role::Bowler,
            Role::Bowler,
            Role::Allrounder,
        ];
        let players = ["MI", "KKR"]
            .iter()
            .flat_map(|team| {
                layout.iter().enumerate().map(move |(i, &role)| Player {
                    name: format!("{team}{i}"),
                    team: team.to_string(),
                    role,
                    credit_cost: 8.0,
                    metrics: PerformanceMetrics {
                        batting: 10.0 + i as f64,
                        bowling: 5.0 + i as f64,
                        fielding: 1.0,
                    },
                    lineup_order: Some(i as u32 + 1),
                    bowling_style: None,
                })
            })
            .collect();
        PlayerPool::new(players, None).unwrap()
    }

    /// Returns a fixed answer regardless of the problem.
    struct Canned(Selection);

    impl SelectionSolver for Canned {
        fn name(&self) -> &'static str {
            "canned"
        }

        fn solve(&self, _problem: &SelectionProblem<'_>) -> Result<Selection, SelectionError> {
            Ok(self.0.clone())
        }
    }

    fn canned(players: Vec<usize>, captaincy: Option<Captaincy>) -> Canned {
        Canned(Selection {
            players,
            captaincy,
            origin: SelectionOrigin::Exact,
            front: Vec::new(),
        })
    }

    #[test]
    fn legal_canned_side_gets_post_hoc_captaincy() {
        // Drop MI's second batter: 2 WK, 3 BAT, 4 BOWL, 2 ALL; 5 MI + 6 KKR.
        let players = vec![0, 1, 3, 4, 5, 6, 7, 8, 9, 10, 11];
        let sheet =
            select_team_with(&canned(players, None), &pool(), &SelectionConfig::default()).unwrap();
        assert_eq!(sheet.len(), 11);
        assert!(sheet.captain().is_some());
        assert!(sheet.vice_captain().is_some());
        assert_ne!(sheet.captain(), sheet.vice_captain());
    }

    #[test]
    fn illegal_side_is_rejected() {
        let players = (0..10).collect();
        match select_team_with(&canned(players, None), &pool(), &SelectionConfig::default()) {
            Err(SelectionError::OptimizationFailed { status, .. }) => {
                assert!(status.contains("need exactly 11"), "{status}");
            }
            other => panic!("expected OptimizationFailed, got: {other:?}"),
        }
    }

    #[test]
    fn duplicate_players_are_rejected() {
        let players = vec![0, 0, 3, 4, 5, 6, 7, 8, 9, 10, 11];
        match select_team_with(&canned(players, None), &pool(), &SelectionConfig::default()) {
            Err(SelectionError::OptimizationFailed { status, .. }) => {
                assert!(status.contains("duplicate"));
            }
            other => panic!("expected OptimizationFailed, got: {other:?}"),
        }
    }

    #[test]
    fn captain_outside_side_is_rejected() {
        let players = vec![0, 1, 3, 4, 5, 6, 7, 8, 9, 10, 11];
        let captaincy = Captaincy {
            captain: Some(2),
            vice_captain: Some(0),
        };
        let config = SelectionConfig::default();
        match select_team_with(&canned(players, Some(captaincy)), &pool(), &config) {
            Err(SelectionError::OptimizationFailed { status, .. }) => {
                assert!(status.contains("captaincy"));
            }
            other => panic!("expected OptimizationFailed, got: {other:?}"),
        }
    }

    #[test]
    fn invalid_config_stops_before_solving() {
        let config = SelectionConfig {
            budget: f64::NAN,
            ..SelectionConfig::default()
        };
        match select_team_with(&canned(Vec::new(), None), &pool(), &config) {
            Err(SelectionError::InvalidConfig { field, .. }) => assert_eq!(field, "budget"),
            other => panic!("expected InvalidConfig, got: {other:?}"),
        }
    }

    #[test]
    fn strategy_parses_from_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            strategy: Strategy,
        }
        let w: Wrapper = toml::from_str("strategy = \"evolutionary\"").unwrap();
        assert_eq!(w.strategy, Strategy::Evolutionary);
        assert_eq!(Strategy::Exact.to_string(), "exact");
    }

    #[test]
    fn origin_serializes_with_a_kind_tag() {
        let exact = serde_json::to_value(&SelectionOrigin::Exact).unwrap();
        assert_eq!(exact, serde_json::json!({ "kind": "exact" }));

        let evolved = SelectionOrigin::Evolutionary { front_size: 4 };
        let evolved = serde_json::to_value(&evolved).unwrap();
        assert_eq!(evolved["kind"], "evolutionary");
        assert_eq!(evolved["front_size"], 4);

        let fallback = SelectionOrigin::Fallback {
            reason: "empty front".into(),
        };
        assert_eq!(
            serde_json::to_value(&fallback).unwrap(),
            serde_json::json!({ "kind": "fallback", "reason": "empty front" })
        );
    }
}
