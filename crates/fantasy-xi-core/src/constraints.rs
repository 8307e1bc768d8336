// Constraint model: role quotas, team balance, budget, bowling options, and
// the optional pitch-style quota, plus the mandatory pool pre-check.

use serde::Serialize;

use crate::config::{Bounds, RoleBounds, SelectionConfig};
use crate::error::{SelectionError, Shortfall};
use crate::player::{BowlingStyle, PlayerPool, Role};

/// Tolerance for the credit ceiling; credits are decimal values like 8.5.
pub const BUDGET_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Constraint set
// ---------------------------------------------------------------------------

/// The fixed linear constraint set over binary selection variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSet {
    pub squad_size: usize,
    pub roles: RoleBounds,
    pub per_team: Bounds,
    pub budget: f64,
    pub min_bowling_options: usize,
    /// Minimum selected bowlers of the given style.
    pub style_quota: Option<(BowlingStyle, usize)>,
}

/// Counts for one candidate selection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tally {
    pub size: usize,
    pub roles: [usize; 4],
    pub teams: [usize; 2],
    pub bowling_options: usize,
    pub style_bowlers: usize,
    pub credits: f64,
}

/// One broken constraint in a concrete selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    SquadSize { expected: usize, actual: usize },
    RoleCount { role: Role, bounds: Bounds, actual: usize },
    TeamCount { team: String, bounds: Bounds, actual: usize },
    Budget { budget: f64, spent: f64 },
    BowlingOptions { min: usize, actual: usize },
    StyleBowlers { style: BowlingStyle, min: usize, actual: usize },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::SquadSize { expected, actual } => {
                write!(f, "selected {actual} players, need exactly {expected}")
            }
            Violation::RoleCount { role, bounds, actual } => {
                write!(f, "{} {actual} outside {bounds}", role.plural())
            }
            Violation::TeamCount { team, bounds, actual } => {
                write!(f, "team {team} has {actual}, allowed {bounds}")
            }
            Violation::Budget { budget, spent } => {
                write!(f, "credits {spent:.2} exceed budget {budget:.2}")
            }
            Violation::BowlingOptions { min, actual } => {
                write!(f, "{actual} bowling options, need at least {min}")
            }
            Violation::StyleBowlers { style, min, actual } => {
                write!(f, "{actual} {style:?} bowlers, need at least {min}")
            }
        }
    }
}

/// Constraint residuals in solver form: equalities must be 0, inequalities
/// must be <= 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Residuals {
    pub equality: Vec<f64>,
    pub inequality: Vec<f64>,
}

impl Residuals {
    /// Total violation magnitude: sum of |h| plus sum of positive g.
    pub fn violation(&self) -> f64 {
        self.equality.iter().map(|h| h.abs()).sum::<f64>()
            + self.inequality.iter().map(|g| g.max(0.0)).sum::<f64>()
    }
}

impl ConstraintSet {
    pub fn from_config(config: &SelectionConfig) -> Self {
        let style_quota = match config.scoring.pitch {
            Some(style) if config.min_style_bowlers > 0 => Some((style, config.min_style_bowlers)),
            _ => None,
        };
        ConstraintSet {
            squad_size: config.squad_size,
            roles: config.roles,
            per_team: config.per_team,
            budget: config.budget,
            min_bowling_options: config.min_bowling_options,
            style_quota,
        }
    }

    /// Whether the player at `index` counts toward the style quota.
    pub fn counts_for_style(&self, pool: &PlayerPool, index: usize) -> bool {
        let player = &pool.players()[index];
        match self.style_quota {
            Some((style, _)) => player.role == Role::Bowler && player.bowling_style == Some(style),
            None => false,
        }
    }

    /// Count roles, teams, bowling options, and credits for a selection.
    pub fn tally(&self, pool: &PlayerPool, selected: &[usize]) -> Tally {
        let mut tally = Tally::default();
        for &i in selected {
            let player = &pool.players()[i];
            tally.size += 1;
            tally.roles[player.role.index()] += 1;
            tally.teams[pool.team_index(i)] += 1;
            if player.role.is_bowling_option() {
                tally.bowling_options += 1;
            }
            if self.counts_for_style(pool, i) {
                tally.style_bowlers += 1;
            }
            tally.credits += player.credit_cost;
        }
        tally
    }

    /// Residual vectors for a tally (squad size as the single equality).
    pub fn residuals(&self, tally: &Tally) -> Residuals {
        let mut inequality = Vec::with_capacity(16);
        for role in Role::ALL {
            let b = self.roles.get(role);
            let n = tally.roles[role.index()] as f64;
            inequality.push(b.min as f64 - n);
            inequality.push(n - b.max as f64);
        }
        for &n in &tally.teams {
            inequality.push(self.per_team.min as f64 - n as f64);
            inequality.push(n as f64 - self.per_team.max as f64);
        }
        inequality.push(tally.credits - self.budget);
        let options_short = self.min_bowling_options as f64 - tally.bowling_options as f64;
        inequality.push(options_short);
        if let Some((_, min)) = self.style_quota {
            inequality.push(min as f64 - tally.style_bowlers as f64);
        }
        Residuals {
            equality: vec![tally.size as f64 - self.squad_size as f64],
            inequality,
        }
    }

    /// Every constraint the selection breaks. Empty means feasible.
    pub fn violations(&self, pool: &PlayerPool, selected: &[usize]) -> Vec<Violation> {
        let tally = self.tally(pool, selected);
        let mut out = Vec::new();
        if tally.size != self.squad_size {
            out.push(Violation::SquadSize {
                expected: self.squad_size,
                actual: tally.size,
            });
        }
        for role in Role::ALL {
            let bounds = self.roles.get(role);
            let actual = tally.roles[role.index()];
            if !bounds.contains(actual) {
                out.push(Violation::RoleCount { role, bounds, actual });
            }
        }
        for (t, team) in pool.teams().iter().enumerate() {
            let actual = tally.teams[t];
            if !self.per_team.contains(actual) {
                out.push(Violation::TeamCount {
                    team: team.clone(),
                    bounds: self.per_team,
                    actual,
                });
            }
        }
        if tally.credits > self.budget + BUDGET_TOLERANCE {
            out.push(Violation::Budget {
                budget: self.budget,
                spent: tally.credits,
            });
        }
        if tally.bowling_options < self.min_bowling_options {
            out.push(Violation::BowlingOptions {
                min: self.min_bowling_options,
                actual: tally.bowling_options,
            });
        }
        if let Some((style, min)) = self.style_quota {
            if tally.style_bowlers < min {
                out.push(Violation::StyleBowlers {
                    style,
                    min,
                    actual: tally.style_bowlers,
                });
            }
        }
        out
    }

    /// Structural feasibility check run before any solver is invoked.
    ///
    /// Verifies pool size, every per-role and per-team minimum, the bowling
    /// option minimum, the style quota, and that the two teams can supply a
    /// full squad without exceeding the per-team maximum. Budget tightness is
    /// left to the solver.
    pub fn precheck(&self, pool: &PlayerPool) -> Result<(), SelectionError> {
        let mut shortfalls = Vec::new();
        let mut need = |requirement: String, required: usize, available: usize| {
            if available < required {
                shortfalls.push(Shortfall {
                    requirement,
                    required,
                    available,
                });
            }
        };

        need("players".into(), self.squad_size, pool.len());

        let role_counts = pool.role_counts();
        for role in Role::ALL {
            need(
                role.plural().into(),
                self.roles.get(role).min,
                role_counts[role.index()],
            );
        }

        let bowling_available =
            role_counts[Role::Bowler.index()] + role_counts[Role::Allrounder.index()];
        need(
            "bowling options".into(),
            self.min_bowling_options,
            bowling_available,
        );

        if let Some((style, min)) = self.style_quota {
            let available = (0..pool.len())
                .filter(|&i| self.counts_for_style(pool, i))
                .count();
            need(format!("{style:?} bowlers"), min, available);
        }

        let team_counts = team_counts(pool);
        for (t, team) in pool.teams().iter().enumerate() {
            need(format!("team {team}"), self.per_team.min, team_counts[t]);
        }
        let usable: usize = team_counts.iter().map(|&n| n.min(self.per_team.max)).sum();
        need(
            "players within the per-team maximum".into(),
            self.squad_size,
            usable,
        );

        if shortfalls.is_empty() {
            Ok(())
        } else {
            Err(SelectionError::InfeasiblePool { shortfalls })
        }
    }

    /// Bounds and pool availability, attached to solver failures.
    pub fn snapshot(&self, pool: &PlayerPool) -> ConstraintSnapshot {
        let role_counts = pool.role_counts();
        let roles = Role::ALL
            .iter()
            .map(|&role| CategorySnapshot {
                label: role.code().to_string(),
                min: self.roles.get(role).min,
                max: self.roles.get(role).max,
                available: role_counts[role.index()],
            })
            .collect();
        let counts = team_counts(pool);
        let teams = pool
            .teams()
            .iter()
            .enumerate()
            .map(|(t, team)| CategorySnapshot {
                label: team.clone(),
                min: self.per_team.min,
                max: self.per_team.max,
                available: counts[t],
            })
            .collect();

        let mut costs: Vec<f64> = pool.players().iter().map(|p| p.credit_cost).collect();
        costs.sort_by(|a, b| a.total_cmp(b));
        let cheapest_squad_cost = costs.iter().take(self.squad_size).sum();

        ConstraintSnapshot {
            pool_size: pool.len(),
            squad_size: self.squad_size,
            budget: self.budget,
            cheapest_squad_cost,
            roles,
            teams,
            min_bowling_options: self.min_bowling_options,
            bowling_options_available: role_counts[Role::Bowler.index()]
                + role_counts[Role::Allrounder.index()],
        }
    }
}

fn team_counts(pool: &PlayerPool) -> [usize; 2] {
    let mut counts = [0; 2];
    for i in 0..pool.len() {
        counts[pool.team_index(i)] += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySnapshot {
    pub label: String,
    pub min: usize,
    pub max: usize,
    pub available: usize,
}

/// Diagnostic view of the constraint set against one pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintSnapshot {
    pub pool_size: usize,
    pub squad_size: usize,
    pub budget: f64,
    /// Sum of the `squad_size` cheapest credit costs, ignoring roles.
    pub cheapest_squad_cost: f64,
    pub roles: Vec<CategorySnapshot>,
    pub teams: Vec<CategorySnapshot>,
    pub min_bowling_options: usize,
    pub bowling_options_available: usize,
}

impl std::fmt::Display for ConstraintSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "squad {} from {} players, budget {:.1} (cheapest squad {:.1})",
            self.squad_size, self.pool_size, self.budget, self.cheapest_squad_cost
        )?;
        for c in self.roles.iter().chain(self.teams.iter()) {
            write!(
                f,
                ", {} [{}, {}] ({} available)",
                c.label, c.min, c.max, c.available
            )?;
        }
        write!(
            f,
            ", bowling options >= {} ({} available)",
            self.min_bowling_options, self.bowling_options_available
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringWeights;
    use crate::player::{PerformanceMetrics, Player};

    fn player(name: &str, team: &str, role: Role, credits: f64) -> Player {
        Player {
            name: name.into(),
            team: team.into(),
            role,
            credit_cost: credits,
            metrics: PerformanceMetrics::default(),
            lineup_order: None,
            bowling_style: None,
        }
    }

    /// Eleven players that together form a legal side:
    /// 1 WK, 4 BAT, 4 BOWL, 2 ALL; 6 from MI and 5 from KKR.
    fn minimal_pool() -> PlayerPool {
        PlayerPool::new(
            vec![
                player("mi_wk", "MI", Role::Wicketkeeper, 9.0),
                player("mi_bat1", "MI", Role::Batter, 9.0),
                player("mi_bat2", "MI", Role::Batter, 9.0),
                player("mi_bowl1", "MI", Role::Bowler, 9.0),
                player("mi_all", "MI", Role::Allrounder, 9.0),
                player("mi_bowl2", "MI", Role::Bowler, 9.0),
                player("kkr_bat1", "KKR", Role::Batter, 9.0),
                player("kkr_bowl1", "KKR", Role::Bowler, 9.0),
                player("kkr_bat2", "KKR", Role::Batter, 9.0),
                player("kkr_bowl2", "KKR", Role::Bowler, 9.0),
                player("kkr_all", "KKR", Role::Allrounder, 9.0),
            ],
            None,
        )
        .unwrap()
    }

    fn constraints() -> ConstraintSet {
        ConstraintSet::from_config(&SelectionConfig::default())
    }

    #[test]
    fn full_minimal_pool_is_feasible() {
        let pool = minimal_pool();
        let all: Vec<usize> = (0..pool.len()).collect();
        constraints().precheck(&pool).unwrap();
        assert!(constraints().violations(&pool, &all).is_empty());
    }

    #[test]
    fn tally_counts_everything() {
        let pool = minimal_pool();
        let tally = constraints().tally(&pool, &[0, 1, 3, 4, 6]);
        assert_eq!(tally.size, 5);
        assert_eq!(tally.roles, [1, 2, 1, 1]);
        assert_eq!(tally.teams, [4, 1]);
        assert_eq!(tally.bowling_options, 2);
        assert!((tally.credits - 45.0).abs() < 1e-9);
    }

    #[test]
    fn residuals_are_non_positive_for_feasible_selection() {
        let pool = minimal_pool();
        let all: Vec<usize> = (0..pool.len()).collect();
        let set = constraints();
        let residuals = set.residuals(&set.tally(&pool, &all));
        assert!(residuals.violation().abs() < f64::EPSILON);
        assert_eq!(residuals.equality, vec![0.0]);
    }

    #[test]
    fn residual_violation_grows_with_distance() {
        let pool = minimal_pool();
        let set = constraints();
        let near = set.residuals(&set.tally(&pool, &(0..10).collect::<Vec<_>>()));
        let far = set.residuals(&set.tally(&pool, &[0, 1]));
        assert!(near.violation() > 0.0);
        assert!(far.violation() > near.violation());
    }

    #[test]
    fn violations_name_each_broken_rule() {
        let pool = minimal_pool();
        let set = ConstraintSet {
            budget: 50.0,
            ..constraints()
        };
        let v = set.violations(&pool, &[1, 2, 6, 8]);
        assert!(v.contains(&Violation::SquadSize {
            expected: 11,
            actual: 4
        }));
        assert!(v.iter().any(|x| matches!(
            x,
            Violation::RoleCount {
                role: Role::Wicketkeeper,
                actual: 0,
                ..
            }
        )));
        assert!(v
            .iter()
            .any(|x| matches!(x, Violation::BowlingOptions { actual: 0, .. })));
        assert!(!v.iter().any(|x| matches!(x, Violation::Budget { .. })));
    }

    #[test]
    fn precheck_reports_missing_allrounders() {
        let pool = PlayerPool::new(
            (0..22)
                .map(|i| {
                    let role = match i % 11 {
                        0 => Role::Wicketkeeper,
                        1..=5 => Role::Batter,
                        _ => Role::Bowler,
                    };
                    let team = if i < 11 { "MI" } else { "KKR" };
                    player(&format!("p{i}"), team, role, 8.0)
                })
                .collect(),
            None,
        )
        .unwrap();
        match constraints().precheck(&pool).unwrap_err() {
            SelectionError::InfeasiblePool { shortfalls } => {
                assert_eq!(shortfalls.len(), 1);
                assert_eq!(shortfalls[0].requirement, "all-rounders");
                assert_eq!(shortfalls[0].available, 0);
            }
            other => panic!("expected InfeasiblePool, got: {other}"),
        }
    }

    #[test]
    fn precheck_catches_lopsided_teams() {
        // 10 MI players and 4 KKR players: KKR is short, and MI can only
        // contribute 6, so 10 usable players < 11.
        let mut players: Vec<Player> = (0..10)
            .map(|i| {
                let roles = [Role::Wicketkeeper, Role::Batter, Role::Bowler, Role::Allrounder];
                let role = roles[i % 4];
                player(&format!("mi{i}"), "MI", role, 8.0)
            })
            .collect();
        for i in 0..4 {
            players.push(player(&format!("kkr{i}"), "KKR", Role::Bowler, 8.0));
        }
        let pool = PlayerPool::new(players, None).unwrap();
        match constraints().precheck(&pool).unwrap_err() {
            SelectionError::InfeasiblePool { shortfalls } => {
                let reqs: Vec<&str> = shortfalls.iter().map(|s| s.requirement.as_str()).collect();
                assert!(reqs.contains(&"team KKR"));
                assert!(reqs.contains(&"players within the per-team maximum"));
            }
            other => panic!("expected InfeasiblePool, got: {other}"),
        }
    }

    #[test]
    fn style_quota_only_counts_matching_bowlers() {
        let config = SelectionConfig {
            scoring: ScoringWeights {
                pitch: Some(BowlingStyle::Spin),
                ..ScoringWeights::default()
            },
            min_style_bowlers: 2,
            ..SelectionConfig::default()
        };
        let set = ConstraintSet::from_config(&config);

        let mut players: Vec<Player> = minimal_pool().players().to_vec();
        players[3].bowling_style = Some(BowlingStyle::Spin);
        players[5].bowling_style = Some(BowlingStyle::Pace);
        players[4].bowling_style = Some(BowlingStyle::Spin); // all-rounder, not counted
        let pool = PlayerPool::new(players, None).unwrap();

        match set.precheck(&pool).unwrap_err() {
            SelectionError::InfeasiblePool { shortfalls } => {
                assert_eq!(shortfalls[0].requirement, "Spin bowlers");
                assert_eq!(shortfalls[0].available, 1);
            }
            other => panic!("expected InfeasiblePool, got: {other}"),
        }
    }

    #[test]
    fn snapshot_display_mentions_budget_and_roles() {
        let pool = minimal_pool();
        let snap = constraints().snapshot(&pool);
        assert!((snap.cheapest_squad_cost - 99.0).abs() < 1e-9);
        let text = snap.to_string();
        assert!(text.contains("budget 100.0"));
        assert!(text.contains("WK [1, 2] (1 available)"));
        assert!(text.contains("bowling options >= 5 (6 available)"));
    }
}
