// Exact strategy: binary integer program solved with good_lp's bundled
// pure-Rust microlp backend.
//
// Ties between equal-score sides are broken by the solver. Results are
// stable for a fixed pool order, but only the total score is guaranteed
// across pool reorderings.

use good_lp::{
    constraint, microlp, variable, variables, Expression, Solution, SolverModel, Variable,
};
use tracing::debug;

use crate::captaincy::Captaincy;
use crate::error::SelectionError;
use crate::player::{PlayerPool, Role};

use super::{Selection, SelectionOrigin, SelectionProblem, SelectionSolver};

/// Integer-program solver maximising the sum of selected scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSolver;

/// Sum of `vars[i]` over pool indices matching `member`, or `None` when no
/// player matches.
fn sum_where(vars: &[Variable], member: impl Fn(usize) -> bool) -> Option<Expression> {
    let mut terms = vars.iter().enumerate().filter(|(i, _)| member(*i)).peekable();
    terms.peek()?;
    Some(terms.map(|(_, &v)| v).sum())
}

fn role_of(pool: &PlayerPool, i: usize) -> Role {
    pool.players()[i].role
}

impl SelectionSolver for ExactSolver {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn solve(&self, problem: &SelectionProblem<'_>) -> Result<Selection, SelectionError> {
        let SelectionProblem {
            pool,
            scored,
            constraints: set,
            config,
        } = *problem;
        let n = pool.len();
        let model_captaincy = config.exact.model_captaincy;

        let mut vars = variables!();
        let selected: Vec<Variable> = (0..n).map(|_| vars.add(variable().binary())).collect();
        let (captain, vice): (Vec<Variable>, Vec<Variable>) = if model_captaincy {
            (
                (0..n).map(|_| vars.add(variable().binary())).collect(),
                (0..n).map(|_| vars.add(variable().binary())).collect(),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        let mut objective: Expression = selected
            .iter()
            .zip(scored)
            .map(|(&x, s)| s.score * x)
            .sum();
        if model_captaincy {
            let c_extra = config.captaincy.captain_multiplier - 1.0;
            let v_extra = config.captaincy.vice_captain_multiplier - 1.0;
            for i in 0..n {
                objective += c_extra * scored[i].score * captain[i];
                objective += v_extra * scored[i].score * vice[i];
            }
        }

        let mut model = vars.maximise(objective).using(microlp);

        let squad = set.squad_size as f64;
        let everyone: Expression = selected.iter().copied().sum();
        model = model.with(constraint!(everyone == squad));

        for role in Role::ALL {
            let bounds = set.roles.get(role);
            if let Some(count) = sum_where(&selected, |i| role_of(pool, i) == role) {
                let (min, max) = (bounds.min as f64, bounds.max as f64);
                model = model.with(constraint!(count.clone() >= min));
                model = model.with(constraint!(count <= max));
            }
        }

        for t in 0..2 {
            if let Some(count) = sum_where(&selected, |i| pool.team_index(i) == t) {
                let (min, max) = (set.per_team.min as f64, set.per_team.max as f64);
                model = model.with(constraint!(count.clone() >= min));
                model = model.with(constraint!(count <= max));
            }
        }

        let spend: Expression = selected
            .iter()
            .zip(pool.players())
            .map(|(&x, p)| p.credit_cost * x)
            .sum();
        let budget = set.budget;
        model = model.with(constraint!(spend <= budget));

        if set.min_bowling_options > 0 {
            if let Some(options) = sum_where(&selected, |i| role_of(pool, i).is_bowling_option()) {
                let min = set.min_bowling_options as f64;
                model = model.with(constraint!(options >= min));
            }
        }

        if let Some((_, min)) = set.style_quota {
            if let Some(style_bowlers) = sum_where(&selected, |i| set.counts_for_style(pool, i)) {
                let min = min as f64;
                model = model.with(constraint!(style_bowlers >= min));
            }
        }

        if model_captaincy {
            let captains: Expression = captain.iter().copied().sum();
            let vices: Expression = vice.iter().copied().sum();
            model = model.with(constraint!(captains == 1));
            model = model.with(constraint!(vices == 1));
            for i in 0..n {
                model = model.with(constraint!(captain[i] <= selected[i]));
                model = model.with(constraint!(vice[i] <= selected[i]));
                model = model.with(constraint!(captain[i] + vice[i] <= 1));
            }
        }

        debug!(
            "exact model: {} players, {} binaries, captaincy modeled: {}",
            n,
            if model_captaincy { 3 * n } else { n },
            model_captaincy
        );

        let solution = model.solve().map_err(|e| SelectionError::OptimizationFailed {
            status: e.to_string(),
            snapshot: Box::new(set.snapshot(pool)),
        })?;

        let players: Vec<usize> = (0..n).filter(|&i| solution.value(selected[i]) > 0.5).collect();
        let captaincy = model_captaincy.then(|| Captaincy {
            captain: (0..n).find(|&i| solution.value(captain[i]) > 0.5),
            vice_captain: (0..n).find(|&i| solution.value(vice[i]) > 0.5),
        });

        Ok(Selection {
            players,
            captaincy,
            origin: SelectionOrigin::Exact,
            front: Vec::new(),
        })
    }
}
