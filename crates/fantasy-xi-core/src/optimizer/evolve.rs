// Evolutionary strategy: NSGA-II over batting, bowling, and fielding totals.
//
// Genome layout is `[selected; n]`, optionally followed by `[captain; n]`
// and `[vice_captain; n]`. Constraint residuals are not a hard reject: they
// rank infeasible individuals behind feasible ones (constrained
// domination), and among themselves by total violation.

use std::cmp::Ordering;
use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::captaincy::{assign_captaincy, captaincy_bonus, rank_by_score, Captaincy};
use crate::config::FrontPick;
use crate::constraints::{Residuals, BUDGET_TOLERANCE};
use crate::error::SelectionError;
use crate::player::Role;
use crate::scoring::OBJECTIVE_COUNT;

use super::{ParetoPoint, Selection, SelectionOrigin, SelectionProblem, SelectionSolver};

/// Offspring attempts per population slot before a generation gives up on
/// finding fresh genomes.
const ATTEMPTS_PER_SLOT: usize = 20;

/// Objective totals below this are treated as zero when judging the front.
const DEGENERATE_EPSILON: f64 = 1e-9;

/// NSGA-II solver returning a Pareto front and one balanced pick from it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvolutionarySolver;

// ---------------------------------------------------------------------------
// Genome and evaluation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    players: usize,
    captaincy: bool,
}

impl Layout {
    fn len(&self) -> usize {
        if self.captaincy {
            3 * self.players
        } else {
            self.players
        }
    }

    fn captain(&self, genome: &[bool], i: usize) -> bool {
        self.captaincy && genome[self.players + i]
    }

    fn vice(&self, genome: &[bool], i: usize) -> bool {
        self.captaincy && genome[2 * self.players + i]
    }

    fn selected(&self, genome: &[bool]) -> Vec<usize> {
        (0..self.players).filter(|&i| genome[i]).collect()
    }

    /// Captaincy encoded in the genome, if the layout carries it.
    fn captaincy(&self, genome: &[bool]) -> Option<Captaincy> {
        self.captaincy.then(|| Captaincy {
            captain: (0..self.players).find(|&i| self.captain(genome, i)),
            vice_captain: (0..self.players).find(|&i| self.vice(genome, i)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fitness {
    objectives: [f64; OBJECTIVE_COUNT],
    violation: f64,
}

impl Fitness {
    fn is_feasible(&self) -> bool {
        self.violation <= BUDGET_TOLERANCE
    }
}

#[derive(Debug, Clone)]
struct Individual {
    genome: Vec<bool>,
    fitness: Fitness,
    rank: usize,
    crowding: f64,
}

fn bit(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Objectives and total constraint violation for one genome. Pure in the
/// genome and the read-only problem, so safe to run on any thread.
fn evaluate(problem: &SelectionProblem<'_>, layout: Layout, genome: &[bool]) -> Fitness {
    let selected = layout.selected(genome);
    let tally = problem.constraints.tally(problem.pool, &selected);
    let mut residuals: Residuals = problem.constraints.residuals(&tally);

    let captaincy = &problem.config.captaincy;
    let c_extra = captaincy.captain_multiplier - 1.0;
    let v_extra = captaincy.vice_captain_multiplier - 1.0;

    let mut objectives = [0.0; OBJECTIVE_COUNT];
    let (mut captains, mut vices) = (0.0, 0.0);
    for i in 0..layout.players {
        let x = bit(genome[i]);
        let c = bit(layout.captain(genome, i));
        let v = bit(layout.vice(genome, i));
        let weight = x + c_extra * c + v_extra * v;
        for (total, metric) in objectives.iter_mut().zip(problem.scored[i].objectives) {
            *total += metric * weight;
        }
        if layout.captaincy {
            captains += c;
            vices += v;
            residuals.inequality.push(c - x);
            residuals.inequality.push(v - x);
            residuals.inequality.push(c + v - 1.0);
        }
    }
    if layout.captaincy {
        residuals.equality.push(captains - 1.0);
        residuals.equality.push(vices - 1.0);
    }

    Fitness {
        objectives,
        violation: residuals.violation(),
    }
}

fn evaluate_all(
    problem: &SelectionProblem<'_>,
    layout: Layout,
    genomes: Vec<Vec<bool>>,
    parallel: bool,
) -> Vec<Individual> {
    let build = |genome: Vec<bool>| Individual {
        fitness: evaluate(problem, layout, &genome),
        genome,
        rank: 0,
        crowding: 0.0,
    };
    if parallel {
        genomes.into_par_iter().map(build).collect()
    } else {
        genomes.into_iter().map(build).collect()
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Constrained domination: feasible beats infeasible, lower violation beats
/// higher, and feasible pairs compare by Pareto dominance (maximising).
fn dominates(a: &Fitness, b: &Fitness) -> bool {
    match (a.is_feasible(), b.is_feasible()) {
        (true, false) => true,
        (false, true) => false,
        (false, false) => a.violation < b.violation,
        (true, true) => {
            let mut strictly_better = false;
            for k in 0..OBJECTIVE_COUNT {
                if a.objectives[k] < b.objectives[k] {
                    return false;
                }
                if a.objectives[k] > b.objectives[k] {
                    strictly_better = true;
                }
            }
            strictly_better
        }
    }
}

/// Fast non-dominated sort. Sets `rank` on every individual and returns the
/// fronts as index lists, best first.
fn non_dominated_sort(population: &mut [Individual]) -> Vec<Vec<usize>> {
    let n = population.len();
    let mut dominated: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count = vec![0usize; n];

    for p in 0..n {
        for q in (p + 1)..n {
            if dominates(&population[p].fitness, &population[q].fitness) {
                dominated[p].push(q);
                domination_count[q] += 1;
            } else if dominates(&population[q].fitness, &population[p].fitness) {
                dominated[q].push(p);
                domination_count[p] += 1;
            }
        }
    }

    let mut fronts: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&p| domination_count[p] == 0).collect();
    let mut rank = 0;
    while !current.is_empty() {
        let mut next = Vec::new();
        for &p in &current {
            population[p].rank = rank;
            for &q in &dominated[p] {
                domination_count[q] -= 1;
                if domination_count[q] == 0 {
                    next.push(q);
                }
            }
        }
        fronts.push(current);
        current = next;
        rank += 1;
    }
    fronts
}

fn assign_crowding(population: &mut [Individual], front: &[usize]) {
    if front.len() <= 2 {
        for &i in front {
            population[i].crowding = f64::INFINITY;
        }
        return;
    }
    for &i in front {
        population[i].crowding = 0.0;
    }
    for k in 0..OBJECTIVE_COUNT {
        let mut order = front.to_vec();
        order.sort_by(|&a, &b| {
            population[a].fitness.objectives[k].total_cmp(&population[b].fitness.objectives[k])
        });
        let first = order[0];
        let last = order[order.len() - 1];
        population[first].crowding = f64::INFINITY;
        population[last].crowding = f64::INFINITY;

        let span = population[last].fitness.objectives[k] - population[first].fitness.objectives[k];
        if span <= 0.0 {
            continue;
        }
        for w in 1..order.len() - 1 {
            let gap = population[order[w + 1]].fitness.objectives[k]
                - population[order[w - 1]].fitness.objectives[k];
            population[order[w]].crowding += gap / span;
        }
    }
}

/// (mu + lambda) survival: whole fronts first, the last partial front by
/// descending crowding distance.
fn survive(mut combined: Vec<Individual>, size: usize) -> Vec<Individual> {
    let fronts = non_dominated_sort(&mut combined);
    let mut keep: Vec<usize> = Vec::with_capacity(size);
    for front in fronts {
        assign_crowding(&mut combined, &front);
        if keep.len() + front.len() <= size {
            keep.extend(front);
        } else {
            let mut rest = front;
            let crowding = |i: usize| combined[i].crowding;
            rest.sort_by(|&a, &b| crowding(b).total_cmp(&crowding(a)));
            keep.extend(rest.into_iter().take(size - keep.len()));
        }
        if keep.len() >= size {
            break;
        }
    }

    let mut slots: Vec<Option<Individual>> = combined.into_iter().map(Some).collect();
    keep.into_iter().filter_map(|i| slots[i].take()).collect()
}

// ---------------------------------------------------------------------------
// Variation
// ---------------------------------------------------------------------------

/// Random genome with selection density near `squad / players`, plus a
/// random captain and vice-captain among the selected when modeled.
fn sample(layout: Layout, squad: usize, rng: &mut StdRng) -> Vec<bool> {
    let n = layout.players;
    let density = (squad as f64 / n as f64).min(1.0);
    let mut genome = vec![false; layout.len()];
    for gene in genome.iter_mut().take(n) {
        *gene = rng.gen_bool(density);
    }
    if layout.captaincy {
        let picked = layout.selected(&genome);
        let pair: Vec<usize> = picked.choose_multiple(rng, 2).copied().collect();
        if let &[c, v] = pair.as_slice() {
            genome[n + c] = true;
            genome[2 * n + v] = true;
        }
    }
    genome
}

/// Binary tournament on (rank, crowding).
fn tournament(population: &[Individual], rng: &mut StdRng) -> usize {
    let a = rng.gen_range(0..population.len());
    let b = rng.gen_range(0..population.len());
    let (x, y) = (&population[a], &population[b]);
    match x.rank.cmp(&y.rank).then_with(|| y.crowding.total_cmp(&x.crowding)) {
        Ordering::Less => a,
        Ordering::Greater => b,
        Ordering::Equal => {
            if rng.gen_bool(0.5) {
                a
            } else {
                b
            }
        }
    }
}

fn two_point_crossover(
    first: &[bool],
    second: &[bool],
    probability: f64,
    rng: &mut StdRng,
) -> (Vec<bool>, Vec<bool>) {
    let mut a = first.to_vec();
    let mut b = second.to_vec();
    if a.len() >= 2 && rng.gen_bool(probability) {
        let mut lo = rng.gen_range(0..a.len());
        let mut hi = rng.gen_range(0..a.len());
        if lo > hi {
            std::mem::swap(&mut lo, &mut hi);
        }
        a[lo..hi].swap_with_slice(&mut b[lo..hi]);
    }
    (a, b)
}

fn bit_flip(genome: &mut [bool], probability: f64, rng: &mut StdRng) {
    for gene in genome.iter_mut() {
        if rng.gen_bool(probability) {
            *gene = !*gene;
        }
    }
}

// ---------------------------------------------------------------------------
// Front handling
// ---------------------------------------------------------------------------

struct Candidate {
    players: Vec<usize>,
    modeled: Option<Captaincy>,
    point: ParetoPoint,
}

fn candidate(problem: &SelectionProblem<'_>, layout: Layout, individual: &Individual) -> Candidate {
    let players = layout.selected(&individual.genome);
    let modeled = layout.captaincy(&individual.genome);
    let captaincy = modeled.unwrap_or_else(|| {
        assign_captaincy(
            problem.pool,
            problem.scored,
            &players,
            &problem.config.captaincy,
        )
    });
    let base: f64 = players.iter().map(|&i| problem.scored[i].score).sum();
    let adjusted_score =
        base + captaincy_bonus(problem.scored, &captaincy, &problem.config.captaincy);
    let name = |i: usize| problem.pool.players()[i].name.clone();

    let point = ParetoPoint {
        players: rank_by_score(problem.pool, problem.scored, &players)
            .into_iter()
            .map(name)
            .collect(),
        captain: captaincy.captain.map(name),
        vice_captain: captaincy.vice_captain.map(name),
        objectives: individual.fitness.objectives,
        adjusted_score,
    };
    Candidate {
        players,
        modeled,
        point,
    }
}

fn pick_value(rule: &FrontPick, point: &ParetoPoint) -> f64 {
    match rule {
        FrontPick::AdjustedScore => point.adjusted_score,
        FrontPick::Normalized { scales } => point
            .objectives
            .iter()
            .zip(scales)
            .map(|(total, scale)| total / scale)
            .sum(),
    }
}

/// Index of the first candidate with the highest pick value.
fn pick_balanced(rule: &FrontPick, candidates: &[Candidate]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in candidates.iter().enumerate() {
        let value = pick_value(rule, &c.point);
        if best.map_or(true, |(_, b)| value > b) {
            best = Some((i, value));
        }
    }
    best.map(|(i, _)| i)
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// Constraint-aware greedy pick by score: fill every minimum with the best
/// available player, then top up with the best remaining. Never exceeds a
/// maximum, and keeps enough budget back to fill the remaining slots with
/// the cheapest players left.
fn greedy_side(problem: &SelectionProblem<'_>) -> Vec<usize> {
    let SelectionProblem {
        pool,
        scored,
        constraints: set,
        ..
    } = *problem;
    let ranked = rank_by_score(pool, scored, &(0..pool.len()).collect::<Vec<_>>());
    let mut selected: Vec<usize> = Vec::with_capacity(set.squad_size);

    let can_add = |selected: &[usize], i: usize| -> bool {
        if selected.contains(&i) || selected.len() >= set.squad_size {
            return false;
        }
        let player = &pool.players()[i];
        let tally = set.tally(pool, selected);
        if tally.roles[player.role.index()] >= set.roles.get(player.role).max {
            return false;
        }
        if tally.teams[pool.team_index(i)] >= set.per_team.max {
            return false;
        }
        let remaining = set.squad_size - selected.len() - 1;
        let mut costs: Vec<f64> = (0..pool.len())
            .filter(|&j| j != i && !selected.contains(&j))
            .map(|j| pool.players()[j].credit_cost)
            .collect();
        costs.sort_by(|a, b| a.total_cmp(b));
        let reserve: f64 = costs.iter().take(remaining).sum();
        tally.credits + player.credit_cost + reserve <= set.budget + BUDGET_TOLERANCE
    };

    let fill = |selected: &mut Vec<usize>,
                member: &dyn Fn(usize) -> bool,
                needed: &dyn Fn(&[usize]) -> bool| {
        while needed(selected.as_slice()) {
            match ranked
                .iter()
                .copied()
                .find(|&i| member(i) && can_add(selected.as_slice(), i))
            {
                Some(i) => selected.push(i),
                None => break,
            }
        }
    };

    // Style bowlers count toward the bowler minimum; fill them first.
    if let Some((_, min)) = set.style_quota {
        fill(
            &mut selected,
            &|i: usize| set.counts_for_style(pool, i),
            &|s: &[usize]| set.tally(pool, s).style_bowlers < min,
        );
    }
    for role in Role::ALL {
        let min = set.roles.get(role).min;
        fill(
            &mut selected,
            &|i: usize| pool.players()[i].role == role,
            &|s: &[usize]| set.tally(pool, s).roles[role.index()] < min,
        );
    }
    fill(
        &mut selected,
        &|i: usize| pool.players()[i].role.is_bowling_option(),
        &|s: &[usize]| set.tally(pool, s).bowling_options < set.min_bowling_options,
    );
    for t in 0..2 {
        fill(
            &mut selected,
            &|i: usize| pool.team_index(i) == t,
            &|s: &[usize]| set.tally(pool, s).teams[t] < set.per_team.min,
        );
    }
    fill(
        &mut selected,
        &|_: usize| true,
        &|s: &[usize]| s.len() < set.squad_size,
    );

    selected
}

fn fallback(problem: &SelectionProblem<'_>, reason: String) -> Result<Selection, SelectionError> {
    warn!("front unusable ({reason}); trying greedy fallback");
    let players = greedy_side(problem);
    let violations = problem.constraints.violations(problem.pool, &players);
    if !violations.is_empty() {
        let listed: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
        return Err(SelectionError::DegenerateResult {
            detail: format!(
                "{reason}; greedy fallback is also illegal: {}",
                listed.join("; ")
            ),
        });
    }
    Ok(Selection {
        players,
        captaincy: None,
        origin: SelectionOrigin::Fallback { reason },
        front: Vec::new(),
    })
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

impl SelectionSolver for EvolutionarySolver {
    fn name(&self) -> &'static str {
        "evolutionary"
    }

    fn solve(&self, problem: &SelectionProblem<'_>) -> Result<Selection, SelectionError> {
        let settings = &problem.config.evolution;
        let size = settings.population_size;
        let squad = problem.constraints.squad_size;
        let layout = Layout {
            players: problem.pool.len(),
            captaincy: settings.model_captaincy,
        };
        let mut rng = StdRng::seed_from_u64(settings.seed);

        let mut seen: HashSet<Vec<bool>> = HashSet::new();
        let mut genomes = Vec::with_capacity(size);
        for _ in 0..size * ATTEMPTS_PER_SLOT {
            if genomes.len() >= size {
                break;
            }
            let genome = sample(layout, squad, &mut rng);
            if seen.insert(genome.clone()) {
                genomes.push(genome);
            }
        }
        let mut population = survive(
            evaluate_all(problem, layout, genomes, settings.parallel),
            size,
        );

        for generation in 0..settings.generations {
            let mut seen: HashSet<Vec<bool>> =
                population.iter().map(|ind| ind.genome.clone()).collect();
            let mut offspring = Vec::with_capacity(size);
            for _ in 0..size * ATTEMPTS_PER_SLOT {
                if offspring.len() >= size {
                    break;
                }
                let a = tournament(&population, &mut rng);
                let b = tournament(&population, &mut rng);
                let (mut c1, mut c2) = two_point_crossover(
                    &population[a].genome,
                    &population[b].genome,
                    settings.crossover_probability,
                    &mut rng,
                );
                bit_flip(&mut c1, settings.mutation_probability, &mut rng);
                bit_flip(&mut c2, settings.mutation_probability, &mut rng);
                for child in [c1, c2] {
                    if offspring.len() < size && seen.insert(child.clone()) {
                        offspring.push(child);
                    }
                }
            }

            let produced = offspring.len();
            let evaluated = evaluate_all(problem, layout, offspring, settings.parallel);
            population.extend(evaluated);
            population = survive(population, size);

            let feasible = population.iter().filter(|ind| ind.fitness.is_feasible()).count();
            debug!(
                "generation {}: {} offspring, {} feasible, best violation {:.3}",
                generation + 1,
                produced,
                feasible,
                population
                    .iter()
                    .map(|ind| ind.fitness.violation)
                    .fold(f64::INFINITY, f64::min)
            );
        }

        let front: Vec<&Individual> = population
            .iter()
            .filter(|ind| ind.rank == 0 && ind.fitness.is_feasible())
            .collect();
        if front.is_empty() {
            return fallback(
                problem,
                format!(
                    "no feasible side after {} generations",
                    settings.generations
                ),
            );
        }
        if front.iter().all(|ind| {
            ind.fitness
                .objectives
                .iter()
                .all(|o| o.abs() < DEGENERATE_EPSILON)
        }) {
            return fallback(problem, "every front objective total is zero".into());
        }

        let mut candidates: Vec<Candidate> = front
            .iter()
            .map(|ind| candidate(problem, layout, ind))
            .collect();
        let adjusted = |c: &Candidate| c.point.adjusted_score;
        candidates.sort_by(|a, b| adjusted(b).total_cmp(&adjusted(a)));
        let Some(chosen) = pick_balanced(&settings.pick, &candidates) else {
            return fallback(problem, "front produced no candidate".into());
        };
        info!(
            "Pareto front has {} sides; picked adjusted score {:.2}",
            candidates.len(),
            candidates[chosen].point.adjusted_score
        );

        let front_size = candidates.len();
        let players = candidates[chosen].players.clone();
        let captaincy = candidates[chosen].modeled;
        Ok(Selection {
            players,
            captaincy,
            origin: SelectionOrigin::Evolutionary { front_size },
            front: candidates.into_iter().map(|c| c.point).collect(),
        })
    }
}
