// Selection configuration record: role/team bounds, budget, scoring weights,
// captaincy, and strategy parameters.
//
// Every section is `#[serde(default)]`, so a TOML file only has to name the
// values it changes. The record is passed in by the caller; nothing in this
// crate reads it from disk.

use serde::{Deserialize, Serialize};

use crate::error::SelectionError;
use crate::player::{BowlingStyle, Role};

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Inclusive count range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: usize,
    pub max: usize,
}

impl Bounds {
    pub const fn new(min: usize, max: usize) -> Self {
        Bounds { min, max }
    }

    pub fn contains(&self, n: usize) -> bool {
        (self.min..=self.max).contains(&n)
    }
}

impl std::fmt::Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Per-role selection bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleBounds {
    pub wicketkeeper: Bounds,
    pub batter: Bounds,
    pub bowler: Bounds,
    pub allrounder: Bounds,
}

impl Default for RoleBounds {
    fn default() -> Self {
        RoleBounds {
            wicketkeeper: Bounds::new(1, 2),
            batter: Bounds::new(3, 5),
            bowler: Bounds::new(3, 5),
            allrounder: Bounds::new(1, 3),
        }
    }
}

impl RoleBounds {
    pub fn get(&self, role: Role) -> Bounds {
        match role {
            Role::Wicketkeeper => self.wicketkeeper,
            Role::Batter => self.batter,
            Role::Bowler => self.bowler,
            Role::Allrounder => self.allrounder,
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// How a player's scalar score is derived from metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreModel {
    /// Role-appropriate metric times the role's venue weight.
    #[default]
    RoleWeighted,
    /// Fixed linear blend of batting, bowling, and fielding metrics.
    MetricBlend,
}

/// How an all-rounder's batting and bowling metrics are combined.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllrounderBlend {
    #[default]
    Max,
    Mean,
    Weighted { batting_share: f64 },
}

/// Weights of the metric-blend score model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricBlend {
    pub batting: f64,
    pub bowling: f64,
    pub fielding: f64,
}

impl Default for MetricBlend {
    fn default() -> Self {
        MetricBlend {
            batting: 0.45,
            bowling: 0.45,
            fielding: 0.10,
        }
    }
}

/// Venue and context weights consumed by the scoring function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub model: ScoreModel,
    pub batting: f64,
    pub bowling: f64,
    /// Defaults to `batting` when unset.
    pub keeper: Option<f64>,
    /// Defaults to `max(1, (batting + bowling) / 2)` when unset.
    pub allrounder: Option<f64>,
    pub allrounder_blend: AllrounderBlend,
    pub blend: MetricBlend,
    pub home_multiplier: f64,
    pub away_multiplier: f64,
    /// Bowling style the pitch favours, if any.
    pub pitch: Option<BowlingStyle>,
    /// Multiplier for bowlers whose style matches `pitch`.
    pub style_boost: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights {
            model: ScoreModel::RoleWeighted,
            batting: 1.0,
            bowling: 1.0,
            keeper: None,
            allrounder: None,
            allrounder_blend: AllrounderBlend::Max,
            blend: MetricBlend::default(),
            home_multiplier: 1.05,
            away_multiplier: 1.0,
            pitch: None,
            style_boost: 1.2,
        }
    }
}

impl ScoringWeights {
    pub fn keeper_weight(&self) -> f64 {
        self.keeper.unwrap_or(self.batting)
    }

    pub fn allrounder_weight(&self) -> f64 {
        self.allrounder
            .unwrap_or_else(|| ((self.batting + self.bowling) / 2.0).max(1.0))
    }
}

// ---------------------------------------------------------------------------
// Captaincy and strategies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptaincyConfig {
    pub captain_multiplier: f64,
    pub vice_captain_multiplier: f64,
    /// Players batting at or above this 1-based position are preferred for
    /// captaincy. `None` ignores lineup order.
    pub max_lineup_order: Option<u32>,
}

impl Default for CaptaincyConfig {
    fn default() -> Self {
        CaptaincyConfig {
            captain_multiplier: 2.0,
            vice_captain_multiplier: 1.5,
            max_lineup_order: Some(5),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExactConfig {
    /// Model captain and vice-captain as solver variables instead of
    /// assigning them after selection.
    pub model_captaincy: bool,
}

/// Rule for picking one side from the Pareto front.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FrontPick {
    /// Highest captain/vice-captain-weighted sum of computed scores.
    #[default]
    AdjustedScore,
    /// Highest sum of objectives, each divided by a rough expected maximum
    /// (batting, bowling, fielding).
    Normalized { scales: [f64; 3] },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub generations: usize,
    pub crossover_probability: f64,
    /// Per-gene bit-flip probability.
    pub mutation_probability: f64,
    pub seed: u64,
    /// Extend the genome with captain and vice-captain bits.
    pub model_captaincy: bool,
    /// Evaluate the population on the rayon thread pool.
    pub parallel: bool,
    pub pick: FrontPick,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        EvolutionConfig {
            population_size: 100,
            generations: 200,
            crossover_probability: 0.9,
            mutation_probability: 0.01,
            seed: 1,
            model_captaincy: true,
            parallel: true,
            pick: FrontPick::AdjustedScore,
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub squad_size: usize,
    pub budget: f64,
    pub roles: RoleBounds,
    pub per_team: Bounds,
    pub min_bowling_options: usize,
    /// Minimum selected bowlers whose style matches `scoring.pitch`.
    /// Ignored when no pitch style is set; 0 disables.
    pub min_style_bowlers: usize,
    pub scoring: ScoringWeights,
    pub captaincy: CaptaincyConfig,
    pub exact: ExactConfig,
    pub evolution: EvolutionConfig,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        SelectionConfig {
            squad_size: 11,
            budget: 100.0,
            roles: RoleBounds::default(),
            per_team: Bounds::new(5, 6),
            min_bowling_options: 5,
            min_style_bowlers: 0,
            scoring: ScoringWeights::default(),
            captaincy: CaptaincyConfig::default(),
            exact: ExactConfig::default(),
            evolution: EvolutionConfig::default(),
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> SelectionError {
    SelectionError::InvalidConfig {
        field: field.to_string(),
        message: message.into(),
    }
}

fn positive(field: &str, value: f64) -> Result<(), SelectionError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("must be a finite value > 0, got {value}"),
        ))
    }
}

fn probability(field: &str, value: f64) -> Result<(), SelectionError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("must be between 0.0 and 1.0 inclusive, got {value}"),
        ))
    }
}

impl SelectionConfig {
    /// Reject records whose bounds cannot describe any legal side, or whose
    /// numeric parameters are out of range.
    pub fn validate(&self) -> Result<(), SelectionError> {
        if self.squad_size == 0 {
            return Err(invalid("squad_size", "must be greater than 0"));
        }
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(invalid(
                "budget",
                format!("must be a finite value >= 0, got {}", self.budget),
            ));
        }

        let mut min_sum = 0;
        let mut max_sum = 0;
        for role in Role::ALL {
            let b = self.roles.get(role);
            if b.min > b.max {
                return Err(invalid(
                    &format!("roles.{}", role_key(role)),
                    format!("min {} exceeds max {}", b.min, b.max),
                ));
            }
            min_sum += b.min;
            max_sum += b.max;
        }
        if min_sum > self.squad_size || max_sum < self.squad_size {
            return Err(invalid(
                "roles",
                format!(
                    "role bounds allow {min_sum}..={max_sum} players, squad size is {}",
                    self.squad_size
                ),
            ));
        }

        let team = self.per_team;
        if team.min > team.max {
            return Err(invalid(
                "per_team",
                format!("min {} exceeds max {}", team.min, team.max),
            ));
        }
        if 2 * team.min > self.squad_size || 2 * team.max < self.squad_size {
            return Err(invalid(
                "per_team",
                format!(
                    "two teams within {team} cannot make a squad of {}",
                    self.squad_size
                ),
            ));
        }

        let bowling_max = self.roles.bowler.max + self.roles.allrounder.max;
        if self.min_bowling_options > self.squad_size.min(bowling_max) {
            return Err(invalid(
                "min_bowling_options",
                format!(
                    "{} bowling options cannot fit the squad and role bounds",
                    self.min_bowling_options
                ),
            ));
        }
        if self.min_style_bowlers > self.roles.bowler.max {
            return Err(invalid(
                "min_style_bowlers",
                format!(
                    "{} exceeds the bowler maximum {}",
                    self.min_style_bowlers, self.roles.bowler.max
                ),
            ));
        }

        let s = &self.scoring;
        positive("scoring.batting", s.batting)?;
        positive("scoring.bowling", s.bowling)?;
        if let Some(k) = s.keeper {
            positive("scoring.keeper", k)?;
        }
        if let Some(a) = s.allrounder {
            positive("scoring.allrounder", a)?;
        }
        positive("scoring.home_multiplier", s.home_multiplier)?;
        positive("scoring.away_multiplier", s.away_multiplier)?;
        positive("scoring.style_boost", s.style_boost)?;
        if let AllrounderBlend::Weighted { batting_share } = s.allrounder_blend {
            probability("scoring.allrounder_blend.batting_share", batting_share)?;
        }
        let blend = s.blend;
        for (field, value) in [
            ("scoring.blend.batting", blend.batting),
            ("scoring.blend.bowling", blend.bowling),
            ("scoring.blend.fielding", blend.fielding),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(
                    field,
                    format!("must be a finite value >= 0, got {value}"),
                ));
            }
        }
        if s.model == ScoreModel::MetricBlend {
            let total = blend.batting + blend.bowling + blend.fielding;
            positive("scoring.blend", total)?;
        }

        let c = &self.captaincy;
        if !c.vice_captain_multiplier.is_finite() || c.vice_captain_multiplier < 1.0 {
            return Err(invalid(
                "captaincy.vice_captain_multiplier",
                format!("must be >= 1.0, got {}", c.vice_captain_multiplier),
            ));
        }
        if !c.captain_multiplier.is_finite() || c.captain_multiplier < c.vice_captain_multiplier {
            return Err(invalid(
                "captaincy.captain_multiplier",
                format!(
                    "must be >= the vice-captain multiplier {}, got {}",
                    c.vice_captain_multiplier, c.captain_multiplier
                ),
            ));
        }

        let e = &self.evolution;
        if e.population_size < 4 {
            return Err(invalid(
                "evolution.population_size",
                format!("must be at least 4, got {}", e.population_size),
            ));
        }
        if e.generations == 0 {
            return Err(invalid("evolution.generations", "must be greater than 0"));
        }
        probability("evolution.crossover_probability", e.crossover_probability)?;
        probability("evolution.mutation_probability", e.mutation_probability)?;
        if let FrontPick::Normalized { scales } = e.pick {
            for scale in scales {
                positive("evolution.pick.scales", scale)?;
            }
        }

        Ok(())
    }
}

fn role_key(role: Role) -> &'static str {
    match role {
        Role::Wicketkeeper => "wicketkeeper",
        Role::Batter => "batter",
        Role::Bowler => "bowler",
        Role::Allrounder => "allrounder",
    }
}
