// Scoring function: role + metrics + venue weights -> scalar desirability.
//
// Role dispatch is a match over `Role`, so there is no "unknown role" path;
// unrecognised role labels never make it past `PlayerPool` construction.

use crate::config::{AllrounderBlend, ScoreModel, ScoringWeights};
use crate::player::{Player, PlayerPool, Role};

/// Number of separate objective totals carried for multi-objective search.
pub const OBJECTIVE_COUNT: usize = 3;

/// A pool player's computed score plus the raw per-objective contributions
/// (batting, bowling, fielding).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPlayer {
    /// Index into `PlayerPool::players()`.
    pub index: usize,
    pub score: f64,
    pub objectives: [f64; OBJECTIVE_COUNT],
}

/// Score from role and metrics alone, before the home/away multiplier.
pub fn role_score(player: &Player, weights: &ScoringWeights) -> f64 {
    let m = &player.metrics;
    match weights.model {
        ScoreModel::MetricBlend => {
            let b = &weights.blend;
            b.batting * m.batting + b.bowling * m.bowling + b.fielding * m.fielding
        }
        ScoreModel::RoleWeighted => match player.role {
            Role::Batter => weights.batting * m.batting,
            Role::Wicketkeeper => weights.keeper_weight() * m.batting,
            Role::Bowler => {
                let boost = match (weights.pitch, player.bowling_style) {
                    (Some(pitch), Some(style)) if pitch == style => weights.style_boost,
                    _ => 1.0,
                };
                weights.bowling * m.bowling * boost
            }
            Role::Allrounder => {
                let combined = match weights.allrounder_blend {
                    AllrounderBlend::Max => m.batting.max(m.bowling),
                    AllrounderBlend::Mean => (m.batting + m.bowling) / 2.0,
                    AllrounderBlend::Weighted { batting_share } => {
                        batting_share * m.batting + (1.0 - batting_share) * m.bowling
                    }
                };
                weights.allrounder_weight() * combined
            }
        },
    }
}

/// Home/away multiplier. Without a named home team every player gets the
/// away multiplier, so the prior is applied uniformly either way.
pub fn venue_multiplier(player: &Player, home_team: Option<&str>, weights: &ScoringWeights) -> f64 {
    match home_team {
        Some(home) if player.team == home => weights.home_multiplier,
        _ => weights.away_multiplier,
    }
}

/// Score every player in the pool, in pool order.
pub fn score_pool(pool: &PlayerPool, weights: &ScoringWeights) -> Vec<ScoredPlayer> {
    pool.players()
        .iter()
        .enumerate()
        .map(|(index, player)| {
            let score =
                role_score(player, weights) * venue_multiplier(player, pool.home_team(), weights);
            ScoredPlayer {
                index,
                score,
                objectives: [
                    player.metrics.batting,
                    player.metrics.bowling,
                    player.metrics.fielding,
                ],
            }
        })
        .collect()
}
