// Post-hoc captain / vice-captain assignment from a selected side.

use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::config::CaptaincyConfig;
use crate::player::PlayerPool;
use crate::scoring::ScoredPlayer;

/// Captain and vice-captain as pool indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Captaincy {
    pub captain: Option<usize>,
    pub vice_captain: Option<usize>,
}

/// Order pool indices by score descending, then by name so equal scores
/// resolve the same way every run.
pub fn rank_by_score(pool: &PlayerPool, scored: &[ScoredPlayer], selected: &[usize]) -> Vec<usize> {
    let mut ranked = selected.to_vec();
    ranked.sort_by(|&a, &b| {
        scored[b]
            .score
            .partial_cmp(&scored[a].score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| pool.players()[a].name.cmp(&pool.players()[b].name))
    });
    ranked
}

/// Pick captain and vice-captain from `selected`.
///
/// When `max_lineup_order` is set and at least two selected players bat at
/// or above it, the two highest-scoring of those are chosen. Otherwise the
/// two highest-scoring players overall are chosen. A side with fewer than
/// two players gets a captain only (or nothing), with a warning.
pub fn assign_captaincy(
    pool: &PlayerPool,
    scored: &[ScoredPlayer],
    selected: &[usize],
    config: &CaptaincyConfig,
) -> Captaincy {
    let ranked = rank_by_score(pool, scored, selected);

    match ranked.len() {
        0 => {
            warn!("no players selected; captaincy left unassigned");
            return Captaincy::default();
        }
        1 => {
            warn!("only one player selected; no vice-captain assigned");
            return Captaincy {
                captain: Some(ranked[0]),
                vice_captain: None,
            };
        }
        _ => {}
    }

    if let Some(cutoff) = config.max_lineup_order {
        let eligible: Vec<usize> = ranked
            .iter()
            .copied()
            .filter(|&i| {
                pool.players()[i]
                    .lineup_order
                    .is_some_and(|o| o <= cutoff)
            })
            .collect();
        if eligible.len() >= 2 {
            return Captaincy {
                captain: Some(eligible[0]),
                vice_captain: Some(eligible[1]),
            };
        }
        debug!(
            "{} selected players bat in the top {}; falling back to top scorers for captaincy",
            eligible.len(),
            cutoff
        );
    }

    Captaincy {
        captain: Some(ranked[0]),
        vice_captain: Some(ranked[1]),
    }
}

/// Extra points from the captaincy multipliers on top of the plain score sum.
pub fn captaincy_bonus(
    scored: &[ScoredPlayer],
    captaincy: &Captaincy,
    config: &CaptaincyConfig,
) -> f64 {
    let extra = |slot: Option<usize>, multiplier: f64| {
        slot.map_or(0.0, |i| (multiplier - 1.0) * scored[i].score)
    };
    extra(captaincy.captain, config.captain_multiplier)
        + extra(captaincy.vice_captain, config.vice_captain_multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PerformanceMetrics, Player, Role};

    fn pool_with(lineup: &[Option<u32>]) -> PlayerPool {
        let players = lineup
            .iter()
            .enumerate()
            .map(|(i, &order)| Player {
                name: format!("p{i:02}"),
                team: if i % 2 == 0 { "MI".into() } else { "KKR".into() },
                role: Role::Batter,
                credit_cost: 8.0,
                metrics: PerformanceMetrics::default(),
                lineup_order: order,
                bowling_style: None,
            })
            .collect();
        PlayerPool::new(players, None).unwrap()
    }

    fn scored(scores: &[f64]) -> Vec<ScoredPlayer> {
        scores
            .iter()
            .enumerate()
            .map(|(index, &score)| ScoredPlayer {
                index,
                score,
                objectives: [0.0; 3],
            })
            .collect()
    }

    #[test]
    fn top_two_scorers_without_lineup_data() {
        let pool = pool_with(&[None, None, None, None]);
        let s = scored(&[10.0, 40.0, 30.0, 20.0]);
        let c = assign_captaincy(&pool, &s, &[0, 1, 2, 3], &CaptaincyConfig::default());
        assert_eq!(c.captain, Some(1));
        assert_eq!(c.vice_captain, Some(2));
    }

    #[test]
    fn prefers_top_order_batters() {
        // p01 scores highest but bats at 8; p02 and p03 open.
        let pool = pool_with(&[Some(4), Some(8), Some(1), Some(2)]);
        let s = scored(&[10.0, 40.0, 30.0, 20.0]);
        let c = assign_captaincy(&pool, &s, &[0, 1, 2, 3], &CaptaincyConfig::default());
        assert_eq!(c.captain, Some(2));
        assert_eq!(c.vice_captain, Some(3));
    }

    #[test]
    fn single_eligible_falls_back_to_overall_top_two() {
        let pool = pool_with(&[Some(1), Some(9), Some(10), Some(11)]);
        let s = scored(&[10.0, 40.0, 30.0, 20.0]);
        let c = assign_captaincy(&pool, &s, &[0, 1, 2, 3], &CaptaincyConfig::default());
        assert_eq!(c.captain, Some(1));
        assert_eq!(c.vice_captain, Some(2));
    }

    #[test]
    fn lineup_preference_can_be_disabled() {
        let pool = pool_with(&[Some(4), Some(8), Some(1), Some(2)]);
        let s = scored(&[10.0, 40.0, 30.0, 20.0]);
        let config = CaptaincyConfig {
            max_lineup_order: None,
            ..CaptaincyConfig::default()
        };
        let c = assign_captaincy(&pool, &s, &[0, 1, 2, 3], &config);
        assert_eq!(c.captain, Some(1));
        assert_eq!(c.vice_captain, Some(2));
    }

    #[test]
    fn equal_scores_resolve_by_name() {
        let pool = pool_with(&[None, None, None]);
        let s = scored(&[5.0, 5.0, 5.0]);
        let c = assign_captaincy(&pool, &s, &[2, 1, 0], &CaptaincyConfig::default());
        assert_eq!(c.captain, Some(0));
        assert_eq!(c.vice_captain, Some(1));
    }

    #[test]
    fn degrades_with_fewer_than_two_players() {
        let pool = pool_with(&[None, None]);
        let s = scored(&[5.0, 6.0]);
        let one = assign_captaincy(&pool, &s, &[1], &CaptaincyConfig::default());
        assert_eq!(one.captain, Some(1));
        assert_eq!(one.vice_captain, None);

        let none = assign_captaincy(&pool, &s, &[], &CaptaincyConfig::default());
        assert_eq!(none, Captaincy::default());
    }

    #[test]
    fn bonus_uses_multipliers() {
        let s = scored(&[10.0, 20.0]);
        let c = Captaincy {
            captain: Some(1),
            vice_captain: Some(0),
        };
        let bonus = captaincy_bonus(&s, &c, &CaptaincyConfig::default());
        assert!((bonus - (20.0 + 5.0)).abs() < 1e-9);
    }
}
