// The final team sheet: selected players, their scores, and captaincy.

use serde::Serialize;

use crate::captaincy::{captaincy_bonus, rank_by_score, Captaincy};
use crate::config::CaptaincyConfig;
use crate::optimizer::{ParetoPoint, SelectionOrigin};
use crate::player::{PlayerPool, Role};
use crate::scoring::ScoredPlayer;

/// A selected player's designation within the side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum TeamRole {
    Captain,
    ViceCaptain,
    Player,
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamRole::Captain => write!(f, "Captain"),
            TeamRole::ViceCaptain => write!(f, "Vice-Captain"),
            TeamRole::Player => write!(f, "Player"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub name: String,
    pub team: String,
    pub role: Role,
    pub credit_cost: f64,
    pub score: f64,
    pub team_role: TeamRole,
}

/// The selected XI with captaincy, ordered captain, vice-captain, then by
/// score descending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSheet {
    pub entries: Vec<RosterEntry>,
    /// Plain sum of the selected players' scores.
    pub total_score: f64,
    /// `total_score` plus the captain and vice-captain bonuses.
    pub projected_points: f64,
    pub total_credits: f64,
    pub origin: SelectionOrigin,
    /// Non-dominated sides found by the evolutionary search. Empty for the
    /// exact solver.
    pub front: Vec<ParetoPoint>,
}

impl TeamSheet {
    pub fn build(
        pool: &PlayerPool,
        scored: &[ScoredPlayer],
        selected: &[usize],
        captaincy: Captaincy,
        config: &CaptaincyConfig,
        origin: SelectionOrigin,
        front: Vec<ParetoPoint>,
    ) -> Self {
        let mut entries: Vec<RosterEntry> = rank_by_score(pool, scored, selected)
            .into_iter()
            .map(|i| {
                let player = &pool.players()[i];
                let team_role = if captaincy.captain == Some(i) {
                    TeamRole::Captain
                } else if captaincy.vice_captain == Some(i) {
                    TeamRole::ViceCaptain
                } else {
                    TeamRole::Player
                };
                RosterEntry {
                    name: player.name.clone(),
                    team: player.team.clone(),
                    role: player.role,
                    credit_cost: player.credit_cost,
                    score: scored[i].score,
                    team_role,
                }
            })
            .collect();
        // Stable sort keeps the score order within each designation.
        entries.sort_by_key(|e| e.team_role);

        let total_score: f64 = selected.iter().map(|&i| scored[i].score).sum();
        let total_credits = selected.iter().map(|&i| pool.players()[i].credit_cost).sum();

        TeamSheet {
            entries,
            total_score,
            projected_points: total_score + captaincy_bonus(scored, &captaincy, config),
            total_credits,
            origin,
            front,
        }
    }

    pub fn captain(&self) -> Option<&RosterEntry> {
        self.entries
            .iter()
            .find(|e| e.team_role == TeamRole::Captain)
    }

    pub fn vice_captain(&self) -> Option<&RosterEntry> {
        self.entries
            .iter()
            .find(|e| e.team_role == TeamRole::ViceCaptain)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.entries.iter().filter(|e| e.role == role).count()
    }

    pub fn count_team(&self, team: &str) -> usize {
        self.entries.iter().filter(|e| e.team == team).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PerformanceMetrics, Player};

    fn pool() -> PlayerPool {
        let players = [
            ("a", "MI", Role::Batter, 7.5),
            ("b", "KKR", Role::Bowler, 9.0),
            ("c", "MI", Role::Wicketkeeper, 8.0),
            ("d", "KKR", Role::Allrounder, 9.5),
        ]
        .into_iter()
        .map(|(name, team, role, credits)| Player {
            name: name.into(),
            team: team.into(),
            role,
            credit_cost: credits,
            metrics: PerformanceMetrics::default(),
            lineup_order: None,
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
    fn orders_captain_vice_then_score() {
        let pool = pool();
        let s = scored(&[30.0, 10.0, 20.0, 40.0]);
        let captaincy = Captaincy {
            captain: Some(2),
            vice_captain: Some(1),
        };
        let sheet = TeamSheet::build(
            &pool,
            &s,
            &[0, 1, 2, 3],
            captaincy,
            &CaptaincyConfig::default(),
            SelectionOrigin::Exact,
            Vec::new(),
        );
        let names: Vec<&str> = sheet.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["c", "b", "d", "a"]);
        assert_eq!(sheet.captain().map(|e| e.name.as_str()), Some("c"));
        assert_eq!(sheet.vice_captain().map(|e| e.name.as_str()), Some("b"));
    }

    #[test]
    fn totals_and_counts() {
        let pool = pool();
        let s = scored(&[30.0, 10.0, 20.0, 40.0]);
        let captaincy = Captaincy {
            captain: Some(3),
            vice_captain: Some(0),
        };
        let sheet = TeamSheet::build(
            &pool,
            &s,
            &[0, 1, 2, 3],
            captaincy,
            &CaptaincyConfig::default(),
            SelectionOrigin::Exact,
            Vec::new(),
        );
        assert!((sheet.total_score - 100.0).abs() < 1e-9);
        let expected = 100.0 + 40.0 + 15.0;
        assert!((sheet.projected_points - expected).abs() < 1e-9);
        assert!((sheet.total_credits - 34.0).abs() < 1e-9);
        assert_eq!(sheet.count_team("MI"), 2);
        assert_eq!(sheet.count_role(Role::Allrounder), 1);
        assert_eq!(sheet.len(), 4);
    }

    #[test]
    fn team_role_labels() {
        assert_eq!(TeamRole::Captain.to_string(), "Captain");
        assert_eq!(TeamRole::ViceCaptain.to_string(), "Vice-Captain");
        assert_eq!(TeamRole::Player.to_string(), "Player");
    }
}
