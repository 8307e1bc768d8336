// Player, role, and pool types plus pool schema validation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::PoolIssue;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// A player's functional category. Mutually exclusive for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Wicketkeeper,
    Batter,
    Bowler,
    Allrounder,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Wicketkeeper,
        Role::Batter,
        Role::Bowler,
        Role::Allrounder,
    ];

    /// Parse a role label as it appears in squad sheets.
    ///
    /// Accepts the short codes (`WK`, `BAT`, `BOWL`, `ALL`) and the long
    /// spellings used by older squad exports, case-insensitively.
    pub fn from_str_role(s: &str) -> Option<Role> {
        match s.trim().to_uppercase().as_str() {
            "WK" | "WICKETKEEPER" | "WICKET KEEPER" | "WICKET-KEEPER" | "KEEPER" => {
                Some(Role::Wicketkeeper)
            }
            "BAT" | "BATTER" | "BATSMAN" | "BATSMEN" => Some(Role::Batter),
            "BOWL" | "BOWLER" => Some(Role::Bowler),
            "ALL" | "AR" | "ALLROUNDER" | "ALL ROUNDER" | "ALL-ROUNDER" => Some(Role::Allrounder),
            _ => None,
        }
    }

    /// Short code used in output tables.
    pub fn code(self) -> &'static str {
        match self {
            Role::Wicketkeeper => "WK",
            Role::Batter => "BAT",
            Role::Bowler => "BOWL",
            Role::Allrounder => "ALL",
        }
    }

    /// Plural label used in diagnostics.
    pub fn plural(self) -> &'static str {
        match self {
            Role::Wicketkeeper => "wicketkeepers",
            Role::Batter => "batters",
            Role::Bowler => "bowlers",
            Role::Allrounder => "all-rounders",
        }
    }

    /// Bowlers and all-rounders both count as bowling options.
    pub fn is_bowling_option(self) -> bool {
        matches!(self, Role::Bowler | Role::Allrounder)
    }

    /// Dense index for per-role count arrays.
    pub fn index(self) -> usize {
        match self {
            Role::Wicketkeeper => 0,
            Role::Batter => 1,
            Role::Bowler => 2,
            Role::Allrounder => 3,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Bowling style, used for pitch-aware scoring and the optional style quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BowlingStyle {
    Pace,
    Spin,
}

/// A bowling style label that names neither pace nor spin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown bowling style `{0}`")]
pub struct UnknownStyle(pub String);

impl BowlingStyle {
    /// Parse a bowling style label. Blank and `-` mean "no style recorded".
    pub fn parse(s: &str) -> Result<Option<BowlingStyle>, UnknownStyle> {
        match s.trim().to_uppercase().as_str() {
            "" | "-" => Ok(None),
            "PACE" | "FAST" | "SEAM" | "MEDIUM" => Ok(Some(BowlingStyle::Pace)),
            "SPIN" | "SPINNER" => Ok(Some(BowlingStyle::Spin)),
            _ => Err(UnknownStyle(s.trim().to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Expected per-match contribution. All values are non-negative; a missing
/// value is recorded as 0 ("no evidence of contribution").
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub batting: f64,
    pub bowling: f64,
    pub fielding: f64,
}

/// One validated candidate for selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub team: String,
    pub role: Role,
    pub credit_cost: f64,
    pub metrics: PerformanceMetrics,
    /// 1-based batting position, when a confirmed lineup is known.
    #[serde(default)]
    pub lineup_order: Option<u32>,
    #[serde(default)]
    pub bowling_style: Option<BowlingStyle>,
}

/// Untyped input row from the pool builder. Roles and styles are still
/// strings here; `PlayerPool::from_records` is where they get checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub team: String,
    pub role: String,
    pub credits: f64,
    #[serde(default)]
    pub batting: Option<f64>,
    #[serde(default)]
    pub bowling: Option<f64>,
    #[serde(default)]
    pub fielding: Option<f64>,
    #[serde(default)]
    pub lineup_order: Option<u32>,
    #[serde(default)]
    pub bowling_style: Option<String>,
}

impl PlayerRecord {
    fn into_player(self, row: usize) -> Result<Player, PoolIssue> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(PoolIssue::EmptyName { row });
        }
        let role = Role::from_str_role(&self.role).ok_or_else(|| PoolIssue::UnknownRole {
            player: name.clone(),
            role: self.role.clone(),
        })?;
        let bowling_style = match self.bowling_style.as_deref() {
            Some(raw) => {
                BowlingStyle::parse(raw).map_err(|UnknownStyle(style)| {
                    PoolIssue::UnknownBowlingStyle {
                        player: name.clone(),
                        style,
                    }
                })?
            }
            None => None,
        };

        let checked = |field: &'static str, value: f64| -> Result<f64, PoolIssue> {
            if value.is_finite() && value >= 0.0 {
                Ok(value)
            } else {
                Err(PoolIssue::InvalidNumber {
                    player: name.clone(),
                    field,
                    value,
                })
            }
        };

        let credit_cost = checked("credits", self.credits)?;
        let metrics = PerformanceMetrics {
            batting: checked("batting", self.batting.unwrap_or(0.0))?,
            bowling: checked("bowling", self.bowling.unwrap_or(0.0))?,
            fielding: checked("fielding", self.fielding.unwrap_or(0.0))?,
        };

        Ok(Player {
            team: self.team.trim().to_string(),
            name,
            role,
            credit_cost,
            metrics,
            lineup_order: self.lineup_order,
            bowling_style,
        })
    }
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// The read-only candidate set for one match.
///
/// Invariants enforced at construction: unique non-empty names, exactly two
/// teams, finite non-negative credits and metrics. Role minimums are not
/// checked here; that is the constraint model's feasibility pre-check.
#[derive(Debug, Clone)]
pub struct PlayerPool {
    players: Vec<Player>,
    teams: [String; 2],
    home_team: Option<String>,
}

impl PlayerPool {
    /// Build a pool from raw records, rejecting any schema violation.
    pub fn from_records(
        records: Vec<PlayerRecord>,
        home_team: Option<&str>,
    ) -> Result<Self, PoolIssue> {
        let players = records
            .into_iter()
            .enumerate()
            .map(|(row, rec)| rec.into_player(row + 1))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(players, home_team)
    }

    /// Build a pool from already-typed players.
    pub fn new(players: Vec<Player>, home_team: Option<&str>) -> Result<Self, PoolIssue> {
        let mut seen = HashSet::new();
        let mut teams: Vec<String> = Vec::new();
        for player in &players {
            if player.name.trim().is_empty() {
                return Err(PoolIssue::EmptyName { row: seen.len() + 1 });
            }
            if !seen.insert(player.name.as_str()) {
                return Err(PoolIssue::DuplicatePlayer(player.name.clone()));
            }
            for (field, value) in [
                ("credits", player.credit_cost),
                ("batting", player.metrics.batting),
                ("bowling", player.metrics.bowling),
                ("fielding", player.metrics.fielding),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(PoolIssue::InvalidNumber {
                        player: player.name.clone(),
                        field,
                        value,
                    });
                }
            }
            if !teams.contains(&player.team) {
                teams.push(player.team.clone());
            }
        }

        if teams.len() != 2 {
            return Err(PoolIssue::TeamCount { teams });
        }
        let teams = [teams[0].clone(), teams[1].clone()];

        let home_team = match home_team.map(str::trim) {
            Some(home) if teams.iter().any(|t| t == home) => Some(home.to_string()),
            Some(home) => return Err(PoolIssue::UnknownHomeTeam(home.to_string())),
            None => None,
        };

        Ok(PlayerPool {
            players,
            teams,
            home_team,
        })
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// The two teams, in order of first appearance.
    pub fn teams(&self) -> &[String; 2] {
        &self.teams
    }

    pub fn home_team(&self) -> Option<&str> {
        self.home_team.as_deref()
    }

    /// 0 or 1: which of `teams()` the player at `index` belongs to.
    pub fn team_index(&self, index: usize) -> usize {
        if self.players[index].team == self.teams[0] {
            0
        } else {
            1
        }
    }

    /// Number of pool players per role, indexed by `Role::index`.
    pub fn role_counts(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for p in &self.players {
            counts[p.role.index()] += 1;
        }
        counts
    }
}
