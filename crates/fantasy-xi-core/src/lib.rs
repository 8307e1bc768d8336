// Fantasy XI selection core: player pool validation, scoring, the constraint
// model, the exact and evolutionary optimizers, and captaincy assignment.
//
// The crate never reads files or environment variables. Callers build a
// `PlayerPool` and a `SelectionConfig` and hand both to `select_team`.

pub mod captaincy;
pub mod config;
pub mod constraints;
pub mod error;
pub mod optimizer;
pub mod player;
pub mod roster;
pub mod scoring;

pub use config::SelectionConfig;
pub use error::SelectionError;
pub use optimizer::{select_team, select_team_with, Strategy};
pub use player::{BowlingStyle, Player, PlayerPool, PlayerRecord, Role};
pub use roster::{TeamRole, TeamSheet};
