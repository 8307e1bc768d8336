// Library root for the fantasy XI command-line app: config files, the pool
// CSV adapter, report writers, and the load-select-write pipeline.

pub mod config;
pub mod pool_csv;
pub mod report;

use anyhow::Context;
use chrono::Utc;
use fantasy_xi_core::{select_team, PlayerPool, TeamSheet};
use tracing::info;

use crate::config::AppConfig;

/// Load the configured pool, select a side, and write both reports.
pub fn run(config: &AppConfig) -> anyhow::Result<TeamSheet> {
    let pool_path = config.pool_path();
    let records = pool_csv::load_pool_records(&pool_path).context("failed to load player pool")?;

    let pool = PlayerPool::from_records(records, config.fixture.home_team.as_deref())
        .with_context(|| format!("invalid player pool in {}", pool_path.display()))?;
    info!(
        "pool: {} players, {} vs {}",
        pool.len(),
        pool.teams()[0],
        pool.teams()[1]
    );

    let strategy = config.fixture.strategy;
    let sheet = select_team(&pool, &config.selection, strategy)
        .with_context(|| format!("{strategy} selection failed"))?;

    let summary = report::RunSummary::new(&sheet, strategy, config.selection.budget, Utc::now());
    report::write_reports(
        &sheet,
        &summary,
        &config.resolve(&config.output.team_csv),
        &config.resolve(&config.output.summary_json),
    )
    .context("failed to write reports")?;

    Ok(sheet)
}
