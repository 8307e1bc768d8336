// Fantasy XI selector entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, so stdout carries only the team table)
// 2. Load config, seeding config/ from defaults/ on first run
// 3. Load the pool, select a side, write the reports
// 4. Print the side

use fantasy_xi_app::config;
use fantasy_xi_app::report;

use anyhow::Context;
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "config loaded: pool {}, strategy {}, budget {:.1}",
        config.fixture.pool_csv, config.fixture.strategy, config.selection.budget
    );

    let sheet = fantasy_xi_app::run(&config)?;
    println!("{}", report::render_table(&sheet));
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fantasy_xi=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
