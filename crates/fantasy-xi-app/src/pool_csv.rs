// Player pool CSV loading.
//
// Expected header:
//   name,team,role,credits,batting,bowling,fielding,lineup_order,bowling_style
//
// The last five columns may be blank or absent. Blank metrics count as 0,
// blank lineup order or style as unknown. Any row that does not parse fails
// the whole load; roles and styles are checked later by `PlayerPool`.

use std::io::Read;
use std::path::Path;

use fantasy_xi_core::PlayerRecord;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path} contains no players")]
    Empty { path: String },
}

// ---------------------------------------------------------------------------
// Reader-based loader (private)
// ---------------------------------------------------------------------------

fn load_records_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayerRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(rdr);
    reader.deserialize().collect()
}

// ---------------------------------------------------------------------------
// Public path-based loader
// ---------------------------------------------------------------------------

/// Read every row of a pool CSV. Fails on the first malformed row.
pub fn load_pool_records(path: &Path) -> Result<Vec<PlayerRecord>, LoadError> {
    let shown = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| LoadError::Io {
        path: shown.clone(),
        source: e,
    })?;
    let records = load_records_from_reader(file).map_err(|e| LoadError::Csv {
        path: shown.clone(),
        source: e,
    })?;
    if records.is_empty() {
        return Err(LoadError::Empty { path: shown });
    }
    info!("loaded {} players from {}", records.len(), shown);
    Ok(records)
}
