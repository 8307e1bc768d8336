// Team sheet output: CSV roster, JSON run summary, and the terminal table.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use fantasy_xi_core::optimizer::{ParetoPoint, SelectionOrigin};
use fantasy_xi_core::{Strategy, TeamRole, TeamSheet};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to write CSV {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("failed to serialize summary {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// CSV roster
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct RosterRow<'a> {
    name: &'a str,
    team: &'a str,
    role: &'a str,
    credits: f64,
    score: f64,
    role_in_team: String,
}

/// Write one row per selected player, captain first.
pub fn write_team_csv<W: Write>(sheet: &TeamSheet, out: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    for entry in &sheet.entries {
        writer.serialize(RosterRow {
            name: &entry.name,
            team: &entry.team,
            role: entry.role.code(),
            credits: entry.credit_cost,
            score: round2(entry.score),
            role_in_team: entry.team_role.to_string(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON summary
// ---------------------------------------------------------------------------

/// Machine-readable record of one run.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub generated_at: DateTime<Utc>,
    pub strategy: Strategy,
    pub origin: &'a SelectionOrigin,
    pub fallback: bool,
    pub total_score: f64,
    pub projected_points: f64,
    pub total_credits: f64,
    pub budget: f64,
    pub captain: Option<&'a str>,
    pub vice_captain: Option<&'a str>,
    pub players: Vec<&'a str>,
    pub front_size: usize,
    pub front: &'a [ParetoPoint],
}

impl<'a> RunSummary<'a> {
    pub fn new(
        sheet: &'a TeamSheet,
        strategy: Strategy,
        budget: f64,
        generated_at: DateTime<Utc>,
    ) -> Self {
        RunSummary {
            generated_at,
            strategy,
            origin: &sheet.origin,
            fallback: sheet.origin.is_fallback(),
            total_score: round2(sheet.total_score),
            projected_points: round2(sheet.projected_points),
            total_credits: sheet.total_credits,
            budget,
            captain: sheet.captain().map(|e| e.name.as_str()),
            vice_captain: sheet.vice_captain().map(|e| e.name.as_str()),
            players: sheet.entries.iter().map(|e| e.name.as_str()).collect(),
            front_size: sheet.front.len(),
            front: &sheet.front,
        }
    }
}

// ---------------------------------------------------------------------------
// File output
// ---------------------------------------------------------------------------

/// Write the roster CSV and the JSON summary, creating parent directories.
pub fn write_reports(
    sheet: &TeamSheet,
    summary: &RunSummary<'_>,
    team_csv: &Path,
    summary_json: &Path,
) -> Result<(), ReportError> {
    let team_file = create(team_csv)?;
    write_team_csv(sheet, team_file).map_err(|e| ReportError::Csv {
        path: team_csv.display().to_string(),
        source: e,
    })?;

    let summary_file = create(summary_json)?;
    serde_json::to_writer_pretty(summary_file, summary).map_err(|e| ReportError::Json {
        path: summary_json.display().to_string(),
        source: e,
    })?;

    info!(
        "wrote {} and {}",
        team_csv.display(),
        summary_json.display()
    );
    Ok(())
}

fn create(path: &Path) -> Result<std::fs::File, ReportError> {
    let io_error = |e| ReportError::Io {
        path: path.display().to_string(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::File::create(path).map_err(io_error)
}

// ---------------------------------------------------------------------------
// Terminal table
// ---------------------------------------------------------------------------

/// Fixed-width table of the side followed by the totals line.
pub fn render_table(sheet: &TeamSheet) -> String {
    let name_width = sheet
        .entries
        .iter()
        .map(|e| e.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut out = format!(
        "{:<name_width$}  {:<5} {:<4} {:>7} {:>8}  {}\n",
        "Name", "Team", "Role", "Credits", "Score", "Designation"
    );
    for e in &sheet.entries {
        let tag = match e.team_role {
            TeamRole::Player => String::new(),
            other => other.to_string(),
        };
        out.push_str(&format!(
            "{:<name_width$}  {:<5} {:<4} {:>7.1} {:>8.2}  {}\n",
            e.name,
            e.team,
            e.role.code(),
            e.credit_cost,
            e.score,
            tag
        ));
    }
    out.push_str(&format!(
        "\n{} players, {:.1} credits, score {:.2}, projected {:.2}",
        sheet.len(),
        sheet.total_credits,
        sheet.total_score,
        sheet.projected_points
    ));
    if let SelectionOrigin::Fallback { reason } = &sheet.origin {
        out.push_str(&format!("\nfallback side: {reason}"));
    }
    out
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
