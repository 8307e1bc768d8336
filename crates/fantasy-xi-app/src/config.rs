// Configuration loading (match.toml, selection.toml) and first-run defaults.

use std::path::{Path, PathBuf};

use fantasy_xi_core::{SelectionConfig, SelectionError, Strategy};
use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Assembled config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding `config/`; relative paths resolve against it.
    pub base_dir: PathBuf,
    pub fixture: FixtureConfig,
    pub output: OutputPaths,
    pub selection: SelectionConfig,
}

impl AppConfig {
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    pub fn pool_path(&self) -> PathBuf {
        self.resolve(&self.fixture.pool_csv)
    }
}

// ---------------------------------------------------------------------------
// match.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct MatchFile {
    #[serde(rename = "match")]
    fixture: FixtureConfig,
    output: OutputPaths,
}

/// The `[match]` table: which pool to read and how to pick from it.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureConfig {
    pub pool_csv: String,
    /// Team playing at home; gets the home multiplier. Must be one of the
    /// pool's two teams when set.
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputPaths {
    pub team_csv: String,
    pub summary_json: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/match.toml` and `config/selection.toml` under
/// `base_dir`. Does not copy defaults; see `load_config`.
pub fn load_config_from(base_dir: &Path) -> Result<AppConfig, ConfigError> {
    let config_dir = base_dir.join("config");

    let match_path = config_dir.join("match.toml");
    let match_file: MatchFile = parse_file(&match_path)?;

    // Every selection section has defaults, so an empty file is valid.
    let selection_path = config_dir.join("selection.toml");
    let selection: SelectionConfig = parse_file(&selection_path)?;

    let config = AppConfig {
        base_dir: base_dir.to_path_buf(),
        fixture: match_file.fixture,
        output: match_file.output,
        selection,
    };
    validate(&config)?;
    Ok(config)
}

/// Copy any `.toml` file in `defaults/` that is missing from `config/`.
/// Existing files are never overwritten. Returns the paths written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no defaults/ or config/ directory in {}; run from the app directory",
                base_dir.display()
            ),
        });
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create {}: {e}", config_dir.display()),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read {}: {e}", defaults_dir.display()),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let source = entry
            .map_err(|e| ConfigError::DefaultsCopyError {
                message: format!("failed to read defaults entry: {e}"),
            })?
            .path();
        let is_toml = source.extension().is_some_and(|ext| ext == "toml");
        let Some(file_name) = source.file_name() else {
            continue;
        };
        if !source.is_file() || !is_toml {
            continue;
        }
        let target = config_dir.join(file_name);
        if copy_if_missing(&source, &target)? {
            copied.push(target);
        }
    }
    copied.sort();
    Ok(copied)
}

/// Load config relative to the current working directory.
///
/// Before loading, any missing `config/match.toml` or `config/selection.toml`
/// is seeded from its copy under `defaults/`. Files already in `config/` are
/// never overwritten, so local edits survive later runs.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Create `target` with the contents of `source` unless it already exists.
fn copy_if_missing(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    let copy_error = |what: &str, path: &Path, e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to {what} {}: {e}", path.display()),
    };
    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(copy_error("create", target, e)),
    };
    let content = std::fs::read(source).map_err(|e| copy_error("read", source, e))?;
    std::io::Write::write_all(&mut dest, &content).map_err(|e| copy_error("write", target, e))?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let required = [
        ("match.pool_csv", &config.fixture.pool_csv),
        ("output.team_csv", &config.output.team_csv),
        ("output.summary_json", &config.output.summary_json),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: field.into(),
                message: "must not be empty".into(),
            });
        }
    }

    if let Some(home) = &config.fixture.home_team {
        if home.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "match.home_team".into(),
                message: "must be a team name or omitted".into(),
            });
        }
    }

    config.selection.validate().map_err(|e| match e {
        SelectionError::InvalidConfig { field, message } => ConfigError::ValidationError {
            field: format!("selection.{field}"),
            message,
        },
        other => ConfigError::ValidationError {
            field: "selection".into(),
            message: other.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Helper: the fantasy-xi-app crate directory (works whether `cargo test`
    /// runs from the crate or the workspace root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("crates/fantasy-xi-app/defaults").exists() {
            cwd.join("crates/fantasy-xi-app")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    /// Fresh temp dir with `config/` holding the given match.toml and
    /// selection.toml contents.
    fn temp_config(name: &str, match_toml: &str, selection_toml: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config/match.toml"), match_toml).unwrap();
        fs::write(tmp.join("config/selection.toml"), selection_toml).unwrap();
        tmp
    }

    const MATCH_TOML: &str = r#"
[match]
pool_csv = "data/pool.csv"
home_team = "MI"
strategy = "evolutionary"

[output]
team_csv = "output/team.csv"
summary_json = "output/summary.json"
"#;

    #[test]
    fn load_default_files() {
        let tmp = std::env::temp_dir().join("fxi_config_defaults");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        let root = project_root();
        for file in ["match.toml", "selection.toml"] {
            fs::copy(root.join("defaults").join(file), tmp.join("defaults").join(file)).unwrap();
        }

        ensure_config_files(&tmp).unwrap();
        let config = load_config_from(&tmp).expect("defaults should load");
        assert_eq!(config.fixture.pool_csv, "data/pool.csv");
        assert_eq!(config.fixture.strategy, Strategy::Exact);
        assert_eq!(config.selection.squad_size, 11);
        assert!((config.selection.budget - 100.0).abs() < f64::EPSILON);
        assert_eq!(config.selection.per_team.min, 5);
        assert_eq!(config.selection.per_team.max, 6);
        assert_eq!(config.pool_path(), tmp.join("data/pool.csv"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn empty_selection_file_uses_defaults() {
        let tmp = temp_config("fxi_config_empty_selection", MATCH_TOML, "");
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.selection, SelectionConfig::default());
        assert_eq!(config.fixture.home_team.as_deref(), Some("MI"));
        assert_eq!(config.fixture.strategy, Strategy::Evolutionary);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_match_file_is_reported() {
        let tmp = std::env::temp_dir().join("fxi_config_missing_match");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        match load_config_from(&tmp) {
            Err(ConfigError::FileNotFound { path }) => assert!(path.ends_with("match.toml")),
            other => panic!("expected FileNotFound, got: {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let tmp = temp_config("fxi_config_bad_toml", MATCH_TOML, "budget = [");
        match load_config_from(&tmp) {
            Err(ConfigError::ParseError { path, .. }) => assert!(path.ends_with("selection.toml")),
            other => panic!("expected ParseError, got: {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn unknown_strategy_is_a_parse_error() {
        let text = MATCH_TOML.replace("evolutionary", "random");
        let tmp = temp_config("fxi_config_bad_strategy", &text, "");
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::ParseError { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn selection_errors_are_prefixed() {
        let selection = "[roles.batter]\nmin = 6\nmax = 5\n";
        let tmp = temp_config("fxi_config_bad_roles", MATCH_TOML, selection);
        match load_config_from(&tmp) {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "selection.roles.batter");
            }
            other => panic!("expected ValidationError, got: {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn empty_pool_path_is_rejected() {
        let text = MATCH_TOML.replace("data/pool.csv", " ");
        let tmp = temp_config("fxi_config_empty_pool", &text, "");
        match load_config_from(&tmp) {
            Err(ConfigError::ValidationError { field, .. }) => assert_eq!(field, "match.pool_csv"),
            other => panic!("expected ValidationError, got: {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_only_missing_toml() {
        let tmp = std::env::temp_dir().join("fxi_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("defaults/match.toml"), MATCH_TOML).unwrap();
        fs::write(tmp.join("defaults/selection.toml"), "budget = 95.0\n").unwrap();
        fs::write(tmp.join("defaults/README.txt"), "not config").unwrap();
        fs::write(tmp.join("config/selection.toml"), "budget = 90.0\n").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config/match.toml")]);
        assert!(!tmp.join("config/README.txt").exists());
        let kept = fs::read_to_string(tmp.join("config/selection.toml")).unwrap();
        assert_eq!(kept, "budget = 90.0\n");

        // Second run copies nothing.
        assert!(ensure_config_files(&tmp).unwrap().is_empty());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_without_either_dir() {
        let tmp = std::env::temp_dir().join("fxi_config_no_dirs");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        assert!(matches!(
            ensure_config_files(&tmp),
            Err(ConfigError::DefaultsCopyError { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn relative_and_absolute_paths_resolve() {
        let tmp = temp_config("fxi_config_resolve", MATCH_TOML, "");
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.resolve("output/team.csv"), tmp.join("output/team.csv"));
        let abs = std::env::temp_dir().join("elsewhere.csv");
        assert_eq!(config.resolve(abs.to_str().unwrap()), abs);
        let _ = fs::remove_dir_all(&tmp);
    }
}
