// Configuration loading and parsing (league.toml, lineup.toml).

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::lineup::handedness::Handedness;

/// Allowed deviation of the batting-value weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

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
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub stats: StatsConfig,
    pub leaderboard: LeaderboardConfig,
    pub data_paths: DataPaths,
    pub lineup: LineupConfig,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire league.toml file.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
    #[serde(default)]
    stats: StatsConfig,
    #[serde(default)]
    leaderboard: LeaderboardConfig,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    /// Teams offered by the CLI. When empty, teams are taken from the dataset.
    #[serde(default)]
    pub teams: Vec<String>,
}

/// Inputs to the metrics engine and the qualification filter.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    pub min_pa: u32,
    pub woba_scale: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        StatsConfig {
            min_pa: 10,
            woba_scale: 1.15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardConfig {
    pub top_n: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        LeaderboardConfig { top_n: 10 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub stats: String,
}

// ---------------------------------------------------------------------------
// lineup.toml structs
// ---------------------------------------------------------------------------

/// Everything the lineup query needs besides the computed metrics.
#[derive(Debug, Clone, Deserialize)]
pub struct LineupConfig {
    pub team: String,
    /// Batting side by player name. Players not listed bat right-handed.
    #[serde(default)]
    pub handedness: HashMap<String, Handedness>,
    /// Requested 1-based batting slot by player name.
    #[serde(default)]
    pub overrides: BTreeMap<String, usize>,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub weights: BattingWeights,
}

impl LineupConfig {
    /// A config for `team` with no handedness data, no overrides, and
    /// default optimizer settings and weights.
    pub fn for_team(team: impl Into<String>) -> Self {
        LineupConfig {
            team: team.into(),
            handedness: HashMap::new(),
            overrides: BTreeMap::new(),
            optimizer: OptimizerConfig::default(),
            weights: BattingWeights::default(),
        }
    }

    /// The same settings aimed at `team`. Handedness and overrides are keyed
    /// by player names of the configured team, so a different team starts
    /// with both maps empty; optimizer settings and weights carry over.
    pub fn retarget(&self, team: &str) -> LineupConfig {
        if team == self.team {
            return self.clone();
        }
        LineupConfig {
            optimizer: self.optimizer,
            weights: self.weights,
            ..LineupConfig::for_team(team)
        }
    }

    pub fn handedness_of(&self, name: &str) -> Handedness {
        self.handedness.get(name).copied().unwrap_or_default()
    }
}

/// Bounds for the handedness hill-climb.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OptimizerConfig {
    /// Largest slot distance a single swap may cover.
    pub max_offset: usize,
    /// Largest batting-value degradation a single swap may cause.
    pub max_perf_drop: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            max_offset: 2,
            max_perf_drop: 0.05,
        }
    }
}

/// Weights of the composite batting-value score. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BattingWeights {
    pub obp: f64,
    pub slg: f64,
    pub ops: f64,
    pub wraa: f64,
    pub woba: f64,
    pub avg: f64,
    pub contact: f64,
}

impl BattingWeights {
    pub fn sum(&self) -> f64 {
        self.obp + self.slg + self.ops + self.wraa + self.woba + self.avg + self.contact
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
    }
}

impl Default for BattingWeights {
    fn default() -> Self {
        BattingWeights {
            obp: 0.22,
            slg: 0.18,
            ops: 0.15,
            wraa: 0.15,
            woba: 0.15,
            avg: 0.10,
            contact: 0.05,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/lineup.toml`, both relative to the given `base_dir`.
///
/// Does not copy defaults; call `ensure_config_files` first for that.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let league_path = config_dir.join("league.toml");
    let league_text = read_config_text(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    let lineup_path = config_dir.join("lineup.toml");
    let lineup_text = read_config_text(&lineup_path)?;
    let lineup: LineupConfig =
        toml::from_str(&lineup_text).map_err(|e| ConfigError::ParseError {
            path: lineup_path.clone(),
            source: e,
        })?;

    let config = Config {
        league: league_file.league,
        stats: league_file.stats,
        leaderboard: league_file.leaderboard,
        data_paths: league_file.data_paths,
        lineup,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/` from `defaults/`: every default file without a same-named
/// file in `config/` is copied over. `.example` templates stay behind and
/// existing files are never touched. Returns the copied paths, sorted.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(copy_error(format!(
            "neither defaults/ nor config/ found under {}",
            base_dir.display()
        )));
    }

    fs::create_dir_all(&config_dir)
        .map_err(|e| copy_error(format!("cannot create {}: {e}", config_dir.display())))?;

    let mut copied = Vec::new();
    for source in default_files(&defaults_dir)? {
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);
        if copy_if_missing(&source, &target)? {
            copied.push(target);
        }
    }
    Ok(copied)
}

fn copy_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// Regular files in `dir` minus `*.example`, in name order.
fn default_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let entries =
        fs::read_dir(dir).map_err(|e| copy_error(format!("cannot read {}: {e}", dir.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| copy_error(format!("cannot read {}: {e}", dir.display())))?
            .path();
        let is_template = path.extension().is_some_and(|ext| ext == "example");
        if path.is_file() && !is_template {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Returns `false` when `target` already exists. The existence check and
/// the create are one `create_new` open.
fn copy_if_missing(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    let mut dest = match fs::OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(copy_error(format!("cannot create {}: {e}", target.display()))),
    };
    let content =
        fs::read(source).map_err(|e| copy_error(format!("cannot read {}: {e}", source.display())))?;
    dest.write_all(&content)
        .map_err(|e| copy_error(format!("cannot write {}: {e}", target.display())))?;
    Ok(true)
}

fn read_config_text(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let scale = config.stats.woba_scale;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(invalid("stats.woba_scale", format!("must be > 0, got {scale}")));
    }

    if config.leaderboard.top_n == 0 {
        return Err(invalid("leaderboard.top_n", "must be > 0"));
    }

    let lineup = &config.lineup;
    if lineup.team.trim().is_empty() {
        return Err(invalid("lineup.team", "must not be empty"));
    }
    if !config.league.teams.is_empty() && !config.league.teams.contains(&lineup.team) {
        return Err(invalid(
            "lineup.team",
            format!("`{}` is not listed in league.teams", lineup.team),
        ));
    }

    let drop = lineup.optimizer.max_perf_drop;
    if !drop.is_finite() || drop < 0.0 {
        return Err(invalid(
            "optimizer.max_perf_drop",
            format!("must be >= 0, got {drop}"),
        ));
    }

    let w = &lineup.weights;
    let weight_fields: &[(&str, f64)] = &[
        ("weights.obp", w.obp),
        ("weights.slg", w.slg),
        ("weights.ops", w.ops),
        ("weights.wraa", w.wraa),
        ("weights.woba", w.woba),
        ("weights.avg", w.avg),
        ("weights.contact", w.contact),
    ];
    for (name, val) in weight_fields {
        if !val.is_finite() || *val < 0.0 {
            return Err(invalid(name, format!("must be >= 0, got {val}")));
        }
    }
    if !w.is_normalized() {
        return Err(invalid(
            "weights",
            format!("must sum to 1.0, got {}", w.sum()),
        ));
    }

    let mut claimed: BTreeMap<usize, &str> = BTreeMap::new();
    for (name, &slot) in &lineup.overrides {
        if slot == 0 {
            return Err(invalid(
                "overrides",
                format!("slot for `{name}` must be 1-based, got 0"),
            ));
        }
        if let Some(other) = claimed.insert(slot, name.as_str()) {
            return Err(invalid(
                "overrides",
                format!("slot {slot} requested for both `{other}` and `{name}`"),
            ));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Workspace root holding `defaults/`.
    fn project_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
    }

    /// Fresh scratch directory with a `config/` subdirectory.
    fn scratch(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        tmp
    }

    fn copy_defaults(tmp: &Path) {
        let root = project_root();
        fs::copy(root.join("defaults/league.toml"), tmp.join("config/league.toml")).unwrap();
        fs::copy(root.join("defaults/lineup.toml"), tmp.join("config/lineup.toml")).unwrap();
    }

    /// Replace `from` with `to` in the given config file.
    fn patch(tmp: &Path, file: &str, from: &str, to: &str) {
        let path = tmp.join("config").join(file);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains(from), "{file} does not contain {from:?}");
        fs::write(&path, text.replace(from, to)).unwrap();
    }

    fn expect_validation_field(tmp: &Path, expected: &str) {
        match load_config_from(tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_valid_config_from_project_defaults() {
        let tmp = scratch("ctbl_config_defaults");
        copy_defaults(&tmp);
        let config = load_config_from(&tmp).expect("should load valid config");

        assert_eq!(config.league.name, "Capital of Texas Baseball League");
        assert_eq!(config.league.teams.len(), 11);
        assert_eq!(config.league.teams[0], "Austin Baseball Club");
        assert_eq!(config.stats.min_pa, 10);
        assert!((config.stats.woba_scale - 1.15).abs() < f64::EPSILON);
        assert_eq!(config.leaderboard.top_n, 10);
        assert_eq!(config.data_paths.stats, "data/ctbl_stats.csv");

        assert_eq!(config.lineup.team, "Austin Baseball Club");
        assert_eq!(config.lineup.handedness_of("King, Demarcus"), Handedness::Left);
        assert_eq!(config.lineup.handedness_of("Hedrick, Paul"), Handedness::Switch);
        assert_eq!(config.lineup.handedness_of("Somebody Else"), Handedness::Right);
        assert_eq!(config.lineup.overrides.get("King, Demarcus"), Some(&1));
        assert_eq!(config.lineup.overrides.get("Hedrick, Paul"), Some(&4));
        assert_eq!(config.lineup.overrides.get("Cho, Jason"), Some(&7));
        assert_eq!(config.lineup.optimizer.max_offset, 2);
        assert!((config.lineup.optimizer.max_perf_drop - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.lineup.weights, BattingWeights::default());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn retarget_drops_player_maps_for_another_team() {
        let tmp = scratch("ctbl_config_retarget");
        copy_defaults(&tmp);
        let config = load_config_from(&tmp).expect("should load valid config");
        let lineup = &config.lineup;
        assert!(!lineup.overrides.is_empty());
        assert!(!lineup.handedness.is_empty());

        let same = lineup.retarget(&lineup.team);
        assert_eq!(same.overrides, lineup.overrides);
        assert_eq!(same.handedness, lineup.handedness);

        let other = lineup.retarget("Pilots");
        assert_eq!(other.team, "Pilots");
        assert!(other.overrides.is_empty());
        assert!(other.handedness.is_empty());
        assert_eq!(other.weights, lineup.weights);
        assert_eq!(other.optimizer.max_offset, lineup.optimizer.max_offset);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn default_weights_sum_to_one() {
        let w = BattingWeights::default();
        assert!((w.sum() - 1.0).abs() <= 1e-9);
        assert!(w.is_normalized());
    }

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let tmp = scratch("ctbl_config_minimal");
        fs::write(
            tmp.join("config/league.toml"),
            "[league]\nname = \"Test\"\n\n[data_paths]\nstats = \"stats.csv\"\n",
        )
        .unwrap();
        fs::write(tmp.join("config/lineup.toml"), "team = \"Pilots\"\n").unwrap();

        let config = load_config_from(&tmp).expect("minimal config should load");
        assert!(config.league.teams.is_empty());
        assert_eq!(config.stats.min_pa, 10);
        assert_eq!(config.leaderboard.top_n, 10);
        assert!(config.lineup.handedness.is_empty());
        assert!(config.lineup.overrides.is_empty());
        assert_eq!(config.lineup.optimizer.max_offset, 2);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_non_positive_woba_scale() {
        let tmp = scratch("ctbl_config_woba_scale");
        copy_defaults(&tmp);
        patch(&tmp, "league.toml", "woba_scale = 1.15", "woba_scale = 0.0");
        expect_validation_field(&tmp, "stats.woba_scale");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_top_n() {
        let tmp = scratch("ctbl_config_top_n");
        copy_defaults(&tmp);
        patch(&tmp, "league.toml", "top_n = 10", "top_n = 0");
        expect_validation_field(&tmp, "leaderboard.top_n");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_team_outside_league() {
        let tmp = scratch("ctbl_config_unknown_team");
        copy_defaults(&tmp);
        patch(
            &tmp,
            "lineup.toml",
            "team = \"Austin Baseball Club\"",
            "team = \"Round Rock Express\"",
        );
        expect_validation_field(&tmp, "lineup.team");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let tmp = scratch("ctbl_config_weights");
        copy_defaults(&tmp);
        patch(&tmp, "lineup.toml", "contact = 0.05", "contact = 0.10");
        expect_validation_field(&tmp, "weights");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_negative_perf_drop() {
        let tmp = scratch("ctbl_config_perf_drop");
        copy_defaults(&tmp);
        patch(&tmp, "lineup.toml", "max_perf_drop = 0.05", "max_perf_drop = -0.01");
        expect_validation_field(&tmp, "optimizer.max_perf_drop");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_based_override() {
        let tmp = scratch("ctbl_config_zero_slot");
        copy_defaults(&tmp);
        patch(&tmp, "lineup.toml", "\"King, Demarcus\" = 1", "\"King, Demarcus\" = 0");
        expect_validation_field(&tmp, "overrides");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_duplicate_override_slots() {
        let tmp = scratch("ctbl_config_dup_slot");
        copy_defaults(&tmp);
        patch(&tmp, "lineup.toml", "\"Cho, Jason\" = 7", "\"Cho, Jason\" = 1");
        expect_validation_field(&tmp, "overrides");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_handedness_letter() {
        let tmp = scratch("ctbl_config_bad_hand");
        copy_defaults(&tmp);
        patch(&tmp, "lineup.toml", "\"Manzo, Joel\" = \"L\"", "\"Manzo, Joel\" = \"X\"");
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("lineup.toml")),
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_lineup_toml() {
        let tmp = scratch("ctbl_config_missing_lineup");
        let root = project_root();
        fs::copy(root.join("defaults/league.toml"), tmp.join("config/league.toml")).unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("lineup.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = scratch("ctbl_config_invalid_toml");
        copy_defaults(&tmp);
        fs::write(tmp.join("config/league.toml"), "this is not valid [[[ toml").unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("league.toml")),
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_and_skips_existing() {
        let tmp = std::env::temp_dir().join("ctbl_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::create_dir_all(tmp.join("config")).unwrap();

        let root = project_root();
        fs::copy(root.join("defaults/league.toml"), defaults_dir.join("league.toml")).unwrap();
        fs::copy(root.join("defaults/lineup.toml"), defaults_dir.join("lineup.toml")).unwrap();
        fs::write(defaults_dir.join("lineup.toml.example"), "# template\n").unwrap();
        fs::write(tmp.join("config/league.toml"), "# custom\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(copied[0].ends_with("lineup.toml"));
        assert!(!tmp.join("config/lineup.toml.example").exists());
        let kept = fs::read_to_string(tmp.join("config/league.toml")).unwrap();
        assert_eq!(kept, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("ctbl_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        match ensure_config_files(&tmp).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }
}
