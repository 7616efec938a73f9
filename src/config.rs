/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Values that parse but make no sense (empty star range, ratios outside
/// 0..=1, ...) are replaced by their section defaults and reported in
/// `GameConfig::warnings`, which `main` logs once tracing is up.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::sky::Category;

const APP_DIR: &str = "constellation-challenge";

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub rules: RulesConfig,
    pub sky: SkyConfig,
    pub gamepad: GamepadConfig,
    pub catalog_path: PathBuf,
    pub category: Category,
    pub seed: Option<u64>,
    pub playlist: Vec<String>, // restricts the pool to these entity ids
    pub log_file: PathBuf,
    pub log_level: String,
    pub warnings: Vec<String>,
}

/// Scoring and timing rules.
#[derive(Clone, Debug, PartialEq)]
pub struct RulesConfig {
    pub session_secs: u32,
    pub points_per_edge: u32,
    pub bonus_per_second: u32,
    pub grace_ms: u64,       // completed round stays visible this long
    pub tick_ms: u64,        // countdown interval
    pub warning_secs: u32,   // low-time warning threshold
}

/// Round generation parameters. Positions are percent of the sky field.
#[derive(Clone, Debug, PartialEq)]
pub struct SkyConfig {
    pub min_stars: usize,
    pub max_stars: usize,
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub chain_ratio: f32,
    pub chord_ratio: f32,
    pub chord_attempts: u32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub select: Vec<String>,
    pub cancel: Vec<String>,
    pub start: Vec<String>,
    pub menu: Vec<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("star count range {min}..={max} is invalid (need 2 <= min <= max)")]
    StarRange { min: usize, max: usize },

    #[error("{axis} bounds {lo}..={hi} must satisfy 0 <= lo <= hi <= 100")]
    Bounds { axis: &'static str, lo: f32, hi: f32 },

    #[error("{name} must be within 0..=1, got {value}")]
    Ratio { name: &'static str, value: f32 },

    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },

    #[error("unknown catalog category '{0}'")]
    Category(String),
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            session_secs: default_session_secs(),
            points_per_edge: default_points_per_edge(),
            bonus_per_second: default_bonus_per_second(),
            grace_ms: default_grace_ms(),
            tick_ms: default_tick_ms(),
            warning_secs: default_warning_secs(),
        }
    }
}

impl Default for SkyConfig {
    fn default() -> Self {
        SkyConfig {
            min_stars: default_min_stars(),
            max_stars: default_max_stars(),
            min_x: default_min_x(),
            max_x: default_max_x(),
            min_y: default_min_y(),
            max_y: default_max_y(),
            chain_ratio: default_chain_ratio(),
            chord_ratio: default_chord_ratio(),
            chord_attempts: default_chord_attempts(),
        }
    }
}

impl RulesConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_secs == 0 {
            return Err(ConfigError::Zero { name: "rules.session_secs" });
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::Zero { name: "rules.tick_ms" });
        }
        Ok(())
    }
}

impl SkyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_stars < 2 || self.min_stars > self.max_stars {
            return Err(ConfigError::StarRange { min: self.min_stars, max: self.max_stars });
        }
        check_bounds("x", self.min_x, self.max_x)?;
        check_bounds("y", self.min_y, self.max_y)?;
        check_ratio("sky.chain_ratio", self.chain_ratio)?;
        check_ratio("sky.chord_ratio", self.chord_ratio)?;
        if self.chord_attempts == 0 {
            return Err(ConfigError::Zero { name: "sky.chord_attempts" });
        }
        Ok(())
    }
}

fn check_bounds(axis: &'static str, lo: f32, hi: f32) -> Result<(), ConfigError> {
    // Written so that NaN fails too.
    if lo >= 0.0 && hi <= 100.0 && lo <= hi {
        Ok(())
    } else {
        Err(ConfigError::Bounds { axis, lo, hi })
    }
}

fn check_ratio(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Ratio { name, value })
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    sky: TomlSky,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_session_secs")]
    session_secs: u32,
    #[serde(default = "default_points_per_edge")]
    points_per_edge: u32,
    #[serde(default = "default_bonus_per_second")]
    bonus_per_second: u32,
    #[serde(default = "default_grace_ms")]
    grace_ms: u64,
    #[serde(default = "default_tick_ms")]
    tick_ms: u64,
    #[serde(default = "default_warning_secs")]
    warning_secs: u32,
}

#[derive(Deserialize, Debug)]
struct TomlSky {
    #[serde(default = "default_min_stars")]
    min_stars: usize,
    #[serde(default = "default_max_stars")]
    max_stars: usize,
    #[serde(default = "default_min_x")]
    min_x: f32,
    #[serde(default = "default_max_x")]
    max_x: f32,
    #[serde(default = "default_min_y")]
    min_y: f32,
    #[serde(default = "default_max_y")]
    max_y: f32,
    #[serde(default = "default_chain_ratio")]
    chain_ratio: f32,
    #[serde(default = "default_chord_ratio")]
    chord_ratio: f32,
    #[serde(default = "default_chord_attempts")]
    chord_attempts: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_select")]
    select: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_start")]
    start: Vec<String>,
    #[serde(default = "default_menu")]
    menu: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_catalog")]
    catalog: String,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    playlist: Vec<String>,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

// ── Defaults ──

fn default_session_secs() -> u32 { 120 }
fn default_points_per_edge() -> u32 { 10 }
fn default_bonus_per_second() -> u32 { 2 }
fn default_grace_ms() -> u64 { 1000 }
fn default_tick_ms() -> u64 { 1000 }
fn default_warning_secs() -> u32 { 10 }

fn default_min_stars() -> usize { 5 }
fn default_max_stars() -> usize { 12 }
fn default_min_x() -> f32 { 10.0 }
fn default_max_x() -> f32 { 90.0 }
fn default_min_y() -> f32 { 15.0 }
fn default_max_y() -> f32 { 85.0 }
fn default_chain_ratio() -> f32 { 0.6 }
fn default_chord_ratio() -> f32 { 0.3 }
fn default_chord_attempts() -> u32 { 32 }

fn default_select() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into()] }
fn default_start() -> Vec<String> { vec!["Start".into()] }
fn default_menu() -> Vec<String> { vec!["Select".into()] }

fn default_catalog() -> String { "catalog.toml".into() }
fn default_category() -> String { "constellations".into() }
fn default_log_file() -> String { "constellation-challenge.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            session_secs: default_session_secs(),
            points_per_edge: default_points_per_edge(),
            bonus_per_second: default_bonus_per_second(),
            grace_ms: default_grace_ms(),
            tick_ms: default_tick_ms(),
            warning_secs: default_warning_secs(),
        }
    }
}

impl Default for TomlSky {
    fn default() -> Self {
        TomlSky {
            min_stars: default_min_stars(),
            max_stars: default_max_stars(),
            min_x: default_min_x(),
            max_x: default_max_x(),
            min_y: default_min_y(),
            max_y: default_max_y(),
            chain_ratio: default_chain_ratio(),
            chord_ratio: default_chord_ratio(),
            chord_attempts: default_chord_attempts(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            select: default_select(),
            cancel: default_cancel(),
            start: default_start(),
            menu: default_menu(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            catalog: default_catalog(),
            category: default_category(),
            seed: None,
            playlist: vec![],
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) XDG data home, (4) system data directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = vec![];
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        Self::resolve(toml_cfg, &search_dirs, warnings)
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf], mut warnings: Vec<String>) -> Self {
        let rules = RulesConfig {
            session_secs: toml_cfg.rules.session_secs,
            points_per_edge: toml_cfg.rules.points_per_edge,
            bonus_per_second: toml_cfg.rules.bonus_per_second,
            grace_ms: toml_cfg.rules.grace_ms,
            tick_ms: toml_cfg.rules.tick_ms,
            warning_secs: toml_cfg.rules.warning_secs,
        };
        let rules = match rules.validate() {
            Ok(()) => rules,
            Err(e) => {
                warnings.push(format!("[rules] {e}; using defaults"));
                RulesConfig::default()
            }
        };

        let sky = SkyConfig {
            min_stars: toml_cfg.sky.min_stars,
            max_stars: toml_cfg.sky.max_stars,
            min_x: toml_cfg.sky.min_x,
            max_x: toml_cfg.sky.max_x,
            min_y: toml_cfg.sky.min_y,
            max_y: toml_cfg.sky.max_y,
            chain_ratio: toml_cfg.sky.chain_ratio,
            chord_ratio: toml_cfg.sky.chord_ratio,
            chord_attempts: toml_cfg.sky.chord_attempts,
        };
        let sky = match sky.validate() {
            Ok(()) => sky,
            Err(e) => {
                warnings.push(format!("[sky] {e}; using defaults"));
                SkyConfig::default()
            }
        };

        let category = match Category::from_name(&toml_cfg.general.category) {
            Some(c) => c,
            None => {
                let e = ConfigError::Category(toml_cfg.general.category.clone());
                warnings.push(format!("[general] {e}; using constellations"));
                Category::Constellations
            }
        };

        // Catalog: absolute path as-is, otherwise the first candidate dir
        // that has it, otherwise relative to CWD.
        let catalog_str = &toml_cfg.general.catalog;
        let catalog_path = if PathBuf::from(catalog_str).is_absolute() {
            PathBuf::from(catalog_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(catalog_str))
                .find(|p| p.is_file())
                .unwrap_or_else(|| PathBuf::from(catalog_str))
        };

        let log_str = &toml_cfg.general.log_file;
        let log_file = if PathBuf::from(log_str).is_absolute() {
            PathBuf::from(log_str)
        } else {
            writable_data_dir().join(log_str)
        };

        GameConfig {
            rules,
            sky,
            gamepad: GamepadConfig {
                select: toml_cfg.gamepad.select,
                cancel: toml_cfg.gamepad.cancel,
                start: toml_cfg.gamepad.start,
                menu: toml_cfg.gamepad.menu,
            },
            catalog_path,
            category,
            seed: toml_cfg.general.seed,
            playlist: toml_cfg.general.playlist,
            log_file,
            log_level: toml_cfg.general.log_level,
            warnings,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
pub fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a packaged symlink still finds data next to
        // the real binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share").join(APP_DIR);
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share").join(APP_DIR);
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    // 5. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Directory for files we write (the log). Exe dir when writable, then
/// XDG data home, then CWD.
fn writable_data_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs (/usr/games) won't be writable
            let probe = parent.join(".write_test_constellation");
            if std::fs::write(&probe, "").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return parent.to_path_buf();
            }
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share").join(APP_DIR);
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warnings.push(format!("config.toml parse error: {e}; using default settings"));
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warnings.push(format!("could not read {}: {e}", path.display()));
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_str(text: &str) -> GameConfig {
        let cfg: TomlConfig = toml::from_str(text).unwrap();
        GameConfig::resolve(cfg, &[], vec![])
    }

    #[test]
    fn empty_file_gives_defaults() {
        let c = from_str("");
        assert_eq!(c.rules, RulesConfig::default());
        assert_eq!(c.sky, SkyConfig::default());
        assert_eq!(c.rules.session_secs, 120);
        assert_eq!(c.rules.points_per_edge, 10);
        assert_eq!(c.rules.bonus_per_second, 2);
        assert_eq!(c.category, Category::Constellations);
        assert_eq!(c.seed, None);
        assert!(c.playlist.is_empty());
        assert!(c.warnings.is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let c = from_str("[rules]\nsession_secs = 60\n[general]\nseed = 42\ncategory = \"galaxies\"\nplaylist = [\"m31\"]\n");
        assert_eq!(c.rules.session_secs, 60);
        assert_eq!(c.rules.grace_ms, 1000);
        assert_eq!(c.seed, Some(42));
        assert_eq!(c.playlist, vec!["m31".to_string()]);
        assert_eq!(c.category, Category::Galaxies);
    }

    #[test]
    fn invalid_sky_falls_back_with_warning() {
        let c = from_str("[sky]\nmin_stars = 9\nmax_stars = 4\n");
        assert_eq!(c.sky, SkyConfig::default());
        assert_eq!(c.warnings.len(), 1);
        assert!(c.warnings[0].contains("star count range"));
    }

    #[test]
    fn unknown_category_falls_back() {
        let c = from_str("[general]\ncategory = \"nebulae\"\n");
        assert_eq!(c.category, Category::Constellations);
        assert!(c.warnings[0].contains("nebulae"));
    }

    #[test]
    fn sky_validation_rules() {
        let mut s = SkyConfig::default();
        s.max_x = 120.0;
        assert_eq!(s.validate(), Err(ConfigError::Bounds { axis: "x", lo: 10.0, hi: 120.0 }));

        let mut s = SkyConfig::default();
        s.chord_ratio = 1.5;
        assert!(matches!(s.validate(), Err(ConfigError::Ratio { .. })));

        let mut s = SkyConfig::default();
        s.min_stars = 1;
        s.max_stars = 1;
        assert!(matches!(s.validate(), Err(ConfigError::StarRange { .. })));

        let r = RulesConfig { tick_ms: 0, ..RulesConfig::default() };
        assert_eq!(r.validate(), Err(ConfigError::Zero { name: "rules.tick_ms" }));
    }
}
