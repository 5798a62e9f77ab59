//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory (or CWD).
//! Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub timing: TimingConfig,
    pub screen: ScreenConfig,
    pub motion: MotionConfig,
    pub router: RouterConfig,
    pub scheduler: SchedulerConfig,
    pub maze: MazeConfig,
    pub game_file: PathBuf,
    pub save_file: PathBuf,
    pub seed: u64,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub ticks_per_second: u32,
    pub frame_sleep_ms: u64,
}

/// Screen geometry. Objects are kept `edge` pixels inside the screen and
/// snapped back to `edge2` when they stray.
#[derive(Clone, Debug)]
pub struct ScreenConfig {
    pub width: usize,
    pub height: usize,
    pub edge: i32,
    pub edge2: i32,
}

#[derive(Clone, Debug)]
pub struct MotionConfig {
    pub step_dx: i32,
    pub step_dy: i32,
}

#[derive(Clone, Debug)]
pub struct RouterConfig {
    pub hero_min_width: i32,
    pub hero_max_width: i32,
    pub max_segments: usize,
    pub max_nodes: usize,
    pub max_depth: usize,
}

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub max_events: usize,
}

#[derive(Clone, Debug)]
pub struct MazeConfig {
    pub shift_x: i32,
    pub shift_y: i32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    screen: TomlScreen,
    #[serde(default)]
    motion: TomlMotion,
    #[serde(default)]
    router: TomlRouter,
    #[serde(default)]
    scheduler: TomlScheduler,
    #[serde(default)]
    maze: TomlMaze,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tps")]
    ticks_per_second: u32,
    #[serde(default = "default_frame_sleep")]
    frame_sleep_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlScreen {
    #[serde(default = "default_width")]
    width: usize,
    #[serde(default = "default_height")]
    height: usize,
    #[serde(default = "default_edge")]
    edge: i32,
    #[serde(default = "default_edge2")]
    edge2: i32,
}

#[derive(Deserialize, Debug)]
struct TomlMotion {
    #[serde(default = "default_step_dx")]
    step_dx: i32,
    #[serde(default = "default_step_dy")]
    step_dy: i32,
}

#[derive(Deserialize, Debug)]
struct TomlRouter {
    #[serde(default = "default_hero_min_width")]
    hero_min_width: i32,
    #[serde(default = "default_hero_max_width")]
    hero_max_width: i32,
    #[serde(default = "default_max_segments")]
    max_segments: usize,
    #[serde(default = "default_max_nodes")]
    max_nodes: usize,
    #[serde(default = "default_max_depth")]
    max_depth: usize,
}

#[derive(Deserialize, Debug)]
struct TomlScheduler {
    #[serde(default = "default_max_events")]
    max_events: usize,
}

#[derive(Deserialize, Debug)]
struct TomlMaze {
    #[serde(default = "default_shift")]
    shift_x: i32,
    #[serde(default = "default_shift")]
    shift_y: i32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_game_file")]
    game_file: String,
    #[serde(default = "default_save_file")]
    save_file: String,
    #[serde(default)]
    seed: u64,
}

// ── Defaults ──

fn default_tps() -> u32 { 9 }
fn default_frame_sleep() -> u64 { 5 }
fn default_width() -> usize { 320 }
fn default_height() -> usize { 200 }
fn default_edge() -> i32 { 10 }
fn default_edge2() -> i32 { 20 }
fn default_step_dx() -> i32 { 5 }
fn default_step_dy() -> i32 { 4 }
fn default_hero_min_width() -> i32 { 16 }
fn default_hero_max_width() -> i32 { 25 }
fn default_max_segments() -> usize { 256 }
fn default_max_nodes() -> usize { 256 }
fn default_max_depth() -> usize { 2048 }
fn default_max_events() -> usize { 50 }
fn default_shift() -> i32 { 8 }
fn default_game_file() -> String { "game.toml".into() }
fn default_save_file() -> String { "adventure.sav".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            ticks_per_second: default_tps(),
            frame_sleep_ms: default_frame_sleep(),
        }
    }
}

impl Default for TomlScreen {
    fn default() -> Self {
        TomlScreen {
            width: default_width(),
            height: default_height(),
            edge: default_edge(),
            edge2: default_edge2(),
        }
    }
}

impl Default for TomlMotion {
    fn default() -> Self {
        TomlMotion { step_dx: default_step_dx(), step_dy: default_step_dy() }
    }
}

impl Default for TomlRouter {
    fn default() -> Self {
        TomlRouter {
            hero_min_width: default_hero_min_width(),
            hero_max_width: default_hero_max_width(),
            max_segments: default_max_segments(),
            max_nodes: default_max_nodes(),
            max_depth: default_max_depth(),
        }
    }
}

impl Default for TomlScheduler {
    fn default() -> Self {
        TomlScheduler { max_events: default_max_events() }
    }
}

impl Default for TomlMaze {
    fn default() -> Self {
        TomlMaze { shift_x: default_shift(), shift_y: default_shift() }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            game_file: default_game_file(),
            save_file: default_save_file(),
            seed: 0,
        }
    }
}

// ── Loading ──

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl EngineConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/adventure`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        EngineConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse a config document directly. Unknown keys are ignored.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(EngineConfig::from_toml(cfg, &[]))
    }

    fn from_toml(t: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        EngineConfig {
            timing: TimingConfig {
                ticks_per_second: t.timing.ticks_per_second.max(1),
                frame_sleep_ms: t.timing.frame_sleep_ms,
            },
            screen: ScreenConfig {
                width: t.screen.width,
                height: t.screen.height,
                edge: t.screen.edge,
                edge2: t.screen.edge2,
            },
            motion: MotionConfig {
                step_dx: t.motion.step_dx,
                step_dy: t.motion.step_dy,
            },
            router: RouterConfig {
                hero_min_width: t.router.hero_min_width,
                hero_max_width: t.router.hero_max_width,
                max_segments: t.router.max_segments,
                max_nodes: t.router.max_nodes,
                max_depth: t.router.max_depth,
            },
            scheduler: SchedulerConfig { max_events: t.scheduler.max_events },
            maze: MazeConfig { shift_x: t.maze.shift_x, shift_y: t.maze.shift_y },
            game_file: resolve_file(&t.general.game_file, search_dirs),
            save_file: PathBuf::from(&t.general.save_file),
            seed: t.general.seed,
        }
    }

    /// Milliseconds per logical tick.
    pub fn tick_interval_ms(&self) -> u64 {
        1000 / self.timing.ticks_per_second as u64
    }
}

/// Absolute paths are kept; relative ones are looked up in the candidate dirs.
fn resolve_file(name: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(name);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(name))
        .find(|p| p.is_file())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD + data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/adventure");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warn!("config.toml parse error: {e}; using default settings");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
