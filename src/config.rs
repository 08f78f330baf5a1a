// Configuration for sleepscope
//
// Configuration is loaded in order of precedence:
// 1. Environment variables (highest priority)
// 2. Config file (~/.config/sleepscope/config.toml)
// 3. Built-in defaults (lowest priority)

use crate::model::DEFAULT_QUALITY_THRESHOLD;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Database watcher settings
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// How often to poll the database for changes
    pub poll_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Display settings for the night list
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    /// Quality ratings below this count as a "poor" night
    pub quality_threshold: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Also write logs to rotating files
    pub file_enabled: bool,
    /// Directory for rotating log files
    pub file_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: false,
            file_dir: PathBuf::from("./logs"),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database holding sleep nights
    pub db_path: PathBuf,

    /// Directory for session journal files (JSON Lines)
    pub journal_dir: PathBuf,

    /// Whether the journal is written at all
    pub journal_enabled: bool,

    /// Theme name: "dark", "light", "nord", "dracula"
    pub theme: String,

    /// Demo mode: seed and mutate synthetic nights
    pub demo_mode: bool,

    /// Watcher settings
    pub watcher: WatcherConfig,

    /// Display settings
    pub display: DisplayConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Watcher settings as loaded from the config file
#[derive(Debug, Deserialize, Default)]
struct FileWatcher {
    poll_interval_ms: Option<u64>,
}

/// Display settings as loaded from the config file
#[derive(Debug, Deserialize, Default)]
struct FileDisplay {
    quality_threshold: Option<u8>,
}

/// Logging settings as loaded from the config file
#[derive(Debug, Deserialize, Default)]
struct FileLogging {
    level: Option<String>,
    file_enabled: Option<bool>,
    file_dir: Option<String>,
}

/// Config file structure (subset of Config that makes sense to persist)
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    db_path: Option<String>,
    journal_dir: Option<String>,
    journal_enabled: Option<bool>,
    theme: Option<String>,

    /// Optional [watcher] section
    watcher: Option<FileWatcher>,

    /// Optional [display] section
    display: Option<FileDisplay>,

    /// Optional [logging] section
    logging: Option<FileLogging>,
}

impl Config {
    /// Get the config file path: ~/.config/sleepscope/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("sleepscope").join("config.toml"))
    }

    /// Default database location: ~/.local/share/sleepscope/nights.db,
    /// falling back to the working directory when home is undetermined
    pub fn default_db_path() -> PathBuf {
        dirs::data_dir()
            .map(|p| p.join("sleepscope").join("nights.db"))
            .unwrap_or_else(|| PathBuf::from("./nights.db"))
    }

    /// Create a config template if none exists yet.
    /// Called during startup to help users discover configuration options.
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        // Don't overwrite existing config
        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Silently fail - config is optional
            }
        }

        let template = r#"# sleepscope configuration
# Uncomment and modify options as needed

# Theme: dark, light, nord, dracula (cycle with 't' in the TUI)
# theme = "dark"

# Path to the SQLite database holding sleep nights
# db_path = "~/.local/share/sleepscope/nights.db"

# Session journal (JSON Lines, one file per session)
# journal_enabled = true
# journal_dir = "./journal"

# Database watcher
# [watcher]
# poll_interval_ms = 500   # How often to check for new snapshots

# Night list display
# [display]
# quality_threshold = 3    # Ratings below this render as a poor night

# Logging configuration
# [logging]
# level = "info"           # trace, debug, info, warn, error (RUST_LOG overrides)
# file_enabled = false     # Also write rotating log files
# file_dir = "./logs"
"#;

        // Write template (ignore errors - config is optional)
        let _ = std::fs::write(&path, template);
    }

    /// Load file config if it exists
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                FileConfig::default()
            }),
            Err(_) => FileConfig::default(), // File doesn't exist, use defaults
        }
    }

    /// Serialize config to TOML string (single source of truth for format)
    pub fn to_toml(&self) -> String {
        format!(
            r#"# sleepscope configuration

# Theme: dark, light, nord, dracula (cycle with 't' in the TUI)
theme = "{theme}"

# Path to the SQLite database holding sleep nights
db_path = "{db_path}"

# Session journal (JSON Lines, one file per session)
journal_enabled = {journal_enabled}
journal_dir = "{journal_dir}"

# Database watcher
[watcher]
poll_interval_ms = {poll_ms}

# Night list display
[display]
quality_threshold = {threshold}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
file_enabled = {file_enabled}
file_dir = "{file_dir}"
"#,
            theme = self.theme,
            db_path = self.db_path.display(),
            journal_enabled = self.journal_enabled,
            journal_dir = self.journal_dir.display(),
            poll_ms = self.watcher.poll_interval.as_millis(),
            threshold = self.display.quality_threshold,
            log_level = self.logging.level,
            file_enabled = self.logging.file_enabled,
            file_dir = self.logging.file_dir.display(),
        )
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = Self::config_path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config path",
            ));
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, self.to_toml())
    }

    /// Load configuration: env vars -> file -> defaults
    pub fn from_env() -> Self {
        let file = Self::load_file_config();

        // Database path: env > file > default
        let db_path = std::env::var("SLEEPSCOPE_DB")
            .ok()
            .or(file.db_path)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_db_path);

        // Journal directory: env > file > default
        let journal_dir = std::env::var("SLEEPSCOPE_JOURNAL_DIR")
            .ok()
            .or(file.journal_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./journal"));

        let journal_enabled = file.journal_enabled.unwrap_or(true);

        // Theme: env > file > default
        let theme = std::env::var("SLEEPSCOPE_THEME")
            .ok()
            .or(file.theme)
            .unwrap_or_else(|| "dark".to_string());

        // Demo mode: env only (runtime flag, also settable via --demo)
        let demo_mode = std::env::var("SLEEPSCOPE_DEMO")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        let file_watcher = file.watcher.unwrap_or_default();
        let watcher = WatcherConfig {
            poll_interval: Duration::from_millis(file_watcher.poll_interval_ms.unwrap_or(500)),
        };

        let file_display = file.display.unwrap_or_default();
        let display = DisplayConfig {
            quality_threshold: file_display
                .quality_threshold
                .unwrap_or(DEFAULT_QUALITY_THRESHOLD),
        };

        // Logging settings: file config only (RUST_LOG env var handled in main.rs)
        let file_logging = file.logging.unwrap_or_default();
        let logging = LoggingConfig {
            level: file_logging.level.unwrap_or_else(|| "info".to_string()),
            file_enabled: file_logging.file_enabled.unwrap_or(false),
            file_dir: file_logging
                .file_dir
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./logs")),
        };

        Self {
            db_path,
            journal_dir,
            journal_enabled,
            theme,
            demo_mode,
            watcher,
            display,
            logging,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: Self::default_db_path(),
            journal_dir: PathBuf::from("./journal"),
            journal_enabled: true,
            theme: "dark".to_string(),
            demo_mode: false,
            watcher: WatcherConfig::default(),
            display: DisplayConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.display.quality_threshold, 3);
        assert_eq!(config.watcher.poll_interval, Duration::from_millis(500));
        assert!(config.journal_enabled);
        assert!(!config.demo_mode);
    }

    #[test]
    fn file_config_parses_partial_sections() {
        let parsed: FileConfig = toml::from_str(
            r#"
theme = "nord"

[display]
quality_threshold = 4
"#,
        )
        .unwrap();
        assert_eq!(parsed.theme.as_deref(), Some("nord"));
        assert_eq!(
            parsed.display.as_ref().and_then(|d| d.quality_threshold),
            Some(4)
        );
        assert!(parsed.watcher.is_none());
        assert!(parsed.db_path.is_none());
    }

    #[test]
    fn file_config_ignores_unknown_keys() {
        let parsed: Result<FileConfig, _> = toml::from_str(
            r#"
theme = "dark"
not_a_real_key = 12
"#,
        );
        assert!(parsed.is_ok());
    }

    #[test]
    fn env_overrides_beat_file_values() {
        let _lock = test_support::ENV_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let _home = test_support::HomeGuard::new("env-precedence");

        let path = Config::config_path().unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "theme = \"light\"\ndb_path = \"/tmp/from-file.db\"\n").unwrap();

        std::env::set_var("SLEEPSCOPE_THEME", "nord");
        let config = Config::from_env();
        assert_eq!(config.theme, "nord"); // env wins over file
        assert_eq!(config.db_path, PathBuf::from("/tmp/from-file.db")); // file wins over default

        std::env::remove_var("SLEEPSCOPE_THEME");
        let config = Config::from_env();
        assert_eq!(config.theme, "light"); // file again once the env var is gone
    }

    #[test]
    fn saving_the_merged_config_keeps_user_values_and_fills_new_keys() {
        let _lock = test_support::ENV_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let _home = test_support::HomeGuard::new("merge-update");

        // A config written by an older version: one key, no sections
        let path = Config::config_path().unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "theme = \"dracula\"\n").unwrap();

        // The merge behind `config --update`: file over defaults, rewritten
        Config::from_env().save().unwrap();

        let rewritten: FileConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(rewritten.theme.as_deref(), Some("dracula")); // user value preserved
        assert_eq!(
            rewritten.display.and_then(|d| d.quality_threshold),
            Some(DEFAULT_QUALITY_THRESHOLD) // new section appeared with its default
        );
        assert_eq!(rewritten.watcher.and_then(|w| w.poll_interval_ms), Some(500));
        assert_eq!(rewritten.journal_enabled, Some(true));
    }

    #[test]
    fn to_toml_round_trips_through_the_file_parser() {
        let config = Config::default();
        let parsed: FileConfig = toml::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed.theme.as_deref(), Some("dark"));
        assert_eq!(
            parsed.watcher.and_then(|w| w.poll_interval_ms),
            Some(config.watcher.poll_interval.as_millis() as u64)
        );
        assert_eq!(
            parsed.display.and_then(|d| d.quality_threshold),
            Some(config.display.quality_threshold)
        );
        assert_eq!(parsed.journal_enabled, Some(true));
    }
}
