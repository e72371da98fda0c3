//! Settings for pomoterm.
//!
//! Settings are resolved once at startup, in priority order:
//!
//! 1. positional command-line values
//! 2. `~/.pomoterm/settings.toml`
//! 3. built-in defaults
//!
//! and the result is always written back to the settings file.
//!
//! # Settings File
//!
//! ```toml
//! study_minutes = 45
//! short_break_minutes = 15
//! long_break_minutes = 30
//! sessions_before_long_break = 4
//!
//! # optional overrides
//! quotes_path = "/home/me/quotes.txt"
//! save_path = "/home/me/.pomoterm/save"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the per-user directory under `$HOME`
const APP_DIR: &str = ".pomoterm";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown argument: {0}. Use -h for help.")]
    InvalidArgument(String),

    #[error("Too many arguments: at most 4 values are accepted")]
    TooManyArguments,

    #[error("Invalid {name}: {value:?} (expected a positive number)")]
    InvalidDuration { name: &'static str, value: String },

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Settings file I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Timer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub study_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    /// Study phases before a long break; 0 disables long breaks
    pub sessions_before_long_break: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quotes_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            study_minutes: 45,
            short_break_minutes: 15,
            long_break_minutes: 30,
            sessions_before_long_break: 4,
            quotes_path: None,
            save_path: None,
        }
    }
}

/// Names of the positional values, in command-line order
const FIELD_NAMES: [&str; 4] = [
    "study minutes",
    "short break minutes",
    "long break minutes",
    "sessions before long break",
];

impl Settings {
    /// Durations must be positive; the session count may be 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            self.study_minutes,
            self.short_break_minutes,
            self.long_break_minutes,
        ];
        for (value, name) in durations.into_iter().zip(FIELD_NAMES) {
            if value == 0 {
                return Err(ConfigError::InvalidDuration {
                    name,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load a settings file; `None` when missing or invalid
    pub fn load_from(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match fs::read_to_string(path)
            .map_err(ConfigError::from)
            .and_then(|content| Self::from_toml(&content))
        {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!("Ignoring settings file {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn set_field(&mut self, index: usize, value: u32) {
        match index {
            0 => self.study_minutes = value,
            1 => self.short_break_minutes = value,
            2 => self.long_break_minutes = value,
            _ => self.sessions_before_long_break = value,
        }
    }

    pub fn quotes_path(&self) -> PathBuf {
        self.quotes_path
            .clone()
            .unwrap_or_else(|| app_dir().join("quotes"))
    }

    pub fn save_path(&self) -> PathBuf {
        self.save_path
            .clone()
            .unwrap_or_else(|| app_dir().join("save"))
    }
}

/// What the command line asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    Run(CliOverrides),
    Help,
    Version,
}

/// Settings given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// Positional values in `FIELD_NAMES` order
    pub values: Vec<u32>,
    /// Discard the settings file and start from defaults
    pub reset: bool,
}

/// Parse arguments (without the program name)
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<CliAction, ConfigError> {
    let mut overrides = CliOverrides::default();

    for arg in args {
        let arg = arg.as_ref();
        match arg {
            "-h" | "--help" => return Ok(CliAction::Help),
            "-v" | "--version" => return Ok(CliAction::Version),
            "reset" => overrides.reset = true,
            _ if arg.starts_with('-') => {
                return Err(ConfigError::InvalidArgument(arg.to_string()));
            }
            _ => {
                let index = overrides.values.len();
                let name = *FIELD_NAMES.get(index).ok_or(ConfigError::TooManyArguments)?;
                let value: u32 = arg.parse().map_err(|_| ConfigError::InvalidDuration {
                    name,
                    value: arg.to_string(),
                })?;
                // only the session count may be zero
                if value == 0 && index < 3 {
                    return Err(ConfigError::InvalidDuration {
                        name,
                        value: arg.to_string(),
                    });
                }
                overrides.values.push(value);
            }
        }
    }

    Ok(CliAction::Run(overrides))
}

/// Combine command-line values with the settings file
pub fn resolve(cli: &CliOverrides, file: Option<Settings>) -> Settings {
    let mut settings = if cli.reset {
        Settings::default()
    } else {
        file.unwrap_or_default()
    };
    for (index, value) in cli.values.iter().enumerate() {
        settings.set_field(index, *value);
    }
    settings
}

/// Resolve settings against the default settings file and persist them
pub fn load_settings(cli: &CliOverrides) -> Settings {
    let path = settings_path();
    let file = if cli.reset {
        None
    } else {
        Settings::load_from(&path)
    };
    let settings = resolve(cli, file);

    if let Err(e) = settings.save_to(&path) {
        tracing::warn!("Failed to save settings to {}: {}", path.display(), e);
    }
    tracing::info!(
        "Settings: study {}m, short break {}m, long break {}m, long break every {}",
        settings.study_minutes,
        settings.short_break_minutes,
        settings.long_break_minutes,
        settings.sessions_before_long_break
    );
    settings
}

/// `~/.pomoterm`, or a relative `.pomoterm` without a home directory
pub fn app_dir() -> PathBuf {
    home_dir()
        .map(|home| home.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(APP_DIR))
}

pub fn settings_path() -> PathBuf {
    app_dir().join("settings.toml")
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}
