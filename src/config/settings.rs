use crate::error::{Result, ViewerError};
use crate::utils::app_paths::AppPaths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Display theme, global or per dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Classic,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Light, Theme::Dark, Theme::Classic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Classic => "classic",
        }
    }

    /// Next theme in menu order, wrapping around
    pub fn next(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Classic,
            Theme::Classic => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self> {
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ViewerError::InvalidSetting {
                key: "theme".to_string(),
                value: s.to_string(),
            })
    }
}

/// Process-wide viewer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Color theme: "light", "dark" or "classic"
    pub theme: Theme,

    /// Border style for panels: "default", "plain", "rounded", "double", "thick"
    pub style: String,

    /// Keep the caller blocked in the viewer until it is closed
    pub block: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            style: "default".to_string(),
            block: true,
        }
    }
}

impl Settings {
    pub const KEYS: [&'static str; 3] = ["theme", "style", "block"];

    /// Load settings from the default location, creating it on first run
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::get_config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let defaults = Self::default();
            defaults.save_to(path)?;
            info!("Created default settings at {}", path.display());
            return Ok(defaults);
        }

        let contents = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&contents)?;
        debug!("Loaded settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn get_config_path() -> anyhow::Result<PathBuf> {
        Ok(AppPaths::config_dir()?.join("config.toml"))
    }

    /// Apply one flat `key = value` override
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "theme" => self.theme = value.parse()?,
            "style" => self.style = value.trim().to_string(),
            "block" => {
                self.block = match value.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "yes" | "on" => true,
                    "false" | "0" | "no" | "off" => false,
                    _ => {
                        return Err(ViewerError::InvalidSetting {
                            key: key.to_string(),
                            value: value.to_string(),
                        })
                    }
                }
            }
            other => return Err(ViewerError::UnknownSetting(other.to_string())),
        }
        debug!("Setting {} = {}", key, value);
        Ok(())
    }

    /// Apply `key=value` overrides in order; the first bad one aborts
    /// with the settings left unchanged.
    pub fn apply_overrides<'a, I>(&mut self, overrides: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut updated = self.clone();
        for (key, value) in overrides {
            updated.set(key, value)?;
        }
        *self = updated;
        Ok(())
    }

    /// Default settings file with comments
    pub fn create_default_with_comments() -> String {
        r#"# frameview settings
# Location: ~/.config/frameview/config.toml (Linux)
#           ~/Library/Application Support/frameview/config.toml (macOS)
#           %APPDATA%\frameview\config.toml (Windows)

# Color theme: "light", "dark" or "classic"
theme = "light"

# Panel border style: "default", "plain", "rounded", "double", "thick"
style = "default"

# Keep the terminal in the viewer until it is closed.
# false prints a summary of the loaded datasets and returns immediately.
block = true
"#
        .to_string()
    }
}
