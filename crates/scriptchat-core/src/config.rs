use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::session::ReplyDelay;
use crate::theme::ThemeName;

/// User settings from `<config_dir>/scriptchat/config.json`. Every field is optional.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub theme: Option<String>,
    pub default_template: Option<String>,
    pub templates_dir: Option<PathBuf>,
    pub typing_speed_ms: Option<u64>,
    pub lead_in_ms: Option<u64>,
    pub reply_delay_min_ms: Option<u64>,
    pub reply_delay_max_ms: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the default location; a missing file gives the defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(Error::ConfigDir)?;
        Ok(config_dir.join("scriptchat").join("config.json"))
    }

    pub fn theme_name(&self) -> Option<ThemeName> {
        self.theme.as_deref().and_then(ThemeName::from_str)
    }

    pub fn timing(&self) -> Timing {
        let defaults = Timing::default();
        Timing {
            typing_speed: self
                .typing_speed_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.typing_speed),
            lead_in: self
                .lead_in_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.lead_in),
            reply_delay: ReplyDelay::new(
                self.reply_delay_min_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.reply_delay.min),
                self.reply_delay_max_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.reply_delay.max),
            ),
        }
    }
}

/// Pacing of the replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    /// Interval between revealed characters in the analysis feed
    pub typing_speed: Duration,
    /// Pause before the feed starts typing
    pub lead_in: Duration,
    pub reply_delay: ReplyDelay,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            typing_speed: Duration::from_millis(25),
            lead_in: Duration::from_millis(300),
            reply_delay: ReplyDelay::default(),
        }
    }
}
