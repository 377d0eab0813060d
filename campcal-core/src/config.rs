//! Global campcal configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::controller::ControllerSettings;
use crate::error::{CampcalError, CampcalResult};
use crate::filter::DEFAULT_SEARCH_DEBOUNCE;
use crate::placement::DEFAULT_CELL_LIMIT;
use crate::range::ViewMode;

static DEFAULT_DATA_DIR: &str = "~/campcal";
static DEFAULT_TIMEZONE: &str = "UTC";
static ENV_PREFIX: &str = "CAMPCAL";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_cell_limit() -> usize {
    DEFAULT_CELL_LIMIT
}

fn default_search_debounce() -> String {
    humantime::format_duration(DEFAULT_SEARCH_DEBOUNCE).to_string()
}

/// Configuration at ~/.config/campcal/config.toml, overridable with
/// `CAMPCAL_*` environment variables (e.g. `CAMPCAL_USER_ID`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampcalConfig {
    /// Directory holding one file per event.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// IANA zone used to decide which day and hour an event falls on.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Identity attached to writes. Without it, every mutation is refused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default)]
    pub default_view: ViewMode,

    /// Events shown per month cell before "+N more".
    #[serde(default = "default_cell_limit")]
    pub cell_limit: usize,

    #[serde(default = "default_search_debounce")]
    pub search_debounce: String,

    /// Patch the local snapshot right after a successful write instead of
    /// waiting for the change notice.
    #[serde(default)]
    pub optimistic_updates: bool,
}

impl Default for CampcalConfig {
    fn default() -> Self {
        CampcalConfig {
            data_dir: default_data_dir(),
            timezone: default_timezone(),
            user_id: None,
            default_view: ViewMode::default(),
            cell_limit: default_cell_limit(),
            search_debounce: default_search_debounce(),
            optimistic_updates: false,
        }
    }
}

impl CampcalConfig {
    pub fn config_path() -> CampcalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CampcalError::Config("Could not determine config directory".into()))?
            .join("campcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the global config, writing a commented default file on first run.
    pub fn load() -> CampcalResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path, true)
    }

    /// Load from an explicit file, optionally layering `CAMPCAL_*` env vars on top.
    pub fn load_from(path: &Path, with_env: bool) -> CampcalResult<Self> {
        let mut builder =
            Config::builder().add_source(File::from(path.to_path_buf()).required(false));
        if with_env {
            builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));
        }

        let config: CampcalConfig = builder
            .build()
            .map_err(|e| CampcalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CampcalError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CampcalResult<()> {
        self.tz()?;
        self.debounce()?;
        if self.cell_limit == 0 {
            return Err(CampcalError::Config("cell_limit must be at least 1".into()));
        }
        Ok(())
    }

    /// Data directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();
        PathBuf::from(full_path_str)
    }

    pub fn tz(&self) -> CampcalResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| CampcalError::Config(format!("Invalid timezone '{}': {}", self.timezone, e)))
    }

    pub fn debounce(&self) -> CampcalResult<Duration> {
        humantime::parse_duration(&self.search_debounce).map_err(|e| {
            CampcalError::Config(format!(
                "Invalid search_debounce '{}': {}",
                self.search_debounce, e
            ))
        })
    }

    pub fn controller_settings(&self) -> CampcalResult<ControllerSettings> {
        Ok(ControllerSettings {
            tz: self.tz()?,
            default_view: self.default_view,
            cell_limit: self.cell_limit,
            optimistic_updates: self.optimistic_updates,
            search_debounce: self.debounce()?,
        })
    }

    /// Save the current config to ~/.config/campcal/config.toml
    pub fn save(&self) -> CampcalResult<()> {
        let config_path = Self::config_path()?;

        let content =
            toml::to_string_pretty(self).map_err(|e| CampcalError::Config(e.to_string()))?;

        std::fs::write(&config_path, content)
            .map_err(|e| CampcalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CampcalResult<()> {
        let contents = format!(
            "\
# campcal configuration

# Where event files live:
# data_dir = \"{}\"

# Time zone used to lay out days and hour slots:
# timezone = \"{}\"

# Your user id (required to create, edit, move or delete events):
# user_id = \"you@example.com\"

# View shown when no --view is given (month, week, day, year):
# default_view = \"month\"

# Events shown per month cell before \"+N more\":
# cell_limit = {}

# Delay before typed search text is applied:
# search_debounce = \"{}\"

# Patch the view immediately after a write:
# optimistic_updates = false
",
            DEFAULT_DATA_DIR,
            DEFAULT_TIMEZONE,
            DEFAULT_CELL_LIMIT,
            default_search_debounce(),
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CampcalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CampcalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
