//! Configuration for remindcal.
//!
//! Lives at ~/.config/remindcal/config.toml; any key can be overridden with a
//! `REMINDCAL_` environment variable (`__` separates nested keys, e.g.
//! `REMINDCAL_SETTINGS__FIRST_WEEKDAY=1`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Duration;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::date::FirstWeekday;
use crate::error::{RemindError, RemindResult};
use crate::remote::RemoteConfig;
use crate::store::StoreOptions;
use crate::time::TimeFormat;

static DEFAULT_STORE_PATH: &str = "~/.local/share/remindcal/reminders.json";

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_undo_timeout_secs() -> u64 {
    8
}

fn default_notify_offset_minutes() -> i64 {
    10
}

fn default_horizon_days() -> u32 {
    366
}

/// One day.
const MAX_UNDO_TIMEOUT_SECS: u64 = 24 * 60 * 60;
/// One week.
const MAX_NOTIFY_OFFSET_MINUTES: i64 = 7 * 24 * 60;

/// User-facing display settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub first_weekday: FirstWeekday,
    #[serde(default)]
    pub format: TimeFormat,
    #[serde(default = "default_locale")]
    pub date_locale: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            first_weekday: FirstWeekday::default(),
            format: TimeFormat::default(),
            date_locale: default_locale(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemindConfig {
    #[serde(default)]
    pub settings: Settings,

    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default = "default_undo_timeout_secs")]
    pub undo_timeout_secs: u64,

    #[serde(default = "default_notify_offset_minutes")]
    pub notify_offset_minutes: i64,

    #[serde(default = "default_horizon_days")]
    pub upcoming_horizon_days: u32,

    /// External calendar sources by provider name.
    #[serde(default)]
    pub remotes: BTreeMap<String, RemoteConfig>,
}

impl Default for RemindConfig {
    fn default() -> Self {
        RemindConfig {
            settings: Settings::default(),
            store_path: default_store_path(),
            undo_timeout_secs: default_undo_timeout_secs(),
            notify_offset_minutes: default_notify_offset_minutes(),
            upcoming_horizon_days: default_horizon_days(),
            remotes: BTreeMap::new(),
        }
    }
}

impl RemindConfig {
    pub fn config_path() -> RemindResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| RemindError::Config("Could not determine config directory".into()))?
            .join("remindcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, creating a commented template first if
    /// there is no file yet.
    pub fn load() -> RemindResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> RemindResult<Self> {
        let config: RemindConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("REMINDCAL").separator("__"))
            .build()
            .map_err(|e| RemindError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| RemindError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> RemindResult<()> {
        if self.upcoming_horizon_days == 0 {
            return Err(RemindError::Config(
                "upcoming_horizon_days must be at least 1".into(),
            ));
        }
        if self.undo_timeout_secs > MAX_UNDO_TIMEOUT_SECS {
            return Err(RemindError::Config(format!(
                "undo_timeout_secs cannot be more than {MAX_UNDO_TIMEOUT_SECS}"
            )));
        }
        if self.notify_offset_minutes < 0 {
            return Err(RemindError::Config(
                "notify_offset_minutes cannot be negative".into(),
            ));
        }
        if self.notify_offset_minutes > MAX_NOTIFY_OFFSET_MINUTES {
            return Err(RemindError::Config(format!(
                "notify_offset_minutes cannot be more than {MAX_NOTIFY_OFFSET_MINUTES}"
            )));
        }
        Ok(())
    }

    /// Store location with `~` expanded.
    pub fn store_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.store_path.to_string_lossy()).into_owned();
        PathBuf::from(full_path_str)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            first_weekday: self.settings.first_weekday,
            undo_timeout: Duration::seconds(self.undo_timeout_secs as i64),
            notify_offset: Duration::minutes(self.notify_offset_minutes),
            horizon_days: self.upcoming_horizon_days,
        }
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> RemindResult<()> {
        let contents = format!(
            "\
# remindcal configuration

# Where reminders are stored:
# store_path = \"{}\"

# Seconds a removed reminder can still be restored (at most a day):
# undo_timeout_secs = {}

# Minutes before the start a \"default\" notification fires (at most a week):
# notify_offset_minutes = {}

# How many days ahead upcoming lists look:
# upcoming_horizon_days = {}

# [settings]
# first_weekday = 0      # 0 = Sunday, 1 = Monday
# format = 24            # 12 or 24
# date_locale = \"en-US\"

# External calendars, one table per provider:
# [remotes.google]
# google_account = \"me@example.com\"
",
            DEFAULT_STORE_PATH,
            default_undo_timeout_secs(),
            default_notify_offset_minutes(),
            default_horizon_days(),
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RemindError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RemindError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
