use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::Result;

pub const DEFAULT_DB_PATH: &str = "StartupTimes.db";
pub const DEFAULT_CONFIG_PATH: &str = "startuptimes.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
}

impl JournalMode {
    pub const fn pragma_value(self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    Full,
    #[default]
    Normal,
}

impl SyncMode {
    pub const fn pragma_value(self) -> &'static str {
        match self {
            SyncMode::Full => "FULL",
            SyncMode::Normal => "NORMAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub journal_mode: JournalMode,
    pub synchronous: SyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: PathBuf::from(DEFAULT_DB_PATH),
            journal_mode: JournalMode::default(),
            synchronous: SyncMode::default(),
        }
    }
}

impl StoreConfig {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            path: path.into(),
            ..Self::default()
        }
    }
}

pub fn parse_config(yaml: &str) -> Result<StoreConfig> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Load `path`, or `./startuptimes.yaml` when no path is given and that file exists.
pub fn load_config(path: Option<&Path>) -> Result<Option<StoreConfig>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new(DEFAULT_CONFIG_PATH);
            if p.exists() {
                p.to_path_buf()
            } else {
                return Ok(None);
            }
        }
    };
    let s = fs::read_to_string(path)?;
    parse_config(&s).map(Some)
}
