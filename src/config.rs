use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::head_to_head::HeadToHeadOptions;
use crate::score_plus::PeerMode;

pub const DATA_DIR_ENV: &str = "CORPS_STATS_DATA_DIR";

const DEFAULT_DATA_DIR: &str = "data";
const IDENTITY_TABLE_FILE: &str = "logo_dictionary.csv";
const SEASON_BOUNDARIES_FILE: &str = "end_of_season.json";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub head_to_head: HeadToHeadOptions,
    pub score_plus: ScorePlusConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub identity_table: PathBuf,
    pub season_boundaries: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ScorePlusConfig {
    pub cross_class: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from(DEFAULT_DATA_DIR);
        Self {
            identity_table: data_dir.join(IDENTITY_TABLE_FILE),
            season_boundaries: data_dir.join(SEASON_BOUNDARIES_FILE),
            data_dir,
        }
    }
}

impl DataConfig {
    /// Moves the data directory. Reference tables still at their default
    /// location move with it; explicitly configured ones stay put.
    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        let defaults = Self::default();
        if self.identity_table == defaults.identity_table {
            self.identity_table = dir.join(IDENTITY_TABLE_FILE);
        }
        if self.season_boundaries == defaults.season_boundaries {
            self.season_boundaries = dir.join(SEASON_BOUNDARIES_FILE);
        }
        self.data_dir = dir;
        self
    }
}

impl ScorePlusConfig {
    pub fn peer_mode(&self) -> PeerMode {
        PeerMode::from_cross_class(self.cross_class)
    }
}

impl Config {
    /// Load config from a TOML file. Falls back to defaults if the file is
    /// missing or malformed.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    tracing::info!("Config loaded from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Applies `CORPS_STATS_DATA_DIR` when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                tracing::info!("Using data directory {dir} from {DATA_DIR_ENV}");
                self.data = self.data.with_data_dir(PathBuf::from(dir));
            }
        }
        self
    }
}
