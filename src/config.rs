use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::earnings::Rates;
use crate::error::Result;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub hourly_rate: f64,
    pub per_km_rate: f64,
}

impl Default for Config {
    fn default() -> Self {
        let rates = Rates::default();
        Self {
            hourly_rate: rates.hourly_rate,
            per_km_rate: rates.per_km_rate,
        }
    }
}

impl Config {
    pub fn rates(&self) -> Rates {
        Rates {
            hourly_rate: self.hourly_rate,
            per_km_rate: self.per_km_rate,
        }
    }
}

impl From<Rates> for Config {
    fn from(rates: Rates) -> Self {
        Self {
            hourly_rate: rates.hourly_rate,
            per_km_rate: rates.per_km_rate,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "daytripper") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("daytripper_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) if cfg.rates().validate().is_ok() => cfg,
            Ok(cfg) => {
                warn!(path = %self.path.display(), ?cfg, "ignoring config with invalid rates");
                Config::default()
            }
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
