use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::Difficulty;

const SETTINGS_FILE: &str = "settings.json";
const APP_DIR: &str = "tenzi";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_version")]
    version: u32,

    #[serde(default)]
    pub difficulty: Difficulty,
}

fn default_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            difficulty: Difficulty::default(),
            version: 1,
        }
    }
}

impl Settings {
    /// Reads `settings.json` from `data_dir`, falling back to (and writing) defaults.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(SETTINGS_FILE);
        if let Ok(contents) = fs::read_to_string(&path) {
            match serde_json::from_str::<Settings>(&contents) {
                Ok(mut settings) => {
                    settings.migrate();
                    return settings;
                }
                Err(err) => warn!(target: "settings", "Ignoring unreadable {}: {}", path.display(), err),
            }
        }
        let default = Settings::default();
        if let Err(err) = default.save(data_dir) {
            warn!(target: "settings", "Could not write default settings: {}", err);
        }
        default
    }

    pub fn save(&self, data_dir: &Path) -> Result<(), std::io::Error> {
        fs::create_dir_all(data_dir)?;
        let contents = serde_json::to_string(self)?;
        fs::write(data_dir.join(SETTINGS_FILE), contents)
    }

    fn migrate(&mut self) {
        match self.version {
            0 => {
                self.version = 1;
            }
            _ => (),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn is_debug_mode() -> bool {
        std::env::var("DEBUG").map(|v| v == "1").unwrap_or(false)
    }

    pub fn seed_from_env() -> Option<u64> {
        let raw = std::env::var("TENZI_SEED").ok()?;
        match raw.parse::<u64>() {
            Ok(seed) => Some(seed),
            Err(_) => {
                warn!(target: "settings", "TENZI_SEED={:?} is not a number; ignoring", raw);
                None
            }
        }
    }

    /// `TENZI_DATA_DIR`, else the platform data dir, else `./.tenzi`.
    pub fn data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("TENZI_DATA_DIR") {
            if !dir.trim().is_empty() {
                return PathBuf::from(dir);
            }
        }
        let dir = dirs::data_local_dir()
            .map(|base| base.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(format!(".{}", APP_DIR)));
        info!(target: "settings", "Using data dir {}", dir.display());
        dir
    }
}
