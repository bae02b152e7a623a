use anyhow::{anyhow, Result};
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "frameview";

pub struct AppPaths;

impl AppPaths {
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Cannot determine config directory"))?
            .join(APP_DIR);

        fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Cannot determine data directory"))?
            .join(APP_DIR);

        fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn log_dir() -> Result<PathBuf> {
        let log_dir = Self::data_dir()?.join("logs");
        fs::create_dir_all(&log_dir)?;
        Ok(log_dir)
    }
}
