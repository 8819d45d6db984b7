use std::path::Path;

use log::{info, warn};

use crate::config::ShiftConfig;
use crate::error::{from_json_str, Result};

/// Reads the shift config from disk (JSON).
/// A missing file yields the default config.
pub fn load_config(path: impl AsRef<Path>) -> Result<ShiftConfig> {
    let path = path.as_ref();
    if path.exists() {
        let contents = std::fs::read_to_string(path)?;
        let cfg: ShiftConfig = from_json_str(&contents)?;
        cfg.validate()?;
        info!(
            "config loaded from {} (threshold={} km/h, max_gap={}s)",
            path.display(),
            cfg.moving_speed_threshold,
            cfg.max_gap_seconds
        );
        Ok(cfg)
    } else {
        warn!("no config at {}, using defaults", path.display());
        Ok(ShiftConfig::default())
    }
}

/// Writes the config as pretty-printed JSON.
pub fn save_config(cfg: &ShiftConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    cfg.validate()?;
    let json = serde_json::to_string_pretty(cfg)?;
    std::fs::write(path, json)?;
    info!("config saved to {}", path.display());
    Ok(())
}
