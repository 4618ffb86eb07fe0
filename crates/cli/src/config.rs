use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ragline_core::Settings;
use tracing::debug;

const LOCAL_CONFIG: &str = "ragline.toml";

/// Return the per-user config file path: ~/.config/ragline/config.toml
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ragline").join("config.toml"))
}

/// Pick the settings file. An explicit path must exist; otherwise the first
/// existing candidate of `./ragline.toml` and the per-user file is used.
fn resolve_path(explicit: Option<&Path>, cwd: &Path) -> Option<(PathBuf, bool)> {
    if let Some(path) = explicit {
        return Some((path.to_path_buf(), true));
    }
    let local = cwd.join(LOCAL_CONFIG);
    if local.exists() {
        return Some((local, false));
    }
    user_config_path()
        .filter(|p| p.exists())
        .map(|p| (p, false))
}

/// Load settings from the resolved file (if any), layered under the
/// environment, then apply command-line overrides.
pub fn load_settings(explicit: Option<&Path>, overrides: &[(&str, String)]) -> Result<Settings> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut settings = match resolve_path(explicit, &cwd) {
        Some((path, required)) => {
            debug!(path = %path.display(), "Loading settings");
            Settings::load(&path, required)
                .with_context(|| format!("failed to load settings from {}", path.display()))?
        }
        None => {
            debug!("No settings file found, using environment only");
            Settings::from_env()
        }
    };
    for (key, value) in overrides {
        settings = settings.with_override(key, value.clone());
    }
    Ok(settings)
}
