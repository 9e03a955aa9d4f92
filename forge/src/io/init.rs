//! Initialization helpers for `.forge/` scaffolding.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use tracing::info;

use super::settings::{ForgeSettings, write_settings};

/// Canonical paths within `.forge/` for a project root.
#[derive(Debug, Clone)]
pub struct ForgePaths {
    pub root: PathBuf,
    pub forge_dir: PathBuf,
    pub settings_path: PathBuf,
}

impl ForgePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let forge_dir = root.join(".forge");
        Self {
            root,
            settings_path: forge_dir.join("config.toml"),
            forge_dir,
        }
    }
}

/// Options for `init_forge`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite an existing settings file.
    pub force: bool,
}

/// Write default settings into `root/.forge/config.toml`.
///
/// Fails if the settings file already exists unless `options.force` is set.
pub fn init_forge(root: &Path, options: &InitOptions) -> Result<ForgePaths> {
    let paths = ForgePaths::new(root);
    if paths.forge_dir.exists() && !paths.forge_dir.is_dir() {
        return Err(anyhow!("forge init: .forge exists but is not a directory"));
    }
    if paths.settings_path.exists() && !options.force {
        return Err(anyhow!(
            "forge init: {} already exists (use --force to overwrite)",
            paths.settings_path.display()
        ));
    }

    write_settings(&paths.settings_path, &ForgeSettings::default())?;
    info!(path = %paths.settings_path.display(), "wrote default settings");
    Ok(paths)
}
