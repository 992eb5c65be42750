use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub installer: InstallerConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding the settings file and the default repository.
    /// Empty means the directory of the running executable.
    pub base_dir: String,
    pub settings_file: String,
    pub repository_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallerConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub not_found_marker: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub filter: String,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let mut user = None;

        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "offpkg") {
            let config_path = proj_dirs.config_dir().join("config.toml");
            if config_path.exists() {
                let raw = fs::read_to_string(&config_path)
                    .with_context(|| format!("reading {}", config_path.display()))?;
                user = Some(raw);
            }
        }

        Self::from_layers(user.as_deref())
    }

    /// Parse the built-in defaults and deep-merge `user` over them.
    pub fn from_layers(user: Option<&str>) -> Result<Self> {
        let mut merged: toml::Value = toml::from_str(DEFAULTS)?;

        if let Some(user) = user {
            let overlay: toml::Value = toml::from_str(user).context("invalid user config")?;
            merge(&mut merged, overlay);
        }

        Ok(merged.try_into()?)
    }

    pub fn base_dir(&self) -> Result<PathBuf> {
        if !self.general.base_dir.is_empty() {
            return Ok(expand_tilde(&self.general.base_dir));
        }

        let exe = std::env::current_exe().context("cannot locate the running executable")?;
        exe.parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow!("executable has no parent directory"))
    }
}

fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Expand `~` or a leading `~/` to the user's home directory. `~user`
/// forms are left untouched.
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with(['/', '\\']) => &rest[1..],
        _ => return PathBuf::from(path),
    };

    match directories::BaseDirs::new() {
        Some(base_dirs) if rest.is_empty() => base_dirs.home_dir().to_path_buf(),
        Some(base_dirs) => base_dirs.home_dir().join(rest),
        None => PathBuf::from(path),
    }
}
