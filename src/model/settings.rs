use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::config::{AppConfig, expand_tilde};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Contents of the settings file.
///
/// Only `DIRECTORY` is interpreted; any other keys are carried through
/// unchanged when the file is rewritten.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(
        rename = "DIRECTORY",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub directory: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reads and writes the JSON settings file that remembers the repository
/// directory.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    base_dir: PathBuf,
    settings_path: PathBuf,
    repository_name: String,
}

impl SettingsStore {
    pub fn new(base_dir: impl Into<PathBuf>, settings_file: &str, repository_dir: &str) -> Self {
        let base_dir = base_dir.into();
        Self {
            settings_path: base_dir.join(settings_file),
            base_dir,
            repository_name: repository_dir.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            config.base_dir()?,
            &config.general.settings_file,
            &config.general.repository_dir,
        ))
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Create `<base>/repository` if it is missing and return its absolute path.
    pub fn ensure_default_repository(&self) -> Result<PathBuf, SettingsError> {
        let repository = self.base_dir.join(&self.repository_name);
        let repository = std::path::absolute(&repository).map_err(io_error(&repository))?;
        fs::create_dir_all(&repository).map_err(io_error(&repository))?;
        Ok(repository)
    }

    /// Overwrite the settings file with the default repository.
    pub fn write_default_settings(&self) -> Result<PathBuf, SettingsError> {
        let repository = self.ensure_default_repository()?;
        let settings = Settings {
            directory: Some(repository.to_string_lossy().into_owned()),
            ..Default::default()
        };

        self.write(&settings)?;
        tracing::info!(
            "wrote default settings to {} (repository {})",
            self.settings_path.display(),
            repository.display()
        );

        Ok(repository)
    }

    /// Resolve the repository directory from the settings file, regenerating
    /// the file when it is missing or unreadable.
    pub fn load_repository_path(&self) -> Result<PathBuf, SettingsError> {
        match self.read()? {
            None => self.write_default_settings(),
            Some(Settings {
                directory: Some(directory),
                ..
            }) => Ok(PathBuf::from(directory)),
            // No DIRECTORY key: use the default without persisting it.
            Some(_) => self.ensure_default_repository(),
        }
    }

    /// Persist `candidate` as the repository directory.
    ///
    /// Returns `Ok(false)` without touching the file when the candidate is
    /// not an existing directory. The stored value is the absolute path.
    pub fn update_repository_path(&self, candidate: &str) -> Result<bool, SettingsError> {
        let candidate = candidate.trim();
        let Ok(resolved) = std::path::absolute(expand_tilde(candidate)) else {
            return Ok(false);
        };

        if !resolved.is_dir() {
            tracing::info!("rejected repository path {}", resolved.display());
            return Ok(false);
        }

        let mut settings = self.read()?.unwrap_or_default();
        settings.directory = Some(resolved.to_string_lossy().into_owned());
        self.write(&settings)?;

        tracing::info!("repository path set to {}", resolved.display());
        Ok(true)
    }

    /// `None` when the file is missing or does not hold a settings object.
    fn read(&self) -> Result<Option<Settings>, SettingsError> {
        let raw = match fs::read(&self.settings_path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(&self.settings_path)(err)),
        };

        match serde_json::from_slice(&raw) {
            Ok(settings) => Ok(Some(settings)),
            Err(err) => {
                tracing::warn!(
                    "discarding unreadable settings {}: {err}",
                    self.settings_path.display()
                );
                Ok(None)
            }
        }
    }

    fn write(&self, settings: &Settings) -> Result<(), SettingsError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        settings.serialize(&mut serializer)?;

        fs::write(&self.settings_path, out).map_err(io_error(&self.settings_path))
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SettingsError {
    let path = path.to_path_buf();
    move |source| SettingsError::Io { path, source }
}
