use anyhow::{Result, bail};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// A downloaded package file sitting in the repository directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub file_name: String,
}

impl Artifact {
    pub fn display_name(&self) -> String {
        display_name(&self.file_name)
    }
}

/// Short name for an artifact: the first two dash-separated components,
/// which for pip downloads are the distribution name and version.
pub fn display_name(file_name: &str) -> String {
    file_name.splitn(3, '-').take(2).collect::<Vec<_>>().join("-")
}

/// Regular, non-hidden files directly inside `repository`, sorted by name.
pub fn list_artifacts(repository: &Path) -> Result<Vec<Artifact>> {
    if !repository.is_dir() {
        bail!(
            "El directorio {} no existe o no es accesible",
            repository.display()
        );
    }

    let mut artifacts: Vec<Artifact> = WalkBuilder::new(repository)
        .max_depth(Some(1))
        .standard_filters(false)
        .hidden(true)
        .build()
        .flatten()
        .filter_map(|entry| {
            if entry.depth() == 0 {
                return None;
            }

            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }

            let Some(file_name) = entry.file_name().to_str() else {
                tracing::warn!(
                    "skipping artifact with non UTF-8 name: {}",
                    entry.path().display()
                );
                return None;
            };

            let file_name = file_name.to_string();
            Some(Artifact {
                path: entry.path().to_path_buf(),
                file_name,
            })
        })
        .collect();

    artifacts.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(artifacts)
}

/// Resolve a 1-based index typed by the user to an artifact.
pub fn select<'a>(artifacts: &'a [Artifact], input: &str) -> Option<&'a Artifact> {
    let index: usize = input.trim().parse().ok()?;
    index.checked_sub(1).and_then(|i| artifacts.get(i))
}

/// What to hand the installer for `package`.
///
/// A bare file name that exists in the repository becomes that file's full
/// path, so a listed artifact can be installed directly. Anything else is a
/// requirement string and passes through unchanged.
pub fn install_target(repository: &Path, package: &str) -> String {
    let is_bare_name = !package.contains(['/', '\\']);
    let candidate = repository.join(package);

    if is_bare_name && candidate.is_file() {
        candidate.to_string_lossy().into_owned()
    } else {
        package.to_string()
    }
}
