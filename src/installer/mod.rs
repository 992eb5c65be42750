pub mod error;
pub mod pip;

use std::path::Path;
use std::process::ExitStatus;

pub use error::InstallerError;
pub use pip::Pip;

/// Exit of an installer run whose output went straight to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// Nonzero exit code, or `None` when the child was killed by a signal.
    Failed(Option<i32>),
}

impl RunStatus {
    pub fn is_success(self) -> bool {
        matches!(self, RunStatus::Success)
    }
}

impl From<ExitStatus> for RunStatus {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            RunStatus::Success
        } else {
            RunStatus::Failed(status.code())
        }
    }
}

/// Result of installing strictly from the local repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    /// The repository holds no distribution matching the requirement.
    NotFoundLocally,
    Failed(Option<i32>),
}

/// The external package installer.
pub trait Installer {
    /// Fetch `package` into `repository` without installing it.
    fn download(&mut self, repository: &Path, package: &str) -> Result<RunStatus, InstallerError>;

    /// Install `package` using only the files in `repository`.
    fn install_local(
        &mut self,
        repository: &Path,
        package: &str,
    ) -> Result<InstallOutcome, InstallerError>;

    /// Remove `package` without asking for confirmation.
    fn uninstall(&mut self, package: &str) -> Result<RunStatus, InstallerError>;

    /// Installed packages, one requirement per line. Empty when none.
    fn list_installed(&mut self) -> Result<String, InstallerError>;
}
