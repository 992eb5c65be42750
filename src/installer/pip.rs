use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use super::{InstallOutcome, Installer, InstallerError, RunStatus};
use crate::model::config::InstallerConfig;

/// Drives `pip` (or any compatible front-end) as a child process.
#[derive(Debug, Clone)]
pub struct Pip {
    program: String,
    args: Vec<String>,
    not_found_marker: String,
}

impl Pip {
    pub fn new(config: &InstallerConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            not_found_marker: config.not_found_marker.clone(),
        }
    }

    fn command(&self, action: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(action);
        command
    }

    fn download_command(&self, repository: &Path, package: &str) -> Command {
        let mut command = self.command("download");
        command.arg("-d").arg(repository).arg(package);
        command
    }

    fn install_command(&self, repository: &Path, package: &str) -> Command {
        let mut command = self.command("install");
        command
            .arg("--no-index")
            .arg(format!("--find-links={}", repository.display()))
            .arg(package);
        command
    }

    fn uninstall_command(&self, package: &str) -> Command {
        let mut command = self.command("uninstall");
        command.arg("--yes").arg(package);
        command
    }

    fn spawn_error(&self) -> impl FnOnce(io::Error) -> InstallerError {
        let program = self.program.clone();
        move |source| InstallerError::Spawn { program, source }
    }

    fn run_streamed(&self, mut command: Command) -> Result<RunStatus, InstallerError> {
        debug!("running {command:?}");
        let status = command.status().map_err(self.spawn_error())?;
        let status = RunStatus::from(status);

        if !status.is_success() {
            warn!("{command:?} finished with {status:?}");
        }

        Ok(status)
    }
}

impl Installer for Pip {
    fn download(&mut self, repository: &Path, package: &str) -> Result<RunStatus, InstallerError> {
        info!("downloading {package} into {}", repository.display());
        self.run_streamed(self.download_command(repository, package))
    }

    fn install_local(
        &mut self,
        repository: &Path,
        package: &str,
    ) -> Result<InstallOutcome, InstallerError> {
        info!("installing {package} from {}", repository.display());

        let mut command = self.install_command(repository, package);
        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());

        debug!("running {command:?}");
        let output = command.output().map_err(self.spawn_error())?;

        // Captured only to classify the failure; the user still sees it.
        let mut stderr = io::stderr();
        stderr.write_all(&output.stderr)?;
        stderr.flush()?;

        let outcome = classify(
            RunStatus::from(output.status),
            &String::from_utf8_lossy(&output.stderr),
            &self.not_found_marker,
        );
        debug!("install of {package} classified as {outcome:?}");

        Ok(outcome)
    }

    fn uninstall(&mut self, package: &str) -> Result<RunStatus, InstallerError> {
        info!("uninstalling {package}");
        self.run_streamed(self.uninstall_command(package))
    }

    fn list_installed(&mut self) -> Result<String, InstallerError> {
        let output = self
            .command("freeze")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(self.spawn_error())?;

        if !output.status.success() {
            return Err(InstallerError::Failed {
                program: self.program.clone(),
                action: "freeze",
                status: output.status,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}

/// Turn the exit status and captured stderr of an offline install into an
/// outcome. `marker` is what pip prints when no local file satisfies the
/// requirement.
fn classify(status: RunStatus, stderr: &str, marker: &str) -> InstallOutcome {
    match status {
        RunStatus::Success => InstallOutcome::Installed,
        RunStatus::Failed(_) if !marker.is_empty() && stderr.contains(marker) => {
            InstallOutcome::NotFoundLocally
        }
        RunStatus::Failed(code) => InstallOutcome::Failed(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    const MARKER: &str = "Could not find a version";

    fn pip(program: &str, args: &[&str]) -> Pip {
        Pip::new(&InstallerConfig {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            not_found_marker: MARKER.to_string(),
        })
    }

    fn args(command: &Command) -> Vec<&OsStr> {
        command.get_args().collect()
    }

    #[test]
    fn download_targets_the_repository() {
        let pip = pip("pip", &[]);
        let command = pip.download_command(Path::new("/srv/wheels"), "requests==2.31.0");

        assert_eq!(command.get_program(), "pip");
        assert_eq!(
            args(&command),
            ["download", "-d", "/srv/wheels", "requests==2.31.0"]
        );
    }

    #[test]
    fn install_never_touches_the_index() {
        let pip = pip("pip", &[]);
        let command = pip.install_command(Path::new("/srv/wheels"), "requests");

        assert_eq!(
            args(&command),
            ["install", "--no-index", "--find-links=/srv/wheels", "requests"]
        );
    }

    #[test]
    fn uninstall_is_forced() {
        let pip = pip("pip", &[]);
        assert_eq!(
            args(&pip.uninstall_command("requests")),
            ["uninstall", "--yes", "requests"]
        );
    }

    #[test]
    fn leading_args_come_before_the_action() {
        let pip = pip("python3", &["-m", "pip"]);
        let command = pip.uninstall_command("six");

        assert_eq!(command.get_program(), "python3");
        assert_eq!(args(&command), ["-m", "pip", "uninstall", "--yes", "six"]);
    }

    #[test]
    fn classify_detects_missing_local_distribution() {
        let stderr = "ERROR: Could not find a version that satisfies the requirement nope (from versions: none)\n\
                      ERROR: No matching distribution found for nope\n";

        assert_eq!(
            classify(RunStatus::Failed(Some(1)), stderr, MARKER),
            InstallOutcome::NotFoundLocally
        );
    }

    #[test]
    fn classify_keeps_other_failures() {
        assert_eq!(
            classify(RunStatus::Failed(Some(2)), "ERROR: permission denied", MARKER),
            InstallOutcome::Failed(Some(2))
        );
        assert_eq!(
            classify(RunStatus::Failed(None), "", MARKER),
            InstallOutcome::Failed(None)
        );
        assert_eq!(
            classify(RunStatus::Failed(Some(1)), "anything", ""),
            InstallOutcome::Failed(Some(1))
        );
    }

    #[test]
    fn classify_ignores_marker_on_success() {
        assert_eq!(
            classify(RunStatus::Success, MARKER, MARKER),
            InstallOutcome::Installed
        );
    }

    /// A `Pip` whose every action runs `script` under `sh`; the action and
    /// its arguments land in `$1..` and are ignored.
    #[cfg(unix)]
    fn scripted(script: &str) -> Pip {
        pip("sh", &["-c", script, "sh"])
    }

    #[cfg(unix)]
    #[test]
    fn offline_install_reads_marker_from_child_stderr() {
        let mut pip = scripted(
            "echo 'ERROR: Could not find a version that satisfies the requirement nope' >&2; exit 1",
        );

        assert_eq!(
            pip.install_local(Path::new("/srv/wheels"), "nope").unwrap(),
            InstallOutcome::NotFoundLocally
        );
    }

    #[cfg(unix)]
    #[test]
    fn offline_install_honours_configured_marker() {
        let mut pip = Pip::new(&InstallerConfig {
            program: "sh".to_string(),
            args: vec!["-c".into(), "echo 'no such wheel' >&2; exit 1".into(), "sh".into()],
            not_found_marker: "no such wheel".to_string(),
        });

        assert_eq!(
            pip.install_local(Path::new("/srv/wheels"), "nope").unwrap(),
            InstallOutcome::NotFoundLocally
        );
    }

    #[cfg(unix)]
    #[test]
    fn offline_install_keeps_exit_code_of_other_failures() {
        let mut pip = scripted("echo 'ERROR: disk full' >&2; exit 3");

        assert_eq!(
            pip.install_local(Path::new("/srv/wheels"), "requests").unwrap(),
            InstallOutcome::Failed(Some(3))
        );
    }

    #[cfg(unix)]
    #[test]
    fn offline_install_success() {
        let mut pip = scripted("exit 0");

        assert_eq!(
            pip.install_local(Path::new("/srv/wheels"), "requests").unwrap(),
            InstallOutcome::Installed
        );
    }

    #[cfg(unix)]
    #[test]
    fn streamed_runs_map_exit_status() {
        assert_eq!(
            scripted("exit 0").download(Path::new("/srv/wheels"), "six").unwrap(),
            RunStatus::Success
        );
        assert_eq!(
            scripted("exit 1").uninstall("six").unwrap(),
            RunStatus::Failed(Some(1))
        );
    }

    #[cfg(unix)]
    #[test]
    fn download_killed_by_signal_has_no_code() {
        let mut pip = scripted("kill -9 $$");

        assert_eq!(
            pip.download(Path::new("/srv/wheels"), "six").unwrap(),
            RunStatus::Failed(None)
        );
    }

    #[cfg(unix)]
    #[test]
    fn freeze_output_is_trimmed() {
        let mut pip = scripted("printf 'attrs==23.2.0\\nsix==1.16.0\\n\\n'");

        assert_eq!(pip.list_installed().unwrap(), "attrs==23.2.0\nsix==1.16.0");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let mut pip = pip("offpkg-test-no-such-installer", &[]);

        assert!(matches!(
            pip.list_installed(),
            Err(InstallerError::Spawn { .. })
        ));
    }
}
