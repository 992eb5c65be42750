use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::console::Console;
use crate::installer::{InstallOutcome, Installer, InstallerError, RunStatus};
use crate::model::repository::{install_target, list_artifacts, select};
use crate::model::settings::SettingsStore;
use crate::msg::{Command, Msg, is_cancel, is_yes, menu_text};

const VENV_ADVISORY: &str = "!Recomendable activar un entorno virtual antes de esta operacion!\n\
                             < Ctrl + C > para salir\n\n";
const DOWNLOAD_PROMPT: &str = "Introduzca su paquete a descargar: ";
const INSTALL_PROMPT: &str = "Introduzca su paquete a instalar: ";
const UNINSTALL_PROMPT: &str = "Introduzca su paquete a desinstalar: ";
const CHANGE_DIR_PROMPT: &str = "Introduzca la nueva ruta de descarga: ";
const SELECT_PROMPT: &str = "Puede instalar paquete introduciendo su índice\n> ";
const INVALID_PATH: &str = "La ruta no es válida\n";

/// The interactive session: menu loop plus the package operations.
pub struct App<C: Console, I: Installer> {
    console: C,
    installer: I,
    settings: SettingsStore,
    repository: PathBuf,
}

impl<C: Console, I: Installer> App<C, I> {
    pub fn new(console: C, installer: I, settings: SettingsStore) -> Result<Self> {
        let repository = settings.load_repository_path()?;
        info!(
            "repository at {} (settings {})",
            repository.display(),
            settings.settings_path().display()
        );

        Ok(Self {
            console,
            installer,
            settings,
            repository,
        })
    }

    pub fn repository(&self) -> &Path {
        &self.repository
    }

    /// Run the menu until the user picks exit or input is closed.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.console.clear()?;
            let prompt = format!("Ruta: {}\n\n{}", self.repository().display(), menu_text());
            let input = self.console.prompt(&prompt)?;

            match Msg::parse(&input) {
                Msg::Quit => break,
                Msg::Run(command) => self.dispatch(command)?,
                Msg::Ignore => {}
            }
        }

        Ok(())
    }

    pub fn dispatch(&mut self, command: Command) -> Result<()> {
        debug!("menu: {command:?}");
        let repository = self.repository.clone();

        match command {
            Command::Download => self.download(&repository, None),
            Command::Install => self.install(&repository, None),
            Command::List => self.package_list(&repository),
            Command::ChangeDirectory => self.change_directory(),
            Command::Uninstall => self.uninstall(None),
        }
    }

    // ── Operations ───────────────────────────────────────────────

    pub fn download(&mut self, repository: &Path, package: Option<&str>) -> Result<()> {
        self.console.render_header()?;

        let package = match package {
            Some(package) => package.to_string(),
            None => self.console.prompt(DOWNLOAD_PROMPT)?,
        };
        if is_cancel(&package) {
            return Ok(());
        }

        let result = self.installer.download(repository, &package);
        self.settle(result)
    }

    pub fn install(&mut self, repository: &Path, package: Option<&str>) -> Result<()> {
        self.render_installed_header()?;

        let package = match package {
            Some(package) => package.to_string(),
            None => self
                .console
                .prompt(&format!("{VENV_ADVISORY}{INSTALL_PROMPT}"))?,
        };
        if is_cancel(&package) {
            return Ok(());
        }

        let target = install_target(repository, &package);
        match self.installer.install_local(repository, &target) {
            Ok(InstallOutcome::Installed) => Ok(()),
            Ok(InstallOutcome::NotFoundLocally) => {
                let answer = self.console.prompt(&format!(
                    "No se encontró el paquete {package}. Desea descargarlo? (S/n): "
                ))?;
                if !is_yes(&answer) {
                    return Ok(());
                }

                // Downloading is the end of this path; nothing is installed.
                let result = self.installer.download(repository, &package);
                self.settle(result)
            }
            Ok(InstallOutcome::Failed(code)) => self.settle(Ok(RunStatus::Failed(code))),
            Err(err) => self.settle(Err(err)),
        }
    }

    /// Ask for a package and confirm before removing it. Declining starts
    /// over with a fresh package prompt.
    pub fn uninstall(&mut self, package: Option<&str>) -> Result<()> {
        let mut supplied = package.map(str::to_string);

        loop {
            self.render_installed_header()?;

            let package = match supplied.take() {
                Some(package) => package,
                None => self.console.prompt(UNINSTALL_PROMPT)?,
            };
            if is_cancel(&package) {
                return Ok(());
            }

            let answer = self.console.prompt(&format!(
                "!Se desinstalará el paquete {package}! Presione (S/n) para proceder: "
            ))?;
            if is_yes(&answer) {
                let result = self.installer.uninstall(&package);
                return self.settle(result);
            }

            debug!("uninstall of {package} declined");
        }
    }

    pub fn package_list(&mut self, repository: &Path) -> Result<()> {
        self.render_installed_header()?;

        let artifacts = match list_artifacts(repository) {
            Ok(artifacts) => artifacts,
            Err(err) => {
                warn!("cannot list {}: {err}", repository.display());
                self.console.print(&format!("{err}\n"))?;
                return self.console.acknowledge();
            }
        };

        for (index, artifact) in artifacts.iter().enumerate() {
            self.console
                .print(&format!("({:2}) {}\n", index + 1, artifact.display_name()))?;
        }

        let input = self
            .console
            .prompt(&format!("\n{VENV_ADVISORY}{SELECT_PROMPT}"))?;

        let Some(artifact) = select(&artifacts, &input) else {
            return Ok(());
        };

        debug!("selected {}", artifact.path.display());
        let file_name = artifact.file_name.clone();
        self.install(repository, Some(&file_name))
    }

    pub fn change_directory(&mut self) -> Result<()> {
        self.console.render_header()?;

        let directory = self.console.prompt(CHANGE_DIR_PROMPT)?;
        if is_cancel(&directory) {
            return Ok(());
        }

        if self.settings.update_repository_path(&directory)? {
            self.repository = self.settings.load_repository_path()?;
            return Ok(());
        }

        self.console.print(INVALID_PATH)?;
        self.console.acknowledge()
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn render_installed_header(&mut self) -> Result<()> {
        let installed = match self.installer.list_installed() {
            Ok(installed) => installed,
            Err(err) => {
                warn!("cannot list installed packages: {err}");
                String::new()
            }
        };

        self.console.render_header_with_installed(&installed)
    }

    /// Keep a failed run on screen until the user acknowledges it.
    fn settle(&mut self, result: Result<RunStatus, InstallerError>) -> Result<()> {
        match result {
            Ok(RunStatus::Success) => Ok(()),
            Ok(RunStatus::Failed(code)) => {
                warn!("installer failed with code {code:?}");
                self.console.acknowledge()
            }
            Err(err) => {
                error!("{err}");
                self.console.print(&format!("\n{err}\n"))?;
                self.console.acknowledge()
            }
        }
    }
}
