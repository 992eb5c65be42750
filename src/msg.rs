/// Back / exit answer accepted by every prompt.
pub const CANCEL: &str = "0";

const MENU_TITLE: &str = "<<<< Gestor de paquetes offline >>>>";

/// Menu entries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Download,
    Install,
    List,
    ChangeDirectory,
    Uninstall,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::Download,
        Command::Install,
        Command::List,
        Command::ChangeDirectory,
        Command::Uninstall,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Command::Download => "1",
            Command::Install => "2",
            Command::List => "3",
            Command::ChangeDirectory => "4",
            Command::Uninstall => "5",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Command::Download => "Descargar paquete(s)",
            Command::Install => "Instalar paquete(s)",
            Command::List => "Listar paquetes descargados",
            Command::ChangeDirectory => "Cambiar directorio de descarga",
            Command::Uninstall => "Desinstalar paquete(s)",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.key() == key)
    }
}

/// What a line typed at the main menu asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    Run(Command),
    Quit,
    Ignore,
}

impl Msg {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input == CANCEL {
            return Msg::Quit;
        }

        Command::from_key(input).map_or(Msg::Ignore, Msg::Run)
    }
}

/// The main menu body, ending in the selection prompt.
pub fn menu_text() -> String {
    let mut text = format!("{MENU_TITLE}\n\n");
    for command in Command::ALL {
        text.push_str(&format!("< {} > {}\n", command.key(), command.label()));
    }
    text.push_str(&format!("< {CANCEL} > Salir\n\nSeleccione una opcion: "));
    text
}

/// An answer that abandons the current operation.
pub fn is_cancel(input: &str) -> bool {
    let input = input.trim();
    input.is_empty() || input == CANCEL
}

/// Yes in the `(S/n)` confirmations. Only `s`/`S` counts.
pub fn is_yes(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("s")
}
