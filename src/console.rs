use std::io::{self, BufRead, Write};

use anyhow::Result;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};

use crate::logging;
use crate::msg::CANCEL;

pub const BACK_HINT: &str = "< 0 > Regresar\n";
pub const INSTALLED_TITLE: &str = "Paquetes instalados en el entorno virtual actual:";
pub const ACKNOWLEDGE: &str = "\n(Presione Enter para continuar)";
pub const FAREWELL: &str = "Gracias. Vuelva pronto...";

/// Line-oriented interaction with the user.
pub trait Console {
    fn clear(&mut self) -> Result<()>;

    fn print(&mut self, text: &str) -> Result<()>;

    /// Next input line including its terminator, `None` once input is closed.
    fn read_line(&mut self) -> Result<Option<String>>;

    /// Show `text` and read the trimmed answer. Closed input reads as the
    /// cancel sentinel so every prompt unwinds back to the menu.
    fn prompt(&mut self, text: &str) -> Result<String> {
        self.print(text)?;
        Ok(self
            .read_line()?
            .map(|line| line.trim().to_string())
            .unwrap_or_else(|| CANCEL.to_string()))
    }

    fn render_header(&mut self) -> Result<()> {
        self.clear()?;
        self.print(BACK_HINT)?;
        self.print("\n")
    }

    /// Header plus the installed packages. The block is left out when
    /// `installed` is empty.
    fn render_header_with_installed(&mut self, installed: &str) -> Result<()> {
        self.clear()?;

        let mut header = BACK_HINT.to_string();
        let installed = installed.trim_end();
        if !installed.is_empty() {
            header.push_str(&format!("\n{INSTALLED_TITLE}\n{installed}\n"));
        }
        header.push('\n');

        self.print(&header)
    }

    /// Block until the user presses Enter, keeping the last error on screen.
    fn acknowledge(&mut self) -> Result<()> {
        self.prompt(ACKNOWLEDGE).map(|_| ())
    }
}

/// The process's own terminal.
pub struct Terminal {
    stdin: io::Stdin,
    stdout: io::Stdout,
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            stdin: io::stdin(),
            stdout: io::stdout(),
        }
    }
}

impl Console for Terminal {
    fn clear(&mut self) -> Result<()> {
        execute!(self.stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        Ok(())
    }

    fn print(&mut self, text: &str) -> Result<()> {
        self.stdout.write_all(text.as_bytes())?;
        self.stdout.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.stdin.lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Clear the screen and say goodbye. Best effort: the terminal may already
/// be gone.
pub fn farewell() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, Clear(ClearType::All), MoveTo(0, 0));
    let _ = writeln!(stdout, "{FAREWELL}");
    let _ = stdout.flush();
}

/// Farewell, flush the log and leave with status 0.
pub fn end_session() -> ! {
    tracing::info!("session ended");
    farewell();
    logging::flush();
    std::process::exit(0);
}

#[cfg(test)]
pub mod testing {
    use std::collections::VecDeque;

    use super::*;

    /// Feeds canned input lines and records everything shown.
    #[derive(Debug, Default)]
    pub struct ScriptedConsole {
        pub inputs: VecDeque<String>,
        pub output: String,
        pub clears: usize,
    }

    impl ScriptedConsole {
        pub fn with_inputs(inputs: &[&str]) -> Self {
            Self {
                inputs: inputs.iter().map(|line| format!("{line}\n")).collect(),
                ..Default::default()
            }
        }

        pub fn count(&self, needle: &str) -> usize {
            self.output.matches(needle).count()
        }
    }

    impl Console for ScriptedConsole {
        fn clear(&mut self) -> Result<()> {
            self.clears += 1;
            Ok(())
        }

        fn print(&mut self, text: &str) -> Result<()> {
            self.output.push_str(text);
            Ok(())
        }

        fn read_line(&mut self) -> Result<Option<String>> {
            Ok(self.inputs.pop_front())
        }
    }
}
