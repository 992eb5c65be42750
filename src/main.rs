mod app;
mod console;
mod installer;
mod logging;
mod model;
mod msg;

use anyhow::Result;

use app::App;
use console::Terminal;
use installer::Pip;
use model::config::AppConfig;
use model::settings::SettingsStore;

fn main() -> Result<()> {
    let config = AppConfig::load()?;

    logging::init(&config.log)?;
    tracing::info!("offpkg starting");

    // Ctrl+C at any prompt, or while pip runs, ends the session the same
    // way as choosing exit from the menu.
    ctrlc::set_handler(|| {
        tracing::info!("interrupted");
        console::end_session();
    })?;

    let settings = SettingsStore::from_config(&config)?;
    let result = App::new(Terminal::new(), Pip::new(&config.installer), settings)
        .and_then(|mut app| app.run());

    if let Err(e) = result {
        tracing::error!("session failed: {e:?}");
        console::farewell();
        eprintln!("offpkg error: {e:?}");
        logging::flush();
        std::process::exit(1);
    }

    console::end_session()
}
