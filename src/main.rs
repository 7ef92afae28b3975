use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use std::{error::Error, io, time::Duration};
use tracing::{info, warn};

mod actions;
mod app;
mod calendar;
mod config;
mod input;
mod integrations;
mod logging;
mod models;
mod runtime;
mod sync;
mod ui;

use app::App;
use config::Config;

fn main() -> Result<(), Box<dyn Error>> {
    let (config, config_warnings) = Config::load();
    if let Err(e) = logging::init(&config.data.log_file_path()) {
        eprintln!("Logging disabled: {e}");
    }
    for warning in &config_warnings {
        warn!("{warning}");
    }
    info!(
        backend = %config.backend.resolved_base_url(),
        data_dir = ?config.data.data_dir,
        "starting jarvis"
    );

    let mut app = App::new(config)?;
    app.sync.initialize();

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    // Shift+Enter needs disambiguated escape codes; unsupported terminals keep
    // the Alt+Enter fallback.
    let _ = execute!(
        stdout,
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
    );

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    let _ = execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags);
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        warn!(error = %err, "terminal loop failed");
        println!("{err:?}");
    }
    info!("jarvis stopped");

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        runtime::tick(app);

        terminal.draw(|f| ui::ui(f, app))?;

        if event::poll(Duration::from_millis(250))? {
            input::handle_event(app, event::read()?);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
