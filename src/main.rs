use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use todolist::{logging, ui, App, Config, FileStore};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let log_file = logging::init(&config)?;

    let mut app = App::new(FileStore::new(config.data_dir()));
    app.restore();

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(%err, "terminal error");
        eprintln!("{:?}", err);
        eprintln!("see {}", log_file.display());
    }
    Ok(())
}
