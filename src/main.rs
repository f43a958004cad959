use std::{
    fs::{self, File},
    io::stdout,
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use pagemark::event_source::TerminalEventSource;
use pagemark::panic_handler::initialize_panic_handler;
use pagemark::services::SystemServices;
use pagemark::settings;
use pagemark::{App, run_app_with_event_source};

const SAMPLE_TEXT: &str = include_str!("../assets/sample.txt");

/// Select and highlight text in a paged plain-text document
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Text file to open; pages are separated by form feeds. Opens a sample when omitted
    file: Option<PathBuf>,

    /// Initial zoom factor
    #[arg(long)]
    zoom: Option<f32>,

    /// Settings file to use instead of the one in the user config directory
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "pagemark.log")]
    log_file: PathBuf,

    /// off, error, warn, info, debug or trace
    #[arg(long)]
    log_level: Option<LevelFilter>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    settings::load_settings(cli.config.as_deref());
    let mut settings = settings::get_settings();
    if let Some(zoom) = cli.zoom {
        settings.zoom = zoom;
    }

    WriteLogger::init(
        cli.log_level.unwrap_or_else(|| settings.log_level()),
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("Failed to create log file {}", cli.log_file.display()))?,
    )?;

    info!("Starting pagemark");

    let (title, text) = match &cli.file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let title = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            (title, text)
        }
        None => ("Sample".to_string(), SAMPLE_TEXT.to_string()),
    };

    initialize_panic_handler();

    // Terminal initialization
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(title, &text, &settings, SystemServices::new());
    let mut event_source = TerminalEventSource;
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut event_source);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if app.zoom() != settings.zoom {
        settings::set_zoom(app.zoom());
    }

    if let Err(err) = res {
        error!("Application error: {err:?}");
        eprintln!("{err:?}");
    }

    info!("Shutting down pagemark");
    Ok(())
}
