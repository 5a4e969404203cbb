//! metforecast - Browse Met Office DataPoint site forecasts
//!
//! A terminal UI application that searches the DataPoint sitelist and shows
//! daily or three-hourly forecasts for the chosen location.

mod ui;

use std::io;
use std::panic;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

use metforecast::app::App;
use metforecast::cli::{Cli, StartupConfig};
use metforecast::data::{DataPointClient, ForecastSource};
use metforecast::fetch::{try_recv, FetchHandle};
use metforecast::location_index::LocationIndex;
use metforecast::logging;

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

fn setup_terminal() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Tui) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse CLI arguments first (before terminal setup)
    // This allows --help and --version to work normally
    let cli = Cli::parse();

    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    logging::init(&config.log_file)?;
    info!(
        base_url = %config.base_url,
        resolution = %config.resolution,
        log_file = %config.log_file.display(),
        "metforecast starting"
    );

    let source: Arc<dyn ForecastSource> = Arc::new(DataPointClient::with_config(
        &config.api_key,
        &config.base_url,
        config.timeout,
    )?);

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();
    let mut terminal = setup_terminal()?;

    // Initial render to show loading state
    terminal.draw(|f| ui::render_loading(f, "Loading locations..."))?;

    let index = match load_index(source.as_ref()).await {
        Ok(index) => index,
        Err(e) => {
            error!(error = %e, "could not load sitelist");
            restore_terminal(&mut terminal)?;
            return Err(e);
        }
    };

    let result = run(&mut terminal, App::new(index, config.resolution), source).await;

    restore_terminal(&mut terminal)?;
    info!("metforecast exiting");
    result
}

/// Fetches the sitelist and builds the search index
async fn load_index(
    source: &dyn ForecastSource,
) -> Result<LocationIndex, Box<dyn std::error::Error>> {
    let locations = source.fetch_sitelist().await?;
    info!(count = locations.len(), "sitelist loaded");
    Ok(LocationIndex::from_locations(&locations)?)
}

/// Main event loop
async fn run(
    terminal: &mut Tui,
    mut app: App,
    source: Arc<dyn ForecastSource>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut fetcher = FetchHandle::spawn(source);

    loop {
        // Render UI
        terminal.draw(|f| ui::render(f, &app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if let Some(request) = app.handle_key(key) {
                    fetcher.request(request).await?;
                }
            }
        }

        // Apply any completed fetches
        while let Some(outcome) = try_recv(&mut fetcher) {
            app.complete_fetch(outcome);
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    fetcher.shutdown().await;
    Ok(())
}
