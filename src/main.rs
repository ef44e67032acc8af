use accident_dash::app::App;
use accident_dash::charts::ChartView;
use accident_dash::config::AppConfig;
use accident_dash::data::{JoinedDataset, StatsTable};
use accident_dash::ui;
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Road accident statistics dashboard with a choropleth region map
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file; defaults apply when it does not exist
    #[arg(short, long, default_value = "accident-dash.toml")]
    config: PathBuf,

    /// GeoJSON region boundaries (overrides `data.boundaries`)
    #[arg(short, long)]
    boundaries: Option<PathBuf>,

    /// CSV statistics table (overrides `data.stats`)
    #[arg(short, long)]
    stats: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)?;
    if let Some(boundaries) = cli.boundaries {
        config.data.boundaries = boundaries;
    }
    if let Some(stats) = cli.stats {
        config.data.stats = Some(stats);
    }

    init_logging(&config)?;
    info!(config = %cli.config.display(), "starting accident dashboard");

    // Load everything before touching the terminal so errors print normally
    let dataset = load_dataset(&config)?;

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, config, dataset);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Log to a file; the terminal belongs to the UI
fn init_logging(config: &AppConfig) -> Result<()> {
    let file = File::create(&config.log.file)
        .with_context(|| format!("Failed to create log file: {:?}", config.log.file))?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))
        .with_context(|| format!("Invalid log level: {}", config.log.level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_dataset(config: &AppConfig) -> Result<JoinedDataset> {
    let stats = match &config.data.stats {
        Some(path) => StatsTable::from_csv_path(path)
            .with_context(|| format!("Failed to load statistics: {:?}", path))?,
        None => {
            info!("no statistics file configured, using built-in 2017 table");
            StatsTable::builtin()
        }
    };

    JoinedDataset::load(&config.data.boundaries, &stats, &config.data.region_field)
        .with_context(|| format!("Failed to load boundaries: {:?}", config.data.boundaries))
}

/// Handle mouse events for hover, buttons, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => {
            if !app.click(mouse.column, mouse.row) {
                app.start_drag(mouse.column, mouse.row);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
    // Always track mouse position for cursor marker and hover
    app.on_mouse_move(mouse.column, mouse.row);
}

fn run(terminal: &mut DefaultTerminal, config: AppConfig, dataset: JoinedDataset) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(config, dataset, size.width, size.height)?;

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                            // Pan with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                            KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                            KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                            KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                            // Zoom
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            // Charts
                            KeyCode::Char(c @ '1'..='3') => {
                                app.select_chart(ChartView::ALL[c as usize - '1' as usize]);
                            }

                            // Live traffic map
                            KeyCode::Char('4') | KeyCode::Char('t') => app.open_live_map(),

                            // Reset view
                            KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, mouse);
                }
                Event::Resize(width, height) => {
                    app.resize(width, height);
                }
                _ => {}
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }

    info!("dashboard closed");
    Ok(())
}
